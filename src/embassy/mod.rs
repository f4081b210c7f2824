pub mod time_driver;
pub mod yield_now;
