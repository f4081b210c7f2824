use embassy_time::Instant;

/// Current time as seen by the model servers. Read once per handled message
/// or poll and passed down.
#[cfg_attr(test, mry::mry)]
pub fn uptime() -> Instant {
    Instant::now()
}

#[cfg(feature = "host-clock")]
mod host {
    use embassy_time::driver::{AlarmHandle, Driver};
    use once_cell::sync::Lazy;

    static START: Lazy<std::time::Instant> = Lazy::new(std::time::Instant::now);

    struct HostDriver {}

    embassy_time::time_driver_impl!(static DRIVER: HostDriver = HostDriver{});

    impl Driver for HostDriver {
        fn now(&self) -> u64 {
            // 1 tick per microsecond
            START.elapsed().as_micros() as u64
        }
        unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
            Some(AlarmHandle::new(0))
        }
        fn set_alarm_callback(&self, _alarm: AlarmHandle, _callback: fn(*mut ()), _ctx: *mut ()) {}
        fn set_alarm(&self, _alarm: AlarmHandle, timestamp: u64) -> bool {
            timestamp > self.now()
        }
    }
}

#[cfg(all(test, feature = "host-clock"))]
mod tests {
    use super::*;

    #[test]
    fn test_host_clock_is_monotonic() {
        let first = Instant::now();
        let second = Instant::now();

        assert!(second >= first);
    }

    #[test]
    #[mry::lock(uptime)]
    fn test_uptime_can_be_mocked() {
        mock_uptime().returns(Instant::from_millis(5000));

        assert_eq!(uptime(), Instant::from_millis(5000));
    }
}
