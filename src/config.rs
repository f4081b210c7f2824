use num_derive::FromPrimitive;

// Transitions

// Max number of interpolation steps a transition is split into.
pub const DEVICE_SPECIFIC_RESOLUTION: u8 = 10;
// Length of one interpolation step before quantisation, in ms.
pub const STEP_RESOLUTION_MS: u32 = 100;
// Unit of the Delay field, in ms.
pub const DELAY_UNIT_MS: u64 = 5;

// Transaction tracking

// A (tid, src, dst) tuple seen within this many ms is the same transaction.
pub const LAST_MSG_WINDOW_MS: u64 = 6000;

// Capacities

// Max number of elements hosting a given server model.
pub const MAX_ELEMENTS: usize = 8;
// Max scene register entries per Scene Server.
pub const MAX_SCENES: usize = 16;
// Max opaque bytes stored per scene.
pub const SCENE_VALUE_MAX: usize = 32;
// Scheduler Register entries (indices 0..=15).
pub const SCHEDULE_COUNT: usize = 16;
// Largest status message, opcode included.
pub const STATUS_MSG_MAX: usize = 384;

/// How a server model answers a class of messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum RspMode {
    /// Forward the decoded message to the application, which answers it.
    ByApp = 0x00,
    #[default]
    Auto = 0x01,
}

/// Per-model response control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RspCtrl {
    pub get_auto_rsp: RspMode,
    pub set_auto_rsp: RspMode,
    pub status_auto_rsp: RspMode,
}

impl RspCtrl {
    pub const fn auto() -> Self {
        Self {
            get_auto_rsp: RspMode::Auto,
            set_auto_rsp: RspMode::Auto,
            status_auto_rsp: RspMode::Auto,
        }
    }

    pub const fn by_app() -> Self {
        Self {
            get_auto_rsp: RspMode::ByApp,
            set_auto_rsp: RspMode::ByApp,
            status_auto_rsp: RspMode::ByApp,
        }
    }

    pub fn get_by_app(&self) -> bool {
        self.get_auto_rsp == RspMode::ByApp
    }

    pub fn set_by_app(&self) -> bool {
        self.set_auto_rsp == RspMode::ByApp
    }

    pub fn status_by_app(&self) -> bool {
        self.status_auto_rsp == RspMode::ByApp
    }
}
