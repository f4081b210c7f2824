use num_derive::FromPrimitive;

pub const ADDR_UNASSIGNED: u16 = 0x0000;

pub const STATE_OFF: u8 = 0x00;
pub const STATE_ON: u8 = 0x01;

pub fn addr_is_unicast(addr: u16) -> bool {
    addr != ADDR_UNASSIGNED && addr < 0x8000
}

/// Addressing of one received (or to be sent) access message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageContext {
    pub net_idx: u16,
    pub app_idx: u16,
    // Source address of the received message, destination of a reply
    pub addr: u16,
    pub recv_dst: u16,
    pub recv_op: u32,
    pub recv_ttl: u8,
    pub send_ttl: u8,
}

impl MessageContext {
    pub const fn new(addr: u16, recv_dst: u16, recv_op: u32) -> Self {
        Self {
            net_idx: 0,
            app_idx: 0,
            addr,
            recv_dst,
            recv_op,
            recv_ttl: 0,
            send_ttl: 0,
        }
    }
}

/// SIG server model identifiers handled by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum ModelId {
    GenOnOffSrv = 0x1000,
    GenLevelSrv = 0x1002,
    GenDefTransTimeSrv = 0x1004,
    GenPowerOnOffSrv = 0x1006,
    GenPowerOnOffSetupSrv = 0x1007,
    GenPowerLevelSrv = 0x1009,
    GenPowerLevelSetupSrv = 0x100A,
    TimeSrv = 0x1200,
    TimeSetupSrv = 0x1201,
    SceneSrv = 0x1203,
    SceneSetupSrv = 0x1204,
    SchedulerSrv = 0x1206,
    SchedulerSetupSrv = 0x1207,
    LightLightnessSrv = 0x1300,
    LightLightnessSetupSrv = 0x1301,
    LightCtlSrv = 0x1303,
    LightCtlSetupSrv = 0x1304,
    LightCtlTempSrv = 0x1306,
    LightHslSrv = 0x1307,
    LightHslSetupSrv = 0x1308,
    LightHslHueSrv = 0x130A,
    LightHslSatSrv = 0x130B,
    LightXylSrv = 0x130C,
    LightXylSetupSrv = 0x130D,
    LightLcSrv = 0x130F,
    LightLcSetupSrv = 0x1310,
}

/// A model instance: the model on a given element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub element: u16,
    pub id: ModelId,
}

impl ModelRef {
    pub const fn new(element: u16, id: ModelId) -> Self {
        Self { element, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_addr_is_unicast() {
        assert!(!addr_is_unicast(ADDR_UNASSIGNED));
        assert!(addr_is_unicast(0x0001));
        assert!(addr_is_unicast(0x7FFF));
        // Virtual and group ranges
        assert!(!addr_is_unicast(0x8000));
        assert!(!addr_is_unicast(0xC000));
        assert!(!addr_is_unicast(0xFFFF));
    }

    #[test]
    fn test_model_id_from_wire() {
        assert_eq!(ModelId::from_u16(0x1300), Some(ModelId::LightLightnessSrv));
        assert_eq!(ModelId::from_u16(0x1204), Some(ModelId::SceneSetupSrv));
        assert_eq!(ModelId::from_u16(0x1001), None);
    }
}
