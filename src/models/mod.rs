use log::warn;

use crate::common::{MessageContext, ModelRef};
use crate::config::RspCtrl;
use crate::error::ServerError;
use crate::event::{RecvGet, RecvSet, ServerEvent};
use crate::server::MeshSink;
use crate::transition::Ramp;

pub mod generic;
pub mod lighting;
pub mod scene;
pub mod scheduler;
pub mod time;

// Range Status codes
pub const RANGE_UPDATE_SUCCESS: u8 = 0x00;
pub const CANNOT_SET_RANGE_MIN: u8 = 0x01;
pub const CANNOT_SET_RANGE_MAX: u8 = 0x02;

/// Status code of a Range Set whose bounds passed the min <= max check.
pub fn range_status(range_min: u16, range_max: u16) -> u8 {
    if range_min == 0 {
        CANNOT_SET_RANGE_MIN
    } else if range_max == 0 {
        CANNOT_SET_RANGE_MAX
    } else {
        RANGE_UPDATE_SUCCESS
    }
}

/// Clamps into [min, max]. A zero bound is unset and does not clamp.
pub fn clamp_to_range(value: u16, range_min: u16, range_max: u16) -> u16 {
    if range_min != 0 && value < range_min {
        range_min
    } else if range_max != 0 && value > range_max {
        range_max
    } else {
        value
    }
}

pub fn clamp_i16(value: i64) -> i16 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Next value of a ramp over an unsigned 16-bit state.
pub(crate) fn step_u16(ramp: &mut Ramp) -> u16 {
    ramp.step().clamp(0, u16::MAX as i32) as u16
}

pub(crate) fn check_range(field: &'static str, range_min: u16, range_max: u16) -> crate::error::Result<()> {
    if range_min > range_max {
        return Err(ServerError::invalid(field, range_min));
    }
    Ok(())
}

/// Hands a Get to the application when it answers Gets itself.
pub(crate) fn forward_get<S: MeshSink>(
    rsp_ctrl: RspCtrl,
    model: ModelRef,
    ctx: &MessageContext,
    get: RecvGet,
    sink: &mut S,
) -> bool {
    if !rsp_ctrl.get_by_app() {
        return false;
    }
    sink.notify(model, ctx, ServerEvent::RecvGet(get));
    true
}

/// Hands a decoded Set to the application when it answers Sets itself.
pub(crate) fn forward_set<S: MeshSink>(
    rsp_ctrl: RspCtrl,
    model: ModelRef,
    ctx: &MessageContext,
    set: RecvSet,
    sink: &mut S,
) -> bool {
    if !rsp_ctrl.set_by_app() {
        return false;
    }
    sink.notify(model, ctx, ServerEvent::RecvSet(set));
    true
}

pub(crate) fn unknown_opcode(model: ModelRef, ctx: &MessageContext) -> ServerError {
    warn!("{:?} got unexpected opcode 0x{:04x}", model.id, ctx.recv_op);
    ServerError::UnknownOpcode {
        model: model.id,
        opcode: ctx.recv_op,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_range_ignores_unset_bounds() {
        assert_eq!(clamp_to_range(5, 0, 0), 5);
        assert_eq!(clamp_to_range(5, 10, 0), 10);
        assert_eq!(clamp_to_range(500, 0, 100), 100);
        assert_eq!(clamp_to_range(50, 10, 100), 50);
    }

    #[test]
    fn test_range_status() {
        assert_eq!(range_status(0, 10), CANNOT_SET_RANGE_MIN);
        assert_eq!(range_status(0, 0), CANNOT_SET_RANGE_MIN);
        assert_eq!(range_status(10, 0), CANNOT_SET_RANGE_MAX);
        assert_eq!(range_status(1, 10), RANGE_UPDATE_SUCCESS);
    }

    #[test]
    fn test_clamp_i16() {
        assert_eq!(clamp_i16(40_000), i16::MAX);
        assert_eq!(clamp_i16(-40_000), i16::MIN);
        assert_eq!(clamp_i16(-5), -5);
    }

    #[test]
    fn test_step_u16_stays_in_range() {
        let mut up = Ramp::new(65_535, 70_000, 1);
        let mut down = Ramp::new(0, -10, 1);
        let mut inside = Ramp::new(0, 1_000, 2);

        assert_eq!(step_u16(&mut up), u16::MAX);
        assert_eq!(step_u16(&mut down), 0);
        assert_eq!(step_u16(&mut inside), 500);
    }
}
