use bitflags::bitflags;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::buf::{NetBuf, StatusMsg};
use crate::common::{MessageContext, ModelId, ModelRef};
use crate::config::{RspCtrl, SCHEDULE_COUNT};
use crate::error::{Result, ServerError};
use crate::event::{RecvGet, RecvSet, StateChange};
use crate::models::{forward_get, forward_set, unknown_opcode};
use crate::opcode::*;
use crate::server::{notify_change, send_status, MeshSink};

pub const SCHEDULE_ENTRY_MAX_INDEX: u8 = 0x0F;
// Year 0x64 schedules every year
pub const SCHEDULE_YEAR_ANY_YEAR: u8 = 0x64;
// Hours 0x18 and 0x19 mean "any hour" and "once a day"
pub const SCHEDULE_HOUR_ONCE_A_DAY: u8 = 0x19;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Months: u16 {
        const JANUARY = 1 << 0;
        const FEBRUARY = 1 << 1;
        const MARCH = 1 << 2;
        const APRIL = 1 << 3;
        const MAY = 1 << 4;
        const JUNE = 1 << 5;
        const JULY = 1 << 6;
        const AUGUST = 1 << 7;
        const SEPTEMBER = 1 << 8;
        const OCTOBER = 1 << 9;
        const NOVEMBER = 1 << 10;
        const DECEMBER = 1 << 11;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DaysOfWeek: u8 {
        const MONDAY = 1 << 0;
        const TUESDAY = 1 << 1;
        const WEDNESDAY = 1 << 2;
        const THURSDAY = 1 << 3;
        const FRIDAY = 1 << 4;
        const SATURDAY = 1 << 5;
        const SUNDAY = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum ScheduleAction {
    #[default]
    TurnOff = 0x00,
    TurnOn = 0x01,
    SceneRecall = 0x02,
    NoAction = 0x0F,
}

/// One Scheduler Register entry.
///
/// On the wire the entry is a 64-bit little-endian bit field followed by the
/// scene number:
///
/// | bits  | field       |
/// |-------|-------------|
/// | 0-3   | index       |
/// | 4-10  | year        |
/// | 11-22 | month       |
/// | 23-27 | day         |
/// | 28-32 | hour        |
/// | 33-38 | minute      |
/// | 39-44 | second      |
/// | 45-51 | day of week |
/// | 52-55 | action      |
/// | 56-63 | trans time  |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub index: u8,
    pub year: u8,
    pub month: Months,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day_of_week: DaysOfWeek,
    pub action: ScheduleAction,
    pub trans_time: u8,
    pub scene_number: u16,
}

impl ScheduleEntry {
    pub fn empty(index: u8) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn pack(&self) -> u64 {
        self.index as u64
            | (self.year as u64) << 4
            | (self.month.bits() as u64) << 11
            | (self.day as u64) << 23
            | (self.hour as u64) << 28
            | (self.minute as u64) << 33
            | (self.second as u64) << 39
            | (self.day_of_week.bits() as u64) << 45
            | (self.action as u64) << 52
            | (self.trans_time as u64) << 56
    }

    /// Decodes and validates the bit field. The scene number is not part of
    /// it and is left at 0.
    pub fn unpack(value: u64) -> Result<Self> {
        let field = |shift: u32, width: u32| (value >> shift) & ((1u64 << width) - 1);

        let index = field(0, 4) as u8;
        let year = field(4, 7) as u8;
        let hour = field(28, 5) as u8;
        let action = field(52, 4) as u8;

        if index > SCHEDULE_ENTRY_MAX_INDEX {
            return Err(ServerError::invalid("schedule index", index));
        }
        if year > SCHEDULE_YEAR_ANY_YEAR {
            return Err(ServerError::invalid("schedule year", year));
        }
        if hour > SCHEDULE_HOUR_ONCE_A_DAY {
            return Err(ServerError::invalid("schedule hour", hour));
        }
        let action =
            ScheduleAction::from_u8(action).ok_or(ServerError::invalid("schedule action", action))?;

        Ok(Self {
            index,
            year,
            month: Months::from_bits_retain(field(11, 12) as u16),
            day: field(23, 5) as u8,
            hour,
            minute: field(33, 6) as u8,
            second: field(39, 6) as u8,
            day_of_week: DaysOfWeek::from_bits_retain(field(45, 7) as u8),
            action,
            trans_time: field(56, 8) as u8,
            scene_number: 0,
        })
    }
}

/// Scheduler Server together with its Setup Server.
#[derive(Clone, Debug)]
pub struct SchedulerServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    // None marks an entry not in use
    pub schedules: [Option<ScheduleEntry>; SCHEDULE_COUNT],
}

impl SchedulerServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            schedules: [None; SCHEDULE_COUNT],
        }
    }

    /// Bit n set when entry n is in use.
    pub fn in_use_mask(&self) -> u16 {
        self.schedules
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .fold(0u16, |mask, (i, _)| mask | (1u16 << i))
    }

    pub fn entry(&self, index: u8) -> ScheduleEntry {
        self.schedules
            .get(index as usize)
            .copied()
            .flatten()
            .unwrap_or(ScheduleEntry::empty(index))
    }

    fn act_status(&self, index: u8) -> StatusMsg {
        let entry = self.entry(index);
        let mut msg = StatusMsg::new(SCHEDULER_ACT_STATUS);
        msg.add_mem(&entry.pack().to_le_bytes());
        msg.add_le16(entry.scene_number);
        msg
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        sink: &mut S,
    ) -> Result<()> {
        let setup = model.id == ModelId::SchedulerSetupSrv;
        match ctx.recv_op {
            SCHEDULER_GET if !setup => {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let mut msg = StatusMsg::new(SCHEDULER_STATUS);
                msg.add_le16(self.in_use_mask());
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            SCHEDULER_ACT_GET if !setup => {
                let index = buf.pull_u8()?;
                if index > SCHEDULE_ENTRY_MAX_INDEX {
                    return Err(ServerError::invalid("schedule index", index));
                }

                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::SchedulerAct { index }, sink) {
                    return Ok(());
                }
                send_status(sink, model, ctx, &self.act_status(index));
                Ok(())
            }
            SCHEDULER_ACT_SET | SCHEDULER_ACT_SET_UNACK if setup => {
                let mut entry = ScheduleEntry::unpack(buf.pull_le64()?)?;
                entry.scene_number = buf.pull_le16()?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::SchedulerActSet(entry), sink) {
                    return Ok(());
                }

                self.schedules[entry.index as usize] = Some(entry);
                notify_change(sink, model, ctx, StateChange::SchedulerActSet(entry));

                if ctx.recv_op == SCHEDULER_ACT_SET {
                    send_status(sink, model, ctx, &self.act_status(entry.index));
                }
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_sink::RecordingSink;

    const ELEMENT: u16 = 0x0001;

    fn model(id: ModelId) -> ModelRef {
        ModelRef::new(ELEMENT, id)
    }

    fn ctx(opcode: u32) -> MessageContext {
        MessageContext::new(0x0002, ELEMENT, opcode)
    }

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            index: 3,
            year: SCHEDULE_YEAR_ANY_YEAR,
            month: Months::JUNE | Months::JULY,
            day: 0,
            hour: 7,
            minute: 30,
            second: 0,
            day_of_week: DaysOfWeek::MONDAY | DaysOfWeek::FRIDAY,
            action: ScheduleAction::SceneRecall,
            trans_time: 0x45,
            scene_number: 0x0011,
        }
    }

    fn act_set_payload(value: u64, scene_number: u16) -> std::vec::Vec<u8> {
        let mut payload = value.to_le_bytes().to_vec();
        payload.extend_from_slice(&scene_number.to_le_bytes());
        payload
    }

    #[test]
    fn test_entry_bit_layout() {
        let packed = entry().pack();

        assert_eq!(packed & 0xF, 3);
        assert_eq!((packed >> 4) & 0x7F, 0x64);
        assert_eq!((packed >> 11) & 0xFFF, 0x060);
        assert_eq!((packed >> 28) & 0x1F, 7);
        assert_eq!((packed >> 33) & 0x3F, 30);
        assert_eq!((packed >> 45) & 0x7F, 0x11);
        assert_eq!((packed >> 52) & 0xF, 2);
        assert_eq!(packed >> 56, 0x45);

        let unpacked = ScheduleEntry::unpack(packed).unwrap();
        assert_eq!(unpacked, ScheduleEntry { scene_number: 0, ..entry() });
    }

    #[test]
    fn test_unpack_rejects_invalid_fields() {
        let year = (SCHEDULE_YEAR_ANY_YEAR as u64 + 1) << 4;
        let hour = (SCHEDULE_HOUR_ONCE_A_DAY as u64 + 1) << 28;
        let action = 0x05u64 << 52;

        assert_eq!(
            ScheduleEntry::unpack(year),
            Err(ServerError::invalid("schedule year", 0x65u8))
        );
        assert_eq!(
            ScheduleEntry::unpack(hour),
            Err(ServerError::invalid("schedule hour", 0x1Au8))
        );
        assert_eq!(
            ScheduleEntry::unpack(action),
            Err(ServerError::invalid("schedule action", 0x05u8))
        );
        assert!(ScheduleEntry::unpack(0x0Fu64 << 52).is_ok());
    }

    #[test]
    fn test_act_set_marks_entry_in_use() {
        // Arrange
        let mut srv = SchedulerServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();
        let payload = act_set_payload(entry().pack(), 0x0011);

        // Act
        srv.handle(
            model(ModelId::SchedulerSetupSrv),
            &ctx(SCHEDULER_ACT_SET),
            &mut NetBuf::new(&payload),
            &mut sink,
        )
        .unwrap();

        // Assert
        assert_eq!(srv.schedules[3], Some(entry()));
        assert_eq!(srv.in_use_mask(), 0x0008);
        assert_eq!(sink.changes(), vec![StateChange::SchedulerActSet(entry())]);

        let mut expected = vec![0x5F];
        expected.extend_from_slice(&payload);
        assert_eq!(sink.sent[0].2, expected);
    }

    #[test]
    fn test_act_set_unack_does_not_reply() {
        let mut srv = SchedulerServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();
        let payload = act_set_payload(entry().pack(), 0x0011);

        srv.handle(
            model(ModelId::SchedulerSetupSrv),
            &ctx(SCHEDULER_ACT_SET_UNACK),
            &mut NetBuf::new(&payload),
            &mut sink,
        )
        .unwrap();

        assert!(sink.sent.is_empty());
        assert!(sink.published.is_empty());
        assert_eq!(srv.in_use_mask(), 0x0008);
    }

    #[test]
    fn test_invalid_act_set_is_dropped() {
        let mut srv = SchedulerServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();
        let payload = act_set_payload(entry().pack() | 0x1F << 28, 0x0011);

        let result = srv.handle(
            model(ModelId::SchedulerSetupSrv),
            &ctx(SCHEDULER_ACT_SET),
            &mut NetBuf::new(&payload),
            &mut sink,
        );

        assert!(result.is_err());
        assert_eq!(srv.in_use_mask(), 0);
        assert!(sink.sent.is_empty());
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_act_get_of_unused_entry() {
        let mut srv = SchedulerServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        srv.handle(
            model(ModelId::SchedulerSrv),
            &ctx(SCHEDULER_ACT_GET),
            &mut NetBuf::new(&[0x05]),
            &mut sink,
        )
        .unwrap();

        assert_eq!(
            sink.sent[0].2,
            vec![0x5F, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );

        let result = srv.handle(
            model(ModelId::SchedulerSrv),
            &ctx(SCHEDULER_ACT_GET),
            &mut NetBuf::new(&[0x10]),
            &mut sink,
        );
        assert_eq!(result, Err(ServerError::invalid("schedule index", 0x10u8)));
    }

    #[test]
    fn test_scheduler_get() {
        let mut srv = SchedulerServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();
        srv.schedules[0] = Some(ScheduleEntry::empty(0));
        srv.schedules[15] = Some(ScheduleEntry::empty(15));

        srv.handle(
            model(ModelId::SchedulerSrv),
            &ctx(SCHEDULER_GET),
            &mut NetBuf::new(&[]),
            &mut sink,
        )
        .unwrap();

        assert_eq!(sink.sent[0].2, vec![0x82, 0x4A, 0x01, 0x80]);
    }

    #[test]
    fn test_act_get_by_app() {
        let mut srv = SchedulerServer::new(ELEMENT, RspCtrl::by_app());
        let mut sink = RecordingSink::default();
        let scheduler = model(ModelId::SchedulerSrv);

        srv.handle(scheduler, &ctx(SCHEDULER_ACT_GET), &mut NetBuf::new(&[0x02]), &mut sink)
            .unwrap();

        assert!(sink.sent.is_empty());
        assert_eq!(
            sink.events,
            vec![(
                scheduler,
                crate::event::ServerEvent::RecvGet(RecvGet::SchedulerAct { index: 2 })
            )]
        );
    }

    #[test]
    fn test_act_set_on_main_model_is_refused() {
        let mut srv = SchedulerServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();
        let payload = act_set_payload(entry().pack(), 0x0011);

        let result = srv.handle(
            model(ModelId::SchedulerSrv),
            &ctx(SCHEDULER_ACT_SET),
            &mut NetBuf::new(&payload),
            &mut sink,
        );

        assert!(matches!(result, Err(ServerError::UnknownOpcode { .. })));
    }
}
