use embassy_time::Instant;
use heapless::Vec;
use log::{debug, warn};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::buf::{NetBuf, StatusMsg};
use crate::common::{MessageContext, ModelId, ModelRef};
use crate::config::{RspCtrl, MAX_ELEMENTS};
use crate::error::{Result, ServerError};
use crate::event::{RecvGet, RecvSet, RecvStatus, ServerEvent, StateChange};
use crate::models::scene::SceneServer;
use crate::models::scheduler::SchedulerServer;
use crate::models::{forward_get, forward_set, unknown_opcode};
use crate::opcode::*;
use crate::server::category::{ServerCategory, Servers};
use crate::server::{
    check_send_status, earliest, notify_change, poll_transition, send_status, MeshSink,
};

const TAI_UTC_DELTA_PADDING: u16 = 0x8000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum TimeRole {
    #[default]
    None = 0x00,
    Authority = 0x01,
    Relay = 0x02,
    Client = 0x03,
}

/// The fields carried by Time Set and Time Status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeFields {
    pub tai_seconds: [u8; 5],
    pub subsecond: u8,
    pub uncertainty: u8,
    pub time_authority: bool,
    pub tai_utc_delta: u16,
    pub time_zone_offset: u8,
}

impl TimeFields {
    fn pull_rest(&mut self, buf: &mut NetBuf) -> Result<()> {
        self.subsecond = buf.pull_u8()?;
        self.uncertainty = buf.pull_u8()?;
        let val = buf.pull_le16()?;
        self.time_authority = val & 0x01 != 0;
        self.tai_utc_delta = (val >> 1) & 0x7FFF;
        self.time_zone_offset = buf.pull_u8()?;
        Ok(())
    }

    /// Time Set payload, all ten bytes.
    pub fn parse(buf: &mut NetBuf) -> Result<Self> {
        let mut fields = Self {
            tai_seconds: buf.pull_mem()?,
            ..Default::default()
        };
        fields.pull_rest(buf)?;
        Ok(fields)
    }

    /// Time Status payload. Only the TAI seconds are present while the time
    /// is unknown.
    pub fn parse_status(buf: &mut NetBuf) -> Result<Self> {
        let mut fields = Self {
            tai_seconds: buf.pull_mem()?,
            ..Default::default()
        };
        if !fields.is_known() {
            return Ok(fields);
        }
        if buf.len() != 5 {
            return Err(ServerError::invalid("time status length", buf.len() as u32 + 5));
        }
        fields.pull_rest(buf)?;
        Ok(fields)
    }

    pub fn is_known(&self) -> bool {
        self.tai_seconds.iter().any(|&b| b != 0)
    }
}

/// Time Server together with its Setup Server.
#[derive(Clone, Debug)]
pub struct TimeServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub time: TimeFields,
    pub time_zone_offset_new: u8,
    pub tai_zone_change: [u8; 5],
    pub tai_utc_delta_new: u16,
    pub tai_delta_change: [u8; 5],
    pub role: TimeRole,
}

impl TimeServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            time: TimeFields::default(),
            time_zone_offset_new: 0,
            tai_zone_change: [0; 5],
            tai_utc_delta_new: 0,
            tai_delta_change: [0; 5],
            role: TimeRole::None,
        }
    }

    pub fn time_status(&self) -> StatusMsg {
        let mut msg = StatusMsg::new(TIME_STATUS);
        msg.add_mem(&self.time.tai_seconds);
        if self.time.is_known() {
            msg.add_u8(self.time.subsecond);
            msg.add_u8(self.time.uncertainty);
            msg.add_le16((self.time.tai_utc_delta << 1) | self.time.time_authority as u16);
            msg.add_u8(self.time.time_zone_offset);
        }
        msg
    }

    pub fn zone_status(&self) -> StatusMsg {
        let mut msg = StatusMsg::new(TIME_ZONE_STATUS);
        msg.add_u8(self.time.time_zone_offset);
        msg.add_u8(self.time_zone_offset_new);
        msg.add_mem(&self.tai_zone_change);
        msg
    }

    pub fn tai_utc_delta_status(&self) -> StatusMsg {
        let mut msg = StatusMsg::new(TAI_UTC_DELTA_STATUS);
        msg.add_le16(self.time.tai_utc_delta);
        msg.add_le16(self.tai_utc_delta_new);
        msg.add_mem(&self.tai_delta_change);
        msg
    }

    pub fn role_status(&self) -> StatusMsg {
        let mut msg = StatusMsg::new(TIME_ROLE_STATUS);
        msg.add_u8(self.role as u8);
        msg
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        sink: &mut S,
    ) -> Result<()> {
        match (model.id, ctx.recv_op) {
            (ModelId::TimeSrv, TIME_GET | TIME_ZONE_GET | TAI_UTC_DELTA_GET)
            | (ModelId::TimeSetupSrv, TIME_ROLE_GET) => {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let msg = match ctx.recv_op {
                    TIME_GET => self.time_status(),
                    TIME_ZONE_GET => self.zone_status(),
                    TAI_UTC_DELTA_GET => self.tai_utc_delta_status(),
                    _ => self.role_status(),
                };
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            (ModelId::TimeSrv, TIME_STATUS) => self.status_received(model, ctx, buf, sink),
            (ModelId::TimeSetupSrv, TIME_SET) => {
                let fields = TimeFields::parse(buf)?;
                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::Time(fields), sink) {
                    return Ok(());
                }

                self.time = fields;
                notify_change(sink, model, ctx, StateChange::Time(fields));
                send_status(sink, model, ctx, &self.time_status());
                Ok(())
            }
            (ModelId::TimeSetupSrv, TIME_ZONE_SET) => {
                let time_zone_offset_new = buf.pull_u8()?;
                let tai_zone_change = buf.pull_mem()?;

                let set = RecvSet::TimeZone {
                    time_zone_offset_new,
                    tai_zone_change,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.time_zone_offset_new = time_zone_offset_new;
                self.tai_zone_change = tai_zone_change;
                let change = StateChange::TimeZone {
                    time_zone_offset_new,
                    tai_zone_change,
                };
                notify_change(sink, model, ctx, change);
                send_status(sink, model, ctx, &self.zone_status());
                Ok(())
            }
            (ModelId::TimeSetupSrv, TAI_UTC_DELTA_SET) => {
                let tai_utc_delta_new = buf.pull_le16()?;
                if tai_utc_delta_new & TAI_UTC_DELTA_PADDING != 0 {
                    return Err(ServerError::invalid("tai-utc delta padding", tai_utc_delta_new));
                }
                let tai_delta_change = buf.pull_mem()?;

                let set = RecvSet::TaiUtcDelta {
                    tai_utc_delta_new,
                    tai_delta_change,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.tai_utc_delta_new = tai_utc_delta_new;
                self.tai_delta_change = tai_delta_change;
                let change = StateChange::TaiUtcDelta {
                    tai_utc_delta_new,
                    tai_delta_change,
                };
                notify_change(sink, model, ctx, change);
                send_status(sink, model, ctx, &self.tai_utc_delta_status());
                Ok(())
            }
            (ModelId::TimeSetupSrv, TIME_ROLE_SET) => {
                let role = buf.pull_u8()?;
                let Some(new_role) = TimeRole::from_u8(role) else {
                    return Err(ServerError::invalid("time role", role));
                };

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::TimeRole { role }, sink) {
                    return Ok(());
                }

                self.role = new_role;
                notify_change(sink, model, ctx, StateChange::TimeRole { role });
                send_status(sink, model, ctx, &self.role_status());
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }

    fn status_received<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        sink: &mut S,
    ) -> Result<()> {
        if !matches!(self.role, TimeRole::Relay | TimeRole::Client) {
            debug!("Time Status ignored in role {:?}", self.role);
            return Ok(());
        }

        let fields = TimeFields::parse_status(buf)?;

        if self.rsp_ctrl.status_by_app() {
            sink.notify(model, ctx, ServerEvent::RecvStatus(RecvStatus::Time(fields)));
            return Ok(());
        }

        // The authority bit of a received status is not taken over. An unknown
        // time carries no other fields, the current ones stay.
        self.time.tai_seconds = fields.tai_seconds;
        if fields.is_known() {
            self.time.subsecond = fields.subsecond;
            self.time.uncertainty = fields.uncertainty;
            self.time.tai_utc_delta = fields.tai_utc_delta;
            self.time.time_zone_offset = fields.time_zone_offset;
        }
        notify_change(sink, model, ctx, StateChange::Time(self.time));

        let ttl = match self.role {
            TimeRole::Relay => Some(0),
            _ => None,
        };
        let msg = self.time_status();
        check_send_status(model, sink.publish(model, msg.as_slice(), ttl));
        Ok(())
    }
}

/// Time, Scene and Scheduler servers of every element, behind one category
/// lock.
#[derive(Default)]
pub struct TimeSceneServers {
    time: Vec<TimeServer, MAX_ELEMENTS>,
    scene: Vec<SceneServer, MAX_ELEMENTS>,
    scheduler: Vec<SchedulerServer, MAX_ELEMENTS>,
}

impl TimeSceneServers {
    pub const fn new() -> Self {
        Self {
            time: Vec::new(),
            scene: Vec::new(),
            scheduler: Vec::new(),
        }
    }

    crate::element_table!(time, TimeServer);
    crate::element_table!(scene, SceneServer);
    crate::element_table!(scheduler, SchedulerServer);
}

impl Servers for TimeSceneServers {
    const NAME: &'static str = "TimeScene";

    fn handle<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        payload: &[u8],
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let mut buf = NetBuf::new(payload);
        match model.id {
            ModelId::TimeSrv | ModelId::TimeSetupSrv => {
                crate::find_server!(self, time, model).handle(model, ctx, &mut buf, sink)
            }
            ModelId::SceneSrv | ModelId::SceneSetupSrv => {
                crate::find_server!(self, scene, model).handle(model, ctx, &mut buf, now, sink)
            }
            ModelId::SchedulerSrv | ModelId::SchedulerSetupSrv => {
                crate::find_server!(self, scheduler, model).handle(model, ctx, &mut buf, sink)
            }
            _ => {
                warn!("{:?} is not a time or scene model", model.id);
                Err(ServerError::NoSuchModel {
                    model: model.id,
                    element: model.element,
                })
            }
        }
    }

    fn poll<S: MeshSink>(&mut self, now: Instant, sink: &mut S) -> Option<Instant> {
        self.scene.iter_mut().fold(None, |next, srv| {
            earliest(next, poll_transition(srv, (), now, sink))
        })
    }
}

impl ServerCategory<TimeSceneServers> {
    /// To be called by the application after a state stored with scenes
    /// changed on `element` through a Set or a binding. Clears the current
    /// scene unless a recall is running.
    pub fn stored_state_changed(&self, element: u16) -> Result<()> {
        self.lock(|servers| {
            if let Some(srv) = servers.scene_mut(element) {
                srv.stored_state_changed();
            }
        })
    }
}
