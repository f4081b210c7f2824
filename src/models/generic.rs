use embassy_time::Instant;
use heapless::Vec;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::binding::BoundModel;
use crate::buf::{NetBuf, StatusMsg};
use crate::common::{MessageContext, ModelId, ModelRef, STATE_ON};
use crate::config::{RspCtrl, MAX_ELEMENTS};
use crate::error::{Result, ServerError};
use crate::event::{RecvGet, RecvSet, StateChange};
use crate::last_msg::LastMsgInfo;
use crate::models::{
    check_range, clamp_i16, clamp_to_range, forward_get, forward_set, range_status, step_u16,
    unknown_opcode,
};
use crate::opcode::*;
use crate::server::category::Servers;
use crate::server::{
    accept_transaction, begin_transition, earliest, notify_change, poll_transition, respond,
    respond_status, send_status, transactional_set, MeshSink, SetRequest, TransitionModel,
};
use crate::transition::{
    trans_time_steps, Ramp, Transition, TransitionFields, UNKNOWN_REMAIN_TIME, UNKNOWN_STEPS,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum OnPowerUp {
    #[default]
    Off = 0x00,
    Default = 0x01,
    Restore = 0x02,
}

/// Generic OnOff Server.
#[derive(Clone, Debug)]
pub struct OnOffServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub onoff: u8,
    pub target_onoff: u8,
    pub last: LastMsgInfo,
    pub transition: Transition,
}

impl OnOffServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            onoff: 0,
            target_onoff: 0,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
        }
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let model = self.model(());
        match ctx.recv_op {
            GEN_ONOFF_GET => {
                if !forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    let msg = self.status((), Some(ctx), now);
                    send_status(sink, model, ctx, &msg);
                }
                Ok(())
            }
            GEN_ONOFF_SET | GEN_ONOFF_SET_UNACK => {
                let onoff = buf.pull_u8()?;
                if onoff > STATE_ON {
                    return Err(ServerError::invalid("onoff", onoff));
                }
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::OnOff { onoff, tid, tt }, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, GEN_ONOFF_SET);
                transactional_set(self, (), &req, now, sink, |srv| srv.target_onoff = onoff);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

impl TransitionModel for OnOffServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::GenOnOffSrv)
    }

    fn transition(&self, _ch: ()) -> &Transition {
        &self.transition
    }

    fn transition_mut(&mut self, _ch: ()) -> &mut Transition {
        &mut self.transition
    }

    fn last_msg(&mut self) -> &mut LastMsgInfo {
        &mut self.last
    }

    fn target_reached(&self, _ch: ()) -> bool {
        self.onoff == self.target_onoff
    }

    fn prepare(&mut self, _ch: ()) {}

    fn step(&mut self, _ch: ()) {}

    fn complete(&mut self, _ch: ()) {
        self.onoff = self.target_onoff;
    }

    // A binary state turns on as soon as the transition starts
    fn begin(&mut self, _ch: ()) -> bool {
        if self.target_onoff == STATE_ON {
            self.onoff = STATE_ON;
            return true;
        }
        false
    }

    fn reports_step(&self, _ch: (), done: bool) -> bool {
        done && self.target_onoff != STATE_ON
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::OnOff { onoff: self.onoff }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(GEN_ONOFF_STATUS);
        msg.add_u8(self.onoff);
        if self.transition.counter != 0 {
            let remain = self.transition.calc_remain_time(now);
            msg.add_u8(self.target_onoff);
            msg.add_u8(remain);
        }
        msg
    }
}

/// Generic Level Server.
#[derive(Clone, Debug)]
pub struct LevelServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub level: i16,
    pub target_level: i16,
    // Level at the start of the current Delta transaction
    pub last_level: i16,
    pub last_delta: i32,
    pub move_start: bool,
    pub positive: bool,
    pub last: LastMsgInfo,
    pub transition: Transition,
    ramp: Ramp,
}

impl LevelServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            level: 0,
            target_level: 0,
            last_level: 0,
            last_delta: 0,
            move_start: false,
            positive: false,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
            ramp: Ramp::default(),
        }
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let model = self.model(());
        match ctx.recv_op {
            GEN_LEVEL_GET => {
                if !forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    let msg = self.status((), Some(ctx), now);
                    send_status(sink, model, ctx, &msg);
                }
                Ok(())
            }
            GEN_LEVEL_SET | GEN_LEVEL_SET_UNACK => {
                let level = buf.pull_le16()? as i16;
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::Level { level, tid, tt }, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, GEN_LEVEL_SET);
                transactional_set(self, (), &req, now, sink, |srv| srv.target_level = level);
                Ok(())
            }
            GEN_DELTA_SET | GEN_DELTA_SET_UNACK => self.delta_set(ctx, buf, now, sink),
            GEN_MOVE_SET | GEN_MOVE_SET_UNACK => self.move_set(ctx, buf, now, sink),
            _ => Err(unknown_opcode(model, ctx)),
        }
    }

    /// Delta Set. Several messages of one transaction carry cumulative deltas
    /// relative to the level the transaction started from.
    fn delta_set<S: MeshSink>(
        &mut self,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let delta_level = buf.pull_le32()? as i32;
        let tid = buf.pull_u8()?;
        let tt = TransitionFields::parse(buf)?;

        let set = RecvSet::Delta {
            delta_level,
            tid,
            tt,
        };
        if forward_set(self.rsp_ctrl, self.model(()), ctx, set, sink) {
            return Ok(());
        }

        let req = SetRequest::new(ctx, tid, tt, GEN_DELTA_SET);
        let target = if self.last.is_duplicate_ctx(tid, ctx, now) {
            if self.last_delta == delta_level {
                respond_status(self, (), &req, now, sink);
                return Ok(());
            }
            self.last_level as i64 + delta_level as i64
        } else {
            self.last_level = self.level;
            self.level as i64 + delta_level as i64
        };

        self.transition.stop();
        self.last.update_ctx(tid, ctx, now);

        self.last_delta = delta_level;
        self.target_level = clamp_i16(target);

        if self.target_reached(()) {
            notify_change(sink, self.model(()), ctx, self.state_change((), ctx));
            respond_status(self, (), &req, now, sink);
            return Ok(());
        }

        begin_transition(self, (), &req, now, sink);
        Ok(())
    }

    /// Move Set. The level keeps moving by `delta_level` per transition time;
    /// an instantaneous move changes nothing.
    fn move_set<S: MeshSink>(
        &mut self,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let delta_level = buf.pull_le16()? as i16;
        let tid = buf.pull_u8()?;
        let tt = TransitionFields::parse(buf)?;

        let set = RecvSet::Move {
            delta_level,
            tid,
            tt,
        };
        if forward_set(self.rsp_ctrl, self.model(()), ctx, set, sink) {
            return Ok(());
        }

        let req = SetRequest::new(ctx, tid, tt, GEN_MOVE_SET);
        if !accept_transaction(self, (), &req, now, sink) {
            return Ok(());
        }

        self.last_delta = delta_level as i32;
        self.target_level = clamp_i16(self.level as i64 + delta_level as i64);

        if self.target_reached(()) {
            notify_change(sink, self.model(()), ctx, self.state_change((), ctx));
            respond_status(self, (), &req, now, sink);
            self.move_start = false;
            return Ok(());
        }

        self.transition.set_values(tt.trans_time, tt.delay);
        self.prepare(());
        self.transition.set_ctx(ctx);

        if delta_level != 0 {
            self.move_start = true;
            self.positive = delta_level > 0;
        }

        self.transition.just_started = true;
        respond_status(self, (), &req, now, sink);

        if self.transition.counter == 0 {
            self.move_start = false;
            self.transition.stop();
            notify_change(sink, self.model(()), ctx, self.state_change((), ctx));
            return Ok(());
        }

        self.transition.start(now);
        Ok(())
    }
}

impl TransitionModel for LevelServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::GenLevelSrv)
    }

    fn transition(&self, _ch: ()) -> &Transition {
        &self.transition
    }

    fn transition_mut(&mut self, _ch: ()) -> &mut Transition {
        &mut self.transition
    }

    fn last_msg(&mut self) -> &mut LastMsgInfo {
        &mut self.last
    }

    fn target_reached(&self, _ch: ()) -> bool {
        self.level == self.target_level
    }

    fn prepare(&mut self, _ch: ()) {
        self.ramp = Ramp::new(
            self.level as i32,
            self.target_level as i32,
            self.transition.counter,
        );
    }

    fn step(&mut self, _ch: ()) {
        self.level = clamp_i16(self.ramp.step() as i64);
    }

    fn complete(&mut self, _ch: ()) {
        self.level = self.target_level;
        self.move_start = false;
    }

    fn state_change(&self, _ch: (), ctx: &MessageContext) -> StateChange {
        let level = self.level;
        match ctx.recv_op {
            GEN_DELTA_SET | GEN_DELTA_SET_UNACK => StateChange::Delta { level },
            GEN_MOVE_SET | GEN_MOVE_SET_UNACK => StateChange::Move { level },
            _ => StateChange::Level { level },
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(GEN_LEVEL_STATUS);
        msg.add_le16(self.level as u16);
        if self.transition.counter != 0 {
            if self.move_start {
                let bound = if self.positive { i16::MAX } else { i16::MIN };
                msg.add_le16(bound as u16);
                msg.add_u8(UNKNOWN_REMAIN_TIME);
            } else {
                let remain = self.transition.calc_remain_time(now);
                msg.add_le16(self.target_level as u16);
                msg.add_u8(remain);
            }
        }
        msg
    }
}

/// Generic Default Transition Time Server.
#[derive(Clone, Debug)]
pub struct DefTransTimeServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub trans_time: u8,
}

impl DefTransTimeServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            trans_time: 0,
        }
    }

    fn model(&self) -> ModelRef {
        ModelRef::new(self.element, ModelId::GenDefTransTimeSrv)
    }

    fn status(&self) -> StatusMsg {
        let mut msg = StatusMsg::new(GEN_DEF_TRANS_TIME_STATUS);
        msg.add_u8(self.trans_time);
        msg
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        sink: &mut S,
    ) -> Result<()> {
        let model = self.model();
        match ctx.recv_op {
            GEN_DEF_TRANS_TIME_GET => {
                if !forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    send_status(sink, model, ctx, &self.status());
                }
                Ok(())
            }
            GEN_DEF_TRANS_TIME_SET | GEN_DEF_TRANS_TIME_SET_UNACK => {
                let trans_time = buf.pull_u8()?;
                if trans_time_steps(trans_time) == UNKNOWN_STEPS {
                    return Err(ServerError::UnknownTransitionSteps(trans_time));
                }

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::DefTransTime { trans_time }, sink) {
                    return Ok(());
                }

                self.trans_time = trans_time;
                notify_change(sink, model, ctx, StateChange::DefTransTime { trans_time });
                respond(sink, model, ctx, ctx.recv_op == GEN_DEF_TRANS_TIME_SET, &self.status());
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

/// Generic Power OnOff Server together with its Setup Server.
#[derive(Clone, Debug)]
pub struct PowerOnOffServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub onpowerup: OnPowerUp,
}

impl PowerOnOffServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            onpowerup: OnPowerUp::Off,
        }
    }

    pub fn status(&self) -> StatusMsg {
        let mut msg = StatusMsg::new(GEN_ONPOWERUP_STATUS);
        msg.add_u8(self.onpowerup as u8);
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
            (ModelId::GenPowerOnOffSrv, GEN_ONPOWERUP_GET) => {
                if !forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    send_status(sink, model, ctx, &self.status());
                }
                Ok(())
            }
            (ModelId::GenPowerOnOffSetupSrv, GEN_ONPOWERUP_SET | GEN_ONPOWERUP_SET_UNACK) => {
                let value = buf.pull_u8()?;
                let onpowerup =
                    OnPowerUp::from_u8(value).ok_or(ServerError::invalid("onpowerup", value))?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::OnPowerUp { onpowerup: value }, sink) {
                    return Ok(());
                }

                self.onpowerup = onpowerup;
                notify_change(sink, model, ctx, StateChange::OnPowerUp { onpowerup: value });
                respond(sink, model, ctx, ctx.recv_op == GEN_ONPOWERUP_SET, &self.status());
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

/// Generic Power Level Server together with its Setup Server.
#[derive(Clone, Debug)]
pub struct PowerLevelServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub power_actual: u16,
    pub target_power_actual: u16,
    pub power_last: u16,
    pub power_default: u16,
    pub status_code: u8,
    pub power_range_min: u16,
    pub power_range_max: u16,
    pub last: LastMsgInfo,
    pub transition: Transition,
    ramp: Ramp,
}

impl PowerLevelServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            power_actual: 0,
            target_power_actual: 0,
            power_last: 0,
            power_default: 0,
            status_code: 0,
            power_range_min: 0,
            power_range_max: 0,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
            ramp: Ramp::default(),
        }
    }

    /// Builds the status answering `opcode`.
    pub fn status_for(&mut self, opcode: u32, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(opcode);
        match opcode {
            GEN_POWER_LEVEL_STATUS => {
                msg.add_le16(self.power_actual);
                if self.transition.counter != 0 {
                    let remain = self.transition.calc_remain_time(now);
                    msg.add_le16(self.target_power_actual);
                    msg.add_u8(remain);
                }
            }
            GEN_POWER_LAST_STATUS => msg.add_le16(self.power_last),
            GEN_POWER_DEFAULT_STATUS => msg.add_le16(self.power_default),
            GEN_POWER_RANGE_STATUS => {
                msg.add_u8(self.status_code);
                msg.add_le16(self.power_range_min);
                msg.add_le16(self.power_range_max);
            }
            _ => {}
        }
        msg
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let setup = model.id == ModelId::GenPowerLevelSetupSrv;
        match ctx.recv_op {
            GEN_POWER_LEVEL_GET | GEN_POWER_LAST_GET | GEN_POWER_DEFAULT_GET
            | GEN_POWER_RANGE_GET
                if !setup =>
            {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let opcode = match ctx.recv_op {
                    GEN_POWER_LEVEL_GET => GEN_POWER_LEVEL_STATUS,
                    GEN_POWER_LAST_GET => GEN_POWER_LAST_STATUS,
                    GEN_POWER_DEFAULT_GET => GEN_POWER_DEFAULT_STATUS,
                    _ => GEN_POWER_RANGE_STATUS,
                };
                let msg = self.status_for(opcode, now);
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            GEN_POWER_LEVEL_SET | GEN_POWER_LEVEL_SET_UNACK if !setup => {
                let power = buf.pull_le16()?;
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::PowerLevel { power, tid, tt }, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, GEN_POWER_LEVEL_SET);
                transactional_set(self, (), &req, now, sink, |srv| {
                    srv.target_power_actual = match power {
                        0 => 0,
                        power => clamp_to_range(power, srv.power_range_min, srv.power_range_max),
                    };
                });
                Ok(())
            }
            GEN_POWER_DEFAULT_SET | GEN_POWER_DEFAULT_SET_UNACK if setup => {
                let power = buf.pull_le16()?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::PowerDefault { power }, sink) {
                    return Ok(());
                }

                // Zero means: use Power Last
                self.power_default = match power {
                    0 => self.power_last,
                    power => power,
                };
                let change = StateChange::PowerDefault {
                    power: self.power_default,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(GEN_POWER_DEFAULT_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == GEN_POWER_DEFAULT_SET, &msg);
                Ok(())
            }
            GEN_POWER_RANGE_SET | GEN_POWER_RANGE_SET_UNACK if setup => {
                let range_min = buf.pull_le16()?;
                let range_max = buf.pull_le16()?;
                check_range("power range min", range_min, range_max)?;

                let set = RecvSet::PowerRange {
                    range_min,
                    range_max,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.status_code = range_status(range_min, range_max);
                if range_min != 0 {
                    self.power_range_min = range_min;
                }
                if range_max != 0 {
                    self.power_range_max = range_max;
                }
                let change = StateChange::PowerRange {
                    range_min: self.power_range_min,
                    range_max: self.power_range_max,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(GEN_POWER_RANGE_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == GEN_POWER_RANGE_SET, &msg);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

impl TransitionModel for PowerLevelServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::GenPowerLevelSrv)
    }

    fn transition(&self, _ch: ()) -> &Transition {
        &self.transition
    }

    fn transition_mut(&mut self, _ch: ()) -> &mut Transition {
        &mut self.transition
    }

    fn last_msg(&mut self) -> &mut LastMsgInfo {
        &mut self.last
    }

    fn target_reached(&self, _ch: ()) -> bool {
        self.power_actual == self.target_power_actual
    }

    fn prepare(&mut self, _ch: ()) {
        self.ramp = Ramp::new(
            self.power_actual as i32,
            self.target_power_actual as i32,
            self.transition.counter,
        );
    }

    fn step(&mut self, _ch: ()) {
        self.power_actual = step_u16(&mut self.ramp);
    }

    fn complete(&mut self, _ch: ()) {
        self.power_actual = self.target_power_actual;
        if self.power_actual != 0 {
            self.power_last = self.power_actual;
        }
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::PowerLevel {
            power: self.power_actual,
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        self.status_for(GEN_POWER_LEVEL_STATUS, now)
    }
}

/// Generic server models of every element, behind one category lock.
#[derive(Default)]
pub struct GenericServers {
    onoff: Vec<OnOffServer, MAX_ELEMENTS>,
    level: Vec<LevelServer, MAX_ELEMENTS>,
    def_trans_time: Vec<DefTransTimeServer, MAX_ELEMENTS>,
    power_onoff: Vec<PowerOnOffServer, MAX_ELEMENTS>,
    power_level: Vec<PowerLevelServer, MAX_ELEMENTS>,
}

impl GenericServers {
    pub const fn new() -> Self {
        Self {
            onoff: Vec::new(),
            level: Vec::new(),
            def_trans_time: Vec::new(),
            power_onoff: Vec::new(),
            power_level: Vec::new(),
        }
    }

    crate::element_table!(onoff, OnOffServer);
    crate::element_table!(level, LevelServer);
    crate::element_table!(def_trans_time, DefTransTimeServer);
    crate::element_table!(power_onoff, PowerOnOffServer);
    crate::element_table!(power_level, PowerLevelServer);
}

impl Servers for GenericServers {
    const NAME: &'static str = "Generic";

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
            ModelId::GenOnOffSrv => {
                crate::find_server!(self, onoff, model).handle(ctx, &mut buf, now, sink)
            }
            ModelId::GenLevelSrv => {
                crate::find_server!(self, level, model).handle(ctx, &mut buf, now, sink)
            }
            ModelId::GenDefTransTimeSrv => {
                crate::find_server!(self, def_trans_time, model).handle(ctx, &mut buf, sink)
            }
            ModelId::GenPowerOnOffSrv | ModelId::GenPowerOnOffSetupSrv => {
                crate::find_server!(self, power_onoff, model).handle(model, ctx, &mut buf, sink)
            }
            ModelId::GenPowerLevelSrv | ModelId::GenPowerLevelSetupSrv => {
                crate::find_server!(self, power_level, model).handle(model, ctx, &mut buf, now, sink)
            }
            _ => Err(ServerError::NoSuchModel {
                model: model.id,
                element: model.element,
            }),
        }
    }

    fn poll<S: MeshSink>(&mut self, now: Instant, sink: &mut S) -> Option<Instant> {
        let mut next = None;
        for srv in self.onoff.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        for srv in self.level.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        for srv in self.power_level.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        next
    }

    fn bound_model(&mut self, model: ModelRef) -> Option<BoundModel<'_>> {
        match model.id {
            ModelId::GenOnOffSrv => self.onoff_mut(model.element).map(BoundModel::OnOff),
            ModelId::GenLevelSrv => self.level_mut(model.element).map(BoundModel::Level),
            ModelId::GenPowerOnOffSrv | ModelId::GenPowerOnOffSetupSrv => {
                self.power_onoff_mut(model.element).map(BoundModel::PowerOnOff)
            }
            ModelId::GenPowerLevelSrv | ModelId::GenPowerLevelSetupSrv => {
                self.power_level_mut(model.element).map(BoundModel::PowerLevel)
            }
            _ => None,
        }
    }
}
