use embassy_time::Instant;
use heapless::Vec;

use crate::binding::BoundModel;
use crate::buf::{NetBuf, StatusMsg};
use crate::common::{MessageContext, ModelId, ModelRef, STATE_ON};
use crate::config::{RspCtrl, MAX_ELEMENTS};
use crate::error::{Result, ServerError};
use crate::event::{RecvGet, RecvSet, StateChange};
use crate::last_msg::LastMsgInfo;
use crate::models::{
    check_range, clamp_i16, clamp_to_range, forward_get, forward_set, range_status, step_u16,
    unknown_opcode, CANNOT_SET_RANGE_MAX, CANNOT_SET_RANGE_MIN, RANGE_UPDATE_SUCCESS,
};
use crate::opcode::*;
use crate::server::category::Servers;
use crate::server::{
    earliest, notify_change, poll_transition, respond, send_status, transactional_set, MeshSink,
    SetRequest, TransitionModel,
};
use crate::transition::{Ramp, Transition, TransitionFields};

// Light CTL Temperature bounds, in Kelvin
pub const TEMPERATURE_MIN: u16 = 0x0320;
pub const TEMPERATURE_MAX: u16 = 0x4E20;
pub const TEMPERATURE_UNKNOWN: u16 = 0xFFFF;

fn check_temperature(temperature: u16) -> Result<()> {
    if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&temperature) {
        return Err(ServerError::invalid("temperature", temperature));
    }
    Ok(())
}

/// Clamps into the CTL Temperature Range. Zero and unknown bounds do not clamp.
fn clamp_temperature(temperature: u16, range_min: u16, range_max: u16) -> u16 {
    let bound = |value: u16| value != 0 && value != TEMPERATURE_UNKNOWN;
    if bound(range_min) && temperature < range_min {
        range_min
    } else if bound(range_max) && temperature > range_max {
        range_max
    } else {
        temperature
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightnessChannel {
    Actual,
    Linear,
}

/// Light Lightness Server together with its Setup Server.
///
/// Actual and Linear move independently, each with its own transition, but
/// share one transaction filter.
#[derive(Clone, Debug)]
pub struct LightnessServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub lightness_linear: u16,
    pub target_lightness_linear: u16,
    pub lightness_actual: u16,
    pub target_lightness_actual: u16,
    pub lightness_last: u16,
    pub lightness_default: u16,
    pub status_code: u8,
    pub lightness_range_min: u16,
    pub lightness_range_max: u16,
    pub last: LastMsgInfo,
    pub actual_transition: Transition,
    pub linear_transition: Transition,
    actual_ramp: Ramp,
    linear_ramp: Ramp,
}

impl LightnessServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            lightness_linear: 0,
            target_lightness_linear: 0,
            lightness_actual: 0,
            target_lightness_actual: 0,
            lightness_last: 0,
            lightness_default: 0,
            status_code: RANGE_UPDATE_SUCCESS,
            lightness_range_min: 0,
            lightness_range_max: 0,
            last: LastMsgInfo::default(),
            actual_transition: Transition::default(),
            linear_transition: Transition::default(),
            actual_ramp: Ramp::default(),
            linear_ramp: Ramp::default(),
        }
    }

    pub fn status_for(&mut self, opcode: u32, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(opcode);
        match opcode {
            LIGHT_LIGHTNESS_STATUS => {
                msg.add_le16(self.lightness_actual);
                if self.actual_transition.counter != 0 {
                    let remain = self.actual_transition.calc_remain_time(now);
                    msg.add_le16(self.target_lightness_actual);
                    msg.add_u8(remain);
                }
            }
            LIGHT_LIGHTNESS_LINEAR_STATUS => {
                msg.add_le16(self.lightness_linear);
                if self.linear_transition.counter != 0 {
                    let remain = self.linear_transition.calc_remain_time(now);
                    msg.add_le16(self.target_lightness_linear);
                    msg.add_u8(remain);
                }
            }
            LIGHT_LIGHTNESS_LAST_STATUS => msg.add_le16(self.lightness_last),
            LIGHT_LIGHTNESS_DEFAULT_STATUS => msg.add_le16(self.lightness_default),
            LIGHT_LIGHTNESS_RANGE_STATUS => {
                msg.add_u8(self.status_code);
                msg.add_le16(self.lightness_range_min);
                msg.add_le16(self.lightness_range_max);
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
        let setup = model.id == ModelId::LightLightnessSetupSrv;
        match ctx.recv_op {
            LIGHT_LIGHTNESS_GET
            | LIGHT_LIGHTNESS_LINEAR_GET
            | LIGHT_LIGHTNESS_LAST_GET
            | LIGHT_LIGHTNESS_DEFAULT_GET
            | LIGHT_LIGHTNESS_RANGE_GET
                if !setup =>
            {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let opcode = match ctx.recv_op {
                    LIGHT_LIGHTNESS_GET => LIGHT_LIGHTNESS_STATUS,
                    LIGHT_LIGHTNESS_LINEAR_GET => LIGHT_LIGHTNESS_LINEAR_STATUS,
                    LIGHT_LIGHTNESS_LAST_GET => LIGHT_LIGHTNESS_LAST_STATUS,
                    LIGHT_LIGHTNESS_DEFAULT_GET => LIGHT_LIGHTNESS_DEFAULT_STATUS,
                    _ => LIGHT_LIGHTNESS_RANGE_STATUS,
                };
                let msg = self.status_for(opcode, now);
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            LIGHT_LIGHTNESS_SET | LIGHT_LIGHTNESS_SET_UNACK if !setup => {
                let lightness = buf.pull_le16()?;
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                let set = RecvSet::Lightness { lightness, tid, tt };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, LIGHT_LIGHTNESS_SET);
                transactional_set(self, LightnessChannel::Actual, &req, now, sink, |srv| {
                    srv.target_lightness_actual = match lightness {
                        0 => 0,
                        lightness => clamp_to_range(
                            lightness,
                            srv.lightness_range_min,
                            srv.lightness_range_max,
                        ),
                    };
                });
                Ok(())
            }
            LIGHT_LIGHTNESS_LINEAR_SET | LIGHT_LIGHTNESS_LINEAR_SET_UNACK if !setup => {
                let lightness = buf.pull_le16()?;
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                let set = RecvSet::LightnessLinear { lightness, tid, tt };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, LIGHT_LIGHTNESS_LINEAR_SET);
                transactional_set(self, LightnessChannel::Linear, &req, now, sink, |srv| {
                    srv.target_lightness_linear = lightness
                });
                Ok(())
            }
            LIGHT_LIGHTNESS_DEFAULT_SET | LIGHT_LIGHTNESS_DEFAULT_SET_UNACK if setup => {
                let lightness = buf.pull_le16()?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::LightnessDefault { lightness }, sink) {
                    return Ok(());
                }

                if self.lightness_default != lightness {
                    self.lightness_default = lightness;
                    notify_change(sink, model, ctx, StateChange::LightnessDefault { lightness });
                }

                let msg = self.status_for(LIGHT_LIGHTNESS_DEFAULT_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_LIGHTNESS_DEFAULT_SET, &msg);
                Ok(())
            }
            LIGHT_LIGHTNESS_RANGE_SET | LIGHT_LIGHTNESS_RANGE_SET_UNACK if setup => {
                let range_min = buf.pull_le16()?;
                let range_max = buf.pull_le16()?;
                check_range("lightness range min", range_min, range_max)?;

                let set = RecvSet::LightnessRange {
                    range_min,
                    range_max,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.status_code = range_status(range_min, range_max);
                if range_min != 0 {
                    self.lightness_range_min = range_min;
                }
                if range_max != 0 {
                    self.lightness_range_max = range_max;
                }
                let change = StateChange::LightnessRange {
                    range_min: self.lightness_range_min,
                    range_max: self.lightness_range_max,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(LIGHT_LIGHTNESS_RANGE_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_LIGHTNESS_RANGE_SET, &msg);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

impl TransitionModel for LightnessServer {
    type Channel = LightnessChannel;

    fn model(&self, _ch: LightnessChannel) -> ModelRef {
        ModelRef::new(self.element, ModelId::LightLightnessSrv)
    }

    fn transition(&self, ch: LightnessChannel) -> &Transition {
        match ch {
            LightnessChannel::Actual => &self.actual_transition,
            LightnessChannel::Linear => &self.linear_transition,
        }
    }

    fn transition_mut(&mut self, ch: LightnessChannel) -> &mut Transition {
        match ch {
            LightnessChannel::Actual => &mut self.actual_transition,
            LightnessChannel::Linear => &mut self.linear_transition,
        }
    }

    fn last_msg(&mut self) -> &mut LastMsgInfo {
        &mut self.last
    }

    fn target_reached(&self, ch: LightnessChannel) -> bool {
        match ch {
            LightnessChannel::Actual => self.lightness_actual == self.target_lightness_actual,
            LightnessChannel::Linear => self.lightness_linear == self.target_lightness_linear,
        }
    }

    fn prepare(&mut self, ch: LightnessChannel) {
        match ch {
            LightnessChannel::Actual => {
                self.actual_ramp = Ramp::new(
                    self.lightness_actual as i32,
                    self.target_lightness_actual as i32,
                    self.actual_transition.counter,
                )
            }
            LightnessChannel::Linear => {
                self.linear_ramp = Ramp::new(
                    self.lightness_linear as i32,
                    self.target_lightness_linear as i32,
                    self.linear_transition.counter,
                )
            }
        }
    }

    fn step(&mut self, ch: LightnessChannel) {
        match ch {
            LightnessChannel::Actual => self.lightness_actual = step_u16(&mut self.actual_ramp),
            LightnessChannel::Linear => self.lightness_linear = step_u16(&mut self.linear_ramp),
        }
    }

    fn complete(&mut self, ch: LightnessChannel) {
        match ch {
            LightnessChannel::Actual => {
                self.lightness_actual = self.target_lightness_actual;
                if self.lightness_actual != 0 {
                    self.lightness_last = self.lightness_actual;
                }
            }
            LightnessChannel::Linear => self.lightness_linear = self.target_lightness_linear,
        }
    }

    fn state_change(&self, ch: LightnessChannel, _ctx: &MessageContext) -> StateChange {
        match ch {
            LightnessChannel::Actual => StateChange::Lightness {
                lightness: self.lightness_actual,
            },
            LightnessChannel::Linear => StateChange::LightnessLinear {
                lightness: self.lightness_linear,
            },
        }
    }

    fn status(&mut self, ch: LightnessChannel, _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        match ch {
            LightnessChannel::Actual => self.status_for(LIGHT_LIGHTNESS_STATUS, now),
            LightnessChannel::Linear => self.status_for(LIGHT_LIGHTNESS_LINEAR_STATUS, now),
        }
    }
}

/// Light CTL Server together with its Setup Server.
#[derive(Clone, Debug)]
pub struct CtlServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub lightness: u16,
    pub target_lightness: u16,
    pub temperature: u16,
    pub target_temperature: u16,
    pub delta_uv: i16,
    pub target_delta_uv: i16,
    pub lightness_default: u16,
    pub temperature_default: u16,
    pub delta_uv_default: i16,
    pub status_code: u8,
    pub temperature_range_min: u16,
    pub temperature_range_max: u16,
    pub last: LastMsgInfo,
    pub transition: Transition,
    // lightness, temperature, delta UV
    ramps: [Ramp; 3],
}

impl CtlServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            lightness: 0,
            target_lightness: 0,
            temperature: TEMPERATURE_MIN,
            target_temperature: TEMPERATURE_MIN,
            delta_uv: 0,
            target_delta_uv: 0,
            lightness_default: 0,
            temperature_default: TEMPERATURE_MIN,
            delta_uv_default: 0,
            status_code: RANGE_UPDATE_SUCCESS,
            temperature_range_min: TEMPERATURE_MIN,
            temperature_range_max: TEMPERATURE_MAX,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
            ramps: [Ramp::default(); 3],
        }
    }

    pub fn status_for(&mut self, opcode: u32, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(opcode);
        match opcode {
            LIGHT_CTL_STATUS => {
                msg.add_le16(self.lightness);
                msg.add_le16(self.temperature);
                if self.transition.counter != 0 {
                    let remain = self.transition.calc_remain_time(now);
                    msg.add_le16(self.target_lightness);
                    msg.add_le16(self.target_temperature);
                    msg.add_u8(remain);
                }
            }
            LIGHT_CTL_TEMPERATURE_RANGE_STATUS => {
                msg.add_u8(self.status_code);
                msg.add_le16(self.temperature_range_min);
                msg.add_le16(self.temperature_range_max);
            }
            LIGHT_CTL_DEFAULT_STATUS => {
                msg.add_le16(self.lightness_default);
                msg.add_le16(self.temperature_default);
                msg.add_le16(self.delta_uv_default as u16);
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
        let setup = model.id == ModelId::LightCtlSetupSrv;
        match ctx.recv_op {
            LIGHT_CTL_GET | LIGHT_CTL_TEMPERATURE_RANGE_GET | LIGHT_CTL_DEFAULT_GET if !setup => {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let opcode = match ctx.recv_op {
                    LIGHT_CTL_GET => LIGHT_CTL_STATUS,
                    LIGHT_CTL_TEMPERATURE_RANGE_GET => LIGHT_CTL_TEMPERATURE_RANGE_STATUS,
                    _ => LIGHT_CTL_DEFAULT_STATUS,
                };
                let msg = self.status_for(opcode, now);
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            LIGHT_CTL_SET | LIGHT_CTL_SET_UNACK if !setup => {
                let lightness = buf.pull_le16()?;
                let temperature = buf.pull_le16()?;
                let delta_uv = buf.pull_le16()? as i16;
                let tid = buf.pull_u8()?;
                check_temperature(temperature)?;
                let tt = TransitionFields::parse(buf)?;

                let set = RecvSet::Ctl {
                    lightness,
                    temperature,
                    delta_uv,
                    tid,
                    tt,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, LIGHT_CTL_SET);
                transactional_set(self, (), &req, now, sink, |srv| {
                    srv.target_lightness = lightness;
                    srv.target_temperature = clamp_temperature(
                        temperature,
                        srv.temperature_range_min,
                        srv.temperature_range_max,
                    );
                    srv.target_delta_uv = delta_uv;
                });
                Ok(())
            }
            LIGHT_CTL_DEFAULT_SET | LIGHT_CTL_DEFAULT_SET_UNACK if setup => {
                let lightness = buf.pull_le16()?;
                let temperature = buf.pull_le16()?;
                let delta_uv = buf.pull_le16()? as i16;
                check_temperature(temperature)?;

                let set = RecvSet::CtlDefault {
                    lightness,
                    temperature,
                    delta_uv,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.lightness_default = lightness;
                self.temperature_default = clamp_temperature(
                    temperature,
                    self.temperature_range_min,
                    self.temperature_range_max,
                );
                self.delta_uv_default = delta_uv;
                let change = StateChange::CtlDefault {
                    lightness,
                    temperature: self.temperature_default,
                    delta_uv,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(LIGHT_CTL_DEFAULT_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_CTL_DEFAULT_SET, &msg);
                Ok(())
            }
            LIGHT_CTL_TEMPERATURE_RANGE_SET | LIGHT_CTL_TEMPERATURE_RANGE_SET_UNACK if setup => {
                let range_min = buf.pull_le16()?;
                let range_max = buf.pull_le16()?;
                check_temperature_range(range_min, range_max)?;

                let set = RecvSet::CtlTempRange {
                    range_min,
                    range_max,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.status_code = if range_min == TEMPERATURE_UNKNOWN {
                    CANNOT_SET_RANGE_MIN
                } else if range_max == TEMPERATURE_UNKNOWN {
                    CANNOT_SET_RANGE_MAX
                } else {
                    RANGE_UPDATE_SUCCESS
                };
                if range_min != TEMPERATURE_UNKNOWN {
                    self.temperature_range_min = range_min;
                }
                if range_max != TEMPERATURE_UNKNOWN {
                    self.temperature_range_max = range_max;
                }
                let change = StateChange::CtlTempRange {
                    range_min: self.temperature_range_min,
                    range_max: self.temperature_range_max,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(LIGHT_CTL_TEMPERATURE_RANGE_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_CTL_TEMPERATURE_RANGE_SET, &msg);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

/// Each bound lies in the Kelvin range or is unknown, and min <= max.
fn check_temperature_range(range_min: u16, range_max: u16) -> Result<()> {
    let valid = |value: u16| {
        value == TEMPERATURE_UNKNOWN || (TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&value)
    };
    if range_min > range_max || !valid(range_min) {
        return Err(ServerError::invalid("temperature range min", range_min));
    }
    if !valid(range_max) {
        return Err(ServerError::invalid("temperature range max", range_max));
    }
    Ok(())
}

impl TransitionModel for CtlServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::LightCtlSrv)
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
        self.lightness == self.target_lightness
            && self.temperature == self.target_temperature
            && self.delta_uv == self.target_delta_uv
    }

    fn prepare(&mut self, _ch: ()) {
        let counter = self.transition.counter;
        self.ramps = [
            Ramp::new(self.lightness as i32, self.target_lightness as i32, counter),
            Ramp::new(self.temperature as i32, self.target_temperature as i32, counter),
            Ramp::new(self.delta_uv as i32, self.target_delta_uv as i32, counter),
        ];
    }

    fn step(&mut self, _ch: ()) {
        self.lightness = step_u16(&mut self.ramps[0]);
        self.temperature = step_u16(&mut self.ramps[1]);
        self.delta_uv = clamp_i16(self.ramps[2].step() as i64);
    }

    fn complete(&mut self, _ch: ()) {
        self.lightness = self.target_lightness;
        self.temperature = self.target_temperature;
        self.delta_uv = self.target_delta_uv;
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::Ctl {
            lightness: self.lightness,
            temperature: self.temperature,
            delta_uv: self.delta_uv,
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        self.status_for(LIGHT_CTL_STATUS, now)
    }
}

/// Light CTL Temperature Server. Lives on its own element; the temperature
/// range is configured by the application.
#[derive(Clone, Debug)]
pub struct CtlTempServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub temperature: u16,
    pub target_temperature: u16,
    pub delta_uv: i16,
    pub target_delta_uv: i16,
    pub temperature_range_min: u16,
    pub temperature_range_max: u16,
    pub last: LastMsgInfo,
    pub transition: Transition,
    ramps: [Ramp; 2],
}

impl CtlTempServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            temperature: TEMPERATURE_MIN,
            target_temperature: TEMPERATURE_MIN,
            delta_uv: 0,
            target_delta_uv: 0,
            temperature_range_min: TEMPERATURE_MIN,
            temperature_range_max: TEMPERATURE_MAX,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
            ramps: [Ramp::default(); 2],
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
            LIGHT_CTL_TEMPERATURE_GET => {
                if !forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    let msg = self.status((), Some(ctx), now);
                    send_status(sink, model, ctx, &msg);
                }
                Ok(())
            }
            LIGHT_CTL_TEMPERATURE_SET | LIGHT_CTL_TEMPERATURE_SET_UNACK => {
                let temperature = buf.pull_le16()?;
                let delta_uv = buf.pull_le16()? as i16;
                let tid = buf.pull_u8()?;
                check_temperature(temperature)?;
                let tt = TransitionFields::parse(buf)?;

                let set = RecvSet::CtlTemperature {
                    temperature,
                    delta_uv,
                    tid,
                    tt,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, LIGHT_CTL_TEMPERATURE_SET);
                transactional_set(self, (), &req, now, sink, |srv| {
                    srv.target_temperature = clamp_temperature(
                        temperature,
                        srv.temperature_range_min,
                        srv.temperature_range_max,
                    );
                    srv.target_delta_uv = delta_uv;
                });
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

impl TransitionModel for CtlTempServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::LightCtlTempSrv)
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
        self.temperature == self.target_temperature && self.delta_uv == self.target_delta_uv
    }

    fn prepare(&mut self, _ch: ()) {
        let counter = self.transition.counter;
        self.ramps = [
            Ramp::new(self.temperature as i32, self.target_temperature as i32, counter),
            Ramp::new(self.delta_uv as i32, self.target_delta_uv as i32, counter),
        ];
    }

    fn step(&mut self, _ch: ()) {
        self.temperature = step_u16(&mut self.ramps[0]);
        self.delta_uv = clamp_i16(self.ramps[1].step() as i64);
    }

    fn complete(&mut self, _ch: ()) {
        self.temperature = self.target_temperature;
        self.delta_uv = self.target_delta_uv;
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::CtlTemperature {
            temperature: self.temperature,
            delta_uv: self.delta_uv,
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(LIGHT_CTL_TEMPERATURE_STATUS);
        msg.add_le16(self.temperature);
        msg.add_le16(self.delta_uv as u16);
        if self.transition.counter != 0 {
            let remain = self.transition.calc_remain_time(now);
            msg.add_le16(self.target_temperature);
            msg.add_le16(self.target_delta_uv as u16);
            msg.add_u8(remain);
        }
        msg
    }
}

/// Light HSL Server together with its Setup Server.
#[derive(Clone, Debug)]
pub struct HslServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub lightness: u16,
    pub target_lightness: u16,
    pub hue: u16,
    pub target_hue: u16,
    pub saturation: u16,
    pub target_saturation: u16,
    pub lightness_default: u16,
    pub hue_default: u16,
    pub saturation_default: u16,
    pub status_code: u8,
    pub hue_range_min: u16,
    pub hue_range_max: u16,
    pub saturation_range_min: u16,
    pub saturation_range_max: u16,
    pub last: LastMsgInfo,
    pub transition: Transition,
    // lightness, hue, saturation
    ramps: [Ramp; 3],
}

impl HslServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            lightness: 0,
            target_lightness: 0,
            hue: 0,
            target_hue: 0,
            saturation: 0,
            target_saturation: 0,
            lightness_default: 0,
            hue_default: 0,
            saturation_default: 0,
            status_code: RANGE_UPDATE_SUCCESS,
            hue_range_min: 0,
            hue_range_max: 0,
            saturation_range_min: 0,
            saturation_range_max: 0,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
            ramps: [Ramp::default(); 3],
        }
    }

    pub fn status_for(&mut self, opcode: u32, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(opcode);
        match opcode {
            LIGHT_HSL_STATUS | LIGHT_HSL_TARGET_STATUS => {
                let (lightness, hue, saturation) = if opcode == LIGHT_HSL_STATUS {
                    (self.lightness, self.hue, self.saturation)
                } else {
                    (self.target_lightness, self.target_hue, self.target_saturation)
                };
                msg.add_le16(lightness);
                msg.add_le16(hue);
                msg.add_le16(saturation);
                if self.transition.counter != 0 {
                    msg.add_u8(self.transition.calc_remain_time(now));
                }
            }
            LIGHT_HSL_DEFAULT_STATUS => {
                msg.add_le16(self.lightness_default);
                msg.add_le16(self.hue_default);
                msg.add_le16(self.saturation_default);
            }
            LIGHT_HSL_RANGE_STATUS => {
                msg.add_u8(self.status_code);
                msg.add_le16(self.hue_range_min);
                msg.add_le16(self.hue_range_max);
                msg.add_le16(self.saturation_range_min);
                msg.add_le16(self.saturation_range_max);
            }
            _ => {}
        }
        msg
    }

    fn clamp_hue(&self, hue: u16) -> u16 {
        clamp_to_range(hue, self.hue_range_min, self.hue_range_max)
    }

    fn clamp_saturation(&self, saturation: u16) -> u16 {
        clamp_to_range(saturation, self.saturation_range_min, self.saturation_range_max)
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let setup = model.id == ModelId::LightHslSetupSrv;
        match ctx.recv_op {
            LIGHT_HSL_GET | LIGHT_HSL_TARGET_GET | LIGHT_HSL_DEFAULT_GET | LIGHT_HSL_RANGE_GET
                if !setup =>
            {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let opcode = match ctx.recv_op {
                    LIGHT_HSL_GET => LIGHT_HSL_STATUS,
                    LIGHT_HSL_TARGET_GET => LIGHT_HSL_TARGET_STATUS,
                    LIGHT_HSL_DEFAULT_GET => LIGHT_HSL_DEFAULT_STATUS,
                    _ => LIGHT_HSL_RANGE_STATUS,
                };
                let msg = self.status_for(opcode, now);
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            LIGHT_HSL_SET | LIGHT_HSL_SET_UNACK if !setup => {
                let lightness = buf.pull_le16()?;
                let hue = buf.pull_le16()?;
                let saturation = buf.pull_le16()?;
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                let set = RecvSet::Hsl {
                    lightness,
                    hue,
                    saturation,
                    tid,
                    tt,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, LIGHT_HSL_SET);
                transactional_set(self, (), &req, now, sink, |srv| {
                    srv.target_lightness = lightness;
                    srv.target_hue = srv.clamp_hue(hue);
                    srv.target_saturation = srv.clamp_saturation(saturation);
                });
                Ok(())
            }
            LIGHT_HSL_DEFAULT_SET | LIGHT_HSL_DEFAULT_SET_UNACK if setup => {
                let lightness = buf.pull_le16()?;
                let hue = buf.pull_le16()?;
                let saturation = buf.pull_le16()?;

                let set = RecvSet::HslDefault {
                    lightness,
                    hue,
                    saturation,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.lightness_default = lightness;
                self.hue_default = self.clamp_hue(hue);
                self.saturation_default = self.clamp_saturation(saturation);
                let change = StateChange::HslDefault {
                    lightness,
                    hue: self.hue_default,
                    saturation: self.saturation_default,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(LIGHT_HSL_DEFAULT_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_HSL_DEFAULT_SET, &msg);
                Ok(())
            }
            LIGHT_HSL_RANGE_SET | LIGHT_HSL_RANGE_SET_UNACK if setup => {
                let hue_range_min = buf.pull_le16()?;
                let hue_range_max = buf.pull_le16()?;
                let saturation_range_min = buf.pull_le16()?;
                let saturation_range_max = buf.pull_le16()?;
                check_range("hue range min", hue_range_min, hue_range_max)?;
                check_range("saturation range min", saturation_range_min, saturation_range_max)?;

                let set = RecvSet::HslRange {
                    hue_range_min,
                    hue_range_max,
                    saturation_range_min,
                    saturation_range_max,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.status_code = RANGE_UPDATE_SUCCESS;
                self.hue_range_min = hue_range_min;
                self.hue_range_max = hue_range_max;
                self.saturation_range_min = saturation_range_min;
                self.saturation_range_max = saturation_range_max;
                let change = StateChange::HslRange {
                    hue_range_min,
                    hue_range_max,
                    saturation_range_min,
                    saturation_range_max,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(LIGHT_HSL_RANGE_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_HSL_RANGE_SET, &msg);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

impl TransitionModel for HslServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::LightHslSrv)
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
        self.lightness == self.target_lightness
            && self.hue == self.target_hue
            && self.saturation == self.target_saturation
    }

    fn prepare(&mut self, _ch: ()) {
        let counter = self.transition.counter;
        self.ramps = [
            Ramp::new(self.lightness as i32, self.target_lightness as i32, counter),
            Ramp::new(self.hue as i32, self.target_hue as i32, counter),
            Ramp::new(self.saturation as i32, self.target_saturation as i32, counter),
        ];
    }

    fn step(&mut self, _ch: ()) {
        self.lightness = step_u16(&mut self.ramps[0]);
        self.hue = step_u16(&mut self.ramps[1]);
        self.saturation = step_u16(&mut self.ramps[2]);
    }

    fn complete(&mut self, _ch: ()) {
        self.lightness = self.target_lightness;
        self.hue = self.target_hue;
        self.saturation = self.target_saturation;
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::Hsl {
            lightness: self.lightness,
            hue: self.hue,
            saturation: self.saturation,
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        self.status_for(LIGHT_HSL_STATUS, now)
    }
}

/// Which HSL component a [`HslComponentServer`] serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HslComponent {
    Hue,
    Saturation,
}

impl HslComponent {
    pub fn model_id(self) -> ModelId {
        match self {
            HslComponent::Hue => ModelId::LightHslHueSrv,
            HslComponent::Saturation => ModelId::LightHslSatSrv,
        }
    }

    fn get_opcode(self) -> u32 {
        match self {
            HslComponent::Hue => LIGHT_HSL_HUE_GET,
            HslComponent::Saturation => LIGHT_HSL_SATURATION_GET,
        }
    }

    fn set_opcode(self) -> u32 {
        match self {
            HslComponent::Hue => LIGHT_HSL_HUE_SET,
            HslComponent::Saturation => LIGHT_HSL_SATURATION_SET,
        }
    }

    fn set_unack_opcode(self) -> u32 {
        match self {
            HslComponent::Hue => LIGHT_HSL_HUE_SET_UNACK,
            HslComponent::Saturation => LIGHT_HSL_SATURATION_SET_UNACK,
        }
    }

    fn status_opcode(self) -> u32 {
        match self {
            HslComponent::Hue => LIGHT_HSL_HUE_STATUS,
            HslComponent::Saturation => LIGHT_HSL_SATURATION_STATUS,
        }
    }
}

/// Light HSL Hue Server or Light HSL Saturation Server. Lives on its own
/// element; the range is configured by the application.
#[derive(Clone, Debug)]
pub struct HslComponentServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub component: HslComponent,
    pub value: u16,
    pub target: u16,
    pub range_min: u16,
    pub range_max: u16,
    pub last: LastMsgInfo,
    pub transition: Transition,
    ramp: Ramp,
}

impl HslComponentServer {
    pub fn new(element: u16, component: HslComponent, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            component,
            value: 0,
            target: 0,
            range_min: 0,
            range_max: 0,
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
        let component = self.component;

        if ctx.recv_op == component.get_opcode() {
            if !forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                let msg = self.status((), Some(ctx), now);
                send_status(sink, model, ctx, &msg);
            }
            return Ok(());
        }

        if ctx.recv_op != component.set_opcode() && ctx.recv_op != component.set_unack_opcode() {
            return Err(unknown_opcode(model, ctx));
        }

        let value = buf.pull_le16()?;
        let tid = buf.pull_u8()?;
        let tt = TransitionFields::parse(buf)?;

        let set = match component {
            HslComponent::Hue => RecvSet::HslHue { hue: value, tid, tt },
            HslComponent::Saturation => RecvSet::HslSaturation {
                saturation: value,
                tid,
                tt,
            },
        };
        if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
            return Ok(());
        }

        let req = SetRequest::new(ctx, tid, tt, component.set_opcode());
        transactional_set(self, (), &req, now, sink, |srv| {
            srv.target = clamp_to_range(value, srv.range_min, srv.range_max)
        });
        Ok(())
    }
}

impl TransitionModel for HslComponentServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, self.component.model_id())
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
        self.value == self.target
    }

    fn prepare(&mut self, _ch: ()) {
        self.ramp = Ramp::new(self.value as i32, self.target as i32, self.transition.counter);
    }

    fn step(&mut self, _ch: ()) {
        self.value = step_u16(&mut self.ramp);
    }

    fn complete(&mut self, _ch: ()) {
        self.value = self.target;
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        match self.component {
            HslComponent::Hue => StateChange::HslHue { hue: self.value },
            HslComponent::Saturation => StateChange::HslSaturation {
                saturation: self.value,
            },
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(self.component.status_opcode());
        msg.add_le16(self.value);
        if self.transition.counter != 0 {
            let remain = self.transition.calc_remain_time(now);
            msg.add_le16(self.target);
            msg.add_u8(remain);
        }
        msg
    }
}

/// Light xyL Server together with its Setup Server.
#[derive(Clone, Debug)]
pub struct XylServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub lightness: u16,
    pub target_lightness: u16,
    pub x: u16,
    pub target_x: u16,
    pub y: u16,
    pub target_y: u16,
    pub lightness_default: u16,
    pub x_default: u16,
    pub y_default: u16,
    pub status_code: u8,
    pub x_range_min: u16,
    pub x_range_max: u16,
    pub y_range_min: u16,
    pub y_range_max: u16,
    pub last: LastMsgInfo,
    pub transition: Transition,
    // lightness, x, y
    ramps: [Ramp; 3],
}

impl XylServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            lightness: 0,
            target_lightness: 0,
            x: 0,
            target_x: 0,
            y: 0,
            target_y: 0,
            lightness_default: 0,
            x_default: 0,
            y_default: 0,
            status_code: RANGE_UPDATE_SUCCESS,
            x_range_min: 0,
            x_range_max: 0,
            y_range_min: 0,
            y_range_max: 0,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
            ramps: [Ramp::default(); 3],
        }
    }

    pub fn status_for(&mut self, opcode: u32, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(opcode);
        match opcode {
            LIGHT_XYL_STATUS | LIGHT_XYL_TARGET_STATUS => {
                let (lightness, x, y) = if opcode == LIGHT_XYL_STATUS {
                    (self.lightness, self.x, self.y)
                } else {
                    (self.target_lightness, self.target_x, self.target_y)
                };
                msg.add_le16(lightness);
                msg.add_le16(x);
                msg.add_le16(y);
                if self.transition.counter != 0 {
                    msg.add_u8(self.transition.calc_remain_time(now));
                }
            }
            LIGHT_XYL_DEFAULT_STATUS => {
                msg.add_le16(self.lightness_default);
                msg.add_le16(self.x_default);
                msg.add_le16(self.y_default);
            }
            LIGHT_XYL_RANGE_STATUS => {
                msg.add_u8(self.status_code);
                msg.add_le16(self.x_range_min);
                msg.add_le16(self.x_range_max);
                msg.add_le16(self.y_range_min);
                msg.add_le16(self.y_range_max);
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
        let setup = model.id == ModelId::LightXylSetupSrv;
        match ctx.recv_op {
            LIGHT_XYL_GET | LIGHT_XYL_TARGET_GET | LIGHT_XYL_DEFAULT_GET | LIGHT_XYL_RANGE_GET
                if !setup =>
            {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let opcode = match ctx.recv_op {
                    LIGHT_XYL_GET => LIGHT_XYL_STATUS,
                    LIGHT_XYL_TARGET_GET => LIGHT_XYL_TARGET_STATUS,
                    LIGHT_XYL_DEFAULT_GET => LIGHT_XYL_DEFAULT_STATUS,
                    _ => LIGHT_XYL_RANGE_STATUS,
                };
                let msg = self.status_for(opcode, now);
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            LIGHT_XYL_SET | LIGHT_XYL_SET_UNACK if !setup => {
                let lightness = buf.pull_le16()?;
                let x = buf.pull_le16()?;
                let y = buf.pull_le16()?;
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                let set = RecvSet::Xyl {
                    lightness,
                    x,
                    y,
                    tid,
                    tt,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, LIGHT_XYL_SET);
                transactional_set(self, (), &req, now, sink, |srv| {
                    srv.target_lightness = lightness;
                    srv.target_x = clamp_to_range(x, srv.x_range_min, srv.x_range_max);
                    srv.target_y = clamp_to_range(y, srv.y_range_min, srv.y_range_max);
                });
                Ok(())
            }
            LIGHT_XYL_DEFAULT_SET | LIGHT_XYL_DEFAULT_SET_UNACK if setup => {
                let lightness = buf.pull_le16()?;
                let x = buf.pull_le16()?;
                let y = buf.pull_le16()?;

                let set = RecvSet::XylDefault { lightness, x, y };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.lightness_default = lightness;
                self.x_default = clamp_to_range(x, self.x_range_min, self.x_range_max);
                self.y_default = clamp_to_range(y, self.y_range_min, self.y_range_max);
                let change = StateChange::XylDefault {
                    lightness,
                    x: self.x_default,
                    y: self.y_default,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(LIGHT_XYL_DEFAULT_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_XYL_DEFAULT_SET, &msg);
                Ok(())
            }
            LIGHT_XYL_RANGE_SET | LIGHT_XYL_RANGE_SET_UNACK if setup => {
                let x_range_min = buf.pull_le16()?;
                let x_range_max = buf.pull_le16()?;
                let y_range_min = buf.pull_le16()?;
                let y_range_max = buf.pull_le16()?;
                check_range("x range min", x_range_min, x_range_max)?;
                check_range("y range min", y_range_min, y_range_max)?;

                let set = RecvSet::XylRange {
                    x_range_min,
                    x_range_max,
                    y_range_min,
                    y_range_max,
                };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                self.status_code = RANGE_UPDATE_SUCCESS;
                self.x_range_min = x_range_min;
                self.x_range_max = x_range_max;
                self.y_range_min = y_range_min;
                self.y_range_max = y_range_max;
                let change = StateChange::XylRange {
                    x_range_min,
                    x_range_max,
                    y_range_min,
                    y_range_max,
                };
                notify_change(sink, model, ctx, change);

                let msg = self.status_for(LIGHT_XYL_RANGE_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_XYL_RANGE_SET, &msg);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

impl TransitionModel for XylServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::LightXylSrv)
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
        self.lightness == self.target_lightness && self.x == self.target_x && self.y == self.target_y
    }

    fn prepare(&mut self, _ch: ()) {
        let counter = self.transition.counter;
        self.ramps = [
            Ramp::new(self.lightness as i32, self.target_lightness as i32, counter),
            Ramp::new(self.x as i32, self.target_x as i32, counter),
            Ramp::new(self.y as i32, self.target_y as i32, counter),
        ];
    }

    fn step(&mut self, _ch: ()) {
        self.lightness = step_u16(&mut self.ramps[0]);
        self.x = step_u16(&mut self.ramps[1]);
        self.y = step_u16(&mut self.ramps[2]);
    }

    fn complete(&mut self, _ch: ()) {
        self.lightness = self.target_lightness;
        self.x = self.target_x;
        self.y = self.target_y;
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::Xyl {
            lightness: self.lightness,
            x: self.x,
            y: self.y,
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        self.status_for(LIGHT_XYL_STATUS, now)
    }
}

/// Light LC Server: mode, occupancy mode and the binary Light OnOff state.
#[derive(Clone, Debug)]
pub struct LcServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub mode: u8,
    pub occupancy_mode: u8,
    pub light_onoff: u8,
    pub target_light_onoff: u8,
    pub last: LastMsgInfo,
    pub transition: Transition,
}

impl LcServer {
    pub fn new(element: u16, rsp_ctrl: RspCtrl) -> Self {
        Self {
            element,
            rsp_ctrl,
            mode: 0,
            occupancy_mode: 0,
            light_onoff: 0,
            target_light_onoff: 0,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
        }
    }

    pub fn status_for(&mut self, opcode: u32, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(opcode);
        match opcode {
            LIGHT_LC_MODE_STATUS => msg.add_u8(self.mode),
            LIGHT_LC_OM_STATUS => msg.add_u8(self.occupancy_mode),
            LIGHT_LC_LIGHT_ONOFF_STATUS => {
                msg.add_u8(self.light_onoff);
                if self.transition.counter != 0 {
                    let remain = self.transition.calc_remain_time(now);
                    msg.add_u8(self.target_light_onoff);
                    msg.add_u8(remain);
                }
            }
            _ => {}
        }
        msg
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
            LIGHT_LC_MODE_GET | LIGHT_LC_OM_GET | LIGHT_LC_LIGHT_ONOFF_GET => {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let opcode = match ctx.recv_op {
                    LIGHT_LC_MODE_GET => LIGHT_LC_MODE_STATUS,
                    LIGHT_LC_OM_GET => LIGHT_LC_OM_STATUS,
                    _ => LIGHT_LC_LIGHT_ONOFF_STATUS,
                };
                let msg = self.status_for(opcode, now);
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            LIGHT_LC_MODE_SET | LIGHT_LC_MODE_SET_UNACK => {
                let mode = buf.pull_u8()?;
                if mode > STATE_ON {
                    return Err(ServerError::invalid("lc mode", mode));
                }

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::LcMode { mode }, sink) {
                    return Ok(());
                }

                self.mode = mode;
                notify_change(sink, model, ctx, StateChange::LcMode { mode });
                let msg = self.status_for(LIGHT_LC_MODE_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_LC_MODE_SET, &msg);
                Ok(())
            }
            LIGHT_LC_OM_SET | LIGHT_LC_OM_SET_UNACK => {
                let mode = buf.pull_u8()?;
                if mode > STATE_ON {
                    return Err(ServerError::invalid("lc occupancy mode", mode));
                }

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::LcOm { mode }, sink) {
                    return Ok(());
                }

                self.occupancy_mode = mode;
                notify_change(sink, model, ctx, StateChange::LcOm { mode });
                let msg = self.status_for(LIGHT_LC_OM_STATUS, now);
                respond(sink, model, ctx, ctx.recv_op == LIGHT_LC_OM_SET, &msg);
                Ok(())
            }
            LIGHT_LC_LIGHT_ONOFF_SET | LIGHT_LC_LIGHT_ONOFF_SET_UNACK => {
                let onoff = buf.pull_u8()?;
                let tid = buf.pull_u8()?;
                let tt = TransitionFields::parse(buf)?;

                let set = RecvSet::LcLightOnOff { onoff, tid, tt };
                if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
                    return Ok(());
                }

                let req = SetRequest::new(ctx, tid, tt, LIGHT_LC_LIGHT_ONOFF_SET);
                transactional_set(self, (), &req, now, sink, |srv| srv.target_light_onoff = onoff);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }
}

impl TransitionModel for LcServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::LightLcSrv)
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
        self.light_onoff == self.target_light_onoff
    }

    fn prepare(&mut self, _ch: ()) {}

    fn step(&mut self, _ch: ()) {}

    fn complete(&mut self, _ch: ()) {
        self.light_onoff = self.target_light_onoff;
    }

    fn begin(&mut self, _ch: ()) -> bool {
        if self.target_light_onoff == STATE_ON {
            self.light_onoff = STATE_ON;
            return true;
        }
        false
    }

    fn reports_step(&self, _ch: (), done: bool) -> bool {
        done && self.target_light_onoff != STATE_ON
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::LcLightOnOff {
            onoff: self.light_onoff,
        }
    }

    fn status(&mut self, _ch: (), _ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        self.status_for(LIGHT_LC_LIGHT_ONOFF_STATUS, now)
    }
}

/// Lighting server models of every element, behind one category lock.
#[derive(Default)]
pub struct LightingServers {
    lightness: Vec<LightnessServer, MAX_ELEMENTS>,
    ctl: Vec<CtlServer, MAX_ELEMENTS>,
    ctl_temp: Vec<CtlTempServer, MAX_ELEMENTS>,
    hsl: Vec<HslServer, MAX_ELEMENTS>,
    hsl_hue: Vec<HslComponentServer, MAX_ELEMENTS>,
    hsl_sat: Vec<HslComponentServer, MAX_ELEMENTS>,
    xyl: Vec<XylServer, MAX_ELEMENTS>,
    lc: Vec<LcServer, MAX_ELEMENTS>,
}

impl LightingServers {
    pub const fn new() -> Self {
        Self {
            lightness: Vec::new(),
            ctl: Vec::new(),
            ctl_temp: Vec::new(),
            hsl: Vec::new(),
            hsl_hue: Vec::new(),
            hsl_sat: Vec::new(),
            xyl: Vec::new(),
            lc: Vec::new(),
        }
    }

    crate::element_table!(lightness, LightnessServer);
    crate::element_table!(ctl, CtlServer);
    crate::element_table!(ctl_temp, CtlTempServer);
    crate::element_table!(hsl, HslServer);
    crate::element_table!(hsl_hue, HslComponentServer);
    crate::element_table!(hsl_sat, HslComponentServer);
    crate::element_table!(xyl, XylServer);
    crate::element_table!(lc, LcServer);
}

impl Servers for LightingServers {
    const NAME: &'static str = "Lighting";

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
            ModelId::LightLightnessSrv | ModelId::LightLightnessSetupSrv => {
                crate::find_server!(self, lightness, model).handle(model, ctx, &mut buf, now, sink)
            }
            ModelId::LightCtlSrv | ModelId::LightCtlSetupSrv => {
                crate::find_server!(self, ctl, model).handle(model, ctx, &mut buf, now, sink)
            }
            ModelId::LightCtlTempSrv => {
                crate::find_server!(self, ctl_temp, model).handle(ctx, &mut buf, now, sink)
            }
            ModelId::LightHslSrv | ModelId::LightHslSetupSrv => {
                crate::find_server!(self, hsl, model).handle(model, ctx, &mut buf, now, sink)
            }
            ModelId::LightHslHueSrv => {
                crate::find_server!(self, hsl_hue, model).handle(ctx, &mut buf, now, sink)
            }
            ModelId::LightHslSatSrv => {
                crate::find_server!(self, hsl_sat, model).handle(ctx, &mut buf, now, sink)
            }
            ModelId::LightXylSrv | ModelId::LightXylSetupSrv => {
                crate::find_server!(self, xyl, model).handle(model, ctx, &mut buf, now, sink)
            }
            ModelId::LightLcSrv => crate::find_server!(self, lc, model).handle(ctx, &mut buf, now, sink),
            _ => Err(ServerError::NoSuchModel {
                model: model.id,
                element: model.element,
            }),
        }
    }

    fn poll<S: MeshSink>(&mut self, now: Instant, sink: &mut S) -> Option<Instant> {
        let mut next = None;
        for srv in self.lightness.iter_mut() {
            next = earliest(next, poll_transition(srv, LightnessChannel::Actual, now, sink));
            next = earliest(next, poll_transition(srv, LightnessChannel::Linear, now, sink));
        }
        for srv in self.ctl.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        for srv in self.ctl_temp.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        for srv in self.hsl.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        for srv in self.hsl_hue.iter_mut().chain(self.hsl_sat.iter_mut()) {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        for srv in self.xyl.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        for srv in self.lc.iter_mut() {
            next = earliest(next, poll_transition(srv, (), now, sink));
        }
        next
    }

    fn bound_model(&mut self, model: ModelRef) -> Option<BoundModel<'_>> {
        let element = model.element;
        match model.id {
            ModelId::LightLightnessSrv | ModelId::LightLightnessSetupSrv => {
                self.lightness_mut(element).map(BoundModel::Lightness)
            }
            ModelId::LightCtlSrv | ModelId::LightCtlSetupSrv => self.ctl_mut(element).map(BoundModel::Ctl),
            ModelId::LightCtlTempSrv => self.ctl_temp_mut(element).map(BoundModel::CtlTemp),
            ModelId::LightHslSrv | ModelId::LightHslSetupSrv => self.hsl_mut(element).map(BoundModel::Hsl),
            ModelId::LightHslHueSrv => self.hsl_hue_mut(element).map(BoundModel::HslComponent),
            ModelId::LightHslSatSrv => self.hsl_sat_mut(element).map(BoundModel::HslComponent),
            ModelId::LightXylSrv | ModelId::LightXylSetupSrv => self.xyl_mut(element).map(BoundModel::Xyl),
            ModelId::LightLcSrv => self.lc_mut(element).map(BoundModel::Lc),
            _ => None,
        }
    }
}
