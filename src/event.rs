//! Events delivered to the application through [`MeshSink::notify`].
//!
//! [`MeshSink::notify`]: crate::server::MeshSink::notify

use crate::models::scheduler::ScheduleEntry;
use crate::models::time::TimeFields;
use crate::transition::TransitionFields;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// A model state changed (at set time, at transition start or per step).
    StateChange(StateChange),
    /// A Get arrived for a model whose Get responses are handled by the app.
    RecvGet(RecvGet),
    /// A Set arrived for a model whose Set responses are handled by the app.
    RecvSet(RecvSet),
    /// A Status arrived for a model whose Status handling is left to the app.
    RecvStatus(RecvStatus),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateChange {
    OnOff { onoff: u8 },
    Level { level: i16 },
    Delta { level: i16 },
    Move { level: i16 },
    DefTransTime { trans_time: u8 },
    OnPowerUp { onpowerup: u8 },
    PowerLevel { power: u16 },
    PowerDefault { power: u16 },
    PowerRange { range_min: u16, range_max: u16 },

    Lightness { lightness: u16 },
    LightnessLinear { lightness: u16 },
    LightnessDefault { lightness: u16 },
    LightnessRange { range_min: u16, range_max: u16 },
    Ctl { lightness: u16, temperature: u16, delta_uv: i16 },
    CtlTemperature { temperature: u16, delta_uv: i16 },
    CtlDefault { lightness: u16, temperature: u16, delta_uv: i16 },
    CtlTempRange { range_min: u16, range_max: u16 },
    Hsl { lightness: u16, hue: u16, saturation: u16 },
    HslHue { hue: u16 },
    HslSaturation { saturation: u16 },
    HslDefault { lightness: u16, hue: u16, saturation: u16 },
    HslRange {
        hue_range_min: u16,
        hue_range_max: u16,
        saturation_range_min: u16,
        saturation_range_max: u16,
    },
    Xyl { lightness: u16, x: u16, y: u16 },
    XylDefault { lightness: u16, x: u16, y: u16 },
    XylRange {
        x_range_min: u16,
        x_range_max: u16,
        y_range_min: u16,
        y_range_max: u16,
    },
    LcMode { mode: u8 },
    LcOm { mode: u8 },
    LcLightOnOff { onoff: u8 },

    Time(TimeFields),
    TimeZone { time_zone_offset_new: u8, tai_zone_change: [u8; 5] },
    TaiUtcDelta { tai_utc_delta_new: u16, tai_delta_change: [u8; 5] },
    TimeRole { role: u8 },
    SceneStore { scene_number: u16 },
    SceneRecall { scene_number: u16 },
    SceneDelete { scene_number: u16 },
    SchedulerActSet(ScheduleEntry),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecvGet {
    /// The Get opcode itself (in the message context) says what is asked for.
    State,
    SchedulerAct { index: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecvSet {
    OnOff { onoff: u8, tid: u8, tt: TransitionFields },
    Level { level: i16, tid: u8, tt: TransitionFields },
    Delta { delta_level: i32, tid: u8, tt: TransitionFields },
    Move { delta_level: i16, tid: u8, tt: TransitionFields },
    DefTransTime { trans_time: u8 },
    OnPowerUp { onpowerup: u8 },
    PowerLevel { power: u16, tid: u8, tt: TransitionFields },
    PowerDefault { power: u16 },
    PowerRange { range_min: u16, range_max: u16 },

    Lightness { lightness: u16, tid: u8, tt: TransitionFields },
    LightnessLinear { lightness: u16, tid: u8, tt: TransitionFields },
    LightnessDefault { lightness: u16 },
    LightnessRange { range_min: u16, range_max: u16 },
    Ctl {
        lightness: u16,
        temperature: u16,
        delta_uv: i16,
        tid: u8,
        tt: TransitionFields,
    },
    CtlTemperature {
        temperature: u16,
        delta_uv: i16,
        tid: u8,
        tt: TransitionFields,
    },
    CtlDefault { lightness: u16, temperature: u16, delta_uv: i16 },
    CtlTempRange { range_min: u16, range_max: u16 },
    Hsl {
        lightness: u16,
        hue: u16,
        saturation: u16,
        tid: u8,
        tt: TransitionFields,
    },
    HslHue { hue: u16, tid: u8, tt: TransitionFields },
    HslSaturation { saturation: u16, tid: u8, tt: TransitionFields },
    HslDefault { lightness: u16, hue: u16, saturation: u16 },
    HslRange {
        hue_range_min: u16,
        hue_range_max: u16,
        saturation_range_min: u16,
        saturation_range_max: u16,
    },
    Xyl {
        lightness: u16,
        x: u16,
        y: u16,
        tid: u8,
        tt: TransitionFields,
    },
    XylDefault { lightness: u16, x: u16, y: u16 },
    XylRange {
        x_range_min: u16,
        x_range_max: u16,
        y_range_min: u16,
        y_range_max: u16,
    },
    LcMode { mode: u8 },
    LcOm { mode: u8 },
    LcLightOnOff { onoff: u8, tid: u8, tt: TransitionFields },

    Time(TimeFields),
    TimeZone { time_zone_offset_new: u8, tai_zone_change: [u8; 5] },
    TaiUtcDelta { tai_utc_delta_new: u16, tai_delta_change: [u8; 5] },
    TimeRole { role: u8 },
    SceneStore { scene_number: u16 },
    SceneRecall { scene_number: u16, tid: u8, tt: TransitionFields },
    SceneDelete { scene_number: u16 },
    SchedulerActSet(ScheduleEntry),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecvStatus {
    Time(TimeFields),
}
