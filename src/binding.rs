//! Instantaneous writes of a bound state into a model.
//!
//! When a transition of one model reaches its target, or the application sets a
//! state directly, the states bound to it in the Mesh Model composite state
//! graph are pushed here. The write bypasses the target model's own transition
//! and publishes its Status right away.

use embassy_time::Instant;
use log::{debug, warn};

use crate::common::{ModelId, ModelRef};
use crate::error::{Result, ServerError};
use crate::models::generic::{LevelServer, OnOffServer, OnPowerUp, PowerLevelServer, PowerOnOffServer};
use crate::models::lighting::{
    CtlServer, CtlTempServer, HslComponent, HslComponentServer, HslServer, LcServer,
    LightnessChannel, LightnessServer, XylServer,
};
use crate::server::{publish_status, MeshSink, TransitionModel};

/// A state value to write, tagged with the state it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingValue {
    GenericOnOff { onoff: u8 },
    GenericLevel { level: i16 },
    GenericOnPowerUp { onpowerup: OnPowerUp },
    GenericPowerActual { power: u16 },
    LightnessActual { lightness: u16 },
    LightnessLinear { lightness: u16 },
    CtlLightness { lightness: u16 },
    CtlTempDeltaUv { temperature: u16, delta_uv: i16 },
    Hsl { lightness: u16, hue: u16, saturation: u16 },
    HslLightness { lightness: u16 },
    HslHue { hue: u16 },
    HslSaturation { saturation: u16 },
    XylLightness { lightness: u16 },
    LcLightOnOff { onoff: u8 },
}

impl BindingValue {
    pub fn state_name(&self) -> &'static str {
        match self {
            BindingValue::GenericOnOff { .. } => "Generic OnOff",
            BindingValue::GenericLevel { .. } => "Generic Level",
            BindingValue::GenericOnPowerUp { .. } => "Generic OnPowerUp",
            BindingValue::GenericPowerActual { .. } => "Generic Power Actual",
            BindingValue::LightnessActual { .. } => "Lightness Actual",
            BindingValue::LightnessLinear { .. } => "Lightness Linear",
            BindingValue::CtlLightness { .. } => "CTL Lightness",
            BindingValue::CtlTempDeltaUv { .. } => "CTL Temperature",
            BindingValue::Hsl { .. } => "HSL",
            BindingValue::HslLightness { .. } => "HSL Lightness",
            BindingValue::HslHue { .. } => "HSL Hue",
            BindingValue::HslSaturation { .. } => "HSL Saturation",
            BindingValue::XylLightness { .. } => "xyL Lightness",
            BindingValue::LcLightOnOff { .. } => "LC Light OnOff",
        }
    }
}

/// A model instance a binding may write to, borrowed from its category.
pub enum BoundModel<'a> {
    OnOff(&'a mut OnOffServer),
    Level(&'a mut LevelServer),
    PowerOnOff(&'a mut PowerOnOffServer),
    PowerLevel(&'a mut PowerLevelServer),
    Lightness(&'a mut LightnessServer),
    Ctl(&'a mut CtlServer),
    CtlTemp(&'a mut CtlTempServer),
    Hsl(&'a mut HslServer),
    HslComponent(&'a mut HslComponentServer),
    Xyl(&'a mut XylServer),
    Lc(&'a mut LcServer),
}

impl BoundModel<'_> {
    pub fn model(&self) -> ModelRef {
        match self {
            BoundModel::OnOff(srv) => srv.model(()),
            BoundModel::Level(srv) => srv.model(()),
            BoundModel::PowerOnOff(srv) => ModelRef::new(srv.element, ModelId::GenPowerOnOffSrv),
            BoundModel::PowerLevel(srv) => srv.model(()),
            BoundModel::Lightness(srv) => srv.model(LightnessChannel::Actual),
            BoundModel::Ctl(srv) => srv.model(()),
            BoundModel::CtlTemp(srv) => srv.model(()),
            BoundModel::Hsl(srv) => srv.model(()),
            BoundModel::HslComponent(srv) => srv.model(()),
            BoundModel::Xyl(srv) => srv.model(()),
            BoundModel::Lc(srv) => srv.model(()),
        }
    }
}

/// Writes `value` into `bound`, stopping the transition of the written state,
/// and publishes the model's Status.
///
/// A value of a state the model does not hold is refused with
/// [`ServerError::ModelMismatch`] and nothing is written.
pub fn update_binding_state<S: MeshSink>(
    bound: BoundModel<'_>,
    value: BindingValue,
    now: Instant,
    sink: &mut S,
) -> Result<()> {
    let model = bound.model();
    debug!("Binding {} into {:?} on 0x{:04x}", value.state_name(), model.id, model.element);

    let msg = match (bound, value) {
        (BoundModel::OnOff(srv), BindingValue::GenericOnOff { onoff }) => {
            srv.transition.stop();
            srv.onoff = onoff;
            srv.target_onoff = onoff;
            srv.status((), None, now)
        }
        (BoundModel::Level(srv), BindingValue::GenericLevel { level }) => {
            srv.transition.stop();
            srv.level = level;
            srv.target_level = level;
            srv.status((), None, now)
        }
        (BoundModel::PowerOnOff(srv), BindingValue::GenericOnPowerUp { onpowerup }) => {
            srv.onpowerup = onpowerup;
            srv.status()
        }
        (BoundModel::PowerLevel(srv), BindingValue::GenericPowerActual { power }) => {
            srv.transition.stop();
            srv.power_actual = power;
            srv.target_power_actual = power;
            if power != 0 {
                srv.power_last = power;
            }
            srv.status((), None, now)
        }
        (BoundModel::Lightness(srv), BindingValue::LightnessActual { lightness }) => {
            srv.actual_transition.stop();
            srv.lightness_actual = lightness;
            srv.target_lightness_actual = lightness;
            if lightness != 0 {
                srv.lightness_last = lightness;
            }
            srv.status(LightnessChannel::Actual, None, now)
        }
        (BoundModel::Lightness(srv), BindingValue::LightnessLinear { lightness }) => {
            srv.linear_transition.stop();
            srv.lightness_linear = lightness;
            srv.target_lightness_linear = lightness;
            srv.status(LightnessChannel::Linear, None, now)
        }
        (BoundModel::Ctl(srv), BindingValue::CtlLightness { lightness }) => {
            srv.transition.stop();
            srv.lightness = lightness;
            srv.target_lightness = lightness;
            srv.status((), None, now)
        }
        (
            BoundModel::CtlTemp(srv),
            BindingValue::CtlTempDeltaUv {
                temperature,
                delta_uv,
            },
        ) => {
            srv.transition.stop();
            srv.temperature = temperature;
            srv.target_temperature = temperature;
            srv.delta_uv = delta_uv;
            srv.target_delta_uv = delta_uv;
            srv.status((), None, now)
        }
        (
            BoundModel::Hsl(srv),
            BindingValue::Hsl {
                lightness,
                hue,
                saturation,
            },
        ) => {
            srv.transition.stop();
            srv.lightness = lightness;
            srv.target_lightness = lightness;
            srv.hue = hue;
            srv.target_hue = hue;
            srv.saturation = saturation;
            srv.target_saturation = saturation;
            srv.status((), None, now)
        }
        (BoundModel::Hsl(srv), BindingValue::HslLightness { lightness }) => {
            srv.transition.stop();
            srv.lightness = lightness;
            srv.target_lightness = lightness;
            srv.status((), None, now)
        }
        (BoundModel::HslComponent(srv), BindingValue::HslHue { hue: value })
            if srv.component == HslComponent::Hue =>
        {
            srv.transition.stop();
            srv.value = value;
            srv.target = value;
            srv.status((), None, now)
        }
        (BoundModel::HslComponent(srv), BindingValue::HslSaturation { saturation: value })
            if srv.component == HslComponent::Saturation =>
        {
            srv.transition.stop();
            srv.value = value;
            srv.target = value;
            srv.status((), None, now)
        }
        (BoundModel::Xyl(srv), BindingValue::XylLightness { lightness }) => {
            srv.transition.stop();
            srv.lightness = lightness;
            srv.target_lightness = lightness;
            srv.status((), None, now)
        }
        (BoundModel::Lc(srv), BindingValue::LcLightOnOff { onoff }) => {
            srv.transition.stop();
            srv.light_onoff = onoff;
            srv.target_light_onoff = onoff;
            srv.status((), None, now)
        }
        (_, value) => {
            warn!("{:?} does not hold {} state", model.id, value.state_name());
            return Err(ServerError::ModelMismatch {
                model: model.id,
                state: value.state_name(),
            });
        }
    };

    publish_status(sink, model, &msg);
    Ok(())
}

fn isqrt(value: u64) -> u64 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

// Conversions between bound composite states. The servers never call them;
// the application uses them to derive the `BindingValue` it hands to
// `update_binding_state`.

/// Lightness Linear = ⌈65535 · (Actual / 65535)²⌉
pub fn lightness_actual_to_linear(actual: u16) -> u16 {
    let actual = actual as u64;
    ((actual * actual + 65534) / 65535) as u16
}

/// Lightness Actual = 65535 · √(Linear / 65535)
pub fn lightness_linear_to_actual(linear: u16) -> u16 {
    isqrt(linear as u64 * 65535) as u16
}

/// Generic Level bound to Lightness Actual, HSL Hue or HSL Saturation.
pub fn level_from_u16(value: u16) -> i16 {
    (value as i32 - 32768) as i16
}

pub fn u16_from_level(level: i16) -> u16 {
    (level as i32 + 32768) as u16
}

/// Generic Level bound to CTL Temperature, scaled over the temperature range.
/// The range is the CTL Temperature Range of the bound element.
pub fn level_to_temperature(level: i16, range_min: u16, range_max: u16) -> u16 {
    if range_max <= range_min {
        return range_min;
    }
    let span = (range_max - range_min) as u32;
    let offset = u16_from_level(level) as u32;
    range_min + (offset * span / 65535) as u16
}

pub fn temperature_to_level(temperature: u16, range_min: u16, range_max: u16) -> i16 {
    if range_max <= range_min {
        return i16::MIN;
    }
    let span = (range_max - range_min) as u32;
    let temperature = temperature.clamp(range_min, range_max);
    let offset = (temperature - range_min) as u32 * 65535 / span;
    level_from_u16(offset as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buf::NetBuf;
    use crate::common::MessageContext;
    use crate::config::RspCtrl;
    use crate::models::lighting::{TEMPERATURE_MAX, TEMPERATURE_MIN};
    use crate::opcode::*;
    use crate::server::test_sink::RecordingSink;

    const ELEMENT: u16 = 0x0001;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_onoff_binding_stops_transition() {
        // Arrange
        let mut srv = OnOffServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();
        let ctx = MessageContext::new(0x0002, ELEMENT, GEN_ONOFF_SET);
        srv.handle(&ctx, &mut NetBuf::new(&[0x01, 0x01, 0x05, 0x00]), at(0), &mut sink)
            .unwrap();
        assert!(srv.transition.is_running());
        sink.clear();

        // Act
        update_binding_state(
            BoundModel::OnOff(&mut srv),
            BindingValue::GenericOnOff { onoff: 0 },
            at(100),
            &mut sink,
        )
        .unwrap();

        // Assert
        assert!(!srv.transition.is_running());
        assert_eq!(srv.onoff, 0);
        assert_eq!(sink.last_published(), Some(&[0x82, 0x04, 0x00][..]));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let mut srv = LightnessServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        let result = update_binding_state(
            BoundModel::Lightness(&mut srv),
            BindingValue::CtlLightness { lightness: 0x1234 },
            at(0),
            &mut sink,
        );

        assert_eq!(
            result,
            Err(ServerError::ModelMismatch {
                model: ModelId::LightLightnessSrv,
                state: "CTL Lightness",
            })
        );
        assert_eq!(srv.lightness_actual, 0);
        assert!(sink.published.is_empty());
    }

    #[test]
    fn test_lightness_actual_updates_last_when_nonzero() {
        let mut srv = LightnessServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        update_binding_state(
            BoundModel::Lightness(&mut srv),
            BindingValue::LightnessActual { lightness: 0x4000 },
            at(0),
            &mut sink,
        )
        .unwrap();
        update_binding_state(
            BoundModel::Lightness(&mut srv),
            BindingValue::LightnessActual { lightness: 0 },
            at(0),
            &mut sink,
        )
        .unwrap();

        assert_eq!(srv.lightness_actual, 0);
        assert_eq!(srv.lightness_last, 0x4000);
        assert_eq!(sink.published[0].1, vec![0x82, 0x4E, 0x00, 0x40]);
        assert_eq!(sink.published[1].1, vec![0x82, 0x4E, 0x00, 0x00]);
    }

    #[test]
    fn test_lightness_linear_publishes_linear_status() {
        let mut srv = LightnessServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        update_binding_state(
            BoundModel::Lightness(&mut srv),
            BindingValue::LightnessLinear { lightness: 0x0102 },
            at(0),
            &mut sink,
        )
        .unwrap();

        assert_eq!(srv.lightness_linear, 0x0102);
        assert_eq!(sink.last_published(), Some(&[0x82, 0x52, 0x02, 0x01][..]));
    }

    #[test]
    fn test_power_actual_shadow() {
        let mut srv = PowerLevelServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        update_binding_state(
            BoundModel::PowerLevel(&mut srv),
            BindingValue::GenericPowerActual { power: 0x8000 },
            at(0),
            &mut sink,
        )
        .unwrap();
        update_binding_state(
            BoundModel::PowerLevel(&mut srv),
            BindingValue::GenericPowerActual { power: 0 },
            at(0),
            &mut sink,
        )
        .unwrap();

        assert_eq!(srv.power_actual, 0);
        assert_eq!(srv.power_last, 0x8000);
    }

    #[test]
    fn test_onpowerup_binding() {
        let mut srv = PowerOnOffServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        update_binding_state(
            BoundModel::PowerOnOff(&mut srv),
            BindingValue::GenericOnPowerUp {
                onpowerup: OnPowerUp::Restore,
            },
            at(0),
            &mut sink,
        )
        .unwrap();

        assert_eq!(srv.onpowerup, OnPowerUp::Restore);
        assert_eq!(sink.last_published(), Some(&[0x82, 0x12, 0x02][..]));
        assert_eq!(sink.published[0].0.id, ModelId::GenPowerOnOffSrv);
    }

    #[test]
    fn test_hsl_component_must_match() {
        let mut hue = HslComponentServer::new(ELEMENT, HslComponent::Hue, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        let result = update_binding_state(
            BoundModel::HslComponent(&mut hue),
            BindingValue::HslSaturation { saturation: 0x1000 },
            at(0),
            &mut sink,
        );
        assert!(matches!(result, Err(ServerError::ModelMismatch { .. })));

        update_binding_state(
            BoundModel::HslComponent(&mut hue),
            BindingValue::HslHue { hue: 0x2000 },
            at(0),
            &mut sink,
        )
        .unwrap();
        assert_eq!(hue.value, 0x2000);
        assert_eq!(sink.published.len(), 1);
        assert_eq!(sink.published[0].0.id, ModelId::LightHslHueSrv);
    }

    #[test]
    fn test_hsl_binding_writes_all_components() {
        let mut srv = HslServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        update_binding_state(
            BoundModel::Hsl(&mut srv),
            BindingValue::Hsl {
                lightness: 1,
                hue: 2,
                saturation: 3,
            },
            at(0),
            &mut sink,
        )
        .unwrap();
        update_binding_state(
            BoundModel::Hsl(&mut srv),
            BindingValue::HslLightness { lightness: 4 },
            at(0),
            &mut sink,
        )
        .unwrap();

        assert_eq!((srv.lightness, srv.hue, srv.saturation), (4, 2, 3));
        assert_eq!(sink.published.len(), 2);
    }

    #[test]
    fn test_ctl_temperature_binding() {
        let mut srv = CtlTempServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        update_binding_state(
            BoundModel::CtlTemp(&mut srv),
            BindingValue::CtlTempDeltaUv {
                temperature: 0x1000,
                delta_uv: -2,
            },
            at(0),
            &mut sink,
        )
        .unwrap();

        assert_eq!((srv.temperature, srv.delta_uv), (0x1000, -2));
        assert_eq!(
            sink.last_published(),
            Some(&[0x82, 0x66, 0x00, 0x10, 0xFE, 0xFF][..])
        );
    }

    #[test]
    fn test_lc_light_onoff_binding() {
        let mut srv = LcServer::new(ELEMENT, RspCtrl::auto());
        let mut sink = RecordingSink::default();

        update_binding_state(
            BoundModel::Lc(&mut srv),
            BindingValue::LcLightOnOff { onoff: 1 },
            at(0),
            &mut sink,
        )
        .unwrap();

        assert_eq!(srv.light_onoff, 1);
        assert_eq!(sink.published.len(), 1);
    }

    #[test]
    fn test_actual_linear_conversion() {
        assert_eq!(lightness_actual_to_linear(0), 0);
        assert_eq!(lightness_actual_to_linear(65535), 65535);
        assert_eq!(lightness_actual_to_linear(1), 1);
        assert_eq!(lightness_actual_to_linear(32768), 16385);

        assert_eq!(lightness_linear_to_actual(0), 0);
        assert_eq!(lightness_linear_to_actual(65535), 65535);
        assert_eq!(lightness_linear_to_actual(16384), 32767);
    }

    #[test]
    fn test_level_conversion() {
        assert_eq!(level_from_u16(0), i16::MIN);
        assert_eq!(level_from_u16(0xFFFF), i16::MAX);
        assert_eq!(level_from_u16(0x8000), 0);
        assert_eq!(u16_from_level(i16::MIN), 0);
        assert_eq!(u16_from_level(-100), 32668);
    }

    #[test]
    fn test_temperature_level_conversion() {
        assert_eq!(level_to_temperature(i16::MIN, TEMPERATURE_MIN, TEMPERATURE_MAX), TEMPERATURE_MIN);
        assert_eq!(level_to_temperature(i16::MAX, TEMPERATURE_MIN, TEMPERATURE_MAX), TEMPERATURE_MAX);
        assert_eq!(temperature_to_level(TEMPERATURE_MIN, TEMPERATURE_MIN, TEMPERATURE_MAX), i16::MIN);
        assert_eq!(temperature_to_level(TEMPERATURE_MAX, TEMPERATURE_MIN, TEMPERATURE_MAX), i16::MAX);
        assert_eq!(level_to_temperature(0, 1000, 1000), 1000);
    }
}
