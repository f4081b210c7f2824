use bitflags::bitflags;
use embassy_time::{Duration, Instant};
use fixed::types::I32F32;
use log::debug;

use crate::buf::NetBuf;
use crate::common::MessageContext;
use crate::config::{DELAY_UNIT_MS, DEVICE_SPECIFIC_RESOLUTION, STEP_RESOLUTION_MS};
use crate::error::{Result, ServerError};

pub const TRANS_TIME_STEPS_MASK: u8 = 0x3F;
pub const UNKNOWN_STEPS: u8 = 0x3F;
// Remaining Time reported while a Level Move is running
pub const UNKNOWN_REMAIN_TIME: u8 = 0x3F;

const RESOLUTION_MS: [u32; 4] = [100, 1_000, 10_000, 600_000];

pub fn trans_time_steps(trans_time: u8) -> u8 {
    trans_time & TRANS_TIME_STEPS_MASK
}

pub fn trans_time_resolution_ms(trans_time: u8) -> u32 {
    RESOLUTION_MS[(trans_time >> 6) as usize]
}

/// Duration in ms encoded by a Transition Time byte.
pub fn trans_time_to_ms(trans_time: u8) -> u32 {
    trans_time_steps(trans_time) as u32 * trans_time_resolution_ms(trans_time)
}

/// Encodes a remaining duration using the coarsest resolution that still fits
/// the 6-bit step count.
pub fn encode_remain_time(remain_ms: i64) -> u8 {
    if remain_ms > 620_000 {
        0xC0 | (remain_ms / 600_000) as u8
    } else if remain_ms > 62_000 {
        0x80 | (remain_ms / 10_000) as u8
    } else if remain_ms > 6_200 {
        0x40 | (remain_ms / 1_000) as u8
    } else if remain_ms > 0 {
        (remain_ms / 100) as u8
    } else {
        0
    }
}

/// The optional Transition Time and Delay pair trailing a Set message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransitionFields {
    pub op_en: bool,
    pub trans_time: u8,
    pub delay: u8,
}

impl TransitionFields {
    /// Parses what is left of the payload: nothing, or exactly the two
    /// optional bytes.
    pub fn parse(buf: &mut NetBuf) -> Result<Self> {
        match buf.len() {
            0 => Ok(Self::default()),
            2 => {
                let trans_time = buf.pull_u8()?;
                let delay = buf.pull_u8()?;
                if trans_time_steps(trans_time) == UNKNOWN_STEPS {
                    return Err(ServerError::UnknownTransitionSteps(trans_time));
                }
                Ok(Self {
                    op_en: true,
                    trans_time,
                    delay,
                })
            }
            len => Err(ServerError::OptionalLength(len)),
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TransitionFlags: u8 {
        const TIMER_START = 0x01;
    }
}

impl Default for TransitionFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Owned deadline, one-shot or periodic, polled by the category work loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransitionTimer {
    deadline: Option<Instant>,
    period: Option<Duration>,
}

impl TransitionTimer {
    pub fn arm(&mut self, at: Instant) {
        self.deadline = Some(at);
        self.period = None;
    }

    pub fn arm_periodic(&mut self, now: Instant, period: Duration) {
        self.deadline = Some(now + period);
        self.period = Some(period);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.period = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes an expired deadline, re-arming a periodic timer for its next
    /// period.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = self.period.map(|period| deadline + period);
                true
            }
            _ => false,
        }
    }
}

/// What a timer fire means to the model owning the transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// First fire of an instantaneous (possibly delayed) transition.
    Instant,
    /// First fire of a stepping transition; the periodic timer is now armed.
    Begin,
    /// One interpolation step. `done` is set on the last one.
    Step { done: bool },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Transition {
    pub just_started: bool,
    pub trans_time: u8,
    pub remain_time: u8,
    // In units of 5 ms
    pub delay: u8,
    pub quo_tt: u32,
    pub counter: u8,
    pub total_duration: u32,
    pub start_timestamp: Option<Instant>,

    flags: TransitionFlags,
    timer: TransitionTimer,
    ctx: Option<MessageContext>,
}

impl Transition {
    /// Computes the step parameters from the received transition fields.
    pub fn set_values(&mut self, trans_time: u8, delay: u8) {
        self.trans_time = trans_time;
        self.delay = delay;

        if trans_time == 0 {
            return;
        }

        self.total_duration = trans_time_to_ms(trans_time);
        self.counter = (self.total_duration / STEP_RESOLUTION_MS)
            .min(DEVICE_SPECIFIC_RESOLUTION as u32) as u8;
        self.quo_tt = match self.counter {
            0 => 0,
            counter => self.total_duration / counter as u32,
        };
    }

    /// Refreshes and returns the Remaining Time field.
    pub fn calc_remain_time(&mut self, now: Instant) -> u8 {
        if self.just_started {
            self.remain_time = self.trans_time;
            return self.remain_time;
        }

        let elapsed = self
            .start_timestamp
            .and_then(|start| now.checked_duration_since(start))
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0);

        self.remain_time = encode_remain_time(self.total_duration as i64 - elapsed);
        self.remain_time
    }

    /// Cancels the timer and forgets the transition. The context slot is kept.
    pub fn stop(&mut self) {
        if self.flags.contains(TransitionFlags::TIMER_START) {
            self.timer.cancel();
            self.flags.remove(TransitionFlags::TIMER_START);
        }

        self.just_started = false;
        self.trans_time = 0;
        self.remain_time = 0;
        self.delay = 0;
        self.quo_tt = 0;
        self.counter = 0;
        self.total_duration = 0;
        self.start_timestamp = None;
    }

    /// Arms the first fire: after the delay, or right away.
    pub fn start(&mut self, now: Instant) {
        let delay = Duration::from_millis(self.delay as u64 * DELAY_UNIT_MS);
        self.timer.arm(now + delay);
        self.flags.insert(TransitionFlags::TIMER_START);
    }

    fn timer_start(&mut self, now: Instant) {
        self.start_timestamp = Some(now);
        self.timer
            .arm_periodic(now, Duration::from_millis(self.quo_tt as u64));
    }

    fn timer_stop(&mut self) {
        self.timer.cancel();
        self.flags.remove(TransitionFlags::TIMER_START);
    }

    pub fn is_running(&self) -> bool {
        self.flags.contains(TransitionFlags::TIMER_START)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn ctx(&self) -> Option<&MessageContext> {
        self.ctx.as_ref()
    }

    pub fn set_ctx(&mut self, ctx: &MessageContext) {
        self.ctx = Some(*ctx);
    }

    /// Fires the timer if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        if !self.timer.expire(now) {
            return None;
        }
        Some(self.fire(now))
    }

    pub fn fire(&mut self, now: Instant) -> Tick {
        if self.just_started {
            self.just_started = false;
            if self.counter == 0 {
                self.stop();
                return Tick::Instant;
            }

            self.timer_start(now);
            debug!("Transition started, {} steps of {} ms", self.counter, self.quo_tt);
            return Tick::Begin;
        }

        if self.counter != 0 {
            self.counter -= 1;
        }

        let done = self.counter == 0;
        if done {
            self.timer_stop();
        }
        Tick::Step { done }
    }
}

/// Linear interpolation of one state value, one step per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ramp {
    value: I32F32,
    delta: I32F32,
}

impl Ramp {
    pub fn new(current: i32, target: i32, counter: u8) -> Self {
        let value = I32F32::from_num(current);
        let delta = match counter {
            0 => I32F32::ZERO,
            counter => (value - I32F32::from_num(target)) / I32F32::from_num(counter),
        };
        Self { value, delta }
    }

    pub fn delta(&self) -> I32F32 {
        self.delta
    }

    pub fn step(&mut self) -> i32 {
        self.value -= self.delta;
        self.value.to_num()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_trans_time_resolutions() {
        assert_eq!(trans_time_to_ms(0x0A), 1_000);
        assert_eq!(trans_time_to_ms(0x42), 2_000);
        assert_eq!(trans_time_to_ms(0x81), 10_000);
        assert_eq!(trans_time_to_ms(0xC1), 600_000);
        assert_eq!(trans_time_to_ms(0xC0), 0);
    }

    #[test]
    fn test_step_quantization() {
        for trans_time in 0..=u8::MAX {
            if trans_time_steps(trans_time) == UNKNOWN_STEPS {
                continue;
            }

            let mut transition = Transition::default();
            transition.set_values(trans_time, 0);

            assert!(transition.counter <= DEVICE_SPECIFIC_RESOLUTION);
            assert_eq!(transition.counter == 0, trans_time_to_ms(trans_time) == 0);
        }
    }

    #[test]
    fn test_remain_time_just_started_is_verbatim() {
        for trans_time in 0..=u8::MAX {
            if trans_time_steps(trans_time) == UNKNOWN_STEPS {
                continue;
            }

            let mut transition = Transition::default();
            transition.set_values(trans_time, 0);
            transition.just_started = true;

            assert_eq!(transition.calc_remain_time(at(0)), trans_time);
        }
    }

    #[test]
    fn test_remain_time_encoding() {
        assert_eq!(encode_remain_time(0), 0);
        assert_eq!(encode_remain_time(-50), 0);
        assert_eq!(encode_remain_time(1_800), 18);
        assert_eq!(encode_remain_time(6_200), 62);
        assert_eq!(encode_remain_time(6_201), 0x40 | 6);
        assert_eq!(encode_remain_time(62_001), 0x80 | 6);
        assert_eq!(encode_remain_time(620_001), 0xC0 | 1);
    }

    #[test]
    fn test_remain_time_while_stepping() {
        // Arrange
        let mut transition = Transition::default();
        transition.set_values(0x42, 0);
        transition.just_started = true;
        transition.start(at(1_000));

        // Act
        assert_eq!(transition.poll(at(1_000)), Some(Tick::Begin));

        // Assert
        assert_eq!(transition.calc_remain_time(at(1_400)), 16);
        assert_eq!(transition.calc_remain_time(at(3_500)), 0);
    }

    #[test]
    fn test_optional_fields() {
        assert_eq!(
            TransitionFields::parse(&mut NetBuf::new(&[])),
            Ok(TransitionFields::default())
        );
        assert_eq!(
            TransitionFields::parse(&mut NetBuf::new(&[0x42, 0x04])),
            Ok(TransitionFields {
                op_en: true,
                trans_time: 0x42,
                delay: 0x04
            })
        );
        assert_eq!(
            TransitionFields::parse(&mut NetBuf::new(&[0x7F, 0x00])),
            Err(ServerError::UnknownTransitionSteps(0x7F))
        );
        assert_eq!(
            TransitionFields::parse(&mut NetBuf::new(&[0x42])),
            Err(ServerError::OptionalLength(1))
        );
    }

    /// Level -100 -> 2700 over 0x42 (2 steps of 1 s).
    ///
    /// # Algorithm
    /// 1. 2000 ms total gives 10 steps of 200 ms
    /// 2. Each step moves the level by 280
    /// 3. The last step lands exactly on the target
    #[test]
    fn test_level_ramp_example() {
        let mut transition = Transition::default();
        transition.set_values(0x42, 0);

        assert_eq!(transition.total_duration, 2_000);
        assert_eq!(transition.counter, 10);
        assert_eq!(transition.quo_tt, 200);

        let mut ramp = Ramp::new(-100, 2700, transition.counter);
        assert_eq!(ramp.delta(), I32F32::from_num(-280));

        let mut level = -100;
        for _ in 0..transition.counter {
            level = ramp.step();
        }
        assert_eq!(level, 2700);
    }

    #[test]
    fn test_ramp_odd_division_snaps_on_completion() {
        let mut ramp = Ramp::new(0, 0xFFFF, 7);

        let mut value = 0;
        for _ in 0..6 {
            let next = ramp.step();
            assert!(next > value);
            value = next;
        }
        assert!(value < 0xFFFF);
    }

    #[test]
    fn test_timer_sequence_with_delay() {
        // Arrange
        let mut transition = Transition::default();
        transition.set_values(0x02, 10);
        transition.just_started = true;

        // Act
        transition.start(at(0));

        // Assert
        assert!(transition.is_running());
        assert_eq!(transition.next_deadline(), Some(at(50)));
        assert_eq!(transition.poll(at(49)), None);
        assert_eq!(transition.poll(at(50)), Some(Tick::Begin));
        assert!(!transition.just_started);
        assert_eq!(transition.start_timestamp, Some(at(50)));

        assert_eq!(transition.poll(at(149)), None);
        assert_eq!(transition.poll(at(150)), Some(Tick::Step { done: false }));
        assert_eq!(transition.poll(at(250)), Some(Tick::Step { done: true }));
        assert!(!transition.is_running());
        assert_eq!(transition.poll(at(10_000)), None);
    }

    #[test]
    fn test_instant_transition_fires_once() {
        let mut transition = Transition::default();
        transition.set_values(0, 0);
        transition.just_started = true;
        transition.start(at(100));

        assert_eq!(transition.next_deadline(), Some(at(100)));
        assert_eq!(transition.poll(at(100)), Some(Tick::Instant));
        assert!(!transition.is_running());
        assert_eq!(transition.poll(at(200)), None);
    }

    #[test]
    fn test_stop_is_idempotent_and_keeps_ctx() {
        let ctx = MessageContext::new(0x0002, 0x0001, 0x8206);
        let mut transition = Transition::default();
        transition.set_values(0x42, 3);
        transition.set_ctx(&ctx);
        transition.just_started = true;
        transition.start(at(0));

        transition.stop();
        transition.stop();

        assert!(!transition.is_running());
        assert_eq!(transition.counter, 0);
        assert_eq!(transition.delay, 0);
        assert_eq!(transition.total_duration, 0);
        assert!(!transition.just_started);
        assert_eq!(transition.next_deadline(), None);
        assert_eq!(transition.ctx(), Some(&ctx));
    }
}
