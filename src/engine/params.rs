#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Graph Parameters and Update Discipline
======================================

Control values arrive in the units the control surface uses (Hz for cutoff,
milliseconds for delay time, percent for the rest) and are clamped to their
domain before storage. Clamping is deliberate: control input comes from
bounded widgets, so the nearest valid value is always safer than rejecting
the change.

Two update disciplines apply, chosen per parameter:

  Immediate - cutoff, delay time, wet/dry mix. Stepping these does not
  excite the feedback path, so they may track a dragged control sample
  accurately with no transition.

  Ramped - feedback and reverb send. Stepping a gain inside a resonating
  path produces an audible click, so these interpolate linearly from the
  live value to the target over a short window: 100 ms for live changes,
  50 ms when applied by reset. A new ramp cancels any ramp in flight and
  pins its start to the current interpolated value, never a stale target.

The ramp is a small state machine advanced by the render clock (frames),
so its behavior does not depend on host timer facilities.
*/

/// Hard cap on the feedback gain. Kept strictly below unity so the delay
/// loop's energy stays bounded no matter what the control surface sends.
pub const MAX_FEEDBACK: f32 = 0.99;

/// Cutoff clamp range in Hz.
pub const CUTOFF_RANGE: (f32, f32) = (20.0, 20_000.0);

/// Longest supported delay in seconds.
pub const MAX_DELAY_SECONDS: f32 = 5.0;

/// Ramp window for live control changes, in seconds.
pub const RAMP_LIVE_SECONDS: f32 = 0.1;

/// Ramp window used by reset, in seconds.
pub const RAMP_RESET_SECONDS: f32 = 0.05;

/// The tunable parameters of the signal graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Low-pass cutoff, raw value in Hz.
    Cutoff,
    /// Delay time, raw value in milliseconds.
    DelayTime,
    /// Delay feedback, raw value in percent.
    Feedback,
    /// Wet/dry mix, raw value in percent (100 = fully wet).
    Mix,
    /// Reverb send level, raw value in percent.
    ReverbSend,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::Cutoff,
        Parameter::DelayTime,
        Parameter::Feedback,
        Parameter::Mix,
        Parameter::ReverbSend,
    ];

    /// Whether changes to this parameter are applied through a ramp.
    pub fn is_ramped(self) -> bool {
        matches!(self, Parameter::Feedback | Parameter::ReverbSend)
    }

    /// Clamp a raw control value and convert it to the stored domain.
    pub fn store(self, raw: f32) -> f32 {
        match self {
            Parameter::Cutoff => raw.clamp(CUTOFF_RANGE.0, CUTOFF_RANGE.1),
            Parameter::DelayTime => raw.clamp(0.0, MAX_DELAY_SECONDS * 1000.0) / 1000.0,
            Parameter::Feedback => (raw.clamp(0.0, 100.0) / 100.0).min(MAX_FEEDBACK),
            Parameter::Mix => raw.clamp(0.0, 100.0) / 100.0,
            Parameter::ReverbSend => raw.clamp(0.0, 100.0) / 100.0,
        }
    }
}

/// Authoritative target values for every graph parameter.
///
/// Mutated only through the engine's parameter path; the graph reads these
/// as ramp targets and immediate settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphParameters {
    /// Low-pass cutoff in Hz.
    pub cutoff_hz: f32,
    /// Delay time in seconds.
    pub delay_seconds: f32,
    /// Feedback gain, always < 1.
    pub feedback: f32,
    /// Wet fraction of the wet/dry mix, [0, 1].
    pub mix: f32,
    /// Reverb send gain, [0, 1].
    pub reverb_send: f32,
}

impl Default for GraphParameters {
    fn default() -> Self {
        Self {
            cutoff_hz: 5_000.0,
            delay_seconds: 0.2,
            feedback: 0.3,
            mix: 0.5,
            reverb_send: 0.0,
        }
    }
}

impl GraphParameters {
    pub fn get(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::Cutoff => self.cutoff_hz,
            Parameter::DelayTime => self.delay_seconds,
            Parameter::Feedback => self.feedback,
            Parameter::Mix => self.mix,
            Parameter::ReverbSend => self.reverb_send,
        }
    }

    pub fn set(&mut self, parameter: Parameter, stored: f32) {
        match parameter {
            Parameter::Cutoff => self.cutoff_hz = stored,
            Parameter::DelayTime => self.delay_seconds = stored,
            Parameter::Feedback => self.feedback = stored,
            Parameter::Mix => self.mix = stored,
            Parameter::ReverbSend => self.reverb_send = stored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RampState {
    Idle,
    Ramping {
        start: f32,
        target: f32,
        start_frame: u64,
        end_frame: u64,
    },
}

/// Linear parameter ramp advanced by the render clock.
///
/// At most one transition is in flight: scheduling a new ramp cancels the
/// old one and starts from the value the parameter holds at that instant.
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    current: f32,
    state: RampState,
}

impl Ramp {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            state: RampState::Idle,
        }
    }

    /// Jump to a value with no transition, cancelling any ramp in flight.
    pub fn set(&mut self, value: f32) {
        self.current = value;
        self.state = RampState::Idle;
    }

    /// Begin a linear transition from the live value at `now` to `target`.
    pub fn ramp_to(&mut self, target: f32, now: u64, duration_frames: u64) {
        let start = self.value_at(now);
        if duration_frames == 0 {
            self.set(target);
            return;
        }
        self.state = RampState::Ramping {
            start,
            target,
            start_frame: now,
            end_frame: now + duration_frames,
        };
    }

    /// The interpolated value at `frame`. Also advances the stored value,
    /// settling to the target once the window has elapsed.
    pub fn value_at(&mut self, frame: u64) -> f32 {
        if let RampState::Ramping {
            start,
            target,
            start_frame,
            end_frame,
        } = self.state
        {
            if frame >= end_frame {
                self.current = target;
                self.state = RampState::Idle;
            } else if frame <= start_frame {
                self.current = start;
            } else {
                let t = (frame - start_frame) as f32 / (end_frame - start_frame) as f32;
                self.current = start + (target - start) * t;
            }
        }
        self.current
    }

    /// The value the ramp is heading toward (its resting value when idle).
    pub fn target(&self) -> f32 {
        match self.state {
            RampState::Idle => self.current,
            RampState::Ramping { target, .. } => target,
        }
    }

    pub fn is_ramping(&self) -> bool {
        matches!(self.state, RampState::Ramping { .. })
    }
}
