use std::ops::RangeInclusive;

use servolink_frame::FIELD_COUNT;
use tracing::{info, warn};

use crate::error::{DispatchError, Result};

/// Something that can move six joints to target positions.
///
/// `move_to` is synchronous: it returns once the motion has started.
pub trait Actuator {
    fn move_to(&mut self, positions: [i32; FIELD_COUNT], duration_ms: u32) -> Result<()>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn move_to(&mut self, positions: [i32; FIELD_COUNT], duration_ms: u32) -> Result<()> {
        (**self).move_to(positions, duration_ms)
    }
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn move_to(&mut self, positions: [i32; FIELD_COUNT], duration_ms: u32) -> Result<()> {
        (**self).move_to(positions, duration_ms)
    }
}

/// One commanded motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub positions: [i32; FIELD_COUNT],
    pub duration_ms: u32,
}

/// Actuator with no hardware behind it: moves are logged.
#[derive(Debug, Default)]
pub struct LogActuator {
    last: Option<Move>,
    count: u64,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent commanded move.
    pub fn last(&self) -> Option<Move> {
        self.last
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Actuator for LogActuator {
    fn move_to(&mut self, positions: [i32; FIELD_COUNT], duration_ms: u32) -> Result<()> {
        self.count += 1;
        self.last = Some(Move {
            positions,
            duration_ms,
        });
        info!(?positions, duration_ms, "move");
        Ok(())
    }
}

/// Keeps every move in memory.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub moves: Vec<Move>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Actuator for RecordingActuator {
    fn move_to(&mut self, positions: [i32; FIELD_COUNT], duration_ms: u32) -> Result<()> {
        self.moves.push(Move {
            positions,
            duration_ms,
        });
        Ok(())
    }
}

/// Per-joint position ranges and the accepted step duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointLimits {
    pub joints: [RangeInclusive<i32>; FIELD_COUNT],
    pub duration_ms: RangeInclusive<u32>,
}

impl JointLimits {
    /// Limits of a six-joint hobby arm: base, shoulder, elbow, wrist
    /// vertical, wrist rotation, gripper.
    pub fn braccio() -> Self {
        Self {
            joints: [0..=180, 15..=165, 0..=180, 0..=180, 0..=180, 10..=73],
            duration_ms: 10..=30,
        }
    }

    /// Accept everything.
    pub fn unbounded() -> Self {
        Self {
            joints: std::array::from_fn(|_| i32::MIN..=i32::MAX),
            duration_ms: 0..=u32::MAX,
        }
    }

    /// First joint outside its range.
    pub fn check(&self, positions: &[i32; FIELD_COUNT]) -> Result<()> {
        for (joint, (value, range)) in positions.iter().zip(&self.joints).enumerate() {
            if !range.contains(value) {
                return Err(DispatchError::OutOfRange {
                    joint,
                    value: *value,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }
        Ok(())
    }

    pub fn clamp(&self, positions: [i32; FIELD_COUNT]) -> [i32; FIELD_COUNT] {
        std::array::from_fn(|i| {
            let range = &self.joints[i];
            positions[i].clamp(*range.start(), *range.end())
        })
    }

    pub fn clamp_duration(&self, duration_ms: u32) -> u32 {
        duration_ms.clamp(*self.duration_ms.start(), *self.duration_ms.end())
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::braccio()
    }
}

/// What to do with positions outside the limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LimitPolicy {
    /// Pull each value into range and move anyway.
    #[default]
    Clamp,
    /// Refuse the whole move.
    Reject,
}

/// Applies [`JointLimits`] before handing a move to the inner actuator.
#[derive(Debug)]
pub struct LimitedActuator<A> {
    inner: A,
    limits: JointLimits,
    policy: LimitPolicy,
}

impl<A: Actuator> LimitedActuator<A> {
    pub fn new(inner: A, limits: JointLimits, policy: LimitPolicy) -> Self {
        Self {
            inner,
            limits,
            policy,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A: Actuator> Actuator for LimitedActuator<A> {
    fn move_to(&mut self, positions: [i32; FIELD_COUNT], duration_ms: u32) -> Result<()> {
        if let Err(err) = self.limits.check(&positions) {
            if self.policy == LimitPolicy::Reject {
                return Err(err);
            }
            warn!(error = %err, "clamping move into joint limits");
        }
        let positions = self.limits.clamp(positions);
        let duration_ms = self.limits.clamp_duration(duration_ms);
        self.inner.move_to(positions, duration_ms)
    }
}
