//! Visual reconciliation of a predicted body with authoritative corrections.
//!
//! The physics of a networked body is rewound and replayed when an
//! authoritative state arrives; the difference between the transform shown
//! before the rewind and the corrected one would pop on screen. The
//! [`Reconciler`] hides it by blending in two phases:
//!
//! ```text
//!  NONE ──accepted correction──▶ TO_ADJUST ──ratio > 1──▶ TO_REAL ──ratio > 1──▶ NONE
//!                                    ▲
//!                                    └──────── accepted correction (chains) ────────┘
//! ```
//!
//! `TO_ADJUST` follows a quadratic Bézier from the visible transform to a
//! point on the authoritative track one blend-duration ahead. `TO_REAL`
//! eases from there onto the live physical transform.

use crate::config::SmoothingConfig;
use crate::debug;
use crate::math::{Quat, Transform, Vec3};
use crate::store::SmoothedTransformStore;
use serde::{Deserialize, Serialize};

/// A body's transform and linear velocity at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictedSample {
    pub transform: Transform,
    pub velocity: Vec3,
    /// Reconciler clock, in seconds, when the sample was taken.
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmoothingPhase {
    None,
    ToAdjust,
    ToReal,
}

/// Curve parameters of an in-flight blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blend {
    pub start_position: Vec3,
    pub start_rotation: Quat,
    pub adjust_control_point: Vec3,
    pub target_position: Vec3,
    pub target_rotation: Quat,
    /// Length of each phase in seconds, always positive.
    pub adjust_duration: f32,
    /// Time spent in the current phase.
    pub elapsed: f32,
}

impl Blend {
    fn ratio(&self) -> f32 {
        self.elapsed / self.adjust_duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ReconciliationState {
    #[default]
    None,
    ToAdjust(Blend),
    ToReal(Blend),
}

impl ReconciliationState {
    pub fn phase(&self) -> SmoothingPhase {
        match self {
            ReconciliationState::None => SmoothingPhase::None,
            ReconciliationState::ToAdjust(_) => SmoothingPhase::ToAdjust,
            ReconciliationState::ToReal(_) => SmoothingPhase::ToReal,
        }
    }

    pub fn blend(&self) -> Option<&Blend> {
        match self {
            ReconciliationState::None => None,
            ReconciliationState::ToAdjust(blend) | ReconciliationState::ToReal(blend) => {
                Some(blend)
            }
        }
    }
}

/// What [`Reconciler::check_correction`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CorrectionOutcome {
    /// A blend of `adjust_duration` seconds per phase was started.
    Accepted { adjust_duration: f32 },
    /// Error below `min_adjust_length`; shown as-is.
    BelowMinLength,
    /// Error above `max_adjust_length`, treated as a teleport.
    Snapped,
    /// Body moving slower than `min_adjust_speed`.
    TooSlow,
    /// Blend would exceed `max_adjust_time`.
    TooLong,
    /// Smoothing is turned off for this body.
    Disabled,
}

/// Serializable image of a [`Reconciler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerSnapshot {
    pub config: SmoothingConfig,
    pub predicted: PredictedSample,
    pub physical: PredictedSample,
    pub state: ReconciliationState,
    pub smoothed: SmoothedTransformStore,
    pub clock: f64,
}

/// Per-body smoothing state machine.
///
/// Drive it once per simulation step: [`prepare_sample`](Self::prepare_sample)
/// with the locally predicted state, zero or more
/// [`check_correction`](Self::check_correction) calls when the physics was
/// rewound to an authoritative state, then [`tick`](Self::tick).
///
/// The configuration is not validated here; run
/// [`SmoothingConfig::validate`] on anything loaded from outside. Invalid
/// thresholds never start a blend of non-positive length.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: SmoothingConfig,
    /// Last sample handed to `prepare_sample`.
    predicted: PredictedSample,
    /// Where the physics currently is: the predicted sample, or the
    /// authoritative one if a correction arrived after it.
    physical: PredictedSample,
    state: ReconciliationState,
    smoothed: SmoothedTransformStore,
    clock: f64,
    /// State before the first correction since the last tick.
    pre_correction: Option<(ReconciliationState, SmoothedTransformStore)>,
}

impl Reconciler {
    pub fn new(config: SmoothingConfig) -> Self {
        Self::with_transform(config, Transform::IDENTITY)
    }

    pub fn with_transform(config: SmoothingConfig, transform: Transform) -> Self {
        let sample = PredictedSample {
            transform,
            velocity: Vec3::ZERO,
            timestamp: 0.0,
        };
        Self {
            config,
            predicted: sample,
            physical: sample,
            state: ReconciliationState::None,
            smoothed: SmoothedTransformStore::new(transform),
            clock: 0.0,
            pre_correction: None,
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SmoothingConfig) {
        if !config.enabled {
            self.state = ReconciliationState::None;
        }
        self.config = config;
    }

    pub fn phase(&self) -> SmoothingPhase {
        self.state.phase()
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    pub fn sample(&self) -> &PredictedSample {
        &self.predicted
    }

    pub fn physical(&self) -> &PredictedSample {
        &self.physical
    }

    pub fn smoothed_transform(&self) -> Transform {
        self.smoothed.get()
    }

    pub fn store(&self) -> &SmoothedTransformStore {
        &self.smoothed
    }

    /// Caches this step's predicted transform and velocity. Never changes
    /// the reconciliation state.
    pub fn prepare_sample(&mut self, transform: Transform, velocity: Vec3) {
        self.predicted = PredictedSample {
            transform: Transform::new(transform.position, transform.rotation),
            velocity,
            timestamp: self.clock,
        };
        self.physical = self.predicted;
    }

    /// Considers an authoritative transform against the cached prediction.
    ///
    /// Only the last call before the next [`tick`](Self::tick) counts: a
    /// repeated call first undoes what the previous one changed.
    pub fn check_correction(&mut self, transform: Transform, velocity: Vec3) -> CorrectionOutcome {
        if !self.config.enabled {
            return CorrectionOutcome::Disabled;
        }

        if let Some((state, smoothed)) = self.pre_correction.take() {
            self.state = state;
            self.smoothed = smoothed;
        }
        self.pre_correction = Some((self.state, self.smoothed));

        let authoritative = PredictedSample {
            transform: Transform::new(transform.position, transform.rotation),
            velocity,
            timestamp: self.clock,
        };
        self.physical = authoritative;

        let error_length = authoritative
            .transform
            .position
            .distance(self.predicted.transform.position);
        let outcome = self.evaluate(&authoritative, error_length);
        debug::trace_correction(&outcome, error_length);
        outcome
    }

    fn evaluate(&mut self, authoritative: &PredictedSample, error_length: f32) -> CorrectionOutcome {
        let config = &self.config;

        // A non-finite error is shown as-is so that corrupt input stays visible.
        if !error_length.is_finite() {
            self.state = ReconciliationState::None;
            self.smoothed.set(authoritative.transform);
            return CorrectionOutcome::Snapped;
        }
        if error_length < config.min_adjust_length {
            return CorrectionOutcome::BelowMinLength;
        }
        if error_length > config.max_adjust_length {
            self.state = ReconciliationState::None;
            self.smoothed.set(authoritative.transform);
            return CorrectionOutcome::Snapped;
        }

        let speed = self
            .predicted
            .velocity
            .length()
            .max(authoritative.velocity.length());
        if speed < config.min_adjust_speed {
            return CorrectionOutcome::TooSlow;
        }

        let adjust_duration = error_length * config.adjust_length_threshold / speed;
        // Blends need a positive, finite length. A zero threshold or a
        // zero minimum length with no error would otherwise divide 0 by 0.
        if !(adjust_duration > 0.0) || adjust_duration > config.max_adjust_time {
            return CorrectionOutcome::TooLong;
        }

        // Chain from what is on screen if a blend is already running.
        let start = match self.state {
            ReconciliationState::None => self.predicted.transform,
            _ => self.smoothed.get(),
        };
        let start_rotation = start.rotation.normalize();

        let blend = Blend {
            start_position: start.position,
            start_rotation,
            adjust_control_point: start.position + self.predicted.velocity * adjust_duration,
            target_position: authoritative.transform.position
                + authoritative.velocity * adjust_duration,
            target_rotation: authoritative
                .transform
                .rotation
                .normalize()
                .aligned_to(start_rotation),
            adjust_duration,
            elapsed: 0.0,
        };

        let previous = self.state.phase();
        self.state = ReconciliationState::ToAdjust(blend);
        debug::trace_phase_change(previous, SmoothingPhase::ToAdjust, adjust_duration);

        CorrectionOutcome::Accepted { adjust_duration }
    }

    /// Advances the blend by `dt` seconds and publishes the transform to draw.
    pub fn tick(&mut self, dt: f32) -> Transform {
        self.clock += f64::from(dt);
        self.pre_correction = None;

        if !self.config.enabled {
            self.smoothed.set(self.predicted.transform);
            return self.smoothed.get();
        }

        self.advance(dt);

        let output = match self.state {
            ReconciliationState::None => self.physical.transform,
            ReconciliationState::ToAdjust(blend) => self.blend_to_adjust(&blend),
            ReconciliationState::ToReal(blend) => self.blend_to_real(&blend),
        };

        let output = if self.config.adjust_vertical_offset && self.state.blend().is_some() {
            self.remove_vertical_offset(output)
        } else {
            output
        };

        self.smoothed.set(output);
        output
    }

    /// Moves time forward, carrying any overshoot into the next phase.
    fn advance(&mut self, dt: f32) {
        let mut state = self.state;
        if let ReconciliationState::ToAdjust(blend) | ReconciliationState::ToReal(blend) = &mut state {
            blend.elapsed += dt;
        }

        loop {
            state = match state {
                ReconciliationState::ToAdjust(blend) if blend.ratio() > 1.0 => {
                    let mut next = blend;
                    next.elapsed -= blend.adjust_duration;
                    next.adjust_control_point =
                        blend.target_position + self.physical.velocity * blend.adjust_duration;
                    debug::trace_phase_change(
                        SmoothingPhase::ToAdjust,
                        SmoothingPhase::ToReal,
                        blend.adjust_duration,
                    );
                    ReconciliationState::ToReal(next)
                }
                ReconciliationState::ToReal(blend) if blend.ratio() > 1.0 => {
                    debug::trace_phase_change(
                        SmoothingPhase::ToReal,
                        SmoothingPhase::None,
                        blend.adjust_duration,
                    );
                    ReconciliationState::None
                }
                _ => break,
            };
        }

        self.state = state;
    }

    fn blend_to_adjust(&self, blend: &Blend) -> Transform {
        let ratio = blend.ratio();

        let to_control = blend.start_position.lerp(blend.adjust_control_point, ratio);
        let from_control = blend.adjust_control_point.lerp(blend.target_position, ratio);
        let position = to_control.lerp(from_control, ratio);

        let rotation = if self.config.smooth_rotation {
            blend.start_rotation.slerp(blend.target_rotation, ratio)
        } else {
            self.physical.transform.rotation
        };

        Transform { position, rotation }
    }

    fn blend_to_real(&self, blend: &Blend) -> Transform {
        let ratio = blend.ratio();
        let physical = self.physical.transform;

        // Fast-in, slow-out: the first leg runs on sqrt(ratio).
        let eased = blend
            .target_position
            .lerp(blend.adjust_control_point, ratio.sqrt());
        let position = eased.lerp(physical.position, ratio);

        let rotation = if self.config.smooth_rotation {
            physical
                .rotation
                .aligned_to(blend.target_rotation)
                .slerp(blend.target_rotation, 1.0 - ratio)
        } else {
            physical.rotation
        };

        Transform { position, rotation }
    }

    /// Drops the blended position onto the physical body's local horizontal
    /// plane so a correction on a slope neither floats nor sinks.
    fn remove_vertical_offset(&self, blended: Transform) -> Transform {
        let local = self
            .physical
            .transform
            .inverse_transform_point(blended.position);
        Transform {
            position: blended.transform_point(Vec3::new(0.0, -local.y, 0.0)),
            rotation: blended.rotation,
        }
    }

    /// Stops any blend and shows `transform` immediately. Idempotent.
    pub fn force_snap(&mut self, transform: Transform) {
        let transform = Transform::new(transform.position, transform.rotation);
        self.state = ReconciliationState::None;
        self.pre_correction = None;
        self.predicted.transform = transform;
        self.physical.transform = transform;
        self.smoothed.set(transform);
    }

    /// Snaps to the current physical transform.
    pub fn reset(&mut self) {
        self.force_snap(self.physical.transform);
    }

    pub fn snapshot(&self) -> ReconcilerSnapshot {
        ReconcilerSnapshot {
            config: self.config.clone(),
            predicted: self.predicted,
            physical: self.physical,
            state: self.state,
            smoothed: self.smoothed,
            clock: self.clock,
        }
    }

    pub fn restore(snapshot: ReconcilerSnapshot) -> Self {
        Self {
            config: snapshot.config,
            predicted: snapshot.predicted,
            physical: snapshot.physical,
            state: snapshot.state,
            smoothed: snapshot.smoothed,
            clock: snapshot.clock,
            pre_correction: None,
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}
