use crate::reconciler::{CorrectionOutcome, ReconcilerSnapshot, SmoothingPhase};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);
static TRACE_MODE: AtomicBool = AtomicBool::new(false);

/// Initialize debug mode from environment variables
///
/// - `SMOOTH_LINK_DEBUG=1`: Dump reconciler snapshots as JSON
/// - `SMOOTH_LINK_TRACE=1`: Trace every correction decision and phase change
///
/// Events go through `tracing`; install a subscriber to see them.
pub fn init_debug_mode() {
    let debug = env::var("SMOOTH_LINK_DEBUG").is_ok();
    let trace = env::var("SMOOTH_LINK_TRACE").is_ok();
    set_modes(debug, trace);
}

/// Set both modes explicitly, overriding the environment.
pub fn set_modes(debug: bool, trace: bool) {
    DEBUG_MODE.store(debug, Ordering::Relaxed);
    TRACE_MODE.store(trace, Ordering::Relaxed);

    if debug {
        tracing::info!(target: "smooth_link", "debug mode enabled - snapshots will be logged as JSON");
    }
    if trace {
        tracing::info!(target: "smooth_link", "trace mode enabled - correction decisions will be logged");
    }
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

/// Check if trace mode is enabled
pub fn is_trace_enabled() -> bool {
    TRACE_MODE.load(Ordering::Relaxed)
}

/// Log a reconciler snapshot in JSON format if debug mode is enabled
pub fn log_snapshot(label: &str, snapshot: &ReconcilerSnapshot) {
    if !is_debug_enabled() {
        return;
    }

    match serde_json::to_string_pretty(snapshot) {
        Ok(json) => {
            tracing::debug!(
                target: "smooth_link",
                "{} snapshot ({:?}):\n{}",
                label,
                snapshot.state.phase(),
                json
            );
        }
        Err(e) => {
            tracing::warn!(target: "smooth_link", "failed to serialize snapshot to JSON: {}", e);
        }
    }
}

/// Trace the outcome of a correction check
pub fn trace_correction(outcome: &CorrectionOutcome, error_length: f32) {
    if !is_trace_enabled() {
        return;
    }

    match outcome {
        CorrectionOutcome::Accepted { adjust_duration } => tracing::trace!(
            target: "smooth_link",
            "correction accepted: error {:.3}, blending over {:.3}s per phase",
            error_length,
            adjust_duration
        ),
        other => tracing::trace!(
            target: "smooth_link",
            "correction not smoothed: error {:.3} ({})",
            error_length,
            outcome_summary(other)
        ),
    }
}

/// Trace a smoothing phase transition
pub fn trace_phase_change(from: SmoothingPhase, to: SmoothingPhase, adjust_duration: f32) {
    if !is_trace_enabled() {
        return;
    }

    tracing::trace!(
        target: "smooth_link",
        "phase {:?} -> {:?} (phase length {:.3}s)",
        from,
        to,
        adjust_duration
    );
}

/// Trace a body state written to or read from a wire buffer
pub fn trace_wire(direction: &str, bytes: usize) {
    if !is_trace_enabled() {
        return;
    }

    tracing::trace!(target: "smooth_link", "{} {} bytes of body state", direction, bytes);
}

/// Short human-readable description of a correction outcome
pub fn outcome_summary(outcome: &CorrectionOutcome) -> String {
    match outcome {
        CorrectionOutcome::Accepted { adjust_duration } => {
            format!("accepted ({:.3}s)", adjust_duration)
        }
        CorrectionOutcome::BelowMinLength => "below minimum length".to_string(),
        CorrectionOutcome::Snapped => "snapped".to_string(),
        CorrectionOutcome::TooSlow => "too slow".to_string(),
        CorrectionOutcome::TooLong => "blend too long".to_string(),
        CorrectionOutcome::Disabled => "smoothing disabled".to_string(),
    }
}
