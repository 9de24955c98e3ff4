pub mod math;
pub mod half_float;
pub mod codec;
pub mod body_state;
pub mod config;
pub mod store;
pub mod reconciler;
pub mod registry;
pub mod serialization;
pub mod error;
pub mod debug;

pub use math::{
    Vec3, Quat, Transform,
};

pub use half_float::{
    to_float16, to_float32,
};

pub use codec::{
    compress_vector3, compress_vector3_tagged, decompress_vector3,
    compress_quaternion, decompress_quaternion, packed_tag,
    compress_transform, decompress_transform, CompressedTransform,
};

pub use body_state::NetworkBodyState;

pub use config::SmoothingConfig;

pub use store::SmoothedTransformStore;

pub use reconciler::{
    Reconciler, PredictedSample, ReconciliationState, Blend,
    SmoothingPhase, CorrectionOutcome, ReconcilerSnapshot,
};

pub use registry::{
    SmoothingRegistry, ObjectId,
};

pub use serialization::{
    BinarySerializer, BinaryFormat,
};

pub use error::{
    LinkError, Result,
};

pub use debug::{
    init_debug_mode, is_debug_enabled, is_trace_enabled,
    log_snapshot, trace_correction, trace_phase_change, trace_wire,
    outcome_summary,
};
