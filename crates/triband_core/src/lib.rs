//! Triband Core - Multiband Compressor Engine
//!
//! This crate wires the `triband_dsp` stages into a complete processor:
//! - Lock-free parameter store shared between control and audio threads
//! - Static parameter table (ranges, defaults, display strings)
//! - Per-block pipeline orchestration over planar or interleaved audio
//! - Gain reduction and peak metering over an rtrb ring
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │   ParameterStore::set ──▶ Arc<ParameterStore>   MeterReader │
//! └─────────────────────────────────────────────────────────────┘
//!                      │ AtomicU32 (Relaxed)        ▲ rtrb
//!                      ▼                            │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Audio Thread                          │
//! │   snapshot ─▶ gain ─▶ split ─▶ compress ×3 ─▶ route ─▶ gain │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod engine;
mod error;
mod meter;
mod params;
mod snapshot;
mod store;

pub use config::EngineConfig;
pub use engine::MultibandEngine;
pub use error::{EngineError, EngineResult};
pub use meter::{meter_channel, MeterFrame, MeterPublisher, MeterReader};
pub use params::{
    ParamId, ParamKind, ParamSpec, ParamValue, Unit, NUM_PARAMS, PARAM_SPECS, RATIO_CHOICES,
};
pub use snapshot::{BandSnapshot, EngineSnapshot};
pub use store::ParameterStore;

// Re-export DSP types for convenience
pub use triband_dsp::{Band, BandRouting, CompressorSettings, NUM_BANDS};
