//! Triband DSP - Digital Signal Processing Module
//!
//! This crate provides the building blocks of the three-band compressor:
//! - Linkwitz-Riley crossover network splitting audio into low / mid / high
//! - Feed-forward compressor, one instance per band
//! - Solo/mute router that sums the bands back together
//! - Smoothed trim gain for input and output
//! - Fixed-capacity planar buffers shared between stages
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Buffers and filter state are sized in `prepare()`; per-block calls only
//! touch memory that already exists.

mod band;
mod buffer;
mod compressor;
mod crossover;
mod error;
mod gain;
mod processor;
mod router;

pub use band::{Band, NUM_BANDS};
pub use buffer::AudioBuffer;
pub use compressor::{BandCompressor, CompressorSettings};
pub use crossover::{
    clamp_cutoff, BandSplitter, CrossoverFilter, FilterKind, DEFAULT_LOW_MID_HZ,
    DEFAULT_MID_HIGH_HZ,
};
pub use error::DspError;
pub use gain::{db_to_gain, gain_to_db, GainStage, LinearRamp};
pub use processor::{AudioProcessor, ProcessSpec, MAX_CHANNELS};
pub use router::{BandRouter, BandRouting};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let _settings = CompressorSettings::default();
        let _splitter = BandSplitter::new();
        let _router = BandRouter::new();
        assert_eq!(Band::ALL.len(), NUM_BANDS);
    }
}
