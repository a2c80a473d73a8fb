//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while preparing DSP components
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid filter coefficients for frequency {frequency}Hz at sample rate {sample_rate}Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: f32 },

    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("Unsupported channel count: {0} (must be 1 or 2)")]
    UnsupportedChannelCount(usize),

    #[error("Buffer size mismatch: capacity {capacity}, requested {requested}")]
    BufferSizeMismatch { capacity: usize, requested: usize },
}
