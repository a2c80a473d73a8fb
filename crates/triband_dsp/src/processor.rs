//! Audio Processor Trait
//!
//! Defines the lifecycle shared by every stage of the band pipeline
//! (splitter, compressors, gain stages).

use crate::error::DspError;

/// Maximum channel count supported by the pipeline (mono or stereo)
pub const MAX_CHANNELS: usize = 2;

/// Stream layout negotiated with the host before processing starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f32,
    pub channels: usize,
    pub max_block_size: usize,
}

impl ProcessSpec {
    pub fn new(sample_rate: f32, channels: usize, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            channels,
            max_block_size,
        }
    }

    /// Check the layout can be handled without failing later on the audio thread
    pub fn validate(&self) -> Result<(), DspError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(DspError::UnsupportedChannelCount(self.channels));
        }
        Ok(())
    }
}

/// Trait for stages of the band pipeline
///
/// # Real-time Safety Contract
///
/// `prepare()` runs on the control thread and may allocate.
/// Everything a stage does per block must follow these rules:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - O(n) time complexity where n = block size
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor: Send {
    /// Configure for a new stream layout and clear all internal state
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<(), DspError>;

    /// Reset internal state (filter history, envelopes, ramps)
    fn reset(&mut self);

    /// Human-readable name for debugging/logging
    fn name(&self) -> &'static str;
}
