//! Engine Configuration

use serde::{Deserialize, Serialize};
use triband_dsp::{ProcessSpec, MAX_CHANNELS};

use crate::error::{EngineError, EngineResult};

/// Stream layout and resource sizing handed to `MultibandEngine::prepare`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Largest block the host will ever pass to `process`, in frames
    pub max_block_size: u32,

    /// Meter frames buffered for the control thread (one per processed block)
    #[serde(default = "default_meter_capacity")]
    pub meter_capacity: usize,
}

fn default_meter_capacity() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            max_block_size: 512,
            meter_capacity: default_meter_capacity(),
        }
    }
}

impl EngineConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            max_block_size: 128, // ~2.6ms latency
            meter_capacity: 256,
            ..Self::default()
        }
    }

    /// Create config optimized for stability
    pub fn stable() -> Self {
        Self {
            max_block_size: 2048, // ~42ms latency
            meter_capacity: 32,
            ..Self::default()
        }
    }

    /// Calculate latency in milliseconds of one maximum-size block
    pub fn latency_ms(&self) -> f32 {
        (self.max_block_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 384000 {
            return Err(EngineError::InvalidConfig(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 || self.channels as usize > MAX_CHANNELS {
            return Err(EngineError::InvalidConfig(format!(
                "Invalid channel count: {}",
                self.channels
            )));
        }
        if self.max_block_size == 0 || self.max_block_size > 16384 {
            return Err(EngineError::InvalidConfig(format!(
                "Invalid max block size: {}",
                self.max_block_size
            )));
        }
        if self.meter_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "Meter capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Layout passed down to the DSP stages
    pub fn process_spec(&self) -> ProcessSpec {
        ProcessSpec::new(
            self.sample_rate as f32,
            self.channels as usize,
            self.max_block_size as usize,
        )
    }
}
