//! Feed-forward Band Compressor
//!
//! Log-domain compressor with a peak envelope follower per channel.
//!
//! # Algorithm
//!
//! For every sample:
//! - envelope follows `|x|`, rising with the attack coefficient and falling
//!   with the release coefficient: `env = coeff * env + (1 - coeff) * |x|`
//! - above threshold, gain reduction is `(level_dB - threshold_dB) * (1 - 1/ratio)`
//! - the sample is scaled by `10^(-reduction/20)`
//!
//! Threshold and ratio are ramped across the block from the values used by
//! the previous block; attack/release coefficients are derived once per block.
//!
//! While bypassed the buffer is left untouched and the envelope is frozen,
//! so un-bypassing resumes from the level held at the moment of bypass
//! instead of re-attacking from silence.

use crate::buffer::AudioBuffer;
use crate::error::DspError;
use crate::gain::{db_to_gain, LinearRamp};
use crate::processor::{AudioProcessor, ProcessSpec, MAX_CHANNELS};

/// Shortest attack/release time used for coefficient design (ms)
const MIN_TIME_MS: f32 = 0.1;

/// Envelope floor so silence maps to a finite level
const MIN_ENVELOPE: f32 = 1e-9;

/// Per-block compressor settings for one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    pub attack_ms: f32,
    pub release_ms: f32,
    pub threshold_db: f32,
    /// Compression ratio as `ratio:1`; 1.0 disables gain reduction
    pub ratio: f32,
    pub bypass: bool,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            attack_ms: 50.0,
            release_ms: 250.0,
            threshold_db: 0.0,
            ratio: 3.0,
            bypass: false,
        }
    }
}

impl CompressorSettings {
    /// Fraction of the overshoot removed: `1 - 1/ratio`, 0 for ratios at or below 1:1
    #[inline]
    pub fn slope(&self) -> f32 {
        if self.ratio.is_finite() && self.ratio > 1.0 {
            1.0 - 1.0 / self.ratio
        } else {
            0.0
        }
    }
}

/// Smoothing coefficient for a time constant in milliseconds
/// coeff = exp(-1 / (time_ms * sample_rate / 1000))
#[inline]
fn time_coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    let time_ms = if time_ms.is_finite() {
        time_ms.max(MIN_TIME_MS)
    } else {
        MIN_TIME_MS
    };
    (-1.0 / (time_ms * sample_rate / 1000.0)).exp()
}

/// Dynamic range compressor for one band
pub struct BandCompressor {
    envelopes: [f32; MAX_CHANNELS],
    sample_rate: f32,
    threshold_db: f32,
    slope: f32,
    primed: bool,
    gain_reduction_db: f32,
}

impl BandCompressor {
    pub fn new() -> Self {
        Self {
            envelopes: [0.0; MAX_CHANNELS],
            sample_rate: 48000.0,
            threshold_db: 0.0,
            slope: 0.0,
            primed: false,
            gain_reduction_db: 0.0,
        }
    }

    /// Current envelope level (linear) of a channel
    pub fn envelope(&self, channel: usize) -> f32 {
        self.envelopes[channel]
    }

    /// Largest gain reduction (dB, positive) applied during the last block
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    /// Compress `buffer` in place
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls. O(n) where n = block size.
    pub fn process(&mut self, buffer: &mut AudioBuffer, settings: &CompressorSettings) {
        let target_threshold = if settings.threshold_db.is_finite() {
            settings.threshold_db
        } else {
            self.threshold_db
        };
        let target_slope = settings.slope();

        if !self.primed {
            self.threshold_db = target_threshold;
            self.slope = target_slope;
            self.primed = true;
        }

        if settings.bypass {
            // Envelope held; ramps restart from the current settings on un-bypass
            self.threshold_db = target_threshold;
            self.slope = target_slope;
            self.gain_reduction_db = 0.0;
            return;
        }

        let len = buffer.num_samples();
        let threshold = LinearRamp::new(self.threshold_db, target_threshold, len);
        let slope = LinearRamp::new(self.slope, target_slope, len);
        let attack = time_coefficient(settings.attack_ms, self.sample_rate);
        let release = time_coefficient(settings.release_ms, self.sample_rate);

        let mut max_reduction = 0.0_f32;
        for ch in 0..buffer.num_channels().min(MAX_CHANNELS) {
            let mut env = self.envelopes[ch];
            for (i, sample) in buffer.channel_mut(ch).iter_mut().enumerate() {
                let level = sample.abs();
                let coeff = if level > env { attack } else { release };
                env = coeff * env + (1.0 - coeff) * level;
                if !env.is_finite() {
                    env = 0.0;
                }

                let level_db = 20.0 * env.max(MIN_ENVELOPE).log10();
                let overshoot = level_db - threshold.at(i);
                if overshoot > 0.0 {
                    let reduction = overshoot * slope.at(i);
                    if reduction > 0.0 {
                        let gain = db_to_gain(-reduction);
                        *sample *= if gain.is_finite() {
                            gain.clamp(0.0, 1.0)
                        } else {
                            0.0
                        };
                        max_reduction = max_reduction.max(reduction);
                    }
                }
            }
            self.envelopes[ch] = env;
        }

        self.threshold_db = target_threshold;
        self.slope = target_slope;
        self.gain_reduction_db = max_reduction;
    }
}

impl Default for BandCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProcessor for BandCompressor {
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<(), DspError> {
        spec.validate()?;
        self.sample_rate = spec.sample_rate;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.envelopes = [0.0; MAX_CHANNELS];
        self.primed = false;
        self.gain_reduction_db = 0.0;
    }

    fn name(&self) -> &'static str {
        "Band Compressor"
    }
}
