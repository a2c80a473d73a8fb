//! Trim Gain Stage
//!
//! Applies a dB trim as a linear gain. A change of trim between blocks is
//! spread over the next block as a linear ramp, so the gain never jumps
//! within a block and always lands on the target at the block's last sample.

use crate::buffer::AudioBuffer;
use crate::error::DspError;
use crate::processor::{AudioProcessor, ProcessSpec};

/// Floor used when converting silence to dB
const MIN_GAIN: f32 = 1e-9;

/// Convert decibels to linear amplitude
/// Formula: amplitude = 10^(dB/20)
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels (silence maps to -180 dB)
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.abs().max(MIN_GAIN).log10()
}

/// Linear interpolation from `start` to `end` over a block of `len` samples
///
/// `at(len - 1)` is exactly `end`; a ramp with `start == end` is exactly flat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRamp {
    start: f32,
    end: f32,
    step: f32,
    len: usize,
}

impl LinearRamp {
    pub fn new(start: f32, end: f32, len: usize) -> Self {
        let step = if len == 0 || start == end {
            0.0
        } else {
            (end - start) / len as f32
        };
        Self {
            start,
            end,
            step,
            len,
        }
    }

    #[inline]
    pub fn at(&self, index: usize) -> f32 {
        if index + 1 >= self.len {
            self.end
        } else {
            self.start + self.step * (index + 1) as f32
        }
    }

    /// Whether the ramp holds a constant value
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.step == 0.0
    }
}

/// Smoothed scalar gain, used for input and output trim
#[derive(Debug, Clone)]
pub struct GainStage {
    name: &'static str,
    current: f32,
    primed: bool,
}

impl GainStage {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: 1.0,
            primed: false,
        }
    }

    /// Linear gain reached at the end of the last processed block
    pub fn current_gain(&self) -> f32 {
        self.current
    }

    /// Apply `gain_db` to every channel of `buffer`
    ///
    /// The first block after `prepare()`/`reset()` starts directly at the
    /// target so playback doesn't fade in.
    ///
    /// # Real-time Safety
    /// No allocations. O(n) where n = block size.
    pub fn process(&mut self, buffer: &mut AudioBuffer, gain_db: f32) {
        let mut target = db_to_gain(gain_db);
        if !target.is_finite() {
            target = self.current;
        }
        if !self.primed {
            self.current = target;
            self.primed = true;
        }

        let ramp = LinearRamp::new(self.current, target, buffer.num_samples());
        for ch in 0..buffer.num_channels() {
            let samples = buffer.channel_mut(ch);
            if ramp.is_flat() {
                samples.iter_mut().for_each(|s| *s *= target);
            } else {
                for (i, s) in samples.iter_mut().enumerate() {
                    *s *= ramp.at(i);
                }
            }
        }
        self.current = target;
    }
}

impl AudioProcessor for GainStage {
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<(), DspError> {
        spec.validate()?;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.current = 1.0;
        self.primed = false;
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
