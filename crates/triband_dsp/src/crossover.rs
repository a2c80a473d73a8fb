//! Linkwitz-Riley Crossover Network
//!
//! Splits a signal into low / mid / high bands with two 4th-order
//! Linkwitz-Riley (LR4) crossovers in cascade.
//!
//! # Topology
//!
//! ```text
//!              ┌── LP(f0) ──── AP(f1) ─────────────► low
//!   input ─────┤
//!              └── HP(f0) ──┬── LP(f1) ────────────► mid
//!                           └── HP(f1) ────────────► high
//! ```
//!
//! An LR4 low-pass and high-pass at the same cutoff sum to a 2nd-order
//! all-pass with Q = 1/√2. Mid + high therefore carry the `AP(f1)` phase
//! rotation; running the low band through the same all-pass aligns all three,
//! so `low + mid + high == AP(f1)(AP(f0)(input))`: flat magnitude, no notch
//! at either crossover.
//!
//! Filters run in f64 Direct Form II Transposed; at low cutoffs the poles
//! sit close to the unit circle and f32 state adds audible roundoff.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F64};

use crate::band::NUM_BANDS;
use crate::buffer::AudioBuffer;
use crate::error::DspError;
use crate::processor::{AudioProcessor, ProcessSpec, MAX_CHANNELS};

/// Lowest cutoff handed to the coefficient designer
const MIN_CUTOFF_HZ: f32 = 1.0;

/// Highest cutoff as a fraction of the sample rate (just below Nyquist)
const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Default low-mid crossover frequency (Hz)
pub const DEFAULT_LOW_MID_HZ: f32 = 400.0;

/// Default mid-high crossover frequency (Hz)
pub const DEFAULT_MID_HIGH_HZ: f32 = 2000.0;

/// Response of a single crossover filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// LR4 low-pass (two Butterworth sections)
    LowPass,
    /// LR4 high-pass (two Butterworth sections)
    HighPass,
    /// 2nd-order all-pass matching the LR4 LP + HP sum
    AllPass,
}

impl FilterKind {
    fn sections(self) -> usize {
        match self {
            FilterKind::LowPass | FilterKind::HighPass => 2,
            FilterKind::AllPass => 1,
        }
    }

    fn biquad_type(self) -> Type<f64> {
        match self {
            FilterKind::LowPass => Type::LowPass,
            FilterKind::HighPass => Type::HighPass,
            FilterKind::AllPass => Type::AllPass,
        }
    }
}

/// Identity coefficients used before the first `prepare()`
fn passthrough() -> Coefficients<f64> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// Clamp a requested cutoff into the range the designer accepts at `sample_rate`
#[inline]
pub fn clamp_cutoff(cutoff: f32, sample_rate: f32) -> f32 {
    let upper = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
    if cutoff.is_finite() {
        cutoff.clamp(MIN_CUTOFF_HZ, upper)
    } else {
        upper
    }
}

/// One crossover filter with independent state per channel
pub struct CrossoverFilter {
    kind: FilterKind,
    cutoff: f32,
    sample_rate: f32,
    // [channel][section]; all-pass filters only use section 0
    sections: [[DirectForm2Transposed<f64>; 2]; MAX_CHANNELS],
}

impl CrossoverFilter {
    pub fn new(kind: FilterKind, cutoff: f32) -> Self {
        Self {
            kind,
            cutoff,
            sample_rate: 0.0,
            sections: core::array::from_fn(|_| {
                core::array::from_fn(|_| DirectForm2Transposed::<f64>::new(passthrough()))
            }),
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Cutoff currently used for the coefficients (after clamping)
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    fn design(&self, cutoff: f32) -> Result<Coefficients<f64>, DspError> {
        Coefficients::<f64>::from_params(
            self.kind.biquad_type(),
            (self.sample_rate as f64).hz(),
            (cutoff as f64).hz(),
            Q_BUTTERWORTH_F64,
        )
        .map_err(|_| DspError::InvalidCoefficients {
            frequency: cutoff,
            sample_rate: self.sample_rate,
        })
    }

    /// Configure for a sample rate; clears filter history
    pub fn prepare(&mut self, sample_rate: f32) -> Result<(), DspError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        self.sample_rate = sample_rate;
        let cutoff = clamp_cutoff(self.cutoff, sample_rate);
        let coeffs = self.design(cutoff)?;
        self.apply(coeffs);
        self.cutoff = cutoff;
        self.reset();
        Ok(())
    }

    /// Re-target the cutoff; history is kept so moving a crossover doesn't click
    ///
    /// # Real-time Safety
    /// No allocations. Coefficients are only recomputed when the cutoff moves.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if self.sample_rate <= 0.0 {
            self.cutoff = cutoff;
            return;
        }
        let cutoff = clamp_cutoff(cutoff, self.sample_rate);
        if cutoff == self.cutoff {
            return;
        }
        // A clamped cutoff is always designable; keep the old response otherwise
        if let Ok(coeffs) = self.design(cutoff) {
            self.apply(coeffs);
            self.cutoff = cutoff;
        }
    }

    fn apply(&mut self, coeffs: Coefficients<f64>) {
        for channel in self.sections.iter_mut() {
            for section in channel.iter_mut() {
                section.update_coefficients(coeffs);
            }
        }
    }

    /// Filter one sample of `channel`
    ///
    /// A non-finite result clears that channel's history and yields silence,
    /// so a single bad sample cannot lock the filter into NaN.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let sections = &mut self.sections[channel][..self.kind.sections()];
        let mut x = input as f64;
        for section in sections.iter_mut() {
            x = section.run(x);
        }
        if x.is_finite() {
            x as f32
        } else {
            for section in sections.iter_mut() {
                section.reset_state();
            }
            0.0
        }
    }

    /// Filter one channel in place
    #[inline]
    pub fn process(&mut self, channel: usize, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(channel, *sample);
        }
    }

    /// Clear the delay lines of every channel
    pub fn reset(&mut self) {
        for channel in self.sections.iter_mut() {
            for section in channel.iter_mut() {
                section.reset_state();
            }
        }
    }
}

/// Three-band splitter built from two LR4 crossovers and an all-pass compensator
pub struct BandSplitter {
    low_pass_1: CrossoverFilter,
    high_pass_1: CrossoverFilter,
    all_pass_2: CrossoverFilter,
    low_pass_2: CrossoverFilter,
    high_pass_2: CrossoverFilter,
    channels: usize,
}

impl BandSplitter {
    pub fn new() -> Self {
        Self {
            low_pass_1: CrossoverFilter::new(FilterKind::LowPass, DEFAULT_LOW_MID_HZ),
            high_pass_1: CrossoverFilter::new(FilterKind::HighPass, DEFAULT_LOW_MID_HZ),
            all_pass_2: CrossoverFilter::new(FilterKind::AllPass, DEFAULT_MID_HIGH_HZ),
            low_pass_2: CrossoverFilter::new(FilterKind::LowPass, DEFAULT_MID_HIGH_HZ),
            high_pass_2: CrossoverFilter::new(FilterKind::HighPass, DEFAULT_MID_HIGH_HZ),
            channels: MAX_CHANNELS,
        }
    }

    /// Set both crossover frequencies
    ///
    /// Ordering is not enforced: `low_mid >= mid_high` runs the same cascade
    /// and simply produces overlapping bands.
    pub fn set_crossovers(&mut self, low_mid: f32, mid_high: f32) {
        self.low_pass_1.set_cutoff(low_mid);
        self.high_pass_1.set_cutoff(low_mid);
        self.all_pass_2.set_cutoff(mid_high);
        self.low_pass_2.set_cutoff(mid_high);
        self.high_pass_2.set_cutoff(mid_high);
    }

    /// Current (clamped) crossover frequencies as `(low_mid, mid_high)`
    pub fn crossovers(&self) -> (f32, f32) {
        (self.low_pass_1.cutoff(), self.low_pass_2.cutoff())
    }

    /// Split `input` into `bands` (low, mid, high)
    ///
    /// Every band buffer takes the length of `input`.
    ///
    /// # Real-time Safety
    /// No allocations. O(n) where n = block size.
    pub fn split(
        &mut self,
        input: &AudioBuffer,
        bands: &mut [AudioBuffer; NUM_BANDS],
    ) -> Result<(), DspError> {
        let [low, mid, high] = bands;
        low.copy_from(input)?;
        mid.copy_from(input)?;

        let channels = self.channels.min(input.num_channels());
        for ch in 0..channels {
            let low = low.channel_mut(ch);
            self.low_pass_1.process(ch, low);
            self.all_pass_2.process(ch, low);

            self.high_pass_1.process(ch, mid.channel_mut(ch));
        }

        // The intermediate (above f0) now lives in `mid`; fork it before stage B
        high.copy_from(mid)?;
        for ch in 0..channels {
            self.low_pass_2.process(ch, mid.channel_mut(ch));
            self.high_pass_2.process(ch, high.channel_mut(ch));
        }
        Ok(())
    }

    fn filters_mut(&mut self) -> [&mut CrossoverFilter; 5] {
        [
            &mut self.low_pass_1,
            &mut self.high_pass_1,
            &mut self.all_pass_2,
            &mut self.low_pass_2,
            &mut self.high_pass_2,
        ]
    }
}

impl Default for BandSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProcessor for BandSplitter {
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<(), DspError> {
        spec.validate()?;
        self.channels = spec.channels;
        for filter in self.filters_mut() {
            filter.prepare(spec.sample_rate)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        for filter in self.filters_mut() {
            filter.reset();
        }
    }

    fn name(&self) -> &'static str {
        "LR4 Band Splitter"
    }
}
