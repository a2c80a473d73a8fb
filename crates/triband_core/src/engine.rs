//! Multiband Engine
//!
//! Owns every pipeline stage and its working buffers, and runs one block at a
//! time:
//!
//! ```text
//!   snapshot ─▶ gain in ─▶ splitter ─┬─▶ compressor (low)  ─┐
//!                                    ├─▶ compressor (mid)  ─┼─▶ router/sum ─▶ gain out ─▶ meter
//!                                    └─▶ compressor (high) ─┘
//! ```
//!
//! `prepare()` and `reset()` run on the control thread. `process_*()` is meant
//! for the audio callback: it reads the parameter store once, never allocates
//! and never logs.

use std::sync::Arc;

use tracing::{debug, info, warn};
use triband_dsp::{
    AudioBuffer, AudioProcessor, Band, BandCompressor, BandRouter, BandSplitter, GainStage,
    ProcessSpec, NUM_BANDS,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::meter::{meter_channel, MeterFrame, MeterPublisher, MeterReader};
use crate::store::ParameterStore;

/// Host samples that are NaN or infinite enter the pipeline as silence
#[inline]
fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() {
        sample
    } else {
        0.0
    }
}

/// Three-band compressor engine
pub struct MultibandEngine {
    params: Arc<ParameterStore>,
    spec: Option<ProcessSpec>,
    meter_capacity: usize,

    input_gain: GainStage,
    splitter: BandSplitter,
    compressors: [BandCompressor; NUM_BANDS],
    router: BandRouter,
    output_gain: GainStage,

    /// Holds the block from copy-in until copy-out; also the router's sum
    io: AudioBuffer,
    bands: [AudioBuffer; NUM_BANDS],

    meters: Option<MeterPublisher>,
    last_frame: MeterFrame,
}

impl MultibandEngine {
    /// Create an unprepared engine reading from `params`
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            params,
            spec: None,
            meter_capacity: EngineConfig::default().meter_capacity,
            input_gain: GainStage::new("Gain In"),
            splitter: BandSplitter::new(),
            compressors: core::array::from_fn(|_| BandCompressor::new()),
            router: BandRouter::new(),
            output_gain: GainStage::new("Gain Out"),
            io: AudioBuffer::default(),
            bands: Default::default(),
            meters: None,
            last_frame: MeterFrame::default(),
        }
    }

    /// Shared parameter store
    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    /// Allocate working buffers and clear all filter/envelope state
    ///
    /// May be called again to change the stream layout.
    ///
    /// Note: This allocates. Only call during setup, not in audio callback.
    pub fn prepare(&mut self, config: &EngineConfig) -> EngineResult<()> {
        config.validate()?;
        let spec = config.process_spec();
        spec.validate()?;

        self.input_gain.prepare(&spec)?;
        self.splitter.prepare(&spec)?;
        for compressor in &mut self.compressors {
            compressor.prepare(&spec)?;
        }
        self.output_gain.prepare(&spec)?;

        self.io.allocate(spec.channels, spec.max_block_size);
        for band in &mut self.bands {
            band.allocate(spec.channels, spec.max_block_size);
        }

        self.spec = Some(spec);
        self.meter_capacity = config.meter_capacity;
        self.last_frame = MeterFrame::default();
        self.report_dropped_meters();

        info!(
            "Engine prepared: {} Hz, {} channel(s), {} frame blocks ({:.1}ms)",
            config.sample_rate,
            config.channels,
            config.max_block_size,
            config.latency_ms()
        );
        debug!(
            "Pipeline: {} -> {} -> {} x{} -> {}",
            self.input_gain.name(),
            self.splitter.name(),
            self.compressors[0].name(),
            NUM_BANDS,
            self.output_gain.name()
        );
        let (low_mid, mid_high) = self.splitter.crossovers();
        for band in Band::ALL {
            let (lower, upper) = match band {
                Band::Low => (0.0, low_mid),
                Band::Mid => (low_mid, mid_high),
                Band::High => (mid_high, spec.sample_rate / 2.0),
            };
            debug!("{} band: {:.0}-{:.0} Hz", band.name(), lower, upper);
        }
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.spec.is_some()
    }

    /// Layout the engine was last prepared with
    pub fn process_spec(&self) -> Option<&ProcessSpec> {
        self.spec.as_ref()
    }

    /// Open a meter channel; one frame is published per processed block
    ///
    /// Replaces any previously connected reader.
    ///
    /// Note: This allocates. Only call during setup, not in audio callback.
    pub fn connect_meters(&mut self) -> MeterReader {
        self.report_dropped_meters();
        let (publisher, reader) = meter_channel(self.meter_capacity);
        self.meters = Some(publisher);
        debug!("Meter channel connected ({} frames)", self.meter_capacity);
        reader
    }

    /// Meter values of the most recently processed block
    pub fn last_meter_frame(&self) -> MeterFrame {
        self.last_frame
    }

    /// Clear filter, envelope and smoother state after a transport discontinuity
    pub fn reset(&mut self) {
        self.input_gain.reset();
        self.splitter.reset();
        for compressor in &mut self.compressors {
            compressor.reset();
        }
        self.output_gain.reset();

        self.io.clear();
        for band in &mut self.bands {
            band.clear();
        }
        self.last_frame = MeterFrame::default();
        self.report_dropped_meters();
        debug!("Engine reset");
    }

    fn report_dropped_meters(&mut self) {
        let Some(meters) = self.meters.as_mut() else {
            return;
        };
        let dropped = meters.take_dropped();
        if dropped > 0 {
            warn!("{} meter frame(s) dropped, reader is falling behind", dropped);
        }
        if meters.is_abandoned() {
            debug!("Meter reader gone, disconnecting");
            self.meters = None;
        }
    }

    /// Process planar (one slice per channel) audio in place
    ///
    /// All slices must have the same length, at most the prepared block size.
    ///
    /// # Real-time Safety
    /// No allocations, no locks, no logging.
    pub fn process_planar(&mut self, channels: &mut [&mut [f32]]) -> EngineResult<()> {
        let spec = self.spec.ok_or(EngineError::NotPrepared)?;
        if channels.len() != spec.channels {
            return Err(EngineError::ChannelMismatch {
                expected: spec.channels,
                got: channels.len(),
            });
        }
        let frames = channels.first().map_or(0, |ch| ch.len());
        if let Some(ragged) = channels.iter().find(|ch| ch.len() != frames) {
            return Err(EngineError::RaggedChannels {
                expected: frames,
                got: ragged.len(),
            });
        }
        if frames > spec.max_block_size {
            return Err(EngineError::BlockTooLarge {
                max: spec.max_block_size,
                got: frames,
            });
        }
        if frames == 0 {
            return Ok(());
        }

        self.io.set_len(frames)?;
        for (ch, source) in channels.iter().enumerate() {
            for (sample, input) in self.io.channel_mut(ch).iter_mut().zip(source.iter()) {
                *sample = sanitize(*input);
            }
        }

        self.run_block()?;

        for (ch, dest) in channels.iter_mut().enumerate() {
            dest.copy_from_slice(self.io.channel(ch));
        }
        Ok(())
    }

    /// Process interleaved audio (`L R L R ...` for stereo) in place
    ///
    /// # Real-time Safety
    /// No allocations, no locks, no logging.
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) -> EngineResult<()> {
        let spec = self.spec.ok_or(EngineError::NotPrepared)?;
        let num_channels = spec.channels;
        if buffer.len() % num_channels != 0 {
            return Err(EngineError::InterleavedLength {
                len: buffer.len(),
                channels: num_channels,
            });
        }
        let frames = buffer.len() / num_channels;
        if frames > spec.max_block_size {
            return Err(EngineError::BlockTooLarge {
                max: spec.max_block_size,
                got: frames,
            });
        }
        if frames == 0 {
            return Ok(());
        }

        self.io.set_len(frames)?;
        for ch in 0..num_channels {
            let dest = self.io.channel_mut(ch);
            for (sample, frame) in dest.iter_mut().zip(buffer.chunks_exact(num_channels)) {
                *sample = sanitize(frame[ch]);
            }
        }

        self.run_block()?;

        for ch in 0..num_channels {
            let source = self.io.channel(ch);
            for (frame, sample) in buffer.chunks_exact_mut(num_channels).zip(source) {
                frame[ch] = *sample;
            }
        }
        Ok(())
    }

    /// Run the pipeline over the block held in `io`
    fn run_block(&mut self) -> EngineResult<()> {
        let snapshot = self.params.snapshot();

        self.input_gain.process(&mut self.io, snapshot.gain_in_db);
        let input_peak = self.io.peak();

        self.splitter.set_crossovers(
            snapshot.low_mid_crossover_hz,
            snapshot.mid_high_crossover_hz,
        );
        self.splitter.split(&self.io, &mut self.bands)?;

        for ((compressor, band), settings) in self
            .compressors
            .iter_mut()
            .zip(self.bands.iter_mut())
            .zip(snapshot.bands.iter())
        {
            compressor.process(band, &settings.compressor);
        }

        let audible = self
            .router
            .mix(&mut self.bands, &snapshot.routing(), &mut self.io)?;

        self.output_gain.process(&mut self.io, snapshot.gain_out_db);

        let frame = MeterFrame {
            gain_reduction_db: core::array::from_fn(|b| self.compressors[b].gain_reduction_db()),
            audible,
            input_peak,
            output_peak: self.io.peak(),
        };
        self.last_frame = frame;
        if let Some(meters) = self.meters.as_mut() {
            meters.publish(frame);
        }
        Ok(())
    }
}
