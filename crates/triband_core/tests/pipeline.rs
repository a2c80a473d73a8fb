//! End-to-end behaviour of the engine: reconstruction, compression,
//! bypass, solo/mute routing and trim gain.

use std::sync::Arc;

use triband_core::{
    Band, EngineConfig, MultibandEngine, ParamId, ParamValue, ParameterStore, RATIO_CHOICES,
};
use triband_dsp::{
    AudioBuffer, AudioProcessor, BandSplitter, CrossoverFilter, FilterKind, ProcessSpec,
    NUM_BANDS,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK: usize = 256;

fn engine_with(params: &Arc<ParameterStore>) -> MultibandEngine {
    let mut engine = MultibandEngine::new(Arc::clone(params));
    engine
        .prepare(&EngineConfig {
            sample_rate: SAMPLE_RATE as u32,
            channels: 2,
            max_block_size: BLOCK as u32,
            meter_capacity: 16,
        })
        .unwrap();
    engine
}

/// Transparent settings: every compressor at 1:1
fn transparent_params() -> Arc<ParameterStore> {
    let params = Arc::new(ParameterStore::new());
    for band in Band::ALL {
        params.set(ParamId::ratio(band), 0usize);
    }
    params
}

/// Deterministic broadband test signal: a few sines plus a pseudo-random hiss
fn test_signal(len: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(747796405).wrapping_add(2891336453);
    (0..len)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = (state as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let t = i as f32 / SAMPLE_RATE;
            0.3 * (2.0 * std::f32::consts::PI * 90.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * 1100.0 * t).sin()
                + 0.1 * (2.0 * std::f32::consts::PI * 7000.0 * t).sin()
                + 0.1 * noise
        })
        .collect()
}

fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

/// Run a stereo signal through the engine block by block
fn run(engine: &mut MultibandEngine, left: &[f32], right: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut out_left = left.to_vec();
    let mut out_right = right.to_vec();
    for (l, r) in out_left.chunks_mut(BLOCK).zip(out_right.chunks_mut(BLOCK)) {
        engine.process_planar(&mut [l, r]).unwrap();
    }
    (out_left, out_right)
}

/// Input run through the crossover's all-pass response
fn allpass_reference(input: &[f32], low_mid: f32, mid_high: f32) -> Vec<f32> {
    let mut first = CrossoverFilter::new(FilterKind::AllPass, low_mid);
    let mut second = CrossoverFilter::new(FilterKind::AllPass, mid_high);
    first.prepare(SAMPLE_RATE).unwrap();
    second.prepare(SAMPLE_RATE).unwrap();
    let mut reference = input.to_vec();
    first.process(0, &mut reference);
    second.process(0, &mut reference);
    reference
}

/// Bands of a standalone splitter fed block by block, channel 0 only
fn standalone_bands(input: &[f32], low_mid: f32, mid_high: f32) -> [Vec<f32>; NUM_BANDS] {
    let mut splitter = BandSplitter::new();
    splitter
        .prepare(&ProcessSpec::new(SAMPLE_RATE, 1, BLOCK))
        .unwrap();
    splitter.set_crossovers(low_mid, mid_high);

    let mut block = AudioBuffer::with_capacity(1, BLOCK);
    let mut bands: [AudioBuffer; NUM_BANDS] =
        core::array::from_fn(|_| AudioBuffer::with_capacity(1, BLOCK));
    let mut out: [Vec<f32>; NUM_BANDS] = Default::default();

    for chunk in input.chunks(BLOCK) {
        block.set_len(chunk.len()).unwrap();
        block.channel_mut(0).copy_from_slice(chunk);
        splitter.split(&block, &mut bands).unwrap();
        for (dst, band) in out.iter_mut().zip(&bands) {
            dst.extend_from_slice(band.channel(0));
        }
    }
    out
}

fn relative_error(actual: &[f32], expected: &[f32]) -> f64 {
    let mut error = 0.0f64;
    let mut energy = 0.0f64;
    for (a, e) in actual.iter().zip(expected) {
        error += ((a - e) as f64).powi(2);
        energy += (*e as f64).powi(2);
    }
    (error / energy.max(1e-12)).sqrt()
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn transparent_engine_reconstructs_allpassed_input() {
    let params = transparent_params();
    let mut engine = engine_with(&params);

    let left = test_signal(BLOCK * 40, 1);
    let right = test_signal(BLOCK * 40, 2);
    let (out_left, out_right) = run(&mut engine, &left, &right);

    let error_left = relative_error(&out_left, &allpass_reference(&left, 400.0, 2000.0));
    let error_right = relative_error(&out_right, &allpass_reference(&right, 400.0, 2000.0));
    assert!(error_left < 1e-3, "left reconstruction error {}", error_left);
    assert!(error_right < 1e-3, "right reconstruction error {}", error_right);
}

#[test]
fn transparent_engine_preserves_sine_level() {
    for freq in [50.0, 400.0, 1000.0, 2000.0, 8000.0] {
        let params = transparent_params();
        let mut engine = engine_with(&params);

        let input = sine(freq, 0.5, 9600 * 3);
        let (out, _) = run(&mut engine, &input, &input);

        // Skip the first 9600 samples of filter settling
        let ratio = rms(&out[9600..]) / rms(&input[9600..]);
        assert!(
            (ratio - 1.0).abs() < 0.002,
            "{} Hz level changed by {}",
            freq,
            ratio
        );
    }
}

#[test]
fn higher_ratio_lowers_output() {
    let input = sine(1000.0, 0.8, BLOCK * 40);
    let mut previous = f32::INFINITY;

    for (index, ratio) in RATIO_CHOICES.iter().enumerate() {
        let params = Arc::new(ParameterStore::new());
        params.set(ParamId::SoloMidBand, true);
        params.set(ParamId::ThresholdMidBand, -30.0_f32);
        params.set(ParamId::AttackMidBand, 5.0_f32);
        params.set(ParamId::RatioMidBand, index);
        let mut engine = engine_with(&params);

        let (out, _) = run(&mut engine, &input, &input);
        let level = rms(&out[BLOCK * 20..]);
        assert!(
            level < previous,
            "ratio {}:1 produced {} after {}",
            ratio,
            level,
            previous
        );
        previous = level;
    }
}

#[test]
fn bypassed_bands_match_unity_ratio() {
    let input = test_signal(BLOCK * 16, 7);

    let bypassed = Arc::new(ParameterStore::new());
    for band in Band::ALL {
        bypassed.set(ParamId::bypass(band), true);
        bypassed.set(ParamId::threshold(band), -60.0_f32);
        bypassed.set(ParamId::ratio(band), 13usize);
    }
    let mut bypassed_engine = engine_with(&bypassed);
    let (bypassed_out, _) = run(&mut bypassed_engine, &input, &input);

    let mut unity_engine = engine_with(&transparent_params());
    let (unity_out, _) = run(&mut unity_engine, &input, &input);

    assert_eq!(bypassed_out, unity_out);
}

#[test]
fn processing_is_deterministic() {
    let params = Arc::new(ParameterStore::new());
    params.set(ParamId::ThresholdLowBand, -30.0_f32);
    params.set(ParamId::ThresholdHighBand, -20.0_f32);
    params.set(ParamId::RatioHighBand, 8usize);

    let input = test_signal(BLOCK * 8, 3);
    let mut first = engine_with(&params);
    let mut second = engine_with(&params);
    assert_eq!(run(&mut first, &input, &input), run(&mut second, &input, &input));

    // Same engine after reset behaves like a fresh one
    first.reset();
    let mut fresh = engine_with(&params);
    assert_eq!(run(&mut first, &input, &input), run(&mut fresh, &input, &input));
}

#[test]
fn solo_outputs_only_that_band() {
    let params = transparent_params();
    params.set(ParamId::SoloMidBand, true);
    params.set(ParamId::MuteMidBand, true); // solo wins over mute
    let mut engine = engine_with(&params);

    let input = test_signal(BLOCK * 12, 11);
    let (out, _) = run(&mut engine, &input, &input);
    let [_, mid, _] = standalone_bands(&input, 400.0, 2000.0);

    for (i, (a, e)) in out.iter().zip(&mid).enumerate() {
        assert!((a - e).abs() < 1e-6, "sample {}: {} vs {}", i, a, e);
    }
    assert_eq!(engine.last_meter_frame().audible, [false, true, false]);
}

#[test]
fn muted_band_drops_out_of_the_sum() {
    let params = transparent_params();
    params.set(ParamId::MuteLowBand, true);
    let mut engine = engine_with(&params);

    let input = test_signal(BLOCK * 12, 5);
    let (out, _) = run(&mut engine, &input, &input);
    let [_, mid, high] = standalone_bands(&input, 400.0, 2000.0);

    for (i, a) in out.iter().enumerate() {
        let expected = mid[i] + high[i];
        assert!((a - expected).abs() < 1e-6, "sample {}", i);
    }
}

#[test]
fn all_bands_muted_is_silent() {
    let params = Arc::new(ParameterStore::new());
    for band in Band::ALL {
        params.set(ParamId::mute(band), true);
    }
    let mut engine = engine_with(&params);

    let input = test_signal(BLOCK * 4, 9);
    let (left, right) = run(&mut engine, &input, &input);
    assert!(left.iter().chain(&right).all(|s| *s == 0.0));
    assert_eq!(engine.last_meter_frame().audible, [false; NUM_BANDS]);
}

#[test]
fn input_and_output_trim_cancel() {
    let params = transparent_params();
    params.set(ParamId::GainIn, 6.0_f32);
    params.set(ParamId::GainOut, -6.0_f32);
    let mut engine = engine_with(&params);

    let input = test_signal(BLOCK * 20, 13);
    let (out, _) = run(&mut engine, &input, &input);

    let reference = allpass_reference(&input, 400.0, 2000.0);
    let error = relative_error(&out, &reference);
    assert!(error < 1e-3, "net gain error {}", error);

    let frame = engine.last_meter_frame();
    assert!(frame.input_peak > frame.output_peak);
}

#[test]
fn crossover_changes_take_effect_between_blocks() {
    let params = transparent_params();
    params.set(ParamId::SoloLowBand, true);
    let mut engine = engine_with(&params);

    // 600 Hz sits above the default low-mid crossover
    let input = sine(600.0, 0.5, BLOCK * 40);
    let (before, _) = run(&mut engine, &input, &input);

    params.set(ParamId::LowMidCrossoverFreq, 999.0_f32);
    let (after, _) = run(&mut engine, &input, &input);

    assert!(rms(&after[BLOCK * 20..]) > 2.0 * rms(&before[BLOCK * 20..]));
    assert!(after.iter().all(|s| s.is_finite()));
}

#[test]
fn store_clamps_out_of_range_writes() {
    let params = ParameterStore::new();
    params.set(ParamId::MidHighCrossoverFreq, 50.0_f32);
    params.set(ParamId::AttackLowBand, 0.0_f32);
    params.set(ParamId::RatioHighBand, 100usize);
    params.set_normalized(ParamId::ReleaseMidBand, -3.0);

    assert_eq!(
        params.get(ParamId::MidHighCrossoverFreq),
        ParamValue::Float(1000.0)
    );
    assert_eq!(params.get(ParamId::AttackLowBand), ParamValue::Float(5.0));
    assert_eq!(params.get(ParamId::RatioHighBand), ParamValue::Choice(13));
    assert_eq!(params.get(ParamId::ReleaseMidBand), ParamValue::Float(5.0));

    let snapshot = params.snapshot();
    assert_eq!(snapshot.band(Band::High).compressor.ratio, 100.0);
    assert!(snapshot.low_mid_crossover_hz < snapshot.mid_high_crossover_hz);
}

#[test]
fn control_thread_writes_during_processing() {
    let params = Arc::new(ParameterStore::new());
    let mut engine = engine_with(&params);

    let writer = Arc::clone(&params);
    let control = std::thread::spawn(move || {
        for step in 0..500usize {
            writer.set_normalized(ParamId::LowMidCrossoverFreq, (step % 100) as f32 / 100.0);
            writer.set(ParamId::RatioMidBand, step % 14);
            writer.set(ParamId::SoloHighBand, step % 2 == 0);
        }
    });

    let input = test_signal(BLOCK * 200, 17);
    let (out, _) = run(&mut engine, &input, &input);
    control.join().unwrap();

    assert!(out.iter().all(|s| s.is_finite()));
}
