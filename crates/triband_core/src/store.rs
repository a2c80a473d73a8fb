//! Lock-free parameter store
//!
//! Written by the control thread, read by the audio thread. Each parameter
//! lives in its own `AtomicU32`:
//! - continuous values as `f32` bits (there's no `AtomicF32`)
//! - choices as their index
//! - switches as 0/1
//!
//! Parameters are independent of each other, so `Relaxed` ordering is enough.
//! A block may see a mix of old and new values when the UI writes mid-read;
//! every combination is valid.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;
use triband_dsp::{Band, BandRouting, CompressorSettings};

use crate::params::{ParamId, ParamKind, ParamValue, NUM_PARAMS, PARAM_SPECS};
use crate::snapshot::{BandSnapshot, EngineSnapshot};

fn encode(kind: &ParamKind, value: ParamValue) -> u32 {
    match kind.clamp(value) {
        ParamValue::Float(v) => v.to_bits(),
        ParamValue::Choice(i) => i as u32,
        ParamValue::Bool(b) => b as u32,
    }
}

fn decode(kind: &ParamKind, bits: u32) -> ParamValue {
    match kind {
        ParamKind::Continuous { .. } => ParamValue::Float(f32::from_bits(bits)),
        ParamKind::Choice { .. } => ParamValue::Choice(bits as usize),
        ParamKind::Bool { .. } => ParamValue::Bool(bits != 0),
    }
}

/// Current value of every parameter, shared as `Arc<ParameterStore>`
pub struct ParameterStore {
    values: [AtomicU32; NUM_PARAMS],
}

impl ParameterStore {
    /// Create a store holding every parameter's default
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| {
                let kind = &PARAM_SPECS[i].kind;
                AtomicU32::new(encode(kind, kind.default_value()))
            }),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> ParamValue {
        let bits = self.values[id.index()].load(Ordering::Relaxed);
        decode(&id.spec().kind, bits)
    }

    /// Store a value, clamped to the parameter's domain
    ///
    /// Out-of-range input is never an error.
    pub fn set(&self, id: ParamId, value: impl Into<ParamValue>) {
        let kind = id.spec().kind;
        let requested = value.into();
        let clamped = kind.clamp(requested);
        if clamped != requested {
            debug!(
                "Clamped {} from {:?} to {:?}",
                id.name(),
                requested,
                clamped
            );
        }
        self.values[id.index()].store(encode(&kind, clamped), Ordering::Relaxed);
    }

    /// Current value mapped to `[0, 1]`
    pub fn get_normalized(&self, id: ParamId) -> f32 {
        id.spec().kind.to_normalized(self.get(id))
    }

    /// Set from a host automation value in `[0, 1]`
    pub fn set_normalized(&self, id: ParamId, normalized: f32) {
        let value = id.spec().kind.from_normalized(normalized);
        self.set(id, value);
    }

    /// Current value as a display string (allocates)
    pub fn display(&self, id: ParamId) -> String {
        id.spec().kind.display(self.get(id))
    }

    pub fn reset_to_defaults(&self) {
        for (slot, spec) in self.values.iter().zip(PARAM_SPECS.iter()) {
            slot.store(
                encode(&spec.kind, spec.kind.default_value()),
                Ordering::Relaxed,
            );
        }
        debug!("Parameters reset to defaults");
    }

    fn float(&self, id: ParamId) -> f32 {
        self.get(id).as_f32()
    }

    fn switch(&self, id: ParamId) -> bool {
        self.get(id).as_bool()
    }

    fn ratio(&self, band: Band) -> f32 {
        let id = ParamId::ratio(band);
        id.spec()
            .kind
            .choice_value(self.get(id).as_choice())
            .unwrap_or(1.0)
    }

    /// Read every parameter once
    ///
    /// # Real-time Safety
    /// No allocations, no locks. Called once per block by the engine.
    pub fn snapshot(&self) -> EngineSnapshot {
        let bands = Band::ALL.map(|band| BandSnapshot {
            compressor: CompressorSettings {
                attack_ms: self.float(ParamId::attack(band)),
                release_ms: self.float(ParamId::release(band)),
                threshold_db: self.float(ParamId::threshold(band)),
                ratio: self.ratio(band),
                bypass: self.switch(ParamId::bypass(band)),
            },
            routing: BandRouting {
                mute: self.switch(ParamId::mute(band)),
                solo: self.switch(ParamId::solo(band)),
            },
        });

        EngineSnapshot {
            bands,
            low_mid_crossover_hz: self.float(ParamId::LowMidCrossoverFreq),
            mid_high_crossover_hz: self.float(ParamId::MidHighCrossoverFreq),
            gain_in_db: self.float(ParamId::GainIn),
            gain_out_db: self.float(ParamId::GainOut),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for id in ParamId::ALL {
            map.entry(&id.name(), &self.get(id));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_defaults() {
        let store = ParameterStore::new();
        assert_eq!(store.get(ParamId::LowMidCrossoverFreq), ParamValue::Float(400.0));
        assert_eq!(store.get(ParamId::MidHighCrossoverFreq), ParamValue::Float(2000.0));
        assert_eq!(store.get(ParamId::RatioHighBand), ParamValue::Choice(3));
        assert_eq!(store.get(ParamId::SoloLowBand), ParamValue::Bool(false));
        assert_eq!(store.snapshot(), EngineSnapshot::default());
    }

    #[test]
    fn test_set_clamps() {
        let store = ParameterStore::new();
        store.set(ParamId::ThresholdLowBand, -100.0_f32);
        assert_eq!(store.get(ParamId::ThresholdLowBand), ParamValue::Float(-60.0));

        store.set(ParamId::LowMidCrossoverFreq, 5000.0_f32);
        assert_eq!(store.get(ParamId::LowMidCrossoverFreq), ParamValue::Float(999.0));

        store.set(ParamId::RatioMidBand, 40usize);
        assert_eq!(store.get(ParamId::RatioMidBand), ParamValue::Choice(13));

        store.set(ParamId::GainOut, f32::INFINITY);
        assert_eq!(store.get(ParamId::GainOut), ParamValue::Float(0.0));
    }

    #[test]
    fn test_snapshot_reflects_writes() {
        let store = ParameterStore::new();
        store.set(ParamId::AttackMidBand, 10.0_f32);
        store.set(ParamId::RatioMidBand, 9usize);
        store.set(ParamId::BypassHighBand, true);
        store.set(ParamId::SoloLowBand, true);
        store.set(ParamId::GainIn, 6.0_f32);

        let snapshot = store.snapshot();
        let mid = snapshot.band(Band::Mid);
        assert_eq!(mid.compressor.attack_ms, 10.0);
        assert_eq!(mid.compressor.ratio, 10.0);
        assert!(snapshot.band(Band::High).compressor.bypass);
        assert!(snapshot.band(Band::Low).routing.solo);
        assert_eq!(snapshot.gain_in_db, 6.0);
    }

    #[test]
    fn test_normalized_access() {
        let store = ParameterStore::new();
        store.set_normalized(ParamId::GainIn, 1.0);
        assert_eq!(store.get(ParamId::GainIn), ParamValue::Float(24.0));
        assert_eq!(store.get_normalized(ParamId::GainIn), 1.0);

        store.set_normalized(ParamId::MuteMidBand, 0.7);
        assert_eq!(store.get(ParamId::MuteMidBand), ParamValue::Bool(true));
    }

    #[test]
    fn test_reset_to_defaults() {
        let store = ParameterStore::new();
        store.set(ParamId::ReleaseLowBand, 5.0_f32);
        store.set(ParamId::MuteHighBand, true);
        store.reset_to_defaults();
        assert_eq!(store.snapshot(), EngineSnapshot::default());
    }

    #[test]
    fn test_display() {
        let store = ParameterStore::new();
        assert_eq!(store.display(ParamId::RatioLowBand), "3:1");
        assert_eq!(store.display(ParamId::LowMidCrossoverFreq), "400 Hz");
    }

    #[test]
    fn test_shared_across_threads() {
        let store = Arc::new(ParameterStore::new());
        let writer = Arc::clone(&store);
        std::thread::spawn(move || writer.set(ParamId::ThresholdMidBand, -12.0_f32))
            .join()
            .unwrap();
        assert_eq!(store.get(ParamId::ThresholdMidBand), ParamValue::Float(-12.0));
    }
}
