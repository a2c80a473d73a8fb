//! Per-block parameter snapshot
//!
//! The engine reads the store exactly once per block into an
//! `EngineSnapshot` and only ever works from that copy.

use triband_dsp::{
    Band, BandRouting, CompressorSettings, DEFAULT_LOW_MID_HZ, DEFAULT_MID_HIGH_HZ, NUM_BANDS,
};

/// Settings of one band
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandSnapshot {
    pub compressor: CompressorSettings,
    pub routing: BandRouting,
}

/// Every value the pipeline needs for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSnapshot {
    pub bands: [BandSnapshot; NUM_BANDS],
    pub low_mid_crossover_hz: f32,
    pub mid_high_crossover_hz: f32,
    pub gain_in_db: f32,
    pub gain_out_db: f32,
}

impl EngineSnapshot {
    pub fn band(&self, band: Band) -> &BandSnapshot {
        &self.bands[band.index()]
    }

    /// Mute/solo flags of all bands, in band order
    pub fn routing(&self) -> [BandRouting; NUM_BANDS] {
        core::array::from_fn(|b| self.bands[b].routing)
    }
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            bands: [BandSnapshot::default(); NUM_BANDS],
            low_mid_crossover_hz: DEFAULT_LOW_MID_HZ,
            mid_high_crossover_hz: DEFAULT_MID_HIGH_HZ,
            gain_in_db: 0.0,
            gain_out_db: 0.0,
        }
    }
}
