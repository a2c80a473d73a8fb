//! Solo / Mute Routing
//!
//! Decides which bands reach the output and sums them.
//!
//! - If any band is soloed, only soloed bands are heard (solo wins over mute).
//! - Otherwise every band that isn't muted is heard.
//!
//! Bypass is not a routing concern: a bypassed band is still summed, it just
//! skipped compression.

use crate::band::NUM_BANDS;
use crate::buffer::AudioBuffer;
use crate::error::DspError;

/// Solo/mute flags for one band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandRouting {
    pub mute: bool,
    pub solo: bool,
}

/// Stateless solo/mute policy and band summing
#[derive(Debug, Clone, Copy, Default)]
pub struct BandRouter;

impl BandRouter {
    pub fn new() -> Self {
        Self
    }

    /// Which bands contribute to the output under the solo/mute policy
    pub fn audible(routing: &[BandRouting; NUM_BANDS]) -> [bool; NUM_BANDS] {
        let any_solo = routing.iter().any(|r| r.solo);
        core::array::from_fn(|b| {
            if any_solo {
                routing[b].solo
            } else {
                !routing[b].mute
            }
        })
    }

    /// Silence excluded bands and sum the rest into `output`
    ///
    /// Excluded band buffers are zeroed rather than skipped so every
    /// pre-allocated buffer holds defined data after the call. `output`
    /// takes the length of the bands. Returns the audible mask.
    ///
    /// # Real-time Safety
    /// No allocations. O(n) where n = block size.
    pub fn mix(
        &self,
        bands: &mut [AudioBuffer; NUM_BANDS],
        routing: &[BandRouting; NUM_BANDS],
        output: &mut AudioBuffer,
    ) -> Result<[bool; NUM_BANDS], DspError> {
        let audible = Self::audible(routing);
        output.set_len(bands[0].num_samples())?;
        output.clear();

        for (band, heard) in bands.iter_mut().zip(audible) {
            if heard {
                output.add_from(band);
            } else {
                band.clear();
            }
        }
        Ok(audible)
    }
}
