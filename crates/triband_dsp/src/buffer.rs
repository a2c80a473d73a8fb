//! Planar Audio Buffers
//!
//! Fixed-capacity scratch buffers used between pipeline stages. Storage is
//! allocated once (at prepare time) and only the logical length changes per
//! block, so nothing on the audio thread ever reallocates.

use crate::error::DspError;
use crate::processor::MAX_CHANNELS;

/// Planar multi-channel buffer with a fixed capacity
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    channels: [Vec<f32>; MAX_CHANNELS],
    num_channels: usize,
    num_samples: usize,
}

impl AudioBuffer {
    /// Create a buffer with `num_channels` channels of `capacity` samples each
    ///
    /// Note: This allocates. Only call during setup, not in audio callback.
    pub fn with_capacity(num_channels: usize, capacity: usize) -> Self {
        let mut buffer = Self::default();
        buffer.allocate(num_channels, capacity);
        buffer
    }

    /// (Re)allocate storage. Contents are zeroed and the length is set to `capacity`.
    ///
    /// Note: This allocates. Only call during setup, not in audio callback.
    pub fn allocate(&mut self, num_channels: usize, capacity: usize) {
        let num_channels = num_channels.min(MAX_CHANNELS);
        for (ch, storage) in self.channels.iter_mut().enumerate() {
            *storage = if ch < num_channels {
                vec![0.0; capacity]
            } else {
                Vec::new()
            };
        }
        self.num_channels = num_channels;
        self.num_samples = capacity;
    }

    /// Set the logical block length without touching storage
    ///
    /// # Real-time Safety
    /// Never allocates; fails if the block does not fit.
    pub fn set_len(&mut self, num_samples: usize) -> Result<(), DspError> {
        let capacity = self.capacity();
        if num_samples > capacity {
            return Err(DspError::BufferSizeMismatch {
                capacity,
                requested: num_samples,
            });
        }
        self.num_samples = num_samples;
        Ok(())
    }

    /// Samples per channel that fit without reallocating
    pub fn capacity(&self) -> usize {
        if self.num_channels == 0 {
            0
        } else {
            self.channels[0].len()
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Current logical block length
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.channels[ch][..self.num_samples]
    }

    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        &mut self.channels[ch][..self.num_samples]
    }

    /// Zero the current block on every channel
    pub fn clear(&mut self) {
        for ch in 0..self.num_channels {
            self.channel_mut(ch).fill(0.0);
        }
    }

    /// Copy the layout-compatible contents of `other` and adopt its length
    ///
    /// Both buffers must have been allocated with the same channel count and
    /// `other.num_samples()` must fit in this buffer's capacity.
    pub fn copy_from(&mut self, other: &AudioBuffer) -> Result<(), DspError> {
        self.set_len(other.num_samples)?;
        for ch in 0..self.num_channels.min(other.num_channels) {
            self.channel_mut(ch).copy_from_slice(other.channel(ch));
        }
        Ok(())
    }

    /// Accumulate `other` into this buffer sample by sample
    pub fn add_from(&mut self, other: &AudioBuffer) {
        for ch in 0..self.num_channels.min(other.num_channels) {
            for (dst, src) in self.channel_mut(ch).iter_mut().zip(other.channel(ch)) {
                *dst += *src;
            }
        }
    }

    /// Largest absolute sample value across the current block
    pub fn peak(&self) -> f32 {
        (0..self.num_channels)
            .flat_map(|ch| self.channel(ch).iter())
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }

    /// Pointer to the storage of a channel; stable as long as no reallocation happens
    pub fn storage_ptr(&self, ch: usize) -> *const f32 {
        self.channels[ch].as_ptr()
    }
}
