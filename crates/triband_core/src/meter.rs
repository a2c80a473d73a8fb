//! Metering
//!
//! One `MeterFrame` per processed block travels from the audio thread to the
//! control thread over an rtrb SPSC ring. The audio side never blocks: when
//! the reader falls behind, frames are dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};
use triband_dsp::NUM_BANDS;

/// Levels of one processed block
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterFrame {
    /// Largest gain reduction per band during the block (dB, positive)
    pub gain_reduction_db: [f32; NUM_BANDS],
    /// Which bands reached the output under the solo/mute policy
    pub audible: [bool; NUM_BANDS],
    /// Peak after the input trim
    pub input_peak: f32,
    /// Peak after the output trim
    pub output_peak: f32,
}

/// Create a connected publisher/reader pair holding up to `capacity` frames
///
/// Note: This allocates. Only call during setup, not in audio callback.
pub fn meter_channel(capacity: usize) -> (MeterPublisher, MeterReader) {
    let (producer, consumer) = RingBuffer::<MeterFrame>::new(capacity.max(1));
    let total_dropped = Arc::new(AtomicU64::new(0));
    (
        MeterPublisher {
            producer,
            dropped: 0,
            total_dropped: Arc::clone(&total_dropped),
        },
        MeterReader {
            consumer,
            total_dropped,
        },
    )
}

/// Audio-thread end of the meter channel
pub struct MeterPublisher {
    producer: Producer<MeterFrame>,
    dropped: u64,
    total_dropped: Arc<AtomicU64>,
}

impl MeterPublisher {
    /// Push a frame without blocking; returns false if it was dropped
    #[inline]
    pub fn publish(&mut self, frame: MeterFrame) -> bool {
        if self.producer.push(frame).is_ok() {
            true
        } else {
            self.dropped += 1;
            self.total_dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Frames dropped since the last call
    pub fn take_dropped(&mut self) -> u64 {
        std::mem::take(&mut self.dropped)
    }

    /// True once the reader has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

/// Control-thread end of the meter channel
pub struct MeterReader {
    consumer: Consumer<MeterFrame>,
    total_dropped: Arc<AtomicU64>,
}

impl MeterReader {
    /// Oldest pending frame
    pub fn pop(&mut self) -> Option<MeterFrame> {
        self.consumer.pop().ok()
    }

    /// Drain everything pending and keep only the newest frame
    pub fn latest(&mut self) -> Option<MeterFrame> {
        let mut latest = None;
        while let Ok(frame) = self.consumer.pop() {
            latest = Some(frame);
        }
        latest
    }

    /// Frames waiting to be read
    pub fn available(&self) -> usize {
        self.consumer.slots()
    }

    /// Frames the audio thread dropped because this reader was full
    pub fn dropped_frames(&self) -> u64 {
        self.total_dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(peak: f32) -> MeterFrame {
        MeterFrame {
            input_peak: peak,
            output_peak: peak,
            ..Default::default()
        }
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let (mut publisher, mut reader) = meter_channel(4);
        assert!(publisher.publish(frame(0.1)));
        assert!(publisher.publish(frame(0.2)));
        assert_eq!(reader.available(), 2);
        assert_eq!(reader.pop().map(|f| f.input_peak), Some(0.1));
        assert_eq!(reader.pop().map(|f| f.input_peak), Some(0.2));
        assert_eq!(reader.pop(), None);
    }

    #[test]
    fn test_full_channel_drops_frames() {
        let (mut publisher, mut reader) = meter_channel(2);
        assert!(publisher.publish(frame(0.1)));
        assert!(publisher.publish(frame(0.2)));
        assert!(!publisher.publish(frame(0.3)));
        assert_eq!(reader.dropped_frames(), 1);
        assert_eq!(publisher.take_dropped(), 1);
        assert_eq!(publisher.take_dropped(), 0);

        assert_eq!(reader.latest().map(|f| f.input_peak), Some(0.2));
        assert_eq!(reader.available(), 0);

        // The reader keeps the running total after the publisher reports
        assert!(publisher.publish(frame(0.4)));
        assert!(publisher.publish(frame(0.5)));
        assert!(!publisher.publish(frame(0.6)));
        assert_eq!(reader.dropped_frames(), 2);
    }

    #[test]
    fn test_abandoned_reader() {
        let (publisher, reader) = meter_channel(1);
        assert!(!publisher.is_abandoned());
        drop(reader);
        assert!(publisher.is_abandoned());
    }
}
