use std::ops::Range;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{LockstepError, Result};

/// Play and write cursor positions, in bytes from the start of the ring
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorSnapshot {
    /// Next byte the output callback will read
    pub play_cursor: usize,
    /// Estimated end of valid data
    ///
    /// The device never reports how far playback has really progressed, so
    /// this is advanced by exactly what the callback consumes. It is an
    /// approximation, not a measurement.
    pub write_cursor: usize,
}

/// Fixed-capacity byte ring shared between the frame loop and the output callback
///
/// Holds interleaved stereo 16-bit samples. The producer (frame loop) writes
/// at offsets of its choosing, the consumer (device callback) drains from
/// the play cursor. Addressing wraps modulo the capacity, so every copy is at
/// most two contiguous regions: `offset..capacity` and `0..remainder`.
///
/// The cursor pair lives behind a mutex that plays the role of the device
/// lock. The consumer holds it for the whole drain; the producer holds it
/// only long enough to copy the two integers out. Sample bytes are relaxed
/// atomics, so the producer writes them without taking the lock. A producer
/// that falls behind its look-ahead yields stale audio, never undefined
/// behavior.
pub struct SampleRing {
    data: Box<[AtomicU8]>,
    cursors: Mutex<CursorSnapshot>,
}

impl SampleRing {
    /// Create a zero-filled ring of `capacity` bytes
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        let data = (0..capacity).map(|_| AtomicU8::new(0)).collect();
        Self {
            data,
            cursors: Mutex::new(CursorSnapshot::default()),
        }
    }

    /// Create a ring sized for one second of audio
    pub fn one_second(samples_per_second: u32, bytes_per_sample: usize) -> Self {
        Self::new(samples_per_second as usize * bytes_per_sample)
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Read both cursors under the lock, releasing it immediately
    pub fn cursors(&self) -> CursorSnapshot {
        *self.lock()
    }

    /// Copy `bytes` into the ring starting at `byte_offset` (taken modulo capacity)
    ///
    /// Does not take the cursor lock. The caller is expected to address a
    /// region far enough ahead of the play cursor that the callback is not
    /// draining it at the same time.
    pub fn write(&self, byte_offset: usize, bytes: &[u8]) -> Result<()> {
        let capacity = self.capacity();
        if bytes.len() > capacity {
            return Err(LockstepError::BufferOverflow {
                len: bytes.len(),
                capacity,
            });
        }

        let (first, second) = split_regions(byte_offset % capacity, bytes.len(), capacity);
        let (head, tail) = bytes.split_at(first.len());
        store(&self.data[first], head);
        store(&self.data[second], tail);
        Ok(())
    }

    /// Drain `dest.len()` bytes starting at the play cursor
    ///
    /// Called from the output callback. Never waits on the producer: whatever
    /// bytes are resident get played, stale or not. Both cursors advance by
    /// the amount consumed.
    pub fn consume(&self, dest: &mut [u8]) -> usize {
        let capacity = self.capacity();
        let mut cursors = self.lock();

        // A request larger than the ring replays it whole; each pass is
        // still a two-region copy.
        let mut cursor = cursors.play_cursor;
        for chunk in dest.chunks_mut(capacity) {
            let (first, second) = split_regions(cursor, chunk.len(), capacity);
            let (head, tail) = chunk.split_at_mut(first.len());
            load(&self.data[first], head);
            load(&self.data[second], tail);
            cursor = (cursor + chunk.len()) % capacity;
        }

        let advance = dest.len() % capacity;
        cursors.play_cursor = (cursors.play_cursor + advance) % capacity;
        cursors.write_cursor = (cursors.write_cursor + advance) % capacity;
        dest.len()
    }

    /// Zero every byte and rewind both cursors
    pub fn clear(&self) {
        let mut cursors = self.lock();
        for byte in self.data.iter() {
            byte.store(0, Ordering::Relaxed);
        }
        *cursors = CursorSnapshot::default();
    }

    fn lock(&self) -> MutexGuard<'_, CursorSnapshot> {
        // The guarded data is two integers that are always left consistent,
        // so a panic elsewhere while holding the lock does not invalidate it.
        self.cursors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Split `len` bytes starting at `offset` into the pre-wrap and post-wrap regions
fn split_regions(offset: usize, len: usize, capacity: usize) -> (Range<usize>, Range<usize>) {
    debug_assert!(offset < capacity && len <= capacity);
    let first_len = len.min(capacity - offset);
    (offset..offset + first_len, 0..len - first_len)
}

fn store(dst: &[AtomicU8], src: &[u8]) {
    for (slot, &byte) in dst.iter().zip(src) {
        slot.store(byte, Ordering::Relaxed);
    }
}

fn load(src: &[AtomicU8], dst: &mut [u8]) {
    for (byte, slot) in dst.iter_mut().zip(src) {
        *byte = slot.load(Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_regions_without_wrap() {
        let (first, second) = split_regions(10, 20, 100);
        assert_eq!(first, 10..30);
        assert!(second.is_empty());
    }

    #[test]
    fn test_split_regions_across_end() {
        let (first, second) = split_regions(90, 20, 100);
        assert_eq!(first, 90..100);
        assert_eq!(second, 0..10);
    }

    #[test]
    fn test_write_wraps_into_start() {
        let ring = SampleRing::new(8);
        ring.write(6, &[1, 2, 3, 4]).unwrap();

        let mut out = [0u8; 8];
        ring.consume(&mut out);
        assert_eq!(out, [3, 4, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_write_offset_taken_modulo_capacity() {
        let ring = SampleRing::new(8);
        ring.write(8 + 2, &[9]).unwrap();

        let mut out = [0u8; 3];
        ring.consume(&mut out);
        assert_eq!(out, [0, 0, 9]);
    }

    #[test]
    fn test_write_longer_than_capacity_rejected() {
        let ring = SampleRing::new(4);
        let result = ring.write(0, &[0; 5]);
        assert!(matches!(
            result,
            Err(LockstepError::BufferOverflow {
                len: 5,
                capacity: 4
            })
        ));
    }

    #[test]
    fn test_consume_advances_both_cursors() {
        let ring = SampleRing::new(16);
        let mut out = [0u8; 12];
        ring.consume(&mut out);
        ring.consume(&mut out);

        let cursors = ring.cursors();
        assert_eq!(cursors.play_cursor, 8);
        assert_eq!(cursors.write_cursor, 8);
    }

    #[test]
    fn test_consume_larger_than_capacity_replays_ring() {
        let ring = SampleRing::new(4);
        ring.write(0, &[1, 2, 3, 4]).unwrap();

        let mut out = [0u8; 10];
        assert_eq!(ring.consume(&mut out), 10);
        assert_eq!(out, [1, 2, 3, 4, 1, 2, 3, 4, 1, 2]);
        assert_eq!(ring.cursors().play_cursor, 2);
    }

    #[test]
    fn test_clear_resets_cursors_and_data() {
        let ring = SampleRing::new(8);
        ring.write(0, &[7; 8]).unwrap();
        let mut out = [0u8; 3];
        ring.consume(&mut out);

        ring.clear();
        assert_eq!(ring.cursors(), CursorSnapshot::default());

        let mut out = [1u8; 8];
        ring.consume(&mut out);
        assert_eq!(out, [0; 8]);
    }
}
