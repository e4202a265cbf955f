//! # Audio Queue Module
//!
//! A fixed-capacity circular buffer of samples shared between the capture
//! callback (writer), the playback callback (reader) and the analysis worker
//! (read-only peeks of the newest window).
//!
//! One slot is always kept free so that `inpos == outpos` unambiguously means
//! "empty". All cursor state lives behind a single `parking_lot::Mutex`, so
//! every method takes `&self` and the queue is shared through an `Arc`.

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::Sample;

/// Default capacity used by the console frontend (about 3.8 minutes at 44.1 kHz).
pub const DEFAULT_QUEUE_LEN: usize = 10_000_000;

#[derive(Debug)]
struct QueueState {
    audio: Vec<Sample>,
    /// Index of the back of the queue (next slot to write).
    inpos: usize,
    /// Index of the front of the queue (next slot to read).
    outpos: usize,
    /// Samples ever written, saturating at the capacity.
    written: usize,
}

impl QueueState {
    fn len(&self) -> usize {
        self.audio.len()
    }

    fn pending(&self) -> usize {
        (self.inpos + self.len() - self.outpos) % self.len()
    }

    fn space_available(&self, n_samples: usize) -> bool {
        if self.inpos >= self.outpos {
            self.outpos + self.len() - self.inpos > n_samples
        } else {
            self.outpos - self.inpos > n_samples
        }
    }

    fn data_available(&self, n_samples: usize) -> bool {
        self.pending() >= n_samples
    }

    fn validate_space(&self, n_samples: usize) -> Result<()> {
        if self.space_available(n_samples) {
            Ok(())
        } else {
            log::debug!("Queue overflow: {} samples requested, {} pending.", n_samples, self.pending());
            Err(Error::Overflow {
                requested: n_samples,
                free: self.len() - 1 - self.pending(),
            })
        }
    }

    fn validate_data(&self, n_samples: usize) -> Result<()> {
        if self.data_available(n_samples) {
            Ok(())
        } else {
            log::debug!("Queue underflow: {} samples requested, {} pending.", n_samples, self.pending());
            Err(Error::Underflow {
                requested: n_samples,
                available: self.pending(),
            })
        }
    }

    fn copy_from(&self, start: usize, output: &mut [Sample], volume: f32) {
        let len = self.len();
        for (i, out) in output.iter_mut().enumerate() {
            *out = scale(self.audio[(start + i) % len], volume);
        }
    }
}

/// Applies a volume multiplier, saturating at the sample range.
#[inline]
fn scale(sample: Sample, volume: f32) -> Sample {
    (sample as f32 * volume) as Sample
}

/// Thread-safe circular sample buffer.
#[derive(Debug)]
pub struct AudioQueue {
    state: Mutex<QueueState>,
}

impl AudioQueue {
    /// Creates an empty queue holding at most `len - 1` unread samples.
    ///
    /// # Errors
    /// * `InvalidArgument` if `len` is zero
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            log::error!("Queue length must be greater than zero.");
            return Err(Error::invalid("queue length must be greater than zero"));
        }
        log::info!("AudioQueue created with length: {}", len);
        Ok(Self {
            state: Mutex::new(QueueState {
                audio: vec![0; len],
                inpos: 0,
                outpos: 0,
                written: 0,
            }),
        })
    }

    /// Total number of slots, including the reserved one.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Number of unread samples.
    pub fn pending(&self) -> usize {
        self.state.lock().pending()
    }

    /// True when there is nothing left to pop.
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Checks whether `n_samples` can be pushed without overflowing.
    pub fn space_available(&self, n_samples: usize) -> bool {
        self.state.lock().space_available(n_samples)
    }

    /// Checks whether `n_samples` unread samples are queued.
    pub fn data_available(&self, n_samples: usize) -> bool {
        self.state.lock().data_available(n_samples)
    }

    /// Pushes `input` scaled by `volume` at the back of the queue.
    ///
    /// # Errors
    /// * `Overflow` if fewer than `input.len() + 1` slots are free
    pub fn push(&self, input: &[Sample], volume: f32) -> Result<()> {
        let mut state = self.state.lock();
        state.validate_space(input.len())?;

        let len = state.len();
        let inpos = state.inpos;
        for (i, &sample) in input.iter().enumerate() {
            state.audio[(inpos + i) % len] = scale(sample, volume);
        }
        state.inpos = (inpos + input.len()) % len;
        state.written = (state.written + input.len()).min(len);
        Ok(())
    }

    /// Pops `output.len()` samples from the front of the queue.
    ///
    /// # Errors
    /// * `Underflow` if fewer than `output.len()` samples are unread
    pub fn pop(&self, output: &mut [Sample], volume: f32) -> Result<()> {
        let mut state = self.state.lock();
        state.validate_data(output.len())?;
        state.copy_from(state.outpos, output, volume);
        state.outpos = (state.outpos + output.len()) % state.len();
        Ok(())
    }

    /// Reads the samples `pop` would return, without consuming them.
    ///
    /// # Errors
    /// * `Underflow` if fewer than `output.len()` samples are unread
    pub fn peek(&self, output: &mut [Sample], volume: f32) -> Result<()> {
        let state = self.state.lock();
        state.validate_data(output.len())?;
        state.copy_from(state.outpos, output, volume);
        Ok(())
    }

    /// Reads the `output.len()` most recently pushed samples, oldest first.
    ///
    /// This ignores the read cursor entirely: samples that were already
    /// popped are still valid here until a later push overwrites them.
    ///
    /// # Errors
    /// * `Underflow` if fewer samples than requested were ever pushed
    pub fn peek_fresh(&self, output: &mut [Sample], volume: f32) -> Result<()> {
        let state = self.state.lock();
        let n_samples = output.len();
        if n_samples > state.written {
            return Err(Error::Underflow {
                requested: n_samples,
                available: state.written,
            });
        }
        let len = state.len();
        let start = (state.inpos + len - n_samples) % len;
        state.copy_from(start, output, volume);
        Ok(())
    }

    /// Advances the read cursor past up to `n_samples` unread samples.
    ///
    /// Returns how many were skipped. Used when nothing plays the queue back
    /// and the writer has to make room itself.
    pub fn discard(&self, n_samples: usize) -> usize {
        let mut state = self.state.lock();
        let skipped = n_samples.min(state.pending());
        state.outpos = (state.outpos + skipped) % state.len();
        skipped
    }

    /// Drops every queued sample and forgets the write history.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.inpos = 0;
        state.outpos = 0;
        state.written = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE_SIZE: usize = 1024;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(AudioQueue::new(0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn empty_queue_reports_space_but_no_data() {
        let queue = AudioQueue::new(QUEUE_SIZE).unwrap();
        assert!(queue.space_available(QUEUE_SIZE - 1));
        assert!(!queue.space_available(QUEUE_SIZE));
        assert!(!queue.data_available(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn push_overflow_after_half_fill() {
        let queue = AudioQueue::new(QUEUE_SIZE).unwrap();
        let input = vec![1; QUEUE_SIZE];
        queue.push(&input[..QUEUE_SIZE / 2], 1.0).unwrap();
        let err = queue.push(&input[..QUEUE_SIZE / 2 + 1], 1.0).unwrap_err();
        assert_eq!(
            err,
            Error::Overflow {
                requested: QUEUE_SIZE / 2 + 1,
                free: QUEUE_SIZE / 2 - 1
            }
        );
    }

    #[test]
    fn pushing_full_capacity_overflows() {
        let queue = AudioQueue::new(8).unwrap();
        assert!(queue.push(&[0; 8], 1.0).unwrap_err().is_capacity());
        queue.push(&[0; 7], 1.0).unwrap();
        assert_eq!(queue.pending(), 7);
    }

    #[test]
    fn pop_from_empty_underflows() {
        let queue = AudioQueue::new(QUEUE_SIZE).unwrap();
        let mut output = vec![0; QUEUE_SIZE / 2];
        assert!(matches!(
            queue.pop(&mut output, 1.0),
            Err(Error::Underflow { available: 0, .. })
        ));
    }

    #[test]
    fn peek_does_not_consume() {
        let queue = AudioQueue::new(16).unwrap();
        queue.push(&[1, 2, 3, 4], 1.0).unwrap();
        let mut out = [0; 3];
        queue.peek(&mut out, 1.0).unwrap();
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(queue.pending(), 4);
        queue.pop(&mut out, 1.0).unwrap();
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn volume_is_applied_on_both_sides() {
        let queue = AudioQueue::new(16).unwrap();
        queue.push(&[100, -100, 30000], 2.0).unwrap();
        let mut out = [0; 3];
        queue.pop(&mut out, 0.5).unwrap();
        // 30000 * 2 saturates at i16::MAX before the halving.
        assert_eq!(out, [100, -100, i16::MAX / 2]);
    }

    #[test]
    fn wraps_around_the_end() {
        let queue = AudioQueue::new(5).unwrap();
        let mut out = [0; 3];
        queue.push(&[1, 2, 3], 1.0).unwrap();
        queue.pop(&mut out, 1.0).unwrap();
        queue.push(&[4, 5, 6, 7], 1.0).unwrap();
        let mut out = [0; 4];
        queue.pop(&mut out, 1.0).unwrap();
        assert_eq!(out, [4, 5, 6, 7]);
        assert!(queue.is_empty());
    }

    #[test]
    fn fresh_peek_returns_newest_window_in_order() {
        let queue = AudioQueue::new(6).unwrap();
        queue.push(&[1, 2, 3, 4], 1.0).unwrap();
        let mut drain = [0; 4];
        queue.pop(&mut drain, 1.0).unwrap();
        queue.push(&[5, 6, 7], 1.0).unwrap();

        let mut out = [0; 5];
        queue.peek_fresh(&mut out, 1.0).unwrap();
        assert_eq!(out, [3, 4, 5, 6, 7]);
    }

    #[test]
    fn fresh_peek_survives_consumer_catching_up() {
        let queue = AudioQueue::new(32).unwrap();
        queue.push(&[9; 10], 1.0).unwrap();
        let mut drain = [0; 10];
        queue.pop(&mut drain, 1.0).unwrap();
        assert!(queue.is_empty());

        let mut out = [0; 8];
        queue.peek_fresh(&mut out, 1.0).unwrap();
        assert_eq!(out, [9; 8]);
        let mut too_many = [0; 11];
        assert!(queue.peek_fresh(&mut too_many, 1.0).is_err());
    }

    #[test]
    fn discard_skips_unread_but_keeps_fresh_window() {
        let queue = AudioQueue::new(8).unwrap();
        queue.push(&[1, 2, 3, 4, 5], 1.0).unwrap();
        assert_eq!(queue.discard(3), 3);
        assert_eq!(queue.pending(), 2);
        assert_eq!(queue.discard(usize::MAX), 2);
        assert!(queue.is_empty());

        let mut out = [0; 5];
        queue.peek_fresh(&mut out, 1.0).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn clear_resets_history() {
        let queue = AudioQueue::new(8).unwrap();
        queue.push(&[1, 2], 1.0).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.peek_fresh(&mut [0; 1], 1.0).is_err());
    }
}
