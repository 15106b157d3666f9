//! Caps the work in flight between a producer and its consumers.

use crate::cancel::Done;
use crate::error::{Error, Result};
use crate::stream::Stream;
use crate::worker;

/// The largest capacity [`buffer`] accepts. Channel slots are allocated up front.
pub const MAX_CAPACITY: usize = 1 << 20;

/// Relays `source` in order, holding at most `capacity` values read from it but not yet
/// handed to a reader.
///
/// One value sits with the relaying worker and the rest wait in a queue, so a fast producer
/// stalls once `capacity` values are outstanding. Values still held when `done` fires are
/// discarded.
///
/// # Errors
///
/// Returns [`Error::InvalidCapacity`] if `capacity` is zero or exceeds [`MAX_CAPACITY`],
/// without spawning a worker.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{buffer, from_sequence}};
///
/// let (_cancel, done) = cancel::channel();
/// let buffered = buffer(&done, from_sequence(&done, 0..5), 2).unwrap();
/// assert_eq!(buffered.collect_vec(), vec![0, 1, 2, 3, 4]);
/// assert!(buffer(&done, from_sequence(&done, 0..5), 0).is_err());
/// ```
pub fn buffer<T: Send + 'static>(done: &Done, source: Stream<T>, capacity: usize) -> Result<Stream<T>> {
    if capacity == 0 || capacity > MAX_CAPACITY {
        return Err(Error::InvalidCapacity(capacity));
    }
    let (outlet, buffered) = Stream::bounded(capacity - 1);
    worker::spawn(done, "buffer", outlet, move |outlet, done| {
        while let Some(value) = source.next_until(done)? {
            outlet.deliver(value, done)?;
        }
        Ok(())
    });
    Ok(buffered)
}
