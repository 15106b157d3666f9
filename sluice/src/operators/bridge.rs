//! Flattens a stream of streams.

use crate::cancel::Done;
use crate::stream::Stream;
use crate::worker;

/// Relays every value of every inner stream, one inner stream at a time.
///
/// Inner streams are drained in the order `streams` yields them, each to its end before the
/// next is pulled, so the output is their concatenation. The output closes once `streams`
/// closes after its last inner stream, or as soon as `done` fires, abandoning the inner stream
/// in progress.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{bridge, from_sequence}};
///
/// let (_cancel, done) = cancel::channel();
/// let inner: Vec<_> = (0..3).map(|i| from_sequence(&done, vec![i * 10, i * 10 + 1])).collect();
/// let flat = bridge(&done, from_sequence(&done, inner));
/// assert_eq!(flat.collect_vec(), vec![0, 1, 10, 11, 20, 21]);
/// ```
pub fn bridge<T: Send + 'static>(done: &Done, streams: Stream<Stream<T>>) -> Stream<T> {
    let (outlet, flattened) = Stream::channel();
    worker::spawn(done, "bridge", outlet, move |outlet, done| {
        while let Some(stream) = streams.next_until(done)? {
            while let Some(value) = stream.next_until(done)? {
                outlet.deliver(value, done)?;
            }
        }
        Ok(())
    });
    flattened
}
