//! Bounds a stream to its first few values.

use crate::cancel::Done;
use crate::stream::Stream;
use crate::worker;

/// Relays the first `count` values of `source`, then closes.
///
/// Never reads more than `count` values from `source`, which may be shared with other
/// readers. Closes early if `source` closes or `done` fires first.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{from_sequence, take}};
///
/// let (_cancel, done) = cancel::channel();
/// let source = from_sequence(&done, 0..10);
/// assert_eq!(take(&done, source.clone(), 3).collect_vec(), vec![0, 1, 2]);
/// assert_eq!(source.recv(), Some(3));
/// ```
pub fn take<T: Send + 'static>(done: &Done, source: Stream<T>, count: usize) -> Stream<T> {
    let (outlet, stream) = Stream::channel();
    worker::spawn(done, "take", outlet, move |outlet, done| {
        for _ in 0 .. count {
            match source.next_until(done)? {
                Some(value) => outlet.deliver(value, done)?,
                None => break,
            }
        }
        Ok(())
    });
    stream
}
