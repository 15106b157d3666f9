//! Relays a stream until it closes or cancellation fires.

use crate::cancel::Done;
use crate::stream::Stream;
use crate::worker;

/// Relays every value of `source` until `source` closes or `done` fires.
///
/// Wraps a raw stream, perhaps fed by a producer that never looks at `done`, so that
/// iterating over it ends promptly on cancellation. A value in flight when `done` fires
/// is discarded.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::or_done, Stream};
///
/// let (cancel, done) = cancel::channel();
/// let (outlet, raw) = Stream::channel();
/// std::thread::spawn(move || while outlet.give(1) { });
///
/// let relayed = or_done(&done, raw);
/// assert_eq!(relayed.recv(), Some(1));
/// cancel.cancel();
/// assert!(relayed.iter().count() <= 1);
/// ```
pub fn or_done<T: Send + 'static>(done: &Done, source: Stream<T>) -> Stream<T> {
    let (outlet, stream) = Stream::channel();
    worker::spawn(done, "or_done", outlet, move |outlet, done| {
        while let Some(value) = source.next_until(done)? {
            outlet.deliver(value, done)?;
        }
        Ok(())
    });
    stream
}
