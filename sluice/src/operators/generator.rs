//! Sources: streams produced from sequences, repeated values, and functions.

use crate::cancel::Done;
use crate::stream::Stream;
use crate::worker;

/// Emits each of `items` once, in order, then closes.
///
/// The items are queued up front, so the worker never waits on a slow reader.
/// Heterogeneous sequences use [`Value`](crate::Value) items.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::from_sequence};
///
/// let (_cancel, done) = cancel::channel();
/// let stream = from_sequence(&done, vec![0.1, 0.2, 0.3]);
/// assert_eq!(stream.collect_vec(), vec![0.1, 0.2, 0.3]);
/// ```
pub fn from_sequence<T, I>(done: &Done, items: I) -> Stream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
{
    let items: Vec<T> = items.into_iter().collect();
    let (outlet, stream) = Stream::bounded(items.len());
    worker::spawn(done, "from_sequence", outlet, move |outlet, done| {
        for item in items {
            outlet.deliver(item, done)?;
        }
        Ok(())
    });
    stream
}

/// Emits `values` round-robin until cancelled.
///
/// An empty list closes the stream without emitting anything.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{repeat, take}};
///
/// let (_cancel, done) = cancel::channel();
/// let stream = take(&done, repeat(&done, vec![1, 2]), 5);
/// assert_eq!(stream.collect_vec(), vec![1, 2, 1, 2, 1]);
/// ```
pub fn repeat<T: Clone + Send + 'static>(done: &Done, values: Vec<T>) -> Stream<T> {
    let (outlet, stream) = Stream::channel();
    worker::spawn(done, "repeat", outlet, move |outlet, done| {
        for value in values.iter().cycle() {
            outlet.deliver(value.clone(), done)?;
        }
        Ok(())
    });
    stream
}

/// Emits the result of a fresh call to `logic` for each element, until cancelled.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{repeat_fn, take}};
///
/// let (_cancel, done) = cancel::channel();
/// let mut counter = 0;
/// let squares = repeat_fn(&done, move || { counter += 1; counter * counter });
/// assert_eq!(take(&done, squares, 4).collect_vec(), vec![1, 4, 9, 16]);
/// ```
pub fn repeat_fn<T, F>(done: &Done, mut logic: F) -> Stream<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let (outlet, stream) = Stream::channel();
    worker::spawn(done, "repeat_fn", outlet, move |outlet, done| {
        loop {
            outlet.deliver(logic(), done)?;
        }
    });
    stream
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rand::Rng;

    use crate::cancel;
    use crate::operators::take;
    use crate::{value, Value};
    use super::{from_sequence, repeat, repeat_fn};

    #[test]
    fn sequence_in_order_then_closed() {
        let (_cancel, done) = cancel::channel();
        let names = vec!["tom", "dick", "harry"];
        assert_eq!(from_sequence(&done, names.clone()).collect_vec(), names);
    }

    #[test]
    fn empty_sequence_closes() {
        let (_cancel, done) = cancel::channel();
        assert!(from_sequence(&done, Vec::<u8>::new()).collect_vec().is_empty());
    }

    #[test]
    fn heterogeneous_sequence() {
        let (_cancel, done) = cancel::channel();
        let values: Vec<Value> = vec![value(1u8), value("two"), value(3.0f64)];
        let received = from_sequence(&done, values).collect_vec();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0].downcast_ref::<u8>(), Some(&1));
        assert_eq!(received[1].downcast_ref::<&str>(), Some(&"two"));
        assert_eq!(received[2].downcast_ref::<f64>(), Some(&3.0));
    }

    #[test]
    fn cancelled_sequence_emits_nothing_further() {
        let (cancel, done) = cancel::channel();
        cancel.cancel();
        assert!(from_sequence(&done, 0..1000).collect_vec().is_empty());
    }

    #[test]
    fn empty_repeat_closes() {
        let (_cancel, done) = cancel::channel();
        assert!(repeat(&done, Vec::<u8>::new()).collect_vec().is_empty());
    }

    #[test]
    fn repeat_stops_on_cancellation() {
        let (cancel, done) = cancel::channel();
        let stream = repeat(&done, vec!['a', 'b', 'c']);
        assert_eq!(stream.recv(), Some('a'));
        assert_eq!(stream.recv(), Some('b'));
        assert_eq!(stream.recv(), Some('c'));
        assert_eq!(stream.recv(), Some('a'));
        cancel.cancel();
        // At most the value already in hand may still arrive.
        assert!(stream.iter().count() <= 1);
    }

    #[test]
    fn repeat_fn_calls_once_per_element() {
        let (cancel, done) = cancel::channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let stream = repeat_fn(&done, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            rand::thread_rng().gen_range(0..50_000_000u64)
        });
        let taken = take(&done, stream, 10).collect_vec();
        assert_eq!(taken.len(), 10);
        cancel.cancel();
        // Ten delivered, plus at most one produced and abandoned.
        let calls = calls.load(Ordering::SeqCst);
        assert!((10..=12).contains(&calls), "{} calls", calls);
    }
}
