//! Merges many streams into one.

use crate::cancel::Done;
use crate::stream::Stream;
use crate::worker;

/// Interleaves the values of all `sources` into one stream.
///
/// One worker relays each source into a shared output, in no particular order. The output
/// closes once every worker has finished, that is once all sources have closed or `done`
/// has fired. No sources yield a stream that is closed from the start.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{fan_in, from_sequence}};
///
/// let (_cancel, done) = cancel::channel();
/// let sources = vec![
///     from_sequence(&done, vec![1, 2]),
///     from_sequence(&done, vec![3]),
/// ];
/// let mut merged = fan_in(&done, sources).collect_vec();
/// merged.sort();
/// assert_eq!(merged, vec![1, 2, 3]);
/// ```
pub fn fan_in<T, I>(done: &Done, sources: I) -> Stream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Stream<T>>,
{
    let (outlet, multiplexed) = Stream::channel();
    for source in sources {
        // Each worker holds a clone of the outlet; the output closes with the last of them.
        worker::spawn(done, "fan_in", outlet.clone(), move |outlet, done| {
            while let Some(value) = source.next_until(done)? {
                outlet.deliver(value, done)?;
            }
            Ok(())
        });
    }
    multiplexed
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::thread;
    use std::time::Duration;

    use crate::cancel;
    use crate::operators::{from_sequence, repeat, take};
    use crate::stream::Stream;
    use super::fan_in;

    #[test]
    fn no_sources() {
        let (_cancel, done) = cancel::channel();
        assert!(fan_in(&done, Vec::<Stream<u8>>::new()).collect_vec().is_empty());
    }

    #[test]
    fn union_of_all_sources() {
        let (_cancel, done) = cancel::channel();
        let sources: Vec<_> = (0..8)
            .map(|i| from_sequence(&done, (0..i).map(move |j| (i, j))))
            .collect();

        let mut merged = fan_in(&done, sources).collect_vec();
        merged.sort();

        let mut expected: Vec<_> = (0..8).flat_map(|i| (0..i).map(move |j| (i, j))).collect();
        expected.sort();
        assert_eq!(merged, expected);
    }

    #[test]
    fn per_source_order_survives() {
        let (_cancel, done) = cancel::channel();
        let sources: Vec<_> = (0..4u32)
            .map(|i| from_sequence(&done, (0..50u32).map(move |j| (i, j))))
            .collect();

        let mut last = HashMap::new();
        for (source, index) in fan_in(&done, sources) {
            if let Some(previous) = last.insert(source, index) {
                assert!(previous < index);
            }
        }
        assert_eq!(last.len(), 4);
    }

    #[test]
    fn stays_open_while_any_source_is_open() {
        let (_cancel, done) = cancel::channel();
        let (outlet, slow) = Stream::channel();
        let merged = fan_in(&done, vec![from_sequence(&done, vec![1]), slow]);
        assert_eq!(merged.recv(), Some(1));

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            outlet.give(2);
        });
        assert_eq!(merged.recv(), Some(2));
        assert_eq!(merged.recv(), None);
    }

    #[test]
    fn cancellation_closes_endless_sources() {
        let (cancel, done) = cancel::channel();
        let sources = vec![repeat(&done, vec![0]), repeat(&done, vec![1]), repeat(&done, vec![2])];
        let merged = fan_in(&done, sources);
        assert_eq!(take(&done, merged.clone(), 10).collect_vec().len(), 10);
        cancel.cancel();
        // Each of the three workers may still hand over the value it holds.
        assert!(merged.iter().count() <= 3);
    }
}
