//! Splits one stream into two.

use crossbeam_channel::Select;

use crate::cancel::Done;
use crate::stream::{Fault, Stream};
use crate::worker::{self, Halt};

/// Duplicates every value of `source` onto two output streams.
///
/// Each value is offered to both outputs independently, and the next value is read only once
/// both outputs have accepted the current one. Both outputs must therefore be read
/// concurrently: an output that is neither read nor dropped stalls the other until `done`
/// fires. An output whose readers have all been dropped is skipped from then on.
///
/// When `done` fires mid-delivery the value counts as not delivered to any output that has not
/// yet accepted it, and both outputs close. A failure upstream is raised on both outputs.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{from_sequence, tee}};
///
/// let (_cancel, done) = cancel::channel();
/// let (left, right) = tee(&done, from_sequence(&done, vec![1, 2, 3]));
/// let reader = std::thread::spawn(move || right.collect_vec());
/// assert_eq!(left.collect_vec(), vec![1, 2, 3]);
/// assert_eq!(reader.join().unwrap(), vec![1, 2, 3]);
/// ```
pub fn tee<T: Clone + Send + 'static>(done: &Done, source: Stream<T>) -> (Stream<T>, Stream<T>) {
    let fault = Fault::default();
    let (left, first) = Stream::with_fault(0, fault.clone());
    let (right, second) = Stream::with_fault(0, fault);

    worker::spawn(done, "tee", (left, right), move |(left, right), done| {
        let outlets = [left, right];
        let mut attached = [true, true];
        while let Some(value) = source.next_until(done)? {
            if done.is_done() {
                return Err(Halt::Cancelled);
            }
            let mut pending = attached;
            while pending.contains(&true) {
                // Offers come first, so an operation's index is its position in `offers`.
                let mut select = Select::new();
                let mut offers = Vec::with_capacity(outlets.len());
                for (branch, outlet) in outlets.iter().enumerate() {
                    if pending[branch] {
                        select.send(outlet.sender());
                        offers.push(branch);
                    }
                }
                select.recv(&done.signal);

                let operation = select.select();
                match offers.get(operation.index()).copied() {
                    Some(branch) => {
                        pending[branch] = false;
                        match operation.send(outlets[branch].sender(), value.clone()) {
                            Ok(()) => outlets[branch].tally(),
                            Err(_) => attached[branch] = false,
                        }
                    }
                    None => {
                        // Completes the receive; it only ever observes the disconnection.
                        let _ = operation.recv(&done.signal);
                        return Err(Halt::Cancelled);
                    }
                }
            }
            if !attached.contains(&true) {
                return Err(Halt::Detached);
            }
        }
        Ok(())
    });

    (first, second)
}
