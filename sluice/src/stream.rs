//! Streams, the unidirectional channels that connect workers.
//!
//! A [`Stream`] is the reading half and an [`Outlet`] the writing half of one channel. The
//! channel closes once every outlet has been dropped, and readers treat closure as the end of
//! the sequence. If the writer failed, the first read that observes the closure re-raises the
//! failure on the reading thread, so faults flow downstream to whoever consumes the output.

use std::any::Any;
use std::cell::Cell;
use std::fmt::{self, Debug};
use std::panic;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{select, Receiver, Sender};

use crate::cancel::Done;
use crate::error::Error;
use crate::worker::Halt;

/// Why a writer stopped short.
pub(crate) enum Failure {
    /// A failure the writer detected and described.
    Error(Error),
    /// The payload of a panic on the writer's thread.
    Panic(Box<dyn Any + Send>),
}

impl Failure {
    fn raise(self) -> ! {
        match self {
            Failure::Error(error) => panic!("{}", error),
            Failure::Panic(payload) => panic::resume_unwind(payload),
        }
    }
}

#[derive(Default)]
enum FaultState {
    #[default]
    Clear,
    Failed(Failure),
    Raised,
}

/// A failure slot shared by the writers and readers of a channel.
#[derive(Clone, Default)]
pub(crate) struct Fault {
    state: Arc<Mutex<FaultState>>,
}

impl Fault {
    fn lock(&self) -> MutexGuard<'_, FaultState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `failure`, unless an earlier one was recorded.
    pub(crate) fn record(&self, failure: Failure) {
        let mut state = self.lock();
        if let FaultState::Clear = *state {
            *state = FaultState::Failed(failure);
        }
    }

    /// Re-raises a recorded failure on the calling thread.
    ///
    /// The first caller receives the original failure, later callers a generic one.
    fn raise(&self) {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, FaultState::Raised) {
            FaultState::Clear => *state = FaultState::Clear,
            FaultState::Raised => {
                drop(state);
                panic!("an upstream worker failed");
            }
            FaultState::Failed(failure) => {
                drop(state);
                failure.raise();
            }
        }
    }
}

/// The reading half of a channel.
///
/// Clones read from the same channel, each value going to exactly one of them.
pub struct Stream<T> {
    receiver: Receiver<T>,
    fault: Fault,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            receiver: self.receiver.clone(),
            fault: self.fault.clone(),
        }
    }
}

impl<T> Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").field("queued", &self.receiver.len()).finish()
    }
}

impl<T> Stream<T> {
    /// Allocates an unbuffered channel: each value is handed directly from writer to reader.
    ///
    /// # Examples
    /// ```
    /// use sluice::Stream;
    ///
    /// let (outlet, stream) = Stream::channel();
    /// std::thread::spawn(move || {
    ///     for word in ["tom", "dick", "harry"] {
    ///         outlet.give(word);
    ///     }
    /// });
    /// assert_eq!(stream.collect_vec(), vec!["tom", "dick", "harry"]);
    /// ```
    pub fn channel() -> (Outlet<T>, Stream<T>) {
        Stream::bounded(0)
    }

    /// Allocates a channel that queues up to `capacity` values.
    pub fn bounded(capacity: usize) -> (Outlet<T>, Stream<T>) {
        Stream::with_fault(capacity, Fault::default())
    }

    /// Allocates a channel that reports failures through `fault`.
    pub(crate) fn with_fault(capacity: usize, fault: Fault) -> (Outlet<T>, Stream<T>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        let outlet = Outlet {
            sender,
            fault: fault.clone(),
            delivered: Cell::new(0),
        };
        (outlet, Stream { receiver, fault })
    }

    /// Blocks until the next value arrives, or returns `None` once the stream has closed.
    ///
    /// # Panics
    ///
    /// Panics with the writer's failure if the writer closed the stream by failing.
    pub fn recv(&self) -> Option<T> {
        match self.receiver.recv() {
            Ok(value) => Some(value),
            Err(_) => {
                self.fault.raise();
                None
            }
        }
    }

    /// Like [`Stream::recv`], but gives up with `None` as soon as `done` fires.
    ///
    /// # Panics
    ///
    /// Panics with the writer's failure if the writer closed the stream by failing.
    pub fn recv_until(&self, done: &Done) -> Option<T> {
        self.next_until(done).ok().flatten()
    }

    /// The next value, `Ok(None)` once the stream has closed, or an error once `done` fires.
    pub(crate) fn next_until(&self, done: &Done) -> Result<Option<T>, Halt> {
        select! {
            recv(self.receiver) -> value => match value {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    self.fault.raise();
                    Ok(None)
                }
            },
            recv(done.signal) -> _ => Err(Halt::Cancelled),
        }
    }

    /// The number of values queued in the channel, always zero for unbuffered channels.
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    /// A blocking iterator over the values of the stream.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { stream: self }
    }

    /// Drains the stream into a vector, blocking until the stream closes.
    pub fn collect_vec(self) -> Vec<T> {
        self.into_iter().collect()
    }
}

/// A blocking iterator over a borrowed [`Stream`].
pub struct Iter<'a, T> {
    stream: &'a Stream<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;
    fn next(&mut self) -> Option<T> { self.stream.recv() }
}

/// A blocking iterator over an owned [`Stream`].
pub struct IntoIter<T> {
    stream: Stream<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    fn next(&mut self) -> Option<T> { self.stream.recv() }
}

impl<T> IntoIterator for Stream<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> IntoIter<T> { IntoIter { stream: self } }
}

impl<'a, T> IntoIterator for &'a Stream<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Iter<'a, T> { self.iter() }
}

/// The writing half of a channel.
///
/// The channel closes once every clone of its outlet has been dropped.
pub struct Outlet<T> {
    sender: Sender<T>,
    fault: Fault,
    delivered: Cell<usize>,
}

impl<T> Clone for Outlet<T> {
    fn clone(&self) -> Self {
        Outlet {
            sender: self.sender.clone(),
            fault: self.fault.clone(),
            delivered: Cell::new(0),
        }
    }
}

impl<T> Debug for Outlet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outlet").field("delivered", &self.delivered.get()).finish()
    }
}

impl<T> Outlet<T> {
    /// Blocks until a reader accepts `value`, returning `false` if every reader has gone.
    pub fn give(&self, value: T) -> bool {
        let sent = self.sender.send(value).is_ok();
        if sent {
            self.tally();
        }
        sent
    }

    /// Like [`Outlet::give`], but abandons `value` and returns `false` once `done` fires.
    pub fn give_until(&self, value: T, done: &Done) -> bool {
        self.deliver(value, done).is_ok()
    }

    /// Hands `value` to a reader unless `done` fires first.
    ///
    /// A signal that has already fired wins outright, even if a reader is waiting.
    pub(crate) fn deliver(&self, value: T, done: &Done) -> Result<(), Halt> {
        if done.is_done() {
            return Err(Halt::Cancelled);
        }
        select! {
            send(self.sender, value) -> sent => match sent {
                Ok(()) => {
                    self.tally();
                    Ok(())
                }
                Err(_) => Err(Halt::Detached),
            },
            recv(done.signal) -> _ => Err(Halt::Cancelled),
        }
    }

    pub(crate) fn sender(&self) -> &Sender<T> { &self.sender }
    pub(crate) fn fault(&self) -> &Fault { &self.fault }

    /// Counts one more delivered value.
    pub(crate) fn tally(&self) { self.delivered.set(self.delivered.get() + 1) }
    pub(crate) fn count(&self) -> usize { self.delivered.get() }
}
