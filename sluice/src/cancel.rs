//! Cancellation signals, and their first-to-fire merge.
//!
//! A signal is a channel that never carries a value: it fires by closing. The firing side is
//! a [`Canceller`], the observing side a [`Done`]. Both may be cloned freely; a signal fires
//! on the first call to [`Canceller::cancel`] or once every `Canceller` has been dropped, and
//! stays fired forever after.

use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{select, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::config::Config;
use crate::logging_core::Registry;
use crate::worker::{self, Context};

/// Nothing is ever sent along a signal.
pub(crate) enum Never { }

/// Creates a cancellation signal with the default configuration.
///
/// The signal fires on the first call to [`Canceller::cancel`], and also once every clone of
/// the `Canceller` has been dropped. Binding the canceller to `_` therefore cancels the
/// pipeline straight away; keep it in a named binding such as `_cancel` for as long as the
/// pipeline should run.
///
/// # Examples
/// ```
/// let (cancel, done) = sluice::cancel::channel();
/// assert!(!done.is_done());
/// cancel.cancel();
/// cancel.cancel();
/// assert!(done.is_done());
/// ```
#[must_use = "dropping the `Canceller` fires the signal"]
pub fn channel() -> (Canceller, Done) {
    channel_with(Config::default())
}

/// Creates a cancellation signal whose pipeline uses `config`.
///
/// As with [`channel`], dropping every `Canceller` fires the signal.
#[must_use = "dropping the `Canceller` fires the signal"]
pub fn channel_with(config: Config) -> (Canceller, Done) {
    signal_in(Arc::new(Context::new(config)))
}

/// Creates a signal that shares an existing pipeline context.
pub(crate) fn signal_in(context: Arc<Context>) -> (Canceller, Done) {
    let (sender, signal) = crossbeam_channel::bounded(0);
    let canceller = Canceller { sender: Arc::new(Mutex::new(Some(sender))) };
    (canceller, Done { signal, context })
}

/// Fires a cancellation signal.
///
/// The signal also fires once the last clone is dropped.
#[must_use = "dropping the last `Canceller` fires the signal"]
#[derive(Clone)]
pub struct Canceller {
    sender: Arc<Mutex<Option<Sender<Never>>>>,
}

impl Canceller {
    /// Fires the signal. Firing an already fired signal has no further effect.
    pub fn cancel(&self) {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let armed = self.sender.lock().map(|sender| sender.is_some()).unwrap_or(false);
        f.debug_struct("Canceller").field("armed", &armed).finish()
    }
}

/// Observes a cancellation signal.
///
/// Every combinator takes a `Done`, watches it, and hands it on to its workers. The pipeline
/// context (configuration, log registry) travels along with it.
#[derive(Clone)]
pub struct Done {
    pub(crate) signal: Receiver<Never>,
    context: Arc<Context>,
}

impl Done {
    /// A signal that never fires.
    ///
    /// Waiting on it blocks forever; use [`Done::wait_timeout`] or [`Done::is_done`] instead.
    pub fn inert() -> Done {
        Done {
            signal: crossbeam_channel::never(),
            context: Arc::new(Context::default()),
        }
    }

    /// Returns `true` once the signal has fired.
    pub fn is_done(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Blocks until the signal fires.
    pub fn wait(&self) {
        // Only ever returns with the disconnection.
        let _ = self.signal.recv();
    }

    /// Blocks until the signal fires or `timeout` elapses, returning `true` if it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(self.signal.recv_timeout(timeout), Err(RecvTimeoutError::Disconnected))
    }

    /// The configuration of the pipeline this signal belongs to.
    pub fn config(&self) -> &Config { self.context.config() }

    /// Provides access to the pipeline's named logging streams.
    pub fn log_register(&self) -> MutexGuard<'_, Registry> { self.context.log_register() }

    pub(crate) fn context(&self) -> &Arc<Context> { &self.context }
}

impl Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done").field("done", &self.is_done()).finish()
    }
}

/// Merges signals into one that fires as soon as any of them fires.
///
/// No signals yield an inert signal and a single signal is returned as is; neither spawns a
/// worker. Two signals are watched by one worker. Beyond that, a worker watches the first
/// three signals and the merge of the remainder, into which its own output is folded so that
/// the whole chain of workers unwinds once any of them fires.
///
/// The merged signal belongs to the pipeline of the first input.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// let (a, done_a) = sluice::cancel::channel();
/// let (_b, done_b) = sluice::cancel::channel();
/// let (_c, done_c) = sluice::cancel::channel();
///
/// let either = sluice::cancel::or(vec![done_a, done_b, done_c]);
/// assert!(!either.wait_timeout(Duration::from_millis(10)));
/// a.cancel();
/// either.wait();
/// ```
pub fn or<I: IntoIterator<Item = Done>>(signals: I) -> Done {
    let signals: Vec<Done> = signals.into_iter().collect();
    match signals.first() {
        Some(first) => or_in(Arc::clone(&first.context), signals),
        None => Done::inert(),
    }
}

/// Merges `signals`, running every worker of the chain in `context`.
fn or_in(context: Arc<Context>, mut signals: Vec<Done>) -> Done {
    if signals.len() < 2 {
        return signals.pop().unwrap_or_else(Done::inert);
    }

    let (canceller, output) = signal_in(context);
    let folded = output.clone();
    worker::spawn(&output, "or", canceller, move |_canceller, merged| {
        if signals.len() == 2 {
            select! {
                recv(signals[0].signal) -> _ => { },
                recv(signals[1].signal) -> _ => { },
            }
        }
        else {
            let remainder = signals.drain(3..).chain(Some(folded)).collect();
            let rest = or_in(Arc::clone(merged.context()), remainder);
            select! {
                recv(signals[0].signal) -> _ => { },
                recv(signals[1].signal) -> _ => { },
                recv(signals[2].signal) -> _ => { },
                recv(rest.signal) -> _ => { },
            }
        }
        Err(worker::Halt::Cancelled)
    });
    output
}
