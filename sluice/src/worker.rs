//! Worker threads, and the pipeline context they share.
//!
//! Every combinator runs its logic on a worker spawned here. A worker owns a *writer*,
//! the sending half of its output, and the writer is dropped (closing the output) only
//! after the worker's outcome has been recorded. A reader that observes the closed
//! output therefore also observes any failure that caused it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::cancel::{Canceller, Done};
use crate::config::Config;
use crate::error::Error;
use crate::logging::{ShutdownEvent, ShutdownReason, SluiceEvent, SluiceLogger, SpawnEvent, SLUICE_LOG};
use crate::logging_core::Registry;
use crate::stream::{Failure, Outlet};

/// State shared by every signal and worker descended from one `cancel::channel_with` call.
pub(crate) struct Context {
    config: Config,
    registry: Mutex<Registry>,
    identifiers: AtomicUsize,
}

impl Context {
    pub(crate) fn new(config: Config) -> Self {
        let mut registry = Registry::new(Instant::now());
        if config.log_stderr {
            registry.insert::<SluiceEvent, _>(SLUICE_LOG, |_time, data| {
                for (elapsed, event) in data.drain(..) {
                    eprintln!("{:?}\t{:?}", elapsed, event);
                }
            });
        }
        Context {
            config,
            registry: Mutex::new(registry),
            identifiers: AtomicUsize::new(0),
        }
    }

    pub(crate) fn config(&self) -> &Config { &self.config }

    pub(crate) fn log_register(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn logging(&self) -> Option<SluiceLogger> {
        self.log_register().get(SLUICE_LOG)
    }

    fn new_identifier(&self) -> usize {
        self.identifiers.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Context {
    fn default() -> Self { Context::new(Config::default()) }
}

/// Why a worker stopped before running out of input.
pub(crate) enum Halt {
    /// The cancellation signal fired.
    Cancelled,
    /// Nobody reads the worker's output any more.
    Detached,
    /// The worker cannot continue; the error travels downstream.
    Faulted(Error),
}

/// The writing end a worker owns.
pub(crate) trait Writer: Clone + Send + 'static {
    /// Number of values handed downstream.
    fn delivered(&self) -> usize;
    /// Records a failure for the readers of the output.
    fn fail(&self, failure: Failure);
}

impl<T: Send + 'static> Writer for Outlet<T> {
    fn delivered(&self) -> usize { self.count() }
    fn fail(&self, failure: Failure) { self.fault().record(failure) }
}

/// Both outlets must share a single fault.
impl<A: Send + 'static, B: Send + 'static> Writer for (Outlet<A>, Outlet<B>) {
    fn delivered(&self) -> usize { self.0.count() + self.1.count() }
    fn fail(&self, failure: Failure) { self.0.fault().record(failure) }
}

impl Writer for Canceller {
    fn delivered(&self) -> usize { 0 }
    // A signal has no readers to report to; firing it is all that remains.
    fn fail(&self, _failure: Failure) { }
}

/// Runs `logic` on a new worker thread that owns `writer`.
///
/// The worker receives its own handle on `done`. Its outcome is logged and, if it failed,
/// recorded with the writer before the writer is dropped. If the thread cannot be spawned
/// the failure is recorded straight away, so readers see it in place of any data.
pub(crate) fn spawn<W, L>(done: &Done, kind: &'static str, writer: W, logic: L)
where
    W: Writer,
    L: FnOnce(&W, &Done) -> Result<(), Halt> + Send + 'static,
{
    let context = Arc::clone(done.context());
    let index = context.new_identifier();
    let builder = context.config().thread_builder(kind, index);
    let done = done.clone();
    let keep = writer.clone();

    let spawned = builder.spawn(move || {
        let logger = context.logging();
        if let Some(logger) = &logger {
            logger.log(SpawnEvent { id: index, kind: kind.to_owned() });
        }

        let reason = match panic::catch_unwind(AssertUnwindSafe(|| logic(&writer, &done))) {
            Ok(Ok(())) => ShutdownReason::Exhausted,
            Ok(Err(Halt::Cancelled)) => ShutdownReason::Cancelled,
            Ok(Err(Halt::Detached)) => ShutdownReason::Detached,
            Ok(Err(Halt::Faulted(error))) => {
                writer.fail(Failure::Error(error));
                ShutdownReason::Faulted
            }
            Err(payload) => {
                writer.fail(Failure::Panic(payload));
                ShutdownReason::Faulted
            }
        };

        if let Some(logger) = logger {
            logger.log(ShutdownEvent { id: index, delivered: writer.delivered(), reason });
        }
        drop(writer);
    });

    if let Err(error) = spawned {
        keep.fail(Failure::Error(Error::Spawn(error)));
    }
}
