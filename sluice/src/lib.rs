//! Sluice composes pipelines of worker threads connected by channels.
//!
//! Each combinator takes a cancellation signal and one or more input streams, spawns the workers
//! that compute its output, and returns the output stream straight away. Iterating the output
//! blocks until values arrive. Pipelines wind down on their own once their sources run dry or
//! their readers go away, and promptly on cancellation.
//!
//! **Cancellation**: The [`cancel`] module creates signals, as a [`Canceller`] that fires and a
//! [`Done`] that observes, and merges several signals into one with [`cancel::or`].
//!
//! **Streams**: The [`stream`] module defines [`Stream`] and [`Outlet`], the reading and
//! writing halves of a channel. A failing worker closes its output with the failure attached,
//! and the reader that observes the closure panics with it.
//!
//! **Combinators**: The [`operators`] module builds streams from sequences and functions, and
//! relays, bounds, merges, splits, flattens, and converts them.
//!
//! **Logging**: Worker lifecycle events are reported through the [`logging_core`] registry that
//! travels with every `Done`, under the name [`logging::SLUICE_LOG`].
//!
//! # Examples
//!
//! The following finds some primes, spreading the work over four workers.
//!
//! ```
//! use sluice::cancel;
//! use sluice::operators::{fan_in, or_done, repeat_fn, take};
//!
//! fn is_prime(candidate: u64) -> bool {
//!     candidate > 1 && (2..candidate).take_while(|d| d * d <= candidate).all(|d| candidate % d != 0)
//! }
//!
//! let (cancel, done) = cancel::channel();
//!
//! // a shared source of candidates
//! let mut next = 0;
//! let candidates = repeat_fn(&done, move || { next += 1; next });
//!
//! // four finders read from it, and their findings are merged
//! let finders: Vec<_> = (0..4).map(|_| {
//!     let candidates = candidates.clone();
//!     let (outlet, primes) = sluice::Stream::channel();
//!     let done_inner = done.clone();
//!     std::thread::spawn(move || {
//!         for candidate in or_done(&done_inner, candidates) {
//!             if is_prime(candidate) && !outlet.give_until(candidate, &done_inner) {
//!                 break;
//!             }
//!         }
//!     });
//!     primes
//! }).collect();
//!
//! let primes = take(&done, fan_in(&done, finders), 10).collect_vec();
//! cancel.cancel();
//! assert_eq!(primes.len(), 10);
//! assert!(primes.iter().all(|&p| is_prime(p)));
//! ```
//!
//! Every combinator hands `done` on to its workers, so cancelling once stops the whole pipeline.

#![forbid(missing_docs)]

use std::any::Any;
use std::sync::Arc;

pub use cancel::{Canceller, Done};
pub use config::Config;
pub use error::{Error, Result};
pub use stream::{Outlet, Stream};

/// Re-export of the `sluice_logging` crate.
pub mod logging_core {
    pub use sluice_logging::*;
}

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod operators;
pub mod stream;

mod worker;

/// An untyped value, for streams whose elements differ in type.
///
/// Values are narrowed back to a concrete type with [`operators::extract`].
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wraps `data` as an untyped [`Value`].
///
/// # Examples
/// ```
/// let value = sluice::value(42u8);
/// assert_eq!(value.downcast_ref::<u8>(), Some(&42));
/// assert!(value.downcast_ref::<u16>().is_none());
/// ```
pub fn value<T: Any + Send + Sync>(data: T) -> Value {
    Arc::new(data)
}
