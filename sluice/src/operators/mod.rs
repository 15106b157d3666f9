//! Combinators that build, relay, merge, split, and convert streams.
//!
//! Each combinator returns immediately, having spawned the workers that produce its output.
//! Every worker watches the supplied [`Done`](crate::Done) and stops promptly once it fires,
//! and stops on its own once nobody reads its output any more.

pub use self::generator::{from_sequence, repeat, repeat_fn};
pub use self::or_done::or_done;
pub use self::take::take;
pub use self::fan_in::fan_in;
pub use self::tee::tee;
pub use self::bridge::bridge;
pub use self::buffer::buffer;
pub use self::extract::extract;

pub mod generator;
pub mod or_done;
pub mod take;
pub mod fan_in;
pub mod tee;
pub mod bridge;
pub mod buffer;
pub mod extract;
