//! Events describing the lifecycle of pipeline workers.

use serde::{Deserialize, Serialize};

/// Logger for sluice worker events.
pub type SluiceLogger = crate::logging_core::Logger<SluiceEvent>;

/// The name under which [`SluiceLogger`]s are registered.
pub const SLUICE_LOG: &str = "sluice";

/// Why a worker stopped.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ShutdownReason {
    /// The upstream source ran dry, or the worker had nothing further to produce.
    Exhausted,
    /// The cancellation signal fired.
    Cancelled,
    /// Every reader of the worker's output went away.
    Detached,
    /// The worker failed, and its output carries the failure downstream.
    Faulted,
}

#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
/// The start of a worker thread.
pub struct SpawnEvent {
    /// Pipeline-unique identifier for the worker.
    pub id: usize,
    /// The combinator the worker runs for.
    pub kind: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
/// The end of a worker thread.
pub struct ShutdownEvent {
    /// Pipeline-unique identifier for the worker, linkable to the identifier in `SpawnEvent`.
    pub id: usize,
    /// Number of values the worker handed downstream.
    pub delivered: usize,
    /// Why the worker stopped.
    pub reason: ShutdownReason,
}

/// An event in a sluice pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum SluiceEvent {
    /// A worker started.
    Spawn(SpawnEvent),
    /// A worker stopped.
    Shutdown(ShutdownEvent),
}

impl From<SpawnEvent> for SluiceEvent {
    fn from(v: SpawnEvent) -> SluiceEvent { SluiceEvent::Spawn(v) }
}

impl From<ShutdownEvent> for SluiceEvent {
    fn from(v: ShutdownEvent) -> SluiceEvent { SluiceEvent::Shutdown(v) }
}
