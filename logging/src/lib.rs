//! Simple sluice logging.
//!
//! Loggers buffer timestamped records and hand them in batches to an action closure.
//! Unlike a worker-local log, a sluice pipeline spans many threads, so a [`Logger`] is a
//! cheaply cloneable handle that may be moved into any of them.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Number of records a logger accumulates before handing them to its action.
pub const BUFFERING_LOGGER_CAPACITY: usize = 1024;

/// A registry binding names to typed loggers.
pub struct Registry {
    /// A map from names to typed loggers.
    map: HashMap<String, (Box<dyn Any + Send>, Box<dyn Flush + Send>)>,
    /// An instant common to all logging statements.
    time: Instant,
}

impl Registry {
    /// Binds a log name to an action on log event batches.
    ///
    /// This method also returns any pre-installed action, rather than overwriting it
    /// and pivoting the logging destination mid-stream. New loggers with this name will
    /// use the new destination, and existing loggers will use the old destination.
    ///
    /// The action should respond to a sequence of events with non-decreasing timestamps
    /// (Durations) and well as a timestamp that lower bounds the next event that could be
    /// seen (likely greater or equal to the timestamp of the last event). The end of a
    /// logging stream is indicated only by dropping the associated action, which can be
    /// accomplished with `remove` (or a call to insert, though this is not recommended).
    pub fn insert<T, F>(&mut self, name: &str, action: F) -> Option<Box<dyn Any + Send>>
    where
        T: Send + 'static,
        F: FnMut(&Duration, &mut Vec<(Duration, T)>) + Send + 'static,
    {
        let logger = Logger::<T>::new(self.time, action);
        self.insert_logger(name, logger)
    }

    /// Binds a log name to a logger.
    pub fn insert_logger<T: Send + 'static>(&mut self, name: &str, logger: Logger<T>) -> Option<Box<dyn Any + Send>> {
        self.map
            .insert(name.to_owned(), (Box::new(logger.clone()), Box::new(logger)))
            .map(|x| x.0)
    }

    /// Removes a bound logger.
    ///
    /// This is intended primarily to close a logging stream and let the associated writer
    /// communicate that the stream is closed to any consumers. If a binding is not removed,
    /// then the stream cannot be complete as in principle anyone could acquire a handle to
    /// the logger and start further logging.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Any + Send>> {
        self.map.remove(name).map(|x| x.0)
    }

    /// Retrieves a shared logger, if one has been inserted.
    pub fn get<T: Send + 'static>(&self, name: &str) -> Option<Logger<T>> {
        self.map
            .get(name)
            .and_then(|entry| entry.0.downcast_ref::<Logger<T>>())
            .cloned()
    }

    /// Creates a new logger registry.
    pub fn new(time: Instant) -> Self {
        Registry {
            time,
            map: HashMap::new(),
        }
    }

    /// Flushes all registered logs.
    pub fn flush(&mut self) {
        for entry in self.map.values_mut() {
            entry.1.flush();
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.flush();
    }
}

/// A buffering logger.
///
/// Clones share one buffer and one action. The action sees every buffered batch, and
/// one final empty batch once the last handle has been dropped.
pub struct Logger<T> {
    inner: Arc<Mutex<LoggerInner<T>>>,
}

impl<T> Clone for Logger<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct LoggerInner<T> {
    /// The instant at which all timestamps are measured from.
    time: Instant,
    /// Records not yet handed to the action.
    buffer: Vec<(Duration, T)>,
    /// Action to take on full log buffers.
    action: Box<dyn FnMut(&Duration, &mut Vec<(Duration, T)>) + Send>,
}

impl<T> Logger<T> {
    /// Allocates a new shareable logger bound to a write destination.
    pub fn new<F>(time: Instant, action: F) -> Self
    where
        F: FnMut(&Duration, &mut Vec<(Duration, T)>) + Send + 'static,
    {
        let inner = LoggerInner {
            time,
            buffer: Vec::with_capacity(BUFFERING_LOGGER_CAPACITY),
            action: Box::new(action),
        };
        Logger {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Logs an event.
    ///
    /// The event has its timestamp recorded at the moment of logging, but it may be delayed
    /// due to buffering. It will be written when the logger is next flushed, either due to
    /// the buffer reaching capacity or a direct call to flush.
    pub fn log<S: Into<T>>(&self, event: S) {
        self.log_many(Some(event));
    }

    /// Logs multiple events.
    ///
    /// All events in this call receive the same timestamp.
    pub fn log_many<I>(&self, events: I)
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = inner.time.elapsed();
        for event in events {
            inner.buffer.push((elapsed, event.into()));
            if inner.buffer.len() >= BUFFERING_LOGGER_CAPACITY {
                inner.flush();
            }
        }
    }

    /// Flushes logged messages and communicates the new minimal timestamp.
    pub fn flush(&self) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).flush();
    }
}

impl<T> LoggerInner<T> {
    fn flush(&mut self) {
        let elapsed = self.time.elapsed();
        if !self.buffer.is_empty() {
            (self.action)(&elapsed, &mut self.buffer);
            self.buffer.clear();
        }
    }
}

impl<T> Drop for LoggerInner<T> {
    fn drop(&mut self) {
        // Hand off any remaining records, then an empty batch to mark the end.
        self.flush();
        let elapsed = self.time.elapsed();
        (self.action)(&elapsed, &mut Vec::new());
    }
}

/// Types that can be flushed.
trait Flush {
    /// Flushes buffered data.
    fn flush(&mut self);
}

impl<T> Flush for Logger<T> {
    fn flush(&mut self) {
        Logger::flush(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use super::{Logger, Registry, BUFFERING_LOGGER_CAPACITY};

    #[test]
    fn flush_hands_off_buffered_records() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let logger = Logger::<usize>::new(Instant::now(), move |_time, data| {
            sink.lock().unwrap().extend(data.drain(..).map(|(_, x)| x));
        });

        logger.log(1usize);
        logger.log_many(vec![2usize, 3]);
        assert!(seen.lock().unwrap().is_empty());

        logger.flush();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn full_buffer_flushes_without_asking() {
        let batches = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&batches);
        let logger = Logger::<usize>::new(Instant::now(), move |_time, data| {
            if !data.is_empty() {
                *sink.lock().unwrap() += 1;
            }
        });

        logger.log_many(0..BUFFERING_LOGGER_CAPACITY);
        assert_eq!(*batches.lock().unwrap(), 1);
    }

    #[test]
    fn last_handle_closes_the_stream() {
        let closed = Arc::new(Mutex::new(false));
        let sink = Arc::clone(&closed);
        let logger = Logger::<&'static str>::new(Instant::now(), move |_time, data| {
            if data.is_empty() {
                *sink.lock().unwrap() = true;
            }
        });

        let clone = logger.clone();
        drop(logger);
        assert!(!*closed.lock().unwrap());
        clone.log("last words");
        drop(clone);
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn registry_hands_out_typed_loggers() {
        let mut registry = Registry::new(Instant::now());
        registry.insert::<u64, _>("numbers", |_time, data| data.clear());

        assert!(registry.get::<u64>("numbers").is_some());
        assert!(registry.get::<String>("numbers").is_none());
        assert!(registry.get::<u64>("letters").is_none());

        assert!(registry.remove("numbers").is_some());
        assert!(registry.get::<u64>("numbers").is_none());
    }

    #[test]
    fn registry_loggers_measure_from_its_start() {
        let start = Instant::now().checked_sub(Duration::from_secs(1)).unwrap_or_else(Instant::now);
        let offset = start.elapsed();
        let mut registry = Registry::new(start);
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&stamps);
        registry.insert::<u8, _>("bytes", move |_time, data| {
            sink.lock().unwrap().extend(data.drain(..).map(|(time, _)| time));
        });

        registry.get::<u8>("bytes").unwrap().log(7u8);
        registry.flush();
        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 1);
        assert!(stamps[0] >= offset);
    }
}
