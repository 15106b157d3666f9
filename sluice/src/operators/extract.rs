//! Narrows untyped values to one concrete type.

use std::any::{self, Any};
use std::sync::Arc;

use crate::cancel::Done;
use crate::error::Error;
use crate::stream::Stream;
use crate::worker::{self, Halt};
use crate::Value;

/// Converts each value of `source` to a `T`, in order.
///
/// A value of any other type is a fault: every value before it is delivered, and the reader
/// that reaches it panics with [`Error::TypeMismatch`] naming its position. Values shared with
/// other holders are cloned out, others are moved.
///
/// # Examples
/// ```
/// use sluice::{cancel, operators::{extract, from_sequence}, value};
///
/// let (_cancel, done) = cancel::channel();
/// let source = from_sequence(&done, vec![value(1u64), value(2u64)]);
/// assert_eq!(extract::<u64>(&done, source).collect_vec(), vec![1, 2]);
/// ```
///
/// ```should_panic
/// use sluice::{cancel, operators::{extract, from_sequence}, value};
///
/// let (_cancel, done) = cancel::channel();
/// let source = from_sequence(&done, vec![value(1u64), value("two")]);
/// extract::<u64>(&done, source).collect_vec();
/// ```
pub fn extract<T>(done: &Done, source: Stream<Value>) -> Stream<T>
where
    T: Any + Clone + Send + Sync,
{
    let (outlet, typed) = Stream::channel();
    worker::spawn(done, "extract", outlet, move |outlet, done| {
        let mut index = 0;
        while let Some(value) = source.next_until(done)? {
            let value = narrow::<T>(value).ok_or_else(|| {
                Halt::Faulted(Error::TypeMismatch { expected: any::type_name::<T>(), index })
            })?;
            outlet.deliver(value, done)?;
            index += 1;
        }
        Ok(())
    });
    typed
}

fn narrow<T: Any + Clone + Send + Sync>(value: Value) -> Option<T> {
    let value = value.downcast::<T>().ok()?;
    Some(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use crate::cancel;
    use crate::operators::from_sequence;
    use crate::{value, Value};
    use super::extract;

    #[test]
    fn homogeneous_values() {
        let (_cancel, done) = cancel::channel();
        let source = from_sequence(&done, vec![value(String::from("a")), value(String::from("b"))]);
        assert_eq!(extract::<String>(&done, source).collect_vec(), vec!["a", "b"]);
    }

    #[test]
    fn shared_values_are_cloned_out() {
        let (_cancel, done) = cancel::channel();
        let shared = value(vec![1, 2, 3]);
        let source = from_sequence(&done, vec![Value::clone(&shared)]);
        assert_eq!(extract::<Vec<i32>>(&done, source).collect_vec(), vec![vec![1, 2, 3]]);
        assert_eq!(shared.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn mismatch_after_a_typed_prefix() {
        let (_cancel, done) = cancel::channel();
        let source = from_sequence(&done, vec![value(1i64), value(2i64), value(3.5f64), value(4i64)]);
        let typed = extract::<i64>(&done, source);

        assert_eq!(typed.recv(), Some(1));
        assert_eq!(typed.recv(), Some(2));
        let failure = panic::catch_unwind(AssertUnwindSafe(|| typed.recv())).unwrap_err();
        let message = failure.downcast_ref::<String>().unwrap();
        assert!(message.contains("element 2"), "{}", message);
        assert!(message.contains("i64"), "{}", message);
    }

    #[test]
    fn numeric_types_do_not_coerce() {
        let (_cancel, done) = cancel::channel();
        let source = from_sequence(&done, vec![value(7u32)]);
        let typed = extract::<u64>(&done, source);
        assert!(panic::catch_unwind(AssertUnwindSafe(|| typed.recv())).is_err());
    }

    #[test]
    fn cancellation_is_not_a_fault() {
        let (cancel, done) = cancel::channel();
        cancel.cancel();
        let source = from_sequence(&done, vec![value(1u8)]);
        assert!(extract::<u8>(&done, source).collect_vec().is_empty());
    }
}
