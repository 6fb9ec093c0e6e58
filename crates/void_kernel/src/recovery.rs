//! Panic containment
//!
//! A single misbehaving layer callback or dispatcher action must not take the
//! frame loop down. Callbacks run inside `catch_unwind`; the panic payload is
//! turned into a message for logs and health reporting.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run `f`, converting a panic into `Err(message)`
pub fn catch_panic<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce() -> R + panic::UnwindSafe,
{
    panic::catch_unwind(f).map_err(|payload| panic_message(payload.as_ref()))
}

/// Safe wrapper for closures borrowing mutable state
///
/// State touched by a panicking closure may be half-updated; callers only use
/// this where the state is per-frame scratch or tolerates partial writes.
pub fn catch_panic_mut<F, R>(mut f: F) -> Result<R, String>
where
    F: FnMut() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(|| f())).map_err(|payload| panic_message(payload.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_panic() {
        let result = catch_panic(|| 42);
        assert_eq!(result, Ok(42));

        let result: Result<i32, String> = catch_panic(|| {
            panic!("Test panic");
        });
        assert!(result.unwrap_err().contains("Test panic"));
    }

    #[test]
    fn test_catch_panic_mut_formats_message() {
        let mut counter = 0;
        let result: Result<(), String> = catch_panic_mut(|| {
            counter += 1;
            panic!("boom {}", counter);
        });
        assert_eq!(result, Err("boom 1".to_string()));
        assert_eq!(counter, 1);
    }
}
