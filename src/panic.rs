//! Turning a caught panic into something loggable.
//!
//! Workers and scheduled-job loops wrap execution in
//! `AssertUnwindSafe(async { .. }).catch_unwind()`. On `Err(payload)` they call
//! [`Caught::new`] to extract the panic message and a bounded stack trace,
//! then log it and keep looping.
//!
//! By the time `catch_unwind` returns, the faulting frames are gone. The stack is
//! therefore captured by a panic hook ([`install_hook`]) while those frames are
//! still live, parked in a thread-local, and picked up by `Caught::new` on the
//! same thread. The hook chains to the previously installed one.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a unit uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic;
use std::sync::Once;

/// Upper bound for a captured stack trace, in bytes.
pub(crate) const STACK_LIMIT: usize = 64 << 10;

static HOOK: Once = Once::new();

thread_local! {
    static LAST_STACK: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

/// Installs the stack-capturing panic hook once per process.
pub(crate) fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let stack = Backtrace::force_capture();
            LAST_STACK.with(|slot| *slot.borrow_mut() = Some(stack));
            previous(info);
        }));
    });
}

/// A recovered panic: message plus bounded stack trace.
pub(crate) struct Caught {
    pub message: String,
    pub stack: String,
}

impl Caught {
    /// Extracts the payload message and takes the stack recorded at panic time.
    ///
    /// Falls back to the current stack if the hook recorded nothing.
    pub fn new(payload: &(dyn Any + Send)) -> Self {
        let recorded = LAST_STACK.with(|slot| slot.borrow_mut().take());
        let mut stack = recorded
            .unwrap_or_else(Backtrace::force_capture)
            .to_string();
        truncate_at_boundary(&mut stack, STACK_LIMIT);
        Self {
            message: message(payload),
            stack,
        }
    }
}

/// Extracts a human-readable message from a panic payload.
pub(crate) fn message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn truncate_at_boundary(s: &mut String, limit: usize) {
    if s.len() <= limit {
        return;
    }
    let mut cut = limit;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_str_and_string() {
        let p: Box<dyn Any + Send> = Box::new("static boom");
        assert_eq!(message(p.as_ref()), "static boom");

        let p: Box<dyn Any + Send> = Box::new(format!("boom {}", 7));
        assert_eq!(message(p.as_ref()), "boom 7");

        let p: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(message(p.as_ref()), "unknown panic");
    }

    #[test]
    fn test_stack_is_bounded() {
        let p: Box<dyn Any + Send> = Box::new("x");
        let caught = Caught::new(p.as_ref());
        assert!(caught.stack.len() <= STACK_LIMIT);
    }

    #[inline(never)]
    fn faulty_unit_body() {
        panic!("fault site")
    }

    #[tokio::test]
    async fn test_stack_points_at_fault_site() {
        use futures::FutureExt;
        use std::panic::AssertUnwindSafe;

        install_hook();
        let payload = AssertUnwindSafe(async { faulty_unit_body() })
            .catch_unwind()
            .await
            .expect_err("unit panicked");

        let caught = Caught::new(payload.as_ref());
        assert_eq!(caught.message, "fault site");
        assert!(
            caught.stack.contains("faulty_unit_body"),
            "stack does not include the panicking frame:\n{}",
            caught.stack
        );
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let mut s = "ééé".to_string();
        truncate_at_boundary(&mut s, 3);
        assert_eq!(s, "é");
    }
}
