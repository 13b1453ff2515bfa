//! Off-thread invocation for functions flagged `invoke_async`.
//!
//! Each call runs on its own named thread; the outcome is posted to a
//! shared slot that the graph polls on its next heartbeat. Widget state is
//! only ever touched by the thread owning the graph.

use std::sync::Arc;
use std::thread;

use fiatlight_core::FiatValue;
use parking_lot::Mutex;
use tracing::warn;

use crate::callable::{DynCallable, FunctionFailure, call_catching};

/// The outcome of a call: a value or a captured failure.
pub type Outcome = Result<FiatValue, FunctionFailure>;

/// A call running on a worker thread.
#[derive(Debug)]
pub struct AsyncInvocation {
    slot: Arc<Mutex<Option<Outcome>>>,
}

impl AsyncInvocation {
    /// Starts `callable(args)` on a worker thread named after `function`.
    ///
    /// If the thread cannot be spawned the call runs synchronously and the
    /// invocation is already finished when returned.
    pub fn spawn(function: &str, callable: DynCallable, args: Vec<FiatValue>) -> Self {
        let slot: Arc<Mutex<Option<Outcome>>> = Arc::new(Mutex::new(None));
        let worker_slot = Arc::clone(&slot);
        let worker_callable = Arc::clone(&callable);
        let worker_args = args.clone();

        let spawned = thread::Builder::new()
            .name(format!("fiatlight-{function}"))
            .spawn(move || {
                let outcome = call_catching(&worker_callable, worker_args);
                *worker_slot.lock() = Some(outcome);
            });

        if let Err(err) = spawned {
            warn!(function, error = %err, "cannot spawn a worker thread, invoking synchronously");
            *slot.lock() = Some(call_catching(&callable, args));
        }
        Self { slot }
    }

    /// Whether the outcome is available.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Takes the outcome if the call finished.
    pub fn try_take(&self) -> Option<Outcome> {
        self.slot.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::callable::IntoFiatFunction;

    fn wait(invocation: &AsyncInvocation) -> Outcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = invocation.try_take() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "worker did not finish");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn outcome_is_posted_to_the_slot() {
        let parts = (|x: i64| x * 3).into_parts();
        let invocation = AsyncInvocation::spawn("triple", parts.callable, vec![FiatValue::Int(4)]);
        assert_eq!(wait(&invocation), Ok(FiatValue::Int(12)));
        assert!(invocation.try_take().is_none());
    }

    #[test]
    fn panics_become_failures() {
        let parts = (|_x: i64| -> i64 { panic!("worker exploded") }).into_parts();
        let invocation = AsyncInvocation::spawn("boom", parts.callable, vec![FiatValue::Int(0)]);
        let failure = wait(&invocation).unwrap_err();
        assert_eq!(failure.message, "worker exploded");
    }
}
