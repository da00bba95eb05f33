// Bridge - fold failing operations into `Outcome` values
//
// A failure reaches the bridge through one of two channels: a returned
// `Err(e)`, or an unwinding panic. Both become `Outcome::Err(Fault<E>)` and
// nothing is re-raised unless the caller asks for it with `rethrow`.

use crate::dispatch::BoxFuture;
use crate::outcome::Outcome;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;
use thiserror::Error;
use tracing::debug;

/// A captured failure, surfaced unchanged
#[derive(Debug, Error)]
pub enum Fault<E> {
    #[error(transparent)]
    Error(E),

    #[error("panicked: {0}")]
    Panic(Panic),
}

/// A panic caught at the bridge. Keeps the original payload so it can be
/// resumed as-is.
pub struct Panic {
    message: String,
    payload: Box<dyn Any + Send>,
}

impl Panic {
    fn capture(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        debug!(message = %message, "captured panic");
        Panic { message, payload }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> &(dyn Any + Send) {
        &*self.payload
    }

    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }

    /// Continue unwinding with the original payload
    pub fn resume(self) -> ! {
        panic::resume_unwind(self.payload)
    }
}

impl fmt::Debug for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panic")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E> Fault<E> {
    pub fn is_panic(&self) -> bool {
        matches!(self, Fault::Panic(_))
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Fault::Error(err) => Some(err),
            Fault::Panic(_) => None,
        }
    }

    pub fn into_error(self) -> Option<E> {
        match self {
            Fault::Error(err) => Some(err),
            Fault::Panic(_) => None,
        }
    }

    pub fn panic(&self) -> Option<&Panic> {
        match self {
            Fault::Error(_) => None,
            Fault::Panic(p) => Some(p),
        }
    }

    /// The error's display form, or the panic message
    pub fn message(&self) -> String
    where
        E: fmt::Display,
    {
        match self {
            Fault::Error(err) => err.to_string(),
            Fault::Panic(p) => p.message.clone(),
        }
    }

    /// Raise the failure again with its identity intact: a captured panic
    /// resumes with its original payload, an error becomes the panic payload.
    pub fn resume(self) -> !
    where
        E: Send + 'static,
    {
        match self {
            Fault::Error(err) => panic::panic_any(err),
            Fault::Panic(p) => p.resume(),
        }
    }
}

impl<T, E> Outcome<T, Fault<E>> {
    /// The success payload, or re-raise the captured failure
    pub fn rethrow(self) -> T
    where
        E: Send + 'static,
    {
        match self {
            Outcome::Ok(value) => value,
            Outcome::Err(fault) => fault.resume(),
        }
    }
}

/// Run `f`, folding its result or panic into an `Outcome`
pub fn attempt<T, E, F>(f: F) -> Outcome<T, Fault<E>>
where
    F: FnOnce() -> Result<T, E>,
{
    settle(panic::catch_unwind(AssertUnwindSafe(f)))
}

/// Start `f` now and settle its future. Panics while starting or while
/// polling are captured. Dropping the returned future cancels `f`'s future.
pub fn attempt_async<T, E, F, Fut>(f: F) -> impl Future<Output = Outcome<T, Fault<E>>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    settle_async(panic::catch_unwind(AssertUnwindSafe(f)))
}

/// Wrap `f` so every call goes through [`attempt`]. Functions of several
/// arguments take a tuple.
pub fn guarded<A, T, E, F>(f: F) -> impl Fn(A) -> Outcome<T, Fault<E>>
where
    F: Fn(A) -> Result<T, E>,
{
    move |arg| attempt(|| f(arg))
}

/// Wrap an async `f` so every call goes through [`attempt_async`]
pub fn guarded_async<A, T, E, F, Fut>(f: F) -> impl Fn(A) -> BoxFuture<'static, Outcome<T, Fault<E>>>
where
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    move |arg| Box::pin(settle_async(panic::catch_unwind(AssertUnwindSafe(|| f(arg)))))
}

fn settle<T, E>(caught: thread::Result<Result<T, E>>) -> Outcome<T, Fault<E>> {
    match caught {
        Ok(Ok(value)) => Outcome::Ok(value),
        Ok(Err(err)) => Outcome::Err(Fault::Error(err)),
        Err(payload) => Outcome::Err(Fault::Panic(Panic::capture(payload))),
    }
}

async fn settle_async<T, E, Fut>(started: thread::Result<Fut>) -> Outcome<T, Fault<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match started {
        Ok(future) => settle(
            CatchUnwind {
                inner: Box::pin(future),
            }
            .await,
        ),
        Err(payload) => Outcome::Err(Fault::Panic(Panic::capture(payload))),
    }
}

struct CatchUnwind<F> {
    inner: Pin<Box<F>>,
}

impl<F: Future> Future for CatchUnwind<F> {
    type Output = thread::Result<F::Output>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = self.inner.as_mut();
        match panic::catch_unwind(AssertUnwindSafe(|| inner.poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(output)) => Poll::Ready(Ok(output)),
            Err(payload) => Poll::Ready(Err(payload)),
        }
    }
}
