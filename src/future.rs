use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::FutureExt;

use crate::error::LoadError;
use crate::page::ResidentPageHandle;

pub type PageResult = Result<ResidentPageHandle, LoadError>;

/// Sending half held by the coordinator for one waiter.
pub(crate) type Waiter = oneshot::Sender<PageResult>;

/// Resolves once the requested page is resident or its load chain failed.
///
/// Dropping the future withdraws interest in the page; it does not cancel
/// the request on the wire.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct PageFuture {
    rx: oneshot::Receiver<PageResult>,
}

impl PageFuture {
    pub(crate) fn pending() -> (Waiter, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    pub(crate) fn ready(result: PageResult) -> Self {
        let (tx, future) = Self::pending();
        let _ = tx.send(result);
        future
    }

    /// Non-blocking check. `None` while the load is still in flight.
    pub fn try_take(&mut self) -> Option<PageResult> {
        match self.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::Canceled) => Some(Err(LoadError::Shutdown)),
        }
    }
}

impl Future for PageFuture {
    type Output = PageResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.rx.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Sender dropped without an answer: the coordinator went away.
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(LoadError::Shutdown)),
            Poll::Pending => Poll::Pending,
        }
    }
}
