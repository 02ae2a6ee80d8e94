use std::sync::Arc;

use futures::channel::mpsc;

use crate::error::TransportError;
use crate::message::LoadRequest;
use crate::wire::{Flags, Frame};

/// Outbound side of the worker-to-worker link.
///
/// Delivery is assumed unordered and at-least-once: messages may be lost or
/// duplicated, and a successful `send_request` promises nothing about arrival.
pub trait Transport: Send + Sync {
    /// `attempt` starts at 1 and grows with each retry of the same chain.
    fn send_request(&self, request: &LoadRequest, attempt: u32) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_request(&self, request: &LoadRequest, attempt: u32) -> Result<(), TransportError> {
        (**self).send_request(request, attempt)
    }
}

/// Encodes requests as frames into an unbounded channel.
///
/// The receiving half is drained by whatever actually moves bytes.
#[derive(Debug, Clone)]
pub struct FrameTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl FrameTransport {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }

    pub fn send_frame(&self, frame: &Frame) -> Result<(), TransportError> {
        self.tx
            .unbounded_send(frame.encode())
            .map_err(|_| TransportError::Closed)
    }
}

impl Transport for FrameTransport {
    fn send_request(&self, request: &LoadRequest, attempt: u32) -> Result<(), TransportError> {
        let flags = if attempt > 1 {
            Flags::RETRY
        } else {
            Flags::empty()
        };
        self.send_frame(&Frame::new(request.clone()).with_flags(flags))
    }
}
