//! Vector-load completion protocol.
//!
//! A worker asks for a page of a distributed vector with
//! [`LoadCoordinator::request_page`]; the coordinator sends at most one
//! [`LoadRequest`] per page over a [`Transport`] and fans the matching
//! [`LoadResponse`] out to every local waiter. Page owners answer requests
//! with a [`LoadResponder`].

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod future;
pub mod logging;
pub mod message;
pub mod page;
pub mod registry;
pub mod responder;
pub mod transport;
pub mod wire;

pub use cache::{InMemoryPageCache, ResidentPageCache};
pub use config::CoordinatorConfig;
pub use coordinator::{CoordinatorStats, LoadCoordinator, ResponseOutcome};
pub use error::{ConfigError, LoadError, MalformedMessage, RegistryError, StaleToken, TransportError};
pub use future::{PageFuture, PageResult};
pub use message::{
    FailureReason, LoadRequest, LoadResponse, Message, MessageKind, ReasonText, WireMessage,
    MAX_REASON_LEN,
};
pub use page::{RequestToken, ResidentPageHandle, VectorId, VectorPageId, WorkerId};
pub use registry::TypeRegistry;
pub use responder::{LoadResponder, PageSource};
pub use transport::{FrameTransport, Transport};
pub use wire::{Flags, Frame, PROTOCOL_VERSION};
