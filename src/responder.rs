//! Page-owner side of the protocol: answers `LoadRequest`s.

use tracing::{debug, warn};

use crate::error::MalformedMessage;
use crate::message::{FailureReason, LoadRequest, LoadResponse, Message};
use crate::page::{ResidentPageHandle, VectorPageId};
use crate::registry::TypeRegistry;
use crate::wire::Frame;

/// Materializes pages owned by this worker.
pub trait PageSource: Send + Sync {
    fn materialize(&self, page: &VectorPageId) -> Result<ResidentPageHandle, FailureReason>;
}

impl<F> PageSource for F
where
    F: Fn(&VectorPageId) -> Result<ResidentPageHandle, FailureReason> + Send + Sync,
{
    fn materialize(&self, page: &VectorPageId) -> Result<ResidentPageHandle, FailureReason> {
        self(page)
    }
}

pub struct LoadResponder<S> {
    source: S,
    registry: TypeRegistry,
}

impl<S: PageSource> LoadResponder<S> {
    pub fn new(source: S, registry: TypeRegistry) -> Self {
        Self { source, registry }
    }

    /// Answer carries the request's page and token verbatim.
    pub fn respond(&self, request: &LoadRequest) -> LoadResponse {
        let page = request.page;
        let token = request.token;
        match self.source.materialize(&page) {
            Ok(handle) => LoadResponse::Loaded {
                page,
                token,
                handle,
            },
            Err(reason) => {
                debug!(%page, %token, %reason, requester = %request.requester, "cannot materialize page");
                LoadResponse::Failed {
                    page,
                    token,
                    reason,
                }
            }
        }
    }

    /// Decode a frame and encode the answer. `None` for frames that are not
    /// requests.
    pub fn respond_frame(&self, bytes: &[u8]) -> Result<Option<Vec<u8>>, MalformedMessage> {
        let frame = Frame::decode(bytes, &self.registry).map_err(|err| {
            warn!(error = %err, len = bytes.len(), "dropping malformed frame");
            err
        })?;

        match frame.message {
            Message::LoadRequest(request) => Ok(Some(Frame::new(self.respond(&request)).encode())),
            Message::LoadResponse(_) => Ok(None),
        }
    }
}
