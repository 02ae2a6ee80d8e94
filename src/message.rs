use std::fmt;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::MalformedMessage;
use crate::page::{RequestToken, ResidentPageHandle, VectorPageId, WorkerId};

/// Message kinds carried in the frame header
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    LoadRequest = 0,
    LoadResponse = 1,
}

impl MessageKind {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(MessageKind::LoadRequest),
            1 => Some(MessageKind::LoadResponse),
            _ => None,
        }
    }
}

/// Value-like message with a fixed, padding-free body layout.
///
/// Equality, ordering, hashing and the string form are all derived from
/// field values, so two processes agree on them without sharing anything
/// but the bytes.
pub trait WireMessage:
    Sized + Clone + Eq + Ord + std::hash::Hash + fmt::Debug + fmt::Display
{
    const KIND: MessageKind;
    const TYPE_NAME: &'static str;

    fn write_body<W: Write>(&self, w: &mut W) -> std::io::Result<()>;

    fn read_body<R: Read>(r: &mut R) -> Result<Self, MalformedMessage>;

    /// Encode the message body
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_body(&mut buf);
        buf
    }

    /// Decode a message body, rejecting trailing bytes
    fn decode(data: &[u8]) -> Result<Self, MalformedMessage> {
        let mut cursor = Cursor::new(data);
        let msg = Self::read_body(&mut cursor)?;
        let rest = data.len() - cursor.position() as usize;
        if rest != 0 {
            return Err(MalformedMessage::TrailingBytes(rest));
        }
        Ok(msg)
    }

    /// Stable cross-process hash of the encoded body.
    fn fingerprint(&self) -> u64 {
        xxh3_64(&self.encode())
    }
}

/// Longest free-form failure text the wire carries, in bytes.
pub const MAX_REASON_LEN: usize = 1 << 20;

/// Free-form failure text, at most `MAX_REASON_LEN` bytes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReasonText(String);

impl ReasonText {
    /// Returns `None` when `text` is longer than `MAX_REASON_LEN` bytes.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.len() > MAX_REASON_LEN {
            return None;
        }
        Some(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Why a page could not be materialized.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureReason {
    NotFound,
    OwnerOverloaded,
    OutOfMemory,
    Timeout,
    Other(ReasonText),
}

impl FailureReason {
    const OTHER_CODE: u8 = 0xff;

    /// Free-form reason. `None` when `text` exceeds `MAX_REASON_LEN` bytes.
    pub fn other(text: impl Into<String>) -> Option<Self> {
        ReasonText::new(text).map(FailureReason::Other)
    }

    fn code(&self) -> u8 {
        match self {
            FailureReason::NotFound => 0,
            FailureReason::OwnerOverloaded => 1,
            FailureReason::OutOfMemory => 2,
            FailureReason::Timeout => 3,
            FailureReason::Other(_) => Self::OTHER_CODE,
        }
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u8(self.code())?;
        if let FailureReason::Other(text) = self {
            let bytes = text.as_str().as_bytes();
            w.write_u32::<LittleEndian>(bytes.len() as u32)?;
            w.write_all(bytes)?;
        }
        Ok(())
    }

    fn read_from<R: Read>(r: &mut R) -> Result<Self, MalformedMessage> {
        match r.read_u8()? {
            0 => Ok(FailureReason::NotFound),
            1 => Ok(FailureReason::OwnerOverloaded),
            2 => Ok(FailureReason::OutOfMemory),
            3 => Ok(FailureReason::Timeout),
            Self::OTHER_CODE => {
                let len = r.read_u32::<LittleEndian>()? as usize;
                if len > MAX_REASON_LEN {
                    return Err(MalformedMessage::ReasonTooLong(len));
                }
                let mut text = vec![0u8; len];
                r.read_exact(&mut text)?;
                let text = String::from_utf8(text).map_err(|_| MalformedMessage::InvalidUtf8)?;
                Ok(FailureReason::Other(ReasonText(text)))
            }
            code => Err(MalformedMessage::UnknownReason(code)),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotFound => f.write_str("NotFound"),
            FailureReason::OwnerOverloaded => f.write_str("OwnerOverloaded"),
            FailureReason::OutOfMemory => f.write_str("OutOfMemory"),
            FailureReason::Timeout => f.write_str("Timeout"),
            FailureReason::Other(text) => write!(f, "Other({:?})", text.as_str()),
        }
    }
}

/// Asks the page owner to fault `page` into memory.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadRequest {
    pub page: VectorPageId,
    pub requester: WorkerId,
    pub token: RequestToken,
}

impl WireMessage for LoadRequest {
    const KIND: MessageKind = MessageKind::LoadRequest;
    const TYPE_NAME: &'static str = "LoadRequest";

    fn write_body<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.page.write_to(w)?;
        w.write_u64::<LittleEndian>(self.requester.0)?;
        w.write_u64::<LittleEndian>(self.token.0)?;
        Ok(())
    }

    fn read_body<R: Read>(r: &mut R) -> Result<Self, MalformedMessage> {
        let page = VectorPageId::read_from(r)?;
        let requester = WorkerId(r.read_u64::<LittleEndian>()?);
        let token = RequestToken(r.read_u64::<LittleEndian>()?);
        Ok(LoadRequest {
            page,
            requester,
            token,
        })
    }
}

impl fmt::Display for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LoadRequest(page={}, requester={}, token={})",
            self.page, self.requester, self.token
        )
    }
}

/// Outcome of a previously issued `LoadRequest`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadResponse {
    Loaded {
        page: VectorPageId,
        token: RequestToken,
        handle: ResidentPageHandle,
    },
    Failed {
        page: VectorPageId,
        token: RequestToken,
        reason: FailureReason,
    },
}

impl LoadResponse {
    const LOADED_TAG: u8 = 0;
    const FAILED_TAG: u8 = 1;

    pub fn page(&self) -> VectorPageId {
        match self {
            LoadResponse::Loaded { page, .. } | LoadResponse::Failed { page, .. } => *page,
        }
    }

    pub fn token(&self) -> RequestToken {
        match self {
            LoadResponse::Loaded { token, .. } | LoadResponse::Failed { token, .. } => *token,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadResponse::Loaded { .. })
    }
}

impl WireMessage for LoadResponse {
    const KIND: MessageKind = MessageKind::LoadResponse;
    const TYPE_NAME: &'static str = "LoadResponse";

    fn write_body<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        match self {
            LoadResponse::Loaded {
                page,
                token,
                handle,
            } => {
                w.write_u8(Self::LOADED_TAG)?;
                page.write_to(w)?;
                w.write_u64::<LittleEndian>(token.0)?;
                w.write_u64::<LittleEndian>(handle.0)?;
            }
            LoadResponse::Failed {
                page,
                token,
                reason,
            } => {
                w.write_u8(Self::FAILED_TAG)?;
                page.write_to(w)?;
                w.write_u64::<LittleEndian>(token.0)?;
                reason.write_to(w)?;
            }
        }
        Ok(())
    }

    fn read_body<R: Read>(r: &mut R) -> Result<Self, MalformedMessage> {
        let tag = r.read_u8()?;
        if tag != Self::LOADED_TAG && tag != Self::FAILED_TAG {
            return Err(MalformedMessage::UnknownVariant {
                message: Self::TYPE_NAME,
                tag,
            });
        }

        let page = VectorPageId::read_from(r)?;
        let token = RequestToken(r.read_u64::<LittleEndian>()?);

        if tag == Self::LOADED_TAG {
            let handle = ResidentPageHandle(r.read_u64::<LittleEndian>()?);
            Ok(LoadResponse::Loaded {
                page,
                token,
                handle,
            })
        } else {
            let reason = FailureReason::read_from(r)?;
            Ok(LoadResponse::Failed {
                page,
                token,
                reason,
            })
        }
    }
}

impl fmt::Display for LoadResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadResponse::Loaded {
                page,
                token,
                handle,
            } => write!(
                f,
                "LoadResponse.Loaded(page={page}, token={token}, handle={handle})"
            ),
            LoadResponse::Failed {
                page,
                token,
                reason,
            } => write!(
                f,
                "LoadResponse.Failed(page={page}, token={token}, reason={reason})"
            ),
        }
    }
}

/// Any registered wire message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    LoadRequest(LoadRequest),
    LoadResponse(LoadResponse),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::LoadRequest(_) => MessageKind::LoadRequest,
            Message::LoadResponse(_) => MessageKind::LoadResponse,
        }
    }

    pub(crate) fn encode_body(&self) -> Vec<u8> {
        match self {
            Message::LoadRequest(m) => m.encode(),
            Message::LoadResponse(m) => m.encode(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::LoadRequest(m) => fmt::Display::fmt(m, f),
            Message::LoadResponse(m) => fmt::Display::fmt(m, f),
        }
    }
}

impl From<LoadRequest> for Message {
    fn from(m: LoadRequest) -> Self {
        Message::LoadRequest(m)
    }
}

impl From<LoadResponse> for Message {
    fn from(m: LoadResponse) -> Self {
        Message::LoadResponse(m)
    }
}
