use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::MalformedMessage;
use crate::message::{Message, MessageKind};
use crate::registry::TypeRegistry;

pub const PROTOCOL_VERSION: u8 = 1;

/// version + kind + flags + body_len
const HEADER_LEN: usize = 8;
const CRC_LEN: usize = 4;

bitflags::bitflags! {
    /// Frame flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u16 {
        /// The request re-issues a failed or timed-out attempt.
        const RETRY = 1 << 0;
    }
}

/// One framed message on the transport.
///
/// Layout (little-endian):
///
/// ```text
/// [1B version][1B kind][2B flags][4B body_len][body][4B CRC32]
/// ```
///
/// The CRC covers every byte before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub version: u8,
    pub flags: Flags,
    pub message: Message,
}

impl Frame {
    pub fn new(message: impl Into<Message>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            flags: Flags::empty(),
            message: message.into(),
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> Vec<u8> {
        let body = self.message.encode_body();

        let mut header = [0u8; HEADER_LEN];
        header[0] = self.version;
        header[1] = self.message.kind() as u8;
        LittleEndian::write_u16(&mut header[2..4], self.flags.bits());
        LittleEndian::write_u32(&mut header[4..8], body.len() as u32);

        let mut buf = Vec::with_capacity(HEADER_LEN + body.len() + CRC_LEN);
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&body);
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decode frame from bytes, dispatching the body through `registry`.
    pub fn decode(data: &[u8], registry: &TypeRegistry) -> Result<Self, MalformedMessage> {
        if data.len() < HEADER_LEN + CRC_LEN {
            return Err(MalformedMessage::Truncated);
        }
        let mut cursor = Cursor::new(data);

        let version = cursor.read_u8()?;
        if version != PROTOCOL_VERSION {
            return Err(MalformedMessage::UnsupportedVersion(version));
        }
        let kind_byte = cursor.read_u8()?;
        let kind =
            MessageKind::from_u8(kind_byte).ok_or(MalformedMessage::UnknownKind(kind_byte))?;
        let raw_flags = cursor.read_u16::<LittleEndian>()?;
        let flags = Flags::from_bits(raw_flags).ok_or(MalformedMessage::InvalidFlags(raw_flags))?;
        let body_len = cursor.read_u32::<LittleEndian>()? as usize;

        let actual = data.len() - HEADER_LEN - CRC_LEN;
        if body_len != actual {
            return Err(MalformedMessage::LengthMismatch {
                declared: body_len,
                actual,
            });
        }

        // Verify CRC32 before trusting the body
        let crc_offset = data.len() - CRC_LEN;
        let expected = Cursor::new(&data[crc_offset..]).read_u32::<LittleEndian>()?;
        let computed = crc32fast::hash(&data[..crc_offset]);
        if expected != computed {
            return Err(MalformedMessage::ChecksumMismatch { expected, computed });
        }

        let body = &data[HEADER_LEN..crc_offset];
        let message = registry.decode_body(kind, body)?;

        Ok(Frame {
            version,
            flags,
            message,
        })
    }
}
