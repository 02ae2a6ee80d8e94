use std::fmt;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::MalformedMessage;

/// Identity of a distributed vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VectorId(pub u64);

/// Worker participating in the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub u64);

/// Correlates a `LoadResponse` with the `LoadRequest` it answers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// Opaque handle to a page that is resident in local memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResidentPageHandle(pub u64);

/// Contiguous slice `[low, high)` of a distributed vector.
///
/// Ordering is field-wise (vector, then low, then high), which keeps
/// outstanding-request tables and logs deterministic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VectorPageId {
    vector: VectorId,
    low: u64,
    high: u64,
}

impl VectorPageId {
    /// Returns `None` when `low > high`.
    pub fn new(vector: VectorId, low: u64, high: u64) -> Option<Self> {
        if low > high {
            return None;
        }
        Some(Self { vector, low, high })
    }

    pub fn vector(&self) -> VectorId {
        self.vector
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn high(&self) -> u64 {
        self.high
    }

    pub fn len(&self) -> u64 {
        self.high - self.low
    }

    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }

    pub(crate) fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u64::<LittleEndian>(self.vector.0)?;
        w.write_u64::<LittleEndian>(self.low)?;
        w.write_u64::<LittleEndian>(self.high)?;
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(r: &mut R) -> Result<Self, MalformedMessage> {
        let vector = VectorId(r.read_u64::<LittleEndian>()?);
        let low = r.read_u64::<LittleEndian>()?;
        let high = r.read_u64::<LittleEndian>()?;
        Self::new(vector, low, high).ok_or(MalformedMessage::InvertedRange { low, high })
    }
}

impl fmt::Display for VectorPageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}, {})", self.vector, self.low, self.high)
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vector:{:#x}", self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker:{}", self.0)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl fmt::Display for ResidentPageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle:{}", self.0)
    }
}
