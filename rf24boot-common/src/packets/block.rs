use core::ops::Deref;

use super::{Packet, ParseError};
use crate::endian::Endian;
use crate::opcode::Opcode;
use crate::{FILLER, MAX_BLOCK_SIZE};

/// opcode + partition index + address
pub const HEADER_LEN: usize = 6;

/// Addressing part shared by `READ`, `WRITE` and `BOOT`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockHeader {
    pub part: u8,
    pub address: u32,
}

impl BlockHeader {
    pub fn new(part: u8, address: u32) -> Self {
        Self { part, address }
    }

    pub fn parse(data: &[u8], endian: Endian) -> Result<Self, ParseError> {
        if data.len() < HEADER_LEN {
            return Err(ParseError::WrongDataSize);
        }
        Ok(Self {
            part: data[1],
            address: endian.read_u32(&data[2..HEADER_LEN]),
        })
    }

    pub fn raw(&self, op: Opcode, endian: Endian) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = op.into();
        buf[1] = self.part;
        endian.write_u32(&mut buf[2..], self.address);
        buf
    }
}

/// One `ioSize` chunk of partition data, either a `WRITE` command or the
/// reply to a `READ`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DataBlock {
    pub header: BlockHeader,
    data: arrayvec::ArrayVec<u8, MAX_BLOCK_SIZE>,
}

impl DataBlock {
    /// Builds a block of exactly `io_size` bytes, filling whatever `data`
    /// does not cover with [`FILLER`].
    pub fn new(header: BlockHeader, data: &[u8], io_size: usize) -> Option<Self> {
        if io_size > MAX_BLOCK_SIZE || data.len() > io_size {
            return None;
        }
        let mut buf = arrayvec::ArrayVec::new();
        buf.extend(data.iter().copied());
        buf.extend(core::iter::repeat(FILLER).take(io_size - data.len()));
        Some(Self { header, data: buf })
    }

    pub fn filler(header: BlockHeader, io_size: usize) -> Option<Self> {
        Self::new(header, &[], io_size)
    }

    #[inline]
    pub fn address(&self) -> u32 {
        self.header.address
    }

    /// Decodes a block carried by `op`, taking `io_size` bytes of payload.
    /// Trailing bytes beyond `io_size` are link padding and ignored.
    pub fn parse(
        op: Opcode,
        data: &[u8],
        endian: Endian,
        io_size: usize,
    ) -> Result<Self, ParseError> {
        if data.is_empty() {
            return Err(ParseError::WrongDataSize);
        }
        super::expect_opcode(data[0], op)?;
        if io_size > MAX_BLOCK_SIZE || data.len() < HEADER_LEN + io_size {
            return Err(ParseError::WrongDataSize);
        }

        let mut buf = arrayvec::ArrayVec::new();
        buf.extend(data[HEADER_LEN..HEADER_LEN + io_size].iter().copied());
        Ok(Self {
            header: BlockHeader::parse(data, endian)?,
            data: buf,
        })
    }

    pub fn raw_packet(&self, op: Opcode, endian: Endian) -> Packet {
        let mut p = Packet::new();
        p.extend(self.header.raw(op, endian));
        p.extend(self.data.iter().copied());
        p
    }
}

impl Deref for DataBlock {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for DataBlock {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.deref()
    }
}
