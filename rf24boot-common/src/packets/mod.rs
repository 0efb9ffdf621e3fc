use crate::endian::Endian;
use crate::opcode::Opcode;
use crate::packets::block::{BlockHeader, DataBlock, HEADER_LEN};
use crate::packets::node_address::NodeAddress;
use crate::MAX_PACKET_SIZE;

pub mod block;
pub mod hello;
pub mod node_address;
pub mod partition;

pub type Packet = arrayvec::ArrayVec<u8, MAX_PACKET_SIZE>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParseError {
    WrongDataSize,
    WrongData,
    UnknownOpcode(u8),
    UnexpectedOpcode(Opcode),
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WrongDataSize => f.write_str("wrong data size"),
            Self::WrongData => f.write_str("wrong data"),
            Self::UnknownOpcode(op) => write!(f, "unknown opcode {:#04x}", op),
            Self::UnexpectedOpcode(op) => write!(f, "unexpected opcode {:?}", op),
        }
    }
}

/// Commands sent from the host to the target.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    Hello(NodeAddress),
    /// `address == size` asks for the whole partition.
    Read(BlockHeader),
    Write(DataBlock),
    Boot(u8),
}

impl Command {
    #[inline]
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Hello(_) => Opcode::Hello,
            Command::Read(_) => Opcode::Read,
            Command::Write(_) => Opcode::Write,
            Command::Boot(_) => Opcode::Boot,
        }
    }

    pub fn raw_packet(&self, endian: Endian) -> Packet {
        let mut p = Packet::new();
        match self {
            Command::Hello(address) => {
                p.push(Opcode::Hello.into());
                p.extend(address.0);
            }
            Command::Read(header) => p.extend(header.raw(Opcode::Read, endian)),
            Command::Write(block) => return block.raw_packet(Opcode::Write, endian),
            Command::Boot(part) => p.extend(BlockHeader::new(*part, 0).raw(Opcode::Boot, endian)),
        }
        p
    }

    /// Target side decoding. `WRITE` takes everything after the header as data.
    pub fn parse_packet(data: &[u8], endian: Endian) -> Result<Command, ParseError> {
        let op = *data.first().ok_or(ParseError::WrongDataSize)?;
        match Opcode::try_from_u8(op).ok_or(ParseError::UnknownOpcode(op))? {
            Opcode::Hello => match data.len() {
                6.. => Ok(Command::Hello(NodeAddress::from(
                    <[u8; 5]>::try_from(&data[1..6]).map_err(|_| ParseError::WrongData)?,
                ))),
                _ => Err(ParseError::WrongDataSize),
            },
            Opcode::Read => Ok(Command::Read(BlockHeader::parse(data, endian)?)),
            Opcode::Write => {
                let io_size = data.len().saturating_sub(HEADER_LEN);
                Ok(Command::Write(DataBlock::parse(Opcode::Write, data, endian, io_size)?))
            }
            Opcode::Boot => match data.len() {
                2.. => Ok(Command::Boot(data[1])),
                _ => Err(ParseError::WrongDataSize),
            },
            Opcode::PartInfo => Err(ParseError::UnexpectedOpcode(Opcode::PartInfo)),
        }
    }
}

pub(crate) fn expect_opcode(raw: u8, expected: Opcode) -> Result<(), ParseError> {
    match Opcode::try_from_u8(raw) {
        Some(op) if op == expected => Ok(()),
        Some(op) => Err(ParseError::UnexpectedOpcode(op)),
        None => Err(ParseError::UnknownOpcode(raw)),
    }
}

/// NUL padded fixed width string.
pub(crate) fn fixed_str<const N: usize>(raw: &[u8]) -> Result<heapless::String<N>, ParseError> {
    let len = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    let s = core::str::from_utf8(&raw[..len]).map_err(|_| ParseError::WrongData)?;
    let mut res = heapless::String::new();
    res.push_str(s).map_err(|_| ParseError::WrongDataSize)?;
    Ok(res)
}

pub(crate) fn put_fixed_str(buf: &mut [u8], s: &str) {
    buf.iter_mut()
        .zip(s.bytes().chain(core::iter::repeat(0)))
        .for_each(|(d, s)| *d = s);
}
