use super::{fixed_str, put_fixed_str, Packet, ParseError};
use crate::endian::Endian;
use crate::opcode::Opcode;
use crate::window::Geometry;

pub const PART_NAME_LEN: usize = 16;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PartitionHeader {
    pub name: heapless::String<PART_NAME_LEN>,
    pub size: u32,
    pub io_size: u32,
    pub pad: u8,
}

impl PartitionHeader {
    pub const LEN: usize = 1 + PART_NAME_LEN + 4 + 4 + 1;

    pub fn parse(data: &[u8], endian: Endian) -> Result<Self, ParseError> {
        if data.len() < Self::LEN {
            return Err(ParseError::WrongDataSize);
        }
        super::expect_opcode(data[0], Opcode::PartInfo)?;

        let fields = &data[1 + PART_NAME_LEN..];
        Ok(Self {
            name: fixed_str(&data[1..1 + PART_NAME_LEN])?,
            size: endian.read_u32(&fields[0..4]),
            io_size: endian.read_u32(&fields[4..8]),
            pad: fields[8],
        })
    }

    pub fn raw_packet(&self, endian: Endian) -> Packet {
        let mut buf = [0u8; Self::LEN];
        buf[0] = Opcode::PartInfo.into();
        put_fixed_str(&mut buf[1..1 + PART_NAME_LEN], &self.name);
        let fields = &mut buf[1 + PART_NAME_LEN..];
        endian.write_u32(&mut fields[0..4], self.size);
        endian.write_u32(&mut fields[4..8], self.io_size);
        fields[8] = self.pad;

        let mut p = Packet::new();
        p.extend(buf);
        p
    }

    /// Transfer geometry. A pad modulus of 0 is treated as 1.
    #[inline]
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.size, self.io_size, self.pad as u32)
    }
}
