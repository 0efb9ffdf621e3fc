use super::{fixed_str, put_fixed_str, Packet, ParseError};
use crate::endian::Endian;
use crate::opcode::Opcode;

pub const TARGET_ID_LEN: usize = 16;

/// First reply of the handshake: who the target is and how many
/// partition descriptors follow.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HelloResp {
    pub id: heapless::String<TARGET_ID_LEN>,
    pub endian: Endian,
    pub num_parts: u8,
}

impl HelloResp {
    pub const LEN: usize = 1 + TARGET_ID_LEN + 2;

    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::LEN {
            return Err(ParseError::WrongDataSize);
        }
        super::expect_opcode(data[0], Opcode::Hello)?;

        let flags = &data[1 + TARGET_ID_LEN..];
        Ok(Self {
            id: fixed_str(&data[1..1 + TARGET_ID_LEN])?,
            endian: Endian::from_flag(flags[0]),
            num_parts: flags[1],
        })
    }

    pub fn raw_packet(&self) -> Packet {
        let mut buf = [0u8; Self::LEN];
        buf[0] = Opcode::Hello.into();
        put_fixed_str(&mut buf[1..1 + TARGET_ID_LEN], &self.id);
        buf[1 + TARGET_ID_LEN] = self.endian.flag();
        buf[2 + TARGET_ID_LEN] = self.num_parts;

        let mut p = Packet::new();
        p.extend(buf);
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_resp() {
        let mut raw = [0u8; HelloResp::LEN];
        raw[1..8].clone_from_slice(b"avr-e32");
        raw[17] = 1;
        raw[18] = 3;

        let h = HelloResp::parse(&raw).unwrap();
        assert_eq!(h.id.as_str(), "avr-e32");
        assert_eq!(h.endian, Endian::Big);
        assert_eq!(h.num_parts, 3);
        assert_eq!(h.raw_packet().as_slice(), &raw[..]);

        assert_eq!(
            HelloResp::parse(&raw[..HelloResp::LEN - 1]),
            Err(ParseError::WrongDataSize)
        );

        raw[0] = Opcode::Read.into();
        assert_eq!(
            HelloResp::parse(&raw),
            Err(ParseError::UnexpectedOpcode(Opcode::Read))
        );
    }
}
