use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order of the target, as announced in its hello record.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn from_flag(is_big_endian: u8) -> Self {
        match is_big_endian {
            0 => Endian::Little,
            _ => Endian::Big,
        }
    }

    pub fn flag(&self) -> u8 {
        match self {
            Endian::Little => 0,
            Endian::Big => 1,
        }
    }

    #[inline]
    pub fn read_u32(&self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    #[inline]
    pub fn write_u32(&self, buf: &mut [u8], value: u32) {
        match self {
            Endian::Little => LittleEndian::write_u32(buf, value),
            Endian::Big => BigEndian::write_u32(buf, value),
        }
    }
}

impl core::fmt::Display for Endian {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Endian::Little => f.write_str("little"),
            Endian::Big => f.write_str("BIG"),
        }
    }
}
