use num_traits::FromPrimitive;

#[derive(Debug, Copy, Clone, Eq, PartialEq, enum_primitive_derive::Primitive)]
pub enum Opcode {
    Hello = 0,
    PartInfo = 1, // to host
    Read = 2,
    Write = 3, // from host
    Boot = 4,  // from host
}

impl Opcode {
    #[inline]
    pub fn try_from_u8(value: u8) -> Option<Self> {
        Self::from_u8(value)
    }
}

impl From<Opcode> for u8 {
    fn from(v: Opcode) -> Self {
        v as u8
    }
}
