/// Radio address the host listens on, announced to the target in `HELLO`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NodeAddress(pub [u8; 5]);

impl NodeAddress {
    pub fn from_hex(value: &str) -> Result<Self, hex::FromHexError> {
        let mut address = [0u8; 5];
        hex::decode_to_slice(value, &mut address)?;
        Ok(Self(address))
    }
}

impl From<[u8; 5]> for NodeAddress {
    fn from(val: [u8; 5]) -> Self {
        Self(val)
    }
}

impl From<NodeAddress> for [u8; 5] {
    fn from(v: NodeAddress) -> Self {
        v.0
    }
}

impl core::fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test() {
        let s = NodeAddress::from([1, 2, 3, 4, 5]);
        assert_eq!(s.0, [1, 2, 3, 4, 5]);
        assert_eq!(<[u8; 5]>::from(s), [1, 2, 3, 4, 5]);

        assert_eq!(
            NodeAddress::from_hex("a0b1c2d3e4"),
            Ok(NodeAddress([0xa0, 0xb1, 0xc2, 0xd3, 0xe4]))
        );
        assert_eq!(
            NodeAddress::from_hex("a0b1"),
            Err(hex::FromHexError::InvalidStringLength)
        );
        assert!(NodeAddress::from_hex("zzb1c2d3e4").is_err());
    }
}
