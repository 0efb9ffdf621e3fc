#![no_std]

pub mod endian;
pub mod opcode;
pub mod packets;
pub mod window;

/// Byte used to fill unused tail of data blocks and padding blocks.
pub const FILLER: u8 = 0xAA;

pub const MAX_PACKET_SIZE: usize = 128;
pub const MAX_BLOCK_SIZE: usize = MAX_PACKET_SIZE - packets::block::HEADER_LEN;
