//! In-memory target speaking the boot protocol, for tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use rf24boot_common::endian::Endian;
use rf24boot_common::opcode::Opcode;
use rf24boot_common::packets::block::{BlockHeader, DataBlock};
use rf24boot_common::packets::hello::HelloResp;
use rf24boot_common::packets::partition::PartitionHeader;
use rf24boot_common::packets::{Command, Packet};

use crate::link::{Link, Mode, Transfer, TransferStatus};

pub const ERASED: u8 = 0xFF;

pub struct SimPartition {
    pub header: PartitionHeader,
    pub memory: Vec<u8>,
}

pub struct SimTarget {
    pub endian: Endian,
    pub partitions: Vec<SimPartition>,
    /// Announce this many partitions instead of the real count.
    pub announce: Option<u8>,
    /// Never answer reads.
    pub silent: bool,
    /// Time out every write batch.
    pub deaf: bool,
    /// Cap on packets handed out per read round trip.
    pub max_per_read: Option<usize>,

    pub received: Vec<Command>,
    pub batches: Vec<(Mode, usize)>,
    pub booted: Option<u8>,

    pending: VecDeque<Packet>,
    stream: Option<(usize, u32)>,
}

impl SimTarget {
    pub fn new(endian: Endian) -> Self {
        Self {
            endian,
            partitions: Vec::new(),
            announce: None,
            silent: false,
            deaf: false,
            max_per_read: None,
            received: Vec::new(),
            batches: Vec::new(),
            booted: None,
            pending: VecDeque::new(),
            stream: None,
        }
    }

    pub fn with_partition(mut self, name: &str, size: u32, io_size: u32, pad: u8) -> Self {
        self.partitions.push(SimPartition {
            header: PartitionHeader {
                name: heapless::String::from(name),
                size,
                io_size,
                pad,
            },
            memory: vec![ERASED; size as usize],
        });
        self
    }

    pub fn memory(&self, part: usize) -> &[u8] {
        &self.partitions[part].memory
    }

    pub fn memory_mut(&mut self, part: usize) -> &mut [u8] {
        &mut self.partitions[part].memory
    }

    /// Write commands seen so far.
    pub fn writes(&self) -> Vec<&DataBlock> {
        self.received
            .iter()
            .filter_map(|c| match c {
                Command::Write(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    fn handle(&mut self, command: Command) {
        match &command {
            Command::Hello(_) => {
                let hello = HelloResp {
                    id: heapless::String::from("sim-target"),
                    endian: self.endian,
                    num_parts: self
                        .announce
                        .unwrap_or(self.partitions.len() as u8),
                };
                self.pending.push_back(hello.raw_packet());
                for p in &self.partitions {
                    self.pending.push_back(p.header.raw_packet(self.endian));
                }
            }
            Command::Write(block) => {
                let p = &mut self.partitions[block.header.part as usize];
                let start = block.address() as usize;
                let end = start + block.len();
                assert!(
                    end <= p.memory.len(),
                    "write {:#x}..{:#x} past end of {}",
                    start,
                    end,
                    p.header.name
                );
                p.memory[start..end].clone_from_slice(block);
            }
            Command::Read(header) => {
                self.stream = Some((header.part as usize, 0));
            }
            Command::Boot(part) => self.booted = Some(*part),
        }
        self.received.push(command);
    }

    fn next_block(&mut self) -> Option<Packet> {
        let (part, address) = self.stream?;
        let p = &self.partitions[part];
        let io_size = p.header.io_size as usize;
        let start = address as usize;
        if start + io_size > p.memory.len() {
            self.stream = None;
            return None;
        }

        let block = DataBlock::new(
            BlockHeader::new(part as u8, address),
            &p.memory[start..start + io_size],
            io_size,
        )?;
        self.stream = Some((part, address + io_size as u32));
        Some(block.raw_packet(Opcode::Read, self.endian))
    }
}

impl Link for SimTarget {
    async fn execute(
        &mut self,
        transfer: &mut Transfer,
        _timeout: Duration,
    ) -> io::Result<TransferStatus> {
        self.batches
            .push((transfer.mode(), transfer.outgoing().len()));

        match transfer.mode() {
            Mode::Write { .. } => {
                if self.deaf {
                    return Ok(TransferStatus::TimedOut);
                }
                for packet in transfer.outgoing() {
                    let command = Command::parse_packet(packet, self.endian)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                    self.handle(command);
                }
                Ok(TransferStatus::Completed)
            }
            Mode::Read { count } => {
                if self.silent {
                    return Ok(TransferStatus::TimedOut);
                }
                let limit = count.min(self.max_per_read.unwrap_or(count));
                while transfer.packet_count() < limit {
                    match self.pending.pop_front().or_else(|| self.next_block()) {
                        Some(p) => transfer.receive(p),
                        None => break,
                    }
                }
                Ok(match transfer.packet_count() {
                    0 => TransferStatus::TimedOut,
                    _ => TransferStatus::Completed,
                })
            }
        }
    }
}
