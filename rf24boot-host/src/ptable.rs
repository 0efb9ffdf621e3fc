use std::time::Duration;

use rf24boot_common::endian::Endian;
use rf24boot_common::packets::hello::HelloResp;
use rf24boot_common::packets::node_address::NodeAddress;
use rf24boot_common::packets::partition::PartitionHeader;
use rf24boot_common::packets::Command;
use rf24boot_common::window::Geometry;
use rf24boot_common::MAX_BLOCK_SIZE;

use crate::link::{Link, Transfer, TransferStatus};
use crate::util::{Error, ProtocolError};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Partition {
    pub name: String,
    pub geometry: Geometry,
}

impl Partition {
    fn from_header(index: usize, header: &PartitionHeader) -> Result<Self, ProtocolError> {
        let bad = |reason| ProtocolError::PartitionTable { index, reason };
        match header.io_size as usize {
            0 => Err(bad("zero ioSize")),
            n if n > MAX_BLOCK_SIZE => Err(bad("ioSize does not fit a packet")),
            _ => Ok(Self {
                name: header.name.as_str().to_string(),
                geometry: header.geometry(),
            }),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Target {
    pub id: String,
    pub endian: Endian,
}

/// Partitions announced by the target. Built once per session.
#[derive(Debug, Clone)]
pub struct PartitionTable {
    target: Target,
    partitions: Vec<Partition>,
}

/// The partition a pass works on.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Selection {
    pub index: u8,
    pub partition: Partition,
}

impl PartitionTable {
    pub fn new(target: Target, partitions: Vec<Partition>) -> Self {
        Self { target, partitions }
    }

    /// Announces `address` to the target and reads back its hello record
    /// followed by one descriptor per partition.
    pub async fn discover<L: Link>(
        link: &mut L,
        address: NodeAddress,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let mut hello = Transfer::write(true);
        hello.append_command(&Command::Hello(address), Endian::default());
        // the reply is awaited whether or not the announce went through
        let _ = link.execute(&mut hello, timeout).await?;

        let mut rq = Transfer::read(1);
        if link.execute(&mut rq, timeout).await? != TransferStatus::Completed {
            return Err(ProtocolError::Handshake.into());
        }
        let resp = HelloResp::parse(rq.packet(0).ok_or(ProtocolError::Handshake)?)?;

        log::info!("Target:     {}", resp.id);
        log::info!("Endianness: {}", resp.endian);
        log::info!("Partitions: {}", resp.num_parts);

        let count = resp.num_parts as usize;
        let mut partitions: Vec<Partition> = Vec::with_capacity(count);
        if count > 0 {
            let mut rq = Transfer::read(count);
            let status = link.execute(&mut rq, timeout).await?;
            if status != TransferStatus::Completed || rq.packet_count() < count {
                log::error!(
                    "partition table incomplete: {} of {}",
                    rq.packet_count(),
                    count
                );
                return Err(ProtocolError::Handshake.into());
            }

            for (index, packet) in rq.packets().iter().take(count).enumerate() {
                let header = PartitionHeader::parse(packet, resp.endian)?;
                log::info!(
                    "{}. {:>12}  size {:>8} iosize {} pad {}",
                    index,
                    header.name,
                    header.size,
                    header.io_size,
                    header.pad
                );
                let partition = Partition::from_header(index, &header)?;
                if partitions.iter().any(|p| p.name == partition.name) {
                    log::warn!("duplicate partition name {}", partition.name);
                }
                partitions.push(partition);
            }
        }

        let target = Target {
            id: resp.id.as_str().to_string(),
            endian: resp.endian,
        };
        Ok(Self::new(target, partitions))
    }

    #[inline]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[inline]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn select(&self, index: usize) -> Result<Selection, Error> {
        let out_of_range = Error::Index {
            index,
            len: self.partitions.len(),
        };
        let partition = self.partitions.get(index).ok_or(out_of_range)?;
        Ok(Selection {
            index: u8::try_from(index).map_err(|_| Error::Index {
                index,
                len: self.partitions.len(),
            })?,
            partition: partition.clone(),
        })
    }

    pub fn select_by_name(&self, name: &str) -> Result<Selection, Error> {
        self.partitions
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
            .and_then(|i| self.select(i))
    }

    /// Name first, then a numeric index.
    pub fn select_any(&self, part: &str) -> Result<Selection, Error> {
        match self.select_by_name(part) {
            Err(Error::NotFound(name)) => match part.parse::<usize>() {
                Ok(index) => self.select(index),
                Err(_) => Err(Error::NotFound(name)),
            },
            res => res,
        }
    }
}
