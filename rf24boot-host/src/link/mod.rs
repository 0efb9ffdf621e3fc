pub mod udp;

use std::time::Duration;

use rf24boot_common::endian::Endian;
use rf24boot_common::packets::{Command, Packet};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    /// Send the outgoing batch. `sync` waits until the link has flushed it.
    Write { sync: bool },
    /// Collect up to `count` packets from the target.
    Read { count: usize },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferStatus {
    Completed,
    TimedOut,
}

/// One round trip worth of packets.
#[derive(Debug, Clone)]
pub struct Transfer {
    mode: Mode,
    outgoing: Vec<Packet>,
    incoming: Vec<Packet>,
}

impl Transfer {
    pub fn write(sync: bool) -> Self {
        Self {
            mode: Mode::Write { sync },
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub fn read(count: usize) -> Self {
        Self {
            mode: Mode::Read { count },
            outgoing: Vec::new(),
            incoming: Vec::with_capacity(count),
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn append(&mut self, packet: Packet) {
        self.outgoing.push(packet);
    }

    pub fn append_command(&mut self, command: &Command, endian: Endian) {
        self.append(command.raw_packet(endian));
    }

    #[inline]
    pub fn outgoing(&self) -> &[Packet] {
        &self.outgoing
    }

    /// Called by links for every packet that arrives during a read.
    pub fn receive(&mut self, packet: Packet) {
        self.incoming.push(packet);
    }

    #[inline]
    pub fn packet_count(&self) -> usize {
        self.incoming.len()
    }

    #[inline]
    pub fn packet(&self, index: usize) -> Option<&Packet> {
        self.incoming.get(index)
    }

    #[inline]
    pub fn packets(&self) -> &[Packet] {
        &self.incoming
    }
}

/// Packet transport towards the target.
///
/// `execute` blocks the pass until the batch is sent (writes) or the
/// requested packets arrived (reads). A read that got fewer packets than
/// asked for still completes; `TimedOut` means the link gave up.
#[allow(async_fn_in_trait)]
pub trait Link {
    async fn execute(
        &mut self,
        transfer: &mut Transfer,
        timeout: Duration,
    ) -> std::io::Result<TransferStatus>;
}
