use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rf24boot_common::packets::Packet;
use rf24boot_common::MAX_PACKET_SIZE;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

use super::{Link, Mode, Transfer, TransferStatus};

pub fn from_datagram(data: &[u8]) -> Option<Packet> {
    match data.len() {
        0 => None,
        _ => Packet::try_from(data).ok(),
    }
}

/// Radio gateway reachable over UDP, one packet per datagram.
pub struct UdpLink {
    handler: JoinHandle<()>,
    rx: mpsc::Receiver<Packet>,
    socket: Arc<UdpSocket>,
    idle_gap: Duration,
}

impl UdpLink {
    /// `idle_gap` ends a read early once at least one packet arrived and
    /// the gateway stays quiet for that long.
    pub async fn open(
        bind: SocketAddr,
        gateway: SocketAddr,
        idle_gap: Duration,
    ) -> io::Result<UdpLink> {
        let socket = Arc::new(UdpSocket::bind(bind).await?);
        socket.connect(gateway).await?;

        let (tx, rx) = mpsc::channel(1000);
        let handler = tokio::spawn(Self::receiving(socket.clone(), tx));

        log::debug!("gateway {} via {}", gateway, socket.local_addr()?);

        Ok(Self {
            handler,
            rx,
            socket,
            idle_gap,
        })
    }

    async fn receiving(socket: Arc<UdpSocket>, sender: mpsc::Sender<Packet>) {
        let mut buf = [0u8; MAX_PACKET_SIZE + 1];
        loop {
            match socket.recv(&mut buf).await {
                Ok(len) => match from_datagram(&buf[..len]) {
                    Some(p) => {
                        if sender.send(p).await.is_err() {
                            break;
                        }
                    }
                    None => log::warn!("dropping {} byte datagram", len),
                },
                Err(e) => log::debug!("receiving {:?}", e),
            }
        }
    }

    async fn send_all(&self, transfer: &Transfer, deadline: Instant) -> io::Result<TransferStatus> {
        for packet in transfer.outgoing() {
            log::trace!("tx {}", hex::encode(packet));
            match timeout_at(deadline, self.socket.send(packet)).await {
                Ok(res) => {
                    res?;
                }
                Err(_) => return Ok(TransferStatus::TimedOut),
            }
        }
        Ok(TransferStatus::Completed)
    }

    async fn collect(
        &mut self,
        transfer: &mut Transfer,
        count: usize,
        deadline: Instant,
    ) -> io::Result<TransferStatus> {
        while transfer.packet_count() < count {
            let until = match transfer.packet_count() {
                0 => deadline,
                _ => deadline.min(Instant::now() + self.idle_gap),
            };
            match timeout_at(until, self.rx.recv()).await {
                Ok(Some(p)) => {
                    log::trace!("rx {}", hex::encode(&p));
                    transfer.receive(p);
                }
                Ok(None) => {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "gateway receiver stopped",
                    ))
                }
                Err(_elapsed) => break,
            }
        }

        Ok(match transfer.packet_count() {
            0 if count > 0 => TransferStatus::TimedOut,
            _ => TransferStatus::Completed,
        })
    }
}

impl Drop for UdpLink {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl Link for UdpLink {
    async fn execute(
        &mut self,
        transfer: &mut Transfer,
        timeout: Duration,
    ) -> io::Result<TransferStatus> {
        let deadline = Instant::now() + timeout;
        match transfer.mode() {
            Mode::Write { .. } => self.send_all(transfer, deadline).await,
            Mode::Read { count } => self.collect(transfer, count, deadline).await,
        }
    }
}
