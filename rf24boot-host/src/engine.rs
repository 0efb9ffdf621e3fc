//! Write, read, verify and boot passes over a selected partition.
//!
//! Each pass is a sequence of blocking round trips. Nothing is retried: the
//! first timeout ends the pass and whatever the target already accepted
//! stays written.

use std::time::{Duration, Instant};

use rf24boot_common::endian::Endian;
use rf24boot_common::opcode::Opcode;
use rf24boot_common::packets::block::{BlockHeader, DataBlock};
use rf24boot_common::packets::Command;
use rf24boot_common::window::{self, Geometry};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::link::{Link, Transfer, TransferStatus};
use crate::progress::Progress;
use crate::ptable::Selection;
use crate::store;
use crate::util::{Error, Pass, ProtocolError};

/// Everything a single pass needs to know, carried explicitly.
pub struct PassContext<'a> {
    pub selection: &'a Selection,
    pub endian: Endian,
    pub window: usize,
    pub timeout: Duration,
    pass: Pass,
    started: Instant,
}

impl<'a> PassContext<'a> {
    pub fn new(
        selection: &'a Selection,
        endian: Endian,
        window: usize,
        timeout: Duration,
        pass: Pass,
    ) -> Self {
        Self {
            selection,
            endian,
            window,
            timeout,
            pass,
            started: Instant::now(),
        }
    }

    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.selection.partition.geometry
    }

    #[inline]
    fn part(&self) -> u8 {
        self.selection.index
    }

    #[inline]
    fn name(&self) -> &str {
        &self.selection.partition.name
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn unfit(&self) -> Error {
        ProtocolError::PartitionTable {
            index: self.part() as usize,
            reason: "ioSize does not fit a packet",
        }
        .into()
    }

    fn block(&self, address: u32, data: &[u8]) -> Result<DataBlock, Error> {
        let header = BlockHeader::new(self.part(), address);
        DataBlock::new(header, data, self.geometry().io_size as usize).ok_or_else(|| self.unfit())
    }

    fn filler(&self, address: u32) -> Result<DataBlock, Error> {
        let header = BlockHeader::new(self.part(), address);
        DataBlock::filler(header, self.geometry().io_size as usize).ok_or_else(|| self.unfit())
    }

    async fn round_trip<L: Link>(&self, link: &mut L, transfer: &mut Transfer) -> Result<(), Error> {
        match link.execute(transfer, self.timeout).await? {
            TransferStatus::Completed => Ok(()),
            TransferStatus::TimedOut => Err(ProtocolError::Timeout(self.pass).into()),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct WriteSummary {
    /// Source bytes stored on the target.
    pub written: u32,
    /// Device address after the last data or filler block.
    pub end_address: u32,
    pub blocks: usize,
    pub padding_blocks: usize,
}

/// Streams `source` into the selected partition, then pads the tail with
/// filler up to the pad modulus in a final synchronous round trip.
pub async fn write<L, R, P>(
    link: &mut L,
    ctx: &PassContext<'_>,
    source: &mut R,
    source_len: u64,
    progress: &mut P,
) -> Result<WriteSummary, Error>
where
    L: Link,
    R: AsyncRead + Unpin,
    P: Progress,
{
    let g = *ctx.geometry();
    let io_size = g.io_size as usize;
    let to_write = source_len.min(g.size as u64) as u32;
    log::info!(
        "Writing partition {}: {}/{} bytes",
        ctx.name(),
        source_len,
        g.size
    );

    let mut summary = WriteSummary::default();
    let mut chunk = vec![0u8; io_size];
    let mut exhausted = false;

    while !exhausted {
        let queue = window::blocks_to_queue(summary.end_address, &g, ctx.window);
        if queue == 0 {
            break;
        }

        let mut transfer = Transfer::write(false);
        for _ in 0..queue {
            let want = io_size.min((to_write - summary.written) as usize);
            let len = match want {
                0 => 0,
                _ => store::read_chunk(source, &mut chunk[..want]).await?,
            };
            if len == 0 {
                exhausted = true;
                break;
            }

            let block = ctx.block(summary.end_address, &chunk[..len])?;
            transfer.append_command(&Command::Write(block), ctx.endian);
            summary.written += len as u32;
            summary.end_address += g.io_size;
            summary.blocks += 1;

            if len < io_size {
                exhausted = true;
                break;
            }
        }
        if transfer.outgoing().is_empty() {
            break;
        }

        ctx.round_trip(link, &mut transfer).await?;
        progress.update(summary.written as u64, to_write as u64, ctx.elapsed());
    }

    if summary.written < to_write {
        log::warn!("only {} of {} bytes written", summary.written, to_write);
    }

    summary.padding_blocks = window::padding_blocks(summary.written, summary.end_address, &g);
    let mut transfer = Transfer::write(true);
    for _ in 0..summary.padding_blocks {
        let filler = ctx.filler(summary.end_address)?;
        transfer.append_command(&Command::Write(filler), ctx.endian);
        summary.end_address += g.io_size;
    }
    ctx.round_trip(link, &mut transfer).await?;

    log::debug!("{:?}", summary);
    progress.update(summary.written as u64, to_write as u64, ctx.elapsed());
    progress.finish();
    Ok(summary)
}

trait BlockSink {
    async fn consume(&mut self, block: &DataBlock) -> Result<(), Error>;
}

/// Asks the target for the whole partition and hands every returned block
/// to `sink` until the last block of the partition shows up.
async fn stream_blocks<L, S, P>(
    link: &mut L,
    ctx: &PassContext<'_>,
    total: u32,
    sink: &mut S,
    progress: &mut P,
) -> Result<u32, Error>
where
    L: Link,
    S: BlockSink,
    P: Progress,
{
    let g = *ctx.geometry();

    let mut transfer = Transfer::write(true);
    transfer.append_command(
        &Command::Read(BlockHeader::new(ctx.part(), g.size)),
        ctx.endian,
    );
    ctx.round_trip(link, &mut transfer).await?;

    let mut next = 0u32;
    let mut received = 0u32;
    loop {
        let queue = window::blocks_to_queue(next, &g, ctx.window);
        if queue == 0 {
            break;
        }

        let mut transfer = Transfer::read(queue);
        ctx.round_trip(link, &mut transfer).await?;
        if transfer.packet_count() == 0 {
            return Err(ProtocolError::Stalled(ctx.pass).into());
        }

        let mut last = false;
        for packet in transfer.packets() {
            let block = DataBlock::parse(Opcode::Read, packet, ctx.endian, g.io_size as usize)?;
            if block.address() != next || block.header.part != ctx.part() {
                log::warn!(
                    "expected block {:#x} of partition {}, got {:#x} of {}",
                    next,
                    ctx.part(),
                    block.address(),
                    block.header.part
                );
            }

            sink.consume(&block).await?;
            received = received.saturating_add(g.io_size);
            next = block.address().saturating_add(g.io_size);

            if window::is_last_block(block.address(), &g) {
                last = true;
                break;
            }
        }

        progress.update(next.min(total) as u64, total as u64, ctx.elapsed());
        if last {
            break;
        }
    }

    Ok(received)
}

struct Dump<'w, W> {
    dest: &'w mut W,
}

impl<W: AsyncWrite + Unpin> BlockSink for Dump<'_, W> {
    async fn consume(&mut self, block: &DataBlock) -> Result<(), Error> {
        self.dest.write_all(block).await?;
        Ok(())
    }
}

/// Copies the selected partition into `dest`. Returns the bytes stored.
pub async fn read<L, W, P>(
    link: &mut L,
    ctx: &PassContext<'_>,
    dest: &mut W,
    progress: &mut P,
) -> Result<u32, Error>
where
    L: Link,
    W: AsyncWrite + Unpin,
    P: Progress,
{
    let size = ctx.geometry().size;
    log::info!("Reading partition {}: {} bytes", ctx.name(), size);

    let mut sink = Dump { dest };
    let received = stream_blocks(link, ctx, size, &mut sink, progress).await?;
    sink.dest.flush().await?;

    progress.finish();
    Ok(received)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Mismatch {
    pub offset: u64,
    pub expected: u8,
    pub actual: u8,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct VerifyReport {
    /// Only the first difference is kept, later ones are counted.
    pub first_mismatch: Option<Mismatch>,
    pub mismatched_bytes: u64,
    pub compared: u64,
}

impl VerifyReport {
    #[inline]
    pub fn failed(&self) -> bool {
        self.first_mismatch.is_some()
    }

    fn record(&mut self, mismatch: Mismatch) {
        if self.first_mismatch.is_none() {
            log::error!(
                "Verification failed at offset {:#x}: {:#04x} != {:#04x}",
                mismatch.offset,
                mismatch.expected,
                mismatch.actual
            );
            log::error!("Suppressing further errors");
            self.first_mismatch = Some(mismatch);
        }
        self.mismatched_bytes += 1;
    }
}

struct Verifier<'r, R> {
    source: &'r mut R,
    to_verify: u64,
    chunk: Vec<u8>,
    report: VerifyReport,
}

impl<R: AsyncRead + Unpin> BlockSink for Verifier<'_, R> {
    async fn consume(&mut self, block: &DataBlock) -> Result<(), Error> {
        let len = store::read_chunk(&mut *self.source, &mut self.chunk).await?;
        let base = block.address() as u64;
        for (j, (expected, actual)) in self.chunk[..len].iter().zip(block.iter()).enumerate() {
            let offset = base + j as u64;
            if offset >= self.to_verify {
                break;
            }
            self.report.compared += 1;
            if expected != actual {
                self.report.record(Mismatch {
                    offset,
                    expected: *expected,
                    actual: *actual,
                });
            }
        }
        Ok(())
    }
}

/// Compares the selected partition with `source`, byte for byte, up to
/// the shorter of the two.
pub async fn verify<L, R, P>(
    link: &mut L,
    ctx: &PassContext<'_>,
    source: &mut R,
    source_len: u64,
    progress: &mut P,
) -> Result<VerifyReport, Error>
where
    L: Link,
    R: AsyncRead + Unpin,
    P: Progress,
{
    let g = *ctx.geometry();
    let to_verify = source_len.min(g.size as u64) as u32;
    log::info!(
        "Verifying partition {}, {} bytes to verify",
        ctx.name(),
        to_verify
    );

    let mut verifier = Verifier {
        source,
        to_verify: to_verify as u64,
        chunk: vec![0u8; g.io_size as usize],
        report: VerifyReport::default(),
    };
    stream_blocks(link, ctx, to_verify, &mut verifier, progress).await?;
    progress.finish();

    let report = verifier.report;
    if report.failed() {
        log::error!(
            "{} of {} bytes differ",
            report.mismatched_bytes,
            report.compared
        );
    }
    Ok(report)
}

/// Tells the target to start the selected partition. There is no reply.
pub async fn boot<L: Link>(link: &mut L, ctx: &PassContext<'_>) -> Result<(), Error> {
    let mut transfer = Transfer::write(true);
    transfer.append_command(&Command::Boot(ctx.part()), ctx.endian);
    ctx.round_trip(link, &mut transfer).await?;

    log::info!("Starting app in partition {} ({})...", ctx.part(), ctx.name());
    Ok(())
}
