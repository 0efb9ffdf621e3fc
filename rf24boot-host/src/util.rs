use std::path::PathBuf;

use rf24boot_common::packets::ParseError;

/// Which exchange a round trip belonged to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Pass {
    Hello,
    Write,
    Read,
    Verify,
    Boot,
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Pass::Hello => "hello",
            Pass::Write => "write",
            Pass::Read => "read",
            Pass::Verify => "verify",
            Pass::Boot => "boot",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("handshake failed")]
    Handshake,
    #[error("{0} round trip timed out")]
    Timeout(Pass),
    #[error("{0} stream stalled")]
    Stalled(Pass),
    #[error("malformed packet: {0}")]
    Malformed(ParseError),
    #[error("bad partition table entry {index}: {reason}")]
    PartitionTable { index: usize, reason: &'static str },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("no such partition: {0}")]
    NotFound(String),
    #[error("partition index {index} out of range ({len} partitions)")]
    Index { index: usize, len: usize },
    #[error("can't open {}: {source}", .path.display())]
    CannotOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Protocol(ProtocolError::Malformed(e))
    }
}
