mod config;
mod engine;
mod link;
mod progress;
mod ptable;
#[cfg(test)]
mod sim;
mod session;
mod store;
mod util;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use rf24boot_common::packets::node_address::NodeAddress;

use crate::config::{SessionConfig, Timeouts};
use crate::link::udp::UdpLink;
use crate::progress::Bar;
use crate::session::Session;

fn parse_address(value: &str) -> Result<NodeAddress, String> {
    NodeAddress::from_hex(value).map_err(|e| format!("{value}: {e}"))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Partition loader for rf24boot targets", long_about = None)]
struct Args {
    /// UDP gateway bridging to the radio
    #[arg(long, default_value = "127.0.0.1:2424")]
    gateway: SocketAddr,
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,
    /// Address the target answers on, 5 bytes of hex
    #[arg(long, default_value = "c0ffeec0de", value_parser = parse_address)]
    address: NodeAddress,
    /// Blocks per round trip
    #[arg(long, default_value_t = 16)]
    window: usize,
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    #[arg(long, default_value_t = 1000)]
    hello_timeout_ms: u64,
    #[arg(long, default_value_t = 15000)]
    write_timeout_ms: u64,
    #[arg(long, default_value_t = 5000)]
    read_timeout_ms: u64,
    #[arg(long, default_value_t = 2000)]
    verify_timeout_ms: u64,
    #[arg(long, default_value_t = 1000)]
    boot_timeout_ms: u64,
    #[arg(long, default_value_t = 100)]
    idle_gap_ms: u64,

    #[command(subcommand)]
    cmd: Cmd,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            window: self.window,
            timeouts: Timeouts {
                hello: Duration::from_millis(self.hello_timeout_ms),
                write: Duration::from_millis(self.write_timeout_ms),
                read: Duration::from_millis(self.read_timeout_ms),
                verify: Duration::from_millis(self.verify_timeout_ms),
                boot: Duration::from_millis(self.boot_timeout_ms),
            },
            idle_gap: Duration::from_millis(self.idle_gap_ms),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show the partition table
    List,
    /// Flash a file into a partition
    Write {
        /// Partition name or index
        part: String,
        file: PathBuf,
        /// Read the partition back and compare
        #[arg(long)]
        verify: bool,
        /// Start the partition afterwards
        #[arg(long)]
        boot: bool,
    },
    /// Dump a partition into a file
    Read { part: String, file: PathBuf },
    /// Compare a partition with a file
    Verify { part: String, file: PathBuf },
    /// Start the application in a partition
    Boot { part: String },
}

/// `Ok(false)` when verification found differences.
async fn run(args: Args) -> Result<bool, util::Error> {
    let config = args.session_config();
    if config.window == 0 {
        log::warn!("window of 0 blocks, nothing will be transferred");
    }

    let link = UdpLink::open(args.bind, args.gateway, config.idle_gap).await?;
    let mut session = Session::open(link, args.address, config).await?;

    match args.cmd {
        Cmd::List => {
            let target = session.table().target();
            println!("{} ({} endian)", target.id, target.endian);
            for (i, p) in session.table().partitions().iter().enumerate() {
                println!(
                    "{} {} size {} iosize {} pad {}",
                    i, p.name, p.geometry.size, p.geometry.io_size, p.geometry.pad
                );
            }
        }
        Cmd::Write {
            part,
            file,
            verify,
            boot,
        } => {
            let selection = session.table().select_any(&part)?;
            session.write(&selection, &file, &mut Bar::new()).await?;
            if verify {
                let report = session.verify(&selection, &file, &mut Bar::new()).await?;
                if report.failed() {
                    return Ok(false);
                }
            }
            if boot {
                session.boot(&selection).await?;
            }
        }
        Cmd::Read { part, file } => {
            let selection = session.table().select_any(&part)?;
            session.read(&selection, &file, &mut Bar::new()).await?;
        }
        Cmd::Verify { part, file } => {
            let selection = session.table().select_any(&part)?;
            let report = session.verify(&selection, &file, &mut Bar::new()).await?;
            return Ok(!report.failed());
        }
        Cmd::Boot { part } => {
            let selection = session.table().select_any(&part)?;
            session.boot(&selection).await?;
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();
    log::debug!("{:?}", args);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_write() {
        let args = Args::try_parse_from([
            "rf24boot",
            "--address",
            "0102030405",
            "--write-timeout-ms",
            "500",
            "write",
            "flash",
            "app.bin",
            "--verify",
        ])
        .unwrap();
        assert_eq!(args.address, NodeAddress::from([1, 2, 3, 4, 5]));
        assert_eq!(args.log_level, LevelFilter::Info);

        let config = args.session_config();
        assert_eq!(config.timeouts.write, Duration::from_millis(500));
        assert_eq!(config.timeouts.read, Duration::from_secs(5));
        assert_eq!(config.window, 16);

        match args.cmd {
            Cmd::Write {
                part, verify, boot, ..
            } => {
                assert_eq!(part, "flash");
                assert!(verify);
                assert!(!boot);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_address() {
        assert!(Args::try_parse_from(["rf24boot", "--address", "c0ffee", "list"]).is_err());
        assert!(Args::try_parse_from(["rf24boot", "--address", "zz00000000", "list"]).is_err());
    }
}
