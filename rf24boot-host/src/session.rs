use std::path::Path;

use rf24boot_common::packets::node_address::NodeAddress;

use crate::config::SessionConfig;
use crate::engine::{self, PassContext, VerifyReport, WriteSummary};
use crate::link::Link;
use crate::progress::Progress;
use crate::ptable::{PartitionTable, Selection};
use crate::store;
use crate::util::{Error, Pass};

/// A discovered target plus the link it was found on.
pub struct Session<L> {
    link: L,
    table: PartitionTable,
    config: SessionConfig,
}

impl<L: Link> Session<L> {
    pub async fn open(mut link: L, address: NodeAddress, config: SessionConfig) -> Result<Self, Error> {
        let table =
            PartitionTable::discover(&mut link, address, config.timeouts.for_pass(Pass::Hello))
                .await?;
        Ok(Self {
            link,
            table,
            config,
        })
    }

    #[inline]
    pub fn table(&self) -> &PartitionTable {
        &self.table
    }

    fn context<'a>(&self, selection: &'a Selection, pass: Pass) -> PassContext<'a> {
        PassContext::new(
            selection,
            self.table.target().endian,
            self.config.window,
            self.config.timeouts.for_pass(pass),
            pass,
        )
    }

    pub async fn write<P: Progress>(
        &mut self,
        selection: &Selection,
        path: &Path,
        progress: &mut P,
    ) -> Result<WriteSummary, Error> {
        let (mut file, len) = store::open_source(path).await?;
        let ctx = self.context(selection, Pass::Write);
        engine::write(&mut self.link, &ctx, &mut file, len, progress).await
    }

    pub async fn read<P: Progress>(
        &mut self,
        selection: &Selection,
        path: &Path,
        progress: &mut P,
    ) -> Result<u32, Error> {
        let mut file = store::create_destination(path).await?;
        let ctx = self.context(selection, Pass::Read);
        engine::read(&mut self.link, &ctx, &mut file, progress).await
    }

    pub async fn verify<P: Progress>(
        &mut self,
        selection: &Selection,
        path: &Path,
        progress: &mut P,
    ) -> Result<VerifyReport, Error> {
        let (mut file, len) = store::open_source(path).await?;
        let ctx = self.context(selection, Pass::Verify);
        engine::verify(&mut self.link, &ctx, &mut file, len, progress).await
    }

    pub async fn boot(&mut self, selection: &Selection) -> Result<(), Error> {
        let ctx = self.context(selection, Pass::Boot);
        engine::boot(&mut self.link, &ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf24boot_common::endian::Endian;

    use crate::progress::tests::Silent;
    use crate::sim::SimTarget;

    async fn open() -> Session<SimTarget> {
        let sim = SimTarget::new(Endian::Little)
            .with_partition("eeprom", 256, 16, 1)
            .with_partition("flash", 4096, 64, 128);
        Session::open(sim, NodeAddress::from([0xc0, 0xff, 0xee, 0xc0, 0xde]), SessionConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn file_round_trip() {
        let mut session = open().await;
        let dir = std::env::temp_dir().join(format!("rf24boot-session-{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("image.bin");
        let dump = dir.join("dump.bin");
        let data: Vec<u8> = (0..300).map(|_| rand::random()).collect();
        std::fs::write(&image, &data).unwrap();

        let flash = session.table().select_any("flash").unwrap();
        let summary = session.write(&flash, &image, &mut Silent).await.unwrap();
        assert_eq!(summary.written, 300);

        let report = session.verify(&flash, &image, &mut Silent).await.unwrap();
        assert!(!report.failed());

        assert_eq!(session.read(&flash, &dump, &mut Silent).await.unwrap(), 4096);
        let out = std::fs::read(&dump).unwrap();
        assert_eq!(&out[..300], &data[..]);

        session.boot(&flash).await.unwrap();
        assert_eq!(session.link.booted, Some(1));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_source() {
        let mut session = open().await;
        let eeprom = session.table().select_any("0").unwrap();
        let path = Path::new("/nonexistent/rf24boot/image.bin");

        let res = session.write(&eeprom, path, &mut Silent).await;
        assert!(matches!(res, Err(Error::CannotOpen { .. })));
        let res = session.verify(&eeprom, path, &mut Silent).await;
        assert!(matches!(res, Err(Error::CannotOpen { .. })));
        // nothing went out after discovery
        assert_eq!(session.link.received.len(), 1);
    }
}
