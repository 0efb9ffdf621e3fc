use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::util::Error;

/// Opens `path` for reading, returning the file and its length.
pub async fn open_source(path: &Path) -> Result<(File, u64), Error> {
    let cannot_open = |source| Error::CannotOpen {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).await.map_err(cannot_open)?;
    let len = file.metadata().await.map_err(cannot_open)?.len();
    Ok((file, len))
}

/// Creates or truncates `path`.
pub async fn create_destination(path: &Path) -> Result<File, Error> {
    File::create(path).await.map_err(|source| Error::CannotOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads until `buf` is full or the source is exhausted.
pub async fn read_chunk<R: AsyncRead + Unpin>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn chunks() {
        let mut source = Cursor::new((0u8..10).collect::<Vec<_>>());
        let mut buf = [0u8; 4];
        assert_eq!(read_chunk(&mut source, &mut buf).await.unwrap(), 4);
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(read_chunk(&mut source, &mut buf).await.unwrap(), 4);
        assert_eq!(read_chunk(&mut source, &mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], &[8, 9]);
        assert_eq!(read_chunk(&mut source, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn short_reads_are_joined() {
        let (mut tx, mut rx) = tokio::io::duplex(2);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            tx.write_all(&[1, 2, 3, 4, 5]).await.unwrap();
        });
        let mut buf = [0u8; 5];
        assert_eq!(read_chunk(&mut rx, &mut buf).await.unwrap(), 5);
        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn missing_source() {
        let path = Path::new("/nonexistent/rf24boot/image.bin");
        match open_source(path).await {
            Err(Error::CannotOpen { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other.map(|(_, len)| len)),
        }
        assert!(matches!(
            create_destination(path).await,
            Err(Error::CannotOpen { .. })
        ));
    }
}
