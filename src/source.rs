//! Decompressing byte source over a bzip2 archive.
//!
//! The archive is decoded block by block as the parser pulls bytes, so only
//! the decoder's working set and one read buffer are ever resident. Streams
//! concatenated in one file (multistream dumps) are decoded back to back.

use crate::config::DECODE_BUFFER_SIZE;
use crate::error::DumpError;
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Carried inside an `io::Error` so the parser can tell a bad block apart
/// from an ordinary read failure.
#[derive(Debug, Error)]
#[error("compressed block failed to decode after {offset} decompressed bytes: {source}")]
pub struct CorruptBlock {
    pub offset: u64,
    #[source]
    pub source: io::Error,
}

/// Forward-only byte stream decoded on demand from a compressed archive.
pub struct ArchiveSource<R: Read = BufReader<File>> {
    decoder: MultiBzDecoder<R>,
    path: PathBuf,
    decoded: u64,
}

impl ArchiveSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DumpError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DumpError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Opened compressed archive");
        Ok(Self::from_reader(
            BufReader::with_capacity(DECODE_BUFFER_SIZE, file),
            path,
        ))
    }
}

impl<R: Read> ArchiveSource<R> {
    /// Wraps an already-open compressed stream; `path` is only used in errors.
    pub fn from_reader(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            decoder: MultiBzDecoder::new(reader),
            path: path.into(),
            decoded: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decompressed bytes handed out so far.
    pub fn decoded_bytes(&self) -> u64 {
        self.decoded
    }
}

impl<R: Read> Read for ArchiveSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.decoder.read(buf) {
            Ok(n) => {
                self.decoded += n as u64;
                Ok(n)
            }
            Err(e) if is_decode_failure(&e) => {
                warn!(offset = self.decoded, error = %e, "Archive block failed to decode");
                Err(io::Error::new(
                    ErrorKind::InvalidData,
                    CorruptBlock {
                        offset: self.decoded,
                        source: e,
                    },
                ))
            }
            Err(e) => Err(e),
        }
    }
}

fn is_decode_failure(e: &io::Error) -> bool {
    if e.get_ref().is_some_and(|inner| inner.is::<bzip2::Error>()) {
        return true;
    }
    // Truncated archives surface as an early EOF from the decoder.
    matches!(
        e.kind(),
        ErrorKind::UnexpectedEof | ErrorKind::InvalidData | ErrorKind::InvalidInput
    )
}

/// Maps an I/O error raised while pulling from an archive into the taxonomy.
pub fn classify_read_error(e: &io::Error, path: &Path) -> DumpError {
    if let Some(block) = e.get_ref().and_then(|inner| inner.downcast_ref::<CorruptBlock>()) {
        return DumpError::CorruptArchive {
            offset: block.offset,
            message: block.source.to_string(),
        };
    }
    DumpError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(e.kind(), e.to_string()),
    }
}
