use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::MetricsError;

use super::accumulator::MetricsAccumulator;
use super::reader::IncrementalLineReader;

/// Follows the engine's growing output artifact and folds new lines.
#[derive(Debug)]
pub struct ArtifactTail {
    path: PathBuf,
    reader: IncrementalLineReader,
}

impl ArtifactTail {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: IncrementalLineReader::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.reader.offset()
    }

    /// Reads whatever was appended since the last call and folds the
    /// completed lines. Returns the number of recognized samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact exists but cannot be read.
    pub async fn poll(&mut self, accumulator: &mut MetricsAccumulator) -> Result<usize, MetricsError> {
        let Some(chunk) = read_appended(&self.path, self.reader.offset()).await? else {
            return Ok(0);
        };
        let lines = self.reader.feed(&chunk);
        Ok(accumulator.fold_lines(lines))
    }

    /// Reads to end of file and flushes the trailing fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact exists but cannot be read.
    pub async fn drain(&mut self, accumulator: &mut MetricsAccumulator) -> Result<usize, MetricsError> {
        let mut folded = self.poll(accumulator).await?;
        if let Some(fragment) = self.reader.finish()
            && accumulator.fold_line(&fragment)
        {
            folded = folded.saturating_add(1);
        }
        Ok(folded)
    }
}

/// Bytes appended to `path` past `offset`, or `None` when the file is
/// missing or has not grown.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened or read.
pub async fn read_appended(path: &Path, offset: u64) -> Result<Option<Vec<u8>>, MetricsError> {
    let len = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(MetricsError::Io {
                context: "stat output artifact",
                source: err,
            });
        }
    };
    if len <= offset {
        return Ok(None);
    }

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|err| MetricsError::Io {
            context: "open output artifact",
            source: err,
        })?;
    file.seek(SeekFrom::Start(offset))
        .await
        .map_err(|err| MetricsError::Io {
            context: "seek output artifact",
            source: err,
        })?;

    let wanted = len.saturating_sub(offset);
    let mut chunk = Vec::with_capacity(usize::try_from(wanted).unwrap_or(0));
    file.take(wanted)
        .read_to_end(&mut chunk)
        .await
        .map_err(|err| MetricsError::Io {
            context: "read output artifact",
            source: err,
        })?;
    Ok(Some(chunk))
}
