// MinIO Rust Library for Amazon S3 Compatible Cloud Storage
// Copyright 2024 MinIO, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Payload sources for uploads

use crate::s3::segmented_bytes::SegmentedBytes;
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Read size used when streaming a file.
const FILE_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Boxed stream of payload pieces, in order.
pub type BlockStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Declared payload length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Size {
    Known(u64),
    #[default]
    Unknown,
}

impl Size {
    pub fn known(self) -> Option<u64> {
        match self {
            Size::Known(v) => Some(v),
            Size::Unknown => None,
        }
    }
}

impl From<u64> for Size {
    fn from(value: u64) -> Self {
        Size::Known(value)
    }
}

impl From<Option<u64>> for Size {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Size::Unknown, Size::Known)
    }
}

enum Source {
    Buffer(SegmentedBytes),
    File(PathBuf),
    Stream(BlockStream, Size),
}

/// Payload of an upload: an in-memory buffer, a file, or a stream with a
/// declared size. It is consumed once, front to back.
pub struct ObjectContent {
    source: Source,
}

impl Default for ObjectContent {
    fn default() -> Self {
        SegmentedBytes::new().into()
    }
}

impl From<SegmentedBytes> for ObjectContent {
    fn from(value: SegmentedBytes) -> Self {
        ObjectContent {
            source: Source::Buffer(value),
        }
    }
}

impl From<Bytes> for ObjectContent {
    fn from(value: Bytes) -> Self {
        SegmentedBytes::from(value).into()
    }
}

impl From<Vec<u8>> for ObjectContent {
    fn from(value: Vec<u8>) -> Self {
        Bytes::from(value).into()
    }
}

impl From<String> for ObjectContent {
    fn from(value: String) -> Self {
        Bytes::from(value).into()
    }
}

impl From<&'static [u8]> for ObjectContent {
    fn from(value: &'static [u8]) -> Self {
        Bytes::from_static(value).into()
    }
}

impl From<&'static str> for ObjectContent {
    fn from(value: &'static str) -> Self {
        Bytes::from_static(value.as_bytes()).into()
    }
}

impl From<PathBuf> for ObjectContent {
    fn from(value: PathBuf) -> Self {
        ObjectContent {
            source: Source::File(value),
        }
    }
}

impl From<&Path> for ObjectContent {
    fn from(value: &Path) -> Self {
        value.to_path_buf().into()
    }
}

impl ObjectContent {
    /// Content read from `r`, which must yield exactly `size` bytes when the
    /// size is known.
    pub fn new_from_stream(
        r: impl Stream<Item = io::Result<Bytes>> + Send + 'static,
        size: impl Into<Size>,
    ) -> Self {
        ObjectContent {
            source: Source::Stream(Box::pin(r), size.into()),
        }
    }

    /// Opens the source. Files are opened here and report their length from
    /// metadata.
    pub async fn into_blocks(self) -> io::Result<(BlockStream, Size)> {
        match self.source {
            Source::Buffer(sb) => {
                let size = Size::Known(sb.len() as u64);
                let blocks: BlockStream = Box::pin(stream::iter(sb.into_iter().map(Ok)));
                Ok((blocks, size))
            }
            Source::File(path) => {
                let mut file = tokio::fs::File::open(&path).await?;
                let size = Size::Known(file.metadata().await?.len());
                let blocks: BlockStream = Box::pin(async_stream::try_stream! {
                    let mut buf = vec![0u8; FILE_READ_BUFFER_SIZE];
                    loop {
                        let n = file.read(&mut buf).await?;
                        if n == 0 {
                            break;
                        }
                        yield Bytes::copy_from_slice(&buf[..n]);
                    }
                });
                Ok((blocks, size))
            }
            Source::Stream(blocks, size) => Ok((blocks, size)),
        }
    }

    pub(crate) async fn into_reader(self) -> io::Result<PayloadReader> {
        let (blocks, size) = self.into_blocks().await?;
        Ok(PayloadReader::new(blocks, size))
    }

    /// Writes the whole content to `path` and returns the number of bytes
    /// written.
    ///
    /// Data goes to a hidden temporary file next to `path` that is renamed
    /// over it once complete, so readers never see a partial file. Missing
    /// parent directories are created.
    pub async fn save_to(self, path: &Path) -> io::Result<u64> {
        let file_name = path
            .file_name()
            .ok_or_else(|| io::Error::other(format!("{path:?} does not name a file")))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        tokio::fs::create_dir_all(dir).await?;

        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(file_name);
        tmp_name.push(format!(".{:016x}.tmp", rand::rng().random::<u64>()));
        let tmp_path = dir.join(tmp_name);

        let result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            let (mut blocks, _) = self.into_blocks().await?;
            let mut written = 0u64;
            while let Some(block) = blocks.next().await {
                let block = block?;
                file.write_all(&block).await?;
                written += block.len() as u64;
            }
            file.sync_all().await?;
            Ok::<_, io::Error>(written)
        }
        .await;

        match result {
            Ok(written) => {
                tokio::fs::rename(&tmp_path, path).await?;
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                Err(e)
            }
        }
    }
}

/// Pulls a payload in blocks of a requested size, however the underlying
/// stream happens to split it.
pub struct PayloadReader {
    blocks: BlockStream,
    pending: Bytes,
    size: Size,
}

impl PayloadReader {
    pub fn new(blocks: BlockStream, size: Size) -> Self {
        Self {
            blocks,
            pending: Bytes::new(),
            size,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns up to `max` bytes. The result is shorter only at the end of the
    /// payload, and empty once it is exhausted.
    pub async fn next_block(&mut self, max: usize) -> io::Result<SegmentedBytes> {
        let mut block = SegmentedBytes::new();
        while block.len() < max {
            if self.pending.is_empty() {
                match self.blocks.next().await {
                    Some(piece) => self.pending = piece?,
                    None => break,
                }
                continue;
            }
            let take = self.pending.len().min(max - block.len());
            block.append(self.pending.split_to(take));
        }
        Ok(block)
    }

    /// `true` when no payload bytes remain.
    pub async fn is_exhausted(&mut self) -> io::Result<bool> {
        while self.pending.is_empty() {
            match self.blocks.next().await {
                Some(piece) => self.pending = piece?,
                None => return Ok(true),
            }
        }
        Ok(false)
    }
}
