// MinIO Rust Library for Amazon S3 Compatible Cloud Storage
// Copyright 2025 MinIO, Inc.
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

//! AWS Chunked encoding with a signed trailing checksum.
//!
//! This module implements the `aws-chunked` content encoding used by
//! `STREAMING-UNSIGNED-PAYLOAD-TRAILER` uploads. Frame data is not hashed;
//! every frame signature chains from the previous one and the body ends with
//! a CRC32 checksum trailer carrying its own signature.
//!
//! ```text
//! <hex-chunk-size>;chunk-signature=<sig>\r\n
//! <chunk-data>\r\n
//! ...
//! 0;chunk-signature=<final-sig>\r\n
//! x-amz-checksum-crc32:<base64-value>\r\n
//! x-amz-trailer-signature:<trailer-sig>\r\n
//! \r\n
//! ```
//!
//! # Wire Format vs Canonical Form
//!
//! The trailer is sent with `\r\n` line endings, but its signature is computed
//! over the canonical form terminated by a single `\n`:
//! ```text
//! hash('x-amz-checksum-crc32:AAAAAA==\n')
//! ```
//!
//! The encoded body is also a valid HTTP/1.1 chunked body (chunk extensions
//! and a trailer section), so the same bytes are sent whether the request
//! declares `Content-Length` or `Transfer-Encoding: chunked`.
//!
//! Reference: <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming-trailers.html>

use crate::s3::error::Error;
use crate::s3::header_constants::{X_AMZ_CHECKSUM_CRC32, X_AMZ_TRAILER_SIGNATURE};
use crate::s3::segmented_bytes::SegmentedBytes;
use crate::s3::signer::{SignatureChain, TrailerSigner};
use crate::s3::utils::b64_encode;
use bytes::Bytes;
use crc_fast::{CrcAlgorithm, Digest as CrcFastDigest};

/// Default chunk size for aws-chunked encoding (64 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// `;chunk-signature=` (17) plus 64 hex characters.
const SIGNATURE_OVERHEAD: u64 = 81;

/// `0;chunk-signature=<64-hex>\r\n`
const FINAL_CHUNK_LEN: u64 = 1 + SIGNATURE_OVERHEAD + 2;

/// Base64 of a 4 byte CRC32.
const CRC32_B64_LEN: u64 = 8;

/// Incremental CRC32 (ISO-HDLC) over the decoded payload.
struct Crc32Hasher(CrcFastDigest);

impl Crc32Hasher {
    fn new() -> Self {
        Self(CrcFastDigest::new(CrcAlgorithm::Crc32IsoHdlc))
    }

    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self) -> String {
        // crc-fast returns u64; CRC32 needs cast to u32
        b64_encode((self.0.finalize() as u32).to_be_bytes())
    }
}

enum EncoderState {
    /// Emitting signed data chunks
    Streaming(SignatureChain),
    /// Final chunk written, trailer pending
    Trailer(TrailerSigner),
    Done,
}

impl EncoderState {
    fn name(&self) -> &'static str {
        match self {
            EncoderState::Streaming(_) => "streaming",
            EncoderState::Trailer(_) => "awaiting trailer",
            EncoderState::Done => "done",
        }
    }
}

/// Counters of one encoded body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkedStats {
    /// Payload bytes consumed.
    pub decoded_length: u64,
    /// Bytes produced, including framing and trailer.
    pub encoded_length: u64,
    /// Data frames produced, not counting the final zero-length frame.
    pub data_frames: u64,
    /// Base64 CRC32 of the payload, available once the trailer is produced.
    pub checksum: Option<String>,
}

/// Signed aws-chunked encoder for STREAMING-UNSIGNED-PAYLOAD-TRAILER.
///
/// Owns the [`SignatureChain`] of the request. Call [`encode_chunk`] for every
/// payload block, then [`final_chunk`] once and [`trailer`] once. Calls out of
/// that order fail with [`Error::InvalidState`] and leave the encoder unchanged.
///
/// [`encode_chunk`]: SignedChunkEncoder::encode_chunk
/// [`final_chunk`]: SignedChunkEncoder::final_chunk
/// [`trailer`]: SignedChunkEncoder::trailer
pub struct SignedChunkEncoder {
    state: EncoderState,
    hasher: Option<Crc32Hasher>,
    stats: ChunkedStats,
}

impl SignedChunkEncoder {
    pub fn new(chain: SignatureChain) -> Self {
        Self {
            state: EncoderState::Streaming(chain),
            hasher: Some(Crc32Hasher::new()),
            stats: ChunkedStats::default(),
        }
    }

    /// Frames one payload block as `<hex-size>;chunk-signature=<sig>\r\n<data>\r\n`.
    ///
    /// The block is not copied; the returned segments reference it. The block
    /// must not be empty.
    pub fn encode_chunk(&mut self, data: SegmentedBytes) -> Result<SegmentedBytes, Error> {
        if data.is_empty() {
            return Err(Error::InvalidState(
                "data frame must not be empty; a zero-length frame ends the body".into(),
            ));
        }
        let state_name = self.state.name();
        let EncoderState::Streaming(chain) = &mut self.state else {
            return Err(Error::InvalidState(format!(
                "data frame cannot be encoded while {state_name}"
            )));
        };

        if let Some(hasher) = self.hasher.as_mut() {
            for bytes in data.iter() {
                hasher.update(bytes);
            }
        }
        let signature = chain.next_chunk();

        let mut frame = SegmentedBytes::new();
        frame.append(Bytes::from(format!(
            "{:x};chunk-signature={}\r\n",
            data.len(),
            signature
        )));
        let data_len = data.len() as u64;
        frame.extend(data);
        frame.append(Bytes::from_static(b"\r\n"));

        self.stats.decoded_length += data_len;
        self.stats.encoded_length += frame.len() as u64;
        self.stats.data_frames += 1;
        log::trace!(
            "frame {}: {} bytes, signature {}",
            self.stats.data_frames,
            data_len,
            signature
        );
        Ok(frame)
    }

    /// Produces the zero-length frame `0;chunk-signature=<sig>\r\n`.
    pub fn final_chunk(&mut self) -> Result<Bytes, Error> {
        match std::mem::replace(&mut self.state, EncoderState::Done) {
            EncoderState::Streaming(chain) => {
                let signer = chain.finish();
                let final_chunk = format!("0;chunk-signature={}\r\n", signer.terminal_signature());
                self.state = EncoderState::Trailer(signer);
                self.stats.encoded_length += final_chunk.len() as u64;
                Ok(Bytes::from(final_chunk))
            }
            other => {
                let err = Error::InvalidState(format!(
                    "final chunk cannot be encoded while {}",
                    other.name()
                ));
                self.state = other;
                Err(err)
            }
        }
    }

    /// Produces the checksum trailer, the trailer signature and the blank
    /// line ending the body.
    pub fn trailer(&mut self) -> Result<Bytes, Error> {
        match std::mem::replace(&mut self.state, EncoderState::Done) {
            EncoderState::Trailer(signer) => {
                let checksum = self
                    .hasher
                    .take()
                    .map(Crc32Hasher::finalize)
                    .ok_or_else(|| Error::InvalidState("checksum already taken".into()))?;

                // LF for the canonical form, CRLF on the wire.
                let canonical_trailer = format!("{X_AMZ_CHECKSUM_CRC32}:{checksum}\n");
                let trailer_signature = signer.sign(&canonical_trailer);
                let trailer = format!(
                    "{X_AMZ_CHECKSUM_CRC32}:{checksum}\r\n{X_AMZ_TRAILER_SIGNATURE}:{trailer_signature}\r\n\r\n"
                );

                self.stats.encoded_length += trailer.len() as u64;
                self.stats.checksum = Some(checksum);
                Ok(Bytes::from(trailer))
            }
            other => {
                let err = Error::InvalidState(format!(
                    "trailer cannot be encoded while {}",
                    other.name()
                ));
                self.state = other;
                Err(err)
            }
        }
    }

    pub fn into_stats(self) -> ChunkedStats {
        self.stats
    }
}

/// Calculates the encoded length for signed aws-chunked format.
///
/// For a given content length and chunk size, returns the total encoded length
/// including all chunk headers with signatures, the final zero-length chunk,
/// the checksum trailer, the trailer signature and the closing blank line.
/// Returns `None` for a zero `chunk_size` or when the length does not fit in
/// a `u64`.
pub fn calculate_signed_encoded_length(content_length: u64, chunk_size: usize) -> Option<u64> {
    let chunk_size = u64::try_from(chunk_size).ok().filter(|c| *c > 0)?;

    let full_chunks = content_length / chunk_size;
    let last_chunk_size = content_length % chunk_size;

    let frame_len = |size: u64| {
        (format!("{size:x}").len() as u64 + SIGNATURE_OVERHEAD + 2 + 2).checked_add(size)
    };

    let mut len = full_chunks.checked_mul(frame_len(chunk_size)?)?;
    if last_chunk_size > 0 {
        len = len.checked_add(frame_len(last_chunk_size)?)?;
    }

    // "x-amz-checksum-crc32:<base64>\r\n"
    let checksum_trailer = X_AMZ_CHECKSUM_CRC32.len() as u64 + 1 + CRC32_B64_LEN + 2;
    // "x-amz-trailer-signature:<64-hex>\r\n"
    let trailer_signature = X_AMZ_TRAILER_SIGNATURE.len() as u64 + 1 + 64 + 2;

    len.checked_add(FINAL_CHUNK_LEN + checksum_trailer + trailer_signature + 2)
}
