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

use bytes::{Bytes, BytesMut};
use std::fmt;

/// An ordered collection of `Bytes` written back to back.
///
/// Used to assemble `aws-chunked` frames around payload blocks without
/// copying the payload.
#[derive(Debug, Clone, Default)]
pub struct SegmentedBytes {
    segments: Vec<Bytes>,
    total_size: usize,
}

impl SegmentedBytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.total_size
    }

    pub fn is_empty(&self) -> bool {
        self.total_size == 0
    }

    /// Appends `bytes`; empty buffers are skipped.
    pub fn append(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.total_size += bytes.len();
        self.segments.push(bytes);
    }

    pub fn extend(&mut self, other: SegmentedBytes) {
        for bytes in other {
            self.append(bytes);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.segments.iter()
    }

    /// Copy all the content into a single [Bytes] object.
    ///
    /// Intended for tests and small buffers.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.total_size);
        for bytes in &self.segments {
            buf.extend_from_slice(bytes);
        }
        buf.freeze()
    }
}

impl fmt::Display for SegmentedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_bytes()))
    }
}

impl IntoIterator for SegmentedBytes {
    type Item = Bytes;
    type IntoIter = std::vec::IntoIter<Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl From<Bytes> for SegmentedBytes {
    fn from(bytes: Bytes) -> Self {
        let mut sb = Self::new();
        sb.append(bytes);
        sb
    }
}

impl From<String> for SegmentedBytes {
    fn from(s: String) -> Self {
        Self::from(Bytes::from(s.into_bytes()))
    }
}

impl From<&'static str> for SegmentedBytes {
    fn from(s: &'static str) -> Self {
        Self::from(Bytes::from_static(s.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_tracks_length() {
        let mut sb = SegmentedBytes::new();
        assert!(sb.is_empty());
        sb.append(Bytes::from_static(b"abc"));
        sb.append(Bytes::new());
        sb.append(Bytes::from_static(b"de"));
        assert_eq!(sb.len(), 5);
        assert_eq!(sb.iter().count(), 2);
        assert_eq!(sb.to_bytes(), Bytes::from_static(b"abcde"));
        assert_eq!(sb.to_string(), "abcde");
    }

    #[test]
    fn test_extend() {
        let mut a = SegmentedBytes::from("x");
        a.extend(SegmentedBytes::from(String::from("yz")));
        assert_eq!(a.len(), 3);
        assert_eq!(a.into_iter().collect::<Vec<_>>().len(), 2);
    }
}
