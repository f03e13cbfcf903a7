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

//! Random payload generator

use bytes::Bytes;
use futures_util::Stream;
use rand::prelude::SmallRng;
use rand::{RngCore, SeedableRng};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Largest block produced per poll.
const BLOCK_SIZE: u64 = 8 * 1024;

/// Stream of `size` pseudo-random bytes.
pub struct RandSrc {
    size: u64,
    rng: SmallRng,
}

impl RandSrc {
    pub fn new(size: u64) -> RandSrc {
        let rng: SmallRng = SmallRng::from_os_rng();
        RandSrc { size, rng }
    }

    /// Reproducible source, for tests.
    pub fn with_seed(size: u64, seed: u64) -> RandSrc {
        RandSrc {
            size,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Stream for RandSrc {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.size == 0 {
            return Poll::Ready(None);
        }
        let bytes_read = self.size.min(BLOCK_SIZE) as usize;

        let this = self.get_mut();

        let mut buf = vec![0; bytes_read];
        this.rng.fill_bytes(&mut buf);
        this.size -= bytes_read as u64;
        Poll::Ready(Some(Ok(Bytes::from(buf))))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let blocks = self.size.div_ceil(BLOCK_SIZE) as usize;
        (blocks, Some(blocks))
    }
}
