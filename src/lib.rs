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

//! # s3stream
//!
//! Streaming object uploads to Amazon S3 compatible object storage using
//! AWS Signature Version 4 with the `aws-chunked` content encoding and a
//! signed CRC32 trailer (`STREAMING-UNSIGNED-PAYLOAD-TRAILER`).
//!
//! The request is written by hand onto a plain or TLS byte stream so that the
//! exact headers and body framing that were signed are the ones on the wire.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use s3stream::s3::ClientBuilder;
//! use s3stream::s3::creds::StaticProvider;
//! use s3stream::s3::http::BaseUrl;
//! use s3stream::s3::object_content::ObjectContent;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let base_url: BaseUrl = "http://127.0.0.1:9000".parse()?;
//!     let client = ClientBuilder::new(base_url)
//!         .provider(Some(StaticProvider::new("minioadmin", "minioadmin", None)))
//!         .region("us-east-1")
//!         .build()?;
//!
//!     let resp = client
//!         .put_object_streaming("my-bucket", "big/file.bin", ObjectContent::from(Path::new("file.bin")))
//!         .build()
//!         .send()
//!         .await?;
//!
//!     println!("HTTP {} {}", resp.status, resp.reason);
//!     Ok(())
//! }
//! ```
//!
//! ## Design
//! - [`s3::signer`] holds the SigV4 primitives, the seed request signer and the
//!   chunk/trailer signature chain
//! - [`s3::aws_chunked`] frames payload blocks and accounts for the encoded length
//! - [`s3::client`] drives one upload over one exclusively owned connection

#![allow(clippy::result_large_err)]
#![allow(clippy::too_many_arguments)]
pub mod s3;

#[cfg(test)]
#[macro_use]
extern crate quickcheck;
