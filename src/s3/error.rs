// MinIO Rust Library for Amazon S3 Compatible Cloud Storage
// Copyright 2022 MinIO, Inc.
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

//! Error definitions for streaming uploads

use thiserror::Error;

/// Errors found while validating arguments and configuration.
///
/// These are always reported before any byte is sent to the server.
#[derive(Debug, Error)]
pub enum ValidationErr {
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error(transparent)]
    InvalidUrl(#[from] http::uri::InvalidUri),

    #[error("invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("invalid object name: {0}")]
    InvalidObjectName(String),

    #[error("chunk size {0} is not supported; it must be greater than zero")]
    InvalidChunkSize(usize),

    #[error("header '{name}' given more than once with different values: '{first}' and '{second}'")]
    HeaderCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("value of header '{name}' must be a single line")]
    InvalidHeaderValue { name: String },

    #[error("content length is unknown; aws-chunked uploads need the decoded length up front")]
    ContentLengthUnknown,
}

/// Errors raised by the transport.
///
/// An upload that fails with one of these cannot be resumed; the whole request
/// has to be signed and sent again.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: native_tls::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before a complete response was received")]
    ConnectionClosed,

    #[error("malformed HTTP response: {0}")]
    MalformedResponse(String),
}

/// Error definitions
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErr),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("failed to read payload: {0}")]
    PayloadSource(#[source] std::io::Error),

    #[error("not enough data in the stream; expected: {0}, got: {1} bytes")]
    InsufficientData(u64, u64),

    #[error("too much data in the stream - exceeds {0} bytes")]
    TooMuchData(u64),

    #[error("invalid upload state: {0}")]
    InvalidState(String),
}
