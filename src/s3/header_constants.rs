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

pub const AUTHORIZATION: &str = "Authorization";
pub const HOST: &str = "Host";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";

pub const X_AMZ_DATE: &str = "x-amz-date";

pub const X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";

pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

pub const X_AMZ_DECODED_CONTENT_LENGTH: &str = "x-amz-decoded-content-length";

pub const X_AMZ_SDK_CHECKSUM_ALGORITHM: &str = "x-amz-sdk-checksum-algorithm";

pub const X_AMZ_TRAILER: &str = "x-amz-trailer";

pub const X_AMZ_CHECKSUM_CRC32: &str = "x-amz-checksum-crc32";

pub const X_AMZ_TRAILER_SIGNATURE: &str = "x-amz-trailer-signature";

pub const AWS_CHUNKED: &str = "aws-chunked";
pub const CHUNKED: &str = "chunked";
