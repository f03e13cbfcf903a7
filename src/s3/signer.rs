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

//! Signature V4 for streaming S3 uploads
//!
//! A streaming upload is signed in a chain: the request headers produce the
//! seed signature, every `aws-chunked` frame is signed over the previous
//! signature, and the trailer is signed over the terminal frame's signature.
//! [`SignatureChain`] and [`TrailerSigner`] hold that state and are consumed
//! or mutated by each step, so a prior state cannot be signed twice.

use crate::s3::error::ValidationErr;
use crate::s3::header_constants::AUTHORIZATION;
use crate::s3::headers::HeaderList;
use crate::s3::utils::{EMPTY_SHA256, UtcTime, sha256_hash, to_amz_date, to_signer_date};
use hex::encode as hexencode;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;

pub const SIGN_V4_ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const CHUNK_SIGN_ALGORITHM: &str = "AWS4-HMAC-SHA256-PAYLOAD";
pub const TRAILER_SIGN_ALGORITHM: &str = "AWS4-HMAC-SHA256-TRAILER";
pub const STREAMING_UNSIGNED_PAYLOAD_TRAILER: &str = "STREAMING-UNSIGNED-PAYLOAD-TRAILER";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
pub const SERVICE_NAME: &str = "s3";

/// Returns HMAC hash for given key and data
pub fn hmac_hash(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut hasher = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    hasher.update(data);
    hasher.finalize().into_bytes().to_vec()
}

/// Returns hex encoded HMAC hash for given key and data
pub fn hmac_hash_hex(key: &[u8], data: &[u8]) -> String {
    hexencode(hmac_hash(key, data))
}

/// Returns scope value of given date, region and service name
pub fn get_scope(date: UtcTime, region: &str, service_name: &str) -> String {
    format!(
        "{}/{}/{}/aws4_request",
        to_signer_date(date),
        region,
        service_name
    )
}

/// Returns hex encoded SHA256 hash of canonical request
pub fn get_canonical_request_hash(
    method: &str,
    uri: &str,
    query_string: &str,
    headers: &str,
    signed_headers: &str,
    content_sha256: &str,
) -> String {
    // CanonicalRequest =
    //   HTTPRequestMethod + '\n' +
    //   CanonicalURI + '\n' +
    //   CanonicalQueryString + '\n' +
    //   CanonicalHeaders + '\n\n' +
    //   SignedHeaders + '\n' +
    //   HexEncode(Hash(RequestPayload))
    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n\n{}\n{}",
        method, uri, query_string, headers, signed_headers, content_sha256
    );
    log::trace!("canonical request:\n{canonical_request}");
    sha256_hash(canonical_request.as_bytes())
}

/// Returns string-to-sign value of given date, scope and canonical request hash
pub fn get_string_to_sign(date: UtcTime, scope: &str, canonical_request_hash: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        SIGN_V4_ALGORITHM,
        to_amz_date(date),
        scope,
        canonical_request_hash
    )
}

/// Returns signing key of given secret key, date, region and service name
pub fn get_signing_key(
    secret_key: &str,
    date: UtcTime,
    region: &str,
    service_name: &str,
) -> Vec<u8> {
    let mut key: Vec<u8> = b"AWS4".to_vec();
    key.extend(secret_key.as_bytes());

    let date_key = hmac_hash(key.as_slice(), to_signer_date(date).as_bytes());
    let date_region_key = hmac_hash(date_key.as_slice(), region.as_bytes());
    let date_region_service_key = hmac_hash(date_region_key.as_slice(), service_name.as_bytes());
    hmac_hash(date_region_service_key.as_slice(), b"aws4_request")
}

/// Returns signature value for given signing key and string-to-sign
pub fn get_signature(signing_key: &[u8], string_to_sign: &[u8]) -> String {
    hmac_hash_hex(signing_key, string_to_sign)
}

/// Returns authorization value for given access key, scope, signed headers and signature
pub fn get_authorization(
    access_key: &str,
    scope: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{SIGN_V4_ALGORITHM} Credential={access_key}/{scope},SignedHeaders={signed_headers},Signature={signature}"
    )
}

/// Signs one `aws-chunked` frame whose data is not hashed.
///
/// The same string-to-sign shape is used for data frames and the terminal
/// zero-length frame; only `previous_signature` differs between them.
pub fn sign_chunk(
    signing_key: &[u8],
    amz_date: &str,
    scope: &str,
    previous_signature: &str,
) -> String {
    let string_to_sign = format!(
        "{CHUNK_SIGN_ALGORITHM}\n{amz_date}\n{scope}\n{previous_signature}\n{EMPTY_SHA256}\n{UNSIGNED_PAYLOAD}"
    );
    get_signature(signing_key, string_to_sign.as_bytes())
}

/// Signs the canonical trailer block.
///
/// `canonical_trailer` is the `name:value\n` form of the trailing headers,
/// including the final newline.
pub fn sign_trailer(
    signing_key: &[u8],
    amz_date: &str,
    scope: &str,
    previous_signature: &str,
    canonical_trailer: &str,
) -> String {
    let trailer_hash = sha256_hash(canonical_trailer.as_bytes());
    let string_to_sign = format!(
        "{TRAILER_SIGN_ALGORITHM}\n{amz_date}\n{scope}\n{previous_signature}\n{trailer_hash}"
    );
    get_signature(signing_key, string_to_sign.as_bytes())
}

/// Cursor over the chunk signatures of one streaming request.
///
/// Holds the derived signing key and the previous signature. It is not
/// `Clone`: every frame signature advances the single cursor, and
/// [`SignatureChain::finish`] consumes it.
pub struct SignatureChain {
    signing_key: Arc<[u8]>,
    amz_date: String,
    scope: String,
    previous_signature: String,
}

impl fmt::Debug for SignatureChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureChain")
            .field("amz_date", &self.amz_date)
            .field("scope", &self.scope)
            .field("previous_signature", &self.previous_signature)
            .finish_non_exhaustive()
    }
}

impl SignatureChain {
    pub fn new(
        signing_key: impl Into<Arc<[u8]>>,
        date: UtcTime,
        scope: String,
        seed_signature: String,
    ) -> Self {
        Self {
            signing_key: signing_key.into(),
            amz_date: to_amz_date(date),
            scope,
            previous_signature: seed_signature,
        }
    }

    /// Signature the next frame will chain from.
    pub fn previous_signature(&self) -> &str {
        &self.previous_signature
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Signs the next data frame and advances the chain.
    pub fn next_chunk(&mut self) -> String {
        let signature = sign_chunk(
            &self.signing_key,
            &self.amz_date,
            &self.scope,
            &self.previous_signature,
        );
        self.previous_signature.clone_from(&signature);
        signature
    }

    /// Signs the terminal zero-length frame and hands over to the trailer.
    pub fn finish(self) -> TrailerSigner {
        let terminal_signature = sign_chunk(
            &self.signing_key,
            &self.amz_date,
            &self.scope,
            &self.previous_signature,
        );
        TrailerSigner {
            signing_key: self.signing_key,
            amz_date: self.amz_date,
            scope: self.scope,
            terminal_signature,
        }
    }
}

/// Final step of a [`SignatureChain`]: signs the trailer exactly once.
pub struct TrailerSigner {
    signing_key: Arc<[u8]>,
    amz_date: String,
    scope: String,
    terminal_signature: String,
}

impl fmt::Debug for TrailerSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrailerSigner")
            .field("amz_date", &self.amz_date)
            .field("scope", &self.scope)
            .field("terminal_signature", &self.terminal_signature)
            .finish_non_exhaustive()
    }
}

impl TrailerSigner {
    /// Signature of the terminal zero-length frame.
    pub fn terminal_signature(&self) -> &str {
        &self.terminal_signature
    }

    pub fn sign(self, canonical_trailer: &str) -> String {
        sign_trailer(
            &self.signing_key,
            &self.amz_date,
            &self.scope,
            &self.terminal_signature,
            canonical_trailer,
        )
    }
}

/// Signs the headers of a streaming request and starts its signature chain.
///
/// The `Authorization` header is appended to `headers`; the returned chain
/// is seeded with the request signature.
pub fn sign_v4_streaming(
    method: &str,
    uri: &str,
    region: &str,
    headers: &mut HeaderList,
    access_key: &str,
    secret_key: &str,
    content_sha256: &str,
    date: UtcTime,
) -> Result<SignatureChain, ValidationErr> {
    let scope = get_scope(date, region, SERVICE_NAME);
    let (signed_headers, canonical_headers) = headers.get_canonical_headers()?;
    let canonical_request_hash = get_canonical_request_hash(
        method,
        uri,
        "",
        &canonical_headers,
        &signed_headers,
        content_sha256,
    );
    let string_to_sign = get_string_to_sign(date, &scope, &canonical_request_hash);
    let signing_key = get_signing_key(secret_key, date, region, SERVICE_NAME);
    let signature = get_signature(signing_key.as_slice(), string_to_sign.as_bytes());
    let authorization = get_authorization(access_key, &scope, &signed_headers, &signature);

    headers.add(AUTHORIZATION, authorization);

    Ok(SignatureChain::new(signing_key, date, scope, signature))
}
