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

//! In-process S3 endpoint accepting streaming uploads.
//!
//! The server decodes `aws-chunked` bodies and checks the seed signature,
//! every chunk signature, the trailer signature, the CRC32 checksum and the
//! declared lengths, answering the way an S3 server would.

use s3stream::s3::headers::HeaderList;
use s3stream::s3::signer::{
    SERVICE_NAME, SignatureChain, TrailerSigner, get_canonical_request_hash, get_scope,
    get_signature, get_signing_key, get_string_to_sign,
};
use s3stream::s3::utils::{UtcTime, crc32_b64};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How the server answers.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    /// Verify the upload; 200 on success, an S3 error otherwise
    #[default]
    Verify,
    /// Read the whole request, then send this response regardless
    Respond {
        status: u16,
        reason: String,
        body: String,
    },
    /// Close the connection right after the request headers
    CloseAfterHead,
}

/// What the server saw of one upload.
#[derive(Clone, Debug, Default)]
pub struct ReceivedRequest {
    pub method: String,
    pub uri: String,
    pub headers: HeaderList,
    pub payload: Vec<u8>,
    pub frame_sizes: Vec<usize>,
    pub checksum: Option<String>,
    /// Body bytes read, framing included
    pub encoded_length: u64,
    /// First verification failure as `(code, message)`
    pub error: Option<(String, String)>,
}

impl ReceivedRequest {
    fn fail(&mut self, code: &str, message: impl Into<String>) {
        if self.error.is_none() {
            let message = message.into();
            log::debug!("mock server: {code}: {message}");
            self.error = Some((code.to_string(), message));
        }
    }
}

#[derive(Clone)]
struct ServerState {
    access_key: String,
    secret_key: String,
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<ReceivedRequest>>>,
}

pub struct MockS3Server {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<ReceivedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockS3Server {
    /// Binds to an ephemeral port on 127.0.0.1 and starts serving.
    pub async fn start(access_key: &str, secret_key: &str, behavior: MockBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            behavior,
            requests: requests.clone(),
        };

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, peer)) = listener.accept().await else {
                    break;
                };
                log::debug!("mock server: connection from {peer}");
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        log::debug!("mock server: connection error: {e}");
                    }
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.addr.port())
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Drop for MockS3Server {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Reads one line including its terminator; returns the line without CRLF
/// and the number of bytes consumed.
async fn read_line<R: AsyncBufRead + Unpin>(r: &mut R) -> io::Result<(String, usize)> {
    let mut buf = Vec::new();
    let n = r.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    if !buf.ends_with(b"\r\n") {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "line not terminated by CRLF",
        ));
    }
    buf.truncate(buf.len() - 2);
    let line = String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok((line, n))
}

fn parse_amz_date(value: &str) -> Option<UtcTime> {
    chrono::NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|d| d.and_utc())
}

/// Fields of `AWS4-HMAC-SHA256 Credential=..,SignedHeaders=..,Signature=..`
struct Authorization {
    access_key: String,
    region: String,
    signed_headers: Vec<String>,
    signature: String,
}

fn parse_authorization(value: &str) -> Option<Authorization> {
    let rest = value.strip_prefix("AWS4-HMAC-SHA256 ")?;
    let mut credential = None;
    let mut signed_headers = None;
    let mut signature = None;
    for field in rest.split(',') {
        let (k, v) = field.trim().split_once('=')?;
        match k {
            "Credential" => credential = Some(v),
            "SignedHeaders" => signed_headers = Some(v),
            "Signature" => signature = Some(v),
            _ => return None,
        }
    }
    let parts: Vec<&str> = credential?.split('/').collect();
    if parts.len() != 5 || parts[3] != SERVICE_NAME || parts[4] != "aws4_request" {
        return None;
    }
    Some(Authorization {
        access_key: parts[0].to_string(),
        region: parts[2].to_string(),
        signed_headers: signed_headers?.split(';').map(str::to_string).collect(),
        signature: signature?.to_string(),
    })
}

/// Checks the request signature and returns the chain the body must follow.
fn verify_seed(state: &ServerState, req: &mut ReceivedRequest) -> Option<SignatureChain> {
    let Some(auth) = req.headers.get("Authorization").and_then(parse_authorization) else {
        req.fail("AccessDenied", "missing or malformed Authorization header");
        return None;
    };
    if auth.access_key != state.access_key {
        req.fail("InvalidAccessKeyId", "unknown access key");
    }
    let Some(date) = req.headers.get("x-amz-date").and_then(parse_amz_date) else {
        req.fail("AccessDenied", "missing or malformed x-amz-date");
        return None;
    };

    let mut signed = HeaderList::new();
    for name in &auth.signed_headers {
        match req.headers.get(name) {
            Some(value) => signed.add(name.as_str(), value),
            None => {
                req.fail("AccessDenied", format!("signed header {name} not sent"));
                return None;
            }
        }
    }
    for required in ["host", "x-amz-date", "x-amz-content-sha256", "x-amz-trailer"] {
        if !auth.signed_headers.iter().any(|h| h == required) {
            req.fail("AccessDenied", format!("header {required} must be signed"));
        }
    }
    let (signed_headers, canonical_headers) = match signed.get_canonical_headers() {
        Ok(v) => v,
        Err(e) => {
            req.fail("InvalidArgument", e.to_string());
            return None;
        }
    };

    let content_sha256 = req.headers.get("x-amz-content-sha256").unwrap_or_default();
    let scope = get_scope(date, &auth.region, SERVICE_NAME);
    let canonical_request_hash = get_canonical_request_hash(
        &req.method,
        &req.uri,
        "",
        &canonical_headers,
        &signed_headers,
        content_sha256,
    );
    let string_to_sign = get_string_to_sign(date, &scope, &canonical_request_hash);
    let signing_key = get_signing_key(&state.secret_key, date, &auth.region, SERVICE_NAME);
    let expected = get_signature(&signing_key, string_to_sign.as_bytes());
    if expected != auth.signature {
        req.fail(
            "SignatureDoesNotMatch",
            "request signature does not match the calculated signature",
        );
    }

    Some(SignatureChain::new(signing_key, date, scope, expected))
}

/// Decodes the aws-chunked body, verifying it against `chain` when present.
async fn read_body<R: AsyncBufRead + Unpin>(
    r: &mut R,
    mut chain: Option<SignatureChain>,
    req: &mut ReceivedRequest,
) -> io::Result<()> {
    let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidData, msg);

    loop {
        let (line, n) = read_line(r).await?;
        req.encoded_length += n as u64;
        let (size, signature) = line
            .split_once(";chunk-signature=")
            .ok_or_else(|| invalid(format!("bad frame header '{line}'")))?;
        let size = usize::from_str_radix(size, 16)
            .map_err(|_| invalid(format!("bad frame size '{size}'")))?;

        if size == 0 {
            if let Some(chain) = chain.take() {
                let signer = chain.finish();
                if signer.terminal_signature() != signature {
                    req.fail("SignatureDoesNotMatch", "final chunk signature mismatch");
                }
                read_trailer(r, Some(signer), req).await?;
            } else {
                read_trailer(r, None, req).await?;
            }
            return Ok(());
        }

        let mut data = vec![0u8; size + 2];
        r.read_exact(&mut data).await?;
        req.encoded_length += data.len() as u64;
        if !data.ends_with(b"\r\n") {
            return Err(invalid("frame data not followed by CRLF".into()));
        }
        data.truncate(size);
        if let Some(chain) = chain.as_mut() {
            if chain.next_chunk() != signature {
                req.fail(
                    "SignatureDoesNotMatch",
                    format!("chunk {} signature mismatch", req.frame_sizes.len() + 1),
                );
            }
        }
        req.frame_sizes.push(size);
        req.payload.extend_from_slice(&data);
    }
}

async fn read_trailer<R: AsyncBufRead + Unpin>(
    r: &mut R,
    signer: Option<TrailerSigner>,
    req: &mut ReceivedRequest,
) -> io::Result<()> {
    let mut trailers = HeaderList::new();
    loop {
        let (line, n) = read_line(r).await?;
        req.encoded_length += n as u64;
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, format!("bad trailer '{line}'"))
        })?;
        trailers.add(name, value);
    }

    let Some(checksum) = trailers.get("x-amz-checksum-crc32") else {
        req.fail("MalformedTrailerError", "missing x-amz-checksum-crc32 trailer");
        return Ok(());
    };
    req.checksum = Some(checksum.to_string());

    if let Some(signer) = signer {
        let expected = signer.sign(&format!("x-amz-checksum-crc32:{checksum}\n"));
        if trailers.get("x-amz-trailer-signature") != Some(expected.as_str()) {
            req.fail("SignatureDoesNotMatch", "trailer signature mismatch");
        }
    }
    if crc32_b64(&req.payload) != checksum {
        req.fail("BadDigest", "CRC32 checksum does not match the payload");
    }
    Ok(())
}

async fn handle_connection(stream: TcpStream, state: ServerState) -> io::Result<()> {
    let mut r = BufReader::new(stream);

    let (request_line, _) = read_line(&mut r).await?;
    let mut parts = request_line.split(' ');
    let mut req = ReceivedRequest {
        method: parts.next().unwrap_or_default().to_string(),
        uri: parts.next().unwrap_or_default().to_string(),
        ..Default::default()
    };
    loop {
        let (line, _) = read_line(&mut r).await?;
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            req.headers.add(name.trim(), value.trim());
        }
    }

    if matches!(state.behavior, MockBehavior::CloseAfterHead) {
        state.requests.lock().expect("requests lock").push(req);
        return Ok(());
    }

    let chain = verify_seed(&state, &mut req);
    let body_result = read_body(&mut r, chain, &mut req).await;
    if let Err(e) = &body_result {
        req.fail("IncompleteBody", e.to_string());
    }

    if let Some(decoded) = req.headers.get("x-amz-decoded-content-length") {
        if decoded.parse::<usize>().ok() != Some(req.payload.len()) {
            req.fail(
                "IncompleteBody",
                format!("decoded length {decoded} but received {}", req.payload.len()),
            );
        }
    }
    if let Some(len) = req.headers.get("Content-Length") {
        if len.parse::<u64>().ok() != Some(req.encoded_length) {
            req.fail(
                "IncompleteBody",
                format!("Content-Length {len} but received {}", req.encoded_length),
            );
        }
    }

    let (status, reason, body, etag) = match &state.behavior {
        MockBehavior::Respond {
            status,
            reason,
            body,
        } => (*status, reason.clone(), body.clone(), None),
        _ => match &req.error {
            None => (
                200,
                "OK".to_string(),
                String::new(),
                req.checksum.clone(),
            ),
            Some((code, message)) => {
                let status = if code == "SignatureDoesNotMatch"
                    || code == "AccessDenied"
                    || code == "InvalidAccessKeyId"
                {
                    403
                } else {
                    400
                };
                let reason = if status == 403 { "Forbidden" } else { "Bad Request" };
                let body = format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>{code}</Code><Message>{message}</Message><Resource>{}</Resource></Error>",
                    req.uri
                );
                (status, reason.to_string(), body, None)
            }
        },
    };

    state.requests.lock().expect("requests lock").push(req);

    let mut head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    if let Some(etag) = etag {
        head.push_str(&format!("ETag: \"{etag}\"\r\n"));
    }
    head.push_str("\r\n");

    let stream = r.get_mut();
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.shutdown().await?;
    body_result
}
