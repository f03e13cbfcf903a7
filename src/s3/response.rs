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

//! Responses and HTTP/1.1 response parsing

use crate::s3::aws_chunked::ChunkedStats;
use crate::s3::error::NetworkError;
use crate::s3::header_constants::{CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::s3::headers::HeaderList;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Result of a streaming upload.
///
/// Any status the server sends back is returned as is, including error
/// statuses; only transport failures become errors.
#[derive(Clone, Debug)]
pub struct PutObjectStreamingResponse {
    pub headers: HeaderList,
    pub bucket_name: String,
    pub object_name: String,
    pub status: u16,
    pub reason: String,
    pub body: String,
    pub etag: Option<String>,
    pub stats: ChunkedStats,
}

impl PutObjectStreamingResponse {
    pub(crate) fn new(
        raw: RawResponse,
        bucket_name: String,
        object_name: String,
        stats: ChunkedStats,
    ) -> Self {
        let etag = raw
            .headers
            .get("ETag")
            .map(|v| v.trim_matches('"').to_string());
        Self {
            status: raw.status,
            reason: raw.reason,
            body: String::from_utf8_lossy(&raw.body).into_owned(),
            headers: raw.headers,
            bucket_name,
            object_name,
            etag,
            stats,
        }
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Status line, headers and body of one final (non-1xx) response.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

/// Reads one line and strips its CRLF; `None` on end of stream.
async fn read_line<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<Option<String>, NetworkError> {
    let mut buf = Vec::new();
    if r.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

async fn expect_line<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<String, NetworkError> {
    read_line(r).await?.ok_or(NetworkError::ConnectionClosed)
}

fn parse_status_line(line: &str) -> Result<(u16, String), NetworkError> {
    let malformed = || NetworkError::MalformedResponse(format!("invalid status line '{line}'"));

    let (version, rest) = line.split_once(' ').ok_or_else(malformed)?;
    if !version.starts_with("HTTP/1.") {
        return Err(malformed());
    }
    let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));
    if code.len() != 3 {
        return Err(malformed());
    }
    let status = code.parse::<u16>().map_err(|_| malformed())?;
    Ok((status, reason.trim().to_string()))
}

async fn read_headers<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<HeaderList, NetworkError> {
    let mut headers = HeaderList::new();
    loop {
        let line = expect_line(r).await?;
        if line.is_empty() {
            return Ok(headers);
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            NetworkError::MalformedResponse(format!("invalid header line '{line}'"))
        })?;
        headers.add(name.trim(), value.trim());
    }
}

/// Appends exactly `len` bytes from `r` to `body`. Memory grows with the data
/// actually received, never with the declared length.
async fn read_declared<R: AsyncBufRead + Unpin>(
    r: &mut R,
    len: u64,
    body: &mut Vec<u8>,
) -> Result<(), NetworkError> {
    let read = (&mut *r).take(len).read_to_end(body).await?;
    if (read as u64) < len {
        return Err(NetworkError::ConnectionClosed);
    }
    Ok(())
}

async fn read_chunked_body<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<Vec<u8>, NetworkError> {
    let mut body = Vec::new();
    loop {
        let line = expect_line(r).await?;
        let size = line.split(';').next().unwrap_or_default().trim();
        let size = u64::from_str_radix(size, 16).map_err(|_| {
            NetworkError::MalformedResponse(format!("invalid chunk size line '{line}'"))
        })?;
        if size == 0 {
            // trailer section
            while !expect_line(r).await?.is_empty() {}
            return Ok(body);
        }
        if (body.len() as u64).checked_add(size).is_none() {
            return Err(NetworkError::MalformedResponse(format!(
                "chunk size {size} overflows the body length"
            )));
        }
        read_declared(r, size, &mut body).await?;
        if !expect_line(r).await?.is_empty() {
            return Err(NetworkError::MalformedResponse(
                "chunk data not followed by CRLF".into(),
            ));
        }
    }
}

/// Reads the response to a request from `r`.
///
/// Interim `1xx` responses are skipped. The body is delimited by
/// `Transfer-Encoding: chunked`, `Content-Length` or the end of the stream,
/// in that order of precedence.
pub(crate) async fn read_response<R: AsyncBufRead + Unpin>(
    r: &mut R,
) -> Result<RawResponse, NetworkError> {
    loop {
        let line = expect_line(r).await?;
        let (status, reason) = parse_status_line(&line)?;
        let headers = read_headers(r).await?;

        if (100..200).contains(&status) {
            log::debug!("skipping interim response {status} {reason}");
            continue;
        }

        let chunked = headers
            .get(TRANSFER_ENCODING)
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
        let body = if status == 204 || status == 304 {
            Vec::new()
        } else if chunked {
            read_chunked_body(r).await?
        } else if let Some(len) = headers.get(CONTENT_LENGTH) {
            let len = len.trim().parse::<u64>().map_err(|_| {
                NetworkError::MalformedResponse(format!("invalid Content-Length '{len}'"))
            })?;
            let mut body = Vec::new();
            read_declared(r, len, &mut body).await?;
            body
        } else {
            let mut body = Vec::new();
            r.read_to_end(&mut body).await?;
            body
        };

        return Ok(RawResponse {
            status,
            reason,
            headers,
            body,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn parse(raw: &str) -> Result<RawResponse, NetworkError> {
        let mut r = BufReader::new(raw.as_bytes());
        read_response(&mut r).await
    }

    #[tokio::test]
    async fn test_content_length_body() {
        let resp = parse(
            "HTTP/1.1 200 OK\r\nETag: \"abc\"\r\nContent-Length: 5\r\n\r\nhelloEXTRA",
        )
        .await
        .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.reason, "OK");
        assert_eq!(resp.body, b"hello");

        let resp = PutObjectStreamingResponse::new(
            resp,
            "b".into(),
            "k".into(),
            ChunkedStats::default(),
        );
        assert!(resp.is_success());
        assert_eq!(resp.etag.as_deref(), Some("abc"));
        assert_eq!(resp.body, "hello");
    }

    #[tokio::test]
    async fn test_chunked_body() {
        let resp = parse(
            "HTTP/1.1 403 Forbidden\r\nTransfer-Encoding: chunked\r\n\r\n\
             5\r\n<Erro\r\n3;ext=1\r\nr/>\r\n0\r\nX-Trailer: v\r\n\r\n",
        )
        .await
        .unwrap();
        assert_eq!(resp.status, 403);
        assert_eq!(resp.reason, "Forbidden");
        assert_eq!(resp.body, b"<Error/>");
    }

    #[tokio::test]
    async fn test_body_until_close() {
        let resp = parse("HTTP/1.0 500 Internal Server Error\r\n\r\noops")
            .await
            .unwrap();
        assert_eq!(resp.status, 500);
        assert_eq!(resp.reason, "Internal Server Error");
        assert_eq!(resp.body, b"oops");
    }

    #[tokio::test]
    async fn test_interim_responses_skipped() {
        let resp = parse(
            "HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
        )
        .await
        .unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_reason_phrase() {
        let resp = parse("HTTP/1.1 204\r\n\r\n").await.unwrap();
        assert_eq!(resp.status, 204);
        assert_eq!(resp.reason, "");
    }

    #[tokio::test]
    async fn test_truncated_responses() {
        assert!(matches!(parse("").await, Err(NetworkError::ConnectionClosed)));
        assert!(matches!(
            parse("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort").await,
            Err(NetworkError::ConnectionClosed)
        ));
        assert!(matches!(
            parse("HTTP/1.1 200 OK\r\nServer: x\r\n").await,
            Err(NetworkError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_oversized_declared_lengths() {
        assert!(matches!(
            parse(
                "HTTP/1.1 500 Oops\r\nTransfer-Encoding: chunked\r\n\r\n\
                 1\r\na\r\nffffffffffffffff\r\n"
            )
            .await,
            Err(NetworkError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse("HTTP/1.1 500 Oops\r\nTransfer-Encoding: chunked\r\n\r\n7fffffffffffffff\r\nab")
                .await,
            Err(NetworkError::ConnectionClosed)
        ));
        assert!(matches!(
            parse("HTTP/1.1 200 OK\r\nContent-Length: 18446744073709551615\r\n\r\nabc").await,
            Err(NetworkError::ConnectionClosed)
        ));
        assert!(matches!(
            parse("HTTP/1.1 200 OK\r\nContent-Length: 99999999999999999999\r\n\r\n").await,
            Err(NetworkError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_status_line() {
        assert!(matches!(
            parse("SMTP ready\r\n\r\n").await,
            Err(NetworkError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse("HTTP/1.1 abc OK\r\n\r\n").await,
            Err(NetworkError::MalformedResponse(_))
        ));
    }
}
