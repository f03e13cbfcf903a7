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

//! HTTP endpoint and connection handling

use crate::s3::error::{NetworkError, ValidationErr};
use crate::s3::utils::{canonical_object_path, match_hostname};
use http::Uri;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_native_tls::TlsStream;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Represents Base URL of S3 endpoint
pub struct BaseUrl {
    pub https: bool,
    host: String,
    port: u16,
    pub virtual_style: bool,
}

impl BaseUrl {
    /// Host name or bracketed IPv6 address, without port.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` to open the TCP connection to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the `Host` header value and the request URI for an object.
    ///
    /// Virtual-host style puts the bucket in the host name
    /// (`<bucket>.<host>:<port>`, `/<key>`); path style keeps it in the path
    /// (`<host>:<port>`, `/<bucket>/<key>`). The port is always included.
    pub fn request_target(&self, bucket: &str, object: &str) -> (String, String) {
        let object_path = canonical_object_path(object);
        if self.virtual_style {
            (
                format!("{}.{}:{}", bucket, self.host, self.port),
                object_path,
            )
        } else {
            let uri = if object_path == "/" {
                format!("/{bucket}")
            } else {
                format!("/{bucket}{object_path}")
            };
            (format!("{}:{}", self.host, self.port), uri)
        }
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.https { "https" } else { "http" };
        write!(f, "{}://{}:{}", scheme, self.host, self.port)
    }
}

impl FromStr for BaseUrl {
    type Err = ValidationErr;

    /// Convert a string to a BaseUrl.
    ///
    /// Scheme (`http` or `https`), host and port are all required; the
    /// endpoint must not carry a path or a query.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3stream::s3::http::BaseUrl;
    ///
    /// let base_url: BaseUrl = "http://127.0.0.1:9000".parse().unwrap();
    /// let base_url: BaseUrl = "https://[::1]:9000".parse().unwrap();
    /// assert!("play.min.io:9000".parse::<BaseUrl>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, ValidationErr> {
        let url = s.parse::<Uri>()?;

        let https = match url.scheme_str() {
            None => {
                return Err(ValidationErr::InvalidBaseUrl(format!(
                    "scheme must be provided in '{s}'"
                )));
            }
            Some("http") => false,
            Some("https") => true,
            Some(_) => {
                return Err(ValidationErr::InvalidBaseUrl(
                    "scheme must be http or https".into(),
                ));
            }
        };

        let host = match url.host() {
            Some(h) if !h.is_empty() => h,
            _ => {
                return Err(ValidationErr::InvalidBaseUrl(
                    "valid host must be provided".into(),
                ));
            }
        };

        let host = if host.starts_with('[') {
            host.to_string()
        } else if host.parse::<std::net::Ipv6Addr>().is_ok() {
            format!("[{host}]")
        } else if host.parse::<std::net::Ipv4Addr>().is_ok() || match_hostname(host) {
            host.to_string()
        } else {
            return Err(ValidationErr::InvalidBaseUrl(format!(
                "invalid host '{host}'"
            )));
        };

        let port = match url.port_u16() {
            Some(p) if p != 0 => p,
            _ => {
                return Err(ValidationErr::InvalidBaseUrl(format!(
                    "port must be provided in '{s}'"
                )));
            }
        };

        if url.path() != "/" && !url.path().is_empty() {
            return Err(ValidationErr::InvalidBaseUrl(
                "path must be empty for base URL".into(),
            ));
        }

        if url.query().is_some() {
            return Err(ValidationErr::InvalidBaseUrl(
                "query must be none for base URL".into(),
            ));
        }

        Ok(BaseUrl {
            https,
            host,
            port,
            virtual_style: true,
        })
    }
}

/// Connection to the endpoint, plain TCP or TLS.
///
/// Owned by exactly one upload; dropping it closes the socket.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Connection {
    /// Opens a connection to `base_url`, with a TLS handshake for `https`.
    pub async fn connect(base_url: &BaseUrl, ignore_cert_check: bool) -> Result<Self, NetworkError> {
        let addr = base_url.socket_addr();
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|source| NetworkError::Connect {
                addr: addr.clone(),
                source,
            })?;
        tcp.set_nodelay(true)?;
        log::debug!("connected to {addr}");

        if !base_url.https {
            return Ok(Connection::Plain(tcp));
        }

        let domain = base_url.host().trim_start_matches('[').trim_end_matches(']');
        let mut builder = native_tls::TlsConnector::builder();
        if ignore_cert_check {
            log::warn!("TLS certificate verification is disabled for {domain}");
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let connector = builder.build().map_err(|source| NetworkError::Tls {
            host: domain.to_string(),
            source,
        })?;
        let tls = tokio_native_tls::TlsConnector::from(connector)
            .connect(domain, tcp)
            .await
            .map_err(|source| NetworkError::Tls {
                host: domain.to_string(),
                source,
            })?;
        Ok(Connection::Tls(Box::new(tls)))
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_flush(cx),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Connection::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
