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

//! Command line tool uploading one object with a streaming SigV4 request.

use clap::Parser;
use log::info;
use s3stream::s3::aws_chunked::DEFAULT_CHUNK_SIZE;
use s3stream::s3::client::{BodyLength, ClientBuilder};
use s3stream::s3::creds::StaticProvider;
use s3stream::s3::error::{Error, ValidationErr};
use s3stream::s3::http::BaseUrl;
use s3stream::s3::object_content::ObjectContent;
use s3stream::s3::rand_src::RandSrc;
use s3stream::s3::response::PutObjectStreamingResponse;
use std::path::PathBuf;
use std::process::ExitCode;

/// Upload an object using aws-chunked encoding with a signed CRC32 trailer.
///
/// Either generates SIZE_BYTES of random data into --output and uploads it,
/// or uploads an existing --file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bucket to upload the object to
    bucket: String,
    /// Region used in the signing scope
    region: String,
    /// Object key
    key: String,
    /// Number of random bytes to generate and upload
    #[arg(required_unless_present = "file")]
    size_bytes: Option<u64>,

    /// Endpoint URL with scheme and port
    #[arg(long, env = "S3_ENDPOINT", default_value = "http://127.0.0.1:8000")]
    endpoint: String,
    /// Payload bytes per aws-chunked frame
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Upload this file instead of generating one
    #[arg(long, conflicts_with = "size_bytes")]
    file: Option<PathBuf>,
    /// Where the generated payload is written
    #[arg(long, default_value = "upload.bin")]
    output: PathBuf,
    /// Declare Content-Length instead of Transfer-Encoding: chunked
    #[arg(long)]
    content_length: bool,
    /// Use path-style addressing instead of virtual-host style
    #[arg(long)]
    path_style: bool,
    /// Skip TLS certificate verification
    #[arg(long)]
    ignore_cert_check: bool,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key: Option<String>,
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_key: Option<String>,
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,
}

async fn run(cli: Cli) -> Result<PutObjectStreamingResponse, Error> {
    let (access_key, secret_key) = match (cli.access_key.as_deref(), cli.secret_key.as_deref()) {
        (Some(ak), Some(sk)) if !ak.is_empty() && !sk.is_empty() => (ak, sk),
        _ => {
            return Err(ValidationErr::MissingCredentials(
                "set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY".into(),
            )
            .into());
        }
    };
    let base_url: BaseUrl = cli.endpoint.parse()?;

    let client = ClientBuilder::new(base_url)
        .provider(Some(StaticProvider::new(
            access_key,
            secret_key,
            cli.session_token.as_deref(),
        )))
        .region(cli.region.as_str())
        .path_style(cli.path_style)
        .ignore_cert_check(Some(cli.ignore_cert_check))
        .build()?;

    let path = match (cli.file, cli.size_bytes) {
        (Some(file), _) => file,
        (None, Some(size)) => {
            let written = ObjectContent::new_from_stream(RandSrc::new(size), size)
                .save_to(&cli.output)
                .await
                .map_err(Error::PayloadSource)?;
            info!("generated {written} random bytes in {:?}", cli.output);
            cli.output
        }
        (None, None) => {
            return Err(Error::InvalidState(
                "either SIZE_BYTES or --file is required".into(),
            ));
        }
    };

    let body_length = if cli.content_length {
        BodyLength::ContentLength
    } else {
        BodyLength::Chunked
    };

    info!(
        "uploading {:?} to {}/{} via {}",
        path,
        cli.bucket,
        cli.key,
        client.base_url()
    );
    client
        .put_object_streaming(cli.bucket, cli.key, path)
        .chunk_size(cli.chunk_size)
        .body_length(body_length)
        .build()
        .send()
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(resp) => {
            println!("HTTP {} {}", resp.status, resp.reason);
            if !resp.body.is_empty() {
                println!("{}", resp.body);
            }
            if resp.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            match e {
                Error::Validation(_) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["s3stream", "bucket", "us-east-1", "key", "1024"]).unwrap();
        assert_eq!(cli.size_bytes, Some(1024));
        assert_eq!(cli.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(cli.output, PathBuf::from("upload.bin"));
        assert!(!cli.content_length);
        assert!(!cli.path_style);
    }

    #[test]
    fn test_file_instead_of_size() {
        let cli = Cli::try_parse_from([
            "s3stream", "bucket", "us-east-1", "key", "--file", "data.bin",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("data.bin")));
        assert!(cli.size_bytes.is_none());

        assert!(Cli::try_parse_from(["s3stream", "bucket", "us-east-1", "key"]).is_err());
    }
}
