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

use crate::mock_server::{MockBehavior, MockS3Server};
use crate::utils::rand_bucket_name;
use s3stream::s3::Client;
use s3stream::s3::ClientBuilder;
use s3stream::s3::creds::StaticProvider;
use s3stream::s3::http::BaseUrl;

const DEFAULT_ACCESS_KEY: &str = "minioadmin";
const DEFAULT_SECRET_KEY: &str = "minioadmin";
const DEFAULT_REGION: &str = "us-east-1";

pub struct TestContext {
    pub client: Client,
    pub base_url: BaseUrl,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Local server; `None` when running against `SERVER_ENDPOINT`
    pub server: Option<MockS3Server>,
}

impl TestContext {
    /// Uses the server at `SERVER_ENDPOINT` when set, otherwise starts a
    /// local verifying server.
    pub async fn new_from_env() -> Self {
        let access_key = std::env::var("ACCESS_KEY").unwrap_or(DEFAULT_ACCESS_KEY.to_string());
        let secret_key = std::env::var("SECRET_KEY").unwrap_or(DEFAULT_SECRET_KEY.to_string());
        let region = std::env::var("SERVER_REGION").unwrap_or(DEFAULT_REGION.to_string());

        match std::env::var("SERVER_ENDPOINT") {
            Ok(endpoint) => {
                log::debug!("SERVER_ENDPOINT={endpoint}");
                log::debug!("ACCESS_KEY={access_key}");
                log::debug!("SECRET_KEY=*****");
                log::debug!("SERVER_REGION={region}");
                let base_url: BaseUrl = endpoint.parse().unwrap();
                let ignore_cert_check = std::env::var("IGNORE_CERT_CHECK").is_ok();
                Self::build(access_key, secret_key, region, base_url, ignore_cert_check, None)
            }
            Err(_) => {
                Self::with_mock(&access_key, &secret_key, &region, MockBehavior::Verify).await
            }
        }
    }

    /// Starts a local server with the given behavior and a client for it.
    pub async fn with_mock(
        access_key: &str,
        secret_key: &str,
        region: &str,
        behavior: MockBehavior,
    ) -> Self {
        let server = MockS3Server::start(access_key, secret_key, behavior).await;
        let base_url: BaseUrl = server.endpoint().parse().unwrap();
        Self::build(
            access_key.to_string(),
            secret_key.to_string(),
            region.to_string(),
            base_url,
            false,
            Some(server),
        )
    }

    fn build(
        access_key: String,
        secret_key: String,
        region: String,
        base_url: BaseUrl,
        ignore_cert_check: bool,
        server: Option<MockS3Server>,
    ) -> Self {
        let client = ClientBuilder::new(base_url.clone())
            .provider(Some(StaticProvider::new(&access_key, &secret_key, None)))
            .region(region.as_str())
            .ignore_cert_check(Some(ignore_cert_check))
            .build()
            .unwrap();
        Self {
            client,
            base_url,
            access_key,
            secret_key,
            region,
            server,
        }
    }

    /// Client for the same endpoint with other credentials.
    pub fn client_with(&self, provider: StaticProvider, path_style: bool) -> Client {
        ClientBuilder::new(self.base_url.clone())
            .provider(Some(provider))
            .region(self.region.as_str())
            .path_style(path_style)
            .build()
            .unwrap()
    }

    /// A fresh bucket name. The bucket is not created; the local server
    /// accepts any bucket.
    pub fn rand_bucket(&self) -> String {
        rand_bucket_name()
    }

    pub fn server(&self) -> &MockS3Server {
        self.server
            .as_ref()
            .expect("test requires the local server")
    }
}
