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

//! Ordered request headers and their SigV4 canonical form

use crate::s3::error::ValidationErr;
use crate::s3::header_constants::AUTHORIZATION;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Request headers kept in the order they are written on the wire.
///
/// Names keep the casing they were added with; canonicalization lower-cases
/// them only for signing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderList(Vec<(String, String)>);

/// Trims and collapses every run of whitespace into a single space.
///
/// Returns `Cow::Borrowed` when the value is already canonical.
fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();
    let mut prev_space = false;
    let canonical = trimmed.chars().all(|c| {
        let ok = c == ' ' && !prev_space || !c.is_whitespace();
        prev_space = c.is_whitespace();
        ok
    });
    if canonical {
        return Cow::Borrowed(trimmed);
    }
    Cow::Owned(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header; nothing is merged or replaced until canonicalization.
    pub fn add<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.push((key.into(), value.into()));
    }

    /// Returns the first value of a header, comparing names case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders `Name: value\r\n` lines in insertion order.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.0 {
            out.push_str(k);
            out.push_str(": ");
            out.push_str(v);
            out.push_str("\r\n");
        }
        out
    }

    /// Converts the headers to signed headers and canonical headers.
    ///
    /// Names are trimmed and lower-cased, values trimmed with inner whitespace
    /// collapsed, and entries sorted by name bytes. The canonical block is the
    /// `name:value` lines joined by `\n` without a trailing newline.
    /// `Authorization` is never signed.
    ///
    /// Two entries whose names differ only by case are merged when their
    /// canonical values are equal and rejected otherwise.
    pub fn get_canonical_headers(&self) -> Result<(String, String), ValidationErr> {
        let mut btmap: BTreeMap<String, Cow<'_, str>> = BTreeMap::new();

        for (k, v) in &self.0 {
            let key = k.trim().to_ascii_lowercase();
            if key == AUTHORIZATION.to_ascii_lowercase() {
                continue;
            }
            if v.contains(['\r', '\n']) {
                return Err(ValidationErr::InvalidHeaderValue { name: key });
            }

            let value = collapse_whitespace(v);
            match btmap.entry(key) {
                Entry::Vacant(e) => {
                    e.insert(value);
                }
                Entry::Occupied(e) => {
                    if *e.get() != value {
                        return Err(ValidationErr::HeaderCollision {
                            name: e.key().clone(),
                            first: e.get().to_string(),
                            second: value.into_owned(),
                        });
                    }
                }
            }
        }

        let mut signed_headers = String::new();
        let mut canonical_headers = String::new();
        for (key, value) in &btmap {
            if !signed_headers.is_empty() {
                signed_headers.push(';');
                canonical_headers.push('\n');
            }

            signed_headers.push_str(key);

            canonical_headers.push_str(key);
            canonical_headers.push(':');
            canonical_headers.push_str(value);
        }

        Ok((signed_headers, canonical_headers))
    }
}
