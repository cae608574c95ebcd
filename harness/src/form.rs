//! Form body encoding: `application/x-www-form-urlencoded` and
//! `multipart/form-data`.
//!
//! # Design
//! Both encoders are pure functions over a `FieldMap`. The multipart
//! boundary is passed in explicitly; the test case owns it and generates it
//! once. A field whose value list is absent or empty has no values: it
//! becomes a bare name in URL-encoded bodies and produces no multipart part.

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::error::EncodeError;

pub const URLENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body encoding used by a POST request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    UrlEncoded,
    Multipart,
}

/// Field name to optional multi-value mapping. Iterates in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, Option<Vec<String>>>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field with the given values.
    pub fn field<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert(name, Some(values.into_iter().map(Into::into).collect()));
        self
    }

    /// Add (or replace) a field that carries no values.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.insert(name, None);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Option<Vec<String>>) {
        self.0.insert(name.into(), values);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_deref().unwrap_or_default()))
    }
}

impl FromIterator<(String, Option<Vec<String>>)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, Option<Vec<String>>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// A fresh random boundary.
    pub fn random() -> Self {
        Self(format!("harness-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Content-Type` header value announcing this boundary.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.0)
    }
}

impl From<&str> for Boundary {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode as `name=value` pairs joined by `&`.
///
/// Everything outside `A-Z a-z 0-9 - . _ ~` is percent-escaped. Each value
/// of a field yields its own pair, in input order; a field without values
/// yields its bare name.
pub fn encode_urlencoded(fields: &FieldMap) -> Result<String, EncodeError> {
    let mut parts = Vec::new();
    for (name, values) in fields.iter() {
        let name = urlencoding::encode(name);
        if name.is_empty() {
            return Err(EncodeError::EmptyFieldName);
        }
        if values.is_empty() {
            parts.push(name.into_owned());
            continue;
        }
        for value in values {
            parts.push(format!("{name}={}", urlencoding::encode(value)));
        }
    }
    Ok(parts.join("&"))
}

/// Encode as `multipart/form-data` framed by `boundary`.
///
/// One `text/plain` part per value; fields without values are skipped. The
/// body always ends with the closing delimiter, so an empty map encodes to
/// the closing delimiter alone.
pub fn encode_multipart(fields: &FieldMap, boundary: &Boundary) -> Result<String, EncodeError> {
    let mut body = String::new();
    for (name, values) in fields.iter() {
        if values.is_empty() {
            continue;
        }
        check_part_name(name)?;
        for value in values {
            body.push_str(&format!(
                "--{boundary}\r\n\
                 Content-Disposition: form-data; name=\"{name}\"\r\n\
                 Content-Type: text/plain\r\n\
                 \r\n\
                 {value}\r\n"
            ));
        }
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    Ok(body)
}

fn check_part_name(name: &str) -> Result<(), EncodeError> {
    if name.is_empty() {
        return Err(EncodeError::EmptyFieldName);
    }
    if name.contains(['"', '\r', '\n']) {
        return Err(EncodeError::InvalidMultipartName(name.to_string()));
    }
    Ok(())
}
