//! Canonical model reference for hub-cached artifacts

use std::fmt;
use std::str::FromStr;

use crate::constants::{DEFAULT_MODEL_ID, HUB_URL_MARKER};
use crate::error::{Error, Result};

/// Canonical `org/name` model reference.
///
/// Accepts the forms operators actually paste into endpoint config:
///   "ofa-sys/small-stable-diffusion-v0"
///   "https://huggingface.co/ofa-sys/small-stable-diffusion-v0"
///   "...:revision" (suffix ignored)
///
/// The organization segment is lowercased; the name keeps its case, since
/// repository names can be case-sensitive while org namespaces are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub org: String,
    pub name: String,
}

impl ModelRef {
    /// Normalize a raw model reference string.
    ///
    /// Blank input falls back to [`DEFAULT_MODEL_ID`] so the worker stays
    /// usable with no configuration. Input with no `org/name` separator is a
    /// configuration error and is reported with the offending raw string.
    pub fn normalize(raw: &str) -> Result<Self> {
        let mut s = raw.trim();
        if s.is_empty() {
            return Self::normalize(DEFAULT_MODEL_ID);
        }

        // Discard everything up to and including the hub URL marker, then any
        // trailing ":revision" suffix. Order matters: the marker strip also
        // removes the URL scheme's own colon.
        if let Some(idx) = s.find(HUB_URL_MARKER) {
            s = &s[idx + HUB_URL_MARKER.len()..];
        }
        if let Some((head, _revision)) = s.split_once(':') {
            s = head;
        }

        match s.split_once('/') {
            Some((org, name)) => Ok(Self {
                org: org.to_lowercase(),
                name: name.to_string(),
            }),
            None => Err(Error::MalformedModelId {
                raw: raw.to_string(),
            }),
        }
    }

    /// Directory name this model occupies under the cache root.
    pub fn cache_dir_name(&self) -> String {
        format!("models--{}--{}", self.org, self.name)
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

impl FromStr for ModelRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::normalize(s)
    }
}
