//! Job ID codec
//!
//! Job IDs are 64-bit integers issued monotonically by the job manager.
//! In the KVS they appear as a dotted-hex token (four 16-bit groups), which
//! doubles as the shard path of the job's directory:
//!
//! ```text
//! id 0x00000004b2000000  ->  0000.0004.b200.0000  ->  job.0000.0004.b200.0000
//! ```
//!
//! Decimal and `0x` hex forms are accepted on input for operator tooling.

mod errors;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use errors::{DecodeError, DecodeResult};

/// Number of 16-bit groups in a dotted-hex token
pub const DOTHEX_GROUPS: usize = 4;

/// Textual encodings of a job ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdEncoding {
    /// `0000.0004.b200.0000`
    DotHex,
    /// `20233322496`
    Decimal,
    /// `0x4b2000000`
    Hex,
}

impl IdEncoding {
    /// Returns the encoding name
    pub fn as_str(&self) -> &'static str {
        match self {
            IdEncoding::DotHex => "dothex",
            IdEncoding::Decimal => "decimal",
            IdEncoding::Hex => "hex",
        }
    }
}

impl fmt::Display for IdEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job identifier
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Wraps a raw 64-bit ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw 64-bit value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Encodes the ID in the given textual form
    pub fn encode(&self, encoding: IdEncoding) -> String {
        match encoding {
            IdEncoding::DotHex => format!(
                "{:04x}.{:04x}.{:04x}.{:04x}",
                (self.0 >> 48) & 0xffff,
                (self.0 >> 32) & 0xffff,
                (self.0 >> 16) & 0xffff,
                self.0 & 0xffff
            ),
            IdEncoding::Decimal => self.0.to_string(),
            IdEncoding::Hex => format!("0x{:x}", self.0),
        }
    }

    /// Decodes a token in the given textual form
    pub fn decode(text: &str, encoding: IdEncoding) -> DecodeResult<Self> {
        match encoding {
            IdEncoding::DotHex => decode_dothex(text),
            IdEncoding::Decimal => {
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(DecodeError::new(text, encoding, "expected decimal digits"));
                }
                text.parse::<u64>()
                    .map(JobId)
                    .map_err(|e| DecodeError::new(text, encoding, e.to_string()))
            }
            IdEncoding::Hex => {
                let digits = text
                    .strip_prefix("0x")
                    .ok_or_else(|| DecodeError::new(text, encoding, "missing 0x prefix"))?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(DecodeError::new(text, encoding, "expected hex digits"));
                }
                u64::from_str_radix(digits, 16)
                    .map(JobId)
                    .map_err(|e| DecodeError::new(text, encoding, e.to_string()))
            }
        }
    }

    /// Returns the KVS directory holding this job's records, e.g.
    /// `job.0000.0004.b200.0000`
    pub fn kvs_dir(&self, root: &str) -> String {
        format!("{}.{}", root, self.encode(IdEncoding::DotHex))
    }

    /// Returns the KVS key of one of this job's records, e.g.
    /// `job.0000.0004.b200.0000.eventlog`
    pub fn kvs_key(&self, root: &str, name: &str) -> String {
        format!("{}.{}", self.kvs_dir(root), name)
    }
}

fn decode_dothex(text: &str) -> DecodeResult<JobId> {
    let groups: Vec<&str> = text.split('.').collect();
    if groups.len() != DOTHEX_GROUPS {
        return Err(DecodeError::new(
            text,
            IdEncoding::DotHex,
            format!("expected {} groups, found {}", DOTHEX_GROUPS, groups.len()),
        ));
    }

    let mut id: u64 = 0;
    for group in groups {
        if group.is_empty() || group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DecodeError::new(
                text,
                IdEncoding::DotHex,
                format!("malformed group '{}'", group),
            ));
        }
        let value = u16::from_str_radix(group, 16)
            .map_err(|e| DecodeError::new(text, IdEncoding::DotHex, e.to_string()))?;
        id = (id << 16) | u64::from(value);
    }
    Ok(JobId(id))
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = DecodeError;

    /// Accepts dothex, `0x` hex or decimal
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('.') {
            Self::decode(s, IdEncoding::DotHex)
        } else if s.starts_with("0x") {
            Self::decode(s, IdEncoding::Hex)
        } else {
            Self::decode(s, IdEncoding::Decimal)
        }
    }
}
