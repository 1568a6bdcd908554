//! Three-part numeric versions
//!
//! Package versions are compared to pick between upgrade, reinstall and
//! downgrade. Only `MAJOR[.MINOR[.PATCH]]` is accepted; missing components
//! default to zero. Anything else (pre-release tags, a leading `v`,
//! non-numeric parts) is rejected rather than guessed at.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AgentkitError, Result, invalid_version};

/// A `major.minor.patch` version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = AgentkitError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid_version(input, "empty version"));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 3 {
            return Err(invalid_version(input, "more than three components"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid_version(
                    input,
                    format!("non-numeric component '{part}'"),
                ));
            }
            *slot = part
                .parse()
                .map_err(|e| invalid_version(input, format!("component '{part}': {e}")))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // YAML may hand us `1.2` as a float or `2` as an integer.
        let value = serde_yaml::Value::deserialize(deserializer)?;
        let text = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected a version string, got {other:?}"
                )));
            }
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Compare two version strings, returning `-1`, `0` or `1`
///
/// # Errors
///
/// Returns `InvalidVersion` if either side is not a valid version.
pub fn compare(a: &str, b: &str) -> Result<i8> {
    let a: Version = a.parse()?;
    let b: Version = b.parse()?;
    Ok(match a.cmp(&b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}
