use std::fmt;
use std::str::FromStr;

use crate::error::NspError;
use crate::models::IntentTypeEntry;

/// An intent type identified as `name_version`.
///
/// The version is whatever follows the last `_`, so names may themselves
/// contain underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntentTypeKey {
    pub name: String,
    pub version: u32,
}

impl IntentTypeKey {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for IntentTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.version)
    }
}

impl FromStr for IntentTypeKey {
    type Err = NspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = s
            .rsplit_once('_')
            .ok_or_else(|| NspError::MalformedKey(format!("{} has no version suffix", s)))?;

        if name.is_empty() {
            return Err(NspError::MalformedKey(format!("{} has an empty name", s)));
        }

        let version = version
            .parse::<u32>()
            .map_err(|_| NspError::MalformedKey(format!("{} has a non-numeric version", s)))?;

        Ok(Self::new(name, version))
    }
}

impl From<IntentTypeEntry> for IntentTypeKey {
    fn from(entry: IntentTypeEntry) -> Self {
        Self::new(entry.name, entry.version)
    }
}
