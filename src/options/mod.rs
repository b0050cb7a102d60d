use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

/// Construction-time knobs for an [`OrderedIndex`](crate::OrderedIndex).
/// Every field has a default, so `{}` is a valid options document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Seeds the height source. Without one, heights come from entropy.
    pub seed: Option<u64>,
    /// Number of nodes to reserve room for up front.
    pub capacity: usize,
}

impl Options {
    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(contents.as_str())
    }
}
