use ferrule_compact::MAX_COMPACT_VALUE;
use serde::{Deserialize, Serialize};

/// Limits applied by an importer while reading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// Largest element count accepted from the wire before allocating an array.
    pub max_array_len: usize,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            max_array_len: MAX_COMPACT_VALUE as usize,
        }
    }
}

impl ImporterConfig {
    pub fn with_max_array_len(max_array_len: usize) -> Self {
        Self { max_array_len }
    }
}
