//! Cache store summaries.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// Name and size of one named store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    /// Store name (a cache version identifier).
    pub name: String,
    /// Number of request/response pairs held.
    pub entries: usize,
}
