// Agent lifecycle states
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one agent instance.
///
/// `parsed → installing → installed → activating → activated`, advanced only
/// by install and activate signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
        }
    }

    /// Activation is accepted once installed, and re-delivery is accepted
    /// once active.
    pub fn can_activate(&self) -> bool {
        matches!(self, Self::Installed | Self::Activated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
