//! The cache lifecycle manager and the signals it reacts to.
//!
//! Every lifecycle signal is a variant of [`AgentEvent`] and is dispatched
//! through [`CacheLifecycleManager::handle_event`]. Install and activate
//! complete before the manager's state advances; fetches run independently
//! and never wait for their own cache writes.
//!
//! # Submodules
//!
//! - `events`: the signal union, outcomes and install/activate reports.
//! - `manager`: cache-first fetch interception and version-based eviction.
//! - `state`: the `installing → installed → activating → activated` machine.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod events;
mod manager;
pub mod state;

pub use events::{
    ActivateReport, AgentEvent, EventOutcome, FetchResult, InstallReport, PrecacheFailure,
    ResponseSource, StoreDeletionFailure,
};
pub use manager::CacheLifecycleManager;
pub use state::LifecycleState;
