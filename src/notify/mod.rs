//! Notification display and window control collaborators.
//!
//! The agent displays push notifications through a [`Notifier`] and opens
//! the application through a [`WindowOpener`]. The defaults write a
//! structured log event and hand the URL to the desktop's browser.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod models;

pub use models::{NotificationAction, NotificationData, NotificationOptions, ACTION_CLOSE, ACTION_EXPLORE};

use crate::error::{AgentError, Result};
use reqwest::Url;
use tracing::{debug, info};
use uuid::Uuid;

/// Displays system notifications.
pub trait Notifier: Send + Sync {
    /// Show a notification immediately. Returns its identifier.
    fn show(&self, title: &str, options: &NotificationOptions) -> Result<Uuid>;

    /// Dismiss a previously shown notification. Unknown ids are ignored.
    fn close(&self, id: Uuid) -> Result<()>;
}

/// Opens windows or tabs on behalf of the application.
pub trait WindowOpener: Send + Sync {
    fn open_window(&self, url: &Url) -> Result<()>;
}

/// Notifier that emits each notification as a log event.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, title: &str, options: &NotificationOptions) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let actions: Vec<&str> = options.actions.iter().map(|a| a.action.as_str()).collect();
        info!(
            notification_id = %id,
            title,
            body = %options.body,
            icon = %options.icon,
            badge = %options.badge,
            vibrate = ?options.vibrate,
            actions = ?actions,
            "Notification displayed"
        );
        Ok(id)
    }

    fn close(&self, id: Uuid) -> Result<()> {
        debug!(notification_id = %id, "Notification closed");
        Ok(())
    }
}

/// Opens URLs in the user's default browser.
#[derive(Debug, Default, Clone)]
pub struct SystemBrowser;

impl WindowOpener for SystemBrowser {
    fn open_window(&self, url: &Url) -> Result<()> {
        info!("Opening window at {}", url);
        open::that(url.as_str())
            .map_err(|e| AgentError::Window(format!("Could not open {}: {}", url, e)))
    }
}
