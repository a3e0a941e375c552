//! Notification payload structures.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// Action identifier that opens the application.
pub const ACTION_EXPLORE: &str = "explore";

/// Action identifier that dismisses the notification.
pub const ACTION_CLOSE: &str = "close";

/// Everything shown alongside a notification title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds.
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// Arbitrary data attached to the notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch at which the push arrived.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

/// A button offered on the notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}
