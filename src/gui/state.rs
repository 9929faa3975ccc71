//! Popup state types

use std::time::{Duration, Instant};

/// What the window is currently doing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// No capture pending; the window shows a hint while visible
    #[default]
    Idle,
    /// A capture arrived and the save form is showing
    Save,
}

/// Folder picker state within the save form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A real folder from the flattened list, by id
    Folder(String),
    /// The "Create new folder…" sentinel entry
    CreateNew,
}

/// What the save form asked for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormAction {
    #[default]
    None,
    /// Save was clicked, or Enter pressed in the name field
    Submit,
    /// Cancel was clicked; the capture is abandoned
    Cancel,
}

/// Toast visual style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    /// General information (blue)
    Info,
    /// Operation completed successfully (green)
    Success,
    /// Error occurred (red)
    Error,
}

/// Notification message with auto-dismiss
#[derive(Debug, Clone)]
pub struct Toast {
    /// Unique identifier
    pub id: u64,
    /// Notification text
    pub message: String,
    /// Info, Success, or Error
    pub toast_type: ToastType,
    /// When toast was created
    pub created_at: Instant,
    /// Auto-dismiss after (Duration::ZERO = persistent)
    pub duration: Duration,
}

impl Toast {
    pub fn new(
        id: u64,
        message: impl Into<String>,
        toast_type: ToastType,
        duration: Duration,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            toast_type,
            created_at: Instant::now(),
            duration,
        }
    }

    /// Info toast, dismissed after 4 seconds
    pub fn info(id: u64, message: impl Into<String>) -> Self {
        Self::new(id, message, ToastType::Info, Duration::from_secs(4))
    }

    /// Success toast, dismissed after 3 seconds
    pub fn success(id: u64, message: impl Into<String>) -> Self {
        Self::new(id, message, ToastType::Success, Duration::from_secs(3))
    }

    /// Error toast, dismissed after 6 seconds; errors linger so a failed
    /// save can be read before retrying
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self::new(id, message, ToastType::Error, Duration::from_secs(6))
    }

    /// Check if this toast should be dismissed
    pub fn is_expired(&self) -> bool {
        if self.duration == Duration::ZERO {
            return false;
        }
        self.created_at.elapsed() >= self.duration
    }
}
