//! Transient notifications.
//!
//! An [`Alert`] is rendered as Bootstrap-style dismissible markup, inserted
//! at the top of an [`AlertContainer`] and removed again after a delay
//! (default [`DEFAULT_DISMISS_AFTER`]).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::logger::colorize_prefix;
use crate::utils::html::{escape, escape_attr};

/// How long an alert stays before it is removed.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(5000);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Alert
// ============================================================================

/// Alert style, the `alert-<kind>` class suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AlertKind {
    #[default]
    Info,
    Success,
    Warning,
    Danger,
    Primary,
    Secondary,
    Light,
    Dark,
    /// Any other class suffix, used verbatim (escaped).
    Custom(String),
}

impl AlertKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Custom(kind) => kind,
        }
    }
}

impl FromStr for AlertKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "info" => Self::Info,
            "success" => Self::Success,
            "warning" => Self::Warning,
            "danger" => Self::Danger,
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            "light" => Self::Light,
            "dark" => Self::Dark,
            other => Self::Custom(other.to_owned()),
        })
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an inserted alert, used for its removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlertId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: AlertId,
    pub message: String,
    pub kind: AlertKind,
}

impl Alert {
    pub fn new(message: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            id: AlertId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            message: message.into(),
            kind,
        }
    }

    /// Dismissible alert markup. The message is escaped.
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                r#"<div class="alert alert-{kind} alert-dismissible fade show" role="alert">"#,
                "{message}",
                r#"<button type="button" class="btn-close" data-bs-dismiss="alert"></button>"#,
                "</div>"
            ),
            kind = escape_attr(self.kind.as_str()),
            message = escape(&self.message),
        )
    }
}

// ============================================================================
// Container port
// ============================================================================

/// Where alerts are shown (the page's `.container`).
pub trait AlertContainer: Send + Sync {
    /// Insert `alert` before every alert already shown.
    fn insert_first(&self, alert: &Alert);

    /// Remove a previously inserted alert; unknown ids are ignored.
    fn remove(&self, id: AlertId);
}

/// In-memory container, newest first.
#[derive(Debug, Default)]
pub struct AlertStack {
    alerts: Mutex<Vec<Alert>>,
}

impl AlertStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts currently shown, newest first.
    pub fn snapshot(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }

    /// Concatenated markup of every shown alert.
    pub fn render(&self) -> String {
        self.alerts.lock().iter().map(Alert::to_html).collect()
    }
}

impl AlertContainer for AlertStack {
    fn insert_first(&self, alert: &Alert) {
        self.alerts.lock().insert(0, alert.clone());
    }

    fn remove(&self, id: AlertId) {
        self.alerts.lock().retain(|alert| alert.id != id);
    }
}

/// Prints alerts to the terminal as they arrive.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAlerts;

impl AlertContainer for TerminalAlerts {
    fn insert_first(&self, alert: &Alert) {
        let kind = alert.kind.as_str();
        eprintln!(
            "{} {}",
            colorize_prefix(kind, &kind.to_ascii_lowercase()),
            alert.message
        );
    }

    /// Printed lines cannot be taken back.
    fn remove(&self, _id: AlertId) {}
}

// ============================================================================
// Notifier
// ============================================================================

/// Shows alerts in a container and removes them after a delay.
#[derive(Clone)]
pub struct Notifier {
    container: Arc<dyn AlertContainer>,
    dismiss_after: Duration,
}

impl Notifier {
    pub fn new(container: Arc<dyn AlertContainer>) -> Self {
        Self {
            container,
            dismiss_after: DEFAULT_DISMISS_AFTER,
        }
    }

    pub fn with_dismiss_after(mut self, dismiss_after: Duration) -> Self {
        self.dismiss_after = dismiss_after;
        self
    }

    /// Show `message` and schedule its removal.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn show(&self, message: impl Into<String>, kind: AlertKind) -> AlertId {
        let alert = Alert::new(message, kind);
        let id = alert.id;
        self.container.insert_first(&alert);

        let container = Arc::clone(&self.container);
        let dismiss_after = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(dismiss_after).await;
            container.remove(id);
        });
        id
    }

    pub fn info(&self, message: impl Into<String>) -> AlertId {
        self.show(message, AlertKind::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> AlertId {
        self.show(message, AlertKind::Success)
    }

    pub fn danger(&self, message: impl Into<String>) -> AlertId {
        self.show(message, AlertKind::Danger)
    }
}

/// Show `message` in `container` for [`DEFAULT_DISMISS_AFTER`].
///
/// `kind` defaults to [`AlertKind::Info`].
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn show_notification(
    container: Arc<dyn AlertContainer>,
    message: &str,
    kind: Option<AlertKind>,
) -> AlertId {
    Notifier::new(container).show(message, kind.unwrap_or_default())
}
