//! Desktop notification emitters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not asked yet.
    Default,
}

pub trait Notifier {
    /// Ask the host for permission. Hosts without a notification service
    /// answer `Denied`.
    fn request_permission(&mut self) -> Permission;
    fn permission(&self) -> Permission;
    /// Show a notification. Silently does nothing unless permission is
    /// `Granted`.
    fn send(&self, title: &str, body: &str);
}

/// Notifier for hosts without a notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn request_permission(&mut self) -> Permission {
        Permission::Denied
    }

    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn send(&self, _title: &str, _body: &str) {}
}

/// Native desktop notifications through notify-rust.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
    permission: Permission,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            permission: Permission::Default,
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("pomobell")
    }
}

impl Notifier for DesktopNotifier {
    fn request_permission(&mut self) -> Permission {
        if self.permission != Permission::Granted {
            self.permission = probe_host();
        }
        self.permission
    }

    fn permission(&self) -> Permission {
        self.permission
    }

    fn send(&self, title: &str, body: &str) {
        if self.permission != Permission::Granted {
            return;
        }
        if let Err(e) = notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname(&self.app_name)
            .show()
        {
            tracing::debug!(error = %e, "notification not shown");
        }
    }
}

/// Freedesktop hosts need a running notification daemon.
#[cfg(all(unix, not(target_os = "macos")))]
fn probe_host() -> Permission {
    match notify_rust::get_server_information() {
        Ok(_) => Permission::Granted,
        Err(e) => {
            tracing::debug!(error = %e, "no notification server");
            Permission::Denied
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn probe_host() -> Permission {
    Permission::Granted
}
