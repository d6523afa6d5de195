//! Side effects performed after a request completes.
//!
//! [`EffectRunner`] executes an [`Effects`] descriptor against the injected
//! collaborators: the token store, a [`Notifier`] for user-facing toasts and
//! a [`Navigator`] for the login redirect.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::classify::Effects;
use crate::storage::{KeyValueStore, TOKEN_KEY};

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    /// Show a transient message to the user.
    fn notify(&self, message: &str);
}

/// Client navigation.
pub trait Navigator: Send + Sync {
    /// Navigate to a client path such as `/login`.
    fn navigate(&self, path: &str);
}

/// [`Notifier`] that emits toasts as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(target: "eduapi::toast", "{message}");
    }
}

/// [`Navigator`] that only records the navigation in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, path: &str) {
        info!(target: "eduapi::navigation", path, "Navigation requested");
    }
}

/// [`Notifier`] that prints toasts to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}

/// [`Navigator`] for terminals: tells the user where to log in again.
#[derive(Debug, Clone)]
pub struct ConsoleNavigator {
    origin: String,
}

impl ConsoleNavigator {
    /// Create a navigator that resolves paths against `origin`.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        eprintln!(
            "Session expired. Log in again at {}{path} and run `eduapi login --token <TOKEN>`.",
            self.origin.trim_end_matches('/')
        );
    }
}

/// [`Notifier`] that keeps every message, for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// [`Navigator`] that keeps every path, for assertions.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths navigated to so far.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path.to_string());
        }
    }
}

/// Performs [`Effects`] against the client's collaborators.
#[derive(Clone)]
pub struct EffectRunner {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl fmt::Debug for EffectRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRunner")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

impl EffectRunner {
    /// Create a runner over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            navigator,
            login_path: login_path.into(),
        }
    }

    /// Perform `effects`.
    ///
    /// Token removal happens before navigation. A store failure is logged and
    /// the remaining effects still run.
    pub async fn apply(&self, effects: &Effects) {
        if effects.clear_token {
            match self.store.delete(TOKEN_KEY).await {
                Ok(removed) => info!(removed, "Session token cleared"),
                Err(e) => warn!(error = %e, "Failed to clear session token"),
            }
        }

        if effects.navigate_to_login {
            self.navigator.navigate(&self.login_path);
        }

        if let Some(message) = &effects.toast {
            self.notifier.notify(message);
        }
    }
}
