//! Process-wide color scheme with an explicit subscription lifecycle.
//!
//! The host view subscribes when it mounts and unsubscribes when it unmounts.
//! Subscribers are notified only when the scheme actually changes.

use serde::{Deserialize, Serialize};

/// System color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    /// Scheme for a `prefers-color-scheme: dark` media query result.
    pub fn from_prefers_dark(dark: bool) -> Self {
        if dark {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

/// Handle returned by [`ThemeHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(ColorScheme)>;

/// Holds the current color scheme and its subscribers.
#[derive(Default)]
pub struct ThemeHub {
    scheme: ColorScheme,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl ThemeHub {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    /// Register a listener. It is not called with the current value.
    pub fn subscribe(&mut self, listener: impl FnMut(ColorScheme) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Update the scheme, notifying listeners if it changed.
    pub fn set_scheme(&mut self, scheme: ColorScheme) {
        if scheme == self.scheme {
            return;
        }
        log::debug!("Color scheme changed to {:?}", scheme);
        self.scheme = scheme;
        for (_, listener) in self.listeners.iter_mut() {
            listener(scheme);
        }
    }
}
