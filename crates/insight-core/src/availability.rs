//! Provider Availability
//!
//! Whether an external provider's credential is configured is decided once, on
//! first use, and then held for the lifetime of the owning client. Clients are
//! built once at startup, so in practice this is process-wide state.

use std::sync::OnceLock;

use serde::Serialize;

/// Cached availability of one provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub const fn from_configured(configured: bool) -> Self {
        if configured { Self::Available } else { Self::Unavailable }
    }

    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Lazily-initialized availability flag, `unknown` until first checked
#[derive(Debug, Default)]
pub struct ProviderAvailability {
    state: OnceLock<Availability>,
}

impl ProviderAvailability {
    pub const fn new() -> Self {
        Self {
            state: OnceLock::new(),
        }
    }

    /// Current state; `None` means not checked yet
    pub fn get(&self) -> Option<Availability> {
        self.state.get().copied()
    }

    /// Return the cached state, running `check` only if nothing is cached.
    ///
    /// Concurrent first calls may both run the check; only one result is kept,
    /// and both derive it from the same configuration.
    pub fn resolve(&self, check: impl FnOnce() -> bool) -> Availability {
        *self
            .state
            .get_or_init(|| Availability::from_configured(check()))
    }
}
