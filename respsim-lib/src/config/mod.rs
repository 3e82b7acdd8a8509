//! Startup configuration handed to the simulator service.

use secrecy::SecretString;

use crate::sim::RawParams;

mod limits;

pub use self::limits::{Limits, MIB};

/// Process wide settings of a [`SimulatorService`].
///
/// Built once at startup and shared read-only by all requests.
///
/// [`SimulatorService`]: crate::http::SimulatorService
#[derive(Debug, Default)]
pub struct ServiceSettings {
    /// Shared access token, the gate is open when absent.
    pub token: Option<SecretString>,
    pub limits: Limits,
    /// Parameter values used for every property a request leaves undefined.
    pub defaults: RawParams,
}

impl ServiceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `token` on every non-preflight request.
    ///
    /// An empty token leaves the gate open.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then(|| SecretString::from(token));
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_defaults(mut self, defaults: RawParams) -> Self {
        self.defaults = defaults;
        self
    }
}
