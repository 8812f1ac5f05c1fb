//! Shared application state.

use std::sync::Arc;

use checkout::{InMemoryPaymentGateway, LifecycleSettings, OrderLifecycle};
use common::Clock;
use reports::AdminReports;
use store::Store;

use crate::auth::{Identity, IdentityProvider};
use crate::config::Config;

/// Order lifecycle wired to the in-process gateway.
pub type Lifecycle<S> = OrderLifecycle<S, InMemoryPaymentGateway>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub lifecycle: Lifecycle<S>,
    pub reports: AdminReports<S>,
    /// Catalog access for the product routes.
    pub store: S,
    pub identity: Arc<dyn IdentityProvider>,
    pub admin_email: Option<String>,
    pub clock: Arc<dyn Clock>,
    /// `"postgres"` or `"memory"`, reported by `/health`.
    pub backend: &'static str,
}

impl<S: Store> AppState<S> {
    pub fn new(
        store: S,
        gateway: InMemoryPaymentGateway,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        config: &Config,
        backend: &'static str,
    ) -> Self {
        let settings = LifecycleSettings {
            currency: config.currency.clone(),
            abandoned_after: config.abandoned_after(),
        };

        Self {
            lifecycle: OrderLifecycle::new(store.clone(), gateway, clock.clone(), settings),
            reports: AdminReports::new(store.clone()),
            store,
            identity,
            admin_email: config.admin_email.as_ref().map(|e| e.to_lowercase()),
            clock,
            backend,
        }
    }

    /// Single-admin model: the identity's email equals the configured one.
    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| identity.email.eq_ignore_ascii_case(admin))
    }
}
