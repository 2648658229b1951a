//! Auth module: accounts, OTP verification, app tokens, kid login and
//! parent/child profiles.
//!
//! # Resources
//!
//! - **User**: email, Google or kid account, keyed by email
//! - **OtpRecord**: short-lived numeric code for verification or reset
//! - **Child**: profile a parent registers, with a 4-digit login code
//! - **Session**: JWT issuance record, used for logout
//!
//! # Usage
//!
//! ```ignore
//! use aidiy_auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(kv, mailer, google, AuthConfig::default());
//! let router = module.routes();
//! ```

pub mod api;
pub mod mailer;
pub mod model;
pub mod service;
pub mod store_impls;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::Router;

use aidiy_core::Module;
use aidiy_kv::KVStore;

use crate::mailer::Mailer;
use crate::service::{AuthConfig, AuthService, GoogleVerifier};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    pub fn new(
        kv: Arc<dyn KVStore>,
        mailer: Arc<dyn Mailer>,
        google: Arc<dyn GoogleVerifier>,
        config: AuthConfig,
    ) -> Self {
        Self {
            service: AuthService::new(kv, mailer, google, config),
        }
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
