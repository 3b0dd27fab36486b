//! Caller identity use cases.

use std::sync::Arc;

mod authenticate;

pub use authenticate::Authenticate;

/// Container for auth use cases.
pub struct AuthUseCases {
    pub authenticate: Arc<Authenticate>,
}

impl AuthUseCases {
    pub fn new(authenticate: Arc<Authenticate>) -> Self {
        Self { authenticate }
    }
}
