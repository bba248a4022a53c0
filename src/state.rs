use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::TokenVerifier;

/// Shared application state handed to every handler via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(pool: SqlitePool, verifier: TokenVerifier) -> Self {
        Self {
            pool,
            verifier: Arc::new(verifier),
        }
    }
}
