//! Admin lookup.

use baggo_data::Filter;

use crate::backend::Backend;

const ADMINS_TABLE: &str = "admins";

/// Answers whether a signed-in user is an administrator.
#[derive(Debug, Clone)]
pub struct AdminGateway {
    backend: Backend,
}

impl AdminGateway {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Whether `user_id` has a row in the admins table.
    ///
    /// False in local mode, for an empty id, and when the lookup fails.
    pub async fn is_admin(&self, user_id: &str) -> bool {
        let Backend::Remote(remote) = &self.backend else {
            return false;
        };
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return false;
        }
        match remote.select_one(ADMINS_TABLE, &Filter::eq("user_id", user_id)).await {
            Ok(row) => row.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "admin lookup failed");
                false
            }
        }
    }
}
