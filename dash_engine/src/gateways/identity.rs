use serde::{Deserialize, Serialize};

use super::GatewayError;
use crate::{db_types::UserId, lifecycle::Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Verifies a bearer credential. Invalid or expired credentials fail with [`GatewayError::Rejected`].
    async fn verify(&self, bearer: &str) -> Result<Identity, GatewayError>;
}
