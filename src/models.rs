use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Session claims minted by the identity provider and verified by the
/// coordinator. The workflow only ever consumes `sub` (the employee's
/// email) and `roles`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    /// Employee email; the identity every leave record is keyed on
    pub sub: String,
    pub name: String,
    pub roles: Vec<Role>,
    pub exp: usize,
    pub jti: String,
}
