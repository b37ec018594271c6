use crate::config::Config;
use crate::coordinator::error::WorkflowError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use super::jwt::verify_token;

/// Verified caller identity, extracted once per request and threaded
/// into every handler as an explicit argument.
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<Role>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => {
                return ready(Err(
                    WorkflowError::Unauthorized("Missing token".to_string()).into()
                ));
            }
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => {
                return ready(Err(
                    WorkflowError::Unauthorized("Invalid token".to_string()).into()
                ));
            }
        };

        ready(Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            name: claims.name,
            roles: claims.roles,
        }))
    }
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn require_admin(&self) -> Result<(), WorkflowError> {
        if self.has_role(Role::Admin) {
            Ok(())
        } else {
            Err(WorkflowError::Forbidden("Admin only".to_string()))
        }
    }
}
