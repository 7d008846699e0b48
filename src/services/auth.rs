use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{generate_jwt, Claims};
use crate::services::error::ServiceError;
use crate::store::ports::UserStore;

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Credential check and token issuance. The rest of the system only ever
/// sees the verified (role, user_id) principal the middleware extracts.
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::MissingRequired("username/password"));
        }

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = generate_jwt(Claims::new(user.id, user.role.clone()))
            .map_err(ServiceError::TokenSign)?;

        info!(user_id = user.id, role = %user.role, "login succeeded");

        Ok(LoginResponse {
            token,
            user: UserSummary {
                id: user.id,
                username: user.username,
                role: user.role,
                student_id: user.student_id,
                staff_id: user.staff_id,
            },
        })
    }

    pub async fn current_user(&self, user_id: i64) -> Result<UserSummary, ServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("user not found"))?;

        Ok(UserSummary {
            id: user.id,
            username: user.username,
            role: user.role,
            student_id: user.student_id,
            staff_id: user.staff_id,
        })
    }
}
