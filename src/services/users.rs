use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, NotSet, PaginatorTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::AuthService,
    db::DbPool,
    entities::{
        app_user::{self, Entity as AppUser},
        app_user_role::{self, Entity as AppUserRole},
        user_role,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

pub const DEFAULT_ROLE: &str = "USER";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in_secs: u64,
    pub user: UserResponse,
}

/// Account store: registration, credential checks and identity reads.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    auth: AuthService,
    events: EventSender,
    token_lifetime_secs: u64,
}

impl UserService {
    pub fn new(
        db: Arc<DbPool>,
        auth: AuthService,
        events: EventSender,
        token_lifetime_secs: u64,
    ) -> Self {
        Self {
            db,
            auth,
            events,
            token_lifetime_secs,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let taken = AppUser::find()
            .filter(app_user::Column::Email.eq(request.email.clone()))
            .count(db)
            .await?
            > 0;
        if taken {
            return Err(ServiceError::Conflict(format!(
                "An account with email {} already exists",
                request.email
            )));
        }

        let password_hash = self.auth.hash_password(&request.password)?;

        let saved = app_user::ActiveModel {
            id: NotSet,
            name: Set(request.name),
            last_name: Set(request.last_name),
            email: Set(request.email),
            password_hash: Set(password_hash),
            date_created: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        let role = self.role_by_description(DEFAULT_ROLE).await?;
        user_role::ActiveModel {
            user_id: Set(saved.id),
            role_id: Set(role.id),
        }
        .insert(db)
        .await?;

        info!(user_id = saved.id, "user registered");
        self.events.send(Event::UserRegistered(saved.id)).await;

        Ok(Self::to_response(saved, vec![role.description]))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let user = AppUser::find()
            .filter(app_user::Column::Email.eq(request.email.clone()))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".to_string()))?;

        if !self.auth.verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
        }

        let roles = self.roles_of(&user).await?;
        let token = self.auth.issue_token(user.id, &user.email, roles.clone())?;

        info!(user_id = user.id, "user logged in");
        Ok(LoginResponse {
            token,
            expires_in_secs: self.token_lifetime_secs,
            user: Self::to_response(user, roles),
        })
    }

    pub async fn get_user(&self, id: i64) -> Result<UserResponse, ServiceError> {
        let user = AppUser::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User with ID {id} not found")))?;

        let roles = self.roles_of(&user).await?;
        Ok(Self::to_response(user, roles))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserResponse>, ServiceError> {
        let user = AppUser::find()
            .filter(app_user::Column::Email.eq(email))
            .one(&*self.db)
            .await?;

        match user {
            Some(user) => {
                let roles = self.roles_of(&user).await?;
                Ok(Some(Self::to_response(user, roles)))
            }
            None => Ok(None),
        }
    }

    async fn roles_of(&self, user: &app_user::Model) -> Result<Vec<String>, ServiceError> {
        let roles = user.find_related(AppUserRole).all(&*self.db).await?;
        Ok(roles.into_iter().map(|r| r.description).collect())
    }

    /// Looks up a role, creating it on first use so a fresh database can
    /// register users without seeding.
    async fn role_by_description(
        &self,
        description: &str,
    ) -> Result<app_user_role::Model, ServiceError> {
        let existing = AppUserRole::find()
            .filter(app_user_role::Column::Description.eq(description))
            .one(&*self.db)
            .await?;

        match existing {
            Some(role) => Ok(role),
            None => Ok(app_user_role::ActiveModel {
                id: NotSet,
                description: Set(description.to_string()),
            }
            .insert(&*self.db)
            .await?),
        }
    }

    fn to_response(model: app_user::Model, roles: Vec<String>) -> UserResponse {
        UserResponse {
            id: model.id,
            name: model.name,
            last_name: model.last_name,
            email: model.email,
            roles,
            date_created: model.date_created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_validates() {
        let ok = RegisterRequest {
            name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..ok.clone()
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            password: "short".to_string(),
            ..ok
        };
        assert!(short_password.validate().is_err());
    }
}
