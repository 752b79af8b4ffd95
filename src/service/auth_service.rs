use crate::api_error::ApiError;
use crate::auth::jwt_service::{JwtService, TokenPair};
use crate::db::DbPool;
use crate::models::user::{AuthResponse, CreateUserRequest, LoginRequest, Role, User, UserProfile};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

const USER_COLUMNS: &str =
    "id, email, full_name, phone, role, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: Arc<JwtService>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: Arc<JwtService>) -> Self {
        Self {
            pool,
            jwt_service,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Public sign-up. Only parents and players may register themselves.
    pub async fn register(&self, request: CreateUserRequest) -> Result<AuthResponse, ApiError> {
        if !request.role.self_service() {
            return Err(ApiError::Forbidden);
        }

        let user = self.insert_user(request).await?;
        self.issue_for(user)
    }

    /// Administrator-created account with any role.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserProfile, ApiError> {
        let user = self.insert_user(request).await?;
        Ok(user.into())
    }

    async fn insert_user(&self, request: CreateUserRequest) -> Result<User, ApiError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, full_name, phone, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(request.full_name.trim())
        .bind(request.phone.as_deref().map(str::trim))
        .bind(request.role)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::conflict("Email is already registered"),
            other => other,
        })?;

        info!(user_id = %user.id, role = %user.role, "User created");

        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ApiError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else {
            warn!("Login attempt for unknown email");
            return Err(ApiError::Unauthorized);
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(ApiError::Unauthorized);
        }

        info!(user_id = %user.id, "User logged in");

        self.issue_for(user)
    }

    /// Rotates a refresh token. The account is re-read so a deleted user
    /// cannot refresh and a role change shows up in the new pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self.jwt_service.redeem_refresh_token(refresh_token).await?;
        let user_id = claims.user_id()?;

        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        reissue(&self.jwt_service, user_id, user)
    }

    pub async fn logout(
        &self,
        user_id: Uuid,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), ApiError> {
        self.jwt_service.revoke_token(access_token).await?;
        self.jwt_service
            .revoke_refresh_token(refresh_token, user_id)
            .await?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>, ApiError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY full_name
            "#
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn update_phone(
        &self,
        user_id: Uuid,
        phone: Option<String>,
    ) -> Result<UserProfile, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET phone = $1, updated_at = $2
            WHERE id = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(phone.as_deref().map(str::trim).filter(|p| !p.is_empty()))
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)?;

        Ok(user.into())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if !(8..=128).contains(&new_password.chars().count()) {
            return Err(ApiError::validation(
                "new_password must be between 8 and 128 characters",
            ));
        }

        let user = self.get_user(user_id).await?;
        if !verify_password(old_password, &user.password_hash)? {
            return Err(ApiError::Unauthorized);
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, "Password changed");

        Ok(())
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    fn issue_for(&self, user: User) -> Result<AuthResponse, ApiError> {
        let pair = self.jwt_service.generate_token_pair(user.id, user.role)?;
        Ok(AuthResponse {
            user: user.into(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
            token_type: pair.token_type,
        })
    }
}

/// Issues a fresh pair for the account behind a redeemed refresh token.
pub fn reissue(
    jwt_service: &JwtService,
    user_id: Uuid,
    user: Option<User>,
) -> Result<TokenPair, ApiError> {
    let user = user.ok_or_else(|| {
        warn!(user_id = %user_id, "Refresh for missing account rejected");
        ApiError::Unauthorized
    })?;

    Ok(jwt_service.generate_token_pair(user.id, user.role)?)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    Ok(bcrypt::verify(password, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt_service::TokenType;
    use crate::auth::jwt_service_test::support::test_jwt_service;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Coach@Academy.ORG "), "coach@academy.org");
    }

    #[test]
    fn test_password_hash_and_verify() {
        // minimum cost keeps the test fast
        let hash = hash_password("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    fn account(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "player@academy.org".to_string(),
            full_name: "Sam Player".to_string(),
            phone: None,
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_refresh_rejects_deleted_account() {
        let jwt = test_jwt_service();
        let user_id = Uuid::new_v4();
        let pair = jwt.generate_token_pair(user_id, Role::Coach).unwrap();
        jwt.redeem_refresh_token(&pair.refresh_token).await.unwrap();

        let result = reissue(&jwt, user_id, None);
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let jwt = test_jwt_service();
        let mut user = account(Role::Coach);
        let pair = jwt.generate_token_pair(user.id, Role::Coach).unwrap();
        let claims = jwt.redeem_refresh_token(&pair.refresh_token).await.unwrap();

        // demoted after the original login
        user.role = Role::Parent;
        let reissued = reissue(&jwt, claims.user_id().unwrap(), Some(user)).unwrap();

        let access = jwt
            .validate_token(&reissued.access_token, TokenType::Access)
            .await
            .unwrap();
        assert_eq!(access.role, Role::Parent);
    }
}
