//! Authentication service for user registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::{AdminConfig, Config};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Claims;
use crate::models::UserProfile;
use shared::{AuthTokens, LoginInput, RegisterInput, UserType};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Account plus a fresh token pair
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    user_type: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            user_type: self.user_type,
            created_at: self.created_at,
        }
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a customer or provider account
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthSession> {
        input.check()?;
        let email = input.email.trim().to_lowercase();

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Err(AppError::conflict("email", "Email is already registered"));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, user_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, first_name, last_name, user_type, created_at
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.user_type.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %profile.id, user_type = %input.user_type, "User registered");

        let tokens = self.generate_tokens(profile.id, input.user_type)?;
        self.store_refresh_token(profile.id, &tokens.refresh_token).await?;

        Ok(AuthSession {
            user: profile,
            tokens,
        })
    }

    /// Seed the configured administrator account
    ///
    /// An existing account with the same email is left untouched, so
    /// restarts never reset the administrator's password.
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> AppResult<()> {
        admin.check()?;
        let email = admin.email.trim().to_lowercase();

        let password_hash = hash(&admin.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let created = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, user_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(admin.first_name.trim())
        .bind(admin.last_name.trim())
        .bind(UserType::Admin.as_str())
        .fetch_optional(&self.db)
        .await?;

        if let Some(user_id) = created {
            tracing::info!(user_id = %user_id, "Administrator account created");
            return Ok(());
        }

        let user_type = sqlx::query_scalar::<_, String>("SELECT user_type FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;

        if user_type != UserType::Admin.as_str() {
            tracing::warn!(
                user_type = %user_type,
                "Configured administrator email belongs to a non-admin account"
            );
        }
        Ok(())
    }

    /// Authenticate user with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthSession> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, user_type, is_deleted, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(input.email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        if user.is_deleted {
            return Err(AppError::Unauthorized("Account is blocked".to_string()));
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let user_type = user.user_type.parse::<UserType>().map_err(AppError::Internal)?;
        let tokens = self.generate_tokens(user.id, user_type)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        Ok(AuthSession {
            user: user.profile(),
            tokens,
        })
    }

    /// Rotate a refresh token: the old one is revoked and a new pair issued
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = Self::hash_token(refresh_token);

        let mut tx = self.db.begin().await?;

        // Revoking in the lookup itself means a token can only be redeemed once
        let (user_id, user_type) = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            UPDATE refresh_tokens rt
            SET revoked_at = NOW()
            FROM users u
            WHERE u.id = rt.user_id
              AND rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_deleted = FALSE
            RETURNING rt.user_id, u.user_type
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        let user_type = user_type.parse::<UserType>().map_err(AppError::Internal)?;
        let tokens = self.generate_tokens(user_id, user_type)?;

        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(Self::hash_token(&tokens.refresh_token))
        .bind(Utc::now() + Duration::seconds(self.refresh_token_expiry))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(tokens)
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user_id: Uuid, user_type: UserType) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let access_claims = Claims {
            sub: user_id.to_string(),
            user_type,
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        // Opaque refresh token; only its hash is stored
        let refresh_token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(Self::hash_token(token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Hash a token for storage
    fn hash_token(token: &str) -> String {
        Sha256::digest(token.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}
