//! User service
//!
//! Signup, login and logout, session validation, and user management for
//! admins and for users editing their own profile.

use crate::config::AuthConfig;
use crate::db::repositories::{is_unique_violation, SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, UpdateUserInput, User, UserRole};
use crate::services::category::CategoryService;
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::services::rate_limiter::LoginRateLimiter;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Unknown user or wrong password
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Account exists but may not sign in
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Too many attempts: {0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// `individual`, `business`, ...; kept in preferences
    pub account_type: Option<String>,
    /// Free-form address block; kept in preferences
    pub location: Option<Value>,
    /// Category slugs
    #[serde(default)]
    pub selected_categories: Vec<String>,
    /// Subcategory slugs
    #[serde(default)]
    pub selected_subcategories: Vec<String>,
}

/// Body of `POST /api/auth/login`; `identifier` is an email or a username
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default, alias = "email", alias = "username")]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

impl LoginInput {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Body of `POST /api/admin/users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserInput {
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Body of `PUT /api/admin/users/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserInput {
    #[serde(flatten)]
    pub fields: UpdateUserInput,
    /// New password, hashed before it is stored
    pub password: Option<String>,
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    categories: Arc<CategoryService>,
    rate_limiter: LoginRateLimiter,
    session_ttl: Duration,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        categories: Arc<CategoryService>,
    ) -> Self {
        Self::with_auth_config(user_repo, session_repo, categories, &AuthConfig::default())
    }

    pub fn with_auth_config(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        categories: Arc<CategoryService>,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            categories,
            rate_limiter: LoginRateLimiter::with_limits(auth.max_login_attempts, auth.lockout_minutes),
            session_ttl: Duration::days(auth.session_ttl_days),
        }
    }

    /// Register a user account
    ///
    /// The username is taken from the email and suffixed `-2`, `-3`, ...
    /// when already in use. Selected services are resolved to names and
    /// stored in `preferences.selectedServices`.
    pub async fn signup(&self, input: SignupInput) -> Result<User, UserServiceError> {
        let email = normalize_email(&input.email)?;
        check_password(&input.password)?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::ValidationError("User already exists".to_string()));
        }

        let username = self.unique_username(username_from_email(&email)).await?;
        let services = self
            .categories
            .resolve_selected_services(&input.selected_categories, &input.selected_subcategories)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to resolve selected services: {}", e))?;

        let mut preferences = Map::new();
        preferences.insert(
            "selectedServices".to_string(),
            Value::Array(services.into_iter().map(Value::String).collect()),
        );
        if let Some(account_type) = input.account_type.filter(|a| !a.trim().is_empty()) {
            preferences.insert("accountType".to_string(), Value::String(account_type));
        }
        if let Some(location) = input.location.filter(|l| !l.is_null()) {
            preferences.insert("location".to_string(), location);
        }

        let create = CreateUserInput {
            username,
            email,
            password_hash: hash_password(&input.password)?,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            role: UserRole::User,
            preferences,
        };
        let user = self.insert(&create).await?;
        tracing::info!(user_id = user.id, username = %user.username, "user signed up");
        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn login(&self, input: LoginInput) -> Result<LoginResult, UserServiceError> {
        let identifier = input.identifier.trim();
        if identifier.is_empty() || input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }
        if self.rate_limiter.is_limited(identifier).await {
            tracing::warn!(identifier, "login rate limited");
            return Err(UserServiceError::RateLimited(
                "Too many failed login attempts, try again later".to_string(),
            ));
        }

        let user = match self.find_by_identifier(identifier).await? {
            Some(user) if verify_password(&input.password, &user.password_hash)? => user,
            _ => {
                self.rate_limiter.record_failure(identifier).await;
                return Err(UserServiceError::AuthenticationError(
                    "Invalid email or password".to_string(),
                ));
            }
        };

        if !user.is_active {
            return Err(UserServiceError::Forbidden(
                "Account is inactive. Please contact support.".to_string(),
            ));
        }
        self.rate_limiter.clear(identifier).await;

        let session = self
            .session_repo
            .create(&Session::start(user.id, self.session_ttl))
            .await
            .context("Failed to create session")?;
        tracing::info!(user_id = user.id, "user logged in");

        Ok(LoginResult {
            user,
            token: session.id,
            expires_at: session.expires_at,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// The active user behind a live session
    ///
    /// Expired sessions are deleted on sight.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get session user")?;
        Ok(user.filter(|u| u.is_active))
    }

    /// Remove every expired session and stale login failures
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        self.rate_limiter.cleanup().await;
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }

    pub async fn get(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.user_repo.list().await.context("Failed to list users")?)
    }

    /// Admin create with an explicit role
    pub async fn create(&self, input: NewUserInput) -> Result<User, UserServiceError> {
        let email = normalize_email(&input.email)?;
        check_password(&input.password)?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::ValidationError("User already exists".to_string()));
        }

        let username = match input.username.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(username) => {
                if self
                    .user_repo
                    .get_by_username(username)
                    .await
                    .context("Failed to check username")?
                    .is_some()
                {
                    return Err(UserServiceError::ValidationError(
                        "Username already taken".to_string(),
                    ));
                }
                username.to_string()
            }
            None => self.unique_username(username_from_email(&email)).await?,
        };

        let create = CreateUserInput {
            username,
            email,
            password_hash: hash_password(&input.password)?,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            role: input.role,
            preferences: Map::new(),
        };
        self.insert(&create).await
    }

    /// Insert a user; losing a race on the unique email or username is a duplicate
    async fn insert(&self, create: &CreateUserInput) -> Result<User, UserServiceError> {
        self.user_repo.create(create).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserServiceError::ValidationError("User already exists".to_string())
            } else {
                UserServiceError::InternalError(e.context("Failed to create user"))
            }
        })
    }

    /// Admin update: profile fields plus role, status and password
    pub async fn admin_update(
        &self,
        id: i64,
        input: AdminUpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get(id).await?;
        apply_profile(&mut user, &input.fields);
        if let Some(role) = input.fields.role {
            user.role = role;
        }
        if let Some(is_active) = input.fields.is_active {
            user.is_active = is_active;
        }
        if let Some(password) = input.password.filter(|p| !p.is_empty()) {
            check_password(&password)?;
            user.password_hash = hash_password(&password)?;
        }

        let updated = self.user_repo.update(&user).await.context("Failed to update user")?;
        if !updated.is_active {
            self.session_repo
                .delete_by_user(id)
                .await
                .context("Failed to end sessions of deactivated user")?;
        }
        Ok(updated)
    }

    /// Self-service update; role and status are left untouched
    pub async fn update_profile(&self, id: i64, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let mut user = self.get(id).await?;
        apply_profile(&mut user, &input);
        Ok(self.user_repo.update(&user).await.context("Failed to update profile")?)
    }

    /// Merge keys into the stored preferences; `null` removes a key
    pub async fn update_preferences(
        &self,
        id: i64,
        preferences: Map<String, Value>,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get(id).await?;
        for (key, value) in preferences {
            if value.is_null() {
                user.preferences.remove(&key);
            } else {
                user.preferences.insert(key, value);
            }
        }
        Ok(self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update preferences")?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        if !self.user_repo.delete(id).await.context("Failed to delete user")? {
            return Err(UserServiceError::NotFound(id));
        }
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, UserServiceError> {
        let user = if identifier.contains('@') {
            self.user_repo
                .get_by_email(&identifier.to_lowercase())
                .await
                .context("Failed to get user by email")?
        } else {
            self.user_repo
                .get_by_username(identifier)
                .await
                .context("Failed to get user by username")?
        };
        Ok(user)
    }

    async fn unique_username(&self, base: String) -> Result<String, UserServiceError> {
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self
            .user_repo
            .get_by_username(&candidate)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        Ok(candidate)
    }
}

fn apply_profile(user: &mut User, input: &UpdateUserInput) {
    if let Some(first_name) = &input.first_name {
        user.first_name = Some(first_name.clone());
    }
    if let Some(last_name) = &input.last_name {
        user.last_name = Some(last_name.clone());
    }
    if let Some(phone) = &input.phone {
        user.phone = Some(phone.clone());
    }
    if let Some(avatar) = &input.avatar {
        user.avatar = Some(avatar.clone());
    }
}

fn normalize_email(email: &str) -> Result<String, UserServiceError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(UserServiceError::ValidationError(
            "A valid email is required".to_string(),
        )),
    }
}

fn check_password(password: &str) -> Result<(), UserServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserServiceError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Local part of an email; `email` is already validated
fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{SqlxCategoryRepository, SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateCategoryInput, CreateSubcategoryInput};
    use serde_json::json;

    struct Fixture {
        service: UserService,
        categories: Arc<CategoryService>,
        sessions: Arc<dyn SessionRepository>,
    }

    async fn setup_test_service() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let cache = create_cache(&CacheConfig::default())
            .await
            .expect("Failed to create cache");
        let categories = Arc::new(CategoryService::new(
            SqlxCategoryRepository::boxed(pool.clone()),
            cache,
        ));
        let sessions = SqlxSessionRepository::boxed(pool.clone());
        let auth = AuthConfig {
            max_login_attempts: 3,
            ..AuthConfig::default()
        };
        let service = UserService::with_auth_config(
            SqlxUserRepository::boxed(pool),
            sessions.clone(),
            categories.clone(),
            &auth,
        );
        Fixture {
            service,
            categories,
            sessions,
        }
    }

    fn signup(email: &str) -> SignupInput {
        SignupInput {
            email: email.to_string(),
            password: "secret123".to_string(),
            ..SignupInput::default()
        }
    }

    #[tokio::test]
    async fn test_signup_derives_unique_usernames() {
        let fx = setup_test_service().await;
        let first = fx.service.signup(signup("Asha@Example.in")).await.unwrap();
        let second = fx.service.signup(signup("asha@other.in")).await.unwrap();
        let third = fx.service.signup(signup("asha@third.in")).await.unwrap();

        assert_eq!(first.email, "asha@example.in");
        assert_eq!(first.username, "asha");
        assert_eq!(second.username, "asha-2");
        assert_eq!(third.username, "asha-3");
        assert_eq!(first.role, UserRole::User);
        assert!(first.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let fx = setup_test_service().await;
        let err = fx.service.signup(signup("no-at-sign")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(_)));

        let err = fx
            .service
            .signup(SignupInput {
                password: "123".to_string(),
                ..signup("short@example.in")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(_)));

        fx.service.signup(signup("dup@example.in")).await.unwrap();
        let err = fx.service.signup(signup("dup@example.in")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(ref m) if m == "User already exists"));
    }

    #[tokio::test]
    async fn test_insert_race_on_email_is_duplicate() {
        let fx = setup_test_service().await;
        fx.service.signup(signup("race@example.in")).await.unwrap();

        let late = CreateUserInput {
            username: "race-2".to_string(),
            email: "race@example.in".to_string(),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            role: UserRole::User,
            preferences: Map::new(),
        };
        let err = fx.service.insert(&late).await.unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(ref m) if m == "User already exists"));
    }

    #[tokio::test]
    async fn test_concurrent_signups_create_one_user() {
        let fx = setup_test_service().await;
        let (a, b) = tokio::join!(
            fx.service.signup(signup("twice@example.in")),
            fx.service.signup(signup("twice@example.in")),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(UserServiceError::ValidationError(m)) if m == "User already exists"
        )));
    }

    #[tokio::test]
    async fn test_signup_stores_selected_services() {
        let fx = setup_test_service().await;
        let education = fx
            .categories
            .create(CreateCategoryInput::new("Education"))
            .await
            .unwrap();
        fx.categories
            .create_subcategory(CreateSubcategoryInput {
                base: CreateCategoryInput::new("Language Classes"),
                parent_category_id: education.id,
            })
            .await
            .unwrap();

        let user = fx
            .service
            .signup(SignupInput {
                selected_categories: vec!["education".to_string()],
                selected_subcategories: vec!["language-classes".to_string(), "nope".to_string()],
                account_type: Some("business".to_string()),
                ..signup("tutor@example.in")
            })
            .await
            .unwrap();
        assert_eq!(
            user.preferences.get("selectedServices"),
            Some(&json!(["Education", "Language Classes"]))
        );
        assert_eq!(user.preferences.get("accountType"), Some(&json!("business")));
    }

    #[tokio::test]
    async fn test_login_by_email_or_username() {
        let fx = setup_test_service().await;
        let user = fx.service.signup(signup("ravi@example.in")).await.unwrap();

        let result = fx.service.login(LoginInput::new("RAVI@example.in", "secret123")).await.unwrap();
        assert_eq!(result.user.id, user.id);
        assert!(result.expires_at > Utc::now() + Duration::days(6));

        let by_name = fx.service.login(LoginInput::new("ravi", "secret123")).await.unwrap();
        assert_ne!(by_name.token, result.token);

        let current = fx.service.validate_session(&result.token).await.unwrap();
        assert_eq!(current.map(|u| u.id), Some(user.id));

        fx.service.logout(&result.token).await.unwrap();
        assert!(fx.service.validate_session(&result.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let fx = setup_test_service().await;
        let user = fx.service.signup(signup("meera@example.in")).await.unwrap();

        let err = fx.service.login(LoginInput::new("meera", "wrong-pass")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::AuthenticationError(_)));
        let err = fx.service.login(LoginInput::new("ghost", "secret123")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::AuthenticationError(_)));

        fx.service
            .admin_update(
                user.id,
                AdminUpdateUserInput {
                    fields: UpdateUserInput {
                        is_active: Some(false),
                        ..UpdateUserInput::default()
                    },
                    password: None,
                },
            )
            .await
            .unwrap();
        let err = fx.service.login(LoginInput::new("meera", "secret123")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_login_rate_limited() {
        let fx = setup_test_service().await;
        fx.service.signup(signup("kiran@example.in")).await.unwrap();

        for _ in 0..3 {
            let _ = fx.service.login(LoginInput::new("kiran", "bad-pass")).await;
        }
        let err = fx.service.login(LoginInput::new("kiran", "secret123")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let fx = setup_test_service().await;
        let user = fx.service.signup(signup("old@example.in")).await.unwrap();

        let session = fx
            .sessions
            .create(&Session::start(user.id, Duration::seconds(-5)))
            .await
            .unwrap();
        assert!(fx.service.validate_session(&session.id).await.unwrap().is_none());
        assert!(fx.sessions.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_create_update_delete() {
        let fx = setup_test_service().await;
        let agent = fx
            .service
            .create(NewUserInput {
                email: "agent@example.in".to_string(),
                password: "secret123".to_string(),
                role: UserRole::Agent,
                ..NewUserInput::default()
            })
            .await
            .unwrap();
        assert_eq!(agent.role, UserRole::Agent);
        assert_eq!(agent.username, "agent");

        let updated = fx
            .service
            .admin_update(
                agent.id,
                AdminUpdateUserInput {
                    fields: UpdateUserInput {
                        role: Some(UserRole::Admin),
                        first_name: Some("Anil".to_string()),
                        ..UpdateUserInput::default()
                    },
                    password: Some("newsecret".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(updated.is_admin());
        assert_eq!(updated.first_name.as_deref(), Some("Anil"));
        assert!(fx.service.login(LoginInput::new("agent", "newsecret")).await.is_ok());

        assert_eq!(fx.service.list().await.unwrap().len(), 1);
        fx.service.delete(agent.id).await.unwrap();
        assert!(matches!(
            fx.service.delete(agent.id).await.unwrap_err(),
            UserServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_profile_update_ignores_role() {
        let fx = setup_test_service().await;
        let user = fx.service.signup(signup("self@example.in")).await.unwrap();

        let updated = fx
            .service
            .update_profile(
                user.id,
                UpdateUserInput {
                    phone: Some("9876543210".to_string()),
                    role: Some(UserRole::Admin),
                    ..UpdateUserInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("9876543210"));
        assert_eq!(updated.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_preferences_merge() {
        let fx = setup_test_service().await;
        let user = fx.service.signup(signup("prefs@example.in")).await.unwrap();

        let mut prefs = Map::new();
        prefs.insert("theme".to_string(), json!("dark"));
        let updated = fx.service.update_preferences(user.id, prefs).await.unwrap();
        assert_eq!(updated.preferences.get("theme"), Some(&json!("dark")));
        assert!(updated.preferences.contains_key("selectedServices"));

        let mut removal = Map::new();
        removal.insert("theme".to_string(), Value::Null);
        let updated = fx.service.update_preferences(user.id, removal).await.unwrap();
        assert!(updated.preferences.get("theme").is_none());
    }
}
