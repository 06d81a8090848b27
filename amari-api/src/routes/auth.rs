/// Authentication endpoints
///
/// This module provides account and session endpoints:
/// - Registration and login
/// - Logout and the current-user profile
/// - Password change and token-based password reset
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and start a session
/// - `POST /v1/auth/logout` - End the current session
/// - `GET /v1/auth/me` - Current user
/// - `PATCH /v1/auth/me` - Update profile
/// - `POST /v1/auth/change-password` - Change password
/// - `POST /v1/auth/forgot-password` - Request a reset token
/// - `POST /v1/auth/reset-password` - Redeem a reset token
///
/// Login, registration and the password-reset pair are rate limited per
/// client IP.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::rate_limit::enforce,
};
use amari_shared::{
    auth::{
        password::{hash_password, validate_password, verify_password},
        session::{AuthContext, SESSION_COOKIE},
    },
    models::{
        password_reset::PasswordReset,
        session::{CreateSession, Session},
        user::{CreateUser, UpdateProfile, User, UserRole},
    },
    ratelimit::{client_ip, UNKNOWN_CLIENT},
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Answer to every forgot-password request, whether or not the email exists
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent.";

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token. Please request a new one.";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked against the password policy after field validation
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    /// `couple` (default) or `vendor`
    pub user_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,

    /// Session token, also set as the `amari_session` cookie
    pub token: String,

    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,

    /// An empty string clears the phone number
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    /// An empty string clears the profile image
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Generic `{ok, message}` acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub message: String,

    /// Reset token, only returned outside production where no mailer exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            ok: true,
            message: message.to_string(),
            reset_token: None,
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ana@example.com",
///   "password": "SecureP@ss123",
///   "first_name": "Ana",
///   "last_name": "Silva",
///   "user_type": "couple"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed (including `user_type: admin`)
/// - `409 Conflict`: Email already exists
/// - `429 Too Many Requests`: Registration rate limit hit
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let ip = client_ip(&headers);
    enforce(
        &state.limiters.register,
        &ip,
        "Too many registration attempts. Please try again later.",
    )?;

    req.validate()?;
    validate_password(&req.password).map_err(|msg| ApiError::invalid_field("password", msg))?;

    let role = match req.user_type.as_deref().map(str::trim) {
        None | Some("") => UserRole::Couple,
        Some(value) => match UserRole::from_str(&value.to_lowercase()) {
            Some(role @ (UserRole::Couple | UserRole::Vendor)) => role,
            _ => {
                return Err(ApiError::invalid_field(
                    "user_type",
                    "user_type must be couple or vendor",
                ))
            }
        },
    };

    let password_hash = hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone: req.phone.filter(|p| !p.trim().is_empty()),
            role,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Login and start a session
///
/// Unknown email, inactive account and wrong password are indistinguishable
/// to the caller. A successful login clears the caller's login rate limit.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `429 Too Many Requests`: Login rate limit hit
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let ip = client_ip(&headers);
    enforce(
        &state.limiters.login,
        &ip,
        "Too many login attempts. Please try again later.",
    )?;

    req.validate()?;

    let user = User::find_active_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| {
            tracing::debug!(ip = %ip, "Login for unknown or inactive account");
            ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
        })?;

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.chars().take(512).collect::<String>());

    let (session, token) = Session::create(
        &state.db,
        CreateSession {
            user_id: user.id,
            ttl: state.config.session_ttl(),
            ip_address: Some(ip.clone()).filter(|ip| ip != UNKNOWN_CLIENT),
            user_agent,
        },
    )
    .await?;

    User::update_last_login(&state.db, user.id).await?;
    state.limiters.login.reset(&ip);

    tracing::info!(user_id = %user.id, session_id = %session.id, "User logged in");

    let jar = jar.add(session_cookie(token.clone(), state.config.is_production()));

    Ok((
        jar,
        Json(LoginResponse {
            user,
            token,
            expires_at: session.expires_at,
        }),
    ))
}

/// End the presented session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    Session::delete(&state.db, auth.session_id).await?;

    tracing::info!(user_id = %auth.user_id, session_id = %auth.session_id, "User logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(MessageResponse::new("Logged out"))))
}

/// Current user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse { user }))
}

/// Update the current user's profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate()?;

    let clearable = |value: Option<String>| {
        value.map(|v| {
            let v = v.trim().to_string();
            Some(v).filter(|v| !v.is_empty())
        })
    };

    let update = UpdateProfile {
        first_name: req.first_name.map(|v| v.trim().to_string()),
        last_name: req.last_name.map(|v| v.trim().to_string()),
        phone: clearable(req.phone),
        profile_image: clearable(req.profile_image),
    };

    let user = User::update_profile(&state.db, auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse { user }))
}

/// Change password
///
/// Every session of the user, including the current one, is ended.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: New password fails the policy
/// - `400 Bad Request`: Current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    validate_password(&req.new_password)
        .map_err(|msg| ApiError::invalid_field("new_password", msg))?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&req.new_password)?;

    let mut tx = state.db.begin().await?;
    User::set_password_hash(&mut *tx, user.id, &new_hash).await?;
    let ended = Session::delete_for_user(&mut *tx, user.id).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, sessions_ended = ended, "Password changed");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((
        jar,
        Json(MessageResponse::new(
            "Password changed. Please log in again.",
        )),
    ))
}

/// Request a password reset token
///
/// Always answers with the same message so emails cannot be enumerated.
/// Outside production the token is included in the response.
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let ip = client_ip(&headers);
    enforce(
        &state.limiters.password_reset,
        &ip,
        "Too many password reset requests. Please try again later.",
    )?;

    req.validate()?;

    let mut response = MessageResponse::new(FORGOT_PASSWORD_MESSAGE);

    if let Some(user) = User::find_active_by_email(&state.db, &req.email).await? {
        let (reset, token) =
            PasswordReset::create(&state.db, user.id, state.config.reset_token_ttl()).await?;

        tracing::info!(
            user_id = %user.id,
            expires_at = %reset.expires_at,
            "Password reset token issued"
        );

        if !state.config.is_production() {
            response.reset_token = Some(token);
        }
    }

    Ok(Json(response))
}

/// Redeem a reset token and set a new password
///
/// # Errors
///
/// - `422 Unprocessable Entity`: New password fails the policy
/// - `400 Bad Request`: Token unknown, used or expired
pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let ip = client_ip(&headers);
    enforce(
        &state.limiters.password_reset,
        &ip,
        "Too many password reset requests. Please try again later.",
    )?;

    if req.token.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Token and new password are required".to_string(),
        ));
    }

    validate_password(&req.new_password)
        .map_err(|msg| ApiError::invalid_field("new_password", msg))?;

    let new_hash = hash_password(&req.new_password)?;

    let user_id = PasswordReset::redeem(&state.db, req.token.trim(), &new_hash)
        .await?
        .ok_or_else(|| ApiError::BadRequest(INVALID_RESET_TOKEN.to_string()))?;

    tracing::info!(user_id = %user_id, "Password reset completed");

    Ok(Json(MessageResponse::new(
        "Password has been reset successfully. Please log in with your new password.",
    )))
}

/// The `amari_session` cookie for a freshly issued token
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), true);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_session_cookie_not_secure_in_development() {
        let cookie = session_cookie("abc".to_string(), false);
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
            first_name: String::new(),
            last_name: "Silva".to_string(),
            phone: None,
            user_type: None,
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("first_name"));
        assert!(!fields.contains_key("last_name"));
    }

    #[test]
    fn test_message_response_hides_missing_token() {
        let json = serde_json::to_value(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)).unwrap();
        assert_eq!(json["ok"], true);
        assert!(json.get("reset_token").is_none());
    }
}
