//! Account API handlers.
//!
//! ```text
//! POST /api/user/registration {"login":"ada","password":"correct horse"}
//! POST /api/login {"login":"ada","password":"correct horse"}
//! POST /api/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Error, LoginCredentials, LoginValidationError, Registration, RegistrationValidationError,
    User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, require};

/// Body shared by registration and login.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CredentialsRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn into_parts(self) -> Result<(String, String), Error> {
        Ok((
            require(self.login, FieldName::new("login"))?,
            require(self.password, FieldName::new("password"))?,
        ))
    }
}

/// Response for a new account.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredUser {
    pub id: String,
    pub login: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id().to_string(),
            login: user.login().to_string(),
        }
    }
}

/// Response for a successful login.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub is_moderator: bool,
}

fn field_error(field: &str, code: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyLogin => field_error("login", "empty_login", err.to_string()),
        LoginValidationError::EmptyPassword => {
            field_error("password", "empty_password", err.to_string())
        }
    }
}

fn map_registration_error(err: RegistrationValidationError) -> Error {
    match &err {
        RegistrationValidationError::Login(_) => {
            field_error("login", "invalid_login", err.to_string())
        }
        RegistrationValidationError::PasswordTooShort { .. } => {
            field_error("password", "password_too_short", err.to_string())
        }
    }
}

/// Create a plain user account.
#[post("/user/registration")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let (login_name, password) = payload.into_inner().into_parts()?;
    let registration =
        Registration::try_from_parts(&login_name, &password).map_err(map_registration_error)?;
    let user = state.accounts.register(&registration).await?;
    Ok(HttpResponse::Created().json(RegisteredUser::from(user)))
}

/// Exchange credentials for a bearer token.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let (login_name, password) = payload.into_inner().into_parts()?;
    let credentials = LoginCredentials::try_from_parts(&login_name, &password)
        .map_err(map_login_validation_error)?;
    let outcome = state.accounts.login(&credentials).await?;
    let claims = outcome.token.claims;
    Ok(web::Json(LoginResponse {
        access_token: outcome.token.token.as_str().to_owned(),
        token_type: "Bearer".to_owned(),
        expires_in: (claims.expires_at - claims.issued_at).num_seconds(),
        is_moderator: outcome.user.role().is_moderator(),
    }))
}

/// Revoke the presented token.
#[post("/logout")]
pub async fn logout(state: web::Data<HttpState>, auth: Authenticated) -> ApiResult<HttpResponse> {
    state.accounts.logout(&auth.token).await?;
    Ok(HttpResponse::NoContent().finish())
}
