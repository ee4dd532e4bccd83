//! Authentication route handlers.
//!
//! Login, registration, logout, and the password-reset flow.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot-password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    pub email: String,
}

/// Reset-password form data.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

/// Forgot-password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Reset-password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetTemplate {
    pub token: String,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Login page.
#[instrument]
pub async fn login_page(Query(query): Query<MessageQuery>) -> LoginTemplate {
    LoginTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Login action.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth.login(&form.email, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email,
            };
            set_current_user(&session, &current)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => Ok(LoginTemplate {
            error: Some("Invalid email or password".to_owned()),
            success: None,
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Register page.
#[instrument]
pub async fn register_page() -> RegisterTemplate {
    RegisterTemplate { error: None }
}

/// Register action; logs the new user in on success.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth
        .register(&form.email, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email,
            };
            set_current_user(&session, &current)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Redirect::to("/").into_response())
        }
        Err(
            err @ (AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_)
            | AuthError::PasswordMismatch
            | AuthError::UserAlreadyExists),
        ) => Ok(RegisterTemplate {
            error: Some(err.to_string()),
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Logout action.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Redirect::to("/"))
}

/// Forgot-password page.
#[instrument]
pub async fn forgot_page() -> ForgotTemplate {
    ForgotTemplate {
        error: None,
        success: None,
    }
}

/// Issue a reset token and email the reset link.
///
/// Without a configured email transport the link is logged instead, which
/// keeps local development usable.
#[instrument(skip(state, form))]
pub async fn forgot(
    State(state): State<AppState>,
    Form(form): Form<ForgotForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth.start_password_reset(&form.email).await {
        Ok((user, token)) => {
            let base = state.config().base_url.trim_end_matches('/');
            let reset_url = format!("{base}/reset/{token}");

            if let Some(email) = state.email() {
                email
                    .send_password_reset(user.email.as_str(), &reset_url)
                    .await?;
            } else {
                tracing::info!(reset_url = %reset_url, "email not configured; logging reset link");
            }

            Ok(ForgotTemplate {
                error: None,
                success: Some("You have been emailed a password reset link.".to_owned()),
            }
            .into_response())
        }
        Err(AuthError::UserNotFound | AuthError::InvalidEmail(_)) => Ok(ForgotTemplate {
            error: Some("No account with that email exists.".to_owned()),
            success: None,
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Reset-password page; verifies the token before showing the form.
#[instrument(skip(state, token))]
pub async fn reset_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth.check_reset_token(&token).await {
        Ok(_) => Ok(ResetTemplate { token, error: None }.into_response()),
        Err(AuthError::InvalidResetToken) => {
            Ok(Redirect::to("/login?error=Reset+token+is+invalid+or+expired").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reset the password and log the user in.
#[instrument(skip(state, session, token, form))]
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth
        .reset_password(&token, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email,
            };
            set_current_user(&session, &current)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Redirect::to("/").into_response())
        }
        Err(err @ (AuthError::WeakPassword(_) | AuthError::PasswordMismatch)) => {
            Ok(ResetTemplate {
                token,
                error: Some(err.to_string()),
            }
            .into_response())
        }
        Err(AuthError::InvalidResetToken) => {
            Ok(Redirect::to("/login?error=Reset+token+is+invalid+or+expired").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
