//! HTTP Handlers

use axum::Form;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use kernel::id::VerificationTokenId;
use platform::cookie::{delete_cookie_header, extract_cookie, set_cookie_header};
use platform::mail::MailDispatcher;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    SignInUseCase, SignOutUseCase, SignUpUseCase, VerifyAccountUseCase,
};
use crate::domain::repository::AuthStore;
use crate::error::AuthError;
use crate::presentation::dto::{ActivateQuery, SignInForm, SignInQuery, SignUpForm};
use crate::presentation::flash::{Flash, read_flash, set_flash_header};
use crate::presentation::views::{self, Notice};

/// Shared state for auth handlers and the session gate
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub mailer: MailDispatcher,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthAppState<R>
where
    R: AuthStore,
{
    pub fn new(repo: R, mailer: MailDispatcher, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            mailer,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Sign In Page
// ============================================================================

/// GET /auth/sign-in
pub async fn sign_in_page<R>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<SignInQuery>,
    headers: HeaderMap,
) -> Response
where
    R: AuthStore,
{
    let flash_cookie = state.config.flash_cookie();
    let flash = read_flash(&headers, &flash_cookie, &state.config.session_secret);

    let mut notices = Vec::new();
    let mut email = String::new();

    if let Some(flash) = &flash {
        if let Some(message) = &flash.message {
            notices.push(Notice::Success(message.clone()));
        }
        if let Some(activated) = &flash.email {
            notices.push(Notice::Success(format!(
                "The account {activated} has been activated. You can sign in now."
            )));
            email.clone_from(activated);
        }
        if let Some(error) = &flash.error {
            notices.push(Notice::Error(error.clone()));
        }
        if let Some(login) = &flash.login {
            email.clone_from(login);
        }
    }

    let flash_error = flash.as_ref().is_some_and(|f| f.error.is_some());
    if query.error.is_some() && !flash_error {
        notices.push(Notice::Error(AuthError::InvalidCredentials.to_string()));
    }
    if query.logout.is_some() {
        notices.push(Notice::Info("You have been signed out.".to_string()));
    }
    if query.expired.is_some() {
        notices.push(Notice::Info(
            "Your session has expired because your account signed in elsewhere.".to_string(),
        ));
    }

    let page = Html(views::sign_in_page(&state.config.routes, &notices, &email));

    if flash.is_some() {
        (
            AppendHeaders([(header::SET_COOKIE, delete_cookie_header(&flash_cookie))]),
            page,
        )
            .into_response()
    } else {
        page.into_response()
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// GET /auth/sign-up
pub async fn sign_up_page<R>(State(_state): State<AuthAppState<R>>) -> Html<String>
where
    R: AuthStore,
{
    Html(views::sign_up_page(&SignUpForm::default(), &Default::default()))
}

/// POST /auth/sign-up
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    Form(form): Form<SignUpForm>,
) -> Response
where
    R: AuthStore,
{
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    match use_case.execute(form.clone().into()).await {
        Ok(output) => {
            let flash = Flash::message(format!(
                "Registration successful. We sent an activation link to {}.",
                output.email
            ));
            redirect_with_flash(&state.config, &state.config.routes.login_page, &flash)
        }
        Err(AuthError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(views::sign_up_page(&form, &errors)),
        )
            .into_response(),
        Err(e @ AuthError::ConfirmationMail(_)) => sign_in_page_with_error(&state.config, e),
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Activation
// ============================================================================

/// GET /auth/activate?token=<uuid>
pub async fn activate<R>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<ActivateQuery>,
) -> Response
where
    R: AuthStore,
{
    let raw = query.token.unwrap_or_default();

    let Ok(token_id) = raw.trim().parse::<VerificationTokenId>() else {
        return sign_in_page_with_error(&state.config, AuthError::InvalidVerificationToken(raw));
    };

    let use_case = VerifyAccountUseCase::new(state.repo.clone(), state.config.clone());

    match use_case.execute(token_id).await {
        Ok(email) => {
            let flash = Flash {
                message: Some("Your account is active.".to_string()),
                email: Some(email.into_db()),
                ..Flash::default()
            };
            redirect_with_flash(&state.config, &state.config.routes.login_page, &flash)
        }
        Err(e @ AuthError::InvalidVerificationToken(_)) => {
            sign_in_page_with_error(&state.config, e)
        }
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST <login processing url>
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Form(form): Form<SignInForm>,
) -> Response
where
    R: AuthStore,
{
    let submitted_email = form.email.trim().to_string();
    let use_case = SignInUseCase::new(state.repo.clone(), state.config.clone());

    match use_case.execute(form.into()).await {
        Ok(output) => (
            AppendHeaders([(
                header::SET_COOKIE,
                set_cookie_header(&state.config.session_cookie(), &output.session_token),
            )]),
            Redirect::to(&state.config.routes.default_success_url),
        )
            .into_response(),
        Err(e @ (AuthError::InvalidCredentials | AuthError::AccountDisabled)) => {
            e.log();
            let flash = Flash {
                error: Some(e.to_string()),
                login: Some(submitted_email),
                ..Flash::default()
            };
            redirect_with_flash(&state.config, &state.config.routes.login_failure_url, &flash)
        }
        Err(e) => e.into_response(),
    }
}

/// POST <logout url>
pub async fn logout<R>(State(state): State<AuthAppState<R>>, headers: HeaderMap) -> Response
where
    R: AuthStore,
{
    let session_cookie = state.config.session_cookie();

    if let Some(token) = extract_cookie(&headers, &session_cookie.name) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign out without a valid session");
        }
    }

    (
        AppendHeaders([(header::SET_COOKIE, delete_cookie_header(&session_cookie))]),
        Redirect::to(&state.config.routes.logout_success_url),
    )
        .into_response()
}

// ============================================================================
// Helper Functions
// ============================================================================

fn redirect_with_flash(config: &AuthConfig, to: &str, flash: &Flash) -> Response {
    (
        AppendHeaders([(
            header::SET_COOKIE,
            set_flash_header(&config.flash_cookie(), &config.session_secret, flash),
        )]),
        Redirect::to(to),
    )
        .into_response()
}

/// Sign-in page with the error as a banner, answered with the error's status.
fn sign_in_page_with_error(config: &AuthConfig, error: AuthError) -> Response {
    error.log();
    let app_error = error.to_app_error();
    let status =
        StatusCode::from_u16(app_error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut message = app_error.message().to_string();
    if let Some(action) = app_error.action() {
        message = format!("{message}. {action}.");
    }

    (
        status,
        Html(views::sign_in_page(
            &config.routes,
            &[Notice::Error(message)],
            "",
        )),
    )
        .into_response()
}
