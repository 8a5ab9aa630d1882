//! Auth Middleware
//!
//! Session gate for the whole application router. Runs, in order: access
//! policy lookup, session check, role check, principal attachment.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use kernel::id::AuthSessionId;
use platform::cookie::{delete_cookie_header, extract_cookie};

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{account_id::AccountId, email::Email, user_role::UserRole};
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// The signed-in account, available to handlers as `Extension<Principal>`.
#[derive(Debug, Clone)]
pub struct Principal {
    pub account_id: AccountId,
    pub email: Email,
    pub role: UserRole,
    pub session_id: AuthSessionId,
}

impl From<&AuthSession> for Principal {
    fn from(session: &AuthSession) -> Self {
        Self {
            account_id: session.account_id,
            email: session.email.clone(),
            role: session.role,
            session_id: session.session_id,
        }
    }
}

/// Middleware that requires a valid auth session outside the allow-list
pub async fn require_auth_session<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Response
where
    R: AuthStore,
{
    let access = state.config.access.access_for(req.uri().path());
    if !access.requires_session() {
        return next.run(req).await;
    }

    let Some(token) = extract_cookie(req.headers(), &state.config.session_cookie_name) else {
        return Redirect::to(&state.config.routes.login_page).into_response();
    };

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());

    let session = match use_case.execute(&token).await {
        Ok(session) => session,
        Err(AuthError::SessionExpired) => {
            tracing::debug!("Evicted session used, redirecting to session-expired page");
            return clear_session_and_redirect(&state.config, &state.config.routes.session_expired_url);
        }
        Err(AuthError::SessionInvalid) => {
            return clear_session_and_redirect(&state.config, &state.config.routes.login_page);
        }
        Err(e) => return e.into_response(),
    };

    let principal = Principal::from(&session);

    if !access.allows(principal.role) {
        tracing::warn!(
            account_id = %principal.account_id,
            role = %principal.role,
            path = %req.uri().path(),
            "Access denied"
        );
        return AuthError::Forbidden.into_response();
    }

    req.extensions_mut().insert(principal);

    next.run(req).await
}

fn clear_session_and_redirect(config: &AuthConfig, to: &str) -> Response {
    (
        AppendHeaders([(
            header::SET_COOKIE,
            delete_cookie_header(&config.session_cookie()),
        )]),
        Redirect::to(to),
    )
        .into_response()
}
