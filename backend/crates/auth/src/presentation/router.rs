//! Auth Router

use axum::{
    Router,
    middleware,
    routing::{get, post},
};

use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_auth_session;

pub const SIGN_IN_PATH: &str = "/auth/sign-in";
pub const SIGN_UP_PATH: &str = "/auth/sign-up";
pub const ACTIVATE_PATH: &str = "/auth/activate";

/// Create the Auth router for any repository implementation
///
/// The login processing and logout URLs come from the configured routes and
/// must not collide with the fixed paths.
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    let routes = state.config.routes.clone();

    let mut router = Router::new()
        .route(SIGN_IN_PATH, get(handlers::sign_in_page::<R>))
        .route(
            SIGN_UP_PATH,
            get(handlers::sign_up_page::<R>).post(handlers::sign_up::<R>),
        )
        .route(ACTIVATE_PATH, get(handlers::activate::<R>))
        .route(&routes.login_processing_url, post(handlers::login::<R>))
        .route(&routes.logout_url, post(handlers::logout::<R>));

    if routes.login_page != SIGN_IN_PATH {
        router = router.route(&routes.login_page, get(handlers::sign_in_page::<R>));
    }

    router.with_state(state)
}

/// Put every route of `router` behind the session gate.
pub fn protect<R>(router: Router, state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    router.layer(middleware::from_fn_with_state(
        state,
        require_auth_session::<R>,
    ))
}
