//! Authenticated landing page

use std::sync::Arc;

use auth::config::AuthConfig;
use auth::{Principal, views};
use axum::extract::{Extension, State};
use axum::response::{Html, Redirect};
use axum::{Router, routing::get};

pub const DASHBOARD_PATH: &str = "/dashboard";

/// `/` and `/dashboard`. Both sit behind the session gate.
pub fn dashboard_router(config: Arc<AuthConfig>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(DASHBOARD_PATH, get(dashboard))
        .with_state(config)
}

async fn index() -> Redirect {
    Redirect::to(DASHBOARD_PATH)
}

async fn dashboard(
    State(config): State<Arc<AuthConfig>>,
    Extension(principal): Extension<Principal>,
) -> Html<String> {
    tracing::debug!(account_id = %principal.account_id, "Dashboard requested");
    Html(views::dashboard_page(&config.routes, &principal))
}
