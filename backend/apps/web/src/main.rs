//! DropJar Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod dashboard;
mod settings;

use auth::store::AuthStore;
use auth::{AuthAppState, PgAuthRepository, auth_router, protect};
use axum::Router;
use platform::mail::{LogMailSender, MailDispatcher, MailSender, SmtpMailSender};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::dashboard::dashboard_router;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dropjar=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    // Database connection
    let db = &settings.database;
    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .min_connections(db.min_connections)
        .acquire_timeout(db.acquire_timeout)
        .idle_timeout(db.idle_timeout)
        .max_lifetime(db.max_lifetime)
        .connect(&db.url)
        .await?;

    tracing::info!(
        max_connections = db.max_connections,
        min_connections = db.min_connections,
        "Connected to database"
    );

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: errors here should not prevent server startup
    let repo = PgAuthRepository::new(pool.clone());
    match repo.cleanup_expired().await {
        Ok(sessions) => {
            tracing::info!(
                sessions_deleted = sessions,
                "Auth session cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Auth session cleanup failed, continuing anyway"
            );
        }
    }

    let sender: Arc<dyn MailSender> = match &settings.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Using SMTP mail sender");
            Arc::new(SmtpMailSender::new(smtp)?)
        }
        None => {
            tracing::warn!("SMTP credentials not set, confirmation mails are only logged");
            Arc::new(LogMailSender)
        }
    };

    let state = AuthAppState::new(repo, MailDispatcher::new(sender), settings.auth.clone());
    let app = build_router(state, &settings.static_dir);

    // Start server
    tracing::info!(
        addr = %settings.bind_addr,
        public_base_url = %settings.public_base_url,
        "Listening"
    );

    let listener = TcpListener::bind(settings.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Application is shutting down...");
    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

/// Auth pages, the dashboard and `/resources/**`, all behind the session gate.
fn build_router<R>(state: AuthAppState<R>, static_dir: &Path) -> Router
where
    R: AuthStore,
{
    let routes = Router::new()
        .merge(auth_router(state.clone()))
        .merge(dashboard_router(state.config.clone()))
        .nest_service("/resources", ServeDir::new(static_dir));

    protect(routes, state).layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::MemoryAuthRepository;
    use auth::config::AuthConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use platform::mail::MemoryMailSender;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AuthAppState::new(
            MemoryAuthRepository::new(),
            MailDispatcher::new(Arc::new(MemoryMailSender::new())),
            AuthConfig::development(),
        );
        let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
        build_router(state, &static_dir)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_static_resources_are_public() {
        let response = app().oneshot(get("/resources/css/app.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_requires_session() {
        let response = app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth/sign-in");

        let response = app().oneshot(get("/dashboard")).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/auth/sign-in");
    }

    #[tokio::test]
    async fn test_sign_in_page_is_public() {
        let response = app().oneshot(get("/auth/sign-in?logout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("You have been signed out."));
    }
}
