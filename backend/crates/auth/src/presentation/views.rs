//! Server-rendered pages
//!
//! Plain HTML built with `format!`. Every interpolated value goes through
//! [`escape`].

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use kernel::error::{app_error::AppError, validation::ValidationErrors};

use crate::application::config::SecurityRoutes;
use crate::application::sign_up::{FIELD_EMAIL, FIELD_FIRST_NAME, FIELD_LAST_NAME, FIELD_PASSWORD};
use crate::html::escape;
use crate::presentation::dto::SignUpForm;
use crate::presentation::middleware::Principal;

/// Banner shown above a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    fn render(&self) -> String {
        let (class, text) = match self {
            Notice::Success(text) => ("notice notice-success", text),
            Notice::Info(text) => ("notice notice-info", text),
            Notice::Error(text) => ("notice notice-error", text),
        };
        format!(r#"<div class="{class}" role="alert">{}</div>"#, escape(text))
    }
}

/// Page skeleton. `body` must already be escaped.
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | DropJar</title>
<link rel="stylesheet" href="/resources/css/app.css">
</head>
<body>
<main class="container">
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn sign_in_page(routes: &SecurityRoutes, notices: &[Notice], email: &str) -> String {
    let notices: String = notices.iter().map(Notice::render).collect();
    let body = format!(
        r#"<h1>Sign in</h1>
{notices}
<form method="post" action="{action}" class="form">
<label for="email">Email</label>
<input id="email" name="email" type="email" value="{email}" required autofocus>
<label for="password">Password</label>
<input id="password" name="password" type="password" required>
<button type="submit">Sign in</button>
</form>
<p>No account yet? <a href="/auth/sign-up">Create one</a></p>"#,
        action = escape(&routes.login_processing_url),
        email = escape(email),
    );
    layout("Sign in", &body)
}

/// Registration form. The password is never echoed back.
pub fn sign_up_page(values: &SignUpForm, errors: &ValidationErrors) -> String {
    let field = |name: &str, label: &str, kind: &str, value: &str| {
        let error = errors
            .message_for(name)
            .map(|msg| format!(r#"<p class="field-error">{}</p>"#, escape(msg)))
            .unwrap_or_default();
        format!(
            r#"<label for="{name}">{label}</label>
<input id="{name}" name="{name}" type="{kind}" value="{value}">
{error}"#,
            value = escape(value),
        )
    };

    let body = format!(
        r#"<h1>Create your account</h1>
<form method="post" action="/auth/sign-up" class="form" novalidate>
{first}
{last}
{email}
{password}
<button type="submit">Sign up</button>
</form>
<p>Already registered? <a href="/auth/sign-in">Sign in</a></p>"#,
        first = field(FIELD_FIRST_NAME, "First name", "text", &values.firstname),
        last = field(FIELD_LAST_NAME, "Last name", "text", &values.lastname),
        email = field(FIELD_EMAIL, "Email", "email", &values.email),
        password = field(FIELD_PASSWORD, "Password", "password", ""),
    );
    layout("Sign up", &body)
}

/// Landing page for a signed-in account.
pub fn dashboard_page(routes: &SecurityRoutes, principal: &Principal) -> String {
    let body = format!(
        r#"<h1>Dashboard</h1>
<p>Signed in as <strong>{email}</strong> ({role}).</p>
<form method="post" action="{logout}">
<button type="submit">Sign out</button>
</form>"#,
        email = escape(principal.email.as_str()),
        role = escape(principal.role.label()),
        logout = escape(&routes.logout_url),
    );
    layout("Dashboard", &body)
}

pub fn error_page(error: &AppError) -> String {
    let action = error
        .action()
        .map(|a| format!("<p>{}</p>", escape(a)))
        .unwrap_or_default();
    let body = format!(
        r#"<h1>{status}</h1>
<p class="error-message">{message}</p>
{action}
<p><a href="/">Back to DropJar</a></p>"#,
        status = error.status_code(),
        message = escape(error.message()),
    );
    layout("Error", &body)
}

pub fn error_response(error: &AppError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Html(error_page(error))).into_response()
}
