//! services/api/src/web/pages.rs
//!
//! Server-rendered HTML pages. Templates are compiled into the binary; the
//! pages fetch their data from the JSON API in the browser.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Html,
};
use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::web::middleware::current_user;
use crate::web::state::AppState;

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("schedule.html", include_str!("../../templates/schedule.html")),
    ("login.html", include_str!("../../templates/login.html")),
];

/// Builds the template environment used by the page handlers.
pub fn load_templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

/// What templates get to know about the signed-in user.
#[derive(Serialize)]
struct PageUser {
    username: String,
    full_name: Option<String>,
    is_admin: bool,
}

async fn render_page(
    state: &AppState,
    headers: &HeaderMap,
    template: &str,
    active: &str,
) -> Result<Html<String>, (StatusCode, String)> {
    let user = current_user(state, headers).await.map(|u| PageUser {
        is_admin: u.is_admin(),
        username: u.username,
        full_name: u.full_name,
    });

    state
        .templates
        .get_template(template)
        .and_then(|tmpl| tmpl.render(context! { user => user, active => active }))
        .map(Html)
        .map_err(|e| {
            error!("Failed to render {}: {:?}", template, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to render page".to_string(),
            )
        })
}

pub async fn index_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, &headers, "index.html", "home").await
}

pub async fn schedule_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, &headers, "schedule.html", "schedule").await
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, &headers, "login.html", "login").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_renders_anonymously() {
        let env = load_templates().unwrap();
        for (name, _) in TEMPLATES.iter().filter(|(name, _)| *name != "base.html") {
            let html = env
                .get_template(name)
                .unwrap()
                .render(context! { user => None::<PageUser>, active => "home" })
                .unwrap();
            assert!(html.contains("WebCinema"), "{} is missing the layout", name);
        }
    }

    #[test]
    fn signed_in_user_is_greeted_and_escaped() {
        let env = load_templates().unwrap();
        let user = PageUser {
            username: "anna".to_string(),
            full_name: Some("<Anna>".to_string()),
            is_admin: false,
        };
        let html = env
            .get_template("index.html")
            .unwrap()
            .render(context! { user => user, active => "home" })
            .unwrap();
        assert!(html.contains("&lt;Anna&gt;"));
        assert!(!html.contains("<Anna>"));
    }
}
