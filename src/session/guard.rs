//! Route guard for the `/app` subtree.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::debug;

use super::SessionStatus;
use crate::state::AppState;

pub const SIGN_IN_PATH: &str = "/auth";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session check still pending; show the placeholder.
    Loading,
    Render,
    Redirect(&'static str),
}

pub fn decide(status: &SessionStatus) -> GuardOutcome {
    match status {
        SessionStatus::Checking => GuardOutcome::Loading,
        SessionStatus::Authenticated(_) => GuardOutcome::Render,
        SessionStatus::Unauthenticated => GuardOutcome::Redirect(SIGN_IN_PATH),
    }
}

#[derive(Debug, Serialize)]
pub struct LoadingView {
    pub state: &'static str,
    pub message: &'static str,
}

/// Lets the request through only with a signed-in session, and hands the
/// session to the handler as a request extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let status = state.session.status();
    match decide(&status) {
        GuardOutcome::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "1")],
            Json(LoadingView {
                state: "loading",
                message: "Loading...",
            }),
        )
            .into_response(),
        GuardOutcome::Redirect(to) => {
            debug!("no session for {}, redirecting", request.uri().path());
            Redirect::to(to).into_response()
        }
        GuardOutcome::Render => {
            if let SessionStatus::Authenticated(active) = status {
                request.extensions_mut().insert(*active);
            }
            next.run(request).await
        }
    }
}
