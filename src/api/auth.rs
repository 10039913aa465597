use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::debug;

use crate::error::ActionError;
use crate::models::Profile;
use crate::session::ActiveSession;
use crate::state::AppState;
use crate::views::{self, ActionView, AuthView, Notice};

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

fn signed_in_user(state: &AppState) -> Option<String> {
    state.session.current().map(|a| a.auth.user.id)
}

/// The draft belongs to whoever was signed in when it was written.
async fn discard_draft_unless_owned(state: &AppState, previous: Option<String>, active: &ActiveSession) {
    if previous.as_deref() != Some(active.auth.user.id.as_str()) {
        state.draft.lock().await.reset();
        debug!("course draft discarded for new user {}", active.auth.user.id);
    }
}

pub async fn page(State(state): State<AppState>) -> Json<AuthView> {
    Json(views::auth_page(state.session.current().is_some()))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<ActionView<Profile>>, ActionError> {
    let previous = signed_in_user(&state);
    let active = state
        .session
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|e| e.titled("Sign in failed"))?;
    discard_draft_unless_owned(&state, previous, &active).await;

    Ok(Json(
        ActionView::new(active.profile)
            .notify(Notice::new("Welcome back!"))
            .redirect("/app"),
    ))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<ActionView<Profile>>, ActionError> {
    let previous = signed_in_user(&state);
    let active = state
        .session
        .sign_up(&req.email, &req.password, &req.full_name)
        .await
        .map_err(|e| e.titled("Sign up failed"))?;
    discard_draft_unless_owned(&state, previous, &active).await;

    Ok(Json(
        ActionView::new(active.profile)
            .notify(Notice::new("Account created!"))
            .redirect("/app"),
    ))
}

pub async fn sign_out(State(state): State<AppState>) -> Result<Json<ActionView<()>>, ActionError> {
    state
        .session
        .sign_out()
        .await
        .map_err(|e| e.titled("Sign out failed"))?;
    state.draft.lock().await.reset();

    Ok(Json(
        ActionView::new(())
            .notify(Notice::new("Signed out"))
            .redirect("/auth"),
    ))
}
