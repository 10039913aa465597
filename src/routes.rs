use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::Redirect,
    routing::{get, patch, post, put},
};
use tracing::error;

use crate::api::{auth, authoring, mentorship, pages, profile};
use crate::session::guard::require_session;
use crate::state::AppState;

// headroom over the configured avatar size
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let avatar_limit = state.session.avatar_max_bytes() + UPLOAD_OVERHEAD_BYTES;

    let guarded = Router::new()
        .route("/", get(pages::app_shell))
        .route("/explore", get(pages::explore))
        .route("/course/{id}", get(pages::course))
        .route(
            "/create-course",
            get(authoring::show)
                .put(authoring::set_details)
                .delete(authoring::reset),
        )
        .route("/create-course/sections", post(authoring::add_section))
        .route(
            "/create-course/sections/{id}",
            put(authoring::edit_section).delete(authoring::remove_section),
        )
        .route("/create-course/sections/{id}/move", post(authoring::move_section))
        .route("/create-course/sections/{id}/lessons", post(authoring::add_lesson))
        .route(
            "/create-course/sections/{id}/lessons/{lesson_id}",
            put(authoring::edit_lesson).delete(authoring::remove_lesson),
        )
        .route(
            "/create-course/sections/{id}/lessons/{lesson_id}/move",
            post(authoring::move_lesson),
        )
        .route("/create-course/publish", post(authoring::publish))
        .route("/mentorship", get(mentorship::page))
        .route("/mentorship/book", post(mentorship::book))
        .route("/dashboard", get(pages::dashboard))
        .route("/profile", patch(profile::update))
        .route(
            "/profile/avatar",
            post(profile::upload_avatar).layer(DefaultBodyLimit::max(avatar_limit)),
        )
        .route("/profile/creator", post(profile::become_creator))
        .route("/profile/theme", put(profile::save_theme))
        .route("/profile/{id}", get(pages::profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(pages::home))
        .route("/health", get(health))
        .route("/landing", get(pages::landing))
        .route("/auth", get(auth::page))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-out", post(auth::sign_out))
        .nest("/app", guarded)
        .fallback(|| async { Redirect::to("/") })
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
    match state.session.ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            error!("health check failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
