use axum::{Extension, Json, extract::State};
use chrono::Utc;

use crate::error::ActionError;
use crate::mentorship;
use crate::models::{BookingRequest, MentorSession};
use crate::session::ActiveSession;
use crate::state::AppState;
use crate::views::{ActionView, MentorshipView, Notice, PageView};

pub async fn page(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
) -> Json<PageView<MentorshipView>> {
    let upcoming = state
        .mentorship
        .upcoming(&active.profile.id, Utc::now())
        .await;
    Json(PageView::new(
        &active,
        MentorshipView {
            mentors: mentorship::mentors(),
            upcoming,
        },
    ))
}

pub async fn book(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<ActionView<MentorSession>>, ActionError> {
    let session = state
        .mentorship
        .book(&active.profile.id, req, Utc::now())
        .await
        .map_err(|e| e.titled("Booking failed"))?;

    let message = format!("Your session with {} is booked", session.mentor_name);
    Ok(Json(
        ActionView::new(session)
            .notify(Notice::new("Session booked!").with_message(message))
            .redirect("/app/dashboard"),
    ))
}
