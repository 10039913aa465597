use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::debug;

use crate::authoring::{self, CourseDetailsInput, Direction, LessonInput, SectionInput};
use crate::error::{ActionError, AppError};
use crate::models::Course;
use crate::session::ActiveSession;
use crate::state::AppState;
use crate::views::{ActionView, DraftView, Notice};

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

type DraftResult = Result<Json<DraftView>, AppError>;

pub async fn show(State(state): State<AppState>, Extension(active): Extension<ActiveSession>) -> DraftResult {
    let draft = state.draft.lock().await;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn set_details(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Json(details): Json<CourseDetailsInput>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.set_details(details)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn reset(State(state): State<AppState>, Extension(active): Extension<ActiveSession>) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.reset();
    debug!("course draft reset");
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn add_section(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Json(input): Json<SectionInput>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.add_section(input)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn edit_section(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path(section_id): Path<String>,
    Json(input): Json<SectionInput>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.edit_section(&section_id, input)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn remove_section(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path(section_id): Path<String>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.remove_section(&section_id)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn move_section(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path(section_id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.move_section(&section_id, req.direction)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn add_lesson(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path(section_id): Path<String>,
    Json(input): Json<LessonInput>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.add_lesson(&section_id, input)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn edit_lesson(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path((section_id, lesson_id)): Path<(String, String)>,
    Json(input): Json<LessonInput>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.edit_lesson(&section_id, &lesson_id, input)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn remove_lesson(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path((section_id, lesson_id)): Path<(String, String)>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.remove_lesson(&section_id, &lesson_id)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn move_lesson(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path((section_id, lesson_id)): Path<(String, String)>,
    Json(req): Json<MoveRequest>,
) -> DraftResult {
    let mut draft = state.draft.lock().await;
    draft.move_lesson(&section_id, &lesson_id, req.direction)?;
    Ok(Json(DraftView::new(&draft, active.profile.is_creator)))
}

pub async fn publish(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
) -> Result<Json<ActionView<Course>>, ActionError> {
    let mut draft = state.draft.lock().await;
    let course = authoring::publish(state.hosted.as_ref(), &active, &draft)
        .await
        .map_err(|e| AppError::from(e).titled("Failed to publish course"))?;
    draft.reset();

    let redirect = format!("/app/course/{}", course.id);
    Ok(Json(
        ActionView::new(course)
            .notify(Notice::new("Course published!"))
            .redirect(redirect),
    ))
}
