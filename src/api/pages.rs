use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::explore;
use crate::mentorship;
use crate::playback::{self, CourseView};
use crate::session::ActiveSession;
use crate::state::AppState;
use crate::views::{
    self, DashboardView, ExploreView, HomeView, LandingView, PageView, ProfileView, ShellView,
};

const FEATURED_COURSES: usize = 3;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LessonQuery {
    pub lesson: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
}

pub async fn home(State(state): State<AppState>) -> Result<Json<HomeView>, AppError> {
    let active = state.session.current();
    let token = active.as_ref().map(|a| a.token());

    let mut featured = explore::load_catalog(state.hosted.as_ref(), token).await?;
    featured.truncate(FEATURED_COURSES);

    Ok(Json(HomeView {
        featured,
        mentors: mentorship::mentors(),
        signed_in: active.is_some(),
    }))
}

pub async fn landing() -> Json<LandingView> {
    Json(views::landing())
}

pub async fn app_shell(Extension(active): Extension<ActiveSession>) -> Json<ShellView> {
    Json(ShellView::for_session(&active))
}

pub async fn explore(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<PageView<ExploreView>>, AppError> {
    let catalog = explore::load_catalog(state.hosted.as_ref(), Some(active.token())).await?;
    let courses = explore::filter_courses(catalog, &params.q);

    Ok(Json(PageView::new(
        &active,
        ExploreView {
            query: params.q,
            courses,
        },
    )))
}

pub async fn course(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path(id): Path<String>,
    Query(params): Query<LessonQuery>,
) -> Result<Json<PageView<CourseView>>, AppError> {
    let detail = playback::load_course_detail(state.hosted.as_ref(), Some(active.token()), &id).await?;
    let view = CourseView::build(detail, &active.profile.id, params.lesson.as_deref());
    Ok(Json(PageView::new(&active, view)))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<PageView<DashboardView>>, AppError> {
    let courses = explore::load_catalog(state.hosted.as_ref(), Some(active.token()))
        .await?
        .into_iter()
        .filter(|c| c.course.creator_id == active.profile.id)
        .collect();
    let upcoming = state
        .mentorship
        .upcoming(&active.profile.id, Utc::now())
        .await;

    let view = DashboardView {
        tab: params.tab.unwrap_or_else(|| "courses".to_string()),
        is_creator: active.profile.is_creator,
        courses,
        upcoming,
    };
    Ok(Json(PageView::new(&active, view)))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
    Path(id): Path<String>,
) -> Result<Json<PageView<ProfileView>>, AppError> {
    let profile = if id == "me" || id == active.profile.id {
        active.profile.clone()
    } else {
        state
            .session
            .find_profile(Some(active.token()), &id)
            .await?
            .ok_or(AppError::NotFound)?
    };

    let view = ProfileView::new(profile, &active.profile.id);
    Ok(Json(PageView::new(&active, view)))
}
