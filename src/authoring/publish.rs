//! Turning a draft into hosted rows.
//!
//! Rows are written one step at a time: the course, then each section followed
//! by its lessons as a batch. When a step fails, every row written so far is
//! deleted again, newest first, so a failed publish leaves nothing behind.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use super::draft::CourseDraft;
use super::validate;
use crate::error::{AppError, FieldError};
use crate::hosted::HostedClient;
use crate::models::{Course, NewCourse, NewLesson, NewSection};
use crate::session::ActiveSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStep {
    Course,
    Section(String),
    Lessons(String),
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStep::Course => write!(f, "course"),
            PublishStep::Section(title) => write!(f, "section \"{}\"", title),
            PublishStep::Lessons(title) => write!(f, "lessons of section \"{}\"", title),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("You need to be a creator to publish courses")]
    NotCreator,

    #[error("Please add at least one section with lessons")]
    NoSections,

    #[error("Please add at least one lesson to your sections")]
    NoLessons,

    #[error("Course details are incomplete")]
    InvalidDetails(Vec<FieldError>),

    #[error("Failed at {step}: {source}")]
    Failed {
        step: PublishStep,
        source: AppError,
        rolled_back: bool,
    },
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        let message = err.to_string();
        match err {
            PublishError::NotCreator => AppError::Forbidden(message),
            PublishError::NoSections | PublishError::NoLessons => AppError::BadRequest(message),
            PublishError::InvalidDetails(fields) => AppError::Validation(fields),
            PublishError::Failed {
                step,
                source,
                rolled_back,
            } => AppError::Publish {
                step: step.to_string(),
                message: source.to_string(),
                rolled_back,
            },
        }
    }
}

/// Checks that need no network: creator flag, course details, content.
pub fn preflight(session: &ActiveSession, draft: &CourseDraft) -> Result<(), PublishError> {
    if !session.profile.is_creator {
        return Err(PublishError::NotCreator);
    }
    validate::validate_details(&draft.details).map_err(PublishError::InvalidDetails)?;
    if draft.sections().is_empty() {
        return Err(PublishError::NoSections);
    }
    if draft.total_lessons() == 0 {
        return Err(PublishError::NoLessons);
    }
    Ok(())
}

#[derive(Default)]
struct Written {
    course_id: Option<String>,
    section_ids: Vec<String>,
}

pub async fn publish(
    hosted: &dyn HostedClient,
    session: &ActiveSession,
    draft: &CourseDraft,
) -> Result<Course, PublishError> {
    preflight(session, draft)?;

    let mut written = Written::default();
    match write_rows(hosted, session, draft, &mut written).await {
        Ok(course) => {
            info!(
                "published course {} with {} sections",
                course.id,
                written.section_ids.len()
            );
            Ok(course)
        }
        Err((step, source)) => {
            warn!("publish failed at {}: {}", step, source);
            let rolled_back = roll_back(hosted, session.token(), &written).await;
            Err(PublishError::Failed {
                step,
                source,
                rolled_back,
            })
        }
    }
}

async fn write_rows(
    hosted: &dyn HostedClient,
    session: &ActiveSession,
    draft: &CourseDraft,
    written: &mut Written,
) -> Result<Course, (PublishStep, AppError)> {
    let token = session.token();
    let details = &draft.details;

    let course = hosted
        .insert_course(
            token,
            &NewCourse {
                title: details.title.clone(),
                description: details.description.clone(),
                price: details.price,
                image_url: details.image_url.clone(),
                creator_id: session.profile.id.clone(),
            },
        )
        .await
        .map_err(|e| (PublishStep::Course, e))?;
    written.course_id = Some(course.id.clone());

    for section in draft.sections() {
        let saved = hosted
            .insert_section(
                token,
                &NewSection {
                    course_id: course.id.clone(),
                    title: section.title.clone(),
                    order_number: section.order_number,
                },
            )
            .await
            .map_err(|e| (PublishStep::Section(section.title.clone()), e))?;
        written.section_ids.push(saved.id.clone());

        if section.lessons.is_empty() {
            continue;
        }
        let lessons: Vec<NewLesson> = section
            .lessons
            .iter()
            .map(|l| NewLesson {
                section_id: saved.id.clone(),
                title: l.title.clone(),
                description: l.description.clone(),
                video_url: l.video_url.clone(),
                duration: l.duration.clone(),
                is_preview: l.is_preview,
                order_number: l.order_number,
            })
            .collect();
        hosted
            .insert_lessons(token, &lessons)
            .await
            .map_err(|e| (PublishStep::Lessons(section.title.clone()), e))?;
    }

    Ok(course)
}

/// Deletes written rows newest first. Returns false if any delete failed.
async fn roll_back(hosted: &dyn HostedClient, token: &str, written: &Written) -> bool {
    let mut clean = true;

    for section_id in written.section_ids.iter().rev() {
        if let Err(e) = hosted.delete_lessons(token, section_id).await {
            warn!("rollback: could not delete lessons of {}: {}", section_id, e);
            clean = false;
        }
        if let Err(e) = hosted.delete_section(token, section_id).await {
            warn!("rollback: could not delete section {}: {}", section_id, e);
            clean = false;
        }
    }

    if let Some(course_id) = &written.course_id {
        if let Err(e) = hosted.delete_course(token, course_id).await {
            warn!("rollback: could not delete course {}: {}", course_id, e);
            clean = false;
        }
    }

    clean
}
