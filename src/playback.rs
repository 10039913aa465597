//! Course detail page: loading a course tree, picking the lesson to show and
//! turning stored video links into embeddable players.

use regex::Regex;
use serde::Serialize;

use crate::error::AppError;
use crate::hosted::HostedClient;
use crate::models::{Course, CourseDetail, Lesson, SectionWithLessons};

const YOUTUBE_PATTERN: &str =
    r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#;
const DRIVE_PATTERN: &str = r"[-\w]{25,}";

fn capture_youtube_id(url: &str) -> Option<String> {
    let Ok(re) = Regex::new(YOUTUBE_PATTERN) else {
        return None;
    };
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn capture_drive_id(url: &str) -> Option<String> {
    let Ok(re) = Regex::new(DRIVE_PATTERN) else {
        return None;
    };
    re.find(url).map(|m| m.as_str().to_string())
}

/// Rewrites YouTube and Google Drive links into their embed form. Anything
/// else, including links whose id cannot be found, is returned unchanged.
pub fn embed_url(url: &str) -> String {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        if let Some(id) = capture_youtube_id(url) {
            return format!("https://www.youtube.com/embed/{}", id);
        }
    }
    if url.contains("drive.google.com") {
        if let Some(id) = capture_drive_id(url) {
            return format!("https://drive.google.com/file/d/{}/preview", id);
        }
    }
    url.to_string()
}

/// First preview lesson in section order, else the first lesson overall.
pub fn initial_lesson(sections: &[SectionWithLessons]) -> Option<&Lesson> {
    let mut lessons = sections.iter().flat_map(|s| s.lessons.iter());
    let first = lessons.clone().next();
    lessons.find(|l| l.is_preview).or(first)
}

pub async fn load_course_detail(
    hosted: &dyn HostedClient,
    token: Option<&str>,
    course_id: &str,
) -> Result<CourseDetail, AppError> {
    let course = hosted
        .fetch_course(token, course_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let sections = hosted.fetch_sections(token, course_id).await?;
    let lessons = if sections.is_empty() {
        Vec::new()
    } else {
        let ids: Vec<String> = sections.iter().map(|s| s.id.clone()).collect();
        hosted.fetch_lessons(token, &ids).await?
    };
    Ok(CourseDetail::assemble(course, sections, lessons))
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub is_preview: bool,
    pub order_number: i32,
    pub locked: bool,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub id: String,
    pub title: String,
    pub order_number: i32,
    pub lessons: Vec<LessonView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub course: Course,
    pub price_label: String,
    pub is_owner: bool,
    pub total_lessons: usize,
    pub sections: Vec<SectionView>,
    pub active_lesson: Option<LessonView>,
}

impl CourseView {
    /// Builds the page for `viewer_id`. `selected` picks the active lesson;
    /// an unknown id falls back to the initial lesson.
    pub fn build(detail: CourseDetail, viewer_id: &str, selected: Option<&str>) -> Self {
        let is_owner = detail.course.creator_id == viewer_id;
        let active_id = selected
            .and_then(|id| detail.find_lesson(id))
            .or_else(|| initial_lesson(&detail.sections))
            .map(|l| l.id.clone());

        let sections: Vec<SectionView> = detail
            .sections
            .iter()
            .map(|s| SectionView {
                id: s.section.id.clone(),
                title: s.section.title.clone(),
                order_number: s.section.order_number,
                lessons: s
                    .lessons
                    .iter()
                    .map(|l| {
                        let locked = !is_owner && !l.is_preview;
                        LessonView {
                            id: l.id.clone(),
                            title: l.title.clone(),
                            description: l.description.clone(),
                            duration: l.duration.clone(),
                            is_preview: l.is_preview,
                            order_number: l.order_number,
                            locked,
                            active: active_id.as_deref() == Some(l.id.as_str()),
                            embed_url: (!locked).then(|| embed_url(&l.video_url)),
                        }
                    })
                    .collect(),
            })
            .collect();

        let active_lesson = sections
            .iter()
            .flat_map(|s| s.lessons.iter())
            .find(|l| l.active)
            .cloned();
        let total_lessons = sections.iter().map(|s| s.lessons.len()).sum();

        Self {
            price_label: detail.course.price_label(),
            course: detail.course,
            is_owner,
            total_lessons,
            sections,
            active_lesson,
        }
    }
}
