use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::validate;
use crate::error::{AppError, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseDetailsInput {
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionInput {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub video_url: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub is_preview: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftLesson {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub duration: Option<String>,
    pub is_preview: bool,
    pub order_number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSection {
    pub id: String,
    pub title: String,
    pub order_number: i32,
    pub lessons: Vec<DraftLesson>,
}

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("Section {0} not found in draft")]
    SectionNotFound(String),

    #[error("Lesson {lesson_id} not found in section {section_id}")]
    LessonNotFound { section_id: String, lesson_id: String },

    #[error("Invalid input")]
    Invalid(Vec<FieldError>),
}

impl From<DraftError> for AppError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::Invalid(fields) => AppError::Validation(fields),
            DraftError::SectionNotFound(_) | DraftError::LessonNotFound { .. } => AppError::NotFound,
        }
    }
}

trait Ordered {
    fn set_order(&mut self, order_number: i32);
}

impl Ordered for DraftSection {
    fn set_order(&mut self, order_number: i32) {
        self.order_number = order_number;
    }
}

impl Ordered for DraftLesson {
    fn set_order(&mut self, order_number: i32) {
        self.order_number = order_number;
    }
}

/// Rewrites order numbers to 1..N in slice order.
fn renumber<T: Ordered>(items: &mut [T]) {
    for (i, item) in items.iter_mut().enumerate() {
        item.set_order(i as i32 + 1);
    }
}

/// Swaps the item with its neighbour. Moving past either end is a no-op.
fn shift<T: Ordered>(items: &mut [T], index: usize, direction: Direction) {
    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < items.len() => index + 1,
        _ => return,
    };
    items.swap(index, target);
    renumber(items);
}

fn temp_id() -> String {
    format!("temp-{}", Uuid::new_v4())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl DraftLesson {
    fn from_input(id: String, input: LessonInput, order_number: i32) -> Self {
        Self {
            id,
            title: input.title.trim().to_string(),
            description: non_blank(input.description),
            video_url: input.video_url.trim().to_string(),
            duration: non_blank(input.duration),
            is_preview: input.is_preview,
            order_number,
        }
    }
}

/// Unsaved course being built on the create-course page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseDraft {
    pub details: CourseDetailsInput,
    sections: Vec<DraftSection>,
}

impl CourseDraft {
    pub fn sections(&self) -> &[DraftSection] {
        &self.sections
    }

    pub fn total_lessons(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_details(&mut self, details: CourseDetailsInput) -> Result<(), DraftError> {
        validate::validate_details(&details).map_err(DraftError::Invalid)?;
        self.details = CourseDetailsInput {
            title: details.title.trim().to_string(),
            description: details.description.trim().to_string(),
            price: details.price,
            image_url: non_blank(details.image_url),
        };
        Ok(())
    }

    fn section_index(&self, section_id: &str) -> Result<usize, DraftError> {
        self.sections
            .iter()
            .position(|s| s.id == section_id)
            .ok_or_else(|| DraftError::SectionNotFound(section_id.to_string()))
    }

    fn section_mut(&mut self, section_id: &str) -> Result<&mut DraftSection, DraftError> {
        let index = self.section_index(section_id)?;
        Ok(&mut self.sections[index])
    }

    pub fn add_section(&mut self, input: SectionInput) -> Result<&DraftSection, DraftError> {
        validate::validate_section(&input).map_err(DraftError::Invalid)?;
        let order_number = self.sections.len() as i32 + 1;
        self.sections.push(DraftSection {
            id: temp_id(),
            title: input.title.trim().to_string(),
            order_number,
            lessons: Vec::new(),
        });
        Ok(&self.sections[self.sections.len() - 1])
    }

    pub fn edit_section(&mut self, section_id: &str, input: SectionInput) -> Result<(), DraftError> {
        validate::validate_section(&input).map_err(DraftError::Invalid)?;
        self.section_mut(section_id)?.title = input.title.trim().to_string();
        Ok(())
    }

    /// Removes a section with its lessons and closes the gap in numbering.
    pub fn remove_section(&mut self, section_id: &str) -> Result<(), DraftError> {
        let index = self.section_index(section_id)?;
        self.sections.remove(index);
        renumber(&mut self.sections);
        Ok(())
    }

    pub fn move_section(&mut self, section_id: &str, direction: Direction) -> Result<(), DraftError> {
        let index = self.section_index(section_id)?;
        shift(&mut self.sections, index, direction);
        Ok(())
    }

    pub fn add_lesson(&mut self, section_id: &str, input: LessonInput) -> Result<&DraftLesson, DraftError> {
        validate::validate_lesson(&input).map_err(DraftError::Invalid)?;
        let section = self.section_mut(section_id)?;
        let order_number = section.lessons.len() as i32 + 1;
        section
            .lessons
            .push(DraftLesson::from_input(temp_id(), input, order_number));
        Ok(&section.lessons[section.lessons.len() - 1])
    }

    fn lesson_index(section: &DraftSection, lesson_id: &str) -> Result<usize, DraftError> {
        section
            .lessons
            .iter()
            .position(|l| l.id == lesson_id)
            .ok_or_else(|| DraftError::LessonNotFound {
                section_id: section.id.clone(),
                lesson_id: lesson_id.to_string(),
            })
    }

    pub fn edit_lesson(
        &mut self,
        section_id: &str,
        lesson_id: &str,
        input: LessonInput,
    ) -> Result<(), DraftError> {
        validate::validate_lesson(&input).map_err(DraftError::Invalid)?;
        let section = self.section_mut(section_id)?;
        let index = Self::lesson_index(section, lesson_id)?;
        let lesson = &mut section.lessons[index];
        *lesson = DraftLesson::from_input(lesson.id.clone(), input, lesson.order_number);
        Ok(())
    }

    pub fn remove_lesson(&mut self, section_id: &str, lesson_id: &str) -> Result<(), DraftError> {
        let section = self.section_mut(section_id)?;
        let index = Self::lesson_index(section, lesson_id)?;
        section.lessons.remove(index);
        renumber(&mut section.lessons);
        Ok(())
    }

    pub fn move_lesson(
        &mut self,
        section_id: &str,
        lesson_id: &str,
        direction: Direction,
    ) -> Result<(), DraftError> {
        let section = self.section_mut(section_id)?;
        let index = Self::lesson_index(section, lesson_id)?;
        shift(&mut section.lessons, index, direction);
        Ok(())
    }
}
