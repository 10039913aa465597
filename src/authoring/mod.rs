//! Course authoring: an in-memory draft of ordered sections and lessons, and
//! the publish step that persists it.

pub mod draft;
pub mod publish;
pub mod validate;

pub use draft::{
    CourseDetailsInput, CourseDraft, Direction, DraftError, DraftLesson, DraftSection,
    LessonInput, SectionInput,
};
pub use publish::{PublishError, PublishStep, publish};
