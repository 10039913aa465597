pub mod course;
pub mod mentorship;
pub mod profile;
pub mod theme;

pub use course::{
    Course, CourseDetail, CourseSummary, Creator, Lesson, NewCourse, NewLesson, NewSection,
    Section, SectionWithLessons,
};
pub use mentorship::{BookingRequest, Mentor, MentorSession};
pub use profile::{AuthSession, AuthUser, Profile, ProfileUpdate};
pub use theme::ThemeColor;
