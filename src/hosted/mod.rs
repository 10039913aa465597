//! Client side of the hosted backend: authentication, relational data and
//! object storage. Everything the application persists goes through
//! [`HostedClient`].

pub mod dto;
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    AuthSession, AuthUser, Course, Lesson, NewCourse, NewLesson, NewSection, Profile, Section,
};

pub use http::HostedHttpClient;
pub use memory::InMemoryHosted;

/// Reads take an optional access token and fall back to anonymous access;
/// writes always run as the signed-in user.
#[async_trait]
pub trait HostedClient: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<AuthSession, AppError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError>;

    async fn fetch_profile(&self, token: Option<&str>, id: &str) -> Result<Option<Profile>, AppError>;
    async fn insert_profile(&self, token: &str, profile: &Profile) -> Result<Profile, AppError>;
    /// Returns `None` when no row exists for the profile id.
    async fn update_profile(&self, token: &str, profile: &Profile) -> Result<Option<Profile>, AppError>;

    async fn upload_object(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), AppError>;
    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn fetch_courses(&self, token: Option<&str>) -> Result<Vec<Course>, AppError>;
    async fn fetch_course(&self, token: Option<&str>, id: &str) -> Result<Option<Course>, AppError>;
    async fn fetch_sections(&self, token: Option<&str>, course_id: &str) -> Result<Vec<Section>, AppError>;
    async fn fetch_lessons(&self, token: Option<&str>, section_ids: &[String]) -> Result<Vec<Lesson>, AppError>;
    async fn count_lessons(&self, token: Option<&str>, section_ids: &[String]) -> Result<u64, AppError>;

    async fn insert_course(&self, token: &str, course: &NewCourse) -> Result<Course, AppError>;
    async fn insert_section(&self, token: &str, section: &NewSection) -> Result<Section, AppError>;
    async fn insert_lessons(&self, token: &str, lessons: &[NewLesson]) -> Result<Vec<Lesson>, AppError>;

    async fn delete_course(&self, token: &str, id: &str) -> Result<(), AppError>;
    async fn delete_section(&self, token: &str, id: &str) -> Result<(), AppError>;
    async fn delete_lessons(&self, token: &str, section_id: &str) -> Result<(), AppError>;
}
