use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use super::HostedClient;
use crate::error::AppError;
use crate::models::{
    AuthSession, AuthUser, Course, Creator, Lesson, NewCourse, NewLesson, NewSection, Profile,
    Section,
};

/// Operations of [`InMemoryHosted`] that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SignIn,
    SignUp,
    SignOut,
    GetUser,
    FetchProfile,
    InsertProfile,
    UpdateProfile,
    Upload,
    FetchCourses,
    FetchCourse,
    FetchSections,
    FetchLessons,
    CountLessons,
    InsertCourse,
    InsertSection,
    InsertLessons,
    DeleteCourse,
    DeleteSection,
    DeleteLessons,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, (String, AuthUser)>,
    tokens: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
    courses: Vec<Course>,
    sections: Vec<Section>,
    lessons: Vec<Lesson>,
    objects: HashMap<String, (String, Vec<u8>)>,
    // op -> number of further calls that succeed before the next one fails
    failures: HashMap<Op, usize>,
}

/// Hosted backend held entirely in process memory.
///
/// Backs the `memory` development mode and the test suites. Every trait call
/// is counted, and any operation can be scripted to fail.
#[derive(Default)]
pub struct InMemoryHosted {
    store: Mutex<Store>,
    calls: AtomicUsize,
}

impl InMemoryHosted {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers an account that can sign in right away.
    pub fn add_account(&self, email: &str, password: &str, full_name: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            full_name: Some(full_name.to_string()),
            avatar_url: None,
        };
        self.store()
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    pub fn put_profile(&self, profile: Profile) {
        self.store().profiles.insert(profile.id.clone(), profile);
    }

    pub fn profile(&self, id: &str) -> Option<Profile> {
        self.store().profiles.get(id).cloned()
    }

    pub fn put_course(&self, course: Course, sections: Vec<Section>, lessons: Vec<Lesson>) {
        let mut store = self.store();
        store.courses.push(course);
        store.sections.extend(sections);
        store.lessons.extend(lessons);
    }

    /// Lets `after` more calls of `op` succeed, then fails the next one.
    pub fn fail(&self, op: Op, after: usize) {
        self.store().failures.insert(op, after);
    }

    /// Invalidates an access token, as if it had run out.
    pub fn expire_token(&self, access_token: &str) {
        self.store().tokens.remove(access_token);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn courses(&self) -> Vec<Course> {
        self.store().courses.clone()
    }

    pub fn sections(&self) -> Vec<Section> {
        self.store().sections.clone()
    }

    pub fn lessons(&self) -> Vec<Lesson> {
        self.store().lessons.clone()
    }

    pub fn object(&self, path: &str) -> Option<(String, Vec<u8>)> {
        self.store().objects.get(path).cloned()
    }

    fn enter(&self, op: Op) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut store = self.store();
        match store.failures.get(&op).copied() {
            Some(0) => {
                store.failures.remove(&op);
                Err(AppError::Hosted {
                    status: 503,
                    message: format!("{:?} unavailable", op),
                })
            }
            Some(remaining) => {
                store.failures.insert(op, remaining - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn authorize(&self, token: &str) -> Result<String, AppError> {
        self.store()
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Auth("Invalid or expired session".to_string()))
    }

    fn issue_session(store: &mut Store, user: AuthUser) -> AuthSession {
        let access_token = format!("token-{}", Uuid::new_v4());
        store.tokens.insert(access_token.clone(), user.id.clone());
        AuthSession {
            access_token,
            refresh_token: None,
            user,
        }
    }

    fn with_creator(store: &Store, mut course: Course) -> Course {
        course.creator = store.profiles.get(&course.creator_id).map(|p| Creator {
            full_name: p.full_name.clone(),
            avatar_url: p.avatar_url.clone(),
        });
        course
    }
}

#[async_trait]
impl HostedClient for InMemoryHosted {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        self.enter(Op::SignIn)?;
        let mut store = self.store();
        let user = match store.accounts.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(AppError::Auth("Invalid login credentials".to_string())),
        };
        Ok(Self::issue_session(&mut store, user))
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<AuthSession, AppError> {
        self.enter(Op::SignUp)?;
        if self.store().accounts.contains_key(email) {
            return Err(AppError::Auth("User already registered".to_string()));
        }
        let user = self.add_account(email, password, full_name);
        let mut store = self.store();
        Ok(Self::issue_session(&mut store, user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.enter(Op::SignOut)?;
        self.authorize(access_token)?;
        self.store().tokens.remove(access_token);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        self.enter(Op::GetUser)?;
        let user_id = self.authorize(access_token)?;
        self.store()
            .accounts
            .values()
            .find(|(_, user)| user.id == user_id)
            .map(|(_, user)| user.clone())
            .ok_or_else(|| AppError::Auth("User not found".to_string()))
    }

    async fn fetch_profile(&self, _token: Option<&str>, id: &str) -> Result<Option<Profile>, AppError> {
        self.enter(Op::FetchProfile)?;
        Ok(self.profile(id))
    }

    async fn insert_profile(&self, token: &str, profile: &Profile) -> Result<Profile, AppError> {
        self.enter(Op::InsertProfile)?;
        self.authorize(token)?;
        let mut store = self.store();
        if store.profiles.contains_key(&profile.id) {
            return Err(AppError::Hosted {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }
        store.profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn update_profile(&self, token: &str, profile: &Profile) -> Result<Option<Profile>, AppError> {
        self.enter(Op::UpdateProfile)?;
        self.authorize(token)?;
        let mut store = self.store();
        let updated = store.profiles.get_mut(&profile.id).map(|existing| {
            *existing = profile.clone();
            existing.clone()
        });
        Ok(updated)
    }

    async fn upload_object(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), AppError> {
        self.enter(Op::Upload)?;
        self.authorize(token)?;
        self.store().objects.insert(
            format!("{}/{}", bucket, path),
            (content_type.to_string(), bytes),
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://storage/{}/{}", bucket, path)
    }

    async fn fetch_courses(&self, _token: Option<&str>) -> Result<Vec<Course>, AppError> {
        self.enter(Op::FetchCourses)?;
        let store = self.store();
        let courses = store
            .courses
            .iter()
            .cloned()
            .map(|c| Self::with_creator(&store, c))
            .collect();
        Ok(courses)
    }

    async fn fetch_course(&self, _token: Option<&str>, id: &str) -> Result<Option<Course>, AppError> {
        self.enter(Op::FetchCourse)?;
        let store = self.store();
        let course = store
            .courses
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| Self::with_creator(&store, c));
        Ok(course)
    }

    async fn fetch_sections(&self, _token: Option<&str>, course_id: &str) -> Result<Vec<Section>, AppError> {
        self.enter(Op::FetchSections)?;
        let mut sections: Vec<Section> = self
            .store()
            .sections
            .iter()
            .filter(|s| s.course_id == course_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.order_number);
        Ok(sections)
    }

    async fn fetch_lessons(&self, _token: Option<&str>, section_ids: &[String]) -> Result<Vec<Lesson>, AppError> {
        self.enter(Op::FetchLessons)?;
        let mut lessons: Vec<Lesson> = self
            .store()
            .lessons
            .iter()
            .filter(|l| section_ids.contains(&l.section_id))
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.order_number);
        Ok(lessons)
    }

    async fn count_lessons(&self, _token: Option<&str>, section_ids: &[String]) -> Result<u64, AppError> {
        self.enter(Op::CountLessons)?;
        let count = self
            .store()
            .lessons
            .iter()
            .filter(|l| section_ids.contains(&l.section_id))
            .count();
        Ok(count as u64)
    }

    async fn insert_course(&self, token: &str, course: &NewCourse) -> Result<Course, AppError> {
        self.enter(Op::InsertCourse)?;
        self.authorize(token)?;
        let course = Course {
            id: Uuid::new_v4().to_string(),
            title: course.title.clone(),
            description: course.description.clone(),
            price: course.price,
            image_url: course.image_url.clone(),
            creator_id: course.creator_id.clone(),
            creator: None,
        };
        self.store().courses.push(course.clone());
        Ok(course)
    }

    async fn insert_section(&self, token: &str, section: &NewSection) -> Result<Section, AppError> {
        self.enter(Op::InsertSection)?;
        self.authorize(token)?;
        let section = Section {
            id: Uuid::new_v4().to_string(),
            course_id: section.course_id.clone(),
            title: section.title.clone(),
            order_number: section.order_number,
        };
        self.store().sections.push(section.clone());
        Ok(section)
    }

    async fn insert_lessons(&self, token: &str, lessons: &[NewLesson]) -> Result<Vec<Lesson>, AppError> {
        self.enter(Op::InsertLessons)?;
        self.authorize(token)?;
        let inserted: Vec<Lesson> = lessons
            .iter()
            .map(|l| Lesson {
                id: Uuid::new_v4().to_string(),
                section_id: l.section_id.clone(),
                title: l.title.clone(),
                description: l.description.clone(),
                video_url: l.video_url.clone(),
                duration: l.duration.clone(),
                is_preview: l.is_preview,
                order_number: l.order_number,
            })
            .collect();
        self.store().lessons.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn delete_course(&self, token: &str, id: &str) -> Result<(), AppError> {
        self.enter(Op::DeleteCourse)?;
        self.authorize(token)?;
        self.store().courses.retain(|c| c.id != id);
        Ok(())
    }

    async fn delete_section(&self, token: &str, id: &str) -> Result<(), AppError> {
        self.enter(Op::DeleteSection)?;
        self.authorize(token)?;
        self.store().sections.retain(|s| s.id != id);
        Ok(())
    }

    async fn delete_lessons(&self, token: &str, section_id: &str) -> Result<(), AppError> {
        self.enter(Op::DeleteLessons)?;
        self.authorize(token)?;
        self.store().lessons.retain(|l| l.section_id != section_id);
        Ok(())
    }
}
