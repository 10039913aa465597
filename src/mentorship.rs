use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, FieldError};
use crate::models::{BookingRequest, Mentor, MentorSession};

const MIN_SESSION_MINUTES: u32 = 30;
const MAX_SESSION_MINUTES: u32 = 180;

static MENTORS: [Mentor; 3] = [
    Mentor {
        id: "1",
        name: "John Doe",
        avatar: "/placeholder.svg",
        expertise: "Growth Hacking",
        hourly_rate: 120,
        rating: 4.9,
    },
    Mentor {
        id: "2",
        name: "Alice Wang",
        avatar: "/placeholder.svg",
        expertise: "SEO Specialist",
        hourly_rate: 95,
        rating: 4.8,
    },
    Mentor {
        id: "3",
        name: "Michael Brown",
        avatar: "/placeholder.svg",
        expertise: "YouTube Growth",
        hourly_rate: 150,
        rating: 5.0,
    },
];

pub fn mentors() -> &'static [Mentor] {
    &MENTORS
}

pub fn find_mentor(id: &str) -> Option<&'static Mentor> {
    MENTORS.iter().find(|m| m.id == id)
}

/// Mentorship bookings. Held in memory for the lifetime of the process.
#[derive(Default)]
pub struct MentorshipBook {
    sessions: Mutex<Vec<MentorSession>>,
}

impl MentorshipBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn book(
        &self,
        user_id: &str,
        req: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<MentorSession, AppError> {
        let mut errors = Vec::new();
        let mentor = find_mentor(&req.mentor_id);
        if mentor.is_none() {
            errors.push(FieldError::new("mentor_id", "Unknown mentor"));
        }
        if req.starts_at <= now {
            errors.push(FieldError::new("starts_at", "Sessions must be booked in the future"));
        }
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&req.duration_minutes) {
            errors.push(FieldError::new(
                "duration_minutes",
                format!(
                    "Duration must be between {} and {} minutes",
                    MIN_SESSION_MINUTES, MAX_SESSION_MINUTES
                ),
            ));
        }
        let Some(mentor) = mentor.filter(|_| errors.is_empty()) else {
            return Err(AppError::Validation(errors));
        };

        let session = MentorSession {
            id: Uuid::new_v4().to_string(),
            mentor_id: mentor.id.to_string(),
            mentor_name: mentor.name.to_string(),
            booked_by: user_id.to_string(),
            starts_at: req.starts_at,
            duration_minutes: req.duration_minutes,
        };
        info!("booked session with {} at {}", mentor.name, session.starts_at);

        self.sessions.lock().await.push(session.clone());
        Ok(session)
    }

    /// Sessions of `user_id` that have not started yet, soonest first.
    pub async fn upcoming(&self, user_id: &str, now: DateTime<Utc>) -> Vec<MentorSession> {
        let mut sessions: Vec<MentorSession> = self
            .sessions
            .lock()
            .await
            .iter()
            .filter(|s| s.booked_by == user_id && s.starts_at > now)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.starts_at);
        sessions
    }
}
