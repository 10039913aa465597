use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mentor {
    pub id: &'static str,
    pub name: &'static str,
    pub avatar: &'static str,
    pub expertise: &'static str,
    pub hourly_rate: u32,
    pub rating: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorSession {
    pub id: String,
    pub mentor_id: String,
    pub mentor_name: String,
    pub booked_by: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub mentor_id: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
}
