use reqwest::Url;

use super::draft::{CourseDetailsInput, LessonInput, SectionInput};
use crate::error::FieldError;

const MIN_TITLE_LEN: usize = 3;
const MIN_DESCRIPTION_LEN: usize = 10;

pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

fn check_title(errors: &mut Vec<FieldError>, title: &str, message: &str) {
    if title.trim().chars().count() < MIN_TITLE_LEN {
        errors.push(FieldError::new("title", message));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_details(details: &CourseDetailsInput) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    check_title(&mut errors, &details.title, "Title must be at least 3 characters");
    if details.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        errors.push(FieldError::new(
            "description",
            "Description must be at least 10 characters",
        ));
    }
    if let Some(price) = details.price {
        if !price.is_finite() || price < 0.0 {
            errors.push(FieldError::new("price", "Price must be 0 or greater"));
        }
    }
    if let Some(image_url) = details.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
        if !is_valid_url(image_url) {
            errors.push(FieldError::new("image_url", "Please enter a valid URL"));
        }
    }
    finish(errors)
}

pub fn validate_section(input: &SectionInput) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    check_title(&mut errors, &input.title, "Section title must be at least 3 characters");
    finish(errors)
}

pub fn validate_lesson(input: &LessonInput) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    check_title(&mut errors, &input.title, "Lesson title must be at least 3 characters");
    if !is_valid_url(&input.video_url) {
        errors.push(FieldError::new("video_url", "Please enter a valid URL"));
    }
    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_valid_url("youtu.be/dQw4w9WgXcQ"));
        assert!(!is_valid_url("ftp://files.example.com/video"));
    }

    #[test]
    fn test_validate_details_reports_every_field() {
        let errors = validate_details(&CourseDetailsInput {
            title: "Go".to_string(),
            description: "short".to_string(),
            price: Some(-1.0),
            image_url: Some("not a url".to_string()),
        })
        .unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "description", "price", "image_url"]);
    }

    #[test]
    fn test_validate_details_accepts_blank_image() {
        let details = CourseDetailsInput {
            title: "Rust for creators".to_string(),
            description: "Ownership, borrowing and traits".to_string(),
            price: None,
            image_url: Some(String::new()),
        };
        assert!(validate_details(&details).is_ok());
    }
}
