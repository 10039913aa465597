use futures::future::join_all;
use tracing::warn;

use crate::error::AppError;
use crate::hosted::HostedClient;
use crate::models::{Course, CourseSummary};

async fn count_for(
    hosted: &dyn HostedClient,
    token: Option<&str>,
    course_id: &str,
) -> Result<u64, AppError> {
    let sections = hosted.fetch_sections(token, course_id).await?;
    if sections.is_empty() {
        return Ok(0);
    }
    let ids: Vec<String> = sections.into_iter().map(|s| s.id).collect();
    hosted.count_lessons(token, &ids).await
}

async fn lesson_count(hosted: &dyn HostedClient, token: Option<&str>, course: &Course) -> u64 {
    match count_for(hosted, token, &course.id).await {
        Ok(count) => count,
        Err(e) => {
            warn!("could not count lessons for course {}: {}", course.id, e);
            0
        }
    }
}

/// Every course with its lesson count. Counts are looked up concurrently.
pub async fn load_catalog(
    hosted: &dyn HostedClient,
    token: Option<&str>,
) -> Result<Vec<CourseSummary>, AppError> {
    let courses = hosted.fetch_courses(token).await?;
    let counts = join_all(courses.iter().map(|c| lesson_count(hosted, token, c))).await;

    Ok(courses
        .into_iter()
        .zip(counts)
        .map(|(course, lesson_count)| CourseSummary {
            course,
            lesson_count,
        })
        .collect())
}

/// Case-insensitive substring match on title or description. An empty query
/// keeps everything; whitespace is matched as typed.
pub fn filter_courses(courses: Vec<CourseSummary>, query: &str) -> Vec<CourseSummary> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return courses;
    }
    courses
        .into_iter()
        .filter(|c| {
            c.course.title.to_lowercase().contains(&needle)
                || c.course.description.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosted::InMemoryHosted;
    use crate::hosted::memory::Op;
    use crate::models::{Lesson, Section};

    fn course(id: &str, title: &str, description: &str) -> Course {
        Course {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            price: None,
            image_url: None,
            creator_id: "creator".to_string(),
            creator: None,
        }
    }

    fn section(id: &str, course_id: &str) -> Section {
        Section {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: "Section".to_string(),
            order_number: 1,
        }
    }

    fn lesson(id: &str, section_id: &str) -> Lesson {
        Lesson {
            id: id.to_string(),
            section_id: section_id.to_string(),
            title: "Lesson".to_string(),
            description: None,
            video_url: "https://example.com/v".to_string(),
            duration: None,
            is_preview: false,
            order_number: 1,
        }
    }

    fn seeded() -> InMemoryHosted {
        let hosted = InMemoryHosted::new();
        hosted.put_course(
            course("c1", "Rust in Action", "Systems programming"),
            vec![section("s1", "c1"), section("s2", "c1")],
            vec![lesson("l1", "s1"), lesson("l2", "s1"), lesson("l3", "s2")],
        );
        hosted.put_course(course("c2", "Watercolor", "Painting with RUST tones"), vec![], vec![]);
        hosted.put_course(course("c3", "Baking", "Bread and pastry"), vec![], vec![]);
        hosted
    }

    #[tokio::test]
    async fn test_load_catalog_counts_lessons() {
        let hosted = seeded();
        let catalog = load_catalog(&hosted, None).await.unwrap();

        let counts: Vec<u64> = catalog.iter().map(|c| c.lesson_count).collect();
        assert_eq!(counts, vec![3, 0, 0]);
    }

    #[tokio::test]
    async fn test_failed_count_reads_as_zero() {
        let hosted = seeded();
        hosted.fail(Op::CountLessons, 0);

        let catalog = load_catalog(&hosted, None).await.unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0].lesson_count, 0);
    }

    #[tokio::test]
    async fn test_filter_matches_title_or_description() {
        let catalog = load_catalog(&seeded(), None).await.unwrap();

        let ids = |list: Vec<CourseSummary>| -> Vec<String> {
            list.into_iter().map(|c| c.course.id).collect()
        };
        assert_eq!(ids(filter_courses(catalog.clone(), "rust")), vec!["c1", "c2"]);
        assert_eq!(ids(filter_courses(catalog.clone(), "")).len(), 3);
        assert!(filter_courses(catalog, "quantum").is_empty());
    }

    #[test]
    fn test_filter_keeps_surrounding_whitespace() {
        let catalog = vec![CourseSummary {
            course: course("c9", "Rust", "Ownership"),
            lesson_count: 0,
        }];

        assert!(filter_courses(catalog.clone(), "rust ").is_empty());
        assert!(filter_courses(catalog.clone(), " ").is_empty());
        assert_eq!(filter_courses(catalog, "RUST").len(), 1);
    }
}
