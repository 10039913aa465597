use serde::{Deserialize, Serialize};

/// Name and avatar of a course's creator, embedded in course reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub creator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<Creator>,
}

impl Course {
    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) if price > 0.0 => format!("${:.2}", price),
            _ => "Free".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub creator_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub order_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSection {
    pub course_id: String,
    pub title: String,
    pub order_number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub duration: Option<String>,
    #[serde(default)]
    pub is_preview: bool,
    pub order_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLesson {
    pub section_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub duration: Option<String>,
    pub is_preview: bool,
    pub order_number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionWithLessons {
    #[serde(flatten)]
    pub section: Section,
    pub lessons: Vec<Lesson>,
}

/// A course with its ordered sections and lessons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    pub sections: Vec<SectionWithLessons>,
}

impl CourseDetail {
    /// Groups lessons under their sections, both sorted by order_number.
    pub fn assemble(course: Course, mut sections: Vec<Section>, mut lessons: Vec<Lesson>) -> Self {
        sections.sort_by_key(|s| s.order_number);
        lessons.sort_by_key(|l| l.order_number);

        let sections = sections
            .into_iter()
            .map(|section| {
                let lessons = lessons
                    .iter()
                    .filter(|l| l.section_id == section.id)
                    .cloned()
                    .collect();
                SectionWithLessons { section, lessons }
            })
            .collect();

        Self { course, sections }
    }

    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.sections.iter().flat_map(|s| s.lessons.iter())
    }

    pub fn find_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons().find(|l| l.id == lesson_id)
    }
}

/// Catalog entry shown on the explore page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub lesson_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: &str, section_id: &str, order_number: i32) -> Lesson {
        Lesson {
            id: id.to_string(),
            section_id: section_id.to_string(),
            title: id.to_string(),
            description: None,
            video_url: "https://example.com/v".to_string(),
            duration: None,
            is_preview: false,
            order_number,
        }
    }

    #[test]
    fn test_assemble_orders_sections_and_lessons() {
        let course = Course {
            id: "c1".to_string(),
            title: "Rust".to_string(),
            description: String::new(),
            price: None,
            image_url: None,
            creator_id: "u1".to_string(),
            creator: None,
        };
        let sections = vec![
            Section { id: "s2".into(), course_id: "c1".into(), title: "Two".into(), order_number: 2 },
            Section { id: "s1".into(), course_id: "c1".into(), title: "One".into(), order_number: 1 },
        ];
        let lessons = vec![lesson("l2", "s1", 2), lesson("l3", "s2", 1), lesson("l1", "s1", 1)];

        let detail = CourseDetail::assemble(course, sections, lessons);

        assert_eq!(detail.sections[0].section.id, "s1");
        let ids: Vec<&str> = detail.lessons().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
        assert_eq!(detail.course.price_label(), "Free");
    }
}
