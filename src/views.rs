//! JSON view models returned by the page and action handlers.

use serde::Serialize;

use crate::authoring::CourseDraft;
use crate::models::{CourseSummary, Mentor, MentorSession, Profile, ThemeColor};
use crate::session::ActiveSession;

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Notice {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Result of a successful action: what changed, what to tell the user, and
/// where to go next.
#[derive(Debug, Serialize)]
pub struct ActionView<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl<T> ActionView<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            notification: None,
            redirect: None,
        }
    }

    pub fn notify(mut self, notice: Notice) -> Self {
        self.notification = Some(notice);
        self
    }

    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect = Some(to.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
}

pub const NAV_ITEMS: [NavItem; 5] = [
    NavItem { label: "Home", href: "/app" },
    NavItem { label: "Explore", href: "/app/explore" },
    NavItem { label: "My Courses", href: "/app/dashboard" },
    NavItem { label: "Mentorship", href: "/app/mentorship" },
    NavItem { label: "Earnings", href: "/app/dashboard?tab=earnings" },
];

#[derive(Debug, Clone, Serialize)]
pub struct ShellView {
    pub nav: Vec<NavItem>,
    pub profile: Profile,
    pub email: Option<String>,
    pub root_class: String,
}

impl ShellView {
    pub fn for_session(active: &ActiveSession) -> Self {
        Self {
            nav: NAV_ITEMS.to_vec(),
            profile: active.profile.clone(),
            email: active.auth.user.email.clone(),
            root_class: active.profile.theme_color.root_class(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageView<T> {
    pub shell: ShellView,
    pub page: T,
}

impl<T> PageView<T> {
    pub fn new(active: &ActiveSession, page: T) -> Self {
        Self {
            shell: ShellView::for_session(active),
            page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub featured: Vec<CourseSummary>,
    pub mentors: &'static [Mentor],
    pub signed_in: bool,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LandingView {
    pub headline: &'static str,
    pub tagline: &'static str,
    pub features: [Feature; 3],
    pub call_to_action: NavItem,
}

pub fn landing() -> LandingView {
    LandingView {
        headline: "Learn from creators who have done it",
        tagline: "Courses and one-on-one mentorship from people building real audiences.",
        features: [
            Feature {
                title: "Video courses",
                description: "Structured sections and lessons you can watch at your own pace.",
            },
            Feature {
                title: "Mentorship",
                description: "Book a session with an expert in growth, SEO or video.",
            },
            Feature {
                title: "Teach",
                description: "Become a creator and publish your own course.",
            },
        ],
        call_to_action: NavItem {
            label: "Get started",
            href: "/auth",
        },
    }
}

#[derive(Debug, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthForm {
    pub action: &'static str,
    pub method: &'static str,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Serialize)]
pub struct AuthView {
    pub signed_in: bool,
    pub sign_in: AuthForm,
    pub sign_up: AuthForm,
}

pub fn auth_page(signed_in: bool) -> AuthView {
    let field = |name, kind| FormField {
        name,
        kind,
        required: true,
    };
    AuthView {
        signed_in,
        sign_in: AuthForm {
            action: "/auth/sign-in",
            method: "POST",
            fields: vec![field("email", "email"), field("password", "password")],
        },
        sign_up: AuthForm {
            action: "/auth/sign-up",
            method: "POST",
            fields: vec![
                field("full_name", "text"),
                field("email", "email"),
                field("password", "password"),
            ],
        },
    }
}

#[derive(Debug, Serialize)]
pub struct ExploreView {
    pub query: String,
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Serialize)]
pub struct DraftView {
    pub draft: CourseDraft,
    pub total_lessons: usize,
    pub can_publish: bool,
}

impl DraftView {
    pub fn new(draft: &CourseDraft, is_creator: bool) -> Self {
        Self {
            total_lessons: draft.total_lessons(),
            can_publish: is_creator && draft.total_lessons() > 0,
            draft: draft.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MentorshipView {
    pub mentors: &'static [Mentor],
    pub upcoming: Vec<MentorSession>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub tab: String,
    pub is_creator: bool,
    pub courses: Vec<CourseSummary>,
    pub upcoming: Vec<MentorSession>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Profile,
    pub is_self: bool,
    pub root_class: String,
}

impl ProfileView {
    pub fn new(profile: Profile, viewer_id: &str) -> Self {
        Self {
            is_self: profile.id == viewer_id,
            root_class: profile.theme_color.root_class(),
            profile,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThemeView {
    pub theme_color: ThemeColor,
    pub root_class: String,
}
