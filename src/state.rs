use std::sync::Arc;

use tokio::sync::Mutex;

use crate::authoring::CourseDraft;
use crate::hosted::HostedClient;
use crate::mentorship::MentorshipBook;
use crate::session::SessionService;

#[derive(Clone)]
pub struct AppState {
    pub hosted: Arc<dyn HostedClient>,
    pub session: Arc<SessionService>,
    pub draft: Arc<Mutex<CourseDraft>>,
    pub mentorship: Arc<MentorshipBook>,
}

impl AppState {
    pub fn new(hosted: Arc<dyn HostedClient>, session: Arc<SessionService>) -> Self {
        Self {
            hosted,
            session,
            draft: Arc::new(Mutex::new(CourseDraft::default())),
            mentorship: Arc::new(MentorshipBook::new()),
        }
    }
}
