//! Process-wide session: who is signed in and their profile.
//!
//! [`SessionService`] is created at startup, resolves the initial session check
//! in [`SessionService::init`], and is torn down with
//! [`SessionService::shutdown`]. Every mutation calls the hosted backend first
//! and only touches local state once that call succeeded.

pub mod guard;

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::profile_cache;
use crate::error::{AppError, FieldError};
use crate::hosted::HostedClient;
use crate::models::{AuthSession, AuthUser, Profile, ProfileUpdate, ThemeColor};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub auth: AuthSession,
    pub profile: Profile,
}

impl ActiveSession {
    pub fn token(&self) -> &str {
        &self.auth.access_token
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Checking,
    Authenticated(Box<ActiveSession>),
    Unauthenticated,
}

/// Raw avatar image as received from the client.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn avatar_extension(content_type: &str) -> Option<&'static str> {
    match content_type.split(';').next().map(str::trim) {
        Some("image/png") => Some("png"),
        Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
        Some("image/gif") => Some("gif"),
        Some("image/webp") => Some("webp"),
        _ => None,
    }
}

pub struct SessionService {
    hosted: Arc<dyn HostedClient>,
    db: SqlitePool,
    status: watch::Sender<SessionStatus>,
    avatar_bucket: String,
    avatar_max_bytes: usize,
}

impl SessionService {
    pub fn new(hosted: Arc<dyn HostedClient>, db: SqlitePool, config: &AppConfig) -> Self {
        let (status, _) = watch::channel(SessionStatus::Checking);
        Self {
            hosted,
            db,
            status,
            avatar_bucket: config.avatar_bucket.clone(),
            avatar_max_bytes: config.avatar_max_bytes,
        }
    }

    /// Resolves the initial session check from the persisted auth session.
    ///
    /// Always leaves the status out of `Checking`, even when it fails.
    pub async fn init(&self) -> Result<(), AppError> {
        let result = self.restore().await;
        if result.is_err() {
            self.resolve(SessionStatus::Unauthenticated);
        }
        result
    }

    /// Settles the startup check. A sign-in or sign-out that landed while
    /// the check was running wins, so this only applies while `Checking`.
    fn resolve(&self, next: SessionStatus) -> bool {
        self.status.send_if_modified(|status| {
            if *status != SessionStatus::Checking {
                return false;
            }
            *status = next;
            true
        })
    }

    fn is_checking(&self) -> bool {
        *self.status.borrow() == SessionStatus::Checking
    }

    async fn restore(&self) -> Result<(), AppError> {
        let Some(saved) = profile_cache::load_auth_session(&self.db).await? else {
            info!("no stored session");
            self.resolve(SessionStatus::Unauthenticated);
            return Ok(());
        };

        let auth = match self.hosted.get_user(&saved.access_token).await {
            Ok(user) => AuthSession { user, ..saved },
            Err(AppError::Auth(message)) => {
                warn!("stored session rejected: {}", message);
                if self.is_checking() {
                    profile_cache::clear_auth_session(&self.db).await?;
                    self.resolve(SessionStatus::Unauthenticated);
                }
                return Ok(());
            }
            Err(e) => {
                warn!("could not verify stored session, using it as is: {}", e);
                saved
            }
        };

        let profile = self.load_profile(&auth).await;
        let user_id = auth.user.id.clone();
        if self.resolve(SessionStatus::Authenticated(Box::new(ActiveSession { auth, profile }))) {
            info!("restored session for {}", user_id);
        } else {
            debug!("session changed during startup check, keeping it");
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        info!("closing session store");
        self.db.close().await;
    }

    /// Round trip to the local database.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    pub fn avatar_max_bytes(&self) -> usize {
        self.avatar_max_bytes
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn current(&self) -> Option<ActiveSession> {
        match &*self.status.borrow() {
            SessionStatus::Authenticated(active) => Some(active.as_ref().clone()),
            _ => None,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ActiveSession, AppError> {
        let auth = self
            .hosted
            .sign_in_with_password(email.trim(), password)
            .await?;
        Ok(self.establish(auth).await)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<ActiveSession, AppError> {
        let mut errors = Vec::new();
        if !email.contains('@') {
            errors.push(FieldError::new("email", "Please enter a valid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if full_name.trim().is_empty() {
            errors.push(FieldError::new("full_name", "Name is required"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let mut auth = self
            .hosted
            .sign_up(email.trim(), password, full_name.trim())
            .await?;
        auth.user
            .full_name
            .get_or_insert_with(|| full_name.trim().to_string());
        Ok(self.establish(auth).await)
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        if let Some(active) = self.current() {
            match self.hosted.sign_out(active.token()).await {
                Ok(()) => info!("signed out {}", active.auth.user.id),
                // the token is already dead remotely; drop it locally too
                Err(AppError::Auth(message)) => {
                    warn!("sign-out rejected for {}: {}", active.auth.user.id, message)
                }
                Err(e) => return Err(e),
            }
        }
        if let Err(e) = profile_cache::clear_auth_session(&self.db).await {
            warn!("failed to clear stored session: {}", e);
        }
        self.status.send_replace(SessionStatus::Unauthenticated);
        Ok(())
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile, AppError> {
        let active = self.current().ok_or(AppError::Unauthorized)?;

        if let Some(name) = &update.full_name {
            if name.trim().is_empty() {
                return Err(AppError::Validation(vec![FieldError::new(
                    "full_name",
                    "Name cannot be empty",
                )]));
            }
        }
        if update.is_empty() {
            return Ok(active.profile);
        }

        let next = active.profile.apply(&update);
        let saved = match self.hosted.update_profile(active.token(), &next).await? {
            Some(saved) => saved,
            None => {
                debug!("profile {} missing remotely, inserting", next.id);
                self.hosted.insert_profile(active.token(), &next).await?
            }
        };

        self.cache(&saved).await;
        self.status.send_modify(|status| {
            if let SessionStatus::Authenticated(current) = status {
                if current.profile.id == saved.id {
                    current.profile = saved.clone();
                }
            }
        });
        Ok(saved)
    }

    pub async fn upload_avatar(&self, upload: AvatarUpload) -> Result<Profile, AppError> {
        let active = self.current().ok_or(AppError::Unauthorized)?;

        let extension = avatar_extension(&upload.content_type).ok_or_else(|| {
            AppError::Validation(vec![FieldError::new(
                "file",
                "Avatar must be a PNG, JPEG, GIF or WebP image",
            )])
        })?;
        if upload.bytes.is_empty() || upload.bytes.len() > self.avatar_max_bytes {
            return Err(AppError::Validation(vec![FieldError::new(
                "file",
                format!("Avatar must be between 1 byte and {} bytes", self.avatar_max_bytes),
            )]));
        }

        let path = format!(
            "{}/avatar-{}.{}",
            active.auth.user.id,
            Uuid::new_v4(),
            extension
        );
        self.hosted
            .upload_object(
                active.token(),
                &self.avatar_bucket,
                &path,
                &upload.content_type,
                upload.bytes,
            )
            .await?;
        let avatar_url = self.hosted.public_url(&self.avatar_bucket, &path);
        info!("uploaded avatar to {}", path);

        self.update_profile(ProfileUpdate {
            avatar_url: Some(avatar_url),
            ..Default::default()
        })
        .await
    }

    pub async fn become_creator(&self) -> Result<Profile, AppError> {
        self.update_profile(ProfileUpdate {
            is_creator: Some(true),
            ..Default::default()
        })
        .await
    }

    pub async fn save_theme_preference(&self, theme_color: ThemeColor) -> Result<Profile, AppError> {
        self.update_profile(ProfileUpdate {
            theme_color: Some(theme_color),
            ..Default::default()
        })
        .await
    }

    /// Profile of any identity, for profile pages of other users.
    pub async fn find_profile(&self, token: Option<&str>, id: &str) -> Result<Option<Profile>, AppError> {
        match self.hosted.fetch_profile(token, id).await {
            Ok(found) => Ok(found),
            Err(e) => {
                let cached = profile_cache::find_profile(&self.db, id).await?;
                if cached.is_none() {
                    return Err(e);
                }
                warn!("serving cached profile {}: {}", id, e);
                Ok(cached)
            }
        }
    }

    async fn establish(&self, auth: AuthSession) -> ActiveSession {
        if let Err(e) = profile_cache::save_auth_session(&self.db, &auth).await {
            warn!("failed to persist session: {}", e);
        }
        let profile = self.load_profile(&auth).await;
        let active = ActiveSession { auth, profile };
        info!("signed in {}", active.auth.user.id);
        self.status
            .send_replace(SessionStatus::Authenticated(Box::new(active.clone())));
        active
    }

    /// Remote row first, then the local copy, then a fresh default. Failures
    /// here are logged only; the session is usable either way.
    async fn load_profile(&self, auth: &AuthSession) -> Profile {
        let user = &auth.user;
        match self.hosted.fetch_profile(Some(&auth.access_token), &user.id).await {
            Ok(Some(remote)) => {
                self.cache(&remote).await;
                remote
            }
            Ok(None) => {
                let profile = self.cached_or_default(user).await;
                if let Err(e) = self.hosted.insert_profile(&auth.access_token, &profile).await {
                    warn!("failed to create remote profile for {}: {}", user.id, e);
                }
                self.cache(&profile).await;
                profile
            }
            Err(e) => {
                warn!("failed to fetch remote profile for {}: {}", user.id, e);
                let profile = self.cached_or_default(user).await;
                self.cache(&profile).await;
                profile
            }
        }
    }

    async fn cached_or_default(&self, user: &AuthUser) -> Profile {
        match profile_cache::find_profile(&self.db, &user.id).await {
            Ok(Some(cached)) => cached,
            Ok(None) => Profile::default_for(user),
            Err(e) => {
                warn!("failed to read cached profile for {}: {}", user.id, e);
                Profile::default_for(user)
            }
        }
    }

    async fn cache(&self, profile: &Profile) {
        if let Err(e) = profile_cache::save_profile(&self.db, profile).await {
            warn!("failed to cache profile {}: {}", profile.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosted::InMemoryHosted;
    use crate::hosted::memory::Op;

    async fn setup() -> (Arc<InMemoryHosted>, SessionService) {
        let db = crate::db::connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");
        let hosted = Arc::new(InMemoryHosted::new());
        let service = SessionService::new(hosted.clone(), db, &AppConfig::default());
        (hosted, service)
    }

    #[tokio::test]
    async fn test_init_without_stored_session() {
        let (_, service) = setup().await;
        assert_eq!(service.status(), SessionStatus::Checking);

        service.init().await.expect("init failed");
        assert_eq!(service.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_in_creates_default_profile() {
        let (hosted, service) = setup().await;
        let user = hosted.add_account("ada@example.com", "secret1", "Ada Lovelace");

        let active = service
            .sign_in("ada@example.com", "secret1")
            .await
            .expect("sign in failed");

        assert_eq!(active.profile.id, user.id);
        assert_eq!(active.profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert!(!active.profile.is_creator);
        assert_eq!(active.profile.theme_color, ThemeColor::Black);
        assert_eq!(hosted.profile(&user.id), Some(active.profile.clone()));
        assert!(matches!(service.status(), SessionStatus::Authenticated(_)));
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_state_unchanged() {
        let (hosted, service) = setup().await;
        hosted.add_account("ada@example.com", "secret1", "Ada");
        service.init().await.expect("init failed");

        let err = service.sign_in("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert_eq!(service.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_local_profile() {
        let (hosted, service) = setup().await;
        hosted.add_account("ada@example.com", "secret1", "Ada");
        let before = service.sign_in("ada@example.com", "secret1").await.unwrap().profile;

        hosted.fail(Op::UpdateProfile, 0);
        assert!(service.become_creator().await.is_err());

        assert_eq!(service.current().unwrap().profile, before);
        let cached = profile_cache::find_profile(&service.db, &before.id).await.unwrap();
        assert_eq!(cached, Some(before));
    }

    #[tokio::test]
    async fn test_remote_profile_read_failure_falls_back_to_cache() {
        let (hosted, service) = setup().await;
        let user = hosted.add_account("ada@example.com", "secret1", "Ada");
        let cached = Profile {
            id: user.id.clone(),
            full_name: Some("Cached Ada".to_string()),
            avatar_url: None,
            is_creator: true,
            theme_color: ThemeColor::Green,
        };
        profile_cache::save_profile(&service.db, &cached).await.unwrap();

        hosted.fail(Op::FetchProfile, 0);
        let active = service.sign_in("ada@example.com", "secret1").await.unwrap();

        assert_eq!(active.profile, cached);
    }

    #[tokio::test]
    async fn test_mutations_require_session() {
        let (_, service) = setup().await;
        service.init().await.unwrap();

        assert!(matches!(
            service.save_theme_preference(ThemeColor::Red).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_upload_avatar_updates_profile() {
        let (hosted, service) = setup().await;
        let user = hosted.add_account("ada@example.com", "secret1", "Ada");
        service.sign_in("ada@example.com", "secret1").await.unwrap();

        let profile = service
            .upload_avatar(AvatarUpload {
                content_type: "image/png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            })
            .await
            .expect("upload failed");

        let url = profile.avatar_url.expect("avatar url missing");
        let prefix = format!("memory://storage/avatars/{}/avatar-", user.id);
        assert!(url.starts_with(&prefix));
        assert!(url.ends_with(".png"));
        let path = url.trim_start_matches("memory://storage/");
        assert_eq!(hosted.object(path).map(|(ct, _)| ct), Some("image/png".to_string()));
    }

    #[tokio::test]
    async fn test_upload_avatar_rejects_unknown_type() {
        let (hosted, service) = setup().await;
        hosted.add_account("ada@example.com", "secret1", "Ada");
        service.sign_in("ada@example.com", "secret1").await.unwrap();
        let calls = hosted.calls();

        let err = service
            .upload_avatar(AvatarUpload {
                content_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(hosted.calls(), calls);
    }

    #[tokio::test]
    async fn test_sign_out_and_restore() {
        let (hosted, service) = setup().await;
        hosted.add_account("ada@example.com", "secret1", "Ada");
        service.sign_in("ada@example.com", "secret1").await.unwrap();

        // a second service over the same store picks the session back up
        let restarted = SessionService::new(hosted.clone(), service.db.clone(), &AppConfig::default());
        restarted.init().await.unwrap();
        assert!(restarted.current().is_some());

        let mut changes = service.subscribe();
        service.sign_out().await.expect("sign out failed");
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), SessionStatus::Unauthenticated);

        // nothing is left to restore after signing out
        let again = SessionService::new(hosted.clone(), service.db.clone(), &AppConfig::default());
        again.init().await.unwrap();
        assert_eq!(again.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_out_with_expired_token_still_clears_session() {
        let (hosted, service) = setup().await;
        hosted.add_account("ada@example.com", "secret1", "Ada");
        let active = service.sign_in("ada@example.com", "secret1").await.unwrap();
        hosted.expire_token(active.token());

        service.sign_out().await.expect("sign out failed");

        assert_eq!(service.status(), SessionStatus::Unauthenticated);
        let stored = profile_cache::load_auth_session(&service.db).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_keeps_session_when_backend_unreachable() {
        let (hosted, service) = setup().await;
        hosted.add_account("ada@example.com", "secret1", "Ada");
        service.sign_in("ada@example.com", "secret1").await.unwrap();
        hosted.fail(Op::SignOut, 0);

        let err = service.sign_out().await.unwrap_err();

        assert!(matches!(err, AppError::Hosted { .. }));
        assert!(service.current().is_some());
    }

    #[tokio::test]
    async fn test_startup_check_does_not_override_sign_in() {
        let (hosted, service) = setup().await;
        hosted.add_account("ada@example.com", "secret1", "Ada");

        // sign-in lands before the startup check has read anything back
        service.sign_in("ada@example.com", "secret1").await.unwrap();
        profile_cache::clear_auth_session(&service.db).await.unwrap();
        service.init().await.expect("init failed");

        assert!(matches!(service.status(), SessionStatus::Authenticated(_)));
    }
}
