//! Local copy of profile records and the persisted auth session.
//!
//! Plays the role browser local storage plays for a web client: a map of
//! identity id to profile, read as a fallback when the hosted store is
//! unreachable. Writes are last-writer-wins.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::models::{AuthSession, AuthUser, Profile, ThemeColor};

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: String,
    full_name: Option<String>,
    avatar_url: Option<String>,
    is_creator: bool,
    theme_color: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            is_creator: row.is_creator,
            theme_color: ThemeColor::from(row.theme_color),
        }
    }
}

#[derive(Debug, FromRow)]
struct AuthSessionRow {
    access_token: String,
    refresh_token: Option<String>,
    user_id: String,
    email: Option<String>,
    full_name: Option<String>,
    avatar_url: Option<String>,
}

pub async fn find_profile(db: &SqlitePool, id: &str) -> Result<Option<Profile>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, full_name, avatar_url, is_creator, theme_color FROM profiles WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row.map(Profile::from))
}

pub async fn save_profile(db: &SqlitePool, profile: &Profile) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO profiles (id, full_name, avatar_url, is_creator, theme_color, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            full_name = excluded.full_name,
            avatar_url = excluded.avatar_url,
            is_creator = excluded.is_creator,
            theme_color = excluded.theme_color,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.full_name)
    .bind(&profile.avatar_url)
    .bind(profile.is_creator)
    .bind(profile.theme_color.as_str())
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn load_auth_session(db: &SqlitePool) -> Result<Option<AuthSession>, sqlx::Error> {
    let row = sqlx::query_as::<_, AuthSessionRow>(
        r#"
        SELECT access_token, refresh_token, user_id, email, full_name, avatar_url
        FROM auth_session
        WHERE slot = 'current'
        "#,
    )
    .fetch_optional(db)
    .await?;

    Ok(row.map(|row| AuthSession {
        access_token: row.access_token,
        refresh_token: row.refresh_token,
        user: AuthUser {
            id: row.user_id,
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
        },
    }))
}

pub async fn save_auth_session(db: &SqlitePool, session: &AuthSession) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO auth_session
            (slot, access_token, refresh_token, user_id, email, full_name, avatar_url, saved_at)
        VALUES ('current', ?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(slot) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            user_id = excluded.user_id,
            email = excluded.email,
            full_name = excluded.full_name,
            avatar_url = excluded.avatar_url,
            saved_at = excluded.saved_at
        "#,
    )
    .bind(&session.access_token)
    .bind(&session.refresh_token)
    .bind(&session.user.id)
    .bind(&session.user.email)
    .bind(&session.user.full_name)
    .bind(&session.user.avatar_url)
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn clear_auth_session(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM auth_session WHERE slot = 'current'")
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        crate::db::connect("sqlite::memory:")
            .await
            .expect("Failed to create test db")
    }

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            full_name: Some("Grace Hopper".to_string()),
            avatar_url: None,
            is_creator: false,
            theme_color: ThemeColor::Black,
        }
    }

    #[tokio::test]
    async fn test_save_and_find_profile() {
        let pool = setup_test_db().await;

        assert!(find_profile(&pool, "u1").await.expect("Failed to query").is_none());

        save_profile(&pool, &profile("u1")).await.expect("Failed to save profile");
        let found = find_profile(&pool, "u1")
            .await
            .expect("Failed to query")
            .expect("Profile missing");
        assert_eq!(found, profile("u1"));
    }

    #[tokio::test]
    async fn test_save_profile_overwrites() {
        let pool = setup_test_db().await;

        save_profile(&pool, &profile("u1")).await.expect("Failed to save profile");
        let mut changed = profile("u1");
        changed.is_creator = true;
        changed.theme_color = ThemeColor::Orange;
        save_profile(&pool, &changed).await.expect("Failed to save profile");
        save_profile(&pool, &profile("u2")).await.expect("Failed to save profile");

        let u1 = find_profile(&pool, "u1").await.expect("Failed to query").expect("Profile missing");
        assert_eq!(u1.theme_color, ThemeColor::Orange);
        assert!(u1.is_creator);
        let u2 = find_profile(&pool, "u2").await.expect("Failed to query").expect("Profile missing");
        assert_eq!(u2, profile("u2"));
    }

    #[tokio::test]
    async fn test_auth_session_roundtrip() {
        let pool = setup_test_db().await;
        let session = AuthSession {
            access_token: "token-1".to_string(),
            refresh_token: None,
            user: AuthUser {
                id: "u1".to_string(),
                email: Some("grace@example.com".to_string()),
                full_name: None,
                avatar_url: None,
            },
        };

        save_auth_session(&pool, &session).await.expect("Failed to save session");
        assert_eq!(load_auth_session(&pool).await.unwrap(), Some(session));

        clear_auth_session(&pool).await.expect("Failed to clear session");
        assert_eq!(load_auth_session(&pool).await.unwrap(), None);
    }
}
