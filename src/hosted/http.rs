use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{HostedClient, dto};
use crate::config::HostedConfig;
use crate::error::AppError;
use crate::models::{
    AuthSession, AuthUser, Course, Lesson, NewCourse, NewLesson, NewSection, Profile, Section,
};

const COURSE_COLUMNS: &str =
    "id,title,description,price,image_url,creator_id,creator:profiles(full_name,avatar_url)";

pub struct HostedHttpClient {
    client: Client,
    config: HostedConfig,
}

impl HostedHttpClient {
    pub fn new(config: HostedConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        Url::parse(&format!("{}{}", self.config.base_url, path))
            .map_err(|e| AppError::Config(format!("Invalid hosted url for {}: {}", path, e)))
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> Result<Url, AppError> {
        let mut url = self.url(&format!("/rest/v1/{}", table))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.config.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn error_message(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<dto::ErrorBody>(&body)
            .ok()
            .and_then(dto::ErrorBody::into_message)
            .unwrap_or(body);
        (status, message)
    }

    async fn check(response: Response) -> Result<Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, message) = Self::error_message(response).await;
        Err(AppError::Hosted {
            status: status.as_u16(),
            message,
        })
    }

    /// Auth endpoints report bad credentials and the like as client errors;
    /// those become [`AppError::Auth`] so the caller can show them as-is.
    async fn check_auth(response: Response) -> Result<Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, message) = Self::error_message(response).await;
        if status.is_client_error() {
            Err(AppError::Auth(message))
        } else {
            Err(AppError::Hosted {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn select<T: DeserializeOwned>(
        &self,
        token: Option<&str>,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let url = self.table_url(table, params)?;
        debug!("select {}", url);
        let response = self.request(Method::GET, url, token).send().await?;
        Ok(Self::check(response).await?.json::<Vec<T>>().await?)
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        token: &str,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, AppError> {
        let url = self.table_url(table, &[])?;
        let response = self
            .request(Method::POST, url, Some(token))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<Vec<T>>().await?)
    }

    async fn delete(&self, token: &str, table: &str, params: &[(&str, String)]) -> Result<(), AppError> {
        let url = self.table_url(table, params)?;
        let response = self.request(Method::DELETE, url, Some(token)).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn single<T>(mut rows: Vec<T>, table: &str) -> Result<T, AppError> {
        if rows.is_empty() {
            return Err(AppError::Hosted {
                status: StatusCode::OK.as_u16(),
                message: format!("Insert into {} returned no row", table),
            });
        }
        Ok(rows.swap_remove(0))
    }
}

fn in_list(ids: &[String]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("\"{}\"", id)).collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait]
impl HostedClient for HostedHttpClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let mut url = self.url("/auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request(Method::POST, url, None)
            .json(&dto::PasswordGrantRequest { email, password })
            .send()
            .await?;

        let token = Self::check_auth(response)
            .await?
            .json::<dto::TokenResponse>()
            .await?;
        Ok(token.into())
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<AuthSession, AppError> {
        let url = self.url("/auth/v1/signup")?;
        let request_body = dto::SignUpRequest {
            email,
            password,
            data: dto::UserMetadata {
                full_name: Some(full_name.to_string()),
                avatar_url: None,
            },
        };

        let response = self
            .request(Method::POST, url, None)
            .json(&request_body)
            .send()
            .await?;

        match Self::check_auth(response)
            .await?
            .json::<dto::SignUpResponse>()
            .await?
        {
            dto::SignUpResponse::Session(token) => Ok(token.into()),
            dto::SignUpResponse::PendingConfirmation(user) => {
                warn!("sign-up for {} is waiting on email confirmation", user.id);
                Err(AppError::Auth(
                    "Check your email to confirm your account, then sign in".to_string(),
                ))
            }
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = self.url("/auth/v1/logout")?;
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        Self::check_auth(response).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        let url = self.url("/auth/v1/user")?;
        let response = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;
        let user = Self::check_auth(response).await?.json::<dto::UserDto>().await?;
        Ok(user.into())
    }

    async fn fetch_profile(&self, token: Option<&str>, id: &str) -> Result<Option<Profile>, AppError> {
        let rows: Vec<Profile> = self
            .select(
                token,
                "profiles",
                &[("select", "*".to_string()), ("id", format!("eq.{}", id))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, token: &str, profile: &Profile) -> Result<Profile, AppError> {
        let row = dto::ProfileRow {
            id: &profile.id,
            full_name: profile.full_name.as_deref(),
            avatar_url: profile.avatar_url.as_deref(),
            is_creator: profile.is_creator,
            theme_color: profile.theme_color.as_str(),
        };
        let rows: Vec<Profile> = self.insert(token, "profiles", &[row]).await?;
        Self::single(rows, "profiles")
    }

    async fn update_profile(&self, token: &str, profile: &Profile) -> Result<Option<Profile>, AppError> {
        let url = self.table_url("profiles", &[("id", format!("eq.{}", profile.id))])?;
        let row = dto::ProfileRow {
            id: &profile.id,
            full_name: profile.full_name.as_deref(),
            avatar_url: profile.avatar_url.as_deref(),
            is_creator: profile.is_creator,
            theme_color: profile.theme_color.as_str(),
        };

        let response = self
            .request(Method::PATCH, url, Some(token))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let rows = Self::check(response).await?.json::<Vec<Profile>>().await?;
        Ok(rows.into_iter().next())
    }

    async fn upload_object(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), AppError> {
        let url = self.url(&format!("/storage/v1/object/{}/{}", bucket, path))?;
        let response = self
            .request(Method::POST, url, Some(token))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url, bucket, path
        )
    }

    async fn fetch_courses(&self, token: Option<&str>) -> Result<Vec<Course>, AppError> {
        self.select(token, "courses", &[("select", COURSE_COLUMNS.to_string())])
            .await
    }

    async fn fetch_course(&self, token: Option<&str>, id: &str) -> Result<Option<Course>, AppError> {
        let rows: Vec<Course> = self
            .select(
                token,
                "courses",
                &[
                    ("select", COURSE_COLUMNS.to_string()),
                    ("id", format!("eq.{}", id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_sections(&self, token: Option<&str>, course_id: &str) -> Result<Vec<Section>, AppError> {
        self.select(
            token,
            "course_sections",
            &[
                ("select", "*".to_string()),
                ("course_id", format!("eq.{}", course_id)),
                ("order", "order_number.asc".to_string()),
            ],
        )
        .await
    }

    async fn fetch_lessons(&self, token: Option<&str>, section_ids: &[String]) -> Result<Vec<Lesson>, AppError> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            token,
            "course_lessons",
            &[
                ("select", "*".to_string()),
                ("section_id", in_list(section_ids)),
                ("order", "order_number.asc".to_string()),
            ],
        )
        .await
    }

    async fn count_lessons(&self, token: Option<&str>, section_ids: &[String]) -> Result<u64, AppError> {
        if section_ids.is_empty() {
            return Ok(0);
        }
        let url = self.table_url(
            "course_lessons",
            &[
                ("select", "id".to_string()),
                ("section_id", in_list(section_ids)),
                ("limit", "0".to_string()),
            ],
        )?;

        let response = self
            .request(Method::GET, url, token)
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;

        response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(dto::parse_content_range_total)
            .ok_or_else(|| AppError::Hosted {
                status: response.status().as_u16(),
                message: "Lesson count missing from Content-Range".to_string(),
            })
    }

    async fn insert_course(&self, token: &str, course: &NewCourse) -> Result<Course, AppError> {
        let rows: Vec<Course> = self.insert(token, "courses", std::slice::from_ref(course)).await?;
        Self::single(rows, "courses")
    }

    async fn insert_section(&self, token: &str, section: &NewSection) -> Result<Section, AppError> {
        let rows: Vec<Section> = self
            .insert(token, "course_sections", std::slice::from_ref(section))
            .await?;
        Self::single(rows, "course_sections")
    }

    async fn insert_lessons(&self, token: &str, lessons: &[NewLesson]) -> Result<Vec<Lesson>, AppError> {
        if lessons.is_empty() {
            return Ok(Vec::new());
        }
        self.insert(token, "course_lessons", lessons).await
    }

    async fn delete_course(&self, token: &str, id: &str) -> Result<(), AppError> {
        self.delete(token, "courses", &[("id", format!("eq.{}", id))]).await
    }

    async fn delete_section(&self, token: &str, id: &str) -> Result<(), AppError> {
        self.delete(token, "course_sections", &[("id", format!("eq.{}", id))])
            .await
    }

    async fn delete_lessons(&self, token: &str, section_id: &str) -> Result<(), AppError> {
        self.delete(
            token,
            "course_lessons",
            &[("section_id", format!("eq.{}", section_id))],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HostedHttpClient {
        HostedHttpClient::new(HostedConfig {
            base_url: "https://project.example.co".to_string(),
            anon_key: "anon".to_string(),
        })
        .expect("Failed to build client")
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            client().public_url("avatars", "u1/avatar.png"),
            "https://project.example.co/storage/v1/object/public/avatars/u1/avatar.png"
        );
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let url = client()
            .table_url(
                "course_lessons",
                &[("section_id", in_list(&["a".to_string(), "b".to_string()]))],
            )
            .expect("Failed to build url");

        assert_eq!(url.path(), "/rest/v1/course_lessons");
        let (key, value) = url.query_pairs().next().expect("missing query");
        assert_eq!(key, "section_id");
        assert_eq!(value, "in.(\"a\",\"b\")");
    }
}
