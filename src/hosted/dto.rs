use serde::{Deserialize, Serialize};

use crate::models::{AuthSession, AuthUser};

#[derive(Debug, Serialize)]
pub struct PasswordGrantRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: UserMetadata,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl From<UserDto> for AuthUser {
    fn from(dto: UserDto) -> Self {
        AuthUser {
            id: dto.id,
            email: dto.email,
            full_name: dto.user_metadata.full_name,
            avatar_url: dto.user_metadata.avatar_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserDto,
}

impl From<TokenResponse> for AuthSession {
    fn from(dto: TokenResponse) -> Self {
        AuthSession {
            access_token: dto.access_token,
            refresh_token: dto.refresh_token,
            user: dto.user.into(),
        }
    }
}

/// Sign-up answers with a session when accounts are auto-confirmed, and with
/// the bare user when an email confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    PendingConfirmation(UserDto),
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileRow<'a> {
    pub id: &'a str,
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub is_creator: bool,
    pub theme_color: &'a str,
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/42`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-9/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-9/*"), None);
    }

    #[test]
    fn test_sign_up_response_variants() {
        let session = r#"{"access_token":"t","refresh_token":"r","user":{"id":"u1","email":"a@b.c","user_metadata":{"full_name":"Ada"}}}"#;
        match serde_json::from_str::<SignUpResponse>(session).unwrap() {
            SignUpResponse::Session(token) => {
                let session: AuthSession = token.into();
                assert_eq!(session.user.full_name.as_deref(), Some("Ada"));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let pending = r#"{"id":"u2","email":"x@y.z"}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(pending).unwrap(),
            SignUpResponse::PendingConfirmation(_)
        ));
    }
}
