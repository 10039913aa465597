use serde::{Deserialize, Deserializer, Serialize};

use super::ThemeColor;

/// Denormalized profile record, one per identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_creator: bool,
    #[serde(default, deserialize_with = "nullable_theme")]
    pub theme_color: ThemeColor,
}

fn nullable_theme<'de, D>(deserializer: D) -> Result<ThemeColor, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ThemeColor>::deserialize(deserializer)?.unwrap_or_default())
}

impl Profile {
    /// Profile created the first time an identity signs in.
    pub fn default_for(user: &AuthUser) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
            is_creator: false,
            theme_color: ThemeColor::Black,
        }
    }

    pub fn apply(&self, update: &ProfileUpdate) -> Profile {
        let mut next = self.clone();
        if let Some(full_name) = &update.full_name {
            next.full_name = Some(full_name.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            next.avatar_url = Some(avatar_url.clone());
        }
        if let Some(is_creator) = update.is_creator {
            next.is_creator = is_creator;
        }
        if let Some(theme_color) = update.theme_color {
            next.theme_color = theme_color;
        }
        next
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_creator: Option<bool>,
    pub theme_color: Option<ThemeColor>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.avatar_url.is_none()
            && self.is_creator.is_none()
            && self.theme_color.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let profile = Profile {
            id: "u1".to_string(),
            full_name: Some("Ada".to_string()),
            avatar_url: None,
            is_creator: false,
            theme_color: ThemeColor::Black,
        };

        let updated = profile.apply(&ProfileUpdate {
            theme_color: Some(ThemeColor::Red),
            ..Default::default()
        });

        assert_eq!(updated.full_name.as_deref(), Some("Ada"));
        assert_eq!(updated.theme_color, ThemeColor::Red);
        assert!(!updated.is_creator);
    }

    #[test]
    fn test_profile_row_with_null_theme() {
        let json = r#"{"id":"u1","full_name":null,"avatar_url":null,"is_creator":true,"theme_color":null}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.theme_color, ThemeColor::Black);
        assert!(profile.is_creator);
    }
}
