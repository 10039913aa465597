use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Accent color applied to the application root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ThemeColor {
    #[default]
    Black,
    Blue,
    Green,
    Red,
    Orange,
    Purple,
}

impl ThemeColor {
    pub const ALL: [ThemeColor; 6] = [
        ThemeColor::Black,
        ThemeColor::Blue,
        ThemeColor::Green,
        ThemeColor::Red,
        ThemeColor::Orange,
        ThemeColor::Purple,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeColor::Black => "black",
            ThemeColor::Blue => "blue",
            ThemeColor::Green => "green",
            ThemeColor::Red => "red",
            ThemeColor::Orange => "orange",
            ThemeColor::Purple => "purple",
        }
    }

    /// Class the UI shell puts on the document root.
    pub fn root_class(self) -> String {
        format!("theme-{}", self.as_str())
    }
}

impl fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeColor::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown theme color: {}", s))
    }
}

// Stored rows may carry values written by older clients; those fall back to black.
impl From<String> for ThemeColor {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_class() {
        assert_eq!(ThemeColor::Purple.root_class(), "theme-purple");
        assert_eq!(ThemeColor::default().root_class(), "theme-black");
    }

    #[test]
    fn test_parse_is_strict_but_deserialize_is_lenient() {
        assert_eq!("Blue".parse::<ThemeColor>(), Ok(ThemeColor::Blue));
        assert!("teal".parse::<ThemeColor>().is_err());

        let color: ThemeColor = serde_json::from_str("\"teal\"").unwrap();
        assert_eq!(color, ThemeColor::Black);
        let color: ThemeColor = serde_json::from_str("\"green\"").unwrap();
        assert_eq!(color, ThemeColor::Green);
        assert_eq!(serde_json::to_string(&ThemeColor::Orange).unwrap(), "\"orange\"");
    }
}
