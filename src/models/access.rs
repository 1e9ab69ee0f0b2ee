use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-document visibility class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    Public,
    Private,
    Role,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Public => "public",
            AccessMode::Private => "private",
            AccessMode::Role => "role",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(AccessMode::Public),
            "private" => Ok(AccessMode::Private),
            "role" => Ok(AccessMode::Role),
            _ => Err(format!(
                "Invalid access mode '{}'. Valid options: public, private, role",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_display() {
        assert_eq!(format!("{}", AccessMode::Public), "public");
        assert_eq!(format!("{}", AccessMode::Private), "private");
        assert_eq!(format!("{}", AccessMode::Role), "role");
    }

    #[test]
    fn test_access_mode_from_str() {
        assert_eq!(AccessMode::from_str("public").unwrap(), AccessMode::Public);
        assert_eq!(AccessMode::from_str("PRIVATE").unwrap(), AccessMode::Private);
        assert_eq!(AccessMode::from_str("Role").unwrap(), AccessMode::Role);
    }

    #[test]
    fn test_access_mode_from_str_invalid() {
        assert!(AccessMode::from_str("secret").is_err());
        assert!(AccessMode::from_str("").is_err());
    }

    #[test]
    fn test_access_mode_json_uses_lowercase() {
        let json = serde_json::to_string(&AccessMode::Role).unwrap();
        assert_eq!(json, "\"role\"");

        let parsed: AccessMode = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(parsed, AccessMode::Private);
    }
}
