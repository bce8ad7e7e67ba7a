//! Account profiles.

use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// The logged-in account, from `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub profile_image_base64: Option<String>,
}

impl Profile {
    /// Name for the navbar: the profile name, else the email's local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    /// Avatar payload, ignoring blank strings.
    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.profile_image_base64
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_backend() {
        let json = r#"{"id":5,"name":"","email":"asha@o2.shop","role":"SELLER",
            "profileImageBase64":"  "}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.role, Role::Seller);
        assert_eq!(profile.display_name(), "asha");
        assert_eq!(profile.avatar(), None);
    }

    #[test]
    fn test_profile_display_name_prefers_name() {
        let json = r#"{"name":"Asha Rao","email":"asha@o2.shop","role":"USER"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.display_name(), "Asha Rao");
        assert_eq!(profile.id, None);
    }
}
