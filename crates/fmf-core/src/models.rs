//! Wire types shared by the API wrappers and the stores.
//!
//! Portfolio content (projects, skills, experience, ...) stays as
//! `serde_json::Value`: the client only moves it around.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Role name that gates admin-only routes and endpoints.
pub const ADMIN_ROLE: &str = "ADMIN";

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

impl User {
    /// Role check, ASCII case-insensitive ("admin" == "ADMIN").
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// "First Last", falling back to whichever half exists, then the email.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }

    /// Applies every field present in `patch`.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(roles) = patch.roles {
            self.roles = roles;
        }
        if patch.first_name.is_some() {
            self.first_name = patch.first_name;
        }
        if patch.last_name.is_some() {
            self.last_name = patch.last_name;
        }
        if patch.profile_image_url.is_some() {
            self.profile_image_url = patch.profile_image_url;
        }
    }
}

/// Partial user update; absent fields leave the current value untouched.
///
/// Deserializes straight from a full profile payload, so `/me/profile`
/// responses can be merged without an intermediate type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    #[serde(
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Login form.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body returned by login, register and refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Contact form submitted by visitors.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// One named application setting.
///
/// The public endpoint sends `{name, value}`; the admin endpoint sends
/// `{name, enabled}`. Both normalize to a string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

impl Setting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<'de> Deserialize<'de> for Setting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            #[serde(default)]
            value: Option<Value>,
            #[serde(default)]
            enabled: Option<bool>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let value = match (raw.value, raw.enabled) {
            (Some(v), _) => scalar_to_string(&v),
            (None, Some(enabled)) => enabled.to_string(),
            (None, None) => String::new(),
        };
        Ok(Self {
            name: raw.name,
            value,
        })
    }
}

/// Settings payload: either a list of records or a plain `{name: value}` map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SettingsPayload {
    List(Vec<Setting>),
    Map(BTreeMap<String, Value>),
}

impl SettingsPayload {
    pub fn into_settings(self) -> Vec<Setting> {
        match self {
            SettingsPayload::List(list) => list,
            SettingsPayload::Map(map) => map
                .into_iter()
                .map(|(name, value)| Setting {
                    name,
                    value: scalar_to_string(&value),
                })
                .collect(),
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_accepts_numeric_id_and_role_sets() {
        let user: User = serde_json::from_value(json!({
            "id": 42,
            "email": "ada@example.com",
            "roles": ["USER", "ADMIN"],
            "firstName": "Ada",
            "lastName": "Lovelace"
        }))
        .unwrap();

        assert_eq!(user.id, "42");
        assert!(user.is_admin());
        assert!(user.has_role("user"));
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.profile_image_url, None);
    }

    #[test]
    fn test_lowercase_admin_role_counts() {
        let user: User =
            serde_json::from_value(json!({"id": "u1", "roles": ["admin"]})).unwrap();
        assert!(user.is_admin());
        assert_eq!(user.display_name(), "");
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "old@example.com",
            "roles": ["USER"],
            "firstName": "Old"
        }))
        .unwrap();

        let patch: UserPatch = serde_json::from_value(json!({
            "firstName": "New",
            "profileImageUrl": "https://cdn.example.com/me.png"
        }))
        .unwrap();
        user.apply(patch);

        assert_eq!(user.first_name.as_deref(), Some("New"));
        assert_eq!(user.email, "old@example.com");
        assert_eq!(
            user.profile_image_url.as_deref(),
            Some("https://cdn.example.com/me.png")
        );
        assert!(user.has_role("USER"));
    }

    #[test]
    fn test_setting_normalizes_enabled_flag() {
        let list: Vec<Setting> = serde_json::from_value(json!([
            {"uuid": "a", "name": "SHOW_PROJECTS", "enabled": true, "description": "x"},
            {"name": "SHOW_SKILLS", "enabled": false},
            {"name": "DEFAULT_PDF_TEMPLATE", "value": "classic"}
        ]))
        .unwrap();

        assert_eq!(list[0], Setting::new("SHOW_PROJECTS", "true"));
        assert_eq!(list[1], Setting::new("SHOW_SKILLS", "false"));
        assert_eq!(list[2], Setting::new("DEFAULT_PDF_TEMPLATE", "classic"));
    }

    #[test]
    fn test_settings_payload_accepts_map() {
        let payload: SettingsPayload =
            serde_json::from_value(json!({"SHOW_SKILLS": "true", "SHOW_PROJECTS": false}))
                .unwrap();
        let settings = payload.into_settings();
        assert!(settings.contains(&Setting::new("SHOW_SKILLS", "true")));
        assert!(settings.contains(&Setting::new("SHOW_PROJECTS", "false")));
    }
}
