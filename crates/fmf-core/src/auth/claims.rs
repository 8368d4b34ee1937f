//! Access token claims.
//!
//! Used only when the server returns a token without a user object. The
//! signature is not verified: the client never makes trust decisions on
//! these values, it only displays them and gates navigation.

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::Value;

use crate::models::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    sub: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: Option<Roles>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

/// `roles` may be a list or a single comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Roles {
    List(Vec<String>),
    Joined(String),
}

impl Roles {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            Roles::List(list) => list.into_iter().collect(),
            Roles::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Builds a user from the token's payload segment.
pub fn user_from_token(token: &str) -> Result<User, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 token segments, found {}", parts.len()));
    }
    // Some issuers pad the segment; URL_SAFE_NO_PAD rejects that.
    let payload = parts[1].trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| format!("payload is not base64url: {e}"))?;
    let claims: Claims =
        serde_json::from_slice(&decoded).map_err(|e| format!("payload is not valid claims: {e}"))?;

    let id = match claims.sub {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err("token has no subject".to_string()),
    };

    Ok(User {
        id,
        email: claims.email.unwrap_or_default(),
        roles: claims.roles.map(Roles::into_set).unwrap_or_default(),
        first_name: claims.first_name,
        last_name: claims.last_name,
        profile_image_url: None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;

    /// Builds an unsigned token around `claims`.
    pub(crate) fn token_with(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_decodes_claims() {
        let token = token_with(&json!({
            "sub": "7",
            "email": "ada@example.com",
            "roles": ["ADMIN"],
            "firstName": "Ada",
            "lastName": "Lovelace",
            "exp": 1_900_000_000
        }));
        let user = user_from_token(&token).unwrap();
        assert_eq!(user.id, "7");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_admin());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_joined_roles_and_numeric_subject() {
        let token = token_with(&json!({"sub": 12, "roles": "USER, ADMIN"}));
        let user = user_from_token(&token).unwrap();
        assert_eq!(user.id, "12");
        assert!(user.has_role("user"));
        assert!(user.is_admin());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(user_from_token("not-a-jwt").is_err());
        assert!(user_from_token("a.%%%.c").is_err());
        assert!(user_from_token(&token_with(&json!({"email": "x@example.com"}))).is_err());
    }
}
