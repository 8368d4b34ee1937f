//! Navigation gating.
//!
//! [`RouteTable`] maps paths onto named routes with their access
//! requirements; [`RouteGuard`] decides, for a session, whether a
//! navigation proceeds, goes to the login page, or is refused.

use std::collections::BTreeMap;

use crate::auth::Session;
use crate::models::ADMIN_ROLE;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const NOT_FOUND: &str = "not-found";

/// Access requirements of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    /// Authenticated and holding the role (case-insensitive)
    Role(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    /// `/`-separated; segments starting with `:` capture a parameter
    pub pattern: &'static str,
    pub access: Access,
}

const fn route(name: &'static str, pattern: &'static str, access: Access) -> Route {
    Route {
        name,
        pattern,
        access,
    }
}

static CATCH_ALL: Route = route(NOT_FOUND, "/*", Access::Public);

/// A resolved route plus captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        use Access::{Authenticated, Public, Role};
        Self {
            routes: vec![
                route("home", "/", Public),
                route("projects", "/projects", Public),
                route("skills", "/skills", Public),
                route("contact", "/contact", Public),
                route("login", LOGIN_PATH, Public),
                route("signup", "/signup", Public),
                route("dashboard", "/dashboard", Authenticated),
                route("profile", "/profile", Authenticated),
                route("edit-profile", "/profile/edit", Authenticated),
                route("my-projects", "/my-projects", Authenticated),
                route("create-project", "/projects/create", Role(ADMIN_ROLE)),
                route("edit-project", "/my-projects/:id/edit", Authenticated),
                route("admin", "/admin", Role(ADMIN_ROLE)),
                route("unauthorized", UNAUTHORIZED_PATH, Public),
            ],
        }
    }
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolves `target` (query and fragment ignored). Unknown paths
    /// resolve to the public not-found route.
    pub fn resolve(&self, target: &str) -> RouteMatch<'_> {
        let path = path_only(target);
        let segments = split(path);

        self.routes
            .iter()
            .find_map(|route| {
                match_pattern(route.pattern, &segments).map(|params| RouteMatch { route, params })
            })
            .unwrap_or(RouteMatch {
                route: &CATCH_ALL,
                params: BTreeMap::new(),
            })
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed to the named route.
    Allow { route: &'static str },
    /// Sign in first, then continue to `return_to` (full target path).
    RedirectToLogin { return_to: String },
    /// Signed in but lacking a required role.
    RedirectUnauthorized,
}

impl Decision {
    /// Where the navigation ends up.
    pub fn location(&self, target: &str) -> String {
        match self {
            Decision::Allow { .. } => target.to_string(),
            Decision::RedirectToLogin { return_to } => {
                format!("{LOGIN_PATH}?redirect={}", encode_component(return_to))
            }
            Decision::RedirectUnauthorized => UNAUTHORIZED_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    table: RouteTable,
}

impl RouteGuard {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn decide(&self, target: &str, session: &Session) -> Decision {
        let resolved = self.table.resolve(target);
        let route = resolved.route;

        let required_role = match route.access {
            Access::Public => return Decision::Allow { route: route.name },
            Access::Authenticated => None,
            Access::Role(role) => Some(role),
        };

        if !session.is_authenticated() {
            return Decision::RedirectToLogin {
                return_to: target.to_string(),
            };
        }

        if let Some(role) = required_role
            && !session.user().is_some_and(|u| u.has_role(role))
        {
            tracing::warn!(path = %path_only(target), "Refusing navigation: missing role {role}");
            return Decision::RedirectUnauthorized;
        }

        Decision::Allow { route: route.name }
    }
}

/// Where to go after signing in: the remembered path when it is a local
/// absolute path, the home page otherwise.
pub fn post_login_destination(return_to: Option<&str>) -> String {
    match return_to.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

fn path_only(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern(pattern: &str, segments: &[&str]) -> Option<BTreeMap<String, String>> {
    let expected = split(pattern);
    if expected.len() != segments.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (want, got) in expected.iter().zip(segments) {
        if let Some(name) = want.strip_prefix(':') {
            params.insert(name.to_string(), (*got).to_string());
        } else if want != got {
            return None;
        }
    }
    Some(params)
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::ApiClient;
    use crate::auth::AuthStore;
    use crate::auth::claims::tests::token_with;
    use crate::cookies::CookieJar;
    use crate::models::AuthResponse;

    fn session_with_roles(roles: Option<&[&str]>) -> Session {
        let client = ApiClient::new(
            "http://127.0.0.1:1",
            Arc::new(CookieJar::in_memory()),
            None,
        )
        .unwrap();
        let store = AuthStore::new(client, None);
        if let Some(roles) = roles {
            let token = token_with(&json!({"sub": "1", "roles": roles}));
            store
                .install(AuthResponse {
                    access_token: token,
                    user: None,
                })
                .unwrap();
        }
        store.session()
    }

    #[test]
    fn test_resolve_routes_and_params() {
        let table = RouteTable::default();
        assert_eq!(table.resolve("/").route.name, "home");
        assert_eq!(table.resolve("/projects?page=2").route.name, "projects");
        assert_eq!(table.resolve("/projects/create").route.name, "create-project");
        assert_eq!(table.resolve("/profile/edit/").route.name, "edit-profile");

        let edit = table.resolve("/my-projects/abc-123/edit");
        assert_eq!(edit.route.name, "edit-project");
        assert_eq!(edit.params.get("id").map(String::as_str), Some("abc-123"));

        assert_eq!(table.resolve("/nope/at/all").route.name, NOT_FOUND);
    }

    #[test]
    fn test_anonymous_is_sent_to_login_with_full_path() {
        let guard = RouteGuard::default();
        let session = session_with_roles(None);

        assert_eq!(
            guard.decide("/contact", &session),
            Decision::Allow { route: "contact" }
        );
        let decision = guard.decide("/my-projects/7/edit?tab=media", &session);
        assert_eq!(
            decision,
            Decision::RedirectToLogin {
                return_to: "/my-projects/7/edit?tab=media".to_string()
            }
        );
        assert_eq!(
            decision.location("/my-projects/7/edit?tab=media"),
            "/login?redirect=%2Fmy-projects%2F7%2Fedit%3Ftab%3Dmedia"
        );
        assert!(matches!(
            guard.decide("/admin", &session),
            Decision::RedirectToLogin { .. }
        ));
    }

    #[test]
    fn test_admin_routes_need_role() {
        let guard = RouteGuard::default();

        let user = session_with_roles(Some(&["USER"]));
        assert_eq!(
            guard.decide("/dashboard", &user),
            Decision::Allow { route: "dashboard" }
        );
        assert_eq!(guard.decide("/admin", &user), Decision::RedirectUnauthorized);

        let admin = session_with_roles(Some(&["admin"]));
        assert_eq!(
            guard.decide("/projects/create", &admin),
            Decision::Allow {
                route: "create-project"
            }
        );
    }

    #[test]
    fn test_post_login_destination_only_allows_local_paths() {
        assert_eq!(post_login_destination(Some("/admin")), "/admin");
        assert_eq!(post_login_destination(Some("/p?x=1")), "/p?x=1");
        assert_eq!(post_login_destination(Some("//evil.example.com")), "/");
        assert_eq!(post_login_destination(Some("https://evil.example.com")), "/");
        assert_eq!(post_login_destination(Some("/\\evil.example.com")), "/");
        assert_eq!(post_login_destination(None), "/");
    }
}
