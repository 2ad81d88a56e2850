//! Caller identity as forwarded by the upstream identity provider.
//!
//! Authentication happens in front of this service; the gateway passes the
//! authenticated subject in `x-user-id` and its roles, comma-separated, in
//! `x-user-roles`. Handlers receive a [`Principal`] and hand it to the
//! services, which decide per operation which role is needed.

use std::convert::Infallible;
use std::str::FromStr;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Teacher,
    Student,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub subject: Option<String>,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_roles(subject: impl Into<String>, roles: &[Role]) -> Self {
        Self {
            subject: Some(subject.into()),
            roles: roles.to_vec(),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let subject = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        // Roles without a subject are meaningless.
        let Some(subject) = subject else {
            return Self::anonymous();
        };

        let roles = headers
            .get(USER_ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .split(',')
            .filter(|r| !r.trim().is_empty())
            .filter_map(|r| match r.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    debug!(error = %e, "Ignoring role");
                    None
                }
            })
            .collect();

        Self {
            subject: Some(subject),
            roles,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.is_authenticated() && self.roles.contains(&role)
    }

    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if !self.is_authenticated() {
            return Err(AppError::AuthError("Authentication required".to_string()));
        }
        if !self.has_role(role) {
            return Err(AppError::Forbidden(format!(
                "The {:?} role is required",
                role
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Principal::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(user: Option<&str>, roles: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(user) = user {
            map.insert(USER_ID_HEADER, HeaderValue::from_str(user).unwrap());
        }
        if let Some(roles) = roles {
            map.insert(USER_ROLES_HEADER, HeaderValue::from_str(roles).unwrap());
        }
        map
    }

    #[test]
    fn test_roles_parse_case_insensitively() {
        let p = Principal::from_headers(&headers(Some("t-1"), Some("teacher, STUDENT, janitor")));
        assert_eq!(p.roles, vec![Role::Teacher, Role::Student]);
    }

    #[test]
    fn test_roles_without_subject_are_dropped() {
        let p = Principal::from_headers(&headers(None, Some("Teacher")));
        assert!(!p.is_authenticated());
        assert!(!p.has_role(Role::Teacher));
    }

    #[test]
    fn test_require_distinguishes_anonymous_from_forbidden() {
        assert!(matches!(
            Principal::anonymous().require(Role::Teacher),
            Err(AppError::AuthError(_))
        ));
        assert!(matches!(
            Principal::with_roles("s-1", &[Role::Student]).require(Role::Teacher),
            Err(AppError::Forbidden(_))
        ));
        assert!(Principal::with_roles("t-1", &[Role::Teacher])
            .require(Role::Teacher)
            .is_ok());
    }
}
