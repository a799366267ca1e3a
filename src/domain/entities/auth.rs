use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{entities::token::Claims, errors::{AppError, AuthError}};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Generate,
    ManageBrandKits,
    ViewHistory,
    /// Elevated capability: bypasses ownership checks and unlocks admin routes.
    ManageAll,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Generate => "generate",
            Capability::ManageBrandKits => "manage_brand_kits",
            Capability::ViewHistory => "view_history",
            Capability::ManageAll => "manage_all",
        }
    }

    /// Accepts both the short names and the host platform's capability names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "generate" | "use_snn_ai_images" => Some(Capability::Generate),
            "manage_brand_kits" | "manage_snn_ai_brand_kits" => Some(Capability::ManageBrandKits),
            "view_history" | "view_snn_ai_history" => Some(Capability::ViewHistory),
            "manage_all" | "manage_options" => Some(Capability::ManageAll),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller of a use case: who they are and what they may do.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub display_name: String,
    capabilities: HashSet<Capability>,
}

impl AuthContext {
    pub fn new(
        user_id: i64,
        display_name: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        AuthContext {
            user_id,
            display_name: display_name.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.capabilities.contains(&Capability::ManageAll)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.is_elevated() || self.capabilities.contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.has(capability) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.user_id, %capability, "Capability check failed");
            Err(AppError::ForbiddenAccess(format!("missing capability '{}'", capability)))
        }
    }

    pub fn can_access_owned_by(&self, owner_id: i64) -> bool {
        owner_id == self.user_id || self.is_elevated()
    }
}

impl TryFrom<&Claims> for AuthContext {
    type Error = AuthError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(AuthError::InvalidUserId)?;

        let capabilities = claims.caps.iter().filter_map(|c| Capability::parse(c));

        Ok(AuthContext::new(user_id, claims.name.clone(), capabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, caps: &[&str]) -> Claims {
        Claims {
            sub: sub.to_string(),
            name: "Tester".into(),
            caps: caps.iter().map(|c| c.to_string()).collect(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn host_capability_names_are_recognised() {
        let ctx = AuthContext::try_from(&claims("7", &["use_snn_ai_images", "bogus"])).unwrap();
        assert!(ctx.has(Capability::Generate));
        assert!(!ctx.has(Capability::ViewHistory));
    }

    #[test]
    fn manage_all_grants_everything() {
        let ctx = AuthContext::new(1, "admin", [Capability::ManageAll]);
        assert!(ctx.has(Capability::ManageBrandKits));
        assert!(ctx.can_access_owned_by(99));
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        assert!(AuthContext::try_from(&claims("abc", &[])).is_err());
        assert!(AuthContext::try_from(&claims("0", &[])).is_err());
    }

    #[test]
    fn require_reports_forbidden() {
        let ctx = AuthContext::new(3, "user", [Capability::Generate]);
        assert!(ctx.require(Capability::Generate).is_ok());
        assert!(matches!(ctx.require(Capability::ViewHistory), Err(AppError::ForbiddenAccess(_))));
        assert!(!ctx.can_access_owned_by(4));
    }
}
