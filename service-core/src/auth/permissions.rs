//! Role permission matrix.
//!
//! A static role -> capability-set mapping, loaded once at startup and
//! immutable at runtime. The matrix is total: every configured role maps
//! to a set (possibly empty), and looking up a role that is absent is a
//! configuration error surfaced loudly, never a silent deny.

use std::collections::{BTreeMap, BTreeSet};

use config::{Config as Cfg, File};
use serde::Deserialize;

use crate::auth::token::Claims;
use crate::error::AppError;

/// Capability granting everything. Only `super_admin` carries it in the
/// shipped defaults.
pub const WILDCARD: &str = "*";

#[derive(Debug, Deserialize)]
struct MatrixFile {
    roles: BTreeMap<String, Vec<String>>,
}

/// Static mapping from role to its capability set.
#[derive(Debug, Clone)]
pub struct PermissionMatrix {
    roles: BTreeMap<String, BTreeSet<String>>,
}

impl PermissionMatrix {
    /// The shipped default taxonomy. The role enumeration is deliberately
    /// configuration-driven; deployments that prefer `coach`/`scout`
    /// naming override it with a matrix file instead of a code change.
    pub fn builtin() -> Self {
        let mut roles = BTreeMap::new();
        roles.insert(
            "super_admin".to_string(),
            BTreeSet::from([WILDCARD.to_string()]),
        );
        roles.insert(
            "federation_admin".to_string(),
            caps(&[
                "view_players",
                "manage_players",
                "manage_team",
                "manage_users",
                "view_federations",
                "manage_federations",
            ]),
        );
        roles.insert(
            "team_coach".to_string(),
            caps(&["view_players", "manage_players", "manage_team"]),
        );
        roles.insert(
            "talent_scout".to_string(),
            caps(&["view_players", "scout_players"]),
        );
        roles.insert(
            "player".to_string(),
            caps(&["view_players", "manage_own_profile"]),
        );
        Self { roles }
    }

    /// Load the matrix from a TOML file, replacing the builtin defaults.
    ///
    /// Expected shape:
    /// ```toml
    /// [roles]
    /// super_admin = ["*"]
    /// team_coach = ["view_players", "manage_players", "manage_team"]
    /// ```
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let raw = Cfg::builder()
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize::<MatrixFile>()?;

        let roles = raw
            .roles
            .into_iter()
            .map(|(role, caps)| (role, caps.into_iter().collect::<BTreeSet<_>>()))
            .collect();

        let matrix = Self { roles };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Load from the given path when set, otherwise the builtin defaults.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Reject matrices that would make privilege checks ambiguous: no
    /// roles at all, blank role names, or blank capability names.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.roles.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "permission matrix defines no roles"
            )));
        }
        for (role, caps) in &self.roles {
            if role.trim().is_empty() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "permission matrix contains a blank role name"
                )));
            }
            if caps.iter().any(|c| c.trim().is_empty()) {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "role '{}' has a blank capability",
                    role
                )));
            }
        }
        Ok(())
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(|r| r.as_str())
    }

    pub fn is_known_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// All capability names mentioned anywhere in the matrix.
    pub fn capability_universe(&self) -> BTreeSet<&str> {
        self.roles
            .values()
            .flatten()
            .map(|c| c.as_str())
            .collect()
    }

    fn capabilities(&self, role: &str) -> Result<&BTreeSet<String>, AppError> {
        self.roles.get(role).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "role '{}' is not in the permission matrix",
                role
            ))
        })
    }

    /// The role's capability list, for echoing back to clients.
    pub fn capabilities_of(&self, role: &str) -> Result<Vec<String>, AppError> {
        Ok(self.capabilities(role)?.iter().cloned().collect())
    }

    /// Whether the role carries the wildcard capability.
    pub fn has_wildcard(&self, role: &str) -> Result<bool, AppError> {
        Ok(self.capabilities(role)?.contains(WILDCARD))
    }

    /// Whether the role may perform `capability`.
    ///
    /// An unknown role is a configuration error, not a deny: defaulting
    /// to an empty set would let privilege changes slip by unnoticed.
    pub fn can(&self, role: &str, capability: &str) -> Result<bool, AppError> {
        let caps = self.capabilities(role)?;
        Ok(caps.contains(WILDCARD) || caps.contains(capability))
    }

    /// Guard for privileged operations.
    pub fn require_capability(&self, claims: &Claims, capability: &str) -> Result<(), AppError> {
        if self.can(&claims.role, capability)? {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions {
                required: capability.to_string(),
                have: claims.role.clone(),
            })
        }
    }
}

fn caps(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn claims_for(role: &str) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role: role.to_string(),
            federation_id: None,
            iss: "scoutd-auth".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
            jti: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn matrix_is_total_and_deterministic() {
        let matrix = PermissionMatrix::builtin();
        let universe: Vec<String> = matrix
            .capability_universe()
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        let roles: Vec<String> = matrix.roles().map(|r| r.to_string()).collect();

        for role in &roles {
            for cap in &universe {
                let first = matrix.can(role, cap).unwrap();
                let second = matrix.can(role, cap).unwrap();
                assert_eq!(first, second, "can({}, {}) must be deterministic", role, cap);
            }
        }
    }

    #[test]
    fn wildcard_grants_everything() {
        let matrix = PermissionMatrix::builtin();
        assert!(matrix.can("super_admin", "manage_users").unwrap());
        assert!(matrix.can("super_admin", "some_future_capability").unwrap());
        assert!(matrix.has_wildcard("super_admin").unwrap());
        assert!(!matrix.has_wildcard("team_coach").unwrap());
    }

    #[test]
    fn scout_cannot_manage_users() {
        let matrix = PermissionMatrix::builtin();
        assert!(!matrix.can("talent_scout", "manage_users").unwrap());

        let err = matrix
            .require_capability(&claims_for("talent_scout"), "manage_users")
            .unwrap_err();
        match err {
            AppError::InsufficientPermissions { required, have } => {
                assert_eq!(required, "manage_users");
                assert_eq!(have, "talent_scout");
            }
            other => panic!("expected InsufficientPermissions, got {:?}", other),
        }
    }

    #[test]
    fn unknown_role_is_a_configuration_error() {
        let matrix = PermissionMatrix::builtin();
        match matrix.can("system_admin", "view_players") {
            Err(AppError::ConfigError(_)) => {}
            other => panic!("expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn empty_matrix_fails_validation() {
        let matrix = PermissionMatrix {
            roles: BTreeMap::new(),
        };
        assert!(matrix.validate().is_err());
    }

    #[test]
    fn blank_capability_fails_validation() {
        let mut roles = BTreeMap::new();
        roles.insert("player".to_string(), BTreeSet::from(["  ".to_string()]));
        let matrix = PermissionMatrix { roles };
        assert!(matrix.validate().is_err());
    }
}
