//! Visibility scoping for owned resources.
//!
//! Decides, for a requesting identity and a resource's owner + tier,
//! whether a read is permitted. Pure computation: no clock, no storage,
//! no I/O, so identical inputs always produce identical answers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::permissions::PermissionMatrix;
use crate::auth::token::Claims;
use crate::error::AppError;

/// Resource-level access classification, independent of role
/// capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityTier {
    Public,
    TeamOnly,
    Private,
}

impl VisibilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityTier::Public => "public",
            VisibilityTier::TeamOnly => "team_only",
            VisibilityTier::Private => "private",
        }
    }
}

impl std::str::FromStr for VisibilityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(VisibilityTier::Public),
            "team_only" => Ok(VisibilityTier::TeamOnly),
            "private" => Ok(VisibilityTier::Private),
            other => Err(format!("invalid visibility tier: {}", other)),
        }
    }
}

/// Implemented by any resource that participates in visibility scoping
/// (player profiles, videos, scouting reports).
pub trait VisibilityScoped {
    fn owner_id(&self) -> Uuid;
    fn visibility(&self) -> VisibilityTier;
    /// Scope used by the `team_only` tier; `None` means unscoped.
    fn federation_id(&self) -> Option<Uuid>;
}

/// Capability names a resource family checks against the matrix.
#[derive(Debug, Clone)]
pub struct VisibilityPolicy {
    pub view_capability: String,
    pub team_capability: String,
}

impl VisibilityPolicy {
    pub fn new(view_capability: &str, team_capability: &str) -> Self {
        Self {
            view_capability: view_capability.to_string(),
            team_capability: team_capability.to_string(),
        }
    }

    /// Policy for player-profile resources.
    pub fn players() -> Self {
        Self::new("view_players", "manage_team")
    }
}

/// Whether `claims` may see `resource`.
///
/// Wildcard holders and the owner always may. Beyond that the tier
/// decides: `public` needs the view capability, `team_only` needs the
/// team capability plus a federation match, `private` admits nobody
/// else.
pub fn is_visible<T: VisibilityScoped>(
    matrix: &PermissionMatrix,
    policy: &VisibilityPolicy,
    claims: &Claims,
    resource: &T,
) -> Result<bool, AppError> {
    if matrix.has_wildcard(&claims.role)? {
        return Ok(true);
    }
    if resource.owner_id() == claims.sub {
        return Ok(true);
    }

    match resource.visibility() {
        VisibilityTier::Public => matrix.can(&claims.role, &policy.view_capability),
        VisibilityTier::TeamOnly => {
            if !matrix.can(&claims.role, &policy.team_capability)? {
                return Ok(false);
            }
            match (claims.federation_id, resource.federation_id()) {
                (Some(mine), Some(theirs)) => Ok(mine == theirs),
                _ => Ok(false),
            }
        }
        VisibilityTier::Private => Ok(false),
    }
}

/// Keep only the visible elements, preserving their original order.
pub fn filter_collection<T: VisibilityScoped>(
    matrix: &PermissionMatrix,
    policy: &VisibilityPolicy,
    claims: &Claims,
    resources: Vec<T>,
) -> Result<Vec<T>, AppError> {
    let mut visible = Vec::with_capacity(resources.len());
    for resource in resources {
        if is_visible(matrix, policy, claims, &resource)? {
            visible.push(resource);
        }
    }
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[derive(Debug, Clone, PartialEq)]
    struct Profile {
        name: &'static str,
        owner: Uuid,
        tier: VisibilityTier,
        federation: Option<Uuid>,
    }

    impl VisibilityScoped for Profile {
        fn owner_id(&self) -> Uuid {
            self.owner
        }
        fn visibility(&self) -> VisibilityTier {
            self.tier
        }
        fn federation_id(&self) -> Option<Uuid> {
            self.federation
        }
    }

    fn claims(role: &str, sub: Uuid, federation_id: Option<Uuid>) -> Claims {
        Claims {
            sub,
            email: "viewer@example.com".to_string(),
            role: role.to_string(),
            federation_id,
            iss: "scoutd-auth".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
            jti: Uuid::new_v4().to_string(),
        }
    }

    fn profile(owner: Uuid, tier: VisibilityTier, federation: Option<Uuid>) -> Profile {
        Profile {
            name: "p",
            owner,
            tier,
            federation,
        }
    }

    #[test]
    fn super_admin_sees_everything() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let viewer = claims("super_admin", Uuid::new_v4(), None);

        for tier in [
            VisibilityTier::Public,
            VisibilityTier::TeamOnly,
            VisibilityTier::Private,
        ] {
            let p = profile(Uuid::new_v4(), tier, Some(Uuid::new_v4()));
            assert!(is_visible(&matrix, &policy, &viewer, &p).unwrap());
        }
    }

    #[test]
    fn owner_sees_own_private_resource() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let me = Uuid::new_v4();
        let viewer = claims("player", me, None);
        let p = profile(me, VisibilityTier::Private, None);
        assert!(is_visible(&matrix, &policy, &viewer, &p).unwrap());
    }

    #[test]
    fn player_cannot_see_foreign_private_resource() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let viewer = claims("player", Uuid::new_v4(), None);
        let p = profile(Uuid::new_v4(), VisibilityTier::Private, None);
        assert!(!is_visible(&matrix, &policy, &viewer, &p).unwrap());
    }

    #[test]
    fn public_tier_needs_view_capability() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let p = profile(Uuid::new_v4(), VisibilityTier::Public, None);

        for role in ["player", "talent_scout", "team_coach", "federation_admin"] {
            let viewer = claims(role, Uuid::new_v4(), None);
            assert!(
                is_visible(&matrix, &policy, &viewer, &p).unwrap(),
                "{} should see public resources",
                role
            );
        }
    }

    #[test]
    fn team_only_needs_team_capability_and_matching_federation() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let fed = Uuid::new_v4();
        let p = profile(Uuid::new_v4(), VisibilityTier::TeamOnly, Some(fed));

        // Coach in the same federation: visible.
        let coach = claims("team_coach", Uuid::new_v4(), Some(fed));
        assert!(is_visible(&matrix, &policy, &coach, &p).unwrap());

        // Coach in a different federation: not visible.
        let other_coach = claims("team_coach", Uuid::new_v4(), Some(Uuid::new_v4()));
        assert!(!is_visible(&matrix, &policy, &other_coach, &p).unwrap());

        // Coach with no federation affiliation: not visible.
        let unaffiliated = claims("team_coach", Uuid::new_v4(), None);
        assert!(!is_visible(&matrix, &policy, &unaffiliated, &p).unwrap());

        // Scout lacks the team capability even in the right federation.
        let scout = claims("talent_scout", Uuid::new_v4(), Some(fed));
        assert!(!is_visible(&matrix, &policy, &scout, &p).unwrap());
    }

    #[test]
    fn team_only_without_resource_federation_is_hidden() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let fed = Uuid::new_v4();
        let p = profile(Uuid::new_v4(), VisibilityTier::TeamOnly, None);
        let coach = claims("team_coach", Uuid::new_v4(), Some(fed));
        assert!(!is_visible(&matrix, &policy, &coach, &p).unwrap());
    }

    #[test]
    fn is_visible_is_idempotent() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let viewer = claims("talent_scout", Uuid::new_v4(), None);
        let p = profile(Uuid::new_v4(), VisibilityTier::Public, None);

        let first = is_visible(&matrix, &policy, &viewer, &p).unwrap();
        let second = is_visible(&matrix, &policy, &viewer, &p).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn filter_preserves_order_and_duplicates_nothing() {
        let matrix = PermissionMatrix::builtin();
        let policy = VisibilityPolicy::players();
        let me = Uuid::new_v4();
        let viewer = claims("player", me, None);

        let visible_a = Profile {
            name: "a",
            owner: Uuid::new_v4(),
            tier: VisibilityTier::Public,
            federation: None,
        };
        let hidden = Profile {
            name: "b",
            owner: Uuid::new_v4(),
            tier: VisibilityTier::Private,
            federation: None,
        };
        let visible_c = Profile {
            name: "c",
            owner: me,
            tier: VisibilityTier::Private,
            federation: None,
        };

        let filtered = filter_collection(
            &matrix,
            &policy,
            &viewer,
            vec![visible_a.clone(), hidden, visible_c.clone()],
        )
        .unwrap();

        assert_eq!(filtered, vec![visible_a, visible_c]);
    }
}
