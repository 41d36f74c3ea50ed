//! Shared authorization core: token issue/verify, the role permission
//! matrix, and visibility scoping for owned resources.
//!
//! Every downstream service performs its own `verify()` +
//! `require_capability()` against these primitives; there is no central
//! gateway enforcement.

pub mod permissions;
pub mod token;
pub mod visibility;

pub use permissions::PermissionMatrix;
pub use token::{Claims, SignedToken, TokenService};
pub use visibility::{VisibilityPolicy, VisibilityScoped, VisibilityTier};
