pub mod identity;
pub mod verification_token;

pub use identity::{Identity, IdentityResponse, IdentityState};
pub use verification_token::{TokenPurpose, VerificationToken};
