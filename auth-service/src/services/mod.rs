pub mod admin;
pub mod auth;
pub mod email;
pub mod error;
pub mod metrics;
pub mod policy;

pub use admin::AdminService;
pub use auth::AuthFlows;
pub use email::{EmailProvider, LogEmailService, SmtpEmailService};
pub use error::ServiceError;
pub use policy::PasswordPolicy;
