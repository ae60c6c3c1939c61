mod helpers;
mod middleware;
mod password;
mod token;

pub use helpers::issue_session;
pub use middleware::{AuthError, RequireUser};
pub use password::{Argon2Credentials, CredentialVerifier};
pub use token::{SessionTokenGenerator, parse_token};
