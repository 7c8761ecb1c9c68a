mod credential;
mod oauth;
mod store;

pub use credential::{Credential, EXPIRY_SAFETY_MARGIN_MS};
pub use oauth::{OAuthClient, TokenResponse};
pub use store::CredentialStore;
