//! Identity provider adapters: Firebase token verification, its signing key
//! cache, and startup credential resolution.

mod credentials;
mod firebase;
mod jwks;

pub use credentials::{
    ApplicationDefaultCredentials, CredentialError, CredentialProvider,
    PLACEHOLDER_PRIVATE_KEY_ID, ServiceAccountKeyFile, resolve_identity_project,
};
pub use firebase::FirebaseTokenVerifier;
pub use jwks::{FIREBASE_JWKS_URL, JwksCache, JwksCacheConfig, JwksError};
