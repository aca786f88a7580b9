//! Bearer-credential verification for Synapse.
//!
//! [`CredentialVerifier`] turns the raw `Authorization` header into an
//! [`AuthenticatedContext`](synapse_core::subject::AuthenticatedContext). In
//! trusted mode it checks an RS256 signature against the issuer's published
//! key set; without a configured secret key it falls back to a deterministic
//! development identity.

pub mod claims;
pub mod config;
pub mod error;
pub mod keys;
pub mod profile;
pub mod verifier;

pub use config::AuthConfig;
pub use error::{AuthError, SourceError};
pub use keys::{HttpKeySetSource, KeySetSource};
pub use profile::{ClerkProfileClient, Profile, ProfileLookup};
pub use verifier::{CredentialVerifier, VerifyPolicy};
