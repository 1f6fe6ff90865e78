pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod issuer;
pub mod jwks;
pub mod verifier;

pub use claims::{unverified_claims, VerifiedPayload};
pub use config::{parse_algorithms, AuthSettings, JWKS_SUFFIX};
pub use error::{AuthError, AuthResult};
pub use extractors::{bearer_token, parse_bearer};
pub use guards::{check_permissions, require_auth, AuthGuard, GuardError};
pub use issuer::{resolve_issuer, IssuerSource};
pub use jwks::{jwks_url_for, Jwk, JwkSet, JwksError, JwksFetcher};
pub use verifier::{TokenVerifier, VerifyMode};
