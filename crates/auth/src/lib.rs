//! `outletops-auth`: pure authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: roles, actors, the RoleGate rule table and
//! token claim validation.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use authorize::{Action, AuthzError, Decision, DenialKind, RoleGate, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use principal::{Actor, PrincipalId};
pub use roles::{Role, UnknownRole};
