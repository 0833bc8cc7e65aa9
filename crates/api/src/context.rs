use outletops_auth::{Actor, Role};

/// The authenticated caller of a request.
///
/// Inserted by the auth middleware; every protected handler reads it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthContext {
    actor: Actor,
}

impl AuthContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// A role asserted in a request body must match the token's role.
    pub fn matches_claimed_role(&self, claimed: Option<Role>) -> bool {
        claimed.is_none_or(|r| r == self.actor.role())
    }
}
