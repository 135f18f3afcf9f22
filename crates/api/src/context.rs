use tutorhub_auth::Role;
use tutorhub_core::UserId;

/// Authenticated session context for a request.
///
/// Inserted by the auth middleware; this is the only source of acting
/// identity — handlers never trust identities supplied in request bodies
/// without checking them against this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user_id: UserId,
    roles: Vec<Role>,
}

impl AuthContext {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == name)
    }
}
