use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Access token payload shared with the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Username
    pub sub: String,
    pub role: u8,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role)
    }

    pub fn is_access(&self) -> bool {
        self.token_type == TokenType::Access
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_not_access_tokens() {
        let claims = Claims {
            user_id: 3,
            sub: "mr.cole".into(),
            role: Role::Admin.id(),
            exp: 0,
            jti: "j".into(),
            token_type: TokenType::Refresh,
        };
        assert!(!claims.is_access());
        assert_eq!(claims.role(), Some(Role::Admin));

        let unknown_role = Claims { role: 9, ..claims };
        assert_eq!(unknown_role.role(), None);
    }
}
