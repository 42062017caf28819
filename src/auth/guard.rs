//! Role-based authorization

use crate::auth::{Claims, Role};
use crate::error::{Error, Result};

/// Require that `claims` carry exactly `role`
pub fn require_role(claims: &Claims, role: Role) -> Result<()> {
    if claims.role != role {
        tracing::warn!(
            "User {} with role {} denied, {} required",
            claims.sub,
            claims.role,
            role
        );
        return Err(Error::Forbidden("Not enough permissions".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: "someone".to_string(),
            role,
            iat: 0,
            exp: 9999999999,
        }
    }

    #[test]
    fn test_admin_passes_admin_requirement() {
        assert!(require_role(&claims(Role::Admin), Role::Admin).is_ok());
    }

    #[test]
    fn test_user_rejected_from_admin_requirement() {
        let result = require_role(&claims(Role::User), Role::Admin);
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }

    #[test]
    fn test_match_is_exact_not_hierarchical() {
        let result = require_role(&claims(Role::Admin), Role::User);
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }
}
