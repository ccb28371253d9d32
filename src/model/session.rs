use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * The caller identity resolved from the bearer token. Handed explicitly to
 * every service operation that depends on who is asking.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    /**
     * The member id of the caller.
     */
    pub member_id: i64,
    /**
     * The caller's display name.
     */
    pub name: String,
    /**
     * Whether the caller holds the admin account type.
     */
    pub admin: bool,
}

impl SessionContext {
    /**
     * Requires the caller to be an administrator.
     */
    pub fn require_admin(&self) -> Result<(), ApplicationError> {
        if self.admin {
            Ok(())
        } else {
            Err(ApplicationError::new(ErrorType::Authorization, "Administrator access required".to_string()))
        }
    }

    /**
     * Requires the caller to be the named member, or an administrator.
     */
    pub fn require_member(&self, member_id: i64) -> Result<(), ApplicationError> {
        if self.admin || self.member_id == member_id {
            Ok(())
        } else {
            Err(ApplicationError::new(ErrorType::Authorization, "Not allowed for this member".to_string()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn member_session() -> SessionContext {
        SessionContext { member_id: 7, name: "Asha Patel".to_string(), admin: false }
    }

    #[test]
    fn test_admin_required() {
        assert!(member_session().require_admin().is_err());
        assert!(SessionContext { admin: true, ..member_session() }.require_admin().is_ok());
    }

    #[test]
    fn test_member_scope() {
        let session = member_session();
        assert!(session.require_member(7).is_ok());
        let error = session.require_member(8).unwrap_err();
        assert_eq!(error.error_type, ErrorType::Authorization);
        assert!(SessionContext { admin: true, ..member_session() }.require_member(8).is_ok());
    }
}
