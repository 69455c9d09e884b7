use thiserror::Error;

use crate::principal::Caller;

/// What an operation does to the resource it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// list / retrieve
    Read,
    /// create / update / partial update / delete
    Write,
}

/// Access policy attached to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Anyone, authenticated or not.
    AllowAny,
    /// Anyone may read; only authenticated callers may write.
    AuthenticatedOrReadOnly,
    /// Only authenticated callers, for any operation.
    Authenticated,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication credentials were not provided")]
    NotAuthenticated,
}

/// Decide whether `caller` may perform `operation` under `policy`.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(caller: &Caller, policy: AccessPolicy, operation: Operation) -> Result<(), AuthzError> {
    let allowed = match policy {
        AccessPolicy::AllowAny => true,
        AccessPolicy::AuthenticatedOrReadOnly => {
            operation == Operation::Read || caller.is_authenticated()
        }
        AccessPolicy::Authenticated => caller.is_authenticated(),
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthzError::NotAuthenticated)
    }
}

impl AccessPolicy {
    pub fn check(self, caller: &Caller, operation: Operation) -> Result<(), AuthzError> {
        authorize(caller, self, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::AuthenticatedUser;
    use shopfront_core::UserId;

    fn signed_in() -> Caller {
        Caller::Authenticated(AuthenticatedUser {
            user_id: UserId::new(),
            username: "alice".to_string(),
        })
    }

    #[test]
    fn read_only_policy_lets_anyone_read() {
        let policy = AccessPolicy::AuthenticatedOrReadOnly;
        assert_eq!(policy.check(&Caller::Anonymous, Operation::Read), Ok(()));
        assert_eq!(policy.check(&signed_in(), Operation::Read), Ok(()));
    }

    #[test]
    fn read_only_policy_requires_auth_for_writes() {
        let policy = AccessPolicy::AuthenticatedOrReadOnly;
        assert_eq!(
            policy.check(&Caller::Anonymous, Operation::Write),
            Err(AuthzError::NotAuthenticated)
        );
        assert_eq!(policy.check(&signed_in(), Operation::Write), Ok(()));
    }

    #[test]
    fn allow_any_never_refuses() {
        for op in [Operation::Read, Operation::Write] {
            assert_eq!(authorize(&Caller::Anonymous, AccessPolicy::AllowAny, op), Ok(()));
        }
    }

    #[test]
    fn authenticated_policy_refuses_anonymous_reads() {
        assert_eq!(
            authorize(&Caller::Anonymous, AccessPolicy::Authenticated, Operation::Read),
            Err(AuthzError::NotAuthenticated)
        );
    }
}
