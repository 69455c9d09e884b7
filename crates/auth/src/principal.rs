use shopfront_core::UserId;

use crate::user::UserAccount;

/// Account behind a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
}

/// Who is making a request.
///
/// Requests without credentials are `Anonymous`; requests with invalid
/// credentials never get this far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Caller {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl Caller {
    pub fn from_account(account: &UserAccount) -> Self {
        Self::Authenticated(AuthenticatedUser {
            user_id: account.id,
            username: account.username.clone(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

impl core::fmt::Display for Caller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Authenticated(user) => write!(f, "{} ({})", user.username, user.user_id),
        }
    }
}
