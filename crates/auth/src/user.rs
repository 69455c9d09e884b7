//! Registered user accounts.

use chrono::{DateTime, Utc};

use shopfront_core::{Entity, UserId};

/// A stored account. `password_hash` is an Argon2id PHC string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// Everything needed to insert an account; the hash is computed beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewAccount {
    /// Assign identity and join time.
    pub fn into_account(self, id: UserId, now: DateTime<Utc>) -> UserAccount {
        UserAccount {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            date_joined: now,
        }
    }
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}
