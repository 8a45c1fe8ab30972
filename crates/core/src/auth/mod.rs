//! Password hashing with Argon2id.

mod password;

pub use password::{PasswordError, hash_password, verify_password};

use splittrip_shared::AppError;

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}
