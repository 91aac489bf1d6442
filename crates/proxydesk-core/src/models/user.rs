use serde::{Deserialize, Serialize};

/// Minimum username length the server accepts.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length the server accepts.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Minimum password length the server accepts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A proxy user account as listed by the server. Usernames are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<CredentialRecord>,
}

/// Create-user form contents. The password only lives here until the
/// form is submitted and cleared.
#[derive(Clone, Default, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty before a request may be issued
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn clear(&mut self) {
        self.username.clear();
        self.password.clear();
    }

    /// Advisory hints for inputs the server is likely to reject.
    /// Returns `None` when the input looks acceptable.
    pub fn hint(&self) -> Option<&'static str> {
        let name_ok = self.username.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&self.username.len());
        if !self.username.is_empty() && !name_ok {
            return Some("Usernames are 3-32 lowercase letters or digits");
        }
        if !self.password.is_empty() && self.password.len() < MIN_PASSWORD_LENGTH {
            return Some("Passwords must be at least 8 characters");
        }
        None
    }
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}
