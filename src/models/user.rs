use serde::{Deserialize, Serialize};

/// Primary key of the `users` table
pub type UserId = i32;

/// A registered user of the ratings site
///
/// The password is kept in plaintext and compared verbatim on login. It is
/// never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub user_id: UserId,
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub age: Option<i32>,
    pub zipcode: Option<String>,
}

/// Fields needed to insert a new user
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NewUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i32>,
    #[serde(default)]
    pub zipcode: Option<String>,
}

impl NewUser {
    /// Creates a registration payload with the given credentials
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Attaches the stored user id
    pub fn into_user(self, user_id: UserId) -> User {
        User {
            user_id,
            email: self.email,
            password: self.password,
            age: self.age,
            zipcode: self.zipcode,
        }
    }
}
