use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Fields accepted by the store when creating a user. The id is generated
/// by the store itself.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Partial user update. `None` leaves the field untouched; `phone` carries
/// its own inner Option because the profile form may clear it.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub password_hash: Option<String>,
}

/// User shape returned over the API, without the password hash.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            role: user.role,
        }
    }
}

/// Identity carried in the session: user id plus role, with the username
/// kept around for log lines.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl SessionUser {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), "\"staff\"");
    }

    #[test]
    fn public_user_omits_password_hash() {
        let user = User {
            id: "u1".into(),
            username: "alice".into(),
            password_hash: "secret-hash".into(),
            name: "Alice".into(),
            phone: None,
            role: Role::Student,
        };
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"username\":\"alice\""));
    }
}
