use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
}

/// Raw status payload for PATCH /api/jobs/:id/status. Kept as a string so
/// unrecognized values surface as our own validation error instead of a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}
