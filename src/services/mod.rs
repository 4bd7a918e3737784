mod jobs;
mod password;

pub use jobs::JobService;
pub use password::{hash_password, verify_password};
