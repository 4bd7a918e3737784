mod forms;
mod job;
mod user;

pub use forms::{LoginForm, PasswordForm, ProfileForm, RegisterForm, StatusForm};
pub use job::{
    estimate_minutes, JobRecord, JobStatus, NewPrintJob, OwnerSummary, PrintJob, PrintType,
};
pub use user::{NewUser, PublicUser, Role, SessionUser, User, UserUpdate};
