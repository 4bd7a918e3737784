use crate::errors::AppResult;
use crate::models::{NewUser, Role};
use crate::services::hash_password;
use crate::storage::Storage;

/// Creates the demo accounts if they are missing. Registration always
/// produces students, so the seeded staff account is the only way a staff
/// identity comes into existence.
pub async fn seed_demo_accounts(storage: &dyn Storage) -> AppResult<()> {
    let accounts = [
        ("staff", "staff123", "Stationery Staff", Role::Staff),
        ("student", "student123", "John Student", Role::Student),
    ];

    for (username, password, name, role) in accounts {
        if storage.get_user_by_username(username).await?.is_some() {
            continue;
        }
        storage
            .create_user(NewUser {
                username: username.into(),
                password_hash: hash_password(password)?,
                name: name.into(),
                phone: None,
                role,
            })
            .await?;
        tracing::info!("Created demo account: {} / {}", username, password);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn seeding_is_idempotent_and_creates_one_staff_account() {
        let storage = MemoryStorage::new();
        seed_demo_accounts(&storage).await.unwrap();
        seed_demo_accounts(&storage).await.unwrap();

        let staff = storage.get_user_by_username("staff").await.unwrap().unwrap();
        assert_eq!(staff.role, Role::Staff);

        let student = storage.get_user_by_username("student").await.unwrap().unwrap();
        assert_eq!(student.role, Role::Student);
    }
}
