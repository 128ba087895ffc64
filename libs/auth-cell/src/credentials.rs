use tokio::sync::RwLock;
use tracing::debug;

use shared_models::auth::{PublicUser, UserRecord};

use crate::error::AuthError;

pub const DEFAULT_USER_NAME: &str = "New User";

/// In-memory credential table. Demo scale: passwords are compared as
/// plaintext and ids are `len + 1`, so it is only sound inside one process.
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: RwLock<Vec<UserRecord>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl CredentialStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Seeded with the three demo accounts.
    pub fn demo() -> Self {
        let seed = [
            ("demo@example.com", "demo-password-change-me", "Demo User"),
            ("user@test.com", "test-password-change-me", "Test User"),
            ("admin@admin.com", "admin-password-change-me", "Admin User"),
        ];

        Self::with_users(
            seed.iter()
                .zip(1..)
                .map(|((email, password, name), id)| UserRecord {
                    id,
                    email: email.to_string(),
                    password: password.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        )
    }

    pub async fn find_by_credentials(&self, email: &str, password: &str) -> Option<UserRecord> {
        let wanted = normalize_email(email);
        self.users
            .read()
            .await
            .iter()
            .find(|u| normalize_email(&u.email) == wanted && u.password == password)
            .cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let wanted = normalize_email(email);
        self.users
            .read()
            .await
            .iter()
            .find(|u| normalize_email(&u.email) == wanted)
            .cloned()
    }

    /// Appends a new record. The duplicate check and the insert happen under
    /// one write lock.
    pub async fn add(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<UserRecord, AuthError> {
        let mut users = self.users.write().await;

        let wanted = normalize_email(email);
        if users.iter().any(|u| normalize_email(&u.email) == wanted) {
            return Err(AuthError::DuplicateEmail);
        }

        let record = UserRecord {
            id: users.len() as i64 + 1,
            email: email.trim().to_string(),
            password: password.to_string(),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_USER_NAME)
                .to_string(),
        };
        users.push(record.clone());

        debug!("Added user {} with id {}", record.email, record.id);
        Ok(record)
    }

    pub async fn all(&self) -> Vec<PublicUser> {
        self.users.read().await.iter().map(PublicUser::from).collect()
    }

    pub async fn emails(&self) -> Vec<String> {
        self.users.read().await.iter().map(|u| u.email.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}
