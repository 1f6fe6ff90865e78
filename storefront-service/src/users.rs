use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::webhook::WebhookUser;

const MAX_USERNAME_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: u64,
    pub kinde_id: Option<String>,
    pub username: String,
    pub email: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DirectoryError {
    MissingEmail,
    AlreadyExists,
}

#[derive(Default)]
struct DirectoryState {
    next_id: u64,
    users: BTreeMap<u64, UserRecord>,
}

/// Users provisioned from identity-provider webhooks.
#[derive(Default)]
pub struct UserDirectory {
    state: RwLock<DirectoryState>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user; existing emails are never updated.
    pub async fn create(&self, user: &WebhookUser) -> Result<UserRecord, DirectoryError> {
        let email = user.email.as_deref().ok_or(DirectoryError::MissingEmail)?;

        let mut state = self.state.write().await;
        if state.users.values().any(|existing| existing.email == email) {
            return Err(DirectoryError::AlreadyExists);
        }

        let base = base_username(user, email);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while state.users.values().any(|existing| existing.username == candidate) {
            candidate = truncate_chars(&format!("{base}_{suffix}"), MAX_USERNAME_CHARS);
            suffix += 1;
        }

        state.next_id += 1;
        let record = UserRecord {
            id: state.next_id,
            kinde_id: user.id.clone(),
            username: candidate,
            email: email.to_owned(),
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    pub async fn remove_by_email(&self, email: &str) -> Option<UserRecord> {
        let mut state = self.state.write().await;
        let id = state
            .users
            .values()
            .find(|existing| existing.email == email)
            .map(|existing| existing.id)?;
        state.users.remove(&id)
    }

    pub async fn list(&self) -> Vec<UserRecord> {
        self.state.read().await.users.values().cloned().collect()
    }
}

/// Explicit username, else first + last name, else the email local part.
fn base_username(user: &WebhookUser, email: &str) -> String {
    let full_name = format!(
        "{}{}",
        user.first_name.as_deref().unwrap_or_default(),
        user.last_name.as_deref().unwrap_or_default()
    );
    let raw = match user.username.as_deref() {
        Some(username) if !username.is_empty() => username.to_owned(),
        _ if !full_name.is_empty() => full_name,
        _ => email.split('@').next().unwrap_or_default().to_owned(),
    };
    truncate_chars(&raw.replace(' ', "_"), MAX_USERNAME_CHARS)
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> WebhookUser {
        WebhookUser {
            id: Some("kp_1".into()),
            email: Some(email.into()),
            ..WebhookUser::default()
        }
    }

    #[test]
    fn username_prefers_explicit_then_names_then_email() {
        let mut source = user("ada@example.com");
        assert_eq!(base_username(&source, "ada@example.com"), "ada");

        source.first_name = Some("Ada".into());
        source.last_name = Some("Love lace".into());
        assert_eq!(base_username(&source, "ada@example.com"), "AdaLove_lace");

        source.username = Some("countess ada".into());
        assert_eq!(base_username(&source, "ada@example.com"), "countess_ada");
    }

    #[test]
    fn username_is_truncated() {
        let mut source = user("x@example.com");
        source.username = Some("a".repeat(120));
        assert_eq!(base_username(&source, "x@example.com").chars().count(), 80);
    }

    #[tokio::test]
    async fn colliding_usernames_get_suffixes() {
        let directory = UserDirectory::new();
        let first = directory.create(&user("ada@example.com")).await.expect("first");
        let second = directory.create(&user("ada@example.org")).await.expect("second");
        let third = directory.create(&user("ada@example.net")).await.expect("third");
        assert_eq!(first.username, "ada");
        assert_eq!(second.username, "ada_1");
        assert_eq!(third.username, "ada_2");
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let directory = UserDirectory::new();
        directory.create(&user("ada@example.com")).await.expect("first");
        assert_eq!(
            directory.create(&user("ada@example.com")).await,
            Err(DirectoryError::AlreadyExists)
        );
        assert_eq!(
            directory.create(&WebhookUser::default()).await,
            Err(DirectoryError::MissingEmail)
        );
    }

    #[tokio::test]
    async fn remove_by_email() {
        let directory = UserDirectory::new();
        let created = directory.create(&user("ada@example.com")).await.expect("create");
        assert_eq!(directory.remove_by_email("ada@example.com").await, Some(created));
        assert!(directory.remove_by_email("ada@example.com").await.is_none());
        assert!(directory.list().await.is_empty());
    }
}
