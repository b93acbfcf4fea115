//! In-memory user repository
//!
//! Backs the API with a process-local table of users. It enforces the same
//! uniqueness rules a database would: no two users share a username or an
//! email address.

use async_trait::async_trait;
use jingle_core::{Result, StoreError, UniqueField, User, UserId, UserLookup, UserStore};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<UserId, User>,
}

/// User repository held entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Tables>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.users.is_empty()
    }
}

fn conflict(tables: &Tables, user: &User) -> Option<UniqueField> {
    tables
        .users
        .values()
        .filter(|other| other.id != user.id)
        .find_map(|other| {
            if other.username() == user.username() {
                Some(UniqueField::Username)
            } else if other.email_address() == user.email_address() {
                Some(UniqueField::EmailAddress)
            } else {
                None
            }
        })
}

#[async_trait]
impl UserLookup for InMemoryUserRepository {
    async fn by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|user| user.username() == username)
            .cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn save(&self, user: User) -> Result<User> {
        let mut tables = self.inner.write().await;

        if let Some(field) = conflict(&tables, &user) {
            return Err(StoreError::Conflict(field));
        }

        let user = match user.id {
            Some(id) if !tables.users.contains_key(&id) => return Err(StoreError::NotFound(id)),
            Some(_) => user,
            None => {
                tables.next_id += 1;
                user.with_id(UserId(tables.next_id))
            }
        };

        if let Some(id) = user.id {
            tables.users.insert(id, user.clone());
        }
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        self.inner
            .write()
            .await
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
