use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{StoreError, UserFilter, UserStore};
use crate::models::{NewUser, User};

/// Process-local user table with sequential ids and a unique email column.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: Vec<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_first(&self, filter: UserFilter<'_>) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        let found = table.rows.iter().find(|user| match filter {
            UserFilter::Id(id) => user.id == id,
            UserFilter::Email(email) => user.email == email,
        });
        Ok(found.cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        if table.rows.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate);
        }

        table.last_id += 1;
        let now = Utc::now();
        let record = User {
            id: table.last_id,
            name: user.name,
            email: user.email,
            password: user.password,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(record.clone());
        Ok(record)
    }
}
