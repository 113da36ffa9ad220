use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::{NewProfile, Profile};
use crate::utils::deadline::run_bounded;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::time::Duration;
use uuid::Uuid;

/// User profiles keyed by external identity.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// First profile stored for `identity`.
    async fn find(&self, identity: &str) -> Result<Profile, AppError>;

    /// Inserts a fresh profile with zeroed progress and returns its reference
    /// id. Nothing stops two concurrent calls from creating duplicates for the
    /// same identity.
    async fn create(&self, profile: NewProfile) -> Result<String, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

pub struct DbProfileStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl DbProfileStore {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl From<users::Model> for Profile {
    fn from(model: users::Model) -> Self {
        Self {
            ref_id: model.ref_id,
            id: model.id,
            username: model.username,
            avatar: model.avatar,
            exp: model.exp,
            verified: model.verified,
            discriminator: model.discriminator,
            coins: model.coins,
        }
    }
}

#[async_trait]
impl ProfileStore for DbProfileStore {
    async fn find(&self, identity: &str) -> Result<Profile, AppError> {
        let found = run_bounded(self.timeout, async {
            Users::find()
                .filter(users::Column::Id.eq(identity))
                .order_by_asc(users::Column::CreatedAt)
                .one(&self.db)
                .await
                .map_err(AppError::from)
        })
        .await?;

        found
            .map(Profile::from)
            .ok_or_else(|| AppError::NotFound(format!("profile {}", identity)))
    }

    async fn create(&self, profile: NewProfile) -> Result<String, AppError> {
        let ref_id = Uuid::new_v4().to_string();
        let record = users::ActiveModel {
            ref_id: Set(ref_id.clone()),
            id: Set(profile.id),
            username: Set(profile.username),
            avatar: Set(profile.avatar),
            exp: Set(0),
            verified: Set(false),
            discriminator: Set(profile.discriminator),
            coins: Set(0),
            created_at: Set(Some(Utc::now())),
        };

        let inserted = run_bounded(self.timeout, async {
            record.insert(&self.db).await.map_err(AppError::from)
        })
        .await?;

        tracing::info!("👤 Created profile {} for {}", inserted.ref_id, inserted.id);
        Ok(ref_id)
    }

    async fn ping(&self) -> Result<(), AppError> {
        run_bounded(self.timeout, async {
            self.db.ping().await.map_err(AppError::from)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database;
    use sea_orm::Database;

    async fn setup_store() -> DbProfileStore {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        database::run_migrations(&db).await.unwrap();
        DbProfileStore::new(db, Duration::from_secs(5))
    }

    fn new_profile(id: &str) -> NewProfile {
        NewProfile {
            id: id.to_string(),
            username: "ferris".to_string(),
            avatar: "a1b2".to_string(),
            discriminator: "0420".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_unknown_identity_is_not_found() {
        let store = setup_store().await;
        let err = store.find("404").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = setup_store().await;
        let ref_id = store.create(new_profile("1234")).await.unwrap();
        assert!(Uuid::parse_str(&ref_id).is_ok());

        let profile = store.find("1234").await.unwrap();
        assert_eq!(profile.ref_id, ref_id);
        assert_eq!(profile.id, "1234");
        assert_eq!(profile.username, "ferris");
        assert_eq!(profile.discriminator, "0420");
        assert_eq!(profile.exp, 0);
        assert_eq!(profile.coins, 0);
        assert!(!profile.verified);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_not_prevented() {
        let store = setup_store().await;
        let first = store.create(new_profile("77")).await.unwrap();
        let second = store.create(new_profile("77")).await.unwrap();
        assert_ne!(first, second);
        assert!(store.find("77").await.is_ok());
    }
}
