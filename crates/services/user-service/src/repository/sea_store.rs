//! PostgreSQL user store on SeaORM.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use super::store::{PersistentStore, UserStore};
use common::{AppError, AppResult};
use domain::{User, UserPatch, UNASSIGNED_ID};

/// Users table accessor
#[derive(Clone)]
pub struct SeaOrmUserStore {
    db: DatabaseConnection,
}

impl SeaOrmUserStore {
    /// Create new store instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersistentStore<User> for SeaOrmUserStore {
    async fn insert(&self, record: User) -> AppResult<User> {
        let active_model = ActiveModel {
            id: if record.id == UNASSIGNED_ID {
                NotSet
            } else {
                Set(record.id)
            },
            username: Set(record.username),
            email: Set(record.email),
            password: Set(record.password),
            is_active: Set(record.is_active),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn update_by_id(&self, id: i64, patch: UserPatch) -> AppResult<u64> {
        let mut active = ActiveModel::new();
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(password) = patch.password {
            active.password = Set(password);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let result = UserEntity::update_many()
            .set(active)
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<u64> {
        let result = UserEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        let users = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(users.into_iter().map(User::from).collect())
    }

    async fn count(&self) -> AppResult<u64> {
        UserEntity::find()
            .count(&self.db)
            .await
            .map_err(AppError::from)
    }

    async fn slice(&self, skip: u64, take: u64) -> AppResult<Vec<User>> {
        let users = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .offset(skip)
            .limit(take)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(users.into_iter().map(User::from).collect())
    }
}

#[async_trait]
impl UserStore for SeaOrmUserStore {
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }
}
