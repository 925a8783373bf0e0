use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter,
};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await
    }

    pub async fn find_by_public_id<C: ConnectionTrait>(
        db: &C,
        public_id: Uuid,
    ) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::PublicId.eq(public_id))
            .one(db)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: String,
        email: String,
        password_hash: String,
        role: UserRole,
    ) -> Result<user::Model, DbErr> {
        let now = Utc::now();
        user::ActiveModel {
            public_id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            role: Set(role),
            is_active: Set(true),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
