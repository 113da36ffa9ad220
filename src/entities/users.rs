use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Generated document reference
    #[sea_orm(primary_key, auto_increment = false)]
    pub ref_id: String,
    /// External identity; not unique, see `ProfileStore::create`
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub exp: i64,
    pub verified: bool,
    pub discriminator: String,
    pub coins: i64,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
