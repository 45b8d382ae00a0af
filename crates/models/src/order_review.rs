use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{order, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_at: DateTimeWithTimeZone,
    pub content: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Order,
    Reviewer,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Order => Entity::belongs_to(order::Entity)
                .from(Column::OrderId)
                .to(order::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
            Relation::Reviewer => Entity::belongs_to(user::Entity)
                .from(Column::ReviewerId)
                .to(user::Column::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .into(),
        }
    }
}

impl Related<order::Entity> for Entity {
    fn to() -> RelationDef { Relation::Order.def() }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Reviewer.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_content(content: &str) -> Result<(), ModelError> {
    errors::required("content", content)?;
    errors::max_len("content", content, 4000)
}

/// Order and reviewer come from the request context, never from the form.
pub async fn create(
    db: &DatabaseConnection,
    order_id: Uuid,
    reviewer_id: Uuid,
    content: String,
) -> Result<Model, ModelError> {
    validate_content(&content)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        reviewer_id: Set(Some(reviewer_id)),
        reviewed_at: Set(Utc::now().into()),
        content: Set(content),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_bounds() {
        assert!(validate_content("Great job").is_ok());
        assert!(validate_content("   ").is_err());
        assert!(validate_content(&"x".repeat(4001)).is_err());
    }
}
