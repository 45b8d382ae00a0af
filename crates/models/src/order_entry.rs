use async_trait::async_trait;
use sea_orm::{entity::prelude::*, ActiveValue, Set, DatabaseConnection};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{order, pricing, service};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub quantity: i32,
    /// Legacy stored price. Never read for totals; see [`pricing::entry_price`].
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub price: Decimal,
    pub service_id: Uuid,
    pub order_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
    Order,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(service::Entity)
                .from(Column::ServiceId)
                .to(service::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
            Relation::Order => Entity::belongs_to(order::Entity)
                .from(Column::OrderId)
                .to(order::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
        }
    }
}

impl Related<service::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl Related<order::Entity> for Entity {
    fn to() -> RelationDef { Relation::Order.def() }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let stored = match &self.price {
            ActiveValue::Set(p) | ActiveValue::Unchanged(p) => *p,
            ActiveValue::NotSet => Decimal::ZERO,
        };
        if stored.is_zero() {
            if let ActiveValue::Set(sid) | ActiveValue::Unchanged(sid) = self.service_id {
                if let Some(svc) = service::Entity::find_by_id(sid).one(db).await? {
                    self.price = Set(pricing::normalize_legacy_price(stored, svc.price));
                }
            }
        }
        Ok(self)
    }
}

/// An entry together with the service it bills, the unit every price is derived from.
#[derive(Debug, Clone, Serialize)]
pub struct PricedEntry {
    pub entry: Model,
    pub service: service::Model,
}

impl PricedEntry {
    pub fn price(&self) -> Decimal {
        pricing::entry_price(self.entry.quantity, self.service.price)
    }
}

impl std::fmt::Display for PricedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.service, self.entry.quantity, self.price())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub service_id: Uuid,
    pub quantity: i32,
}

impl EntryInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.quantity < 1 {
            return Err(ModelError::field("quantity", "Ensure this value is greater than or equal to 1."));
        }
        Ok(())
    }
}

pub async fn create(db: &DatabaseConnection, order_id: Uuid, input: EntryInput) -> Result<Model, ModelError> {
    input.validate()?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        quantity: Set(input.quantity),
        price: Set(Decimal::ZERO),
        service_id: Set(input.service_id),
        order_id: Set(order_id),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}
