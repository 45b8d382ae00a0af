use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{car, order_entry, order_review, pricing};

/// Default number of days between order creation and the due-back date.
pub const DEFAULT_DUE_BACK_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(num_value = 0)]
    InRow,
    #[sea_orm(num_value = 1)]
    Working,
    #[sea_orm(num_value = 2)]
    Pending,
    #[sea_orm(num_value = 3)]
    Done,
    #[sea_orm(num_value = 7)]
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self { OrderStatus::InRow }
}

impl OrderStatus {
    pub fn code(self) -> i16 {
        match self {
            OrderStatus::InRow => 0,
            OrderStatus::Working => 1,
            OrderStatus::Pending => 2,
            OrderStatus::Done => 3,
            OrderStatus::Cancelled => 7,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(OrderStatus::InRow),
            1 => Some(OrderStatus::Working),
            2 => Some(OrderStatus::Pending),
            3 => Some(OrderStatus::Done),
            7 => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::InRow => "In a Row",
            OrderStatus::Working => "Working",
            OrderStatus::Pending => "Pending",
            OrderStatus::Done => "Done",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: Date,
    pub due_back: Option<Date>,
    pub status: OrderStatus,
    pub car_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Car,
    Entries,
    Reviews,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Car => Entity::belongs_to(car::Entity)
                .from(Column::CarId)
                .to(car::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
            Relation::Entries => Entity::has_many(order_entry::Entity).into(),
            Relation::Reviews => Entity::has_many(order_review::Entity).into(),
        }
    }
}

impl Related<car::Entity> for Entity {
    fn to() -> RelationDef { Relation::Car.def() }
}

impl Related<order_entry::Entity> for Entity {
    fn to() -> RelationDef { Relation::Entries.def() }
}

impl Related<order_review::Entity> for Entity {
    fn to() -> RelationDef { Relation::Reviews.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        pricing::is_overdue(self.due_back, today)
    }

    /// The order's client is whoever owns its car.
    pub fn client(car: &car::Model) -> Option<Uuid> {
        car.client_id
    }
}

pub fn default_due_back(today: NaiveDate) -> NaiveDate {
    today + Duration::days(DEFAULT_DUE_BACK_DAYS)
}

/// Client-settable order fields. Status and creation date are never taken
/// from the client.
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub car_id: Uuid,
    pub due_back: Option<NaiveDate>,
}

/// Inserts a new order dated `today` with status `InRow`. A missing due-back
/// date defaults to `today + 14 days`.
pub async fn create(db: &DatabaseConnection, input: OrderInput, today: NaiveDate) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        date: Set(today),
        due_back: Set(Some(input.due_back.unwrap_or_else(|| default_due_back(today)))),
        status: Set(OrderStatus::InRow),
        car_id: Set(input.car_id),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

/// Updates car and due-back only; `date` is immutable and status is staff-driven.
pub async fn update(db: &DatabaseConnection, existing: Model, input: OrderInput) -> Result<Model, ModelError> {
    let mut am: ActiveModel = existing.into();
    am.car_id = Set(input.car_id);
    am.due_back = Set(input.due_back);
    am.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn set_status(db: &DatabaseConnection, existing: Model, status: OrderStatus) -> Result<Model, ModelError> {
    let mut am: ActiveModel = existing.into();
    am.status = Set(status);
    am.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn status_codes_round_trip() {
        for s in OrderStatus::iter() {
            assert_eq!(OrderStatus::from_code(s.code()), Some(s));
        }
        assert_eq!(OrderStatus::from_code(4), None);
        assert_eq!(OrderStatus::Cancelled.code(), 7);
        assert_eq!(OrderStatus::default(), OrderStatus::InRow);
    }

    #[test]
    fn due_back_defaults_two_weeks_out() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        assert_eq!(default_due_back(today), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn overdue_uses_due_back() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut o = Model {
            id: Uuid::new_v4(),
            date: today,
            due_back: None,
            status: OrderStatus::InRow,
            car_id: Uuid::new_v4(),
        };
        assert!(!o.is_overdue(today));
        o.due_back = Some(today - Duration::days(1));
        assert!(o.is_overdue(today));
        o.due_back = Some(today);
        assert!(!o.is_overdue(today));
    }
}
