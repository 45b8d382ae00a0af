use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::order_entry;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Entries,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Entries => Entity::has_many(order_entry::Entity).into(),
        }
    }
}

impl Related<order_entry::Entity> for Entity {
    fn to() -> RelationDef { Relation::Entries.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    pub price: Decimal,
}

impl ServiceInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        errors::required("name", &self.name)?;
        errors::max_len("name", &self.name, 100)?;
        if self.price.is_sign_negative() {
            return Err(ModelError::field("price", "Ensure this value is greater than or equal to 0."));
        }
        if self.price.scale() > 2 {
            return Err(ModelError::field("price", "Ensure that there are no more than 2 decimal places."));
        }
        // 18 digits total, 2 after the point
        if self.price.trunc().abs() >= Decimal::from(10_i64.pow(16)) {
            return Err(ModelError::field("price", "Ensure that there are no more than 16 digits before the decimal point."));
        }
        Ok(())
    }
}

pub async fn create(db: &DatabaseConnection, input: ServiceInput) -> Result<Model, ModelError> {
    input.validate()?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name),
        price: Set(input.price),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn update(db: &DatabaseConnection, existing: Model, input: ServiceInput) -> Result<Model, ModelError> {
    input.validate()?;
    let mut am: ActiveModel = existing.into();
    am.name = Set(input.name);
    am.price = Set(input.price);
    am.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_rules() {
        let ok = ServiceInput { name: "Oil change".into(), price: Decimal::new(4500, 2) };
        assert!(ok.validate().is_ok());
        let neg = ServiceInput { name: "Oil change".into(), price: Decimal::new(-1, 0) };
        assert!(neg.validate().is_err());
        let precise = ServiceInput { name: "Oil change".into(), price: Decimal::new(1001, 3) };
        assert!(precise.validate().is_err());
    }
}
