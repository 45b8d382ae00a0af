use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::car;
use crate::errors::{self, ModelError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "car_model")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub engine: Option<String>,
    pub year: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Cars,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Cars => Entity::has_many(car::Entity).into(),
        }
    }
}

impl Related<car::Entity> for Entity {
    fn to() -> RelationDef { Relation::Cars.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.make, self.model)
    }
}

/// Fields a staff member may set on a car model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarModelInput {
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl CarModelInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        errors::required("make", &self.make)?;
        errors::max_len("make", &self.make, 50)?;
        errors::required("model", &self.model)?;
        errors::max_len("model", &self.model, 50)?;
        if let Some(engine) = &self.engine {
            errors::max_len("engine", engine, 50)?;
        }
        Ok(())
    }

    fn engine(&self) -> Option<String> {
        self.engine.as_ref().map(|e| e.trim().to_string()).filter(|e| !e.is_empty())
    }
}

pub async fn create(db: &DatabaseConnection, input: CarModelInput) -> Result<Model, ModelError> {
    input.validate()?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        engine: Set(input.engine()),
        make: Set(input.make),
        model: Set(input.model),
        year: Set(input.year),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn update(db: &DatabaseConnection, existing: Model, input: CarModelInput) -> Result<Model, ModelError> {
    input.validate()?;
    let mut am: ActiveModel = existing.into();
    am.engine = Set(input.engine());
    am.make = Set(input.make);
    am.model = Set(input.model);
    am.year = Set(input.year);
    am.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_make_and_model() {
        let m = Model { id: Uuid::new_v4(), make: "Honda".into(), model: "Civic".into(), engine: None, year: Some(2008) };
        assert_eq!(m.to_string(), "Honda Civic");
    }

    #[test]
    fn blank_engine_is_stored_as_none() {
        let input = CarModelInput { make: "Audi".into(), model: "A4".into(), engine: Some("  ".into()), year: None };
        assert!(input.validate().is_ok());
        assert_eq!(input.engine(), None);
    }

    #[test]
    fn make_is_required_and_bounded() {
        let mut input = CarModelInput { make: String::new(), model: "A4".into(), ..Default::default() };
        assert!(matches!(input.validate(), Err(ModelError::Field { field: "make", .. })));
        input.make = "x".repeat(51);
        assert!(input.validate().is_err());
    }
}
