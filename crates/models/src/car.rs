use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{car_model, order, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "car")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub plate_nr: String,
    pub vin: String,
    pub notes: Option<String>,
    pub cover: Option<String>,
    pub car_model_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    CarModel,
    Client,
    Orders,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::CarModel => Entity::belongs_to(car_model::Entity)
                .from(Column::CarModelId)
                .to(car_model::Column::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .into(),
            Relation::Client => Entity::belongs_to(user::Entity)
                .from(Column::ClientId)
                .to(user::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
            Relation::Orders => Entity::has_many(order::Entity).into(),
        }
    }
}

impl Related<car_model::Entity> for Entity {
    fn to() -> RelationDef { Relation::CarModel.def() }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Client.def() }
}

impl Related<order::Entity> for Entity {
    fn to() -> RelationDef { Relation::Orders.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.plate_nr)
    }
}

impl Model {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.client_id == Some(user_id)
    }
}

/// Editable car fields. The owner is never part of the input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarInput {
    pub plate_nr: String,
    pub vin: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub car_model_id: Option<Uuid>,
}

impl CarInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        errors::required("plate_nr", &self.plate_nr)?;
        errors::max_len("plate_nr", &self.plate_nr, 50)?;
        errors::required("vin", &self.vin)?;
        errors::max_len("vin", &self.vin, 50)?;
        if let Some(notes) = &self.notes {
            errors::max_len("notes", notes, 8000)?;
        }
        Ok(())
    }

    fn notes(&self) -> Option<String> {
        self.notes.clone().filter(|n| !n.trim().is_empty())
    }
}

pub async fn create(db: &DatabaseConnection, client_id: Option<Uuid>, input: CarInput) -> Result<Model, ModelError> {
    input.validate()?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        notes: Set(input.notes()),
        plate_nr: Set(input.plate_nr),
        vin: Set(input.vin),
        cover: Set(None),
        car_model_id: Set(input.car_model_id),
        client_id: Set(client_id),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

/// Applies new field values; `client_id` and `cover` are left untouched.
pub async fn update(db: &DatabaseConnection, existing: Model, input: CarInput) -> Result<Model, ModelError> {
    input.validate()?;
    let mut am: ActiveModel = existing.into();
    am.notes = Set(input.notes());
    am.plate_nr = Set(input.plate_nr);
    am.vin = Set(input.vin);
    am.car_model_id = Set(input.car_model_id);
    am.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn set_cover(db: &DatabaseConnection, existing: Model, path: String) -> Result<Model, ModelError> {
    errors::max_len("cover", &path, 255)?;
    let mut am: ActiveModel = existing.into();
    am.cover = Set(Some(path));
    am.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}
