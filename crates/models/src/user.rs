use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::{car, user_profile};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Cars,
    Profile,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Cars => Entity::has_many(car::Entity).into(),
            Relation::Profile => Entity::has_one(user_profile::Entity).into(),
        }
    }
}

impl Related<car::Entity> for Entity {
    fn to() -> RelationDef { Relation::Cars.def() }
}

impl Related<user_profile::Entity> for Entity {
    fn to() -> RelationDef { Relation::Profile.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// "First Last", falling back to the username when both are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() { self.username.clone() } else { full.to_string() }
    }
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    errors::required("username", username)?;
    errors::max_len("username", username, 150)?;
    if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
        return Err(ModelError::field("username", "Letters, digits and @/./+/-/_ only."));
    }
    Ok(())
}

pub fn validate_name(field: &'static str, name: &str) -> Result<(), ModelError> {
    errors::max_len(field, name, 150)
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    if email.is_empty() { return Ok(()); }
    errors::max_len("email", email, 254)?;
    if !email.contains('@') { return Err(ModelError::field("email", "Enter a valid email address.")); }
    Ok(())
}

/// Input for [`create`].
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
}

/// Insert a new account. A taken username comes back as [`ModelError::Duplicate`].
pub async fn create<C: ConnectionTrait>(db: &C, input: NewUser) -> Result<Model, ModelError> {
    validate_username(&input.username)?;
    validate_name("first_name", &input.first_name)?;
    validate_name("last_name", &input.last_name)?;
    validate_email(&input.email)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(input.username),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        is_staff: Set(input.is_staff),
        is_active: Set(true),
        date_joined: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(ModelError::from)
}
