use std::path::{Path, PathBuf};

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{car, car_model};

use crate::errors::{FormErrors, ServiceError};
use crate::pagination::{fetch_page, Page};
use crate::policy::{self, Requester};
use crate::search;

pub const CARS_PER_PAGE: u64 = 5;

const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A car with its model, as shown on listing and detail pages.
#[derive(Debug, Clone, Serialize)]
pub struct CarView {
    #[serde(flatten)]
    pub car: car::Model,
    pub car_model: Option<car_model::Model>,
    pub car_model_name: Option<String>,
}

impl CarView {
    pub fn new(car: car::Model, car_model: Option<car_model::Model>) -> Self {
        let car_model_name = car_model.as_ref().map(ToString::to_string);
        Self { car, car_model, car_model_name }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CarListing {
    pub page: Page<CarView>,
    /// Set when a query matched nothing and the full listing is shown instead.
    pub unfiltered_fallback: bool,
}

/// Raw car form as submitted; `car_model` is a UUID string or empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarForm {
    #[serde(default)]
    pub plate_nr: String,
    #[serde(default)]
    pub vin: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub car_model: Option<String>,
}

impl CarForm {
    /// Parse and check every field, collecting all errors at once.
    pub fn clean(&self) -> Result<car::CarInput, ServiceError> {
        let mut errors = FormErrors::new();
        let car_model_id = match self.car_model.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("car_model", "Select a valid choice.");
                    None
                }
            },
        };
        let input = car::CarInput {
            plate_nr: self.plate_nr.trim().to_string(),
            vin: self.vin.trim().to_string(),
            notes: self.notes.clone(),
            car_model_id,
        };
        for check in [
            models::errors::required("plate_nr", &input.plate_nr),
            models::errors::max_len("plate_nr", &input.plate_nr, 50),
            models::errors::required("vin", &input.vin),
            models::errors::max_len("vin", &input.vin, 50),
            input.notes.as_deref().map_or(Ok(()), |n| models::errors::max_len("notes", n, 8000)),
        ] {
            if let Err(models::errors::ModelError::Field { field, message }) = check {
                if errors.get(field).is_none() {
                    errors.add(field, message);
                }
            }
        }
        errors.into_result()?;
        Ok(input)
    }
}

/// Public car listing, filtered by car model make or model. A query that
/// matches nothing falls back to the whole listing.
#[instrument(skip(db))]
pub async fn list_cars(db: &DatabaseConnection, query: Option<&str>, page: Option<&str>) -> Result<CarListing, ServiceError> {
    let base = || {
        car::Entity::find()
            .find_also_related(car_model::Entity)
            .order_by_asc(car::Column::PlateNr)
            .order_by_asc(car::Column::Id)
    };
    let mut unfiltered_fallback = false;
    let select = match search::car_listing().condition(query) {
        Some(cond) => {
            let filtered = base().filter(cond);
            let hits = filtered.clone().count(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
            if hits == 0 {
                unfiltered_fallback = true;
                base()
            } else {
                filtered
            }
        }
        None => base(),
    };
    let page = fetch_page(db, select, CARS_PER_PAGE, page).await?;
    Ok(CarListing { page: page.map(|(c, m)| CarView::new(c, m)), unfiltered_fallback })
}

pub async fn find_car(db: &DatabaseConnection, id: Uuid) -> Result<car::Model, ServiceError> {
    car::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("car"))
}

pub async fn get_car(db: &DatabaseConnection, id: Uuid) -> Result<CarView, ServiceError> {
    let (c, m) = car::Entity::find_by_id(id)
        .find_also_related(car_model::Entity)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("car"))?;
    Ok(CarView::new(c, m))
}

/// Cars owned by `client_id`, by plate.
pub async fn my_cars(db: &DatabaseConnection, client_id: Uuid) -> Result<Vec<CarView>, ServiceError> {
    let rows = car::Entity::find()
        .filter(car::Column::ClientId.eq(client_id))
        .find_also_related(car_model::Entity)
        .order_by_asc(car::Column::PlateNr)
        .order_by_asc(car::Column::Id)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows.into_iter().map(|(c, m)| CarView::new(c, m)).collect())
}

/// Every car model, for the car form's select box.
pub async fn car_model_choices(db: &DatabaseConnection) -> Result<Vec<car_model::Model>, ServiceError> {
    car_model::Entity::find()
        .order_by_asc(car_model::Column::Make)
        .order_by_asc(car_model::Column::Model)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

async fn check_car_model(db: &DatabaseConnection, input: &car::CarInput) -> Result<(), ServiceError> {
    if let Some(id) = input.car_model_id {
        let exists = car_model::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .is_some();
        if !exists {
            return Err(ServiceError::Invalid(FormErrors::single("car_model", "Select a valid choice.")));
        }
    }
    Ok(())
}

/// The new car always belongs to the requester.
#[instrument(skip(db, form), fields(user_id = %requester.id))]
pub async fn create_car(db: &DatabaseConnection, requester: &Requester, form: &CarForm) -> Result<car::Model, ServiceError> {
    let input = form.clean()?;
    check_car_model(db, &input).await?;
    let created = car::create(db, Some(requester.id), input).await?;
    info!(car_id = %created.id, "car_created");
    Ok(created)
}

#[instrument(skip(db, form), fields(user_id = %requester.id))]
pub async fn update_car(db: &DatabaseConnection, requester: &Requester, id: Uuid, form: &CarForm) -> Result<car::Model, ServiceError> {
    let existing = find_car(db, id).await?;
    policy::can_modify_car(requester, &existing)?;
    let input = form.clean()?;
    check_car_model(db, &input).await?;
    let updated = car::update(db, existing, input).await?;
    Ok(updated)
}

#[instrument(skip(db), fields(user_id = %requester.id))]
pub async fn delete_car(db: &DatabaseConnection, requester: &Requester, id: Uuid) -> Result<(), ServiceError> {
    let existing = find_car(db, id).await?;
    policy::can_modify_car(requester, &existing)?;
    existing.delete(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(car_id = %id, "car_deleted");
    Ok(())
}

/// Relative path of a car's cover under the media root.
pub fn cover_path(car_id: Uuid, file_name: &str) -> Result<String, ServiceError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| COVER_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| ServiceError::Invalid(FormErrors::single("cover", "Upload a valid image.")))?;
    Ok(format!("garage/car_covers/{}.{}", car_id, ext))
}

/// Store the uploaded bytes under `media_dir` and point the car at them.
#[instrument(skip(db, bytes), fields(user_id = %requester.id, size = bytes.len()))]
pub async fn save_cover(
    db: &DatabaseConnection,
    media_dir: &str,
    requester: &Requester,
    id: Uuid,
    file_name: &str,
    bytes: &[u8],
) -> Result<car::Model, ServiceError> {
    let existing = find_car(db, id).await?;
    policy::can_modify_car(requester, &existing)?;
    if bytes.is_empty() {
        return Err(ServiceError::Invalid(FormErrors::single("cover", "The submitted file is empty.")));
    }
    let rel = cover_path(id, file_name)?;
    let full: PathBuf = Path::new(media_dir).join(&rel);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ServiceError::Db(format!("cover dir: {}", e)))?;
    }
    tokio::fs::write(&full, bytes)
        .await
        .map_err(|e| ServiceError::Db(format!("cover write: {}", e)))?;
    let updated = car::set_cover(db, existing, rel).await?;
    Ok(updated)
}
