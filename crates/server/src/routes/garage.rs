//! Shop pages: dashboard, car and order listings, owner forms.

use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use models::user;
use service::car_service::{self, CarForm};
use service::errors::{FormErrors, ServiceError};
use service::order_service::{self, OrderForm};
use service::policy;
use service::review_service::{self, ReviewForm};
use service::dashboard;

use crate::auth::{MaybeUser, RequireUser};
use crate::errors::AppError;
use crate::render::{invalid_form, page};
use crate::session::Session;
use crate::state::ServerState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderQuery {
    #[serde(default)]
    pub car_id: Option<String>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn parse_id(raw: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Service(ServiceError::not_found(entity)))
}

fn redirect(to: &str) -> Response {
    Redirect::to(to).into_response()
}

pub async fn index(
    State(state): State<ServerState>,
    MaybeUser(user): MaybeUser,
    session: Session,
) -> Result<Response, AppError> {
    let num_visits = session.bump_visits();
    let counts = dashboard::counts(&state.db).await?;
    Ok(page("garage/index.html", user.as_ref(), &session, json!({
        "service_count": counts.service_count,
        "count_orders": counts.count_orders,
        "count_cars": counts.count_cars,
        "num_visits": num_visits,
    })))
}

pub async fn car_list(
    State(state): State<ServerState>,
    MaybeUser(user): MaybeUser,
    session: Session,
    Query(q): Query<ListQuery>,
) -> Result<Response, AppError> {
    let listing = car_service::list_cars(&state.db, q.query.as_deref(), q.page.as_deref()).await?;
    Ok(page("garage/car_models.html", user.as_ref(), &session, json!({
        "car_model_list": listing.page,
        "query": q.query,
        "unfiltered_fallback": listing.unfiltered_fallback,
    })))
}

pub async fn car_detail(
    State(state): State<ServerState>,
    MaybeUser(user): MaybeUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let car = car_service::get_car(&state.db, parse_id(&id, "car")?).await?;
    let can_edit = user.as_ref().is_some_and(|u| car.car.is_owned_by(u.id));
    Ok(page("garage/car_detail.html", user.as_ref(), &session, json!({ "car": car, "can_edit": can_edit })))
}

pub async fn my_cars(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
) -> Result<Response, AppError> {
    let cars = car_service::my_cars(&state.db, user.0.id).await?;
    Ok(page("garage/user_cars.html", Some(&user.0), &session, json!({ "car_list": cars })))
}

pub async fn order_list(
    State(state): State<ServerState>,
    MaybeUser(user): MaybeUser,
    session: Session,
    Query(q): Query<ListQuery>,
) -> Result<Response, AppError> {
    let orders = order_service::list_orders(&state.db, q.query.as_deref(), q.page.as_deref(), today()).await?;
    Ok(page("garage/order_list.html", user.as_ref(), &session, json!({ "order_list": orders, "query": q.query })))
}

pub async fn my_orders(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Query(q): Query<ListQuery>,
) -> Result<Response, AppError> {
    let orders = order_service::my_orders(&state.db, user.0.id, q.query.as_deref(), q.page.as_deref(), today()).await?;
    Ok(page("garage/user_orders.html", Some(&user.0), &session, json!({ "order_list": orders, "query": q.query })))
}

async fn order_detail_context(state: &ServerState, id: Uuid, form: &ReviewForm) -> Result<serde_json::Value, AppError> {
    let detail = order_service::get_order(&state.db, id, today()).await?;
    Ok(json!({
        "order": detail.order,
        "entries": detail.entries,
        "reviews": detail.reviews,
        "form": form,
    }))
}

pub async fn order_detail(
    State(state): State<ServerState>,
    MaybeUser(user): MaybeUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "order")?;
    let ctx = order_detail_context(&state, id, &ReviewForm::default()).await?;
    Ok(page("garage/order_detail.html", user.as_ref(), &session, ctx))
}

/// Review submission on the order page. Order and reviewer come from the
/// URL and the session, never from the form.
pub async fn order_review(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "order")?;
    match review_service::add_review(&state.db, &user.requester(), id, &form).await {
        Ok(_) => {
            session.notify("Review posted.");
            Ok(redirect(&format!("/order/{}/", id)))
        }
        Err(ServiceError::Invalid(errs)) => {
            let ctx = order_detail_context(&state, id, &form).await?;
            Ok(invalid_form("garage/order_detail.html", Some(&user.0), &session, ctx, &errs))
        }
        Err(e) => Err(e.into()),
    }
}

async fn order_form_context(
    state: &ServerState,
    user: &user::Model,
    preselect: Option<Uuid>,
    submitted: Option<&OrderForm>,
) -> Result<serde_json::Value, AppError> {
    let form = order_service::order_form(&state.db, &policy::Requester::from(user), preselect, today()).await?;
    Ok(json!({ "form": form, "submitted": submitted }))
}

pub async fn order_create_form(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Query(q): Query<CreateOrderQuery>,
) -> Result<Response, AppError> {
    let preselect = match q.car_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_id(raw, "car")?),
    };
    let ctx = order_form_context(&state, &user.0, preselect, None).await?;
    Ok(page("garage/order_form.html", Some(&user.0), &session, ctx))
}

pub async fn order_create(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Form(form): Form<OrderForm>,
) -> Result<Response, AppError> {
    match order_service::create_order(&state.db, &user.requester(), &form, today()).await {
        Ok(_) => {
            session.notify("Order created.");
            Ok(redirect("/orders/my/"))
        }
        Err(ServiceError::Invalid(errs)) => {
            let ctx = order_form_context(&state, &user.0, None, Some(&form)).await?;
            Ok(invalid_form("garage/order_form.html", Some(&user.0), &session, ctx, &errs))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn order_update_form(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (order, car) = order_service::find_order(&state.db, parse_id(&id, "order")?).await?;
    policy::can_modify_order(&user.requester(), &car)?;
    let mut ctx = order_form_context(&state, &user.0, Some(car.id), None).await?;
    ctx["order"] = json!(order);
    Ok(page("garage/order_form.html", Some(&user.0), &session, ctx))
}

pub async fn order_update(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OrderForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "order")?;
    match order_service::update_order(&state.db, &user.requester(), id, &form).await {
        Ok(_) => {
            session.notify("Order updated.");
            Ok(redirect(&format!("/order/{}/", id)))
        }
        Err(ServiceError::Invalid(errs)) => {
            let ctx = order_form_context(&state, &user.0, None, Some(&form)).await?;
            Ok(invalid_form("garage/order_form.html", Some(&user.0), &session, ctx, &errs))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn order_delete_confirm(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (order, car) = order_service::find_order(&state.db, parse_id(&id, "order")?).await?;
    policy::can_modify_order(&user.requester(), &car)?;
    Ok(page("garage/order_delete.html", Some(&user.0), &session, json!({ "order": order, "car": car })))
}

pub async fn order_delete(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    order_service::delete_order(&state.db, &user.requester(), parse_id(&id, "order")?).await?;
    session.notify("Order deleted.");
    Ok(redirect("/orders/my/"))
}

async fn car_form_context(state: &ServerState, form: &CarForm) -> Result<serde_json::Value, AppError> {
    let choices = car_service::car_model_choices(&state.db).await?;
    Ok(json!({ "form": form, "car_model_choices": choices }))
}

pub async fn car_create_form(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
) -> Result<Response, AppError> {
    let ctx = car_form_context(&state, &CarForm::default()).await?;
    Ok(page("garage/car_form.html", Some(&user.0), &session, ctx))
}

pub async fn car_create(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Form(form): Form<CarForm>,
) -> Result<Response, AppError> {
    match car_service::create_car(&state.db, &user.requester(), &form).await {
        Ok(car) => {
            session.notify(format!("Car {} created.", car.plate_nr));
            Ok(redirect(&format!("/car/{}/", car.id)))
        }
        Err(ServiceError::Invalid(errs)) => {
            let ctx = car_form_context(&state, &form).await?;
            Ok(invalid_form("garage/car_form.html", Some(&user.0), &session, ctx, &errs))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn car_update_form(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let car = car_service::find_car(&state.db, parse_id(&id, "car")?).await?;
    policy::can_modify_car(&user.requester(), &car)?;
    let current = CarForm {
        plate_nr: car.plate_nr.clone(),
        vin: car.vin.clone(),
        notes: car.notes.clone(),
        car_model: car.car_model_id.map(|id| id.to_string()),
    };
    let mut ctx = car_form_context(&state, &current).await?;
    ctx["car"] = json!(car);
    Ok(page("garage/car_form.html", Some(&user.0), &session, ctx))
}

pub async fn car_update(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CarForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "car")?;
    match car_service::update_car(&state.db, &user.requester(), id, &form).await {
        Ok(car) => {
            session.notify(format!("Car {} updated.", car.plate_nr));
            Ok(redirect(&format!("/car/{}/", car.id)))
        }
        Err(ServiceError::Invalid(errs)) => {
            let ctx = car_form_context(&state, &form).await?;
            Ok(invalid_form("garage/car_form.html", Some(&user.0), &session, ctx, &errs))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn car_delete_confirm(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let car = car_service::find_car(&state.db, parse_id(&id, "car")?).await?;
    policy::can_modify_car(&user.requester(), &car)?;
    Ok(page("garage/car_delete.html", Some(&user.0), &session, json!({ "car": car })))
}

pub async fn car_delete(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    car_service::delete_car(&state.db, &user.requester(), parse_id(&id, "car")?).await?;
    session.notify("Car deleted.");
    Ok(redirect("/cars/my/"))
}

/// Multipart upload of a car's cover image, field `cover`.
pub async fn car_cover_upload(
    State(state): State<ServerState>,
    user: RequireUser,
    session: Session,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "car")?;
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(json!({ "error": e.to_string() })))?
    {
        if field.name() != Some("cover") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(json!({ "error": e.to_string() })))?;
        upload = Some((file_name, bytes.to_vec()));
    }
    let Some((file_name, bytes)) = upload else {
        return Err(ServiceError::Invalid(FormErrors::single("cover", "No file was submitted.")).into());
    };
    let car = car_service::save_cover(&state.db, &state.media_dir, &user.requester(), id, &file_name, &bytes).await?;
    session.notify("Cover uploaded.");
    Ok(redirect(&format!("/car/{}/", car.id)))
}
