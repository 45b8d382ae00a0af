use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::prelude::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::order::OrderStatus;
use models::order_entry::PricedEntry;
use models::{car, car_model, order, order_entry, pricing, service, user};

use crate::car_service::{self, CarView};
use crate::errors::{FormErrors, ServiceError};
use crate::pagination::{fetch_page, Page};
use crate::policy::{self, Requester};
use crate::review_service::{self, ReviewView};
use crate::search;

pub const ORDERS_PER_PAGE: u64 = 5;
pub const MY_ORDERS_PER_PAGE: u64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

impl From<user::Model> for ClientSummary {
    fn from(u: user::Model) -> Self {
        let display_name = u.display_name();
        Self { id: u.id, username: u.username, first_name: u.first_name, last_name: u.last_name, display_name }
    }
}

/// An order with everything derived from it: car, client, amount, overdue flag.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub status_label: &'static str,
    pub car: CarView,
    pub client: Option<ClientSummary>,
    pub amount: Decimal,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: Uuid,
    pub service: service::Model,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<PricedEntry> for EntryView {
    fn from(p: PricedEntry) -> Self {
        let price = p.price();
        Self { id: p.entry.id, quantity: p.entry.quantity, service: p.service, price }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: OrderView,
    pub entries: Vec<EntryView>,
    pub reviews: Vec<ReviewView>,
}

/// Initial values and car choices for the order form.
#[derive(Debug, Clone, Serialize)]
pub struct OrderFormPage {
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub due_back: NaiveDate,
    pub car: Option<Uuid>,
    pub car_choices: Vec<CarView>,
}

/// Raw order form. A submitted `status` is accepted and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub car: Option<String>,
    #[serde(default)]
    pub due_back: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderForm {
    /// `car` must be one of `allowed_cars`; blank `due_back` stays unset.
    pub fn clean(&self, allowed_cars: &[Uuid]) -> Result<order::OrderInput, ServiceError> {
        let mut errors = FormErrors::new();
        let car_id = match self.car.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("car", "This field is required.");
                None
            }
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) if allowed_cars.contains(&id) => Some(id),
                _ => {
                    errors.add("car", "Select a valid choice. That choice is not one of the available choices.");
                    None
                }
            },
        };
        let due_back = match self.due_back.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.add("due_back", "Enter a valid date.");
                    None
                }
            },
        };
        errors.into_result()?;
        match car_id {
            Some(car_id) => Ok(order::OrderInput { car_id, due_back }),
            None => Err(ServiceError::Invalid(FormErrors::single("car", "This field is required."))),
        }
    }
}

fn listing_select() -> Select<order::Entity> {
    order::Entity::find()
        .join(JoinType::InnerJoin, order::Relation::Car.def())
        .join(JoinType::LeftJoin, car::Relation::CarModel.def())
        .join(JoinType::LeftJoin, car::Relation::Client.def())
        .order_by_asc(order::Column::Date)
        .order_by_asc(order::Column::Id)
}

/// Public order listing, 5 per page, searchable across car, owner and model.
#[instrument(skip(db))]
pub async fn list_orders(
    db: &DatabaseConnection,
    query: Option<&str>,
    page: Option<&str>,
    today: NaiveDate,
) -> Result<Page<OrderView>, ServiceError> {
    let mut select = listing_select();
    if let Some(cond) = search::order_listing().condition(query) {
        select = select.filter(cond);
    }
    let page = fetch_page(db, select, ORDERS_PER_PAGE, page).await?;
    hydrate_page(db, page, today).await
}

/// The requester's orders only, 7 per page. The owner filter applies before
/// the keyword search.
#[instrument(skip(db))]
pub async fn my_orders(
    db: &DatabaseConnection,
    client_id: Uuid,
    query: Option<&str>,
    page: Option<&str>,
    today: NaiveDate,
) -> Result<Page<OrderView>, ServiceError> {
    let mut select = listing_select().filter(car::Column::ClientId.eq(client_id));
    if let Some(cond) = search::order_listing().condition(query) {
        select = select.filter(cond);
    }
    let page = fetch_page(db, select, MY_ORDERS_PER_PAGE, page).await?;
    hydrate_page(db, page, today).await
}

async fn hydrate_page(db: &DatabaseConnection, mut page: Page<order::Model>, today: NaiveDate) -> Result<Page<OrderView>, ServiceError> {
    let orders = std::mem::take(&mut page.items);
    let views = hydrate(db, orders, today).await?;
    Ok(page.replace_items(views))
}

/// Attach car, model, client and amount to each order. Orders whose car
/// disappeared in the meantime are dropped.
pub async fn hydrate(db: &DatabaseConnection, orders: Vec<order::Model>, today: NaiveDate) -> Result<Vec<OrderView>, ServiceError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let car_ids: Vec<Uuid> = orders.iter().map(|o| o.car_id).collect();
    let cars: HashMap<Uuid, (car::Model, Option<car_model::Model>)> = car::Entity::find()
        .filter(car::Column::Id.is_in(car_ids))
        .find_also_related(car_model::Entity)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .into_iter()
        .map(|(c, m)| (c.id, (c, m)))
        .collect();
    let client_ids: Vec<Uuid> = cars.values().filter_map(|(c, _)| c.client_id).collect();
    let clients: HashMap<Uuid, user::Model> = if client_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(client_ids))
            .all(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let amounts = order_amounts(db, &order_ids).await?;

    let mut views = Vec::with_capacity(orders.len());
    for o in orders {
        let Some((c, m)) = cars.get(&o.car_id).cloned() else { continue };
        let client = order::Model::client(&c)
            .and_then(|id| clients.get(&id).cloned())
            .map(ClientSummary::from);
        views.push(OrderView {
            status_label: o.status.label(),
            is_overdue: o.is_overdue(today),
            amount: amounts.get(&o.id).copied().unwrap_or(Decimal::ZERO),
            car: CarView::new(c, m),
            client,
            order: o,
        });
    }
    Ok(views)
}

/// Current entries of an order with their services.
pub async fn load_entries(db: &DatabaseConnection, order_id: Uuid) -> Result<Vec<PricedEntry>, ServiceError> {
    let rows = order_entry::Entity::find()
        .filter(order_entry::Column::OrderId.eq(order_id))
        .find_also_related(service::Entity)
        .order_by_asc(order_entry::Column::Id)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows
        .into_iter()
        .filter_map(|(entry, svc)| svc.map(|service| PricedEntry { entry, service }))
        .collect())
}

/// Order total, re-read from the database on every call.
pub async fn order_amount(db: &DatabaseConnection, order_id: Uuid) -> Result<Decimal, ServiceError> {
    let entries = load_entries(db, order_id).await?;
    Ok(pricing::order_amount(&entries))
}

/// Totals for many orders in one query; orders without entries map to zero.
pub async fn order_amounts(db: &DatabaseConnection, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
    let mut grouped: HashMap<Uuid, Vec<PricedEntry>> = order_ids.iter().map(|id| (*id, Vec::new())).collect();
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = order_entry::Entity::find()
        .filter(order_entry::Column::OrderId.is_in(order_ids.to_vec()))
        .find_also_related(service::Entity)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    for (entry, svc) in rows {
        if let Some(service) = svc {
            grouped.entry(entry.order_id).or_default().push(PricedEntry { entry, service });
        }
    }
    Ok(grouped.into_iter().map(|(id, entries)| (id, pricing::order_amount(&entries))).collect())
}

/// Order and the car it belongs to.
pub async fn find_order(db: &DatabaseConnection, id: Uuid) -> Result<(order::Model, car::Model), ServiceError> {
    let (o, c) = order::Entity::find_by_id(id)
        .find_also_related(car::Entity)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("order"))?;
    let c = c.ok_or_else(|| ServiceError::not_found("car"))?;
    Ok((o, c))
}

#[instrument(skip(db))]
pub async fn get_order(db: &DatabaseConnection, id: Uuid, today: NaiveDate) -> Result<OrderDetail, ServiceError> {
    let (o, _) = find_order(db, id).await?;
    let view = hydrate(db, vec![o], today)
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("order"))?;
    let entries = load_entries(db, id).await?.into_iter().map(EntryView::from).collect();
    let reviews = review_service::reviews_for(db, id).await?;
    Ok(OrderDetail { order: view, entries, reviews })
}

async fn owned_car_ids(db: &DatabaseConnection, client_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
    Ok(car_service::my_cars(db, client_id).await?.into_iter().map(|v| v.car.id).collect())
}

/// Defaults for a new order. A preselected car that is not one of the
/// requester's cars is reported as missing.
pub async fn order_form(
    db: &DatabaseConnection,
    requester: &Requester,
    preselect: Option<Uuid>,
    today: NaiveDate,
) -> Result<OrderFormPage, ServiceError> {
    let car_choices = car_service::my_cars(db, requester.id).await?;
    if let Some(id) = preselect {
        if !car_choices.iter().any(|v| v.car.id == id) {
            return Err(ServiceError::not_found("car"));
        }
    }
    let status = OrderStatus::default();
    Ok(OrderFormPage {
        status,
        status_label: status.label(),
        due_back: order::default_due_back(today),
        car: preselect,
        car_choices,
    })
}

/// New orders start `InRow`, dated today, due back in 14 days unless a date
/// was picked.
#[instrument(skip(db, form), fields(user_id = %requester.id))]
pub async fn create_order(
    db: &DatabaseConnection,
    requester: &Requester,
    form: &OrderForm,
    today: NaiveDate,
) -> Result<order::Model, ServiceError> {
    let allowed = owned_car_ids(db, requester.id).await?;
    let input = form.clean(&allowed)?;
    let created = order::create(db, input, today).await?;
    info!(order_id = %created.id, "order_created");
    Ok(created)
}

#[instrument(skip(db, form), fields(user_id = %requester.id))]
pub async fn update_order(
    db: &DatabaseConnection,
    requester: &Requester,
    id: Uuid,
    form: &OrderForm,
) -> Result<order::Model, ServiceError> {
    let (existing, c) = find_order(db, id).await?;
    policy::can_modify_order(requester, &c)?;
    let allowed = owned_car_ids(db, requester.id).await?;
    let input = form.clean(&allowed)?;
    let updated = order::update(db, existing, input).await?;
    Ok(updated)
}

#[instrument(skip(db), fields(user_id = %requester.id))]
pub async fn delete_order(db: &DatabaseConnection, requester: &Requester, id: Uuid) -> Result<(), ServiceError> {
    let (existing, c) = find_order(db, id).await?;
    policy::can_modify_order(requester, &c)?;
    existing.delete(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(order_id = %id, "order_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::test_support::{get_db, seed_car, seed_order, seed_user};

    #[test]
    fn form_requires_an_allowed_car() {
        let mine = Uuid::new_v4();
        let form = OrderForm { car: Some(Uuid::new_v4().to_string()), ..Default::default() };
        assert!(matches!(form.clean(&[mine]), Err(ServiceError::Invalid(_))));
        let empty = OrderForm::default();
        match empty.clean(&[mine]) {
            Err(ServiceError::Invalid(errs)) => assert!(errs.get("car").is_some()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn form_ignores_status_and_parses_date() {
        let car = Uuid::new_v4();
        let form = OrderForm {
            car: Some(car.to_string()),
            due_back: Some("2024-06-01".into()),
            status: Some("3".into()),
        };
        let input = form.clean(&[car]).unwrap();
        assert_eq!(input.car_id, car);
        assert_eq!(input.due_back, NaiveDate::from_ymd_opt(2024, 6, 1));
        let bad = OrderForm { car: Some(car.to_string()), due_back: Some("01/06/2024".into()), status: None };
        match bad.clean(&[car]) {
            Err(ServiceError::Invalid(errs)) => assert!(errs.get("due_back").is_some()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn amount_tracks_entries_and_prices() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let (_u, _c, o) = seed_order(&db).await?;
        assert_eq!(order_amount(&db, o.id).await?, Decimal::ZERO);

        let oil = service::create(&db, service::ServiceInput { name: "Oil".into(), price: Decimal::new(4500, 2) }).await?;
        let e = order_entry::create(&db, o.id, order_entry::EntryInput { service_id: oil.id, quantity: 2 }).await?;
        assert_eq!(order_amount(&db, o.id).await?, Decimal::new(9000, 2));

        let oil = service::update(&db, oil, service::ServiceInput { name: "Oil".into(), price: Decimal::new(5000, 2) }).await?;
        assert_eq!(order_amount(&db, o.id).await?, Decimal::new(10000, 2));
        let batch = order_amounts(&db, &[o.id]).await?;
        assert_eq!(batch.get(&o.id), Some(&Decimal::new(10000, 2)));

        order_entry::Entity::delete_by_id(e.id).exec(&db).await?;
        assert_eq!(order_amount(&db, o.id).await?, Decimal::ZERO);
        oil.delete(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn new_order_defaults_and_ownership() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let today = Utc::now().date_naive();
        let owner = seed_user(&db).await?;
        let other = seed_user(&db).await?;
        let mine = seed_car(&db, &owner, "Honda", "Civic").await?;
        let theirs = seed_car(&db, &other, "Audi", "A4").await?;
        let me = Requester::from(&owner);

        let page = order_form(&db, &me, Some(mine.id), today).await?;
        assert_eq!(page.status, OrderStatus::InRow);
        assert_eq!(page.due_back, today + Duration::days(14));
        assert_eq!(page.car_choices.len(), 1);
        assert!(matches!(order_form(&db, &me, Some(theirs.id), today).await, Err(ServiceError::NotFound(_))));

        let form = OrderForm { car: Some(theirs.id.to_string()), ..Default::default() };
        assert!(matches!(create_order(&db, &me, &form, today).await, Err(ServiceError::Invalid(_))));

        let form = OrderForm { car: Some(mine.id.to_string()), status: Some("3".into()), ..Default::default() };
        let created = create_order(&db, &me, &form, today).await?;
        assert_eq!(created.status, OrderStatus::InRow);
        assert_eq!(created.date, today);
        assert_eq!(created.due_back, Some(today + Duration::days(14)));

        let intruder = Requester::from(&other);
        assert!(matches!(delete_order(&db, &intruder, created.id).await, Err(ServiceError::Forbidden(_))));
        delete_order(&db, &me, created.id).await?;
        assert!(matches!(find_order(&db, created.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn my_orders_are_scoped_and_searchable() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let today = Utc::now().date_naive();
        let (owner, _c, o) = seed_order(&db).await?;
        let (_other, _c2, _o2) = seed_order(&db).await?;

        let all = my_orders(&db, owner.id, None, None, today).await?;
        assert_eq!(all.total, 1);
        assert_eq!(all.items[0].order.id, o.id);
        assert_eq!(all.per_page, MY_ORDERS_PER_PAGE);

        let civ = my_orders(&db, owner.id, Some("civ"), None, today).await?;
        assert_eq!(civ.total, 1);
        let jonas = my_orders(&db, owner.id, Some("PETRAIT"), None, today).await?;
        assert_eq!(jonas.total, 1);
        let none = my_orders(&db, owner.id, Some("no-such-thing"), None, today).await?;
        assert_eq!(none.total, 0);
        assert_eq!(none.num_pages, 1);

        let public = list_orders(&db, Some("civ"), None, today).await?;
        assert!(public.total >= 2);
        assert_eq!(public.per_page, ORDERS_PER_PAGE);
        Ok(())
    }

    #[tokio::test]
    async fn overdue_flag_in_views() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let (_u, _c, o) = seed_order(&db).await?;
        let due = o.due_back.expect("default due back");
        let on_time = get_order(&db, o.id, due).await?;
        assert!(!on_time.order.is_overdue);
        let late = get_order(&db, o.id, due + Duration::days(1)).await?;
        assert!(late.order.is_overdue);
        assert_eq!(late.order.status_label, "In a Row");
        Ok(())
    }
}
