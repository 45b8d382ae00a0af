use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{order, order_review, user};

use crate::errors::ServiceError;
use crate::policy::Requester;

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: order_review::Model,
    pub reviewer: Option<String>,
}

/// Review form. Only `content` is read; the order and reviewer come from the
/// request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub content: String,
}

/// Reviews of an order, newest first.
pub async fn reviews_for(db: &DatabaseConnection, order_id: Uuid) -> Result<Vec<ReviewView>, ServiceError> {
    let rows = order_review::Entity::find()
        .filter(order_review::Column::OrderId.eq(order_id))
        .find_also_related(user::Entity)
        .order_by_desc(order_review::Column::ReviewedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows
        .into_iter()
        .map(|(review, reviewer)| ReviewView { review, reviewer: reviewer.map(|u| u.display_name()) })
        .collect())
}

#[instrument(skip(db, form), fields(user_id = %requester.id))]
pub async fn add_review(
    db: &DatabaseConnection,
    requester: &Requester,
    order_id: Uuid,
    form: &ReviewForm,
) -> Result<order_review::Model, ServiceError> {
    order::Entity::find_by_id(order_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("order"))?;
    let review = order_review::create(db, order_id, requester.id, form.content.trim().to_string()).await?;
    info!(review_id = %review.id, order_id = %order_id, "review_added");
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, seed_order, seed_user};

    #[tokio::test]
    async fn review_is_bound_to_order_and_requester() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let (_owner, _c, o) = seed_order(&db).await?;
        let visitor = seed_user(&db).await?;
        let form = ReviewForm { content: "Quick and tidy".into() };
        let r = add_review(&db, &Requester::from(&visitor), o.id, &form).await?;
        assert_eq!(r.order_id, o.id);
        assert_eq!(r.reviewer_id, Some(visitor.id));

        let second = add_review(&db, &Requester::from(&visitor), o.id, &ReviewForm { content: "Again".into() }).await?;
        let listed = reviews_for(&db, o.id).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].review.id, second.id);
        assert_eq!(listed[0].reviewer.as_deref(), Some("Jonas Petraitis"));
        Ok(())
    }

    #[tokio::test]
    async fn blank_review_is_rejected() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let (owner, _c, o) = seed_order(&db).await?;
        let res = add_review(&db, &Requester::from(&owner), o.id, &ReviewForm::default()).await;
        assert!(matches!(res, Err(ServiceError::Invalid(_))));
        assert!(reviews_for(&db, o.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn review_on_missing_order_is_not_found() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let u = seed_user(&db).await?;
        let res = add_review(&db, &Requester::from(&u), Uuid::new_v4(), &ReviewForm { content: "x".into() }).await;
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
