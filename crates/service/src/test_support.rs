#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use chrono::Utc;
use uuid::Uuid;
use models::db::{connect_with_config, DatabaseConfig};
use models::{car, car_model, order, user};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> Option<DatabaseConfig> {
    let _ = dotenvy::dotenv();
    let mut cfg = configs::load_default().map(|c| c.database).unwrap_or_default();
    cfg.normalize_from_env();
    if cfg.url.trim().is_empty() {
        return None;
    }
    cfg.max_connections = cfg.max_connections.max(10);
    cfg.min_connections = 1;
    cfg.connect_timeout_secs = cfg.connect_timeout_secs.clamp(1, 5);
    cfg.acquire_timeout_secs = cfg.acquire_timeout_secs.clamp(1, 10);
    Some(cfg)
}

/// A migrated connection, or `None` when tests should skip: `SKIP_DB_TESTS`
/// is set, no database is configured, or it cannot be reached.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let cfg = test_config()?;

    // Run migrations exactly once, with a throwaway connection
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match connect_with_config(&cfg).await {
                Ok(db) => match migration::Migrator::up(&db, None).await {
                    Ok(()) => true,
                    Err(e) => {
                        eprintln!("skip: migrate up failed: {}", e);
                        false
                    }
                },
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {}", e);
                    false
                }
            }
        })
        .await;
    if !migrated {
        return None;
    }

    // Return a fresh connection for the current test's runtime
    connect_with_config(&cfg).await.ok()
}

pub async fn seed_user(db: &DatabaseConnection) -> Result<user::Model, anyhow::Error> {
    let u = user::create(db, user::NewUser {
        username: format!("u{}", Uuid::new_v4().simple()),
        first_name: "Jonas".into(),
        last_name: "Petraitis".into(),
        ..Default::default()
    })
    .await?;
    Ok(u)
}

pub async fn seed_car(
    db: &DatabaseConnection,
    owner: &user::Model,
    make: &str,
    model: &str,
) -> Result<car::Model, anyhow::Error> {
    let cm = car_model::create(db, car_model::CarModelInput {
        make: make.into(),
        model: model.into(),
        ..Default::default()
    })
    .await?;
    let c = car::create(db, Some(owner.id), car::CarInput {
        plate_nr: format!("P{}", &Uuid::new_v4().simple().to_string()[..6]),
        vin: format!("V{}", Uuid::new_v4().simple()),
        notes: None,
        car_model_id: Some(cm.id),
    })
    .await?;
    Ok(c)
}

pub async fn seed_order(db: &DatabaseConnection) -> Result<(user::Model, car::Model, order::Model), anyhow::Error> {
    let u = seed_user(db).await?;
    let c = seed_car(db, &u, "Honda", "Civic").await?;
    let o = order::create(db, order::OrderInput { car_id: c.id, due_back: None }, Utc::now().date_naive()).await?;
    Ok((u, c, o))
}
