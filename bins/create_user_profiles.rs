//! Give every user without a profile an empty one. Safe to run repeatedly.

use dotenvy::dotenv;
use tracing::{error, info};

async fn provision() -> anyhow::Result<u64> {
    let mut db_cfg = configs::load_default().map(|c| c.database).unwrap_or_default();
    db_cfg.normalize_from_env();
    db_cfg.validate()?;
    let db = models::db::connect_with_config(&db_cfg).await?;
    let created = service::profile_service::provision_missing_profiles(&db).await?;
    Ok(created)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenv().ok();
    common::utils::logging::init_logging_default();

    match provision().await {
        Ok(n) => {
            info!(event = "profiles_provisioned", created = n, "provisioning finished");
            println!("{} user profiles created", n);
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(event = "provision_failed", error = %e, "provisioning aborted");
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
