//! Grant staff rights to an existing account: `promote_staff <username>`.
//! Pass `--revoke` after the username to take them away again.

use dotenvy::dotenv;
use tracing::{error, info};

fn parse_args() -> anyhow::Result<(String, bool)> {
    let mut args = std::env::args().skip(1);
    let username = args
        .next()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("usage: promote_staff <username> [--revoke]"))?;
    let is_staff = match args.next().as_deref() {
        None => true,
        Some("--revoke") => false,
        Some(other) => anyhow::bail!("unexpected argument: {}", other),
    };
    Ok((username, is_staff))
}

async fn promote(username: &str, is_staff: bool) -> anyhow::Result<models::user::Model> {
    let mut db_cfg = configs::load_default().map(|c| c.database).unwrap_or_default();
    db_cfg.normalize_from_env();
    db_cfg.validate()?;
    let db = models::db::connect_with_config(&db_cfg).await?;
    let user = service::user_service::set_staff_by_username(&db, username, is_staff).await?;
    Ok(user)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenv().ok();
    common::utils::logging::init_logging_default();

    let (username, is_staff) = match parse_args() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    match promote(&username, is_staff).await {
        Ok(user) => {
            info!(event = "staff_flag_set", username = %user.username, is_staff = user.is_staff, "staff rights updated");
            println!("{}: is_staff = {}", user.username, user.is_staff);
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(event = "staff_flag_failed", username = %username, error = %e, "could not update staff rights");
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
