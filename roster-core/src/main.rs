//! `roster` - print one roster page, or export a registration range
//!
//! ```text
//! roster                          first page of the roster
//! roster <term>                   first page matching <term>
//! roster export <from> <to>       rows registered between DD-MM-YYYY dates
//! ```
//!
//! Signs in with `ROSTER_EMAIL` / `ROSTER_PASSWORD` when both are set.

use std::sync::Arc;

use anyhow::Context;
use roster_client::{BackendClient, ClientConfig};
use roster_core::services::EXPORT_HEADERS;
use roster_core::utils::time::{self, parse_display_date};
use roster_core::{AuthContext, Config, MemberExporter, RosterController, init_logger_with_file};
use shared::backend::{AuthProvider, BlobStore, RowStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration and logging
    let config = Config::load().context("invalid configuration")?;
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );
    tracing::info!(backend = %config.backend_url, env = %config.environment, "Roster starting");

    // 2. Backend collaborators
    let client_config = ClientConfig::new(&config.backend_url)
        .with_api_key(&config.api_key)
        .with_timeout(config.request_timeout())
        .with_bucket(&config.photo_bucket)
        .with_admin_table(&config.admin_table);
    let client = BackendClient::new(&client_config).context("failed to build backend client")?;
    let rows: Arc<dyn RowStore> = client.row_store();
    let blobs: Arc<dyn BlobStore> = client.blob_store();
    let provider: Arc<dyn AuthProvider> = client.auth_provider();

    // 3. Session
    let auth = Arc::new(AuthContext::new(provider));
    match (std::env::var("ROSTER_EMAIL"), std::env::var("ROSTER_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            auth.sign_in(&email, &password).await.context("sign-in failed")?;
        }
        _ => {
            auth.refresh().await.context("session check failed")?;
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("export") => export(&config, rows, auth, &args[1..]).await,
        _ => show(&config, rows, blobs, auth, &args.join(" ")).await,
    }
}

async fn show(
    config: &Config,
    rows: Arc<dyn RowStore>,
    blobs: Arc<dyn BlobStore>,
    auth: Arc<AuthContext>,
    term: &str,
) -> anyhow::Result<()> {
    let roster = RosterController::from_config(config, rows, blobs, auth);
    roster.search(term).await?;
    let state = roster.snapshot();

    let page = &state.page;
    println!(
        "Page {}/{} ({} members)",
        page.page,
        page.total_pages(),
        page.total_count
    );
    for member in &page.items {
        println!(
            "  {:<32} {:<16} {}",
            member.full_name,
            member.phone.as_deref().unwrap_or("-"),
            member.display_age()
        );
    }

    if !state.birthdays.is_empty() {
        println!("Upcoming birthdays:");
        for member in &state.birthdays {
            println!(
                "  {} ({})",
                member.full_name,
                time::to_display_format(member.birthday.as_deref())
            );
        }
    }

    roster.shutdown();
    Ok(())
}

async fn export(
    config: &Config,
    rows: Arc<dyn RowStore>,
    auth: Arc<AuthContext>,
    args: &[String],
) -> anyhow::Result<()> {
    let [from, to] = args else {
        anyhow::bail!("usage: roster export <DD-MM-YYYY> <DD-MM-YYYY>");
    };
    let start = parse_display_date(from).context("invalid start date")?;
    let end = parse_display_date(to).context("invalid end date")?;

    let exporter = MemberExporter::new(rows, &config.member_table, auth, config.tz());
    let exported = exporter.export(start, end).await?;

    println!("{}", EXPORT_HEADERS.join("\t"));
    for row in &exported {
        println!("{}", row.cells().join("\t"));
    }
    tracing::info!(count = exported.len(), "Export finished");
    Ok(())
}
