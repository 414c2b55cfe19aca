//! Pantry server: reads settings from the environment (and `.env`), loads the model catalog,
//! creates missing tables, and serves the CRUD API until Ctrl-C.
//!
//! Run from repo root: `cargo run -p pantry-server`

use pantry::{app, builtin, ensure_tables, init_tracing, Catalog, Database, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    init_tracing(&settings);

    let catalog = match &settings.models_path {
        Some(path) => Catalog::from_json_file(path).await?,
        None => builtin(),
    };
    let db = Database::connect(&settings).await?;
    ensure_tables(&db, &catalog).await?;

    let router = app(&catalog, db.clone(), &settings);
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("pantry listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    db.close().await;
    Ok(())
}
