use tracing_subscriber::fmt::init;

use annotation_api::{config::Config, services::connect_annotation_store};

/// Connects to the configured annotation store, pings it and reports the result
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::load()?;
    let store = match connect_annotation_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            println!("Connection failed: {e}");
            return Err(e);
        }
    };

    match store.ping().await {
        Ok(()) => {
            println!(
                "Connection successful ({} backend, database: {})",
                store.backend_name(),
                config.mongo_database
            );
            Ok(())
        }
        Err(e) => {
            println!("Connection failed: {e}");
            Err(e.into())
        }
    }
}
