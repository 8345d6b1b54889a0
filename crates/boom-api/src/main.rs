use boom_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under many concurrent uploads.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Initialize the application (database, storage, background sweep, routes)
    let (_state, router) = boom_api::setup::initialize_app(config.clone()).await?;

    // Start the server; background tasks end with the runtime
    boom_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
