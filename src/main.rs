use clap::Parser;
use graphswap::app::cli::{Args, Command};
use graphswap::app::{commands, startup};
use graphswap::catalog::{CommandLoader, HttpCatalog};
use graphswap::config::Config;
use graphswap::core::error_handling::log_error_with_context;
use graphswap::core::shutdown::{setup_signal_handlers, ShutdownCoordinator};
use graphswap::supervisor::Supervisor;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Signal handlers go in before anything slow so shutdown works for the
    // whole process lifetime
    let (coordinator, _shutdown_rx) = ShutdownCoordinator::new();
    setup_signal_handlers(
        coordinator.shutdown_tx.clone(),
        coordinator.shutdown_requested.clone(),
    );

    let config = match startup::startup(&args).await {
        Ok(config) => config,
        Err(e) => {
            log_error_with_context(&e, "Configuration loading");
            std::process::exit(1);
        }
    };

    let exit_code = match args.command.unwrap_or(Command::Run) {
        Command::Run => run_supervisor(config, &coordinator).await,
        Command::ListAliases => with_catalog(&config, |catalog| async move {
            commands::list_aliases(catalog.as_ref()).await
        })
        .await,
        Command::ListDatabases => with_catalog(&config, |catalog| async move {
            commands::list_databases(catalog.as_ref()).await
        })
        .await,
        Command::Cleanup {
            tenants,
            aliases_only,
            databases_only,
        } => {
            with_catalog(&config, |catalog| async move {
                commands::cleanup(catalog.as_ref(), &tenants, aliases_only, databases_only).await
            })
            .await
        }
        Command::SimulateSnapshot {
            tenant,
            source_timestamp,
        } => match commands::simulate_snapshot(&config.snapshots.root, &tenant, source_timestamp)
        {
            Ok(new_timestamp) => {
                println!(
                    "A running supervisor should pick up {tenant}/{new_timestamp} within {}s",
                    config.supervisor.scan_interval
                );
                0
            }
            Err(e) => {
                log::error!("Could not simulate snapshot: {e}");
                1
            }
        },
    };

    std::process::exit(exit_code);
}

async fn run_supervisor(config: Config, coordinator: &ShutdownCoordinator) -> i32 {
    let catalog = match HttpCatalog::new(&config.server) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            log_error_with_context(&e, "Catalog client construction");
            return 1;
        }
    };
    let loader = Arc::new(CommandLoader::new(&config.loader));

    let supervisor = Supervisor::new(config, catalog.clone(), catalog, loader);
    match supervisor.run(coordinator).await {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, "Supervisor startup");
            1
        }
    }
}

async fn with_catalog<F, Fut>(config: &Config, f: F) -> i32
where
    F: FnOnce(Arc<HttpCatalog>) -> Fut,
    Fut: std::future::Future<Output = Result<(), graphswap::catalog::CatalogError>>,
{
    let catalog = match HttpCatalog::new(&config.server) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            log_error_with_context(&e, "Catalog client construction");
            return 1;
        }
    };

    match f(catalog).await {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, "Catalog operation");
            1
        }
    }
}
