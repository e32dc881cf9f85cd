use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;

use studiocontroller::cli::{self, Cli, ListenSpec};
use studiocontroller::config::{AppState, Settings};
use studiocontroller::controller::{self, AppContext, ControllerDefinitions, SshRunner};
use studiocontroller::handler::Dispatcher;
use studiocontroller::logger;
use studiocontroller::resources::ResourceLoader;
use studiocontroller::server::{self, ServerError};

const MISSING_CONFIG_HINT: &str = "Error: studiocontroller started without a config file (-c).\n\
Hint. Run with the -g or --generate-dummy-config switches to create a template config file \
in the current directory, edit it, then start again with -c <file>.";

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };
    let settings = Settings::load_from(&cli.settings)?;
    logger::init(&settings)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = settings.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cli, settings))
}

async fn async_main(cli: Cli, settings: Settings) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let resources = Arc::new(ResourceLoader::new(
        settings.http.archive.as_ref().map(PathBuf::from),
        &settings.http.static_root,
        settings.http.index_files.clone(),
    ));

    if cli.generate_dummy_config {
        let path = controller::definitions::generate_template(&resources, Path::new(".")).await?;
        println!("Template config file written to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let Some(config_file) = cli.config_file else {
        eprintln!("{MISSING_CONFIG_HINT}");
        return Ok(ExitCode::FAILURE);
    };

    let definitions = match ControllerDefinitions::load(&config_file) {
        Ok(definitions) => definitions,
        Err(e) => {
            logger::log_error(&format!("Failed to load {}: {e}", config_file.display()));
            return Ok(ExitCode::FAILURE);
        }
    };

    let listen = cli
        .public_http
        .unwrap_or(ListenSpec::Port(settings.server.default_port));
    let addr = listen.resolve(cli::default_listen_ip());
    let listener =
        server::create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;

    let context = Arc::new(AppContext {
        definitions,
        listen_addr: addr,
        resources: Arc::clone(&resources),
        runner: Arc::new(SshRunner::new(settings.ssh.program.clone())),
        ssh_timeout: settings.ssh_timeout(),
    });
    let registry = Arc::new(controller::build_registry(&context));
    let dispatcher = Dispatcher::new(
        registry,
        resources,
        settings.http.error_status,
        format!("{}({})", settings.http.server_name, addr.port()),
    );

    let shutdown_timeout = settings.shutdown_timeout();
    logger::log_server_start(&addr, &settings);
    let state = Arc::new(AppState::new(settings, dispatcher));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    server::start_signal_handler(shutdown_tx)?;
    server::serve(listener, state, shutdown_rx, shutdown_timeout).await?;

    Ok(ExitCode::SUCCESS)
}
