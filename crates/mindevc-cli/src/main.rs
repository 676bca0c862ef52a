use std::{env, path::PathBuf, sync::Arc};

use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use mindevc_config::{arch::Architecture, config::Config};
use mindevc_core::{
    error::ErrorContext,
    pipeline::{PipelineOutcome, ToolPipeline},
    MindevcResult,
};
use mindevc_dl::{error::DownloadError, http_client::configure_http_client};
use mindevc_events::EventSinkHandle;
use mindevc_utils::path::resolve_path;
use nu_ansi_term::Color::{Blue, Cyan, Yellow};
use sink::LogSink;
use tracing::{debug, info, warn};
use ureq::Proxy;
use utils::{disable_color, parse_headers, Colored};

mod cli;
mod logging;
mod sink;
mod utils;

fn absolute(path: &str) -> MindevcResult<PathBuf> {
    let path = resolve_path(path)?;
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()
            .with_context(|| "retrieving current directory".into())?
            .join(path))
    }
}

fn setup_http_client(args: &Args) -> MindevcResult<()> {
    let proxy = args
        .proxy
        .as_deref()
        .map(Proxy::new)
        .transpose()
        .map_err(DownloadError::from)?;
    let headers = args.header.as_deref().map(parse_headers).transpose()?;
    let user_agent = args.user_agent.clone();

    configure_http_client(|config| {
        if proxy.is_some() {
            config.proxy = proxy;
        }
        if user_agent.is_some() {
            config.user_agent = user_agent;
        }
        if headers.is_some() {
            config.headers = headers;
        }
    });

    Ok(())
}

fn load_config(args: &Args) -> MindevcResult<Config> {
    let explicit = args.config.as_deref().map(absolute).transpose()?;
    let config = Config::load(explicit.as_deref())?;
    match &config.source {
        Some(path) => debug!("loaded config from {}", path.display()),
        None => debug!("using built-in config"),
    }
    Ok(config)
}

fn print_summary(outcome: &PipelineOutcome) {
    for tool in &outcome.installed {
        info!(
            "{} {}",
            Colored(Blue, &tool.name),
            Colored(Cyan, tool.extraction.artifact.display())
        );
    }
    for tool in &outcome.skipped {
        warn!(
            "{} {}: {}",
            Colored(Yellow, "Skipped"),
            Colored(Blue, &tool.name),
            tool.reason
        );
    }
    info!(
        "{} installed, {} skipped",
        outcome.installed.len(),
        outcome.skipped.len()
    );
}

fn install_tools(
    config: &Config,
    tools: Vec<String>,
    arch: Option<String>,
    cache_dir: Option<String>,
) -> MindevcResult<()> {
    let tools = if tools.is_empty() {
        config.install_tools.clone()
    } else {
        tools
    };
    let arch = arch.map(Architecture::from).unwrap_or_else(Architecture::host);
    let cache_dir = match cache_dir {
        Some(dir) => absolute(&dir)?,
        None => config.cache_dir()?,
    };
    debug!("cache directory: {}", cache_dir.display());

    let events: EventSinkHandle = Arc::new(LogSink);
    let pipeline = ToolPipeline::new(cache_dir, arch, events);
    let outcome = pipeline.run(&tools, &config.tools)?;
    print_summary(&outcome);

    Ok(())
}

fn handle_cli() -> MindevcResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        disable_color();
    }

    setup_http_client(&args)?;

    match args.command {
        Commands::DefaultConfig => {
            print!("{}", Config::default_config().to_toml()?);
        }
        Commands::Config => {
            print!("{}", load_config(&args)?.to_toml()?);
        }
        Commands::Tools {
            ref tools,
            ref arch,
            ref cache_dir,
        } => {
            let config = load_config(&args)?;
            install_tools(&config, tools.clone(), arch.clone(), cache_dir.clone())?;
        }
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
