use crate::builder::{build_module, BuildEnvironment, Diagnostic};
use crate::echo::static_catalog;
use crate::generator::{generate, GeneratedSource, NamingStrategy};
use crate::hot_reload::watch_spec;
use crate::live::LiveApi;
use crate::runtime_config::AppConfig;
use crate::server::{HttpServer, LiveService, ServerHandle, UploadStore};
use crate::spec::load_spec;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line interface for liveroute
#[derive(Parser, Debug)]
#[command(name = "liveroute", version)]
#[command(about = "Serve OpenAPI documents as runtime-generated handlers", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "LIVEROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server, optionally activating a specification at startup
    Serve {
        /// Specification to generate and activate before accepting requests
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Watch the specification and re-activate it on change
        #[arg(long, default_value_t = false, requires = "spec")]
        watch: bool,

        /// Address and port to bind the server to (overrides the config file)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Print the handler module generated for a specification
    Generate {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Write the module here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Naming strategy: `path` or `operation-id`
        #[arg(long)]
        naming: Option<NamingStrategy>,
    },
    /// Generate and build a specification without activating it
    Check {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Treat operation name collisions as errors
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

/// Outcome of `check`: generated groups plus every warning.
#[derive(Debug)]
pub struct CheckReport {
    pub groups: Vec<String>,
    pub warnings: Vec<String>,
}

/// Generate handler source for the document at `spec`.
pub fn generate_source(spec: &Path, config: &AppConfig) -> Result<GeneratedSource> {
    let doc = load_spec(spec).with_context(|| format!("failed to load {}", spec.display()))?;
    generate(&doc, &config.generator).context("handler generation failed")
}

/// Generate and build the document at `spec` without touching any live state.
///
/// # Errors
///
/// Fails on parse or generation errors, or when the build reports errors. Build
/// diagnostics are included in the error message.
pub fn check_spec(spec: &Path, config: &AppConfig) -> Result<CheckReport> {
    let source = generate_source(spec, config)?;
    let mut warnings: Vec<String> = source.warnings().iter().map(ToString::to_string).collect();
    match build_module(&source, &BuildEnvironment::default()) {
        Ok(module) => {
            warnings.extend(module.warnings().iter().map(Diagnostic::to_string));
            Ok(CheckReport {
                groups: module.group_names(),
                warnings,
            })
        }
        Err(failure) => {
            let lines: Vec<String> = failure.diagnostics.iter().map(ToString::to_string).collect();
            bail!("{failure}\n{}", lines.join("\n"))
        }
    }
}

/// Start the HTTP service described by `config` and return its handle.
pub fn start_server(
    config: &AppConfig,
    spec: Option<&Path>,
    watch: bool,
) -> Result<(ServerHandle, Option<notify::RecommendedWatcher>)> {
    may::config().set_stack_size(config.server.stack_size);

    let api = Arc::new(LiveApi::new(config.generator.clone(), static_catalog()));
    if let Some(path) = spec {
        let doc = load_spec(path).with_context(|| format!("failed to load {}", path.display()))?;
        let report = api
            .generate_and_activate(&doc)
            .with_context(|| format!("failed to activate {}", path.display()))?;
        info!(path = %path.display(), version = report.version, groups = ?report.groups, "Initial specification activated");
    }

    let watcher = match (watch, spec) {
        (true, Some(path)) => Some(
            watch_spec(path, Arc::clone(&api))
                .with_context(|| format!("failed to watch {}", path.display()))?,
        ),
        (true, None) => {
            warn!("--watch ignored: no specification given");
            None
        }
        _ => None,
    };

    let uploads = config.uploads.dir.clone().map(UploadStore::new);
    let service = LiveService::new(api, &config.server.api_prefix, uploads);
    let handle = HttpServer(service)
        .start(config.server.addr.as_str())
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    info!(
        addr = %handle.addr(),
        api_prefix = %config.server.api_prefix,
        stack_size = config.server.stack_size,
        "liveroute listening"
    );
    Ok((handle, watcher))
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal = signal, "Shutting down");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server terminated abnormally: {e:?}"))
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if configuration or the specification cannot be loaded, generation
/// or the build fails, or the server cannot start.
pub fn run_cli(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve { spec, watch, addr } => {
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            let (handle, _watcher) = start_server(&config, spec.as_deref(), watch)?;
            wait_for_shutdown(handle)
        }
        Commands::Generate {
            spec,
            output,
            naming,
        } => {
            if let Some(naming) = naming {
                config.generator.naming = naming;
            }
            let source = generate_source(&spec, &config)?;
            for w in source.warnings() {
                eprintln!("warning: {w}");
            }
            match output {
                Some(path) => std::fs::write(&path, source.text())
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", source.text()),
            }
            Ok(())
        }
        Commands::Check { spec, strict } => {
            config.generator.strict_collisions |= strict;
            let report = check_spec(&spec, &config)?;
            for w in &report.warnings {
                eprintln!("warning: {w}");
            }
            println!(
                "ok: {} handler group(s): {}",
                report.groups.len(),
                report.groups.join(", ")
            );
            Ok(())
        }
    }
}
