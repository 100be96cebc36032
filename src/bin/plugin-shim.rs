//! plugin-shim CLI
//!
//! Transforms plugin sources so they run against host-provided globals, and
//! prepares them for the external bundler.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use plugin_runtime_shim::{
    build_plugin, build_plugins, load_plugin_configs, transform_plugin_source, write_artifact,
    BundleDescriptor, CompileError, HostBindingMap, PluginBuildConfig, TransformConfig,
    TransformOptions,
};

#[derive(Parser)]
#[command(name = "plugin-shim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform one file and print the result
    Transform {
        /// Source file
        file: PathBuf,

        /// plugin.json to take host bindings from
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extra host binding, as specifier=global.path (repeatable)
        #[arg(short, long, value_name = "SPEC=PATH")]
        binding: Vec<String>,

        /// Print the transform report as JSON instead of the code
        #[arg(long)]
        report: bool,
    },

    /// Print the bundle descriptor for a plugin
    Describe {
        /// plugin.json
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Build one plugin, or every plugin under a directory
    Build {
        /// plugin.json
        #[arg(short, long, conflicts_with = "plugins_dir")]
        config: Option<PathBuf>,

        /// Directory to discover plugin.json files in
        #[arg(long)]
        plugins_dir: Option<PathBuf>,

        /// Override the configured output directory (single plugin only)
        #[arg(short, long, requires = "config")]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(code = e.code(), "{}", e);
            ExitCode::from(2)
        }
    }
}

/// `Ok(false)` when some plugin failed but the run itself completed.
fn run(cli: Cli) -> Result<bool, CompileError> {
    match cli.command {
        Commands::Transform {
            file,
            config,
            binding,
            report,
        } => run_transform(file, config, &binding, report).map(|_| true),
        Commands::Describe { config } => run_describe(config).map(|_| true),
        Commands::Build {
            config,
            plugins_dir,
            out_dir,
        } => run_build(config, plugins_dir, out_dir),
    }
}

fn parse_binding(arg: &str) -> Result<(String, String), CompileError> {
    let (specifier, path) = arg.split_once('=').ok_or_else(|| {
        CompileError::Config(format!("binding \"{}\" is not SPEC=PATH", arg))
    })?;
    Ok((specifier.to_string(), path.to_string()))
}

fn run_transform(
    file: PathBuf,
    config: Option<PathBuf>,
    bindings: &[String],
    report: bool,
) -> Result<(), CompileError> {
    let mut extra = HostBindingMap::new();
    for arg in bindings {
        let (specifier, path) = parse_binding(arg)?;
        extra = extra.bind(&specifier, &path)?;
    }

    let transform = match &config {
        Some(path) => PluginBuildConfig::from_file(path)?.transform,
        None => TransformConfig::default(),
    };
    let options = TransformOptions::try_from(&transform.with_extra_bindings(&extra))?;

    if options.host_bindings.is_empty() {
        warn!("no host bindings configured; output only reflects markup lowering");
    }

    let source = std::fs::read_to_string(&file).map_err(|e| CompileError::Io {
        path: file.clone(),
        source: e,
    })?;
    let output = transform_plugin_source(&source, &file.to_string_lossy(), &options)?;

    if report {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        print!("{}", output.code);
    }
    Ok(())
}

fn run_describe(config: PathBuf) -> Result<(), CompileError> {
    let config = PluginBuildConfig::from_file(&config)?;
    println!("{}", BundleDescriptor::from_config(&config).to_json()?);
    Ok(())
}

fn run_build(
    config: Option<PathBuf>,
    plugins_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<bool, CompileError> {
    if let Some(path) = config {
        let config = PluginBuildConfig::from_file(&path)?;
        let artifact = build_plugin(&config)?;
        let out_dir = out_dir.unwrap_or_else(|| config.out_dir.clone());
        let descriptor = write_artifact(&artifact, &out_dir)?;
        info!(descriptor = %descriptor.display(), "build complete");
        return Ok(true);
    }

    let Some(dir) = plugins_dir else {
        return Err(CompileError::Config(
            "either --config or --plugins-dir is required".to_string(),
        ));
    };

    let mut ok = true;
    let mut configs = Vec::new();
    for (path, loaded) in load_plugin_configs(&dir) {
        match loaded {
            Ok(config) => configs.push(config),
            Err(e) => {
                error!(config = %path.display(), code = e.code(), "{}", e);
                ok = false;
            }
        }
    }

    if configs.is_empty() {
        warn!(dir = %dir.display(), "no plugin.json found");
        return Ok(ok);
    }

    for (config, result) in configs.iter().zip(build_plugins(&configs)) {
        match result.and_then(|artifact| write_artifact(&artifact, &config.out_dir)) {
            Ok(descriptor) => info!(descriptor = %descriptor.display(), "build complete"),
            Err(e) => {
                error!(entry = %config.entry.display(), code = e.code(), "{}", e);
                ok = false;
            }
        }
    }

    info!(plugins = configs.len(), failed = !ok, "all builds finished");
    Ok(ok)
}
