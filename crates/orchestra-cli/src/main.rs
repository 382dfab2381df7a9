mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, error, info};
use orchestra_extension::kernel::constants::SETTINGS_FILE_NAME;
use orchestra_extension::{Application, KernelError, RequestFacts, Settings};

/// Orchestra: discover, activate and route application extensions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Settings file (JSON, YAML or TOML); defaults to `orchestra.toml` in the
    /// base directory when present
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Installation root, overriding the settings file
    #[arg(long, global = true)]
    base: Option<PathBuf>,

    /// Application directory, overriding the settings file
    #[arg(long, global = true)]
    app: Option<PathBuf>,

    /// Operating mode (`normal` or `safe`)
    #[arg(long, global = true)]
    mode: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the search paths and refresh the available extension list
    Detect {
        /// Print the detected manifests as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available extensions with their activation state
    List {},
    /// Activate an available extension (persisted)
    Activate {
        /// Extension name (`app` or `vendor/package`)
        name: String,
    },
    /// Deactivate an extension (persisted)
    Deactivate {
        /// Extension name (`app` or `vendor/package`)
        name: String,
    },
    /// Check whether an extension's public assets can be published
    Permission {
        /// Extension name (`app` or `vendor/package`)
        name: String,
    },
    /// Resolve the route handle of an extension
    Route {
        /// Extension name (`app` or `vendor/package`)
        name: String,
        /// Handle used when the extension configures none
        #[arg(long = "default")]
        default_handle: Option<String>,
        /// Root URL of the request, defaulting to the configured one
        #[arg(long)]
        root: Option<String>,
        /// Request path relative to the root
        #[arg(long, default_value = "")]
        path: String,
        /// Check the request path against this pattern
        #[arg(long)]
        pattern: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    cli::init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<ExitCode, KernelError> {
    let settings = load_settings(&args)?;

    let request = match &args.command {
        Commands::Route { root, path, .. } => {
            RequestFacts::new(root.as_deref().unwrap_or(&settings.root_url), path)
        }
        _ => RequestFacts::new(&settings.root_url, ""),
    };
    let mut app = Application::new(settings, request)?;

    let code = match args.command {
        Commands::Detect { json } => {
            let extensions = app.catalog().detect()?;
            if json {
                println!("{}", cli::extensions_json(&extensions));
            } else {
                cli::print_extensions(&extensions);
            }
            ExitCode::SUCCESS
        }
        Commands::List {} => {
            cli::print_available(app.catalog(), app.memory().as_ref());
            ExitCode::SUCCESS
        }
        Commands::Activate { name } => {
            info!("Activating extension '{}'", name);
            app.catalog_mut().activate(&name)?;
            println!("Extension '{}' activated.", name);
            ExitCode::SUCCESS
        }
        Commands::Deactivate { name } => {
            if app.catalog_mut().deactivate(&name)? {
                println!("Extension '{}' deactivated.", name);
                ExitCode::SUCCESS
            } else {
                eprintln!("Extension '{}' is not active.", name);
                ExitCode::FAILURE
            }
        }
        Commands::Permission { name } => {
            if app.catalog().permission(&name) {
                println!("Assets of '{}' can be published.", name);
                ExitCode::SUCCESS
            } else {
                println!("Asset target of '{}' is not writable.", name);
                ExitCode::FAILURE
            }
        }
        Commands::Route {
            name,
            default_handle,
            pattern,
            ..
        } => {
            let default_handle = default_handle.unwrap_or_else(|| name.clone());
            let route = app.catalog_mut().route(&name, &default_handle)?;
            cli::print_route(&name, route, pattern.as_deref());
            ExitCode::SUCCESS
        }
    };

    app.terminate();
    Ok(code)
}

/// Settings from `--config`, else `orchestra.toml` below the base directory,
/// else defaults; command-line overrides are applied last
fn load_settings(args: &CliArgs) -> Result<Settings, KernelError> {
    let base = args.base.clone().unwrap_or_else(|| PathBuf::from("."));
    let default_file = base.join(SETTINGS_FILE_NAME);

    let mut settings = match &args.config {
        Some(file) => Settings::load(file)?,
        None if default_file.is_file() => Settings::load(&default_file)?,
        None => Settings::with_base(&base),
    };

    if let Some(base) = &args.base {
        settings.base_path = base.clone();
    }
    if let Some(app) = &args.app {
        settings.app_path = Some(absolute_from_cwd(app));
    }
    if let Some(mode) = &args.mode {
        settings.mode = Some(mode.clone());
    }

    debug!("Effective settings: {:?}", settings);
    Ok(settings)
}

fn absolute_from_cwd(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
