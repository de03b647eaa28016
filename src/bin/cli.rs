use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use nb_command::catalog::{catalog_schema, Catalog, MapLocalizer};
use nb_command::choices::{ChoiceProvider, StaticChoices};
use nb_command::error::AppError;
use nb_command::render::{missing_required, render};
use nb_command::session::Session;
use nb_command::settings::{self, ClientSettings};
use nb_command::store::ParameterStore;
use nb_command::{paths, Command, Outcome};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "nb-command", about = "Build and send admin commands to a game server", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Command catalog file (JSON). Defaults to the saved setting, then the built-in catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List commands grouped by category
    List,
    /// Show usage and parameters of one command
    Describe { command: String },
    /// Render a command line without sending it
    Preview {
        command: String,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Render a command line and send it to the server
    Send {
        command: String,
        #[command(flatten)]
        params: ParamArgs,
        /// Target player uid (overrides the saved uid)
        #[arg(long)]
        uid: Option<String>,
        /// Send even if required fields are empty
        #[arg(long)]
        force: bool,
    },
    /// Send a hand-written command line as-is
    Raw {
        text: String,
        #[arg(long)]
        uid: Option<String>,
    },
    /// List selectable tokens for a field from a choice file
    Choices {
        field: String,
        /// Choice data file (JSON: field -> [{token, type}])
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "type")]
        type_filter: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    /// Print the JSON schema of catalog files
    Schema,
    /// Show or change connection settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct ParamArgs {
    /// Scalar value: key=value
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
    /// Multi-select entry: key=token
    #[arg(long = "add", value_name = "KEY=TOKEN")]
    add: Vec<String>,
    /// Counted entry: key=token:count (repeat to accumulate)
    #[arg(long = "count", value_name = "KEY=TOKEN:N")]
    count: Vec<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print current settings (token masked)
    Show,
    /// Update settings
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        uid: Option<String>,
        #[arg(long)]
        connect_timeout: Option<u64>,
        #[arg(long)]
        request_timeout: Option<u64>,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

// ── Helpers ──────────────────────────────────────────────────────

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {e}");
    process::exit(1);
}

/// `--catalog`, then the saved catalog path, then `commands.json` in the config
/// dir, then the built-in catalog.
fn load_catalog(cli_path: Option<&Path>, settings: &ClientSettings, config_dir: &Path) -> Catalog {
    let path = cli_path
        .map(Path::to_path_buf)
        .or_else(|| settings.catalog_path.clone())
        .or_else(|| paths::user_catalog(config_dir));
    let result = match path.as_deref() {
        Some(p) => Catalog::load(p, &MapLocalizer::english()),
        None => Catalog::builtin(),
    };
    result.unwrap_or_else(|e| fail(e))
}

fn split_key<'a>(arg: &'a str, flag: &str) -> Result<(&'a str, &'a str), AppError> {
    arg.split_once('=').ok_or_else(|| AppError::ValidationError {
        message: format!("--{flag} expects KEY=..., got '{arg}'"),
    })
}

/// Fill a store from --set / --add / --count arguments, in that order.
fn fill_store(command: &Command, params: &ParamArgs) -> Result<ParameterStore, AppError> {
    let syntax = &command.syntax;
    let mut store = ParameterStore::for_syntax(syntax);
    let check = |key: &str| {
        syntax.field(key).map(|_| ()).ok_or_else(|| AppError::NotFound {
            what: format!("Field '{key}' of command '{}'", command.keyword()),
        })
    };

    for arg in &params.set {
        let (key, value) = split_key(arg, "set")?;
        check(key)?;
        store.set_scalar(key, value);
    }
    for arg in &params.add {
        let (key, token) = split_key(arg, "add")?;
        check(key)?;
        store.add_to_set(key, token);
    }
    for arg in &params.count {
        let (key, rest) = split_key(arg, "count")?;
        check(key)?;
        let (token, n) = rest.rsplit_once(':').unwrap_or((rest, "1"));
        let n: i64 = n.parse().map_err(|_| AppError::ValidationError {
            message: format!("Invalid count in '{arg}'"),
        })?;
        store.increment_multiset(key, token, n);
    }
    Ok(store)
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn report(outcome: &Outcome, raw_json: bool) -> ! {
    if raw_json {
        print_json(outcome);
    } else {
        println!("{}", outcome.history_entry());
    }
    process::exit(if outcome.is_ok() { 0 } else { 1 });
}

fn send_line(settings: &ClientSettings, text: &str, uid: Option<&str>, raw_json: bool) -> ! {
    if settings.server_address.is_empty() {
        fail("No server address configured. Use `nb-command config set --server <url>`.");
    }
    let session = Session::from_settings(settings).unwrap_or_else(|e| fail(e));
    if let Some(uid) = uid {
        session.set_uid(uid);
    }
    report(&session.send(text), raw_json);
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone().unwrap_or_else(paths::app_config_dir);
    let mut loaded = settings::load_settings(&config_dir);
    let raw = cli.json;

    match &cli.command {
        Commands::List => {
            let catalog = load_catalog(cli.catalog.as_deref(), &loaded, &config_dir);
            if raw {
                print_json(&catalog.commands());
            } else {
                println!("{}", catalog.help_text(None));
            }
        }
        Commands::Describe { command } => {
            let catalog = load_catalog(cli.catalog.as_deref(), &loaded, &config_dir);
            let cmd = catalog.find(command).unwrap_or_else(|e| fail(e));
            if raw {
                print_json(cmd);
            } else {
                println!("{}", catalog.help_text(Some(command)));
            }
        }
        Commands::Preview { command, params } => {
            let catalog = load_catalog(cli.catalog.as_deref(), &loaded, &config_dir);
            let cmd = catalog.find(command).unwrap_or_else(|e| fail(e));
            let store = fill_store(cmd, params).unwrap_or_else(|e| fail(e));
            let line = render(&cmd.syntax, &store);
            if raw {
                print_json(&serde_json::json!({
                    "command": line,
                    "missing_required": missing_required(&cmd.syntax, &store),
                }));
            } else {
                println!("{line}");
            }
        }
        Commands::Send { command, params, uid, force } => {
            let catalog = load_catalog(cli.catalog.as_deref(), &loaded, &config_dir);
            let cmd = catalog.find(command).unwrap_or_else(|e| fail(e));
            let store = fill_store(cmd, params).unwrap_or_else(|e| fail(e));
            let missing = missing_required(&cmd.syntax, &store);
            if !missing.is_empty() && !force {
                fail(AppError::MissingRequired {
                    command: cmd.keyword().to_string(),
                    fields: missing,
                });
            }
            send_line(&loaded, &render(&cmd.syntax, &store), uid.as_deref(), raw);
        }
        Commands::Raw { text, uid } => {
            let text = text.trim();
            if text.is_empty() {
                fail("Nothing to send");
            }
            send_line(&loaded, text, uid.as_deref(), raw);
        }
        Commands::Choices { field, file, type_filter, query } => {
            let choices = StaticChoices::load(file).unwrap_or_else(|e| fail(e));
            let tokens = match query {
                Some(q) => choices.search(field, type_filter.as_deref(), q),
                None => choices.choices(field, type_filter.as_deref()),
            };
            if raw {
                print_json(&tokens);
            } else {
                for token in tokens {
                    println!("{token}");
                }
            }
        }
        Commands::Schema => print_json(&catalog_schema()),
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if raw {
                    print_json(&loaded);
                } else {
                    println!("Config dir:      {}", config_dir.display());
                    println!("Server address:  {}", loaded.server_address);
                    println!("Token:           {}", loaded.masked_token());
                    println!("Uid:             {}", loaded.uid);
                    println!(
                        "Timeouts:        connect {}s, request {}s",
                        loaded.connect_timeout_secs, loaded.request_timeout_secs
                    );
                    match &loaded.catalog_path {
                        Some(p) => println!("Catalog:         {}", p.display()),
                        None => println!("Catalog:         built-in"),
                    }
                }
            }
            ConfigAction::Set {
                server,
                token,
                uid,
                connect_timeout,
                request_timeout,
                catalog,
            } => {
                if let Some(server) = server {
                    loaded.server_address = server.trim().to_string();
                }
                if let Some(token) = token {
                    loaded.auth_token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
                }
                if let Some(uid) = uid {
                    loaded.uid = uid.trim().to_string();
                }
                if let Some(secs) = connect_timeout {
                    loaded.connect_timeout_secs = *secs;
                }
                if let Some(secs) = request_timeout {
                    loaded.request_timeout_secs = *secs;
                }
                if let Some(path) = catalog {
                    loaded.catalog_path = Some(path.clone());
                }
                settings::save_settings(&config_dir, &loaded).unwrap_or_else(|e| {
                    fail(AppError::SettingsSaveError {
                        message: e.to_string(),
                    })
                });
                eprintln!("[NbCommand] Settings saved to {}", config_dir.display());
            }
        },
    }
}
