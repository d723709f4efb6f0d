use clap::{Parser, Subcommand};
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::process;
use std::sync::{Arc, Mutex};
use terminal_size::{terminal_size, Width};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use keepsake::config::{self, DEFAULT_HOST, DEFAULT_PORT};
use keepsake::models::{AppState, User};
use keepsake::routes::build_router;
use keepsake::store::{Database, RecordSort, StoreError};
use keepsake::{auth, services};

fn build_state_from_env(env_file: Option<&str>) -> AppState {
    config::load_env_file(env_file);
    let data_dir = config::get_data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(%e, dir = %data_dir.display(), "Failed to create data directory");
        eprintln!(
            "{}: {}",
            yansi::Paint::new(format!("Cannot create data directory {}", data_dir.display())).red(),
            e
        );
        process::exit(1);
    }
    let db = match Database::open_at(&config::database_path()) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(%e, "Failed to open the database");
            eprintln!("{}: {}", yansi::Paint::new("Cannot open the database").red(), e);
            process::exit(1);
        }
    };
    AppState {
        db,
        sessions: Arc::new(Mutex::new(HashMap::new())),
        flash_store: Arc::new(Mutex::new(HashMap::new())),
        public_base_url: config::get_public_base_url(),
        upload_root: config::uploads_dir(),
        custom_css: None,
    }
}

async fn start_server(mut state: AppState, host: &str, port: u16, stylesheet: Option<String>) {
    if let Some(path) = stylesheet {
        match std::fs::read_to_string(&path) {
            Ok(css) => {
                state.custom_css = Some(css);
                tracing::info!("Loaded custom stylesheet from {}", path);
            }
            Err(e) => {
                tracing::error!(%e, "Failed to read custom stylesheet");
                eprintln!(
                    "{} {}: {}",
                    yansi::Paint::red("Failed to read custom stylesheet at"),
                    path,
                    e
                );
                process::exit(1);
            }
        }
    }

    let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(%e, "Invalid host/port format");
            eprintln!("{}: {}", yansi::Paint::red("Invalid host/port format"), e);
            process::exit(1);
        }
    };
    let app = build_router(state.clone());
    tracing::info!(%addr, "Starting keepsake server");
    println!(
        "{} {}",
        yansi::Paint::new("Web server running on").green(),
        yansi::Paint::new(format!("http://{}", addr)).cyan()
    );
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            // Run the server and log any errors (do not panic with unwrap()).
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(%e, "Server encountered an error while running");
                eprintln!("{}: {}", yansi::Paint::new("Server error").red(), e);
                process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(%e, "Failed to bind to address; is the port already in use?");
            eprintln!(
                "{}: {}\n{}",
                yansi::Paint::new(format!("Failed to bind to {}", addr)).red(),
                e,
                yansi::Paint::new("Please stop any process using this port, or start the server with a different --port value.").yellow()
            );
            process::exit(1);
        }
    }
}

fn print_users_table(users: &[User]) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if let Some((Width(w), _)) = terminal_size() {
        table.set_width(w - 4);
    }

    table.set_header(vec!["username", "email", "name", "created"]);
    for user in users {
        let name = format!("{} {}", user.first_name, user.last_name)
            .trim()
            .to_string();
        table.add_row(vec![
            user.username.clone(),
            user.email.clone(),
            name,
            user.created_at.clone(),
        ]);
    }
    println!("\n{table}\n");
}

#[derive(Parser)]
#[command(
    name = "keepsake",
    author,
    version,
    about = "keepsake command-line tool",
    long_about = r#"keepsake - a personal record keeper with per-record sharing.

This tool surfaces a small set of commands to run the server, validate configuration, manage accounts and export records. Use the `--env-file` option or environment variables (KEEPSAKE_DATA_DIR, PUBLIC_BASE_URL) to configure it.

Examples:
  1) Build & run (dev):
      cargo run -- serve --host 127.0.0.1 --port 5000
  2) Build a release binary:
      cargo build --release
  3) Manage accounts:
      keepsake users list
      keepsake users add annanowak1 anna@example.com
"#,
    after_help = "Use `keepsake <subcommand> --help` to get subcommand specific options and usage examples."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        #[arg(long, default_value_t = String::from(DEFAULT_HOST))]
        host: String,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Load environment variables from this file instead of .env
        #[arg(long)]
        env_file: Option<String>,
        /// Serve a custom stylesheet instead of the embedded default
        #[arg(long)]
        stylesheet: Option<String>,
    },
    #[command(about = "Validate configuration and the database.", long_about = "Check that the data directory is writable and the SQLite database can be opened (creating the schema on first run).")]
    CheckConfig {
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Manage accounts from the command line
    Users {
        #[command(subcommand)]
        sub: UserCommands,
    },
    #[command(about = "Export a user's records as CSV", long_about = "Write every record owned by the given user to stdout (or to a file with --output) in the same CSV shape the web export produces.")]
    Export {
        username: String,
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    #[command(about = "List accounts", long_about = "Enumerate registered accounts (username, email, name, created).")]
    List,
    #[command(about = "Add an account", long_about = "Register an account with a username, email and password. The password will be hashed before it is stored.")]
    Add {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    #[command(about = "Reset an account password", long_about = "Set a new password for an existing account; the password will be hashed.")]
    ResetPassword {
        username: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // CLI parsing
    let cli = Cli::parse();

    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }

    // Dispatch CLI commands. If no command provided, serve the web app by default
    if cli.command.is_none() {
        let state = build_state_from_env(None);
        start_server(state, DEFAULT_HOST, DEFAULT_PORT, None).await;
        return;
    }
    match cli.command.unwrap() {
        Commands::Serve {
            host,
            port,
            env_file,
            stylesheet,
        } => {
            let state = build_state_from_env(env_file.as_deref());
            start_server(state, &host, port, stylesheet).await;
        }
        Commands::CheckConfig { env_file } => {
            let state = build_state_from_env(env_file.as_deref());
            // build_state_from_env exits on failure, so reaching this point
            // means the data dir exists and the schema is in place.
            match state.db.user_repo().list_all() {
                Ok(users) => {
                    println!(
                        "{} ({} account{})",
                        yansi::Paint::new("Configuration looks valid").green(),
                        users.len(),
                        if users.len() == 1 { "" } else { "s" }
                    );
                }
                Err(e) => {
                    eprintln!("{}: {}", yansi::Paint::new("Database check failed").red(), e);
                    process::exit(1);
                }
            }
        }
        Commands::Users { sub } => {
            let state = build_state_from_env(None);
            match sub {
                UserCommands::List => match state.db.user_repo().list_all() {
                    Ok(users) => {
                        if users.is_empty() {
                            println!("(no accounts)");
                        } else {
                            print_users_table(&users);
                        }
                    }
                    Err(e) => {
                        eprintln!("{}: {}", yansi::Paint::new("Failed to list accounts").red(), e);
                        process::exit(1);
                    }
                },
                UserCommands::Add {
                    username,
                    email,
                    password,
                } => {
                    if let Err(msg) = auth::validate_username(&username)
                        .and_then(|_| auth::validate_email(&email))
                        .and_then(|_| auth::validate_password(&password))
                    {
                        eprintln!("{}", yansi::Paint::new(msg).red());
                        process::exit(1);
                    }
                    let user = User::new(&username, &email, &auth::generate_password_hash(&password));
                    match state.db.user_repo().insert(&user) {
                        Ok(()) => {
                            println!(
                                "{} {}",
                                yansi::Paint::new("Account created:").green(),
                                user.username
                            );
                        }
                        Err(StoreError::Conflict(msg)) => {
                            eprintln!("{}", yansi::Paint::new(msg).red());
                            process::exit(1);
                        }
                        Err(e) => {
                            eprintln!("{}: {}", yansi::Paint::new("Failed to create account").red(), e);
                            process::exit(1);
                        }
                    }
                }
                UserCommands::ResetPassword { username, password } => {
                    if let Err(msg) = auth::validate_password(&password) {
                        eprintln!("{}", yansi::Paint::new(msg).red());
                        process::exit(1);
                    }
                    let user = match state.db.user_repo().find_by_username(&username) {
                        Ok(Some(user)) => user,
                        Ok(None) => {
                            eprintln!(
                                "{}: {}",
                                yansi::Paint::new("No such account").red(),
                                username
                            );
                            process::exit(1);
                        }
                        Err(e) => {
                            eprintln!("{}: {}", yansi::Paint::new("Lookup failed").red(), e);
                            process::exit(1);
                        }
                    };
                    let hash = auth::generate_password_hash(&password);
                    match state.db.user_repo().set_password_hash(&user.id, &hash) {
                        Ok(()) => println!(
                            "{} {}",
                            yansi::Paint::new("Password updated for").green(),
                            user.username
                        ),
                        Err(e) => {
                            eprintln!("{}: {}", yansi::Paint::new("Password update failed").red(), e);
                            process::exit(1);
                        }
                    }
                }
            }
        }
        Commands::Export { username, output } => {
            let state = build_state_from_env(None);
            let user = match state.db.user_repo().find_by_username(&username) {
                Ok(Some(user)) => user,
                Ok(None) => {
                    eprintln!("{}: {}", yansi::Paint::new("No such account").red(), username);
                    process::exit(1);
                }
                Err(e) => {
                    eprintln!("{}: {}", yansi::Paint::new("Lookup failed").red(), e);
                    process::exit(1);
                }
            };
            let records = match state
                .db
                .record_repo()
                .list_for_owner(&user.id, None, RecordSort::default())
            {
                Ok(records) => records,
                Err(e) => {
                    eprintln!("{}: {}", yansi::Paint::new("Failed to load records").red(), e);
                    process::exit(1);
                }
            };
            let csv = services::records_csv(&records);
            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, csv) {
                        eprintln!(
                            "{} {}: {}",
                            yansi::Paint::new("Failed to write").red(),
                            path,
                            e
                        );
                        process::exit(1);
                    }
                    println!(
                        "{} {} ({} record{})",
                        yansi::Paint::new("Wrote").green(),
                        path,
                        records.len(),
                        if records.len() == 1 { "" } else { "s" }
                    );
                }
                None => print!("{}", csv),
            }
        }
    }
}
