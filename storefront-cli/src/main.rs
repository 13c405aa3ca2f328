//! Storefront CLI - command-line client for the storefront backend
//!
//! Logs in, keeps the session cookies between runs and exercises the same
//! session layer the storefront uses: refresh-and-retry, session resolution
//! and role-filtered menus.

mod cookie_jar;

use clap::{Parser, Subcommand};
use cookie_jar::FileCookieStore;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_core::{
    init_logging, post_login_destination, ErrorContext, LoginRequest, LoggingConfig,
    RegisterRequest, StorefrontConfig, StorefrontError, StorefrontResult, PROFILE_PATH,
};
use storefront_session::api::{CartApi, OrdersApi, Resource};
use storefront_session::{
    account_menu, sidebar_links, CookieStore, MemoryNavigator, RouteAccessTable, SessionContext,
    SessionState,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Command-line client for the storefront backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (without `/api`), overrides the configuration
    #[arg(long)]
    api_url: Option<String>,

    /// Cookie jar location
    #[arg(long)]
    cookies: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create an account and log in
    Register {
        username: String,

        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Log out and forget the stored session
    Logout,

    /// Resolve the stored session and show who is signed in
    Whoami,

    /// Show the account menu and dashboard sidebar for the current session
    Menu,

    /// Fetch a resource list, a page of it, or a single item
    Get {
        /// products, categories, orders or users
        resource: Resource,

        /// Item id
        id: Option<String>,

        /// Page number
        #[arg(long, requires = "limit")]
        page: Option<u32>,

        /// Page size
        #[arg(long, requires = "page")]
        limit: Option<u32>,
    },

    /// Show the cart
    Cart {
        /// Empty the cart instead
        #[arg(long)]
        clear: bool,
    },

    /// Show the signed-in user's orders
    Orders,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> StorefrontResult<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut logging_config = LoggingConfig::default();
    if cli.verbose {
        logging_config = logging_config.verbose();
    }

    init_logging(&logging_config).map_err(|e| StorefrontError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check logging configuration"),
    })?;

    debug!("Starting storefront CLI v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_ref())?.with_env();
    if let Some(api_url) = cli.api_url {
        config.backend.api_url = api_url;
    }

    if let Commands::Config {
        show,
        init,
        validate,
    } = cli.command
    {
        return handle_config(&config, show, init, validate).await;
    }

    config.validate()?;
    let jar_path = match cli.cookies {
        Some(path) => path,
        None => FileCookieStore::default_path().ok_or_else(|| StorefrontError::Config {
            message: "Could not determine a data directory for the cookie jar".to_string(),
            source: None,
            context: ErrorContext::new("cli").with_suggestion("Pass --cookies <path>"),
        })?,
    };
    let jar = FileCookieStore::load(&jar_path).await?;
    let session = SessionContext::new(&config, Arc::new(jar) as Arc<dyn CookieStore>)?;

    match cli.command {
        Commands::Login { email, password } => {
            handle_login(&session, LoginRequest { email, password }).await?;
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            handle_register(
                &session,
                RegisterRequest {
                    username,
                    email,
                    password,
                },
            )
            .await?;
        }
        Commands::Logout => {
            if let Err(e) = session.auth.logout().await {
                println!("Backend logout failed ({}), local session cleared", e);
            } else {
                println!("Logged out");
            }
        }
        Commands::Whoami => {
            handle_whoami(&session).await?;
        }
        Commands::Menu => {
            handle_menu(&session).await?;
        }
        Commands::Get {
            resource,
            id,
            page,
            limit,
        } => {
            let api = session.resource(resource);
            let body = match (id, page, limit) {
                (Some(id), _, _) => api.get(&id).await?,
                (None, Some(page), Some(limit)) => api.page(page, limit).await?,
                _ => api.list().await?,
            };
            print_json(&body)?;
        }
        Commands::Cart { clear } => {
            let cart = CartApi::new(session.client.clone());
            let body = if clear {
                cart.clear().await?
            } else {
                cart.get().await?
            };
            print_json(&body)?;
        }
        Commands::Orders => {
            let orders = OrdersApi::new(session.client.clone()).mine().await?;
            print_json(&orders)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> StorefrontResult<StorefrontConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return StorefrontConfig::from_file(path);
    }

    let default_paths = [
        default_config_path(),
        Some(PathBuf::from("storefront.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return StorefrontConfig::from_file(path);
        }
    }

    debug!("No configuration file found, using defaults");
    Ok(StorefrontConfig::default())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("storefront").join("config.toml"))
}

fn print_json(value: &Value) -> StorefrontResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn handle_login(session: &SessionContext, credentials: LoginRequest) -> StorefrontResult<()> {
    let response = session.auth.login(&credentials).await?;
    report_signed_in(response.user.as_ref());
    Ok(())
}

async fn handle_register(
    session: &SessionContext,
    details: RegisterRequest,
) -> StorefrontResult<()> {
    let response = session.auth.register(&details).await?;
    report_signed_in(response.user.as_ref());
    Ok(())
}

fn report_signed_in(user: Option<&storefront_core::UserProfile>) {
    match user {
        Some(user) => {
            println!(
                "Signed in as {} ({})",
                user.display_name(),
                user.role.label()
            );
            println!("Continue at {}", post_login_destination(user.role));
        }
        None => println!("Signed in"),
    }
}

/// Resolve the session the way the storefront does on page load
async fn resolve(session: &SessionContext) -> SessionState {
    let navigator = Arc::new(MemoryNavigator::at(PROFILE_PATH));
    session.provider(navigator).initialize().await
}

async fn handle_whoami(session: &SessionContext) -> StorefrontResult<()> {
    match resolve(session).await {
        SessionState::Authenticated(user) => {
            println!("{}", user.display_name());
            println!("  id:    {}", user.id);
            if let Some(email) = &user.email {
                println!("  email: {}", email);
            }
            println!("  role:  {} ({})", user.role.label(), user.role.code());
        }
        _ => println!("Not signed in"),
    }
    Ok(())
}

async fn handle_menu(session: &SessionContext) -> StorefrontResult<()> {
    let state = resolve(session).await;
    let user = state.user();

    println!("Account menu:");
    for link in account_menu(user) {
        println!("  {:<10} {}", link.label, link.href);
    }

    let sidebar = sidebar_links(&RouteAccessTable::default(), user);
    if !sidebar.is_empty() {
        println!("Dashboard:");
        for link in sidebar {
            println!("  {:<10} {}", link.label, link.href);
        }
    }
    Ok(())
}

async fn handle_config(
    config: &StorefrontConfig,
    show: bool,
    init: bool,
    validate: bool,
) -> StorefrontResult<()> {
    if init {
        let config_path = default_config_path().ok_or_else(|| StorefrontError::Config {
            message: "Could not determine a configuration directory".to_string(),
            source: None,
            context: ErrorContext::new("cli").with_operation("config_init"),
        })?;
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        StorefrontConfig::default().save_to_file(&config_path)?;
        println!("Configuration initialized at: {:?}", config_path);
    }

    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| StorefrontError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("config_show"),
        })?;
        println!("{}", rendered);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => {
                println!("Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_command_parsing() {
        let cli = Cli::parse_from([
            "storefront",
            "get",
            "products",
            "--page",
            "2",
            "--limit",
            "10",
        ]);

        match cli.command {
            Commands::Get {
                resource,
                id,
                page,
                limit,
            } => {
                assert_eq!(resource, Resource::Products);
                assert!(id.is_none());
                assert_eq!(page, Some(2));
                assert_eq!(limit, Some(10));
            }
            _ => panic!("expected get command"),
        }
    }

    #[test]
    fn test_page_requires_limit() {
        assert!(Cli::try_parse_from(["storefront", "get", "orders", "--page", "1"]).is_err());
        assert!(Cli::try_parse_from(["storefront", "get", "widgets"]).is_err());
    }

    #[test]
    fn test_login_parsing() {
        let cli = Cli::parse_from([
            "storefront",
            "--api-url",
            "http://shop.local",
            "login",
            "sam@example.com",
            "--password",
            "secret",
        ]);

        assert_eq!(cli.api_url.as_deref(), Some("http://shop.local"));
        assert!(matches!(cli.command, Commands::Login { .. }));
    }
}
