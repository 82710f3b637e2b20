//! Aba Market CLI - a command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! aba-cli products list
//! aba-cli products show 42
//! aba-cli products search "ankara"
//! aba-cli categories
//!
//! # Cart (works anonymously; a guest cart id is minted on first use)
//! aba-cli cart show
//! aba-cli cart add 11 --quantity 2
//! aba-cli cart remove 11
//! aba-cli cart clear
//!
//! # Account (logging in merges the guest cart into the account cart)
//! aba-cli account login -u ada@example.com -p secret
//! aba-cli account signup -f Ada -l Obi -e ada@example.com -p secret --login
//! aba-cli account whoami
//! aba-cli account logout
//!
//! # Orders
//! aba-cli orders checkout --payment bank-transfer
//! aba-cli orders list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aba_market_client::{ClientConfig, SessionEvent, StoreClient};
use aba_market_core::{ProductId, VariantId};

mod commands;

#[derive(Parser)]
#[command(name = "aba-cli")]
#[command(author, version, about = "Aba Market command-line storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Show the category tree
    Categories,
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Place and review orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List all products
    List,
    /// Show one product with its variants
    Show {
        /// Product id
        id: ProductId,
    },
    /// Full-text product search
    Search {
        /// Search query
        query: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart
    Show,
    /// Add a variant to the cart
    Add {
        /// Variant id
        variant: VariantId,

        /// How many to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a variant from the cart
    Remove {
        /// Variant id
        variant: VariantId,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Log in (merges any guest cart into the account cart)
    Login {
        /// Account email
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Signup {
        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Log in right after the account is created
        #[arg(long)]
        login: bool,
    },
    /// Log out of the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Set the default address
    Address {
        /// Street address
        #[arg(long)]
        street: String,

        /// City
        #[arg(long)]
        city: String,

        /// State
        #[arg(long)]
        state: String,

        /// Postal code
        #[arg(long)]
        postal_code: Option<String>,

        /// Country
        #[arg(long, default_value = "Nigeria")]
        country: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order for the current cart contents
    Checkout {
        /// Payment method (`bank-transfer`, `cash-on-delivery`, `card`)
        #[arg(short, long, default_value = "bank-transfer")]
        payment: String,
    },
    /// List past orders
    List {
        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Page size
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aba_market_client=info,aba_cli=info")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let client = StoreClient::new(&config)?;

    // Expiry surfaces as a redirect nudge the moment the gateway notices it.
    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(SessionEvent::Expired { login_url }) = events.recv().await {
            tracing::warn!("Your session has expired. Log in again at {login_url}");
        }
    });

    // Pick up a persisted session; a stale token is cleaned up quietly.
    client.auth().restore().await;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List => commands::catalog::list_products(&client).await?,
            ProductAction::Show { id } => commands::catalog::show_product(&client, id).await?,
            ProductAction::Search { query } => {
                commands::catalog::search_products(&client, &query).await?;
            }
        },
        Commands::Categories => commands::catalog::show_categories(&client).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&client).await,
            CartAction::Add { variant, quantity } => {
                commands::cart::add(&client, variant, quantity).await?;
            }
            CartAction::Remove { variant } => commands::cart::remove(&client, variant).await,
            CartAction::Clear => commands::cart::clear(&client).await,
        },
        Commands::Account { action } => match action {
            AccountAction::Login { username, password } => {
                commands::account::login(&client, &username, &password).await?;
            }
            AccountAction::Signup {
                first_name,
                last_name,
                email,
                password,
                login,
            } => {
                commands::account::signup(&client, &first_name, &last_name, &email, &password, login)
                    .await?;
            }
            AccountAction::Logout => commands::account::logout(&client).await,
            AccountAction::Whoami => commands::account::whoami(&client)?,
            AccountAction::Address {
                street,
                city,
                state,
                postal_code,
                country,
            } => {
                commands::account::set_address(&client, street, city, state, postal_code, country)
                    .await?;
            }
        },
        Commands::Orders { action } => match action {
            OrderAction::Checkout { payment } => {
                commands::orders::checkout(&client, &payment).await?;
            }
            OrderAction::List { page, size } => {
                commands::orders::list(&client, page, size).await?;
            }
        },
    }
    Ok(())
}
