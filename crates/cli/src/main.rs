//! Metadots CLI - Storefront client for shoppers and administrators.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the session is kept in .metadots-session.json)
//! metadots login -e shopper@example.com -p hunter22
//!
//! # Browse and fill the cart
//! metadots products list --category mugs --sort price_asc
//! metadots cart add 64f0c2 --quantity 2
//!
//! # Check out (prints the payment URL, or the order on local completion)
//! metadots checkout
//! metadots checkout --simulate
//!
//! # Administration
//! metadots admin users list
//! metadots admin insights
//! ```
//!
//! # Environment Variables
//!
//! - `METADOTS_API_BASE` - Backend base URL (default: `http://localhost:8000`)
//! - `METADOTS_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `STOREFRONT_BASE_URL` - Origin used for checkout return URLs
//! - `STOREFRONT_LOCAL_HOSTS` - Hosts treated as local checkout targets
//! - `METADOTS_PASSWORD` - Password for `login` when `--password` is omitted
//!
//! A `.env` file in the working directory is loaded first.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use metadots_core::{
    NewUser, Price, ProductId, ProductInput, ProductPatch, ProductQuery, ProductSort, Registration,
    Role, UserId, UserPatch,
};

mod commands;
mod error;
mod output;
mod session_file;

use commands::Context;
use error::{CliError, Result};
use secrecy::SecretString;
use session_file::{DEFAULT_SESSION_FILE, SessionFile};

const PASSWORD_ENV: &str = "METADOTS_PASSWORD";

#[derive(Parser)]
#[command(name = "metadots")]
#[command(author, version, about = "Metadots storefront client")]
struct Cli {
    /// Backend base URL (overrides `METADOTS_API_BASE`)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Where the session is kept between invocations
    #[arg(long, global = true, default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,
        /// Falls back to `METADOTS_PASSWORD`
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Check out the cart
    Checkout {
        /// Complete the order without a payment provider
        #[arg(long)]
        simulate: bool,
    },
    /// Show orders
    Orders {
        /// Every order, not just yours (admin)
        #[arg(long)]
        all: bool,
    },
    /// Administration (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Search and filter products
    List(ListArgs),
    /// Show one product
    Show { id: String },
    /// List category names
    Categories,
}

#[derive(Args)]
struct ListArgs {
    /// Free-text search
    #[arg(short, long)]
    q: Option<String>,
    #[arg(short, long)]
    category: Option<String>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    min_price: Option<i64>,
    #[arg(long)]
    max_price: Option<i64>,
    /// `price_asc`, `price_desc` or `newest`
    #[arg(long)]
    sort: Option<ProductSort>,
}

impl From<ListArgs> for ProductQuery {
    fn from(args: ListArgs) -> Self {
        Self {
            q: args.q,
            category: args.category,
            page: args.page,
            limit: args.limit,
            min_price: args.min_price,
            max_price: args.max_price,
            sort: args.sort,
        }
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Unit price (defaults to the catalog price)
        #[arg(long)]
        price: Option<Price>,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        product_id: String,
        quantity: u32,
        #[arg(long)]
        price: Option<Price>,
    },
    /// Remove a line
    Remove { product_id: String },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: AdminProductsAction,
    },
    /// Dashboard numbers
    Insights,
}

#[derive(Subcommand)]
enum UsersAction {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    Create {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// `user` or `admin`
        #[arg(short, long, default_value = "user")]
        role: Role,
    },
    Update {
        id: String,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(short, long)]
        role: Option<Role>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum AdminProductsAction {
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(long)]
        price: Price,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(short, long)]
        category: Option<String>,
        /// Image URL (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
    },
    Update {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<Price>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        stock: Option<i64>,
        #[arg(short, long)]
        category: Option<String>,
        /// Replace the image list (repeatable)
        #[arg(long = "image")]
        images: Option<Vec<String>>,
    },
    Delete {
        id: String,
    },
    /// Upload an image and print its URL
    UploadImage { path: PathBuf },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// The login password: the flag, else `METADOTS_PASSWORD`.
fn password_from(arg: Option<String>) -> Result<SecretString> {
    arg.or_else(|| std::env::var(PASSWORD_ENV).ok())
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            CliError::InvalidArgument(format!("a password is required (--password or {PASSWORD_ENV})"))
        })
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_env(cli.api_base, SessionFile::new(cli.session_file))?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = password_from(password)?;
            commands::auth::login(&ctx, &email, &password).await?;
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let registration = Registration {
                username,
                email,
                password,
            };
            commands::auth::register(&ctx, &registration).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Products { action } => match action {
            ProductsAction::List(args) => {
                commands::catalog::list(&ctx, &ProductQuery::from(args)).await?;
            }
            ProductsAction::Show { id } => {
                commands::catalog::show(&ctx, &ProductId::new(id)).await?;
            }
            ProductsAction::Categories => commands::catalog::categories(&ctx).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add {
                product_id,
                quantity,
                price,
            } => {
                commands::cart::add(&ctx, &ProductId::new(product_id), quantity, price).await?;
            }
            CartAction::Update {
                product_id,
                quantity,
                price,
            } => {
                commands::cart::update(&ctx, &ProductId::new(product_id), quantity, price).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(&ctx, &ProductId::new(product_id)).await?;
            }
        },
        Commands::Checkout { simulate } => commands::checkout::run(&ctx, simulate).await?,
        Commands::Orders { all } => commands::orders::list(&ctx, all).await?,
        Commands::Admin { action } => run_admin(&ctx, action).await?,
    }
    Ok(())
}

async fn run_admin(ctx: &Context, action: AdminAction) -> Result<()> {
    match action {
        AdminAction::Users { action } => match action {
            UsersAction::List { page, limit } => {
                commands::admin::list_users(ctx, page.max(1), limit.max(1)).await
            }
            UsersAction::Create {
                username,
                email,
                password,
                role,
            } => {
                let user = NewUser {
                    username,
                    email,
                    password,
                    role,
                };
                commands::admin::create_user(ctx, &user).await
            }
            UsersAction::Update {
                id,
                username,
                email,
                password,
                role,
            } => {
                let patch = UserPatch {
                    username,
                    email,
                    password,
                    role,
                };
                commands::admin::update_user(ctx, &UserId::new(id), &patch).await
            }
            UsersAction::Delete { id } => commands::admin::delete_user(ctx, &UserId::new(id)).await,
        },
        AdminAction::Products { action } => match action {
            AdminProductsAction::Create {
                name,
                price,
                description,
                stock,
                category,
                images,
            } => {
                let input = ProductInput {
                    name,
                    description,
                    price,
                    stock,
                    category,
                    images,
                };
                commands::catalog::create(ctx, &input).await
            }
            AdminProductsAction::Update {
                id,
                name,
                price,
                description,
                stock,
                category,
                images,
            } => {
                let patch = ProductPatch {
                    name,
                    description,
                    price,
                    stock,
                    category,
                    images,
                };
                commands::catalog::update(ctx, &ProductId::new(id), &patch).await
            }
            AdminProductsAction::Delete { id } => {
                commands::catalog::delete(ctx, &ProductId::new(id)).await
            }
            AdminProductsAction::UploadImage { path } => {
                commands::catalog::upload_image(ctx, &path).await
            }
        },
        AdminAction::Insights => commands::admin::insights(ctx).await,
    }
}
