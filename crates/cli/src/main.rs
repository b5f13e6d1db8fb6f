//! Zard Shop CLI - Catalog validation and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Validate the built-in seed, or a seed file
//! zs-cli catalog check
//! zs-cli catalog check data/catalog.json
//!
//! # Run the listing pipeline from the terminal
//! zs-cli catalog products --category Electronics --max-price 200 --sort price-asc
//! zs-cli catalog products --colors black,white --json
//!
//! # Show one product with its facets
//! zs-cli catalog show 3
//! ```
//!
//! # Commands
//!
//! - `catalog check` - Validate a catalog seed
//! - `catalog products` - Filter, sort and paginate products
//! - `catalog show` - Print one product
//! - `catalog facets` - List categories, brands, colors and sizes with counts
//!
//! Every command reads `STOREFRONT_CATALOG_PATH` (or `--catalog`) and falls
//! back to the built-in seed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use zard_shop_storefront::services::catalog::ProductQueryParams;

mod commands;

#[derive(Parser)]
#[command(name = "zs-cli")]
#[command(author, version, about = "Zard Shop CLI tools")]
struct Cli {
    /// Catalog seed file (defaults to `STOREFRONT_CATALOG_PATH`, then the
    /// built-in seed)
    #[arg(long, global = true, env = "STOREFRONT_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a catalog seed and report every problem
    Check {
        /// Seed file to validate (overrides `--catalog`)
        path: Option<PathBuf>,
    },
    /// List products matching the given facets
    Products {
        #[command(flatten)]
        facets: FacetArgs,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a single product
    Show {
        /// Product ID
        id: String,

        /// Print the product as JSON
        #[arg(long)]
        json: bool,
    },
    /// List facet values with product counts
    Facets,
}

/// Listing facets, mirroring the storefront query string.
#[derive(Args, Debug, Default)]
pub struct FacetArgs {
    /// Match name, description or brand
    #[arg(long)]
    search: Option<String>,

    /// Category name ("All" for every category)
    #[arg(long)]
    category: Option<String>,

    /// Comma-separated brands
    #[arg(long)]
    brands: Option<String>,

    /// Price floor in whole dollars
    #[arg(long)]
    min_price: Option<u32>,

    /// Price ceiling in whole dollars
    #[arg(long)]
    max_price: Option<u32>,

    /// Only products in stock
    #[arg(long)]
    in_stock: bool,

    /// Minimum rating
    #[arg(long)]
    rating: Option<f64>,

    /// Comma-separated colors
    #[arg(long)]
    colors: Option<String>,

    /// Comma-separated sizes
    #[arg(long)]
    sizes: Option<String>,

    /// Sort key: name-asc, name-desc, price-asc, price-desc, rating-desc, newest
    #[arg(long)]
    sort: Option<String>,

    /// Page number, starting at 1
    #[arg(long)]
    page: Option<usize>,
}

impl From<FacetArgs> for ProductQueryParams {
    fn from(args: FacetArgs) -> Self {
        Self {
            search: args.search,
            category: args.category,
            brands: args.brands,
            min_price: args.min_price,
            max_price: args.max_price,
            in_stock: args.in_stock.then_some(true),
            rating: args.rating,
            colors: args.colors,
            sizes: args.sizes,
            sort: args.sort,
            page: args.page,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zard_shop_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::catalog::CatalogCommandError> {
    let Commands::Catalog { action } = cli.command;
    match action {
        CatalogAction::Check { path } => {
            commands::catalog::check(path.or(cli.catalog).as_deref()).await
        }
        CatalogAction::Products { facets, json } => {
            let catalog = commands::catalog::load(cli.catalog.as_deref()).await?;
            commands::catalog::products(&catalog, facets.into(), json)
        }
        CatalogAction::Show { id, json } => {
            let catalog = commands::catalog::load(cli.catalog.as_deref()).await?;
            commands::catalog::show(&catalog, &id, json)
        }
        CatalogAction::Facets => {
            let catalog = commands::catalog::load(cli.catalog.as_deref()).await?;
            commands::catalog::facets(&catalog);
            Ok(())
        }
    }
}
