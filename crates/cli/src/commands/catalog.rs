//! Catalog inspection commands.
//!
//! # Usage
//!
//! ```bash
//! zs-cli catalog check data/catalog.json
//! zs-cli catalog products --search desk --in-stock
//! zs-cli catalog show 7 --json
//! zs-cli catalog facets
//! ```

// Results go to stdout; logs go to stderr.
#![allow(clippy::print_stdout)]

use std::path::Path;

use thiserror::Error;

use zard_shop_core::{Product, ProductId};
use zard_shop_storefront::routes::api::ProductPageResponse;
use zard_shop_storefront::services::catalog::{
    ALL_CATEGORIES, Catalog, CatalogError, CatalogSeed, ProductQuery, ProductQueryParams, validate,
};

/// Errors that can occur while running a catalog command.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    /// The seed could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The seed file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The seed is not valid JSON for the catalog format.
    #[error("invalid catalog seed: {0}")]
    Parse(#[from] serde_json::Error),

    /// The seed parsed but breaks catalog rules.
    #[error("{0} validation problems found")]
    Invalid(usize),

    /// No product has the requested ID.
    #[error("Product not found: {0}")]
    ProductNotFound(String),
}

/// Load the catalog from `path`, or the built-in seed.
///
/// # Errors
///
/// Returns an error if the seed cannot be read, parsed or validated.
pub async fn load(path: Option<&Path>) -> Result<Catalog, CatalogCommandError> {
    let Some(path) = path else {
        return Ok(Catalog::builtin()?);
    };
    let seed = read_seed(path).await?;
    Ok(Catalog::from_seed(seed)?)
}

async fn read_seed(path: &Path) -> Result<CatalogSeed, CatalogCommandError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogCommandError::Read {
            path: path.display().to_string(),
            source,
        })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Validate a seed and log every problem.
///
/// # Errors
///
/// Returns `CatalogCommandError::Invalid` when the seed breaks any rule.
pub async fn check(path: Option<&Path>) -> Result<(), CatalogCommandError> {
    let Some(path) = path else {
        let catalog = Catalog::builtin()?;
        tracing::info!(products = catalog.len(), "Built-in catalog is valid");
        return Ok(());
    };

    tracing::info!(path = %path.display(), "Validating catalog seed");
    let seed = read_seed(path).await?;
    let problems = validate(&seed);
    if !problems.is_empty() {
        tracing::error!("Catalog validation failed:");
        for problem in &problems {
            tracing::error!("  - {problem}");
        }
        return Err(CatalogCommandError::Invalid(problems.len()));
    }

    tracing::info!(
        products = seed.products.len(),
        reviews = seed.reviews.len(),
        "Catalog seed is valid"
    );
    Ok(())
}

/// Print one page of products matching the facets.
///
/// # Errors
///
/// Returns an error if the JSON output cannot be serialized.
pub fn products(
    catalog: &Catalog,
    params: ProductQueryParams,
    json: bool,
) -> Result<(), CatalogCommandError> {
    let query = ProductQuery::from(params);
    let page = query.paginate(catalog);

    if json {
        let response = ProductPageResponse {
            products: page.products.into_iter().cloned().collect(),
            total_count: page.total_count,
            current_page: page.current_page,
            total_pages: page.total_pages,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    for product in &page.products {
        println!("{}", product_row(product));
    }
    println!(
        "{} products, page {} of {}",
        page.total_count,
        page.current_page,
        page.total_pages.max(1)
    );
    Ok(())
}

/// Print a single product.
///
/// # Errors
///
/// Returns `CatalogCommandError::ProductNotFound` for unknown IDs.
pub fn show(catalog: &Catalog, id: &str, json: bool) -> Result<(), CatalogCommandError> {
    let product = catalog
        .get_product(&ProductId::new(id))
        .ok_or_else(|| CatalogCommandError::ProductNotFound(id.to_owned()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(product)?);
        return Ok(());
    }

    println!("{}", product_row(product));
    println!();
    println!("{}", product.description);
    if !product.colors.is_empty() {
        println!("Colors: {}", product.colors.join(", "));
    }
    if !product.sizes.is_empty() {
        println!("Sizes: {}", product.sizes.join(", "));
    }
    for spec in product.specification_list() {
        println!("  {}: {}", spec.name, spec.value);
    }
    let related: Vec<&str> = catalog
        .related_products(&product.id, 4)
        .into_iter()
        .map(|p| p.id.as_str())
        .collect();
    if !related.is_empty() {
        println!("Related: {}", related.join(", "));
    }
    Ok(())
}

/// Print every facet value with its product count.
pub fn facets(catalog: &Catalog) {
    println!("Categories:");
    println!("  {ALL_CATEGORIES} ({})", catalog.category_count(ALL_CATEGORIES));
    for category in catalog.categories() {
        println!("  {category} ({})", catalog.category_count(category));
    }

    println!("Brands:");
    for brand in catalog.brands() {
        println!("  {brand} ({})", catalog.brand_count(brand));
    }

    println!("Colors: {}", catalog.available_colors().join(", "));
    println!("Sizes: {}", catalog.available_sizes().join(", "));
    println!("In stock: {}", catalog.in_stock_count());

    println!("Ratings:");
    for stars in (1..=5u8).rev() {
        println!("  {stars}+ ({})", catalog.rating_count(f64::from(stars)));
    }
}

/// One-line summary of a product.
fn product_row(product: &Product) -> String {
    let mut row = format!(
        "{:>4}  {:<36} {:<14} {:>10}  {:.1}",
        product.id.as_str(),
        product.name,
        product.brand,
        product.price.display(),
        product.rating
    );
    if let Some(original) = product.original_price {
        row.push_str(&format!("  (was {}, -{}%)", original.display(), product.discount_percentage()));
    }
    if !product.in_stock {
        row.push_str("  [out of stock]");
    }
    row
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row_marks_stock_and_discount() {
        let catalog = Catalog::builtin().unwrap();
        let out_of_stock = catalog
            .all_products()
            .iter()
            .find(|p| !p.in_stock)
            .unwrap();
        assert!(product_row(out_of_stock).ends_with("[out of stock]"));

        let discounted = catalog
            .all_products()
            .iter()
            .find(|p| p.original_price.is_some())
            .unwrap();
        assert!(product_row(discounted).contains("(was $"));
    }

    #[test]
    fn test_show_unknown_product() {
        let catalog = Catalog::builtin().unwrap();
        let err = show(&catalog, "does-not-exist", false).unwrap_err();
        assert!(matches!(err, CatalogCommandError::ProductNotFound(id) if id == "does-not-exist"));
    }

    #[tokio::test]
    async fn test_check_reports_missing_file() {
        let err = check(Some(Path::new("/nonexistent/catalog.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogCommandError::Read { .. }));
    }
}
