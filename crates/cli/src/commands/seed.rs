//! Seed the catalog from a YAML file.
//!
//! The file holds a single `products` list whose entries use the same field
//! names as the `products` table:
//!
//! ```yaml
//! products:
//!   - name: Premium UI Kit Collection
//!     price: "299000"
//!     type: digital
//!     category: design
//! ```
//!
//! Every entry is validated before anything is sent, and the whole list is
//! inserted in one request, so a bad file never leaves a half-seeded catalog.

use std::path::Path;

use digimart_core::Price;
use digimart_supabase::types::{Product, ProductInput};
use digimart_supabase::{ConfigError, GatewayError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::service_gateway;

/// Highest rating a seeded product may carry.
const MAX_RATING: u8 = 5;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid catalog YAML.
    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An entry failed validation.
    #[error("Product #{index} ({name}): {reason}")]
    Invalid {
        index: usize,
        name: String,
        reason: String,
    },

    /// Missing environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway rejected the insert.
    #[error("Insert failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Top-level shape of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<ProductInput>,
}

/// Parse and validate a catalog document.
///
/// Categories are lowercased to match how the admin saves them.
///
/// # Errors
///
/// Returns the first parse or validation failure.
pub fn parse_catalog(content: &str) -> Result<Vec<ProductInput>, SeedError> {
    let file: CatalogFile = serde_yaml::from_str(content)?;

    file.products
        .into_iter()
        .enumerate()
        .map(|(i, product)| validate(i + 1, product))
        .collect()
}

fn validate(index: usize, mut product: ProductInput) -> Result<ProductInput, SeedError> {
    let invalid = |name: &str, reason: &str| SeedError::Invalid {
        index,
        name: name.to_string(),
        reason: reason.to_string(),
    };

    product.name = product.name.trim().to_string();
    if product.name.is_empty() {
        return Err(invalid("unnamed", "name is required"));
    }

    product.category = product.category.trim().to_lowercase();
    if product.category.is_empty() {
        return Err(invalid(&product.name, "category is required"));
    }

    // Prices deserialize without the sign check, so run it here
    let prices = std::iter::once(product.price).chain(product.original_price);
    for price in prices {
        if Price::new(price.amount()).is_err() {
            return Err(invalid(&product.name, "prices must not be negative"));
        }
    }

    if let Some(rating) = product.rating
        && (rating.is_sign_negative() || rating > Decimal::from(MAX_RATING))
    {
        return Err(invalid(&product.name, "rating must be between 0 and 5"));
    }

    Ok(product)
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, the environment
/// is not configured, or the gateway rejects the insert.
pub async fn products(path: &Path, dry_run: bool) -> Result<(), SeedError> {
    info!(path = %path.display(), "Loading catalog");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let products = parse_catalog(&content)?;

    let digital = products
        .iter()
        .filter(|p| p.product_type == digimart_core::ProductType::Digital)
        .count();
    info!(
        total = products.len(),
        digital,
        physical = products.len() - digital,
        "Catalog validated"
    );

    if dry_run {
        info!("Dry run, nothing inserted");
        return Ok(());
    }

    let gateway = service_gateway()?;
    let inserted: Vec<Product> = gateway.insert_many(&products).await?;

    info!(inserted = inserted.len(), "Seeding complete");
    for product in &inserted {
        info!("  {} {}", product.id.short(), product.name);
    }

    Ok(())
}
