//! Catalog filtering, sorting and page sections.
//!
//! The whole catalog is small enough to filter in memory after one cached
//! fetch, so every listing here is a pure function over `&[Product]`.

use digimart_core::ProductType;
use digimart_supabase::types::Product;

/// Products shown per type section on the home page.
pub const HOME_SECTION_SIZE: usize = 4;

/// Related products shown under a product.
pub const RELATED_LIMIT: usize = 4;

/// Catalog sort order, as sent in `?sort=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Featured products first, otherwise catalog order
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Rating,
    /// Most recently added first
    Newest,
}

impl SortKey {
    pub const ALL: &'static [Self] = &[
        Self::Featured,
        Self::PriceLow,
        Self::PriceHigh,
        Self::Rating,
        Self::Newest,
    ];

    /// Parse a `?sort=` value. Unknown values fall back to [`SortKey::Featured`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "price-low" => Self::PriceLow,
            "price-high" => Self::PriceHigh,
            "rating" => Self::Rating,
            "newest" => Self::Newest,
            _ => Self::Featured,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating",
            Self::Newest => "newest",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceLow => "Price: low to high",
            Self::PriceHigh => "Price: high to low",
            Self::Rating => "Top rated",
            Self::Newest => "Newest",
        }
    }

    /// Sort `products` in place.
    ///
    /// Expects catalog order (oldest first). Every sort is stable so ties keep
    /// that order.
    pub fn apply(self, products: &mut [Product]) {
        match self {
            Self::Featured => products.sort_by_key(|p| !p.featured),
            Self::PriceLow => products.sort_by_key(|p| p.price),
            Self::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Rating => products.sort_by(|a, b| b.rating.cmp(&a.rating)),
            Self::Newest => products.reverse(),
        }
    }
}

/// Filters from the `/products` query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub product_type: Option<ProductType>,
    pub category: Option<String>,
    pub sort: SortKey,
}

impl CatalogFilter {
    /// Build from raw query values. Blank or unknown values are ignored.
    #[must_use]
    pub fn from_query(
        product_type: Option<&str>,
        category: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        Self {
            product_type: product_type.and_then(|t| t.parse().ok()),
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            sort: sort.map(SortKey::parse).unwrap_or_default(),
        }
    }

    /// Whether a type or category filter is active.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.product_type.is_some() || self.category.is_some()
    }

    /// Page heading for this filter.
    #[must_use]
    pub fn title(&self) -> String {
        match (self.product_type, &self.category) {
            (Some(ProductType::Digital), _) => "Digital products".to_string(),
            (Some(ProductType::Physical), _) => "Physical products".to_string(),
            (None, Some(category)) => format!("Category: {category}"),
            (None, None) => "All products".to_string(),
        }
    }

    /// Filter then sort a catalog-ordered product list.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut result: Vec<Product> = products
            .iter()
            .filter(|p| self.product_type.is_none_or(|t| p.product_type == t))
            .filter(|p| self.category.as_deref().is_none_or(|c| p.category == c))
            .cloned()
            .collect();
        self.sort.apply(&mut result);
        result
    }
}

/// Product grids on the home page.
#[derive(Debug, Clone, Default)]
pub struct HomeSections {
    pub featured: Vec<Product>,
    pub digital: Vec<Product>,
    pub physical: Vec<Product>,
}

impl HomeSections {
    #[must_use]
    pub fn from_catalog(products: &[Product]) -> Self {
        let of_type = |t: ProductType| {
            products
                .iter()
                .filter(|p| p.product_type == t)
                .take(HOME_SECTION_SIZE)
                .cloned()
                .collect()
        };

        Self {
            featured: products.iter().filter(|p| p.featured).cloned().collect(),
            digital: of_type(ProductType::Digital),
            physical: of_type(ProductType::Physical),
        }
    }
}

/// Other products of the same type, in catalog order.
#[must_use]
pub fn related(product: &Product, products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.product_type == product.product_type && p.id != product.id)
        .take(RELATED_LIMIT)
        .cloned()
        .collect()
}
