//! Catalog categories.
//!
//! The `category` column is free text, so products keep it as a string. This
//! enum lists the categories the storefront navigates by and knows labels for.

use serde::{Deserialize, Serialize};

use super::status::{ProductType, UnknownVariant};

/// A browsable catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Design,
    Audio,
    Image,
    Video,
    Template,
    Electronics,
    Clothing,
    Accessories,
    Home,
    Other,
}

impl Category {
    /// Categories shown in the home-page grid, in display order.
    pub const FEATURED: &'static [Self] = &[
        Self::Design,
        Self::Audio,
        Self::Image,
        Self::Template,
        Self::Electronics,
        Self::Accessories,
        Self::Clothing,
        Self::Home,
    ];

    /// Every category, digital first.
    pub const ALL: &'static [Self] = &[
        Self::Design,
        Self::Audio,
        Self::Image,
        Self::Video,
        Self::Template,
        Self::Electronics,
        Self::Clothing,
        Self::Accessories,
        Self::Home,
        Self::Other,
    ];

    /// The value stored in the `category` column and used in `?category=`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Video => "video",
            Self::Template => "template",
            Self::Electronics => "electronics",
            Self::Clothing => "clothing",
            Self::Accessories => "accessories",
            Self::Home => "home",
            Self::Other => "other",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Design => "Design",
            Self::Audio => "Audio",
            Self::Image => "Images",
            Self::Video => "Video",
            Self::Template => "Templates",
            Self::Electronics => "Electronics",
            Self::Clothing => "Clothing",
            Self::Accessories => "Accessories",
            Self::Home => "Home",
            Self::Other => "Other",
        }
    }

    /// The product type this category belongs to.
    #[must_use]
    pub const fn product_type(&self) -> ProductType {
        match self {
            Self::Design | Self::Audio | Self::Image | Self::Video | Self::Template => {
                ProductType::Digital
            }
            Self::Electronics | Self::Clothing | Self::Accessories | Self::Home | Self::Other => {
                ProductType::Physical
            }
        }
    }

    /// Categories that belong to `product_type`, for the admin product form.
    pub fn for_type(product_type: ProductType) -> impl Iterator<Item = Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(move |c| c.product_type() == product_type)
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                kind: "category",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Audio".parse::<Category>().unwrap(), Category::Audio);
        assert!("furniture".parse::<Category>().is_err());
    }

    #[test]
    fn test_for_type_splits_catalog() {
        let digital: Vec<_> = Category::for_type(ProductType::Digital).collect();
        assert_eq!(
            digital,
            vec![
                Category::Design,
                Category::Audio,
                Category::Image,
                Category::Video,
                Category::Template
            ]
        );
        assert_eq!(Category::for_type(ProductType::Physical).count(), 5);
    }
}
