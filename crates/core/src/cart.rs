//! Session-scoped shopping cart.
//!
//! The cart maps products to quantities and keeps two derived aggregates,
//! the item count and the subtotal. Aggregates are recomputed after every
//! mutation and are never written independently, so they always agree with
//! the lines. All operations are total and perform no I/O; the cart is
//! serialized into the server-side session between requests.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, ProductType};

/// Product snapshot captured when an item is added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub original_unit_price: Option<Price>,
    pub image: String,
    pub product_type: ProductType,
}

/// One line of the cart. Quantity is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub original_unit_price: Option<Price>,
    pub image: String,
    pub product_type: ProductType,
    pub quantity: u32,
}

impl CartLine {
    fn new(product: CartProduct, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            unit_price: product.unit_price,
            original_unit_price: product.original_unit_price,
            image: product.image,
            product_type: product.product_type,
            quantity,
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Ordered product lines with derived totals.
///
/// ```
/// use digimart_core::{Cart, CartProduct, Price, ProductId, ProductType};
///
/// let mut cart = Cart::new();
/// let id = ProductId::generate();
/// cart.add_item(
///     CartProduct {
///         product_id: id,
///         name: "Premium UI Kit".into(),
///         unit_price: Price::from_dong(100_000),
///         original_unit_price: None,
///         image: String::new(),
///         product_type: ProductType::Digital,
///     },
///     2,
/// );
/// assert_eq!(cart.item_count(), 2);
/// assert_eq!(cart.subtotal(), Price::from_dong(200_000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    lines: Vec<CartLine>,
    item_count: u32,
    subtotal: Price,
}

/// Session representation. Aggregates are rebuilt from the lines on load.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Self {
            lines: stored.lines,
            ..Self::default()
        };
        cart.lines.retain(|line| line.quantity >= 1);
        cart.recompute();
        cart
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `product`.
    ///
    /// Increments the existing line for the same product, or appends a new
    /// line. A zero quantity leaves the cart unchanged.
    pub fn add_item(&mut self, product: CartProduct, quantity: u32) {
        if quantity == 0 {
            return;
        }

        match self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.product_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine::new(product, quantity)),
        }
        self.recompute();
    }

    /// Set the quantity of a line. Values below 1 remove the line.
    ///
    /// Unknown product ids are ignored.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity < 1 {
            self.remove_item(product_id);
            return;
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            self.recompute();
        }
    }

    /// Remove the line for `product_id`, if any.
    pub fn remove_item(&mut self, product_id: ProductId) {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        if self.lines.len() != before {
            self.recompute();
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub const fn subtotal(&self) -> Price {
        self.subtotal
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when any line is a physical product.
    #[must_use]
    pub fn requires_shipping(&self) -> bool {
        self.lines
            .iter()
            .any(|line| line.product_type.requires_shipping())
    }

    fn recompute(&mut self) {
        self.item_count = self
            .lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity));
        self.subtotal = self.lines.iter().map(CartLine::line_total).sum();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::discount_percent;

    fn product(price: u64, product_type: ProductType) -> CartProduct {
        CartProduct {
            product_id: ProductId::generate(),
            name: "Test product".to_owned(),
            unit_price: Price::from_dong(price),
            original_unit_price: None,
            image: "https://images.example.com/p.jpg".to_owned(),
            product_type,
        }
    }

    fn recomputed(cart: &Cart) -> (u32, Price) {
        let count = cart.lines().iter().map(|l| l.quantity).sum();
        let subtotal = cart
            .lines()
            .iter()
            .map(|l| l.unit_price.times(l.quantity))
            .sum();
        (count, subtotal)
    }

    #[test]
    fn test_add_same_product_sums_quantity() {
        let mut cart = Cart::new();
        let a = product(100_000, ProductType::Digital);

        cart.add_item(a.clone(), 1);
        cart.add_item(a.clone(), 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(a.product_id).unwrap().quantity, 3);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Price::from_dong(300_000));
    }

    #[test]
    fn test_two_products_then_zero_quantity() {
        let mut cart = Cart::new();
        let a = product(50_000, ProductType::Physical);
        let b = product(70_000, ProductType::Digital);

        cart.add_item(a.clone(), 1);
        cart.add_item(b.clone(), 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal(), Price::from_dong(120_000));

        cart.update_quantity(a.product_id, 0);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal(), Price::from_dong(70_000));
        assert!(cart.line(a.product_id).is_none());
    }

    #[test]
    fn test_negative_quantity_removes_line() {
        let mut cart = Cart::new();
        let a = product(10_000, ProductType::Digital);
        cart.add_item(a.clone(), 4);

        cart.update_quantity(a.product_id, -1);

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal(), Price::ZERO);
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::new();
        let a = product(10_000, ProductType::Digital);
        cart.add_item(a.clone(), 1);

        cart.update_quantity(a.product_id, 7);

        assert_eq!(cart.item_count(), 7);
        assert_eq!(cart.subtotal(), Price::from_dong(70_000));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(product(10_000, ProductType::Digital), 1);
        let before = cart.clone();

        cart.update_quantity(ProductId::generate(), 5);

        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_missing_id_leaves_state_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(product(10_000, ProductType::Digital), 2);
        let before = cart.clone();

        cart.remove_item(ProductId::generate());

        assert_eq!(cart, before);
    }

    #[test]
    fn test_clear_resets_aggregates() {
        let mut cart = Cart::new();
        cart.add_item(product(10_000, ProductType::Digital), 2);
        cart.add_item(product(20_000, ProductType::Physical), 1);

        cart.clear();

        assert!(cart.lines().is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal(), Price::ZERO);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(product(10_000, ProductType::Digital), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_aggregates_match_recomputation_after_mixed_ops() {
        let mut cart = Cart::new();
        let a = product(12_500, ProductType::Digital);
        let b = product(99_000, ProductType::Physical);
        let c = product(1_000, ProductType::Physical);

        cart.add_item(a.clone(), 3);
        cart.add_item(b.clone(), 1);
        cart.add_item(c.clone(), 10);
        cart.update_quantity(b.product_id, 4);
        cart.remove_item(c.product_id);
        cart.add_item(a, 1);

        assert_eq!((cart.item_count(), cart.subtotal()), recomputed(&cart));
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        let a = product(1, ProductType::Digital);
        let b = product(2, ProductType::Digital);
        cart.add_item(a.clone(), 1);
        cart.add_item(b.clone(), 1);
        cart.add_item(a.clone(), 1);

        let ids: Vec<_> = cart.lines().iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![a.product_id, b.product_id]);
    }

    #[test]
    fn test_requires_shipping() {
        let mut cart = Cart::new();
        cart.add_item(product(1, ProductType::Digital), 1);
        assert!(!cart.requires_shipping());
        cart.add_item(product(1, ProductType::Physical), 1);
        assert!(cart.requires_shipping());
    }

    #[test]
    fn test_session_round_trip_rebuilds_aggregates() {
        let mut cart = Cart::new();
        cart.add_item(product(40_000, ProductType::Physical), 2);

        let mut json = serde_json::to_value(&cart).unwrap();
        // Stale aggregates in storage are ignored
        json["item_count"] = serde_json::json!(999);

        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.item_count(), 2);
    }

    #[test]
    fn test_cart_line_discount() {
        let mut p = product(100_000, ProductType::Digital);
        p.original_unit_price = Some(Price::from_dong(150_000));
        let mut cart = Cart::new();
        cart.add_item(p.clone(), 1);

        let line = cart.line(p.product_id).unwrap();
        assert_eq!(
            discount_percent(line.unit_price, line.original_unit_price.unwrap()),
            Some(33)
        );
    }
}
