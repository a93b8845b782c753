//! Session-related types.
//!
//! Everything the storefront remembers about a browser lives in the
//! server-side session: the auth session, the cart and pending notifications.

use digimart_core::{Cart, OrderId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for the signed-in user's [`digimart_supabase::AuthSession`].
    pub const AUTH_SESSION: &str = "auth_session";

    /// Key for the [`digimart_supabase::AdminCapability`] of an admin user.
    pub const ADMIN: &str = "admin";

    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the order id reserved for the current cart's checkout.
    pub const CHECKOUT_ORDER_ID: &str = "checkout_order_id";

    /// Key for queued flash notifications.
    pub const FLASH: &str = "flash";
}

/// Flash notification style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A one-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub title: String,
    pub message: Option<String>,
}

impl Flash {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            title: title.into(),
            message: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            title: title.into(),
            message: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            title: title.into(),
            message: None,
        }
    }

    /// Add a second line of detail.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Queue a flash notification.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn push_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<Flash> = session.get(keys::FLASH).await?.unwrap_or_default();
    queued.push(flash);
    session.insert(keys::FLASH, queued).await
}

/// Remove and return every queued notification.
///
/// A session read failure yields no notifications.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// The session's cart, or a new empty one.
///
/// An unreadable stored cart is discarded rather than failing the request.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart");
            Cart::new()
        }
    }
}

/// Store the cart back into the session.
///
/// Any stored cart is a new checkout, so the reserved order id is dropped.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await?;
    session.remove::<OrderId>(keys::CHECKOUT_ORDER_ID).await?;
    Ok(())
}

/// The order id for checking out the current cart.
///
/// The first call reserves a fresh id; later calls return the same one until
/// the cart is stored again, so a resubmitted checkout targets the same order.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn checkout_order_id(session: &Session) -> Result<OrderId, tower_sessions::session::Error> {
    if let Some(id) = session.get::<OrderId>(keys::CHECKOUT_ORDER_ID).await? {
        return Ok(id);
    }

    let id = OrderId::generate();
    session.insert(keys::CHECKOUT_ORDER_ID, id).await?;
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use digimart_core::{CartProduct, Price, ProductId, ProductType};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flashes_are_consumed_once() {
        let session = session();
        push_flash(&session, Flash::success("Order placed")).await.unwrap();
        push_flash(&session, Flash::error("Oops").with_message("try again"))
            .await
            .unwrap();

        let flashes = take_flashes(&session).await;
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].kind, FlashKind::Success);
        assert_eq!(flashes[1].message.as_deref(), Some("try again"));

        assert!(take_flashes(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_cart_round_trips_through_session() {
        let session = session();
        assert!(load_cart(&session).await.is_empty());

        let mut cart = Cart::new();
        cart.add_item(
            CartProduct {
                product_id: ProductId::generate(),
                name: "Font pack".to_string(),
                unit_price: Price::from_dong(99_000),
                original_unit_price: None,
                image: String::new(),
                product_type: ProductType::Digital,
            },
            2,
        );
        store_cart(&session, &cart).await.unwrap();

        let loaded = load_cart(&session).await;
        assert_eq!(loaded.item_count(), 2);
        assert_eq!(loaded.subtotal(), Price::from_dong(198_000));
    }

    #[tokio::test]
    async fn test_checkout_order_id_survives_retries_until_cart_changes() {
        let session = session();

        let first = checkout_order_id(&session).await.unwrap();
        assert_eq!(checkout_order_id(&session).await.unwrap(), first);

        store_cart(&session, &Cart::new()).await.unwrap();
        assert_ne!(checkout_order_id(&session).await.unwrap(), first);
    }
}
