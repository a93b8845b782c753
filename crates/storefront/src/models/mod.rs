//! Storefront models.
//!
//! Domain types live in `digimart-core` and `digimart-supabase`; this module
//! only holds what the storefront keeps in the session.

pub mod session;

pub use session::{
    Flash, FlashKind, checkout_order_id, keys as session_keys, load_cart, push_flash, store_cart,
    take_flashes,
};
