//! Enumerations stored as text columns in the hosted database.
//!
//! Every enum serializes to its snake_case wire value and round-trips through
//! `Display`/`FromStr`, so the same type works for row decoding, query filters
//! and HTML form values.

use serde::{Deserialize, Serialize};

/// A string did not match any variant of a wire enum.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The value stored in the database.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Human-readable label for badges and select options.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Order lifecycle status.
    ///
    /// Transitions are unrestricted: an admin may move an order from any
    /// status to any other.
    OrderStatus, "order status" {
        Pending => "pending", "Pending",
        Processing => "processing", "Processing",
        Shipped => "shipped", "Shipped",
        Delivered => "delivered", "Delivered",
        Cancelled => "cancelled", "Cancelled",
    }
}

wire_enum! {
    /// Return / refund request status.
    ReturnStatus, "return status" {
        Requested => "requested", "Requested",
        Approved => "approved", "Approved",
        Rejected => "rejected", "Rejected",
        Received => "received", "Received",
        Refunded => "refunded", "Refunded",
    }
}

wire_enum! {
    /// Whether a product ships or is downloaded.
    ProductType, "product type" {
        Physical => "physical", "Physical",
        Digital => "digital", "Digital",
    }
}

wire_enum! {
    /// Application role granted through `user_roles`.
    AppRole, "role" {
        Admin => "admin", "Admin",
        Moderator => "moderator", "Moderator",
        User => "user", "User",
    }
}

wire_enum! {
    /// Payment method chosen at checkout.
    PaymentMethod, "payment method" {
        Paypal => "paypal", "PayPal",
        Momo => "momo", "MoMo",
        Card => "card", "Credit card",
    }
}

wire_enum! {
    /// Payment status recorded on an order.
    ///
    /// The column is free text; values outside this set are kept as strings
    /// by the row types and shown verbatim.
    PaymentStatus, "payment status" {
        Pending => "pending", "Pending",
        Paid => "paid", "Paid",
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for ReturnStatus {
    fn default() -> Self {
        Self::Requested
    }
}

impl OrderStatus {
    /// CSS modifier used for the status badge.
    #[must_use]
    pub const fn badge(&self) -> &'static str {
        match self {
            Self::Pending => "warning",
            Self::Processing | Self::Shipped => "info",
            Self::Delivered => "success",
            Self::Cancelled => "danger",
        }
    }
}

impl ReturnStatus {
    /// CSS modifier used for the status badge.
    #[must_use]
    pub const fn badge(&self) -> &'static str {
        match self {
            Self::Requested => "warning",
            Self::Approved | Self::Received => "info",
            Self::Refunded => "success",
            Self::Rejected => "danger",
        }
    }
}

impl ProductType {
    /// Whether this product needs a shipping address.
    #[must_use]
    pub const fn requires_shipping(&self) -> bool {
        matches!(self, Self::Physical)
    }
}
