//! Newtype IDs for type-safe entity references.
//!
//! Every table in the hosted database uses UUID primary keys. The
//! `define_id!` macro wraps them so a `ProductId` can never be passed where an
//! `OrderId` is expected.

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around `uuid::Uuid` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `generate()`, `as_uuid()`, `short()`
/// - `Display` and `FromStr` using the hyphenated form
///
/// # Example
///
/// ```rust
/// # use digimart_core::define_id;
/// define_id!(WidgetId);
///
/// let id: WidgetId = "0b6f3f5e-8d8a-4a51-9a6e-3c1b2f1d9c11".parse().unwrap();
/// assert_eq!(id.short(), "0b6f3f5e");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random (v4) ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }

            /// First eight hex characters, used as a compact display reference.
            #[must_use]
            pub fn short(&self) -> String {
                let mut s = self.0.simple().to_string();
                s.truncate(8);
                s
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Row IDs, one per remote table
define_id!(ProductId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(ReturnId);
define_id!(ReviewId);
define_id!(ProfileId);
define_id!(UserRoleId);

// Auth user ID (from the auth API, referenced by `user_id` columns)
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RAW: &str = "8f14e45f-ceea-467a-9575-2b3c1d0e5a77";

    #[test]
    fn test_parse_and_display() {
        let id: ProductId = RAW.parse().unwrap();
        assert_eq!(id.to_string(), RAW);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id: OrderId = format!("  {RAW}\n").parse().unwrap();
        assert_eq!(id.to_string(), RAW);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("d1".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_short() {
        let id: OrderId = RAW.parse().unwrap();
        assert_eq!(id.short(), "8f14e45f");
    }

    #[test]
    fn test_serde_transparent() {
        let id: UserId = RAW.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{RAW}\""));
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(ReviewId::generate(), ReviewId::generate());
    }
}
