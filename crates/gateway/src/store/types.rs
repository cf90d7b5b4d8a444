//! Domain and wire types for the upstream catalog/cart service.
//!
//! The upstream speaks a conventional REST catalog dialect: products and
//! categories are read-only, carts are coarse-grained (one "latest" cart per
//! user, replaced wholesale). Wire structs mirror that JSON exactly; domain
//! structs carry the invariants the gateway guarantees (no duplicate product
//! lines, no zero quantities).

use chrono::{DateTime, Utc};
use rand::Rng;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use nextshop_core::{CartId, Price, ProductId, UserId};

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Option<Rating>,
}

/// Aggregate product rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

/// Sort direction for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// The value the upstream query interface expects.
    #[must_use]
    pub const fn as_query_param(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Filters applied to a product listing.
///
/// `limit` and `sort` are pushed down to the upstream query interface;
/// `category` is always applied locally as an exact match, regardless of
/// upstream capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub limit: u32,
    pub sort: SortOrder,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            limit: 20,
            sort: SortOrder::Ascending,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A single cart line: one product, merged quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A user's cart.
///
/// Invariants (hold for carts returned from any operation): at most one line
/// per `product_id`, no line with quantity 0, lines in first-added order.
/// Authoritative state lives upstream; this value is never cached across
/// calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "products")]
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// A freshly constructed empty cart for a user with no upstream cart.
    ///
    /// The identifier is generated locally; it is the only point in the
    /// system where a cart id is invented rather than read from upstream.
    #[must_use]
    pub fn fresh(user_id: UserId) -> Self {
        let id = rand::rng().random_range(1_000_000..10_000_000_i64);
        Self {
            id: CartId::new(id),
            user_id,
            last_modified: Utc::now(),
            lines: Vec::new(),
        }
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Merge raw cart lines into the canonical form.
///
/// Duplicate `product_id`s are summed into the first occurrence (insertion
/// order preserved) and non-positive quantities are dropped, so the `Cart`
/// invariants hold even when the upstream hands back denormalized data.
#[must_use]
pub fn merge_lines(raw: impl IntoIterator<Item = (ProductId, i64)>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::new();
    for (product_id, quantity) in raw {
        let Ok(quantity) = u32::try_from(quantity) else {
            continue;
        };
        if quantity == 0 {
            continue;
        }
        if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            lines.push(CartLine {
                product_id,
                quantity,
            });
        }
    }
    lines
}

// =============================================================================
// Wire types
// =============================================================================

/// A cart as the upstream serves it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamCart {
    pub id: CartId,
    pub user_id: UserId,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub products: Vec<UpstreamCartLine>,
}

/// A cart line as the upstream serves it. Quantity is signed because the
/// upstream does not enforce positivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamCartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl From<UpstreamCart> for Cart {
    fn from(upstream: UpstreamCart) -> Self {
        let last_modified = upstream
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map_or_else(Utc::now, |d| d.with_timezone(&Utc));

        Self {
            id: upstream.id,
            user_id: upstream.user_id,
            last_modified,
            lines: merge_lines(
                upstream
                    .products
                    .into_iter()
                    .map(|l| (l.product_id, l.quantity)),
            ),
        }
    }
}

/// Request body for the upstream whole-cart replace.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceCartBody {
    pub user_id: UserId,
    pub date: DateTime<Utc>,
    pub products: Vec<CartLine>,
}

// =============================================================================
// Auth
// =============================================================================

/// Request body for the upstream login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response body from the upstream login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// A successful upstream authentication: the credential token plus the user
/// id recovered from its claims.
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub user_id: UserId,
    pub token: SecretString,
}
