//! Upstream store client implementation.
//!
//! Plain REST over `reqwest` with a bounded per-request timeout. Catalog
//! reads (products, categories) are cached with `moka` for 5 minutes; carts
//! are never cached because they are re-read before every mutation.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use moka::future::Cache;
use secrecy::SecretString;
use tracing::{debug, instrument, warn};

use nextshop_core::{CartId, ProductId, UserId};

use crate::config::GatewayConfig;

use super::StoreError;
use super::types::{
    Cart, CartLine, LoginBody, LoginResponse, Product, ProductFilter, ReplaceCartBody,
    StoreCredentials, UpstreamCart, UpstreamCartLine, merge_lines,
};

/// Catalog cache time-to-live.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Catalog cache capacity bound.
const CACHE_CAPACITY: u64 = 1000;

/// Cached catalog values.
#[derive(Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Arc<Product>),
    Categories(Arc<Vec<String>>),
}

/// Client for the upstream catalog/cart service.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base: String,
    cache: Cache<String, CacheValue>,
}

impl StoreClient {
    /// Create a new upstream store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                base: config.store_api_base.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// GET a JSON resource, mapping non-2xx statuses to [`StoreError`].
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, StoreError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl super::StoreApi for StoreClient {
    #[instrument(skip(self))]
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let cache_key = format!(
            "products:{}:{}",
            filter.limit,
            filter.sort.as_query_param()
        );

        let products = if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for product listing");
            products
        } else {
            let url = products_url(&self.inner.base, filter);
            let products: Arc<Vec<Product>> = Arc::new(self.get_json(&url).await?);
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
                .await;
            products
        };

        // Category filtering is exact-match and always applied locally,
        // regardless of upstream capability.
        Ok(match &filter.category {
            Some(category) => products
                .iter()
                .filter(|p| &p.category == category)
                .cloned()
                .collect(),
            None => products.as_ref().clone(),
        })
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product.as_ref().clone());
        }

        let url = format!("{}/products/{id}", self.inner.base);
        let product: Product = match self.get_json(&url).await {
            Ok(product) => product,
            // The upstream answers an unknown product id with 404 or an
            // empty body.
            Err(StoreError::Status(404) | StoreError::Parse(_)) => {
                return Err(StoreError::NotFound(format!("Product {id} not found")));
            }
            Err(e) => return Err(e),
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Arc::new(product.clone())))
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let url = format!("{}/products/categories", self.inner.base);
        let categories: Vec<String> = self.get_json(&url).await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;
        Ok(categories)
    }

    #[instrument(skip(self, password))]
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<StoreCredentials, StoreError> {
        let url = format!("{}/auth/login", self.inner.base);
        let response = self
            .inner
            .client
            .post(&url)
            .json(&LoginBody { username, password })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StoreError::LoginRejected);
        }
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }

        let body: LoginResponse = response.json().await?;
        let user_id = user_id_from_token(&body.token).ok_or(StoreError::LoginRejected)?;

        Ok(StoreCredentials {
            user_id,
            token: SecretString::from(body.token),
        })
    }

    #[instrument(skip(self))]
    async fn cart_for_user(&self, user_id: UserId) -> Cart {
        let url = format!("{}/carts/user/{user_id}", self.inner.base);

        // Absence and transient failure are indistinguishable here, so both
        // become an empty cart rather than blocking the user.
        let carts: Vec<UpstreamCart> = match self.get_json(&url).await {
            Ok(carts) => carts,
            Err(e) => {
                warn!(%user_id, error = %e, "Cart fetch failed, treating as empty cart");
                return Cart::fresh(user_id);
            }
        };

        latest_cart(carts).map_or_else(|| Cart::fresh(user_id), Cart::from)
    }

    #[instrument(skip(self, lines))]
    async fn replace_cart(
        &self,
        cart_id: CartId,
        user_id: UserId,
        lines: &[CartLine],
    ) -> Result<Cart, StoreError> {
        let url = format!("{}/carts/{cart_id}", self.inner.base);
        let body = ReplaceCartBody {
            user_id,
            date: chrono::Utc::now(),
            products: lines.to_vec(),
        };

        let response = self.inner.client.put(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }

        let echoed: ReplacedCart = response.json().await?;
        Ok(echoed.into_cart(cart_id, user_id, lines))
    }
}

/// The upstream's echo of a cart replace. Fields are optional because the
/// echo is not guaranteed to be complete.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplacedCart {
    id: Option<CartId>,
    date: Option<String>,
    products: Option<Vec<UpstreamCartLine>>,
}

impl ReplacedCart {
    /// Build the resulting cart, falling back to what was sent wherever the
    /// echo is silent. The identifier comes from the upstream response when
    /// supplied, else the previous cart's identifier is retained.
    fn into_cart(self, previous_id: CartId, user_id: UserId, sent: &[CartLine]) -> Cart {
        let last_modified = self
            .date
            .as_deref()
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
            .map_or_else(chrono::Utc::now, |d| d.with_timezone(&chrono::Utc));

        let lines = self.products.map_or_else(
            || sent.to_vec(),
            |products| merge_lines(products.into_iter().map(|l| (l.product_id, l.quantity))),
        );

        Cart {
            id: self.id.unwrap_or(previous_id),
            user_id,
            last_modified,
            lines,
        }
    }
}

/// Build the product listing URL. `limit` and `sort` are pushed down to the
/// upstream query interface; `category` never is (it is filtered locally).
fn products_url(base: &str, filter: &ProductFilter) -> String {
    format!(
        "{base}/products?limit={}&sort={}",
        filter.limit,
        filter.sort.as_query_param()
    )
}

/// Pick the user's latest cart: newest date wins, highest id breaks ties.
fn latest_cart(carts: Vec<UpstreamCart>) -> Option<UpstreamCart> {
    carts.into_iter().max_by_key(|c| {
        let date = c
            .date
            .as_deref()
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok());
        (date, c.id)
    })
}

/// Recover the numeric user id from the upstream's JWT credential token.
///
/// The gateway is a client of the upstream, not its verifier, so the claims
/// segment is decoded without signature verification.
fn user_id_from_token(token: &str) -> Option<UserId> {
    let claims_segment = token.split('.').nth(1)?;
    let claims = URL_SAFE_NO_PAD.decode(claims_segment).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&claims).ok()?;
    claims.get("sub").and_then(serde_json::Value::as_i64).map(UserId::new)
}
