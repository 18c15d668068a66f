//! REST API client implementation.
//!
//! Uses `reqwest` for HTTP and caches product and category reads with `moka`.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use shopfront_core::{
    ApiEnvelope, AuthPayload, Cart, Category, CategoryId, Email, LoginRequest, Product, ProductId,
    ProductPage, ProductQuery, RegisterRequest, UpdateProfileRequest, UserProfile,
};

use super::ApiError;
use super::cache::{CacheKey, CacheValue};
use crate::config::ApiConfig;

const CACHE_CAPACITY: u64 = 1000;
const LOGGED_BODY_CHARS: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Shopfront REST API.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

/// A mutating cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMutation {
    /// `POST /cart`
    Add { product_id: ProductId, quantity: u32 },
    /// `PUT /cart/:productId`
    SetQuantity { product_id: ProductId, quantity: u32 },
    /// `DELETE /cart/:productId`
    Remove { product_id: ProductId },
    /// `DELETE /cart`
    Clear,
}

/// Outcome of a cart mutation followed by a cart refetch.
#[derive(Debug)]
pub struct CartSync {
    /// Result of the mutation itself.
    pub mutation: Result<(), ApiError>,
    /// The cart as the API reports it afterwards.
    pub cart: Result<Cart, ApiError>,
}

impl CartSync {
    /// Whether either call reported an expired session.
    #[must_use]
    pub fn session_expired(&self) -> bool {
        matches!(self.mutation, Err(ApiError::Unauthorized))
            || matches!(self.cart, Err(ApiError::Unauthorized))
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shopfront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Build the absolute URL for an endpoint path.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{path}", self.inner.base_url))?)
    }

    /// Start a request, attaching the bearer token when one is given.
    fn request(&self, method: Method, url: Url, token: Option<&SecretString>) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and unwrap the response envelope.
    ///
    /// Returns the envelope's `data`, which may legitimately be absent for
    /// acknowledgement-style responses.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            debug!("API rejected bearer token");
            return Err(ApiError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("Request failed");
            let message = serde_json::from_str::<ApiEnvelope<IgnoredAny>>(&body)
                .map_or_else(|_| fallback.to_string(), |envelope| envelope.message_or(fallback));

            tracing::warn!(status = %status, message = %message, "API returned non-success status");

            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(message));
            }
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })?;

        if !envelope.success {
            let message = envelope.message_or("Request failed");
            tracing::warn!(status = %status, message = %message, "API reported success: false");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(envelope.data)
    }

    /// Send a request whose envelope must carry data.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request).await?.ok_or(ApiError::MissingData)
    }

    /// Send a request whose data, if any, is irrelevant.
    async fn acknowledge(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send::<IgnoredAny>(request).await.map(|_| ())
    }

    async fn cache_get(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn cache_put(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange credentials for a token (`POST /auth/login`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` or `Rejected` for bad credentials, or an error
    /// if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthPayload, ApiError> {
        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let request = self.request(Method::POST, self.url("/auth/login")?, None).json(&body);
        self.fetch(request).await
    }

    /// Create an account and receive a token (`POST /auth/register`).
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the API refuses the registration (e.g. the email
    /// is taken), or an error if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthPayload, ApiError> {
        let body = RegisterRequest {
            name,
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let request = self.request(Method::POST, self.url("/auth/register")?, None).json(&body);
        self.fetch(request).await
    }

    /// Fetch the token owner's profile (`GET /auth/profile`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn get_profile(&self, token: &SecretString) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::GET, self.url("/auth/profile")?, Some(token));
        self.fetch(request).await
    }

    /// Update the token owner's profile (`PUT /auth/profile`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid, or `Rejected`
    /// if the API refuses the update.
    #[instrument(skip(self, token))]
    pub async fn update_profile(
        &self,
        token: &SecretString,
        update: &UpdateProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .request(Method::PUT, self.url("/auth/profile")?, Some(token))
            .json(update);
        self.fetch(request).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products (`GET /products`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(search = ?query.search, sort = query.sort.as_param(), page = query.page))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(page)) = self.cache_get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(page);
        }

        let mut url = self.url("/products")?;
        url.query_pairs_mut()
            .extend_pairs(query.to_params().iter().map(|(k, v)| (*k, v.as_str())));

        let page: ProductPage = self.fetch(self.request(Method::GET, url, None)).await?;

        self.cache_put(key, CacheValue::Products(page.clone())).await;
        Ok(page)
    }

    /// Get a product by ID (`GET /products/:id`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache_get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.url(&format!("/products/{id}"))?;
        let product: Product = self.fetch(self.request(Method::GET, url, None)).await?;

        self.cache_put(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// List all categories (`GET /categories`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache_get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.url("/categories")?;
        let categories: Vec<Category> = self.fetch(self.request(Method::GET, url, None)).await?;

        self.cache_put(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Get a category by ID (`GET /categories/:id`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ApiError> {
        let key = CacheKey::Category(id);
        if let Some(CacheValue::Category(category)) = self.cache_get(&key).await {
            debug!("Cache hit for category");
            return Ok(category);
        }

        let url = self.url(&format!("/categories/{id}"))?;
        let category: Category = self.fetch(self.request(Method::GET, url, None)).await?;

        self.cache_put(key, CacheValue::Category(category.clone())).await;
        Ok(category)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the token owner's cart (`GET /cart`). Never cached.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid, or an error if
    /// the API request fails.
    #[instrument(skip_all)]
    pub async fn get_cart(&self, token: &SecretString) -> Result<Cart, ApiError> {
        let request = self.request(Method::GET, self.url("/cart")?, Some(token));
        self.fetch(request).await
    }

    /// Add units of a product to the cart (`POST /cart`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid, or `Rejected`
    /// if the API refuses the quantity.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, self.url("/cart")?, Some(token))
            .json(&json!({ "productId": product_id, "quantity": quantity }));
        self.acknowledge(request).await
    }

    /// Set the quantity of a cart line (`PUT /cart/:productId`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid, or `Rejected`
    /// if the API refuses the quantity.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, self.url(&format!("/cart/{product_id}"))?, Some(token))
            .json(&json!({ "quantity": quantity }));
        self.acknowledge(request).await
    }

    /// Remove a product from the cart (`DELETE /cart/:productId`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/cart/{product_id}"))?;
        self.acknowledge(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    /// Empty the cart (`DELETE /cart`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn clear_cart(&self, token: &SecretString) -> Result<(), ApiError> {
        let url = self.url("/cart")?;
        self.acknowledge(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    /// Apply a cart mutation, then refetch the whole cart.
    ///
    /// The refetch happens whether or not the mutation succeeded, so the
    /// caller always renders the cart the API actually holds. The only
    /// exception is an expired session, where a refetch cannot succeed.
    #[instrument(skip(self, token))]
    pub async fn mutate_and_refetch(&self, token: &SecretString, mutation: CartMutation) -> CartSync {
        let result = match mutation {
            CartMutation::Add {
                product_id,
                quantity,
            } => self.add_to_cart(token, product_id, quantity).await,
            CartMutation::SetQuantity {
                product_id,
                quantity,
            } => self.update_cart_item(token, product_id, quantity).await,
            CartMutation::Remove { product_id } => self.remove_cart_item(token, product_id).await,
            CartMutation::Clear => self.clear_cart(token).await,
        };

        if let Err(ApiError::Unauthorized) = result {
            return CartSync {
                mutation: result,
                cart: Err(ApiError::Unauthorized),
            };
        }

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Cart mutation failed, refetching cart");
        }

        let cart = self.get_cart(token).await;
        CartSync {
            mutation: result,
            cart,
        }
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Whether the API is reachable and answering below 500.
    pub async fn ping(&self) -> bool {
        let Ok(url) = self.url("/categories") else {
            return false;
        };

        match self.send::<IgnoredAny>(self.request(Method::GET, url, None)).await {
            Ok(_) | Err(ApiError::Unauthorized | ApiError::NotFound(_) | ApiError::RateLimited(_)) => {
                true
            }
            Err(ApiError::Rejected { status, .. }) => status < 500,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;
    use shopfront_core::{CartItemId, SortOrder};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, cache_ttl: Duration) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: Url::parse(&format!("{}/api/", server.uri())).unwrap(),
            timeout: Duration::from_secs(5),
            cache_ttl,
        })
        .unwrap()
    }

    fn ok(data: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
    }

    fn token() -> SecretString {
        SecretString::from("token-abc")
    }

    fn product_json(id: i64, stock: u32) -> Value {
        json!({ "id": id, "name": format!("Product {id}"), "price": 10, "stock": stock })
    }

    #[tokio::test]
    async fn test_login_posts_credentials_and_decodes_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "hunter22" })))
            .respond_with(ok(json!({
                "token": "jwt-1",
                "user": { "id": 5, "name": "Ana", "email": "ana@example.com" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let payload = client
            .login(
                &Email::parse("ana@example.com").unwrap(),
                &SecretString::from("hunter22"),
            )
            .await
            .unwrap();

        assert_eq!(payload.token, "jwt-1");
        assert_eq!(payload.user.name, "Ana");
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/profile"))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ok(json!({ "id": 5, "name": "Ana", "email": "ana@example.com" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let profile = client.get_profile(&token()).await.unwrap();
        assert_eq!(profile.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_update_profile_puts_changed_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/auth/profile"))
            .and(header("authorization", "Bearer token-abc"))
            .and(body_json(json!({ "name": "Ana Lima", "phone": "555-0100" })))
            .respond_with(ok(json!({
                "id": 5, "name": "Ana Lima", "email": "ana@example.com", "phone": "555-0100"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = UpdateProfileRequest {
            name: Some("Ana Lima".to_string()),
            phone: Some("555-0100".to_string()),
        };
        let client = client_for(&server, Duration::ZERO);
        let profile = client.update_profile(&token(), &update).await.unwrap();

        assert_eq!(profile.name, "Ana Lima");
        assert_eq!(profile.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_update_profile_omits_absent_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/auth/profile"))
            .and(body_json(json!({ "name": "Ana" })))
            .respond_with(ok(json!({ "id": 5, "name": "Ana", "email": "ana@example.com" })))
            .expect(1)
            .mount(&server)
            .await;

        let update = UpdateProfileRequest {
            name: Some("Ana".to_string()),
            phone: None,
        };
        let client = client_for(&server, Duration::ZERO);
        assert!(client.update_profile(&token(), &update).await.is_ok());
    }

    #[tokio::test]
    async fn test_401_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "success": false, "message": "Token expired" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let err = client.get_cart(&token()).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_error_envelope_message_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "success": false, "message": "Email already registered" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let err = client
            .register(
                "Ana",
                &Email::parse("ana@example.com").unwrap(),
                &SecretString::from("hunter22"),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Rejected { status: 400, ref message } if message == "Email already registered"
        ));
    }

    #[tokio::test]
    async fn test_success_false_with_200_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": false, "message": "Maintenance" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let err = client.list_categories().await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/99"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let err = client.get_product(ProductId::new(99)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref message) if message == "Not Found"));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let err = client.list_categories().await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(30)));
    }

    #[tokio::test]
    async fn test_missing_data_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let err = client.get_product(ProductId::new(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingData));
    }

    #[tokio::test]
    async fn test_list_products_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("search", "lamp"))
            .and(query_param("sort", "price_asc"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "12"))
            .respond_with(ok(json!({
                "products": [product_json(1, 3)],
                "pagination": { "page": 2, "limit": 12, "total": 13, "pages": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let query = ProductQuery {
            search: Some("lamp".to_string()),
            sort: SortOrder::PriceAsc,
            category: None,
            page: 2,
            limit: 12,
        };
        let page = client.list_products(&query).await.unwrap();

        assert_eq!(page.products.len(), 1);
        assert!(page.pagination.has_previous());
        assert!(!page.pagination.has_next());
    }

    #[tokio::test]
    async fn test_product_reads_are_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/7"))
            .respond_with(ok(product_json(7, 2)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(60));
        let first = client.get_product(ProductId::new(7)).await.unwrap();
        let second = client.get_product(ProductId::new(7)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ok(json!([{ "id": 1, "name": "Lighting" }])))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        client.list_categories().await.unwrap();
        client.list_categories().await.unwrap();
    }

    #[tokio::test]
    async fn test_cart_is_never_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ok(json!({ "items": [], "subtotal": 0, "itemCount": 0 })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(60));
        client.get_cart(&token()).await.unwrap();
        client.get_cart(&token()).await.unwrap();
    }

    #[tokio::test]
    async fn test_mutation_is_followed_by_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/10"))
            .and(body_json(json!({ "quantity": 3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ok(json!({
                "items": [{ "id": 1, "quantity": 3, "product": product_json(10, 5) }],
                "subtotal": 30,
                "itemCount": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let sync = client
            .mutate_and_refetch(
                &token(),
                CartMutation::SetQuantity {
                    product_id: ProductId::new(10),
                    quantity: 3,
                },
            )
            .await;

        assert!(sync.mutation.is_ok());
        let cart = sync.cart.unwrap();
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.items[0].id, CartItemId::new(1));
    }

    #[tokio::test]
    async fn test_failed_mutation_still_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .and(body_json(json!({ "productId": 10, "quantity": 2 })))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "success": false, "message": "Insufficient stock" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ok(json!({ "items": [], "subtotal": 0, "itemCount": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let sync = client
            .mutate_and_refetch(
                &token(),
                CartMutation::Add {
                    product_id: ProductId::new(10),
                    quantity: 2,
                },
            )
            .await;

        assert_eq!(sync.mutation.unwrap_err().shopper_message(), "Insufficient stock");
        assert!(sync.cart.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_deletes_cart_and_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ok(json!({ "items": [], "subtotal": 0, "itemCount": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let sync = client.mutate_and_refetch(&token(), CartMutation::Clear).await;

        assert!(sync.mutation.is_ok());
        assert!(sync.cart.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_mutation_skips_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ok(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::ZERO);
        let sync = client.mutate_and_refetch(&token(), CartMutation::Clear).await;
        assert!(sync.session_expired());
    }

    #[tokio::test]
    async fn test_ping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ok(json!([])))
            .mount(&server)
            .await;

        assert!(client_for(&server, Duration::ZERO).ping().await);

        let down = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&down)
            .await;
        assert!(!client_for(&down, Duration::ZERO).ping().await);
    }
}
