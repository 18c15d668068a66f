//! End-to-end test harness for the Shopfront storefront.
//!
//! Each [`TestApp`] serves the real router on an ephemeral port, points it at
//! a fresh `wiremock` server standing in for the REST API, and drives it with
//! a cookie-carrying `reqwest` client that does not follow redirects.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = TestApp::spawn().await;
//! app.mock_login("ana@example.com", "jwt-1").await;
//!
//! let resp = app.login("ana@example.com", "hunter22", None).await;
//! assert_eq!(resp.status(), StatusCode::SEE_OTHER);
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, Response, redirect::Policy};
use serde_json::{Value, json};
use shopfront_storefront::{app, config::StorefrontConfig, state::AppState};
use url::Url;
use wiremock::matchers::{body_json, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Prefix every mocked API path lives under.
pub const API_PREFIX: &str = "/api";

/// A running storefront plus its mocked API.
pub struct TestApp {
    pub addr: SocketAddr,
    pub api: MockServer,
    pub client: Client,
}

impl TestApp {
    /// Start a storefront with caching disabled.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Start a storefront after adjusting its configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let api = MockServer::start().await;
        let api_base = Url::parse(&format!("{}{API_PREFIX}", api.uri())).expect("mock server URL");

        let mut config = StorefrontConfig::with_api_base_url(api_base);
        config.api.cache_ttl = Duration::ZERO;
        configure(&mut config);

        let state = AppState::new(config).expect("Failed to build app state");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app(state).into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self { addr, api, client }
    }

    /// Absolute storefront URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET a storefront page.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET a storefront page the way HTMX does.
    pub async fn htmx_get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .header("HX-Current-URL", self.url(path))
            .send()
            .await
            .expect("HTMX GET request failed")
    }

    /// POST a form the way HTMX does, from the page at `current`.
    pub async fn htmx_post(&self, path: &str, current: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .header("HX-Current-URL", self.url(current))
            .form(form)
            .send()
            .await
            .expect("HTMX POST request failed")
    }

    /// Submit the login form.
    pub async fn login(&self, email: &str, password: &str, redirect: Option<&str>) -> Response {
        let mut form = vec![("email", email), ("password", password)];
        if let Some(redirect) = redirect {
            form.push(("redirect", redirect));
        }
        self.client
            .post(self.url("/auth/login"))
            .form(&form)
            .send()
            .await
            .expect("Login request failed")
    }

    /// Mount `POST /auth/login` accepting `email` with password `hunter22`,
    /// plus the one profile check that confirms the new token.
    pub async fn mock_login(&self, email: &str, token: &str) {
        Mock::given(method("POST"))
            .and(path(api_path("/auth/login")))
            .and(body_json(json!({ "email": email, "password": "hunter22" })))
            .respond_with(ok(json!({
                "token": token,
                "user": { "id": 5, "name": "Ana", "email": email }
            })))
            .mount(&self.api)
            .await;
        self.mock_profile_once(token, email).await;
    }

    /// Answer a single `GET /auth/profile` for `token`.
    ///
    /// Later profile mocks take over once this one has been used.
    pub async fn mock_profile_once(&self, token: &str, email: &str) {
        Mock::given(method("GET"))
            .and(path(api_path("/auth/profile")))
            .and(header_matcher("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ok(json!({ "id": 5, "name": "Ana", "email": email })))
            .up_to_n_times(1)
            .mount(&self.api)
            .await;
    }

    /// Log in as Ana and return the storefront's response.
    pub async fn login_as_ana(&self) -> Response {
        self.mock_login("ana@example.com", "jwt-ana").await;
        self.login("ana@example.com", "hunter22", None).await
    }
}

/// Full mock path for an API endpoint.
#[must_use]
pub fn api_path(endpoint: &str) -> String {
    format!("{API_PREFIX}{endpoint}")
}

/// A successful envelope around `data`.
#[must_use]
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

/// A failed envelope with `status` and `message`.
#[must_use]
pub fn fail(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "success": false, "message": message }))
}

/// A product as the API returns it.
#[must_use]
pub fn product_json(id: i64, name: &str, stock: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": "19.99",
        "stock": stock,
        "images": [],
        "rating": 4.2,
        "reviewCount": 3
    })
}

/// A cart holding `quantity` of one product.
#[must_use]
pub fn cart_json(product: &Value, quantity: u32) -> Value {
    json!({
        "items": [{ "id": 1, "quantity": quantity, "product": product }],
        "subtotal": "39.98",
        "itemCount": quantity
    })
}

/// Header value as a string, or "" when absent.
#[must_use]
pub fn header(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
