//! HTTP surface. Every storefront route is scoped to a browser session key:
//! `/api/v1/sessions/:session/...`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::aggregates::{Avatar, CartLine, CheckoutError, DeliveryAddress, OrderRecord, SavedAddress, TimelineStep};
use crate::domain::value_objects::{LineKey, Money, PaymentMethod, ProductId, ValidationError};
use crate::ports::{AuthError, DocumentStore, IdentityProvider, UserIdentity};
use crate::services::orders::{PaymentOutcome, SubmitOutcome};
use crate::services::CartView;
use crate::session::CheckoutView;
use crate::state::AppState;
use crate::StorefrontError;

type ApiResult<T> = std::result::Result<T, StorefrontError>;

pub fn router<S, I>(state: AppState<S, I>) -> Router
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let session_routes = Router::new()
        .route("/sign-in", post(sign_in::<S, I>))
        .route("/sign-up", post(sign_up::<S, I>))
        .route("/sign-out", post(sign_out::<S, I>))
        .route("/me", get(me::<S, I>))
        .route("/cart", get(get_cart::<S, I>).delete(clear_cart::<S, I>))
        .route("/cart/items", post(add_item::<S, I>).put(set_quantity::<S, I>).delete(remove_item::<S, I>))
        .route("/checkout", get(get_checkout::<S, I>).delete(cancel_checkout::<S, I>))
        .route("/checkout/cart", post(checkout_from_cart::<S, I>))
        .route("/checkout/buy-now", post(buy_now::<S, I>))
        .route("/checkout/address", put(set_checkout_address::<S, I>))
        .route("/checkout/payment-method", put(set_payment_method::<S, I>))
        .route("/payment", post(submit_payment::<S, I>))
        .route("/orders", get(list_orders::<S, I>))
        .route("/orders/:id", get(get_order::<S, I>))
        .route("/addresses", get(list_addresses::<S, I>).post(add_address::<S, I>))
        .route("/addresses/:id/default", put(set_default_address::<S, I>))
        .route("/account/avatar", get(get_avatar::<S, I>).put(set_avatar::<S, I>));

    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "standease-storefront"})) }))
        .nest("/api/v1/sessions/:session", session_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Checkout(CheckoutError::EmptySession | CheckoutError::NothingToCheckout) => {
                return Redirect::to("/cart").into_response();
            }
            Self::Checkout(CheckoutError::InvalidQuantity) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(CheckoutError::SubmissionInProgress) => StatusCode::CONFLICT,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::SignInRequired => StatusCode::UNAUTHORIZED,
                AuthError::EmailInUse => StatusCode::CONFLICT,
                AuthError::WeakPassword { .. } | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
                AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Pricing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, source = ?std::error::Error::source(&self), "request failed");
        }

        let body = match self {
            Self::Validation(v) => json!({ "error": "Please correct the highlighted fields", "fields": v.fields }),
            Self::Pricing(_) => json!({ "error": "Internal server error" }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserIdentity>,
    pub cart_count: u64,
}

/// A product as chosen on its detail page.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSelection {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub unit_price: Money,
    pub display_name: String,
    #[serde(default)]
    pub image_ref: String,
}

impl ProductSelection {
    /// The chosen product as a cart line; an unusable price is a field error.
    fn into_line(self, quantity: u32) -> Result<CartLine, ValidationError> {
        let line = CartLine {
            product_id: self.product_id,
            size: self.size,
            color: self.color,
            quantity,
            unit_price: self.unit_price,
            display_name: self.display_name,
            image_ref: self.image_ref,
        };
        line.check_price()?;
        Ok(line)
    }
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    #[serde(flatten)]
    pub key: LineKey,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct BuyNowRequest {
    pub item: ProductSelection,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddressChoice {
    Saved { address_id: Uuid },
    Entered {
        address: DeliveryAddress,
        #[serde(default)]
        save: bool,
    },
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub item_count: u64,
    pub timeline: Vec<TimelineStep>,
}

impl From<OrderRecord> for OrderView {
    fn from(order: OrderRecord) -> Self {
        Self { item_count: order.item_count(), timeline: order.timeline(), order }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewAddressRequest {
    pub address: DeliveryAddress,
    #[serde(default)]
    pub make_default: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarBody {
    pub avatar: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn sign_in<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<Credentials>) -> ApiResult<Json<UserIdentity>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    Ok(Json(state.session(&session)?.sign_in(&r.email, &r.password).await?))
}

async fn sign_up<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<Credentials>) -> ApiResult<(StatusCode, Json<UserIdentity>)>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let user = state.session(&session)?.sign_up(&r.email, &r.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn sign_out<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<StatusCode>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    state.session(&session)?.sign_out().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn me<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<Json<MeResponse>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let session = state.session(&session)?;
    Ok(Json(MeResponse { user: session.current_user(), cart_count: session.cart().count().await }))
}

async fn get_cart<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<Json<CartView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    Ok(Json(state.session(&session)?.cart().view().await))
}

async fn clear_cart<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<StatusCode>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    state.session(&session)?.cart().clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_item<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<ProductSelection>) -> ApiResult<Json<CartView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let session = state.session(&session)?;
    session.cart().add(r.into_line(1)?).await?;
    Ok(Json(session.cart().view().await))
}

async fn set_quantity<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<SetQuantityRequest>) -> ApiResult<Json<CartView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let session = state.session(&session)?;
    session.cart().set_quantity(&r.key, r.quantity).await?;
    Ok(Json(session.cart().view().await))
}

async fn remove_item<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(key): Json<LineKey>) -> ApiResult<Json<CartView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let session = state.session(&session)?;
    session.cart().remove(&key).await?;
    Ok(Json(session.cart().view().await))
}

async fn get_checkout<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<Json<CheckoutView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    Ok(Json(state.session(&session)?.checkout_view().await?))
}

async fn cancel_checkout<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<StatusCode>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    state.session(&session)?.cancel_checkout().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn checkout_from_cart<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<Json<CheckoutView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    Ok(Json(state.session(&session)?.checkout_from_cart().await?))
}

async fn buy_now<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<BuyNowRequest>) -> ApiResult<Json<CheckoutView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let line = r.item.into_line(r.quantity)?;
    Ok(Json(state.session(&session)?.buy_now(line, r.quantity).await?))
}

async fn set_checkout_address<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<AddressChoice>) -> ApiResult<Json<CheckoutView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let session = state.session(&session)?;
    let view = match r {
        AddressChoice::Saved { address_id } => session.use_saved_address(address_id).await?,
        AddressChoice::Entered { address, save } => session.set_checkout_address(address, save).await?,
    };
    Ok(Json(view))
}

async fn set_payment_method<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<PaymentMethodRequest>) -> ApiResult<Json<CheckoutView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    Ok(Json(state.session(&session)?.set_payment_method(r.method).await?))
}

async fn submit_payment<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, body: Option<Json<PaymentRequest>>) -> ApiResult<Response>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let Json(request) = body.unwrap_or_default();
    let outcome = state.session(&session)?.submit_order(request.outcome).await?;
    let status = match &outcome {
        SubmitOutcome::Placed { .. } => StatusCode::CREATED,
        SubmitOutcome::Ignored => StatusCode::ACCEPTED,
        SubmitOutcome::Failed { .. } => StatusCode::PAYMENT_REQUIRED,
    };
    Ok((status, Json(outcome)).into_response())
}

async fn list_orders<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<Json<Vec<OrderView>>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let orders = state.session(&session)?.list_orders().await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

async fn get_order<S, I>(State(state): State<AppState<S, I>>, Path((session, id)): Path<(String, String)>) -> ApiResult<Json<OrderView>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    Ok(Json(state.session(&session)?.get_order(&id).await?.into()))
}

async fn list_addresses<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<Json<Vec<SavedAddress>>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    Ok(Json(state.session(&session)?.list_addresses().await?))
}

async fn add_address<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<NewAddressRequest>) -> ApiResult<(StatusCode, Json<serde_json::Value>)>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let id = state.session(&session)?.add_address(r.address, r.make_default).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn set_default_address<S, I>(State(state): State<AppState<S, I>>, Path((session, id)): Path<(String, Uuid)>) -> ApiResult<StatusCode>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    state.session(&session)?.set_default_address(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_avatar<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>) -> ApiResult<Json<AvatarBody>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let avatar: Avatar = state.session(&session)?.avatar().await?;
    Ok(Json(AvatarBody { avatar: avatar.as_str().to_string() }))
}

async fn set_avatar<S, I>(State(state): State<AppState<S, I>>, Path(session): Path<String>, Json(r): Json<AvatarBody>) -> ApiResult<Json<AvatarBody>>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let avatar = state.session(&session)?.set_avatar(&r.avatar).await?;
    Ok(Json(AvatarBody { avatar: avatar.as_str().to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;
    use crate::infra::{EventSink, InMemoryDocumentStore, InMemoryIdentity};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = StorefrontConfig::from_lookup(|key| (key == "PAYMENT_DELAY_MS").then(|| "0".to_string())).unwrap();
        router(AppState::new(config, InMemoryDocumentStore::new(), InMemoryIdentity::new(), EventSink::Log))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Response) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        (response.status(), response)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn insole() -> Value {
        json!({
            "product_id": 7,
            "size": "M",
            "color": "black",
            "unit_price": { "amount": "19.99", "currency": "INR" },
            "display_name": "Arch Support Insole"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_checkout_redirects_to_cart() {
        let app = app();
        let (status, response) = call(&app, Method::GET, "/api/v1/sessions/s1/checkout", None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/cart");

        let (status, _) = call(&app, Method::POST, "/api/v1/sessions/s1/payment", Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        call(&app, Method::POST, "/api/v1/sessions/s1/sign-up", Some(json!({"email": "kiran@example.com", "password": "soft-sole"}))).await;
        let (status, _) = call(&app, Method::POST, "/api/v1/sessions/s1/payment", None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_cart_endpoints() {
        let app = app();
        call(&app, Method::POST, "/api/v1/sessions/s1/cart/items", Some(insole())).await;
        let (status, response) = call(&app, Method::POST, "/api/v1/sessions/s1/cart/items", Some(insole())).await;
        assert_eq!(status, StatusCode::OK);
        let cart = json_body(response).await;
        assert_eq!(cart["count"], 2);
        assert_eq!(cart["lines"].as_array().unwrap().len(), 1);

        let key = json!({"product_id": 7, "size": "M", "color": "black", "quantity": 0});
        let (_, response) = call(&app, Method::PUT, "/api/v1/sessions/s1/cart/items", Some(key)).await;
        assert_eq!(json_body(response).await["count"], 0);
    }

    #[tokio::test]
    async fn test_huge_quantity_keeps_cart_readable() {
        let app = app();
        call(&app, Method::POST, "/api/v1/sessions/s1/cart/items", Some(insole())).await;
        let mut other = insole();
        other["product_id"] = json!(8);
        call(&app, Method::POST, "/api/v1/sessions/s1/cart/items", Some(other)).await;

        let huge = json!({"product_id": 7, "size": "M", "color": "black", "quantity": u32::MAX});
        let (status, _) = call(&app, Method::PUT, "/api/v1/sessions/s1/cart/items", Some(huge)).await;
        assert_eq!(status, StatusCode::OK);
        let five = json!({"product_id": 8, "size": "M", "color": "black", "quantity": 5});
        call(&app, Method::PUT, "/api/v1/sessions/s1/cart/items", Some(five)).await;

        let (status, response) = call(&app, Method::GET, "/api/v1/sessions/s1/cart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(response).await["count"], 104);
    }

    #[tokio::test]
    async fn test_unusable_prices_are_field_errors() {
        let app = app();
        for amount in ["-19.99", "0", "79228162514264337593543950335"] {
            let mut item = insole();
            item["unit_price"]["amount"] = json!(amount);
            let (status, response) = call(&app, Method::POST, "/api/v1/sessions/s1/checkout/buy-now", Some(json!({"item": item, "quantity": 2}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(json_body(response).await["fields"]["unit_price"].is_string());
        }
        let mut item = insole();
        item["unit_price"]["amount"] = json!("-5");
        let (status, _) = call(&app, Method::POST, "/api/v1/sessions/s1/cart/items", Some(item)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validation_errors_carry_fields() {
        let app = app();
        call(&app, Method::POST, "/api/v1/sessions/s1/checkout/buy-now", Some(json!({"item": insole(), "quantity": 1}))).await;
        let address = json!({"address": {
            "full_name": "", "phone": "9876543210", "email": "bad", "address_line": "12 MG Road",
            "city": "Pune", "state": "MH", "pincode": "411001"
        }});
        let (status, response) = call(&app, Method::PUT, "/api/v1/sessions/s1/checkout/address", Some(address)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["fields"]["full_name"], "Full name is required");
        assert_eq!(body["fields"]["email"], "Invalid email format");
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_conflicts() {
        let app = app();
        let creds = json!({"email": "kiran@example.com", "password": "soft-sole"});
        let (status, _) = call(&app, Method::POST, "/api/v1/sessions/s1/sign-up", Some(creds.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, response) = call(&app, Method::POST, "/api/v1/sessions/s2/sign-up", Some(creds)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "An account with this email already exists");
    }

    #[tokio::test]
    async fn test_foreign_order_is_not_found() {
        let app = app();
        call(&app, Method::POST, "/api/v1/sessions/a/sign-up", Some(json!({"email": "a@example.com", "password": "secret-a"}))).await;
        call(&app, Method::POST, "/api/v1/sessions/a/checkout/buy-now", Some(json!({"item": insole(), "quantity": 3}))).await;
        let address = json!({"address": {
            "full_name": "Asha Rao", "phone": "9876543210", "email": "a@example.com", "address_line": "12 MG Road",
            "city": "Pune", "state": "MH", "pincode": "411001"
        }});
        call(&app, Method::PUT, "/api/v1/sessions/a/checkout/address", Some(address)).await;
        let (status, response) = call(&app, Method::POST, "/api/v1/sessions/a/payment", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let placed = json_body(response).await;
        assert_eq!(placed["redirect"]["to"], "/orders");
        let order_id = placed["order_id"].as_str().unwrap().to_string();

        let (status, response) = call(&app, Method::GET, &format!("/api/v1/sessions/a/orders/{order_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "placed");

        call(&app, Method::POST, "/api/v1/sessions/b/sign-up", Some(json!({"email": "b@example.com", "password": "secret-b"}))).await;
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/sessions/b/orders/{order_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::GET, "/api/v1/sessions/b/orders/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
