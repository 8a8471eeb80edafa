use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::{get, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppState, HealthStatus},
    handlers::{bills, consumption, items},
    middleware::auth::auth_middleware,
};

// Security scheme para Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

// OpenAPI Documentation do Canteen Service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Universo do Saber - Canteen Service API",
        version = "1.0.0",
        description = "Cantina escolar: cardápio, consumo e faturas mensais\n\n## Features\n\n- 🍎 Cardápio com preço unitário\n- 🧾 Registro de consumo com snapshot de preço\n- 💰 Fatura mensal por aluno, atualizada na mesma transação\n- ✅ Baixa de pagamento single-shot\n\n## Authentication\n\nTodos os endpoints exigem JWT access token.\n",
    ),
    paths(
        items::list_items,
        items::create_item,
        items::update_item,
        consumption::record_consumption,
        consumption::list_consumption,
        bills::list_bills,
        bills::pay_bill,
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::domain::CanteenItem,
            crate::domain::CreateItemRequest,
            crate::domain::UpdateItemRequest,
            crate::domain::ItemListResponse,
            crate::domain::Consumption,
            crate::domain::RecordConsumptionRequest,
            crate::domain::ConsumptionListResponse,
            crate::domain::Bill,
            crate::domain::BillListResponse,
        )
    ),
    tags(
        (name = "Items", description = "Cardápio da cantina"),
        (name = "Consumption", description = "Registro e extrato de consumo"),
        (name = "Bills", description = "Faturas mensais")
    )
)]
struct ApiDoc;

// Health check handler
async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.health_check().await)
}

/// Build JWT-Only CORS configuration
fn configure_cors(frontend_url: &str) -> CorsLayer {
    let allowed_methods = vec![
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let allowed_headers = vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE];

    CorsLayer::new()
        .allow_origin(
            frontend_url
                .parse::<HeaderValue>()
                .expect("FRONTEND_URL inválida"),
        )
        .allow_methods(allowed_methods)
        .allow_headers(allowed_headers)
        .allow_credentials(false)
        .max_age(std::time::Duration::from_secs(86400))
}

/// Security headers middleware
async fn security_headers_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    response.headers_mut().insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    response.headers_mut().insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    response.headers_mut().insert("Strict-Transport-Security", HeaderValue::from_static("max-age=31536000; includeSubDomains"));
    response.headers_mut().insert("Referrer-Policy", HeaderValue::from_static("strict-origin-when-cross-origin"));

    response
}

/// Monta o router com as camadas de segurança
pub fn create_router(state: AppState) -> Router {
    let openapi = ApiDoc::openapi();

    let api_routes = build_api_routes_with_auth(state.clone());

    Router::new()
        .route("/health", get(health_check).with_state(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi.clone()))
        .merge(Redoc::with_url("/redoc", openapi))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(configure_cors(&state.config.frontend_url))
}

// Build API routes com JWT authentication
fn build_api_routes_with_auth(state: AppState) -> Router {
    Router::new()
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/{id}", put(items::update_item))
        .route(
            "/consumption",
            get(consumption::list_consumption).post(consumption::record_consumption),
        )
        .route("/bills", get(bills::list_bills))
        .route("/bills/{id}/pay", put(bills::pay_bill))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
