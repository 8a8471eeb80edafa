use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppState, HealthStatus},
    handlers::{pickup, push, tokens, websocket},
    middleware::{auth::auth_middleware, rate_limit::rate_limit_middleware},
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

// OpenAPI Documentation do Notification Service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Universo do Saber - Notification Service API",
        version = "1.0.0",
        description = "Serviço de notificações da escola\n\n## Features\n\n- 🚸 Fluxo de autorização de retirada (responsável solicita, professor responde)\n- 🔔 Notificações push genéricas\n- 📱 Registro de push tokens por dispositivo\n- 📡 Feed de mudanças em tempo real via WebSocket\n- 🔢 Badge combinado de não lidas\n\n## Authentication\n\nTodos os endpoints exigem JWT access token.\nEnvie o token no header `Authorization: Bearer {token}`.\n",
    ),
    paths(
        pickup::get_pickups,
        pickup::create_pickup,
        pickup::respond_pickup,
        pickup::mark_as_read,
        pickup::mark_all_as_read,
        pickup::clear_all,
        push::get_notifications,
        push::mark_as_read,
        push::mark_all_as_read,
        push::get_unread_count,
        push::clear_all,
        push::get_badge,
        push::internal_notify,
        tokens::register_token,
        tokens::unregister_token,
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::domain::pickup::PickupResponse,
            crate::domain::pickup::PickupListResponse,
            crate::domain::pickup::CreatePickupRequest,
            crate::domain::pickup::RespondPickupRequest,
            crate::domain::pickup::MarkReadResponse,
            crate::domain::pickup::ReadAllResponse,
            crate::domain::pickup::ClearAllResponse,
            crate::domain::push::PushNotificationResponse,
            crate::domain::push::PushNotificationListResponse,
            crate::domain::push::UnreadCountResponse,
            crate::domain::push::BadgeResponse,
            crate::domain::push::RegisterTokenRequest,
            crate::domain::push::InternalNotifyRequest,
            tokens::UnregisterTokenRequest,
            pickup::PickupQuery,
            push::PushQuery,
        )
    ),
    tags(
        (name = "Pickups", description = "Fluxo de autorização de retirada"),
        (name = "Push", description = "Notificações push genéricas"),
        (name = "PushTokens", description = "Registro de dispositivos")
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
    // OpenAPI documentation
    let openapi = ApiDoc::openapi();

    let api_routes = build_api_routes_with_auth(state.clone());

    Router::new()
        .route("/health", get(health_check).with_state(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi.clone()))
        .merge(Redoc::with_url("/redoc", openapi))
        // WebSocket autentica via query param; endpoint interno via service token
        .route("/api/ws/feed", get(websocket::ws_feed).with_state(state.clone()))
        .route("/api/internal/notify", post(push::internal_notify).with_state(state.clone()))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(configure_cors(&state.config.frontend_url))
        .layer(axum::middleware::from_fn_with_state(state, rate_limit_middleware))
}

// Build API routes com JWT authentication
fn build_api_routes_with_auth(state: AppState) -> Router {
    Router::new()
        // Fluxo de retirada
        .route("/pickups", get(pickup::get_pickups).post(pickup::create_pickup).delete(pickup::clear_all))
        .route("/pickups/read-all", put(pickup::mark_all_as_read))
        .route("/pickups/{id}/respond", put(pickup::respond_pickup))
        .route("/pickups/{id}/read", put(pickup::mark_as_read))
        // Stream de push genérico
        .route("/push", get(push::get_notifications).delete(push::clear_all))
        .route("/push/read-all", put(push::mark_all_as_read))
        .route("/push/unread-count", get(push::get_unread_count))
        .route("/push/{id}/read", put(push::mark_as_read))
        // Badge combinado
        .route("/badge", get(push::get_badge))
        // Registro de dispositivos
        .route("/push-tokens", post(tokens::register_token).delete(tokens::unregister_token))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
