use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppState, HealthStatus},
    handlers::{conversations, messages, websocket},
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

// OpenAPI Documentation do Chat Service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Universo do Saber - Chat Service API",
        version = "1.0.0",
        description = "Chat entre responsáveis e professores\n\n## Features\n\n- 💬 Conversas por trio (professor, responsável, aluno)\n- ✉️ Mensagens de texto com read receipt\n- ⌨️ Indicador de digitação em tempo real\n- 📡 WebSocket + NATS para entrega imediata\n\n## Authentication\n\nTodos os endpoints exigem JWT access token.\n",
    ),
    paths(
        conversations::create_conversation,
        conversations::list_conversations,
        conversations::mark_conversation_read,
        messages::get_messages,
        messages::send_message,
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::domain::Conversation,
            crate::domain::ConversationResponse,
            crate::domain::CreateConversationRequest,
            crate::domain::Message,
            crate::domain::MessageResponse,
            crate::domain::CreateMessageRequest,
            conversations::ConversationListResponse,
            conversations::ConversationReadResponse,
            conversations::PaginationQuery,
            messages::MessageListResponse,
        )
    ),
    tags(
        (name = "Conversations", description = "Gerenciamento de conversas"),
        (name = "Messages", description = "Envio e leitura de mensagens")
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
        // WebSocket autentica via query param
        .route(
            "/api/ws/chat/{conversation_id}",
            get(websocket::ws_chat).with_state(state.clone()),
        )
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(configure_cors(&state.config.frontend_url))
        .layer(axum::middleware::from_fn_with_state(state, rate_limit_middleware))
}

// Build API routes com JWT authentication
fn build_api_routes_with_auth(state: AppState) -> Router {
    Router::new()
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/conversations/{id}/read",
            put(conversations::mark_conversation_read),
        )
        .route(
            "/conversations/{id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
