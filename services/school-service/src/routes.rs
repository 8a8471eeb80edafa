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
    handlers::{classes, links, notices, profile, settings, students},
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

// OpenAPI Documentation do School Service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Universo do Saber - School Service API",
        version = "1.0.0",
        description = "Perfis, turmas, vínculos e mural de avisos\n\n## Features\n\n- 👤 Perfil do usuário\n- 🏫 Turmas e lista de chamada do professor\n- 👨‍👩‍👧 Vínculo responsável-aluno com aprovação do admin\n- 📌 Mural de avisos com público-alvo\n- ⚙️ Configurações da escola\n\n## Authentication\n\nTodos os endpoints exigem JWT access token.\n",
    ),
    paths(
        profile::get_me,
        profile::update_me,
        classes::list_classes,
        classes::class_students,
        students::list_my_students,
        links::create_link_request,
        links::list_link_requests,
        links::respond_link_request,
        notices::create_notice,
        notices::list_notices,
        notices::delete_notice,
        settings::get_settings,
        settings::update_settings,
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::domain::Profile,
            crate::domain::UpdateProfileRequest,
            crate::domain::Class,
            crate::domain::ClassSummary,
            crate::domain::ClassListResponse,
            crate::domain::RosterResponse,
            crate::domain::Student,
            crate::domain::StudentWithClass,
            crate::domain::StudentListResponse,
            crate::domain::LinkRequest,
            crate::domain::CreateLinkRequest,
            crate::domain::RespondLinkRequest,
            crate::domain::LinkRequestListResponse,
            crate::domain::Notice,
            crate::domain::CreateNoticeRequest,
            crate::domain::NoticeListResponse,
            crate::domain::SchoolSettings,
            crate::domain::UpdateSettingsRequest,
        )
    ),
    tags(
        (name = "Profile", description = "Perfil do usuário"),
        (name = "Classes", description = "Turmas e lista de chamada"),
        (name = "Students", description = "Alunos vinculados ao responsável"),
        (name = "LinkRequests", description = "Vínculo responsável-aluno"),
        (name = "Notices", description = "Mural de avisos"),
        (name = "Settings", description = "Configurações da escola")
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
        .route("/me", get(profile::get_me).put(profile::update_me))
        .route("/classes", get(classes::list_classes))
        .route("/classes/{id}/students", get(classes::class_students))
        .route("/students", get(students::list_my_students))
        .route(
            "/link-requests",
            get(links::list_link_requests).post(links::create_link_request),
        )
        .route("/link-requests/{id}/respond", put(links::respond_link_request))
        .route(
            "/notices",
            get(notices::list_notices).post(notices::create_notice),
        )
        .route("/notices/{id}", axum::routing::delete(notices::delete_notice))
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
