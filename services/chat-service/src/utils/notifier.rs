// Cliente do endpoint interno do notification-service
//
// O chat não fala com o gateway de push diretamente: ele pede ao
// notification-service para registrar e entregar a notificação. A chamada
// é best-effort, falha é logada e nunca derruba o envio da mensagem.

use crate::config::AppState;

pub async fn notify_user(
    state: &AppState,
    user_id: i32,
    title: &str,
    body: &str,
    data: serde_json::Value,
) {
    let url = format!(
        "{}/api/internal/notify",
        state.config.notification_service_url
    );

    let payload = serde_json::json!({
        "user_id": user_id,
        "title": title,
        "body": body,
        "data": data,
    });

    match state
        .http_client
        .post(&url)
        .header("x-service-token", &state.config.service_token)
        .json(&payload)
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => {
            tracing::debug!("Notificação de chat encaminhada para user {}", user_id);
        }
        Ok(response) => {
            tracing::warn!(
                "notification-service retornou {} ao notificar user {}",
                response.status(),
                user_id
            );
        }
        Err(e) => {
            tracing::warn!("Falha ao chamar notification-service: {}", e);
        }
    }
}
