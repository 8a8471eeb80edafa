// Handler dos alunos vinculados ao responsável

use axum::{extract::State, Json};

use crate::{
    config::AppState,
    domain::{StudentListResponse, StudentWithClass},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

/// Lista os alunos vinculados ao responsável autenticado, com a turma do
/// ano letivo mais recente.
#[utoipa::path(
    get,
    path = "/api/students",
    tag = "Students",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Alunos vinculados", body = StudentListResponse),
        (status = 403, description = "Apenas responsáveis")
    )
)]
pub async fn list_my_students(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<StudentListResponse>> {
    if !auth.is_guardian() {
        return Err(AppError::forbidden(
            "Apenas responsáveis têm alunos vinculados",
        ));
    }

    // A turma exibida é a matrícula do ano letivo mais recente
    let data = sqlx::query_as::<_, StudentWithClass>(
        "SELECT s.id, s.name, s.birth_date, c.id AS class_id, c.name AS class_name, \
                c.school_year \
         FROM guardian_students gs \
         INNER JOIN students s ON s.id = gs.student_id \
         LEFT JOIN LATERAL ( \
             SELECT cl.id, cl.name, cl.school_year \
             FROM enrollments e \
             INNER JOIN classes cl ON cl.id = e.class_id \
             WHERE e.student_id = s.id \
             ORDER BY cl.school_year DESC \
             LIMIT 1 \
         ) c ON TRUE \
         WHERE gs.guardian_id = $1 \
         ORDER BY s.name ASC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    let total = data.len() as i64;
    Ok(Json(StudentListResponse { data, total }))
}
