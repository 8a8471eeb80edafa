// Handlers das turmas do professor

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    config::AppState,
    domain::{Class, ClassListResponse, ClassSummary, RosterResponse, Student},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

/// Lista as turmas do professor autenticado, com contagem de alunos
#[utoipa::path(
    get,
    path = "/api/classes",
    tag = "Classes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Turmas do professor", body = ClassListResponse),
        (status = 403, description = "Apenas professores")
    )
)]
pub async fn list_classes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ClassListResponse>> {
    if !auth.is_teacher() && !auth.is_admin() {
        return Err(AppError::forbidden("Apenas professores têm turmas"));
    }

    let data = sqlx::query_as::<_, ClassSummary>(
        "SELECT c.id, c.name, c.teacher_id, c.school_year, \
                (SELECT COUNT(*) FROM enrollments e WHERE e.class_id = c.id) AS student_count, \
                c.created_at \
         FROM classes c \
         WHERE c.teacher_id = $1 \
         ORDER BY c.school_year DESC, c.name ASC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    let total = data.len() as i64;
    Ok(Json(ClassListResponse { data, total }))
}

/// Lista de chamada de uma turma. Só o professor da turma (ou admin) enxerga.
#[utoipa::path(
    get,
    path = "/api/classes/{id}/students",
    tag = "Classes",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID da turma")),
    responses(
        (status = 200, description = "Alunos matriculados", body = RosterResponse),
        (status = 403, description = "Turma de outro professor"),
        (status = 404, description = "Turma não encontrada")
    )
)]
pub async fn class_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<i32>,
) -> AppResult<Json<RosterResponse>> {
    let class = sqlx::query_as::<_, Class>(
        "SELECT id, name, teacher_id, school_year, created_at FROM classes WHERE id = $1",
    )
    .bind(class_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Turma não encontrada"))?;

    if class.teacher_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::forbidden("Esta turma pertence a outro professor"));
    }

    let students = sqlx::query_as::<_, Student>(
        "SELECT s.id, s.name, s.birth_date, s.created_at \
         FROM students s \
         INNER JOIN enrollments e ON e.student_id = s.id \
         WHERE e.class_id = $1 \
         ORDER BY s.name ASC",
    )
    .bind(class_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(RosterResponse { class, students }))
}
