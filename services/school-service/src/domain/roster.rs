// Domain models de turmas, alunos e matrículas
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: i32,
    pub name: String,
    pub teacher_id: i32,
    pub school_year: i32,
    pub created_at: DateTime<Utc>,
}

// Turma com a contagem de alunos matriculados, para a lista do professor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassSummary {
    pub id: i32,
    pub name: String,
    pub teacher_id: i32,
    pub school_year: i32,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

// Aluno com a turma atual, para a lista do responsável
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentWithClass {
    pub id: i32,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub class_id: Option<i32>,
    pub class_name: Option<String>,
    pub school_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassListResponse {
    pub data: Vec<ClassSummary>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RosterResponse {
    pub class: Class,
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<StudentWithClass>,
    pub total: i64,
}
