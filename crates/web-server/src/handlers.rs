use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use core_types::{
    CoreError, Course, CourseSortField, Enrollment, EnrollmentDetail, EnrollmentSortField,
    EnrollmentStatus, Page, PageRequest, Person, Professor, Sort, SortField, StudentEmail,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

type Params = WithRejection<Query<QueryParams>, AppError>;
type IdPath = WithRejection<Path<i64>, AppError>;
type TextPath = WithRejection<Path<String>, AppError>;

const COURSE_SORT: &str = "nombre";
const COURSE_DIR: &str = "asc";
const ENROLLMENT_SORT: &str = "fechaMatricula";
const ENROLLMENT_DIR: &str = "desc";

/// Every query-string parameter the API accepts. Each endpoint reads the ones it needs.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortDir")]
    pub sort_dir: Option<String>,
}

impl QueryParams {
    fn page_request<F: SortField>(
        &self,
        state: &AppState,
        default_sort: &str,
        default_dir: &str,
    ) -> Result<PageRequest<F>, AppError> {
        let sort = Sort::parse(
            self.sort_by.as_deref().unwrap_or(default_sort),
            self.sort_dir.as_deref().unwrap_or(default_dir),
        )?;
        let size = self
            .size
            .unwrap_or_else(|| i64::from(state.pagination.default_size));
        Ok(PageRequest::new(
            self.page.unwrap_or(0),
            size,
            state.pagination.max_size,
            sort,
        )?)
    }

    fn email(&self) -> Result<StudentEmail, AppError> {
        Ok(StudentEmail::parse(self.email.as_deref().unwrap_or_default())?)
    }

    /// `nombre`, rejected when absent or blank.
    fn required_nombre(&self) -> Result<&str, AppError> {
        match self.nombre.as_deref() {
            Some(nombre) if !nombre.trim().is_empty() => Ok(nombre),
            _ => Err(CoreError::MissingParameter("nombre".to_string()).into()),
        }
    }
}

fn found<T>(row: Option<T>, what: impl FnOnce() -> String) -> Result<Json<T>, AppError> {
    row.map(Json).ok_or_else(|| AppError::NotFound(what()))
}

// ==============================================================================
// Service
// ==============================================================================

/// # GET /api
pub async fn get_api_info() -> Json<Value> {
    Json(json!({
        "name": "academia",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "endpoints": {
            "cursos": [
                "GET /api/cursos?nombre=&page=&size=&sortBy=&sortDir=",
                "GET /api/cursos/buscar?nombre=",
                "GET /api/cursos/todos",
                "GET /api/cursos/{id}",
                "GET /api/cursos/codigo/{codigo}",
                "GET /api/cursos/creditos/{creditos}",
                "GET /api/cursos/creditos-minimos/{creditos}"
            ],
            "matriculas": [
                "GET /api/matriculas?page=&size=&sortBy=&sortDir=",
                "GET /api/matriculas/{id}",
                "GET /api/matriculas/email?email=",
                "GET /api/matriculas/email/completa?email=",
                "GET /api/matriculas/email/contar?email=",
                "GET /api/matriculas/email/paginado?email=&page=&size=&sortBy=&sortDir=",
                "GET /api/matriculas/codigo/{codigo}",
                "GET /api/matriculas/estado/{estado}",
                "GET /api/matriculas/curso?nombre="
            ],
            "personas": ["GET /api/personas/{id}"],
            "profesores": ["GET /api/profesores/codigo/{codigo}"],
            "health": "GET /api/health"
        }
    }))
}

/// # GET /api/health
/// 503 when the store does not answer.
pub async fn get_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "UP", "database": "UP", "timestamp": Utc::now() })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed.");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DOWN",
                    "database": "DOWN",
                    "error": e.to_string(),
                    "timestamp": Utc::now()
                })),
            )
        }
    }
}

// ==============================================================================
// Courses
// ==============================================================================

/// # GET /api/cursos
/// One page of courses, filtered by `nombre` when it is non-empty.
pub async fn get_courses_page(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<Page<Course>>, AppError> {
    let request = params.page_request::<CourseSortField>(&state, COURSE_SORT, COURSE_DIR)?;
    let fragment = params.nombre.as_deref().unwrap_or_default();
    Ok(Json(state.store.page_courses(fragment, &request).await?))
}

/// # GET /api/cursos/buscar
/// `nombre` must be present; an empty value matches every course.
pub async fn search_courses(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<Vec<Course>>, AppError> {
    let fragment = params
        .nombre
        .as_deref()
        .ok_or_else(|| CoreError::MissingParameter("nombre".to_string()))?;
    Ok(Json(state.store.search_courses_by_name(fragment).await?))
}

/// # GET /api/cursos/todos
pub async fn get_all_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(state.store.list_courses().await?))
}

/// # GET /api/cursos/:id
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<Json<Course>, AppError> {
    let course = state.store.find_course(id).await?;
    found(course, || format!("Course {id} not found"))
}

/// # GET /api/cursos/codigo/:codigo
pub async fn get_course_by_code(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(codigo), _): TextPath,
) -> Result<Json<Course>, AppError> {
    let course = state.store.find_course_by_code(&codigo).await?;
    found(course, || format!("Course with code '{codigo}' not found"))
}

/// # GET /api/cursos/creditos/:creditos
pub async fn get_courses_by_credits(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(creditos), _): WithRejection<Path<i32>, AppError>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(state.store.courses_by_credits(creditos).await?))
}

/// # GET /api/cursos/creditos-minimos/:creditos
pub async fn get_courses_by_min_credits(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(creditos), _): WithRejection<Path<i32>, AppError>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(state.store.courses_by_min_credits(creditos).await?))
}

// ==============================================================================
// Enrollments
// ==============================================================================

/// # GET /api/matriculas
pub async fn get_enrollments_page(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<Page<Enrollment>>, AppError> {
    let request =
        params.page_request::<EnrollmentSortField>(&state, ENROLLMENT_SORT, ENROLLMENT_DIR)?;
    Ok(Json(state.store.page_enrollments(&request).await?))
}

/// # GET /api/matriculas/:id
pub async fn get_enrollment(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = state.store.find_enrollment(id).await?;
    found(enrollment, || format!("Enrollment {id} not found"))
}

/// # GET /api/matriculas/email
pub async fn get_enrollments_by_email(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    let email = params.email()?;
    Ok(Json(state.store.enrollments_by_student_email(&email).await?))
}

/// # GET /api/matriculas/email/completa
/// Enrollments with their student and course embedded.
pub async fn get_enrollment_details_by_email(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<Vec<EnrollmentDetail>>, AppError> {
    let email = params.email()?;
    Ok(Json(
        state.store.enrollment_details_by_student_email(&email).await?,
    ))
}

/// # GET /api/matriculas/email/contar
/// Number of ACTIVE enrollments, as a bare JSON integer.
pub async fn count_active_enrollments_by_email(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<i64>, AppError> {
    let email = params.email()?;
    Ok(Json(
        state.store.count_active_enrollments_by_email(&email).await?,
    ))
}

/// # GET /api/matriculas/email/paginado
pub async fn get_enrollments_page_by_email(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<Page<Enrollment>>, AppError> {
    let email = params.email()?;
    let request =
        params.page_request::<EnrollmentSortField>(&state, ENROLLMENT_SORT, ENROLLMENT_DIR)?;
    Ok(Json(
        state
            .store
            .page_enrollments_by_student_email(&email, &request)
            .await?,
    ))
}

/// # GET /api/matriculas/codigo/:codigo
pub async fn get_enrollments_by_student_code(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(codigo), _): TextPath,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    Ok(Json(state.store.enrollments_by_student_code(&codigo).await?))
}

/// # GET /api/matriculas/estado/:estado
pub async fn get_enrollments_by_status(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(estado), _): TextPath,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    let status: EnrollmentStatus = estado.parse()?;
    Ok(Json(state.store.enrollments_by_status(status).await?))
}

/// # GET /api/matriculas/curso
pub async fn get_enrollments_by_course_name(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): Params,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    let nombre = params.required_nombre()?;
    Ok(Json(state.store.enrollments_by_course_name(nombre).await?))
}

// ==============================================================================
// Persons
// ==============================================================================

/// # GET /api/personas/:id
/// A student or a professor, tagged by `person_type`.
pub async fn get_person(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<Json<Person>, AppError> {
    let person = state.store.find_person(id).await?;
    found(person, || format!("Person {id} not found"))
}

// ==============================================================================
// Professors
// ==============================================================================

/// # GET /api/profesores/codigo/:codigo
pub async fn get_professor_by_code(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(codigo), _): TextPath,
) -> Result<Json<Professor>, AppError> {
    let professor = state.store.find_professor_by_code(&codigo).await?;
    found(professor, || format!("Professor with code '{codigo}' not found"))
}
