use crate::error::DbError;
use crate::store::AcademicStore;
use chrono::NaiveDate;
use core_types::{
    CoreError, EnrollmentStatus, NewCourse, NewEnrollment, NewProfessor, NewStudent,
};
use rust_decimal::Decimal;

/// Employee code of the first row a seeding run inserts. Its presence means a
/// previous run got at least that far.
const MARKER_PROFESSOR: &str = "P001";

/// How many rows of each kind a seeding run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub professors: usize,
    pub students: usize,
    pub courses: usize,
    pub enrollments: usize,
}

impl SeedSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, DbError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        DbError::Invalid(CoreError::InvalidInput(
            "enrollment_date".to_string(),
            format!("{year}-{month}-{day} is not a calendar date"),
        ))
    })
}

fn professor(name: &str, email: &str, code: &str, specialty: &str) -> NewProfessor {
    NewProfessor {
        name: name.to_string(),
        email: email.to_string(),
        employee_code: code.to_string(),
        specialty: specialty.to_string(),
    }
}

fn student(name: &str, email: &str, code: &str, entry_semester: i32) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        email: email.to_string(),
        student_code: code.to_string(),
        entry_semester,
    }
}

fn course(name: &str, code: &str, credits: i32, description: &str, professor_id: Option<i64>) -> NewCourse {
    NewCourse {
        name: name.to_string(),
        credit_count: credits,
        course_code: code.to_string(),
        description: Some(description.to_string()),
        professor_id,
    }
}

/// Loads a small university catalog through the store's audited insert path.
///
/// Does nothing when the marker professor already exists. The marker is the
/// first insert, so a rerun never collides with rows left by an earlier run.
pub async fn seed_demo_data(store: &dyn AcademicStore) -> Result<SeedSummary, DbError> {
    if store.professor_code_exists(MARKER_PROFESSOR).await? {
        tracing::warn!(marker = MARKER_PROFESSOR, "Demo data already present, skipping seed.");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    let lopez = store
        .insert_professor(&professor(
            "Maria Lopez",
            "maria.lopez@universidad.edu.pe",
            MARKER_PROFESSOR,
            "Ingenieria de Software",
        ))
        .await?;
    let ramirez = store
        .insert_professor(&professor(
            "Carlos Ramirez",
            "carlos.ramirez@universidad.edu.pe",
            "P002",
            "Bases de Datos",
        ))
        .await?;
    summary.professors = 2;

    let juan = store
        .insert_student(&student("Juan Perez", "juan.perez@universidad.edu.pe", "A2024001", 20241))
        .await?;
    let ana = store
        .insert_student(&student("Ana Torres", "ana.torres@universidad.edu.pe", "A2024002", 20241))
        .await?;
    let luis = store
        .insert_student(&student("Luis Garcia", "luis.garcia@universidad.edu.pe", "A2023015", 20232))
        .await?;
    summary.students = 3;

    let web = store
        .insert_course(&course(
            "Desarrollo Web",
            "CS101",
            4,
            "HTML, CSS y JavaScript del lado del cliente y servidor.",
            Some(lopez.person.id),
        ))
        .await?;
    let dawi = store
        .insert_course(&course(
            "Desarrollo de Aplicaciones Web I",
            "DAWI",
            4,
            "Aplicaciones web con persistencia y APIs REST.",
            Some(lopez.person.id),
        ))
        .await?;
    let databases = store
        .insert_course(&course(
            "Base de Datos",
            "CS201",
            3,
            "Modelo relacional, SQL y normalizacion.",
            Some(ramirez.person.id),
        ))
        .await?;
    let algorithms = store
        .insert_course(&course("Algoritmos", "CS150", 5, "Analisis y diseno de algoritmos.", None))
        .await?;
    let ethics = store
        .insert_course(&course("Etica Profesional", "HUM100", 2, "Etica en la practica profesional.", None))
        .await?;
    summary.courses = 5;

    let enrollments = [
        (&juan, &web, date(2024, 3, 1)?, EnrollmentStatus::Active, None),
        (&juan, &databases, date(2023, 8, 15)?, EnrollmentStatus::Completed, Some(Decimal::new(1650, 2))),
        (&juan, &dawi, date(2024, 3, 2)?, EnrollmentStatus::Active, None),
        (&ana, &web, date(2024, 3, 1)?, EnrollmentStatus::Active, None),
        (&ana, &algorithms, date(2024, 3, 5)?, EnrollmentStatus::Withdrawn, None),
        (&luis, &databases, date(2023, 8, 20)?, EnrollmentStatus::Failed, Some(Decimal::new(800, 2))),
        (&luis, &ethics, date(2024, 3, 10)?, EnrollmentStatus::Active, None),
    ];
    for (student, course, enrollment_date, status, final_grade) in enrollments {
        store
            .insert_enrollment(&NewEnrollment {
                student_id: student.person.id,
                course_id: course.id,
                enrollment_date,
                status,
                final_grade,
            })
            .await?;
        summary.enrollments += 1;
    }

    tracing::info!(?summary, "Demo data seeded.");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRepository;
    use core_types::StudentEmail;

    #[tokio::test]
    async fn seeds_once() {
        let store = InMemoryRepository::default();
        let first = seed_demo_data(&store).await.unwrap();
        assert_eq!(first.courses, 5);
        assert_eq!(first.enrollments, 7);

        let second = seed_demo_data(&store).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(store.list_courses().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn interrupted_seed_is_not_retried() {
        let store = InMemoryRepository::default();
        store
            .insert_professor(&professor(
                "Maria Lopez",
                "maria.lopez@universidad.edu.pe",
                "P001",
                "Ingenieria de Software",
            ))
            .await
            .unwrap();

        let summary = seed_demo_data(&store).await.unwrap();
        assert!(summary.is_empty());
        assert!(store.list_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeded_student_has_two_active_courses_out_of_three() {
        let store = InMemoryRepository::default();
        seed_demo_data(&store).await.unwrap();

        let email = StudentEmail::parse("juan.perez@universidad.edu.pe").unwrap();
        assert_eq!(store.count_active_enrollments_by_email(&email).await.unwrap(), 2);
        assert_eq!(store.enrollments_by_student_email(&email).await.unwrap().len(), 3);
    }
}
