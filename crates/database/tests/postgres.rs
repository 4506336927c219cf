//! Runs the query layer against a live PostgreSQL instance.
//!
//! These tests need `DATABASE_URL` and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -p database --test postgres -- --ignored
//! ```
//!
//! Every test writes its own rows under a unique tag, so runs can share one
//! database and repeat without cleanup.

use chrono::NaiveDate;
use core_types::{
    Auditor, Course, CourseSortField, EnrollmentSortField, EnrollmentStatus, NewCourse,
    NewEnrollment, NewProfessor, NewStudent, PageRequest, Person, Sort, SortDirection, Student,
    StudentEmail,
};
use database::{connect, constraint, run_migrations, AcademicStore, DbError, DbRepository};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

static NEXT_TAG: AtomicU32 = AtomicU32::new(0);

/// Five hex digits from the clock plus a two-digit counter. Short enough
/// for the ten-character course codes.
fn unique_tag() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let clock = ((nanos >> 12) & 0xF_FFFF) as u32;
    let count = NEXT_TAG.fetch_add(1, Ordering::Relaxed);
    format!("{clock:05x}{:02}", count % 100)
}

async fn store() -> DbRepository {
    let pool = connect(5, Duration::from_secs(10)).await.unwrap();
    run_migrations(&pool).await.unwrap();
    DbRepository::new(pool, Auditor::new("pg-test"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn email(raw: &str) -> StudentEmail {
    StudentEmail::parse(raw).unwrap()
}

/// Rows owned by one test, all carrying the same tag.
struct Fixture {
    tag: String,
    store: DbRepository,
}

impl Fixture {
    async fn new() -> Self {
        Self { tag: unique_tag(), store: store().await }
    }

    fn email(&self, local: &str) -> String {
        format!("{local}.{}@pg.test", self.tag)
    }

    async fn course(&self, name: &str, suffix: &str, credits: i32) -> Course {
        self.store
            .insert_course(&NewCourse {
                name: format!("{} {name}", self.tag),
                credit_count: credits,
                course_code: format!("C{}{suffix}", self.tag),
                description: None,
                professor_id: None,
            })
            .await
            .unwrap()
    }

    async fn student(&self, local: &str) -> Student {
        self.store
            .insert_student(&NewStudent {
                name: local.to_string(),
                email: self.email(local),
                student_code: format!("S{}{local}", self.tag),
                entry_semester: 20241,
            })
            .await
            .unwrap()
    }

    async fn enroll(
        &self,
        student: &Student,
        course: &Course,
        on: NaiveDate,
        status: EnrollmentStatus,
        final_grade: Option<Decimal>,
    ) {
        self.store
            .insert_enrollment(&NewEnrollment {
                student_id: student.person.id,
                course_id: course.id,
                enrollment_date: on,
                status,
                final_grade,
            })
            .await
            .unwrap();
    }

    /// Three courses and one student enrolled in two of them, one still active.
    async fn catalog(&self) -> Student {
        let web = self.course("Desarrollo Web", "1", 4).await;
        let db = self.course("Base de Datos", "2", 3).await;
        self.course("Algoritmos", "3", 5).await;

        let juan = self.student("juan").await;
        self.enroll(&juan, &web, date(2024, 3, 1), EnrollmentStatus::Active, None).await;
        self.enroll(&juan, &db, date(2023, 8, 15), EnrollmentStatus::Completed, Some(dec!(16.50)))
            .await;
        juan
    }
}

fn course_page(page: i64, size: i64, field: CourseSortField, dir: SortDirection) -> PageRequest<CourseSortField> {
    PageRequest::new(page, size, 100, Sort::new(field, dir)).unwrap()
}

fn enrollment_page(field: EnrollmentSortField, dir: SortDirection) -> PageRequest<EnrollmentSortField> {
    PageRequest::new(0, 10, 100, Sort::new(field, dir)).unwrap()
}

fn names(courses: &[Course], tag: &str) -> Vec<String> {
    courses
        .iter()
        .map(|c| c.name.trim_start_matches(tag).trim().to_string())
        .collect()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn course_search_is_case_insensitive_and_literal() {
    let fx = Fixture::new().await;
    fx.catalog().await;
    fx.course("100% Practico", "4", 2).await;

    let lower = fx.store.search_courses_by_name(&format!("{} desarrollo", fx.tag)).await.unwrap();
    let upper = fx
        .store
        .search_courses_by_name(&format!("{} DESARROLLO", fx.tag.to_uppercase()))
        .await
        .unwrap();
    assert_eq!(names(&lower, &fx.tag), ["Desarrollo Web"]);
    assert_eq!(lower, upper);

    let percent = fx.store.search_courses_by_name(&format!("{} 100%", fx.tag)).await.unwrap();
    assert_eq!(names(&percent, &fx.tag), ["100% Practico"]);
    assert!(fx.store.search_courses_by_name(&format!("{}%", fx.tag)).await.unwrap().is_empty());
    assert!(fx.store.search_courses_by_name(&format!("{}_", fx.tag)).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn empty_fragment_pages_the_whole_catalog() {
    let fx = Fixture::new().await;
    fx.catalog().await;

    let all = fx
        .store
        .page_courses("", &course_page(0, 100, CourseSortField::Name, SortDirection::Asc))
        .await
        .unwrap();
    assert!(all.total_elements >= 3);
    assert!(all.first);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn course_pages_partition_a_filtered_result() {
    let fx = Fixture::new().await;
    fx.catalog().await;

    let mut seen = Vec::new();
    for page in 0..2 {
        let result = fx
            .store
            .page_courses(&fx.tag, &course_page(page, 2, CourseSortField::Name, SortDirection::Asc))
            .await
            .unwrap();
        assert_eq!(result.total_elements, 3);
        assert_eq!(result.total_pages, 2);
        seen.extend(result.content);
    }
    assert_eq!(names(&seen, &fx.tag), ["Algoritmos", "Base de Datos", "Desarrollo Web"]);
    assert_eq!(seen, fx.store.search_courses_by_name(&fx.tag).await.unwrap());

    let past_end = fx
        .store
        .page_courses(&fx.tag, &course_page(2, 2, CourseSortField::Name, SortDirection::Asc))
        .await
        .unwrap();
    assert!(past_end.content.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn equal_sort_values_fall_back_to_id() {
    let fx = Fixture::new().await;
    let first = fx.course("B", "1", 3).await;
    let second = fx.course("A", "2", 3).await;
    let top = fx.course("C", "3", 4).await;

    let page = fx
        .store
        .page_courses(&fx.tag, &course_page(0, 10, CourseSortField::CreditCount, SortDirection::Desc))
        .await
        .unwrap();
    let ids: Vec<i64> = page.content.iter().map(|c| c.id).collect();
    assert_eq!(ids, [top.id, first.id, second.id]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn null_grades_sort_last_ascending_and_first_descending() {
    let fx = Fixture::new().await;
    let ana = fx.student("ana").await;
    for (i, grade) in [None, Some(dec!(15.50)), Some(dec!(9.00))].into_iter().enumerate() {
        let course = fx.course(&format!("Curso {i}"), &i.to_string(), 3).await;
        fx.enroll(&ana, &course, date(2024, 1, 1), EnrollmentStatus::Completed, grade).await;
    }
    let key = email(&fx.email("ana"));

    let asc = fx
        .store
        .page_enrollments_by_student_email(&key, &enrollment_page(EnrollmentSortField::FinalGrade, SortDirection::Asc))
        .await
        .unwrap();
    let grades: Vec<Option<Decimal>> = asc.content.iter().map(|e| e.final_grade).collect();
    assert_eq!(grades, [Some(dec!(9.00)), Some(dec!(15.50)), None]);

    let desc = fx
        .store
        .page_enrollments_by_student_email(&key, &enrollment_page(EnrollmentSortField::FinalGrade, SortDirection::Desc))
        .await
        .unwrap();
    let grades: Vec<Option<Decimal>> = desc.content.iter().map(|e| e.final_grade).collect();
    assert_eq!(grades, [None, Some(dec!(15.50)), Some(dec!(9.00))]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn email_queries_agree_with_each_other() {
    let fx = Fixture::new().await;
    let juan = fx.catalog().await;
    let key = email(&fx.email("juan").to_uppercase());

    let listed = fx.store.enrollments_by_student_email(&key).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|e| e.student_id == juan.person.id));
    assert!(listed[0].enrollment_date > listed[1].enrollment_date);

    let active = listed.iter().filter(|e| e.status == EnrollmentStatus::Active).count();
    assert_eq!(fx.store.count_active_enrollments_by_email(&key).await.unwrap(), 1);
    assert_eq!(active, 1);

    let details = fx.store.enrollment_details_by_student_email(&key).await.unwrap();
    let codes: Vec<String> = details.iter().map(|d| d.course.course_code.clone()).collect();
    assert_eq!(codes, [format!("C{}1", fx.tag), format!("C{}2", fx.tag)]);
    assert!(details.iter().all(|d| d.student == juan));
    assert_eq!(details[1].final_grade.map(|g| g.to_string()), Some("16.50".to_string()));

    let nobody = email(&fx.email("nobody"));
    assert_eq!(fx.store.count_active_enrollments_by_email(&nobody).await.unwrap(), 0);
    assert!(fx.store.enrollments_by_student_email(&nobody).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn grades_come_back_with_two_decimals() {
    let fx = Fixture::new().await;
    let ana = fx.student("ana").await;
    let course = fx.course("Redes", "1", 3).await;
    let inserted = fx
        .store
        .insert_enrollment(&NewEnrollment {
            student_id: ana.person.id,
            course_id: course.id,
            enrollment_date: date(2024, 1, 1),
            status: EnrollmentStatus::Completed,
            final_grade: Some(dec!(15.750)),
        })
        .await
        .unwrap();

    let stored = fx.store.find_enrollment(inserted.id).await.unwrap().unwrap();
    assert_eq!(stored.final_grade.map(|g| g.to_string()), Some("15.75".to_string()));
    assert_eq!(inserted.final_grade, stored.final_grade);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn lookups_signal_absence() {
    let fx = Fixture::new().await;
    assert!(fx.store.find_course(-1).await.unwrap().is_none());
    assert!(fx.store.find_course_by_code(&format!("X{}", fx.tag)).await.unwrap().is_none());
    assert!(fx.store.find_enrollment(-1).await.unwrap().is_none());
    assert!(fx.store.find_person(-1).await.unwrap().is_none());
    assert!(fx.store.find_professor_by_code(&format!("P{}", fx.tag)).await.unwrap().is_none());
    assert!(!fx.store.professor_code_exists(&format!("P{}", fx.tag)).await.unwrap());
    fx.store.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn persons_resolve_to_their_subtype() {
    let fx = Fixture::new().await;
    let juan = fx.student("juan").await;
    let professor = fx
        .store
        .insert_professor(&NewProfessor {
            name: "Maria Lopez".to_string(),
            email: fx.email("maria"),
            employee_code: format!("P{}", fx.tag),
            specialty: "Redes".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(fx.store.find_person(juan.person.id).await.unwrap(), Some(Person::Student(juan.clone())));
    assert!(matches!(
        fx.store.find_person(professor.person.id).await.unwrap(),
        Some(Person::Professor(p)) if p.employee_code == professor.employee_code
    ));
    assert!(fx.store.professor_code_exists(&professor.employee_code).await.unwrap());
    assert_eq!(fx.store.find_student_by_email(&email(&fx.email("juan"))).await.unwrap(), Some(juan));
    assert!(fx.store.find_student_by_email(&email(&fx.email("maria"))).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn write_failures_name_the_violated_constraint() {
    let fx = Fixture::new().await;
    let juan = fx.catalog().await;
    let web = fx.store.find_course_by_code(&format!("C{}1", fx.tag)).await.unwrap().unwrap();

    let same_email = NewStudent {
        name: "Otro".to_string(),
        email: fx.email("juan").to_uppercase(),
        student_code: format!("S{}otro", fx.tag),
        entry_semester: 20241,
    };
    let err = fx.store.insert_student(&same_email).await.unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(ref c) if c == constraint::PERSON_EMAIL));

    let same_code = NewStudent {
        email: fx.email("otro"),
        student_code: juan.student_code.clone(),
        ..same_email.clone()
    };
    let err = fx.store.insert_student(&same_code).await.unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(ref c) if c == constraint::STUDENT_CODE));

    // The failed subtype insert rolled back its persons row, so the email is still free.
    let retry = NewStudent { email: fx.email("otro"), ..same_email };
    fx.store.insert_student(&retry).await.unwrap();

    let copy = NewCourse {
        name: "Copia".to_string(),
        credit_count: 2,
        course_code: web.course_code.clone(),
        description: None,
        professor_id: None,
    };
    let err = fx.store.insert_course(&copy).await.unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(ref c) if c == constraint::COURSE_CODE));

    let taught_by_student = NewCourse {
        course_code: format!("C{}9", fx.tag),
        professor_id: Some(juan.person.id),
        ..copy
    };
    let err = fx.store.insert_course(&taught_by_student).await.unwrap_err();
    assert!(matches!(err, DbError::MissingReference(ref c) if c == constraint::COURSE_PROFESSOR));

    let again = NewEnrollment {
        student_id: juan.person.id,
        course_id: web.id,
        enrollment_date: date(2024, 4, 1),
        status: EnrollmentStatus::Active,
        final_grade: None,
    };
    let err = fx.store.insert_enrollment(&again).await.unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(ref c) if c == constraint::ENROLLMENT_PAIR));

    let no_course = NewEnrollment { course_id: -1, ..again.clone() };
    let err = fx.store.insert_enrollment(&no_course).await.unwrap_err();
    assert!(matches!(err, DbError::MissingReference(ref c) if c == constraint::ENROLLMENT_COURSE));

    let no_student = NewEnrollment { student_id: -1, ..again };
    let err = fx.store.insert_enrollment(&no_student).await.unwrap_err();
    assert!(matches!(err, DbError::MissingReference(ref c) if c == constraint::ENROLLMENT_STUDENT));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn code_status_and_course_name_filters() {
    let fx = Fixture::new().await;
    let juan = fx.catalog().await;

    let by_code = fx.store.enrollments_by_student_code(&juan.student_code).await.unwrap();
    assert_eq!(by_code.len(), 2);
    assert!(by_code[0].enrollment_date > by_code[1].enrollment_date);
    assert!(fx
        .store
        .enrollments_by_student_code(&juan.student_code.to_lowercase())
        .await
        .unwrap()
        .is_empty());

    let completed = fx.store.enrollments_by_status(EnrollmentStatus::Completed).await.unwrap();
    assert!(completed.iter().any(|e| e.student_id == juan.person.id));
    assert!(completed.iter().all(|e| e.status == EnrollmentStatus::Completed));

    // "Base de Datos" sorts before "Desarrollo Web".
    let by_course = fx.store.enrollments_by_course_name(&fx.tag.to_uppercase()).await.unwrap();
    let dates: Vec<NaiveDate> = by_course.iter().map(|e| e.enrollment_date).collect();
    assert_eq!(dates, [date(2023, 8, 15), date(2024, 3, 1)]);
}
