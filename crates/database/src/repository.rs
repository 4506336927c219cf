use crate::error::DbError;
use crate::store::AcademicStore;
use async_trait::async_trait;
use core_types::{
    AuditInfo, Auditor, Course, CourseSortField, Enrollment, EnrollmentDetail, EnrollmentSortField,
    EnrollmentStatus, NewCourse, NewEnrollment, NewProfessor, NewStudent, Page, PageRequest,
    Person, PersonBase, PersonKind, Professor, SortField, Student, StudentEmail,
};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

// ==============================================================================
// Column lists
// ==============================================================================
// Every column is aliased with a table prefix so that joined queries can map
// several entities out of one row without name clashes.

const COURSE_COLUMNS: &str = "c.id AS c_id, c.name AS c_name, c.credit_count AS c_credit_count, \
     c.course_code AS c_course_code, c.description AS c_description, c.professor_id AS c_professor_id, \
     c.created_by AS c_created_by, c.created_at AS c_created_at, \
     c.updated_by AS c_updated_by, c.updated_at AS c_updated_at";

const ENROLLMENT_COLUMNS: &str = "e.id AS e_id, e.student_id AS e_student_id, e.course_id AS e_course_id, \
     e.enrollment_date AS e_enrollment_date, e.status AS e_status, e.final_grade AS e_final_grade, \
     e.created_by AS e_created_by, e.created_at AS e_created_at, \
     e.updated_by AS e_updated_by, e.updated_at AS e_updated_at";

const PERSON_COLUMNS: &str = "p.id AS p_id, p.name AS p_name, p.email AS p_email, p.person_type AS p_person_type, \
     p.created_by AS p_created_by, p.created_at AS p_created_at, \
     p.updated_by AS p_updated_by, p.updated_at AS p_updated_at";

const STUDENT_COLUMNS: &str = "s.student_code AS s_student_code, s.entry_semester AS s_entry_semester";

const PROFESSOR_COLUMNS: &str = "pr.employee_code AS pr_employee_code, pr.specialty AS pr_specialty";

/// Joins an enrollment (`e`) to its student's base row (`p`).
const ENROLLMENT_TO_PERSON: &str = "JOIN students s ON s.person_id = e.student_id \
     JOIN persons p ON p.id = s.person_id";

const NEWEST_FIRST: &str = "ORDER BY e.enrollment_date DESC, e.id DESC";

// ==============================================================================
// Row mapping
// ==============================================================================

fn audit_from_row(row: &PgRow, prefix: &str) -> Result<AuditInfo, sqlx::Error> {
    Ok(AuditInfo {
        created_by: row.try_get(format!("{prefix}created_by").as_str())?,
        created_at: row.try_get(format!("{prefix}created_at").as_str())?,
        updated_by: row.try_get(format!("{prefix}updated_by").as_str())?,
        updated_at: row.try_get(format!("{prefix}updated_at").as_str())?,
    })
}

fn course_from_row(row: &PgRow) -> Result<Course, DbError> {
    Ok(Course {
        id: row.try_get("c_id")?,
        name: row.try_get("c_name")?,
        credit_count: row.try_get("c_credit_count")?,
        course_code: row.try_get("c_course_code")?,
        description: row.try_get("c_description")?,
        professor_id: row.try_get("c_professor_id")?,
        audit: audit_from_row(row, "c_")?,
    })
}

fn status_from_row(row: &PgRow) -> Result<EnrollmentStatus, DbError> {
    let raw: String = row.try_get("e_status")?;
    raw.parse::<EnrollmentStatus>()
        .map_err(|_| DbError::Inconsistent(format!("enrollment status '{raw}'")))
}

fn enrollment_from_row(row: &PgRow) -> Result<Enrollment, DbError> {
    Ok(Enrollment {
        id: row.try_get("e_id")?,
        student_id: row.try_get("e_student_id")?,
        course_id: row.try_get("e_course_id")?,
        enrollment_date: row.try_get("e_enrollment_date")?,
        status: status_from_row(row)?,
        final_grade: row.try_get("e_final_grade")?,
        audit: audit_from_row(row, "e_")?,
    })
}

fn person_base_from_row(row: &PgRow) -> Result<PersonBase, DbError> {
    Ok(PersonBase {
        id: row.try_get("p_id")?,
        name: row.try_get("p_name")?,
        email: row.try_get("p_email")?,
        audit: audit_from_row(row, "p_")?,
    })
}

fn student_from_row(row: &PgRow) -> Result<Student, DbError> {
    Ok(Student {
        person: person_base_from_row(row)?,
        student_code: row.try_get("s_student_code")?,
        entry_semester: row.try_get("s_entry_semester")?,
    })
}

fn professor_from_row(row: &PgRow) -> Result<Professor, DbError> {
    Ok(Professor {
        person: person_base_from_row(row)?,
        employee_code: row.try_get("pr_employee_code")?,
        specialty: row.try_get("pr_specialty")?,
    })
}

/// Maps a `persons` row left-joined with both subtype tables. The
/// discriminator decides which subtype columns must be present.
fn person_from_row(row: &PgRow) -> Result<Person, DbError> {
    let raw_kind: String = row.try_get("p_person_type")?;
    let kind = raw_kind
        .parse::<PersonKind>()
        .map_err(|_| DbError::Inconsistent(format!("person discriminator '{raw_kind}'")))?;
    let id: i64 = row.try_get("p_id")?;
    match kind {
        PersonKind::Student => {
            let code: Option<String> = row.try_get("s_student_code")?;
            if code.is_none() {
                return Err(DbError::Inconsistent(format!("person {id} has no students row")));
            }
            Ok(Person::Student(student_from_row(row)?))
        }
        PersonKind::Professor => {
            let code: Option<String> = row.try_get("pr_employee_code")?;
            if code.is_none() {
                return Err(DbError::Inconsistent(format!("person {id} has no professors row")));
            }
            Ok(Person::Professor(professor_from_row(row)?))
        }
    }
}

fn enrollment_detail_from_row(row: &PgRow) -> Result<EnrollmentDetail, DbError> {
    Ok(EnrollmentDetail {
        id: row.try_get("e_id")?,
        student: student_from_row(row)?,
        course: course_from_row(row)?,
        enrollment_date: row.try_get("e_enrollment_date")?,
        status: status_from_row(row)?,
        final_grade: row.try_get("e_final_grade")?,
        audit: audit_from_row(row, "e_")?,
    })
}

fn map_rows<T>(rows: Vec<PgRow>, f: fn(&PgRow) -> Result<T, DbError>) -> Result<Vec<T>, DbError> {
    rows.iter().map(f).collect()
}

/// `ORDER BY` for a paginated read: the requested column, then the primary
/// key so that rows with equal sort values keep a stable position.
fn page_order<F: SortField>(request: &PageRequest<F>, id_column: &str) -> String {
    let sort = request.sort();
    format!(
        "ORDER BY {} {}, {} ASC",
        sort.field.column(),
        sort.direction.as_sql(),
        id_column
    )
}

fn limit_offset<F: SortField>(request: &PageRequest<F>) -> Result<(i64, i64), DbError> {
    let offset = i64::try_from(request.offset())
        .map_err(|_| core_types::CoreError::InvalidInput("page".into(), "is too large".into()))?;
    Ok((i64::from(request.size()), offset))
}

/// Logs a failed read before handing it back as a [`DbError`].
fn read_failed(query: &'static str) -> impl FnOnce(sqlx::Error) -> DbError {
    move |e| {
        tracing::error!(query, error = %e, "Database read failed.");
        DbError::from(e)
    }
}

fn to_count(total: i64) -> u64 {
    u64::try_from(total).unwrap_or(0)
}

// ==============================================================================
// PostgreSQL repository
// ==============================================================================

/// The `DbRepository` provides the PostgreSQL implementation of
/// [`AcademicStore`]. It encapsulates all SQL queries and data access logic.
///
/// User-supplied text is always bound as a parameter; only whitelisted sort
/// columns are formatted into the SQL text.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
    auditor: Auditor,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool, auditor: Auditor) -> Self {
        Self { pool, auditor }
    }

    async fn fetch_courses(&self, sql: &str, bind: Option<CourseFilter<'_>>) -> Result<Vec<Course>, DbError> {
        let query = sqlx::query(sql);
        let query = match bind {
            Some(CourseFilter::Text(text)) => query.bind(text),
            Some(CourseFilter::Credits(credits)) => query.bind(credits),
            None => query,
        };
        let rows = query.fetch_all(&self.pool).await.map_err(read_failed("courses"))?;
        map_rows(rows, course_from_row)
    }

    async fn fetch_enrollments(&self, sql: &str, text: &str) -> Result<Vec<Enrollment>, DbError> {
        let rows = sqlx::query(sql)
            .bind(text)
            .fetch_all(&self.pool)
            .await
            .map_err(read_failed("enrollments"))?;
        map_rows(rows, enrollment_from_row)
    }
}

enum CourseFilter<'a> {
    Text(&'a str),
    Credits(i32),
}

#[async_trait]
impl AcademicStore for DbRepository {
    async fn search_courses_by_name(&self, fragment: &str) -> Result<Vec<Course>, DbError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses c \
             WHERE strpos(LOWER(c.name), LOWER($1)) > 0 \
             ORDER BY c.name ASC, c.id ASC"
        );
        self.fetch_courses(&sql, Some(CourseFilter::Text(fragment))).await
    }

    async fn page_courses(
        &self,
        fragment: &str,
        request: &PageRequest<CourseSortField>,
    ) -> Result<Page<Course>, DbError> {
        // An empty fragment lists everything instead of filtering.
        const FILTER: &str = "WHERE ($1 = '' OR strpos(LOWER(c.name), LOWER($1)) > 0)";
        let (limit, offset) = limit_offset(request)?;

        let count_sql = format!("SELECT COUNT(*) FROM courses c {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(fragment)
            .fetch_one(&self.pool)
            .await
            .map_err(read_failed("page_courses count"))?;

        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses c {FILTER} {} LIMIT $2 OFFSET $3",
            page_order(request, "c.id")
        );
        let rows = sqlx::query(&sql)
            .bind(fragment)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(read_failed("page_courses"))?;

        Ok(Page::new(map_rows(rows, course_from_row)?, request, to_count(total)))
    }

    async fn find_course(&self, id: i64) -> Result<Option<Course>, DbError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_failed("find_course"))?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn find_course_by_code(&self, code: &str) -> Result<Option<Course>, DbError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses c WHERE c.course_code = $1");
        let row = sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_failed("find_course_by_code"))?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, DbError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses c ORDER BY c.id ASC");
        self.fetch_courses(&sql, None).await
    }

    async fn courses_by_credits(&self, credits: i32) -> Result<Vec<Course>, DbError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.credit_count = $1 \
             ORDER BY c.name ASC, c.id ASC"
        );
        self.fetch_courses(&sql, Some(CourseFilter::Credits(credits))).await
    }

    async fn courses_by_min_credits(&self, min_credits: i32) -> Result<Vec<Course>, DbError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.credit_count >= $1 \
             ORDER BY c.credit_count DESC, c.name ASC, c.id ASC"
        );
        self.fetch_courses(&sql, Some(CourseFilter::Credits(min_credits))).await
    }

    async fn enrollments_by_student_email(
        &self,
        email: &StudentEmail,
    ) -> Result<Vec<Enrollment>, DbError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e {ENROLLMENT_TO_PERSON} \
             WHERE LOWER(p.email) = LOWER($1) {NEWEST_FIRST}"
        );
        self.fetch_enrollments(&sql, email.as_str()).await
    }

    async fn enrollment_details_by_student_email(
        &self,
        email: &StudentEmail,
    ) -> Result<Vec<EnrollmentDetail>, DbError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS}, {PERSON_COLUMNS}, {STUDENT_COLUMNS}, {COURSE_COLUMNS} \
             FROM enrollments e {ENROLLMENT_TO_PERSON} \
             JOIN courses c ON c.id = e.course_id \
             WHERE LOWER(p.email) = LOWER($1) {NEWEST_FIRST}"
        );
        let rows = sqlx::query(&sql)
            .bind(email.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(read_failed("enrollment_details_by_student_email"))?;
        map_rows(rows, enrollment_detail_from_row)
    }

    async fn count_active_enrollments_by_email(&self, email: &StudentEmail) -> Result<i64, DbError> {
        let sql = format!(
            "SELECT COUNT(*) FROM enrollments e {ENROLLMENT_TO_PERSON} \
             WHERE LOWER(p.email) = LOWER($1) AND e.status = $2"
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(email.as_str())
            .bind(EnrollmentStatus::Active.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(read_failed("count_active_enrollments_by_email"))?;
        Ok(count)
    }

    async fn page_enrollments_by_student_email(
        &self,
        email: &StudentEmail,
        request: &PageRequest<EnrollmentSortField>,
    ) -> Result<Page<Enrollment>, DbError> {
        let (limit, offset) = limit_offset(request)?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM enrollments e {ENROLLMENT_TO_PERSON} WHERE LOWER(p.email) = LOWER($1)"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(email.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(read_failed("page_enrollments_by_student_email count"))?;

        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e {ENROLLMENT_TO_PERSON} \
             WHERE LOWER(p.email) = LOWER($1) {} LIMIT $2 OFFSET $3",
            page_order(request, "e.id")
        );
        let rows = sqlx::query(&sql)
            .bind(email.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(read_failed("page_enrollments_by_student_email"))?;

        Ok(Page::new(map_rows(rows, enrollment_from_row)?, request, to_count(total)))
    }

    async fn page_enrollments(
        &self,
        request: &PageRequest<EnrollmentSortField>,
    ) -> Result<Page<Enrollment>, DbError> {
        let (limit, offset) = limit_offset(request)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
            .fetch_one(&self.pool)
            .await
            .map_err(read_failed("page_enrollments count"))?;

        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e {} LIMIT $1 OFFSET $2",
            page_order(request, "e.id")
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(read_failed("page_enrollments"))?;

        Ok(Page::new(map_rows(rows, enrollment_from_row)?, request, to_count(total)))
    }

    async fn find_enrollment(&self, id: i64) -> Result<Option<Enrollment>, DbError> {
        let sql = format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_failed("find_enrollment"))?;
        row.as_ref().map(enrollment_from_row).transpose()
    }

    async fn enrollments_by_student_code(&self, code: &str) -> Result<Vec<Enrollment>, DbError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e \
             JOIN students s ON s.person_id = e.student_id \
             WHERE s.student_code = $1 {NEWEST_FIRST}"
        );
        self.fetch_enrollments(&sql, code).await
    }

    async fn enrollments_by_course_name(&self, fragment: &str) -> Result<Vec<Enrollment>, DbError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e \
             JOIN courses c ON c.id = e.course_id \
             WHERE strpos(LOWER(c.name), LOWER($1)) > 0 \
             ORDER BY c.name ASC, e.enrollment_date DESC, e.id DESC"
        );
        self.fetch_enrollments(&sql, fragment).await
    }

    async fn enrollments_by_status(
        &self,
        status: EnrollmentStatus,
    ) -> Result<Vec<Enrollment>, DbError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.status = $1 {NEWEST_FIRST}"
        );
        self.fetch_enrollments(&sql, status.as_str()).await
    }

    async fn find_person(&self, id: i64) -> Result<Option<Person>, DbError> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS}, {STUDENT_COLUMNS}, {PROFESSOR_COLUMNS} FROM persons p \
             LEFT JOIN students s ON s.person_id = p.id \
             LEFT JOIN professors pr ON pr.person_id = p.id \
             WHERE p.id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_failed("find_person"))?;
        row.as_ref().map(person_from_row).transpose()
    }

    async fn find_student_by_email(&self, email: &StudentEmail) -> Result<Option<Student>, DbError> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS}, {STUDENT_COLUMNS} FROM persons p \
             JOIN students s ON s.person_id = p.id \
             WHERE LOWER(p.email) = LOWER($1)"
        );
        let row = sqlx::query(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(read_failed("find_student_by_email"))?;
        row.as_ref().map(student_from_row).transpose()
    }

    async fn find_professor_by_code(&self, code: &str) -> Result<Option<Professor>, DbError> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS}, {PROFESSOR_COLUMNS} FROM persons p \
             JOIN professors pr ON pr.person_id = p.id \
             WHERE pr.employee_code = $1"
        );
        let row = sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_failed("find_professor_by_code"))?;
        row.as_ref().map(professor_from_row).transpose()
    }

    async fn professor_code_exists(&self, code: &str) -> Result<bool, DbError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM professors WHERE employee_code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await
                .map_err(read_failed("professor_code_exists"))?;
        Ok(exists)
    }

    /// Writes the `persons` base row and the `students` row in one transaction.
    async fn insert_student(&self, student: &NewStudent) -> Result<Student, DbError> {
        student.validate()?;
        let audit = self.auditor.stamp();
        let mut tx = self.pool.begin().await?;

        let id: i64 = insert_person_row(&mut tx, &student.name, &student.email, PersonKind::Student, &audit).await?;
        sqlx::query("INSERT INTO students (person_id, student_code, entry_semester) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&student.student_code)
            .bind(student.entry_semester)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_write)?;

        tx.commit().await?;
        tracing::debug!(id, code = %student.student_code, "Inserted student.");

        Ok(Student {
            person: PersonBase {
                id,
                name: student.name.clone(),
                email: student.email.clone(),
                audit,
            },
            student_code: student.student_code.clone(),
            entry_semester: student.entry_semester,
        })
    }

    /// Writes the `persons` base row and the `professors` row in one transaction.
    async fn insert_professor(&self, professor: &NewProfessor) -> Result<Professor, DbError> {
        professor.validate()?;
        let audit = self.auditor.stamp();
        let mut tx = self.pool.begin().await?;

        let id: i64 = insert_person_row(&mut tx, &professor.name, &professor.email, PersonKind::Professor, &audit).await?;
        sqlx::query("INSERT INTO professors (person_id, employee_code, specialty) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&professor.employee_code)
            .bind(&professor.specialty)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_write)?;

        tx.commit().await?;
        tracing::debug!(id, code = %professor.employee_code, "Inserted professor.");

        Ok(Professor {
            person: PersonBase {
                id,
                name: professor.name.clone(),
                email: professor.email.clone(),
                audit,
            },
            employee_code: professor.employee_code.clone(),
            specialty: professor.specialty.clone(),
        })
    }

    async fn insert_course(&self, course: &NewCourse) -> Result<Course, DbError> {
        course.validate()?;
        let audit = self.auditor.stamp();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO courses (name, credit_count, course_code, description, professor_id,
                                 created_by, created_at, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&course.name)
        .bind(course.credit_count)
        .bind(&course.course_code)
        .bind(course.description.as_deref())
        .bind(course.professor_id)
        .bind(&audit.created_by)
        .bind(audit.created_at)
        .bind(&audit.updated_by)
        .bind(audit.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        tracing::debug!(id, code = %course.course_code, "Inserted course.");
        Ok(Course {
            id,
            name: course.name.clone(),
            credit_count: course.credit_count,
            course_code: course.course_code.clone(),
            description: course.description.clone(),
            professor_id: course.professor_id,
            audit,
        })
    }

    async fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<Enrollment, DbError> {
        enrollment.validate()?;
        let audit = self.auditor.stamp();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO enrollments (student_id, course_id, enrollment_date, status, final_grade,
                                     created_by, created_at, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(enrollment.student_id)
        .bind(enrollment.course_id)
        .bind(enrollment.enrollment_date)
        .bind(enrollment.status.as_str())
        .bind(enrollment.stored_grade())
        .bind(&audit.created_by)
        .bind(audit.created_at)
        .bind(&audit.updated_by)
        .bind(audit.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        tracing::debug!(id, student_id = enrollment.student_id, course_id = enrollment.course_id, "Inserted enrollment.");
        Ok(Enrollment {
            id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            enrollment_date: enrollment.enrollment_date,
            status: enrollment.status,
            final_grade: enrollment.stored_grade(),
            audit,
        })
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn insert_person_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    name: &str,
    email: &str,
    kind: PersonKind,
    audit: &AuditInfo,
) -> Result<i64, DbError> {
    sqlx::query_scalar(
        r#"
        INSERT INTO persons (name, email, person_type, created_by, created_at, updated_by, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(kind.as_str())
    .bind(&audit.created_by)
    .bind(audit.created_at)
    .bind(&audit.updated_by)
    .bind(audit.updated_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(DbError::from_write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Sort, SortDirection};

    #[test]
    fn page_order_breaks_ties_by_id() {
        let sort = Sort::new(EnrollmentSortField::FinalGrade, SortDirection::Desc);
        let request = PageRequest::new(0, 10, 100, sort).unwrap();
        assert_eq!(page_order(&request, "e.id"), "ORDER BY e.final_grade DESC, e.id ASC");
    }

    #[test]
    fn limit_offset_follows_page_request() {
        let sort = Sort::new(CourseSortField::Name, SortDirection::Asc);
        let request = PageRequest::new(4, 25, 100, sort).unwrap();
        assert_eq!(limit_offset(&request).unwrap(), (25, 100));
    }

    #[test]
    fn read_failures_keep_the_driver_error() {
        let err = read_failed("find_course")(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::ConnectionError(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(to_count(-1), 0);
        assert_eq!(to_count(42), 42);
    }
}
