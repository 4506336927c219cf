use crate::error::DbError;
use async_trait::async_trait;
use core_types::{
    Course, CourseSortField, Enrollment, EnrollmentDetail, EnrollmentSortField, EnrollmentStatus,
    NewCourse, NewEnrollment, NewProfessor, NewStudent, Page, PageRequest, Person, Professor,
    Student, StudentEmail,
};

/// Names of the uniqueness and reference constraints, shared by every store so
/// that a violation reads the same regardless of the backend.
pub mod constraint {
    pub const PERSON_EMAIL: &str = "persons_email_lower_key";
    pub const STUDENT_CODE: &str = "students_student_code_key";
    pub const EMPLOYEE_CODE: &str = "professors_employee_code_key";
    pub const COURSE_CODE: &str = "courses_course_code_key";
    pub const ENROLLMENT_PAIR: &str = "enrollments_student_course_key";
    pub const COURSE_PROFESSOR: &str = "courses_professor_id_fkey";
    pub const ENROLLMENT_STUDENT: &str = "enrollments_student_id_fkey";
    pub const ENROLLMENT_COURSE: &str = "enrollments_course_id_fkey";
}

/// The query layer: every read the API serves, plus the insert path used for
/// seeding.
///
/// Every multi-row read has a deterministic order, and paginated reads break
/// ties by primary key, so consecutive pages never overlap. Lookups that match
/// nothing return `Ok(None)`, never an error.
#[async_trait]
pub trait AcademicStore: Send + Sync {
    // --- Courses ---

    /// Case-insensitive literal substring match on the course name.
    /// An empty fragment matches every course. Ordered by name, then id.
    async fn search_courses_by_name(&self, fragment: &str) -> Result<Vec<Course>, DbError>;

    /// One page of courses. An empty fragment lists all courses.
    async fn page_courses(
        &self,
        fragment: &str,
        request: &PageRequest<CourseSortField>,
    ) -> Result<Page<Course>, DbError>;

    async fn find_course(&self, id: i64) -> Result<Option<Course>, DbError>;

    async fn find_course_by_code(&self, code: &str) -> Result<Option<Course>, DbError>;

    /// Every course, ordered by id.
    async fn list_courses(&self) -> Result<Vec<Course>, DbError>;

    /// Courses worth exactly `credits`, ordered by name.
    async fn courses_by_credits(&self, credits: i32) -> Result<Vec<Course>, DbError>;

    /// Courses worth at least `min_credits`, ordered by credits descending then name.
    async fn courses_by_min_credits(&self, min_credits: i32) -> Result<Vec<Course>, DbError>;

    // --- Enrollments ---

    /// Enrollments of the student with this email, newest enrollment date first.
    async fn enrollments_by_student_email(
        &self,
        email: &StudentEmail,
    ) -> Result<Vec<Enrollment>, DbError>;

    /// Same filter and order as `enrollments_by_student_email`, with the
    /// student and course loaded in the same query.
    async fn enrollment_details_by_student_email(
        &self,
        email: &StudentEmail,
    ) -> Result<Vec<EnrollmentDetail>, DbError>;

    async fn count_active_enrollments_by_email(&self, email: &StudentEmail) -> Result<i64, DbError>;

    async fn page_enrollments_by_student_email(
        &self,
        email: &StudentEmail,
        request: &PageRequest<EnrollmentSortField>,
    ) -> Result<Page<Enrollment>, DbError>;

    async fn page_enrollments(
        &self,
        request: &PageRequest<EnrollmentSortField>,
    ) -> Result<Page<Enrollment>, DbError>;

    async fn find_enrollment(&self, id: i64) -> Result<Option<Enrollment>, DbError>;

    /// Enrollments of the student with exactly this code, newest first.
    async fn enrollments_by_student_code(&self, code: &str) -> Result<Vec<Enrollment>, DbError>;

    /// Enrollments whose course name contains `fragment` (case-insensitive),
    /// ordered by course name, then newest first.
    async fn enrollments_by_course_name(&self, fragment: &str) -> Result<Vec<Enrollment>, DbError>;

    async fn enrollments_by_status(
        &self,
        status: EnrollmentStatus,
    ) -> Result<Vec<Enrollment>, DbError>;

    // --- Persons ---

    /// Loads a person of either subtype by id, resolved through the discriminator.
    async fn find_person(&self, id: i64) -> Result<Option<Person>, DbError>;

    async fn find_student_by_email(&self, email: &StudentEmail) -> Result<Option<Student>, DbError>;

    async fn find_professor_by_code(&self, code: &str) -> Result<Option<Professor>, DbError>;

    async fn professor_code_exists(&self, code: &str) -> Result<bool, DbError>;

    // --- Writes (audit-stamped) ---

    async fn insert_student(&self, student: &NewStudent) -> Result<Student, DbError>;

    async fn insert_professor(&self, professor: &NewProfessor) -> Result<Professor, DbError>;

    async fn insert_course(&self, course: &NewCourse) -> Result<Course, DbError>;

    async fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<Enrollment, DbError>;

    /// Checks that the backing store answers.
    async fn ping(&self) -> Result<(), DbError>;
}
