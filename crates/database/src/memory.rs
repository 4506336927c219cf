use crate::error::DbError;
use crate::store::{constraint, AcademicStore};
use async_trait::async_trait;
use core_types::{
    Auditor, Course, CourseSortField, Enrollment, EnrollmentDetail, EnrollmentSortField,
    EnrollmentStatus, NewCourse, NewEnrollment, NewProfessor, NewStudent, Page, PageRequest,
    Person, PersonBase, Professor, SortDirection, Student, StudentEmail,
};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tokio::sync::RwLock;

/// An [`AcademicStore`] over in-process vectors.
///
/// Mirrors the PostgreSQL repository's filtering, ordering, pagination and
/// constraint behavior, so the HTTP layer can run without a database
/// (`serve --in-memory`) and the query contract can be tested directly.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    auditor: Auditor,
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    students: Vec<Student>,
    professors: Vec<Professor>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    last_person_id: i64,
    last_course_id: i64,
    last_enrollment_id: i64,
}

impl State {
    fn student(&self, id: i64) -> Option<&Student> {
        self.students.iter().find(|s| s.person.id == id)
    }

    fn course(&self, id: i64) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    fn student_by_email(&self, email: &StudentEmail) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.person.email.to_lowercase() == email.as_str())
    }

    fn email_taken(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.students
            .iter()
            .map(|s| &s.person)
            .chain(self.professors.iter().map(|p| &p.person))
            .any(|p| p.email.to_lowercase() == email)
    }

    fn enrollments_of_email(&self, email: &StudentEmail) -> Vec<Enrollment> {
        match self.student_by_email(email) {
            Some(student) => self
                .enrollments
                .iter()
                .filter(|e| e.student_id == student.person.id)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

fn newest_first(a: &Enrollment, b: &Enrollment) -> Ordering {
    b.enrollment_date
        .cmp(&a.enrollment_date)
        .then_with(|| b.id.cmp(&a.id))
}

/// PostgreSQL's default: NULLs sort after every value ascending, before every value descending.
fn cmp_nulls_last(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn cmp_courses(a: &Course, b: &Course, request: &PageRequest<CourseSortField>) -> Ordering {
    let sort = request.sort();
    let by_field = match sort.field {
        CourseSortField::Id => a.id.cmp(&b.id),
        CourseSortField::Name => a.name.cmp(&b.name),
        CourseSortField::CreditCount => a.credit_count.cmp(&b.credit_count),
        CourseSortField::CourseCode => a.course_code.cmp(&b.course_code),
    };
    directed(by_field, sort.direction).then_with(|| a.id.cmp(&b.id))
}

fn cmp_enrollments(a: &Enrollment, b: &Enrollment, request: &PageRequest<EnrollmentSortField>) -> Ordering {
    let sort = request.sort();
    let by_field = match sort.field {
        EnrollmentSortField::Id => a.id.cmp(&b.id),
        EnrollmentSortField::EnrollmentDate => a.enrollment_date.cmp(&b.enrollment_date),
        EnrollmentSortField::Status => a.status.as_str().cmp(b.status.as_str()),
        EnrollmentSortField::FinalGrade => cmp_nulls_last(a.final_grade, b.final_grade),
    };
    directed(by_field, sort.direction).then_with(|| a.id.cmp(&b.id))
}

/// Slices an already sorted result set into the requested page.
fn paginate<T, F: core_types::SortField>(rows: Vec<T>, request: &PageRequest<F>) -> Page<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let content = rows
        .into_iter()
        .skip(offset)
        .take(request.size() as usize)
        .collect();
    Page::new(content, request, total)
}

impl InMemoryRepository {
    pub fn new(auditor: Auditor) -> Self {
        Self {
            auditor,
            state: RwLock::new(State::default()),
        }
    }

    fn sorted_courses(courses: impl Iterator<Item = Course>, cmp: fn(&Course, &Course) -> Ordering) -> Vec<Course> {
        let mut courses: Vec<Course> = courses.collect();
        courses.sort_by(cmp);
        courses
    }
}

fn by_name_then_id(a: &Course, b: &Course) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl AcademicStore for InMemoryRepository {
    async fn search_courses_by_name(&self, fragment: &str) -> Result<Vec<Course>, DbError> {
        let state = self.state.read().await;
        let matching = state
            .courses
            .iter()
            .filter(|c| contains_ignore_case(&c.name, fragment))
            .cloned();
        Ok(Self::sorted_courses(matching, by_name_then_id))
    }

    async fn page_courses(
        &self,
        fragment: &str,
        request: &PageRequest<CourseSortField>,
    ) -> Result<Page<Course>, DbError> {
        let state = self.state.read().await;
        let mut rows: Vec<Course> = state
            .courses
            .iter()
            .filter(|c| fragment.is_empty() || contains_ignore_case(&c.name, fragment))
            .cloned()
            .collect();
        rows.sort_by(|a, b| cmp_courses(a, b, request));
        Ok(paginate(rows, request))
    }

    async fn find_course(&self, id: i64) -> Result<Option<Course>, DbError> {
        Ok(self.state.read().await.course(id).cloned())
    }

    async fn find_course_by_code(&self, code: &str) -> Result<Option<Course>, DbError> {
        let state = self.state.read().await;
        Ok(state.courses.iter().find(|c| c.course_code == code).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, DbError> {
        let state = self.state.read().await;
        Ok(Self::sorted_courses(state.courses.iter().cloned(), |a, b| a.id.cmp(&b.id)))
    }

    async fn courses_by_credits(&self, credits: i32) -> Result<Vec<Course>, DbError> {
        let state = self.state.read().await;
        let matching = state
            .courses
            .iter()
            .filter(|c| c.credit_count == credits)
            .cloned();
        Ok(Self::sorted_courses(matching, by_name_then_id))
    }

    async fn courses_by_min_credits(&self, min_credits: i32) -> Result<Vec<Course>, DbError> {
        let state = self.state.read().await;
        let matching = state
            .courses
            .iter()
            .filter(|c| c.credit_count >= min_credits)
            .cloned();
        Ok(Self::sorted_courses(matching, |a, b| {
            b.credit_count
                .cmp(&a.credit_count)
                .then_with(|| by_name_then_id(a, b))
        }))
    }

    async fn enrollments_by_student_email(
        &self,
        email: &StudentEmail,
    ) -> Result<Vec<Enrollment>, DbError> {
        let mut rows = self.state.read().await.enrollments_of_email(email);
        rows.sort_by(newest_first);
        Ok(rows)
    }

    async fn enrollment_details_by_student_email(
        &self,
        email: &StudentEmail,
    ) -> Result<Vec<EnrollmentDetail>, DbError> {
        let state = self.state.read().await;
        let mut rows = state.enrollments_of_email(email);
        rows.sort_by(newest_first);

        rows.into_iter()
            .map(|e| {
                let student = state
                    .student(e.student_id)
                    .ok_or_else(|| DbError::Inconsistent(format!("enrollment {} has no student", e.id)))?;
                let course = state
                    .course(e.course_id)
                    .ok_or_else(|| DbError::Inconsistent(format!("enrollment {} has no course", e.id)))?;
                Ok(EnrollmentDetail {
                    id: e.id,
                    student: student.clone(),
                    course: course.clone(),
                    enrollment_date: e.enrollment_date,
                    status: e.status,
                    final_grade: e.final_grade,
                    audit: e.audit,
                })
            })
            .collect()
    }

    async fn count_active_enrollments_by_email(&self, email: &StudentEmail) -> Result<i64, DbError> {
        let state = self.state.read().await;
        let count = state
            .enrollments_of_email(email)
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Active)
            .count();
        Ok(count as i64)
    }

    async fn page_enrollments_by_student_email(
        &self,
        email: &StudentEmail,
        request: &PageRequest<EnrollmentSortField>,
    ) -> Result<Page<Enrollment>, DbError> {
        let mut rows = self.state.read().await.enrollments_of_email(email);
        rows.sort_by(|a, b| cmp_enrollments(a, b, request));
        Ok(paginate(rows, request))
    }

    async fn page_enrollments(
        &self,
        request: &PageRequest<EnrollmentSortField>,
    ) -> Result<Page<Enrollment>, DbError> {
        let mut rows = self.state.read().await.enrollments.clone();
        rows.sort_by(|a, b| cmp_enrollments(a, b, request));
        Ok(paginate(rows, request))
    }

    async fn find_enrollment(&self, id: i64) -> Result<Option<Enrollment>, DbError> {
        let state = self.state.read().await;
        Ok(state.enrollments.iter().find(|e| e.id == id).cloned())
    }

    async fn enrollments_by_student_code(&self, code: &str) -> Result<Vec<Enrollment>, DbError> {
        let state = self.state.read().await;
        let Some(student) = state.students.iter().find(|s| s.student_code == code) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<Enrollment> = state
            .enrollments
            .iter()
            .filter(|e| e.student_id == student.person.id)
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        Ok(rows)
    }

    async fn enrollments_by_course_name(&self, fragment: &str) -> Result<Vec<Enrollment>, DbError> {
        let state = self.state.read().await;
        let mut rows: Vec<(&str, Enrollment)> = state
            .enrollments
            .iter()
            .filter_map(|e| {
                let course = state.course(e.course_id)?;
                contains_ignore_case(&course.name, fragment).then(|| (course.name.as_str(), e.clone()))
            })
            .collect();
        rows.sort_by(|(name_a, a), (name_b, b)| name_a.cmp(name_b).then_with(|| newest_first(a, b)));
        Ok(rows.into_iter().map(|(_, e)| e).collect())
    }

    async fn enrollments_by_status(
        &self,
        status: EnrollmentStatus,
    ) -> Result<Vec<Enrollment>, DbError> {
        let state = self.state.read().await;
        let mut rows: Vec<Enrollment> = state
            .enrollments
            .iter()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        Ok(rows)
    }

    async fn find_person(&self, id: i64) -> Result<Option<Person>, DbError> {
        let state = self.state.read().await;
        if let Some(student) = state.student(id) {
            return Ok(Some(Person::Student(student.clone())));
        }
        Ok(state
            .professors
            .iter()
            .find(|p| p.person.id == id)
            .cloned()
            .map(Person::Professor))
    }

    async fn find_student_by_email(&self, email: &StudentEmail) -> Result<Option<Student>, DbError> {
        Ok(self.state.read().await.student_by_email(email).cloned())
    }

    async fn find_professor_by_code(&self, code: &str) -> Result<Option<Professor>, DbError> {
        let state = self.state.read().await;
        Ok(state.professors.iter().find(|p| p.employee_code == code).cloned())
    }

    async fn professor_code_exists(&self, code: &str) -> Result<bool, DbError> {
        let state = self.state.read().await;
        Ok(state.professors.iter().any(|p| p.employee_code == code))
    }

    async fn insert_student(&self, student: &NewStudent) -> Result<Student, DbError> {
        student.validate()?;
        let mut state = self.state.write().await;
        if state.email_taken(&student.email) {
            return Err(DbError::ConstraintViolation(constraint::PERSON_EMAIL.to_string()));
        }
        if state.students.iter().any(|s| s.student_code == student.student_code) {
            return Err(DbError::ConstraintViolation(constraint::STUDENT_CODE.to_string()));
        }

        let row = Student {
            person: PersonBase {
                id: next_id(&mut state.last_person_id),
                name: student.name.clone(),
                email: student.email.clone(),
                audit: self.auditor.stamp(),
            },
            student_code: student.student_code.clone(),
            entry_semester: student.entry_semester,
        };
        state.students.push(row.clone());
        Ok(row)
    }

    async fn insert_professor(&self, professor: &NewProfessor) -> Result<Professor, DbError> {
        professor.validate()?;
        let mut state = self.state.write().await;
        if state.email_taken(&professor.email) {
            return Err(DbError::ConstraintViolation(constraint::PERSON_EMAIL.to_string()));
        }
        if state.professors.iter().any(|p| p.employee_code == professor.employee_code) {
            return Err(DbError::ConstraintViolation(constraint::EMPLOYEE_CODE.to_string()));
        }

        let row = Professor {
            person: PersonBase {
                id: next_id(&mut state.last_person_id),
                name: professor.name.clone(),
                email: professor.email.clone(),
                audit: self.auditor.stamp(),
            },
            employee_code: professor.employee_code.clone(),
            specialty: professor.specialty.clone(),
        };
        state.professors.push(row.clone());
        Ok(row)
    }

    async fn insert_course(&self, course: &NewCourse) -> Result<Course, DbError> {
        course.validate()?;
        let mut state = self.state.write().await;
        if state.courses.iter().any(|c| c.course_code == course.course_code) {
            return Err(DbError::ConstraintViolation(constraint::COURSE_CODE.to_string()));
        }
        if let Some(professor_id) = course.professor_id {
            if !state.professors.iter().any(|p| p.person.id == professor_id) {
                return Err(DbError::MissingReference(constraint::COURSE_PROFESSOR.to_string()));
            }
        }

        let row = Course {
            id: next_id(&mut state.last_course_id),
            name: course.name.clone(),
            credit_count: course.credit_count,
            course_code: course.course_code.clone(),
            description: course.description.clone(),
            professor_id: course.professor_id,
            audit: self.auditor.stamp(),
        };
        state.courses.push(row.clone());
        Ok(row)
    }

    async fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<Enrollment, DbError> {
        enrollment.validate()?;
        let mut state = self.state.write().await;
        if state.student(enrollment.student_id).is_none() {
            return Err(DbError::MissingReference(constraint::ENROLLMENT_STUDENT.to_string()));
        }
        if state.course(enrollment.course_id).is_none() {
            return Err(DbError::MissingReference(constraint::ENROLLMENT_COURSE.to_string()));
        }
        if state
            .enrollments
            .iter()
            .any(|e| e.student_id == enrollment.student_id && e.course_id == enrollment.course_id)
        {
            return Err(DbError::ConstraintViolation(constraint::ENROLLMENT_PAIR.to_string()));
        }

        let row = Enrollment {
            id: next_id(&mut state.last_enrollment_id),
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            enrollment_date: enrollment.enrollment_date,
            status: enrollment.status,
            final_grade: enrollment.stored_grade(),
            audit: self.auditor.stamp(),
        };
        state.enrollments.push(row.clone());
        Ok(row)
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}
