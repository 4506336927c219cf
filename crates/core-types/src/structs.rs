use crate::enums::{EnrollmentStatus, PersonKind};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who created and last touched a row, and when.
///
/// Populated by the write path only (see `Auditor`); never part of an API response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// The columns shared by every participant, stored in the `persons` base table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonBase {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub audit: AuditInfo,
}

/// A student: the `persons` row joined with its `students` row by primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(flatten)]
    pub person: PersonBase,
    pub student_code: String,
    pub entry_semester: i32,
}

/// A professor: the `persons` row joined with its `professors` row by primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    #[serde(flatten)]
    pub person: PersonBase,
    pub employee_code: String,
    pub specialty: String,
}

/// Any participant of the academic domain.
///
/// The JSON form carries the discriminator, e.g.
/// `{ "person_type": "STUDENT", "id": 1, "name": "...", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "person_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Person {
    Student(Student),
    Professor(Professor),
}

impl Person {
    pub fn kind(&self) -> PersonKind {
        match self {
            Person::Student(_) => PersonKind::Student,
            Person::Professor(_) => PersonKind::Professor,
        }
    }

    pub fn base(&self) -> &PersonBase {
        match self {
            Person::Student(s) => &s.person,
            Person::Professor(p) => &p.person,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub credit_count: i32,
    pub course_code: String,
    pub description: Option<String>,
    /// The professor teaching the course, if one is assigned.
    pub professor_id: Option<i64>,
    #[serde(skip)]
    pub audit: AuditInfo,
}

/// An enrollment row. Holds non-owning references to its student and course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub enrollment_date: NaiveDate,
    pub status: EnrollmentStatus,
    pub final_grade: Option<Decimal>,
    #[serde(skip)]
    pub audit: AuditInfo,
}

/// An enrollment with its student and course resolved in the same query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentDetail {
    pub id: i64,
    pub student: Student,
    pub course: Course,
    pub enrollment_date: NaiveDate,
    pub status: EnrollmentStatus,
    pub final_grade: Option<Decimal>,
    #[serde(skip)]
    pub audit: AuditInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_student() -> Student {
        Student {
            person: PersonBase {
                id: 7,
                name: "Juan Perez".to_string(),
                email: "juan.perez@universidad.edu.pe".to_string(),
                audit: AuditInfo::default(),
            },
            student_code: "A2024001".to_string(),
            entry_semester: 20241,
        }
    }

    #[test]
    fn student_json_is_flat_and_hides_audit() {
        let value = serde_json::to_value(sample_student()).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["email"], "juan.perez@universidad.edu.pe");
        assert_eq!(value["student_code"], "A2024001");
        assert!(value.get("audit").is_none());
        assert!(value.get("person").is_none());
    }

    #[test]
    fn person_carries_discriminator() {
        let person = Person::Student(sample_student());
        assert_eq!(person.kind(), PersonKind::Student);
        assert_eq!(person.base().id, 7);

        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(value["person_type"], "STUDENT");
        assert_eq!(value["entry_semester"], 20241);
    }
}
