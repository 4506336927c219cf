//! Inputs for the insert path. Each one is validated before it reaches a store.

use crate::enums::EnrollmentStatus;
use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

pub const MAX_GRADE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid(field, "must not be blank"));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::invalid(field, format!("must be at most {max_len} characters")));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), CoreError> {
    require_text("email", value, 100)?;
    if value.chars().any(char::is_whitespace) {
        return Err(CoreError::invalid("email", "must not contain whitespace"));
    }
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(CoreError::invalid("email", "must look like user@domain")),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub student_code: String,
    pub entry_semester: i32,
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name, 100)?;
        require_email(&self.email)?;
        require_text("student_code", &self.student_code, 20)?;
        if self.entry_semester <= 0 {
            return Err(CoreError::invalid("entry_semester", "must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProfessor {
    pub name: String,
    pub email: String,
    pub employee_code: String,
    pub specialty: String,
}

impl NewProfessor {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name, 100)?;
        require_email(&self.email)?;
        require_text("employee_code", &self.employee_code, 20)?;
        require_text("specialty", &self.specialty, 100)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub credit_count: i32,
    pub course_code: String,
    pub description: Option<String>,
    pub professor_id: Option<i64>,
}

impl NewCourse {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name, 150)?;
        require_text("course_code", &self.course_code, 10)?;
        if self.credit_count < 1 {
            return Err(CoreError::invalid("credit_count", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEnrollment {
    pub student_id: i64,
    pub course_id: i64,
    pub enrollment_date: NaiveDate,
    #[serde(default)]
    pub status: EnrollmentStatus,
    pub final_grade: Option<Decimal>,
}

impl NewEnrollment {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(grade) = self.final_grade {
            if grade < Decimal::ZERO || grade > MAX_GRADE {
                return Err(CoreError::invalid("final_grade", "must be between 0.00 and 20.00"));
            }
            if grade.normalize().scale() > 2 {
                return Err(CoreError::invalid("final_grade", "has more than two decimal places"));
            }
        }
        Ok(())
    }

    /// The grade as a `NUMERIC(4,2)` column holds it, with exactly two decimals.
    pub fn stored_grade(&self) -> Option<Decimal> {
        self.final_grade.map(|mut grade| {
            grade.rescale(2);
            grade
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn course(credits: i32) -> NewCourse {
        NewCourse {
            name: "Desarrollo Web".to_string(),
            credit_count: credits,
            course_code: "CS101".to_string(),
            description: None,
            professor_id: None,
        }
    }

    fn enrollment(grade: Option<Decimal>) -> NewEnrollment {
        NewEnrollment {
            student_id: 1,
            course_id: 1,
            enrollment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status: EnrollmentStatus::Active,
            final_grade: grade,
        }
    }

    #[test]
    fn course_needs_at_least_one_credit() {
        assert!(course(4).validate().is_ok());
        assert!(course(0).validate().is_err());
    }

    #[test]
    fn course_code_is_bounded() {
        let mut c = course(3);
        c.course_code = "CS101-EXTENDED".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn grade_range_and_scale() {
        assert!(enrollment(None).validate().is_ok());
        assert!(enrollment(Some(dec!(0))).validate().is_ok());
        assert!(enrollment(Some(dec!(20.00))).validate().is_ok());
        assert!(enrollment(Some(dec!(15.75))).validate().is_ok());
        assert!(enrollment(Some(dec!(15.750))).validate().is_ok());
        assert!(enrollment(Some(dec!(20.01))).validate().is_err());
        assert!(enrollment(Some(dec!(-1))).validate().is_err());
        assert!(enrollment(Some(dec!(12.345))).validate().is_err());
    }

    #[test]
    fn stored_grade_has_two_decimals() {
        let stored = |grade| enrollment(Some(grade)).stored_grade().map(|g| g.to_string());
        assert_eq!(stored(dec!(15.750)), Some("15.75".to_string()));
        assert_eq!(stored(dec!(16)), Some("16.00".to_string()));
        assert_eq!(enrollment(None).stored_grade(), None);
    }

    #[test]
    fn student_fields_are_required() {
        let student = NewStudent {
            name: "Juan Perez".to_string(),
            email: "juan.perez@universidad.edu.pe".to_string(),
            student_code: "A2024001".to_string(),
            entry_semester: 20241,
        };
        assert!(student.validate().is_ok());

        let blank = NewStudent { name: "  ".to_string(), ..student.clone() };
        assert!(blank.validate().is_err());

        let bad_email = NewStudent { email: "juan.perez".to_string(), ..student };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn padded_email_is_rejected() {
        let student = NewStudent {
            name: "Juan Perez".to_string(),
            email: " juan.perez@universidad.edu.pe".to_string(),
            student_code: "A2024001".to_string(),
            entry_semester: 20241,
        };
        assert!(matches!(
            student.validate(),
            Err(CoreError::InvalidInput(field, _)) if field == "email"
        ));

        let trailing = NewStudent { email: "ana@u.pe\t".to_string(), ..student.clone() };
        assert!(trailing.validate().is_err());

        let inner = NewStudent { email: "ana torres@u.pe".to_string(), ..student };
        assert!(inner.validate().is_err());
    }

    #[test]
    fn professor_specialty_is_required() {
        let professor = NewProfessor {
            name: "Maria Lopez".to_string(),
            email: "maria.lopez@universidad.edu.pe".to_string(),
            employee_code: "P001".to_string(),
            specialty: String::new(),
        };
        assert!(professor.validate().is_err());
    }
}
