//! # Academia Core Types
//!
//! The entity model and the typed parameters shared by every other crate.
//! Depends on nothing else in the workspace.

pub mod audit;
pub mod enums;
pub mod error;
pub mod inputs;
pub mod params;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use audit::Auditor;
pub use enums::{EnrollmentStatus, PersonKind, SortDirection};
pub use error::CoreError;
pub use inputs::{NewCourse, NewEnrollment, NewProfessor, NewStudent};
pub use params::{
    CourseSortField, EnrollmentSortField, Page, PageRequest, Sort, SortField, StudentEmail,
};
pub use structs::{
    AuditInfo, Course, Enrollment, EnrollmentDetail, Person, PersonBase, Professor, Student,
};
