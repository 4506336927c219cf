//! Typed query parameters: validated emails, whitelisted sort fields, page
//! requests and the page envelope returned by paginated queries.

use crate::enums::SortDirection;
use crate::error::CoreError;
use serde::Serialize;
use std::fmt;

/// A student email used as a lookup key.
///
/// Trimmed and lower-cased; matching against stored emails is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentEmail(String);

impl StudentEmail {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::MissingParameter("email".to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A closed set of sortable columns for one entity.
///
/// `column` is interpolated into SQL, so implementors must only ever return
/// static column expressions.
pub trait SortField: Copy + fmt::Debug + Send + Sync + 'static {
    /// Accepts the API name (`nombre`, `fechaMatricula`, ...) or the field name.
    fn parse(raw: &str) -> Result<Self, CoreError>;

    fn column(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseSortField {
    Id,
    #[default]
    Name,
    CreditCount,
    CourseCode,
}

impl SortField for CourseSortField {
    fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim() {
            "id" => Ok(CourseSortField::Id),
            "nombre" | "name" => Ok(CourseSortField::Name),
            "creditos" | "credit_count" => Ok(CourseSortField::CreditCount),
            "codigoCurso" | "course_code" => Ok(CourseSortField::CourseCode),
            other => Err(CoreError::invalid(
                "sortBy",
                format!("'{other}' is not a sortable course field"),
            )),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            CourseSortField::Id => "c.id",
            CourseSortField::Name => "c.name",
            CourseSortField::CreditCount => "c.credit_count",
            CourseSortField::CourseCode => "c.course_code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrollmentSortField {
    Id,
    #[default]
    EnrollmentDate,
    Status,
    FinalGrade,
}

impl SortField for EnrollmentSortField {
    fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim() {
            "id" => Ok(EnrollmentSortField::Id),
            "fechaMatricula" | "enrollment_date" => Ok(EnrollmentSortField::EnrollmentDate),
            "estado" | "status" => Ok(EnrollmentSortField::Status),
            "notaFinal" | "final_grade" => Ok(EnrollmentSortField::FinalGrade),
            other => Err(CoreError::invalid(
                "sortBy",
                format!("'{other}' is not a sortable enrollment field"),
            )),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            EnrollmentSortField::Id => "e.id",
            EnrollmentSortField::EnrollmentDate => "e.enrollment_date",
            EnrollmentSortField::Status => "e.status",
            EnrollmentSortField::FinalGrade => "e.final_grade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F: SortField> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: SortField> Sort<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parses the raw `sortBy` / `sortDir` pair.
    pub fn parse(sort_by: &str, sort_dir: &str) -> Result<Self, CoreError> {
        Ok(Self::new(F::parse(sort_by)?, SortDirection::parse(sort_dir)))
    }
}

/// A zero-based page of a sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<F: SortField> {
    page: u32,
    size: u32,
    sort: Sort<F>,
}

impl<F: SortField> PageRequest<F> {
    /// Validates the raw page index and size. Sizes above `max_size` are clamped.
    pub fn new(page: i64, size: i64, max_size: u32, sort: Sort<F>) -> Result<Self, CoreError> {
        if page < 0 {
            return Err(CoreError::invalid("page", "must not be negative"));
        }
        if size < 1 {
            return Err(CoreError::invalid("size", "must be at least 1"));
        }
        let page = u32::try_from(page).map_err(|_| CoreError::invalid("page", "is too large"))?;
        let size = u32::try_from(size.min(i64::from(max_size.max(1))))
            .map_err(|_| CoreError::invalid("size", "is too large"))?;
        Ok(Self { page, size, sort })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> Sort<F> {
        self.sort
    }

    /// Number of rows preceding this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// The page envelope: one bounded slice of rows plus totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new<F: SortField>(content: Vec<T>, request: &PageRequest<F>, total_elements: u64) -> Self {
        let size = u64::from(request.size());
        let total_pages = total_elements.div_ceil(size);
        let page = request.page();
        Self {
            number_of_elements: content.len(),
            content,
            page,
            size: request.size(),
            total_elements,
            total_pages,
            first: page == 0,
            last: u64::from(page) + 1 >= total_pages,
        }
    }
}
