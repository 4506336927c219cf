use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The lifecycle state of a single enrollment.
///
/// Stored and serialized upper-case. Parsing is exact: `"active"` is not a
/// valid status, `"ACTIVE"` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Withdrawn,
    Failed,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 4] = [
        EnrollmentStatus::Active,
        EnrollmentStatus::Completed,
        EnrollmentStatus::Withdrawn,
        EnrollmentStatus::Failed,
    ];

    /// The textual form used in the `enrollments.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "ACTIVE",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Withdrawn => "WITHDRAWN",
            EnrollmentStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnrollmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::invalid(
                    "status",
                    format!("'{s}' is not one of ACTIVE, COMPLETED, WITHDRAWN, FAILED"),
                )
            })
    }
}

/// Discriminator of the concrete subtype behind a `persons` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonKind {
    Student,
    Professor,
}

impl PersonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonKind::Student => "STUDENT",
            PersonKind::Professor => "PROFESSOR",
        }
    }
}

impl fmt::Display for PersonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(PersonKind::Student),
            "PROFESSOR" => Ok(PersonKind::Professor),
            other => Err(CoreError::invalid("person_type", format!("unknown discriminator '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Only an exact, case-insensitive `"desc"` selects descending order.
    /// Every other input, including garbage, falls back to ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_exact() {
        assert_eq!("ACTIVE".parse::<EnrollmentStatus>(), Ok(EnrollmentStatus::Active));
        assert_eq!("WITHDRAWN".parse::<EnrollmentStatus>(), Ok(EnrollmentStatus::Withdrawn));
        assert!("active".parse::<EnrollmentStatus>().is_err());
        assert!("ACTIVA".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&EnrollmentStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        for status in EnrollmentStatus::ALL {
            assert_eq!(status.to_string().parse::<EnrollmentStatus>(), Ok(status));
        }
    }

    #[test]
    fn only_desc_selects_descending() {
        assert_eq!(SortDirection::parse("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("DeSc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("descending"), SortDirection::Asc);
        assert_eq!(SortDirection::parse(" desc"), SortDirection::Asc);
        assert_eq!(SortDirection::parse(""), SortDirection::Asc);
    }

    #[test]
    fn person_kind_round_trips_through_discriminator() {
        assert_eq!("STUDENT".parse::<PersonKind>(), Ok(PersonKind::Student));
        assert_eq!(PersonKind::Professor.as_str(), "PROFESSOR");
        assert!("Alumno".parse::<PersonKind>().is_err());
    }
}
