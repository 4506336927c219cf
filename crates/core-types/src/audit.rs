use crate::structs::AuditInfo;
use chrono::{DateTime, SubsecRound, Utc};

/// Stamps audit metadata on every write.
///
/// Stores receive one `Auditor` at construction and call [`Auditor::stamp`] on
/// each insert, so callers never fill audit fields themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auditor {
    actor: String,
}

impl Auditor {
    pub fn new(actor: impl Into<String>) -> Self {
        Self { actor: actor.into() }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Audit metadata for a row inserted now, at the microsecond precision
    /// of a `TIMESTAMPTZ` column.
    pub fn stamp(&self) -> AuditInfo {
        self.stamp_at(Utc::now().trunc_subsecs(6))
    }

    /// Audit metadata for a row inserted at `at`. A fresh row has identical
    /// creation and modification fields.
    pub fn stamp_at(&self, at: DateTime<Utc>) -> AuditInfo {
        AuditInfo {
            created_by: self.actor.clone(),
            created_at: at,
            updated_by: self.actor.clone(),
            updated_at: at,
        }
    }
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new("system")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamp_fills_creation_and_modification_alike() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let info = Auditor::new("registrar").stamp_at(at);
        assert_eq!(info.created_by, "registrar");
        assert_eq!(info.updated_by, "registrar");
        assert_eq!(info.created_at, at);
        assert_eq!(info.updated_at, at);
    }

    #[test]
    fn default_actor_is_system() {
        assert_eq!(Auditor::default().actor(), "system");
        let info = Auditor::default().stamp();
        assert_eq!(info.created_at, info.updated_at);
    }

    #[test]
    fn stamps_keep_whole_microseconds() {
        let info = Auditor::default().stamp();
        assert_eq!(info.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }
}
