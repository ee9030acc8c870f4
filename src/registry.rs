//! Transport status → domain status mapping.

use std::collections::HashMap;

use crate::status::DomainStatus;

/// Read-only table from HTTP status codes to [`DomainStatus`].
///
/// Seeded once when the [`App`](crate::App) is built and never mutated, so
/// concurrent requests read it without locking.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    map: HashMap<u16, DomainStatus>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        let map = HashMap::from([
            (400, DomainStatus::BadRequestParameters),
            (401, DomainStatus::Forbidden),
            (403, DomainStatus::Forbidden),
            (404, DomainStatus::NotFound),
            (405, DomainStatus::MethodNotAllowed),
            (413, DomainStatus::UploadLimitExceeded),
            (415, DomainStatus::MediaTypeNotAllowed),
        ]);
        Self { map }
    }

    /// Exact mapping for `code`, if one exists.
    pub fn lookup(&self, code: u16) -> Option<DomainStatus> {
        self.map.get(&code).copied()
    }

    /// Mapping for `code`, falling back to [`DomainStatus::StatusCodeException`].
    pub fn resolve(&self, code: u16) -> DomainStatus {
        self.lookup(code).unwrap_or(DomainStatus::StatusCodeException)
    }
}

impl Default for StatusRegistry {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_codes() {
        let registry = StatusRegistry::new();
        assert_eq!(registry.resolve(400), DomainStatus::BadRequestParameters);
        assert_eq!(registry.resolve(401), DomainStatus::Forbidden);
        assert_eq!(registry.resolve(403), DomainStatus::Forbidden);
        assert_eq!(registry.resolve(404), DomainStatus::NotFound);
        assert_eq!(registry.resolve(405), DomainStatus::MethodNotAllowed);
        assert_eq!(registry.resolve(413), DomainStatus::UploadLimitExceeded);
        assert_eq!(registry.resolve(415), DomainStatus::MediaTypeNotAllowed);
    }

    #[test]
    fn unmapped_codes_fall_back() {
        let registry = StatusRegistry::new();
        assert_eq!(registry.lookup(500), None);
        assert_eq!(registry.resolve(500), DomainStatus::StatusCodeException);
        assert_eq!(registry.resolve(302), DomainStatus::StatusCodeException);
    }
}
