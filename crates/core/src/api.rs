//! The finished, immutable API aggregate.

use serde::Serialize;
use std::fmt;

use crate::model::{compare_version_numbers, Object, Procedure, ResponseCode, Version};

/// All objects, response codes and versions of one HL-API specification.
///
/// Objects keep the order the linker created them in (ascending layer,
/// then object name). Versions are sorted newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Api {
    objects: Vec<Object>,
    response_codes: Vec<ResponseCode>,
    versions: Vec<Version>,
}

impl Api {
    pub fn new(
        objects: Vec<Object>,
        response_codes: Vec<ResponseCode>,
        mut versions: Vec<Version>,
    ) -> Self {
        versions.sort_by(|a, b| compare_version_numbers(&b.number, &a.number));
        Api {
            objects,
            response_codes,
            versions,
        }
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn response_codes(&self) -> &[ResponseCode] {
        &self.response_codes
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Number of the newest version, if any version is recorded.
    pub fn current_version(&self) -> Option<&str> {
        self.versions.first().map(|v| v.number.as_str())
    }

    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn find_procedure(&self, object: &str, procedure: &str) -> Option<&Procedure> {
        self.object(object)?.procedure(procedure)
    }

    /// Number of top-level fields over all procedures.
    pub fn field_count(&self) -> usize {
        self.objects
            .iter()
            .flat_map(|o| o.procedures.iter())
            .map(|p| p.fields.len())
            .sum()
    }

    pub fn procedure_count(&self) -> usize {
        self.objects.iter().map(|o| o.procedures.len()).sum()
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} ({} objects)",
            self.current_version().unwrap_or("-"),
            self.objects.len()
        )
    }
}
