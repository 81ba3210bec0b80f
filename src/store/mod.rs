pub mod database;
pub mod memory;

pub use database::DuckDbCodeRepository;
pub use memory::InMemoryCodeRepository;

use crate::codes::{CodeSummary, ProcedureCode};
use crate::error::{StoreError, ValidationError};

/// Read access to the procedure code records.
///
/// Implementations are read-only on the request path. `list` and `search` return
/// the summary projection; `get_by_code` is an exact, case-sensitive match on the
/// natural key and yields `None` for unknown codes.
pub trait CodeRepository: Send + Sync {
    fn list(&self) -> Result<Vec<CodeSummary>, StoreError>;

    fn get_by_code(&self, code: &str) -> Result<Option<ProcedureCode>, StoreError>;

    /// Case-insensitive literal substring match against `code` or `description`.
    fn search(&self, query: &SearchQuery) -> Result<Vec<CodeSummary>, StoreError>;
}

/// A trimmed, non-blank search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("Search query is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
