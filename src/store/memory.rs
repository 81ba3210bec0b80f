use std::collections::BTreeMap;

use crate::codes::{CodeSummary, ProcedureCode};
use crate::error::StoreError;
use crate::store::{CodeRepository, SearchQuery};

/// Lower-cases one character at a time, keeping only the first char of each mapping.
///
/// Matches DuckDB's `lower()`: no word-final sigma (Σ is always σ) and İ folds to a
/// bare `i`.
fn fold_case(s: &str) -> String {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Immutable record set keyed by code. Needs no locking once built.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCodeRepository {
    codes: BTreeMap<String, ProcedureCode>,
}

impl InMemoryCodeRepository {
    pub fn new(records: Vec<ProcedureCode>) -> Result<Self, StoreError> {
        let mut codes = BTreeMap::new();
        for record in records {
            record.validate()?;
            let key = record.code().to_string();
            if codes.contains_key(&key) {
                return Err(StoreError::DuplicateCode(key));
            }
            codes.insert(key, record);
        }
        Ok(Self { codes })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl CodeRepository for InMemoryCodeRepository {
    fn list(&self) -> Result<Vec<CodeSummary>, StoreError> {
        Ok(self.codes.values().map(ProcedureCode::summary).collect())
    }

    fn get_by_code(&self, code: &str) -> Result<Option<ProcedureCode>, StoreError> {
        Ok(self.codes.get(code).cloned())
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<CodeSummary>, StoreError> {
        let needle = fold_case(query.as_str());
        Ok(self
            .codes
            .values()
            .filter(|rec| {
                fold_case(rec.code()).contains(&needle)
                    || fold_case(rec.description()).contains(&needle)
            })
            .map(ProcedureCode::summary)
            .collect())
    }
}
