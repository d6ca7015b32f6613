use thiserror::Error;
use uuid::Uuid;

use crate::models::EntityKind;

#[derive(Debug, Error)]
pub enum CostingError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{kind} {id} cannot contain itself")]
    SelfReference { kind: EntityKind, id: Uuid },

    #[error("Invalid catalog snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Database(String),
}

impl CostingError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        CostingError::NotFound { kind, id }
    }

    /// Short label used for metrics and logs
    pub fn code(&self) -> &'static str {
        match self {
            CostingError::NotFound { .. } => "not_found",
            CostingError::Validation(_) => "validation",
            CostingError::SelfReference { .. } => "self_reference",
            CostingError::Snapshot(_) => "snapshot",
            CostingError::Database(_) => "database",
        }
    }
}

pub type CostingResult<T> = Result<T, CostingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_the_kind() {
        let id = Uuid::nil();
        let err = CostingError::not_found(EntityKind::SubRecipe, id);
        assert_eq!(err.to_string(), format!("sub_recipe not found: {id}"));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_snapshot_error_converts() {
        let err: CostingError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, CostingError::Snapshot(_)));
    }
}
