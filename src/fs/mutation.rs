//! Queued changes and their per-item results.

use serde_json::Value;

use crate::error::Result;

/// A single change to apply to a remote item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Add `parent_id` to the parents of `file_id`.
    AddParent { file_id: String, parent_id: String },
    /// Grant the owner role on `file_id` to `new_owner` and transfer ownership.
    TransferOwnership { file_id: String, new_owner: String },
}

impl Mutation {
    /// Id of the item the mutation applies to.
    pub fn target(&self) -> &str {
        match self {
            Mutation::AddParent { file_id, .. } => file_id,
            Mutation::TransferOwnership { file_id, .. } => file_id,
        }
    }
}

/// Result of one mutation after its batch was submitted.
#[derive(Debug)]
pub struct MutationOutcome {
    /// The submitted mutation
    pub mutation: Mutation,
    /// Provider response for this item, or its error
    pub result: Result<Value>,
}

impl MutationOutcome {
    /// Check if the item succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriveError;

    #[test]
    fn test_target() {
        let mv = Mutation::AddParent {
            file_id: "a".into(),
            parent_id: "p".into(),
        };
        let own = Mutation::TransferOwnership {
            file_id: "b".into(),
            new_owner: "x@example.com".into(),
        };
        assert_eq!(mv.target(), "a");
        assert_eq!(own.target(), "b");
    }

    #[test]
    fn test_outcome_success() {
        let mutation = Mutation::AddParent {
            file_id: "a".into(),
            parent_id: "p".into(),
        };
        let ok = MutationOutcome {
            mutation: mutation.clone(),
            result: Ok(Value::Null),
        };
        let failed = MutationOutcome {
            mutation,
            result: Err(DriveError::HttpError(500)),
        };
        assert!(ok.is_success());
        assert!(!failed.is_success());
    }
}
