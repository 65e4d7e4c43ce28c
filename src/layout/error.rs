//! Error types for the layout engine

use std::fmt;

use thiserror::Error;

use super::solver::SolverError;
use super::types::PersonId;

/// Optimization stage that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStage {
    RowAssignment,
    CoordinateAssignment,
}

impl fmt::Display for LayoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutStage::RowAssignment => write!(f, "row assignment"),
            LayoutStage::CoordinateAssignment => write!(f, "coordinate assignment"),
        }
    }
}

/// Which relation named the same person twice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfRelationKind {
    /// Listed as their own mate
    Mate,
    /// Listed as their own parent
    Parent,
    /// Both parents of a child are the same person
    CoParent,
}

impl fmt::Display for SelfRelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfRelationKind::Mate => write!(f, "mate"),
            SelfRelationKind::Parent => write!(f, "parent"),
            SelfRelationKind::CoParent => write!(f, "co-parent"),
        }
    }
}

/// Errors that can occur during layout computation
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A relation pairs a person with themselves
    #[error("self relation: '{person}' is listed as their own {kind}")]
    SelfRelation {
        person: PersonId,
        kind: SelfRelationKind,
    },

    /// An optimization stage found no feasible solution within its budget
    #[error("no feasible {stage}: {source}")]
    Infeasible {
        stage: LayoutStage,
        #[source]
        source: SolverError,
    },

    /// Internal consistency check failed
    #[error("layout invariant violated: {reason}")]
    InvariantViolation { reason: String },
}

impl LayoutError {
    pub fn self_relation(person: PersonId, kind: SelfRelationKind) -> Self {
        Self::SelfRelation { person, kind }
    }

    pub fn infeasible(stage: LayoutStage, source: SolverError) -> Self {
        Self::Infeasible { stage, source }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Stage that failed, for infeasibility errors
    pub fn stage(&self) -> Option<LayoutStage> {
        match self {
            Self::Infeasible { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_self_relation_display() {
        let err = LayoutError::self_relation(PersonId::from("A"), SelfRelationKind::Mate);
        insta::assert_snapshot!(err.to_string(), @"self relation: 'A' is listed as their own mate");
    }

    #[test]
    fn test_infeasible_names_stage() {
        let err = LayoutError::infeasible(
            LayoutStage::CoordinateAssignment,
            SolverError::Timeout {
                budget: Duration::from_secs(30),
            },
        );
        assert!(err.to_string().contains("coordinate assignment"));
        assert_eq!(err.stage(), Some(LayoutStage::CoordinateAssignment));
    }

    #[test]
    fn test_invariant_display() {
        let err = LayoutError::invariant("row 7 out of range");
        assert!(err.to_string().contains("row 7 out of range"));
        assert_eq!(err.stage(), None);
    }
}
