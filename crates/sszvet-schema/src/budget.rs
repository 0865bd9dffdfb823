//! Iteration ceiling shared by every frame of one recursive traversal.
//!
//! The budget is created by the public entry point and passed down as
//! `&mut`, so sibling branches draw from the same pool and two concurrent
//! calls never share state.

use sszvet_core::{SchemaError, Stage};

#[derive(Debug)]
pub(crate) struct IterationBudget {
    stage: Stage,
    used: usize,
    limit: usize,
}

impl IterationBudget {
    pub(crate) fn new(stage: Stage, limit: usize) -> Self {
        Self {
            stage,
            used: 0,
            limit,
        }
    }

    /// Account for one node visit inside `definition`.
    pub(crate) fn tick(&mut self, definition: &str) -> Result<(), SchemaError> {
        if self.used >= self.limit {
            return Err(SchemaError::RecursionLimitExceeded {
                stage: self.stage,
                definition: definition.to_string(),
                limit: self.limit,
            });
        }
        self.used += 1;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn used(&self) -> usize {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sszvet_core::ErrorKind;

    #[test]
    fn exhausts_after_limit_ticks() {
        let mut budget = IterationBudget::new(Stage::SizeClassification, 3);
        for _ in 0..3 {
            budget.tick("T").unwrap();
        }
        assert_eq!(budget.used(), 3);
        let err = budget.tick("T").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursionLimitExceeded);
        assert!(err.to_string().contains("size classification of type 'T'"));
    }
}
