//! Brick type inference errors.

use thiserror::Error;

use crate::types::RegistryId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeInferenceError {
    #[error("Composite brick references itself: {}", format_cycle(.0))]
    Cycle(Vec<RegistryId>),

    #[error("Cannot infer type of unknown brick: {0}")]
    UnknownBrick(RegistryId),

    #[error("Composite brick {0} has an empty pipeline")]
    EmptyPipeline(RegistryId),
}

fn format_cycle(path: &[RegistryId]) -> String {
    path.iter()
        .map(RegistryId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let a = RegistryId::new("@test/a").unwrap();
        let b = RegistryId::new("@test/b").unwrap();
        let err = TypeInferenceError::Cycle(vec![a.clone(), b, a]);
        assert_eq!(
            err.to_string(),
            "Composite brick references itself: @test/a -> @test/b -> @test/a"
        );
    }

    #[test]
    fn test_unknown_brick_display() {
        let err = TypeInferenceError::UnknownBrick(RegistryId::new("@test/missing").unwrap());
        assert!(err.to_string().contains("@test/missing"));
    }
}
