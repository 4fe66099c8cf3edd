//! Brick type inference.

use brickyard_protocols::{Brick, BrickType, RegistryId, TypeInferenceError};

/// A brick paired with its inferred type.
#[derive(Debug, Clone)]
pub struct TypedBrickPair {
    pub brick: Brick,
    pub brick_type: BrickType,
}

/// Infer the type of a brick.
///
/// Native bricks report their own kind. A composite brick takes the type of
/// the last stage of its pipeline, resolved through `lookup` recursively.
pub fn infer_type<F>(brick: &Brick, lookup: F) -> Result<BrickType, TypeInferenceError>
where
    F: Fn(&RegistryId) -> Option<Brick>,
{
    let mut path = Vec::new();
    infer_inner(brick, &lookup, &mut path)
}

fn infer_inner<F>(
    brick: &Brick,
    lookup: &F,
    path: &mut Vec<RegistryId>,
) -> Result<BrickType, TypeInferenceError>
where
    F: Fn(&RegistryId) -> Option<Brick>,
{
    if let Some(brick_type) = brick.native_type() {
        return Ok(brick_type);
    }
    let Some(composite) = brick.as_composite() else {
        return Err(TypeInferenceError::UnknownBrick(brick.id().clone()));
    };

    let id = composite.id().clone();
    if let Some(start) = path.iter().position(|visited| *visited == id) {
        let mut cycle = path[start..].to_vec();
        cycle.push(id);
        return Err(TypeInferenceError::Cycle(cycle));
    }

    let last = composite
        .pipeline()
        .last()
        .ok_or_else(|| TypeInferenceError::EmptyPipeline(id.clone()))?;
    let inner = lookup(&last.id).ok_or_else(|| TypeInferenceError::UnknownBrick(last.id.clone()))?;

    path.push(id);
    let result = infer_inner(&inner, lookup, path);
    path.pop();
    result
}
