use crate::evaluator::{Context, EvalError, Evaluator};
use crate::parser::{Region, RegionKind, TranslationUnit};
use thiserror::Error;

const EXTRA_BUFFER_PREDICTION: usize = 64;

/// An embedded region the evaluator could not turn into text.
#[derive(Debug, Error)]
#[error("{} region at {}: {source}", .region.kind, .region.start)]
pub struct TranslationError {
    pub region: Region,
    #[source]
    pub source: EvalError,
}

/// Produce the host-language output for `unit`.
///
/// Host regions are copied as-is. Embedded regions are evaluated one at a time
/// in source order and their output is spliced in where they stood. The first
/// evaluator failure stops translation.
pub fn translate_unit<E>(
    ctx: &Context,
    unit: &TranslationUnit,
    evaluator: &E,
) -> Result<Vec<u8>, TranslationError>
where
    E: Evaluator + ?Sized,
{
    let mut out = Vec::with_capacity(unit.data.len() + EXTRA_BUFFER_PREDICTION);

    for region in &unit.regions {
        match region.kind {
            RegionKind::Host => out.extend_from_slice(&region.data),
            RegionKind::Statement | RegionKind::Block => {
                let translated = evaluator
                    .eval(ctx, region.kind, &region.data)
                    .map_err(|source| TranslationError {
                        region: region.clone(),
                        source,
                    })?;
                out.extend_from_slice(&translated);
            }
        }
    }

    Ok(out)
}
