//! Output normalization

use crate::model::{NormalizedOutputMap, StackDescriptionList};

/// Flatten a `describe-stacks` response into a key → value map
///
/// Only the last stack is considered; the fetch is expected to return a
/// single stack. Later duplicates of an output key win.
pub fn normalize(raw: &StackDescriptionList) -> NormalizedOutputMap {
    let mut outputs = NormalizedOutputMap::new();

    let Some(stack) = raw.stacks.last() else {
        tracing::debug!("No stacks in response, outputs are empty");
        return outputs;
    };

    for pair in &stack.outputs {
        outputs.insert(pair.output_key.clone(), pair.output_value.clone());
    }

    tracing::debug!(count = outputs.len(), "Normalized stack outputs");
    outputs
}
