//! Per-edge cardinality caps.

use fhirmap_model::Cap;

/// Returns the prefix of `items` allowed by `cap`, in source order.
pub fn limit<T>(items: &[T], cap: Cap) -> &[T] {
    &items[..cap.allowance(items.len())]
}
