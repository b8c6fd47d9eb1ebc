use std::collections::TryReserveError;

/// Allocates a `Vec` with the given capacity, surfacing allocation failure
/// as an error instead of aborting the process.
pub fn try_with_capacity<T>(capacity: usize) -> Result<Vec<T>, TryReserveError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(capacity)?;
    Ok(vec)
}
