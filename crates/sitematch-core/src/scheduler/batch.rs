//! Split the hostname list into fixed-size batches.

/// Consecutive batches of at most `size` items, in input order.
/// A zero size yields no batches.
pub fn partition<T>(items: &[T], size: usize) -> Vec<&[T]> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).collect()
}
