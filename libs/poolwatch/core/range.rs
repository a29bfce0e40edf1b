//! Target-range computation around an active bin.

use crate::core::types::BinRange;

/// Compute the bin range a position should cover: the active bin plus
/// `half_width` bins on each side.
///
/// Pure and total. Saturates at the i32 edges, so `min <= max` holds
/// even for degenerate bin ids.
pub fn compute_range(active_bin_id: i32, half_width: u16) -> BinRange {
    let w = half_width as i32;
    BinRange {
        min_bin_id: active_bin_id.saturating_sub(w),
        max_bin_id: active_bin_id.saturating_add(w),
    }
}
