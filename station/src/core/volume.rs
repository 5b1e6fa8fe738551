//! Volume splitting and plate-position helpers

use shared::Microliters;

/// Split `volume` into the fewest sub-volumes of at most `max_capacity`.
///
/// All pieces but the last are `ceil(volume / n)`; the last absorbs the
/// remainder so the pieces sum to `volume`. When whole-microliter rounding
/// cannot satisfy the capacity (fractional capacities), the volume is split
/// evenly instead.
pub fn divide_volume(volume: Microliters, max_capacity: Microliters) -> Vec<Microliters> {
    if volume <= 0.0 || max_capacity <= 0.0 {
        return Vec::new();
    }

    let n = (volume / max_capacity).ceil() as usize;
    if n <= 1 {
        return vec![volume];
    }

    let rounded = (volume / n as f64).ceil();
    let share = if rounded <= max_capacity && rounded * ((n - 1) as f64) < volume {
        rounded
    } else {
        volume / n as f64
    };

    let mut pieces = vec![share; n - 1];
    pieces.push(volume - share * (n - 1) as f64);
    pieces
}

/// Group destinations into consecutive chunks of `size`
pub fn divide_destinations<T: Clone>(destinations: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    destinations.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

/// Side of the well the magnet pulls the bead pellet towards, per column.
/// Returns -1 (left) for even columns and +1 (right) for odd ones.
pub fn magnet_side(column: u32) -> f64 {
    if column % 2 == 0 {
        -1.0
    } else {
        1.0
    }
}
