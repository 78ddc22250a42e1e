//! Eight-way compass rotation algebra (component C1).
//!
//! A rotation is an integer in `0..8` where 0 is +Y and each increment turns
//! 45 degrees clockwise. Both functions here are total over that range and
//! have no side effects; callers are responsible for keeping `rotation < 8`
//! (checked with `debug_assert!`, matching the "programmer precondition"
//! failure class described in the crate's error-handling notes).

/// `(dx, dy)` offset for one step in `rotation`'s direction.
pub fn offset(rotation: u8) -> (i32, i32) {
    debug_assert!(rotation < 8, "rotation out of range: {rotation}");
    match rotation % 8 {
        0 => (0, 1),
        1 => (1, 1),
        2 => (1, 0),
        3 => (1, -1),
        4 => (0, -1),
        5 => (-1, -1),
        6 => (-1, 0),
        7 => (-1, 1),
        _ => unreachable!(),
    }
}

/// The rotation pointing the opposite way from `rotation`.
pub fn opposite_of(rotation: u8) -> u8 {
    debug_assert!(rotation < 8, "rotation out of range: {rotation}");
    (rotation + 4) % 8
}

/// Whether `r1` and `r2` point in opposite directions.
///
/// `direction` may be `-1` (no direction, i.e. SKIP/DIE/ATTACK-less
/// decisions never move) in which case this is always `false`.
pub fn opposite(direction: i32, r2: u8) -> bool {
    if direction < 0 {
        return false;
    }
    (direction - r2 as i32).unsigned_abs() == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_match_compass_table() {
        assert_eq!(offset(0), (0, 1));
        assert_eq!(offset(1), (1, 1));
        assert_eq!(offset(2), (1, 0));
        assert_eq!(offset(3), (1, -1));
        assert_eq!(offset(4), (0, -1));
        assert_eq!(offset(5), (-1, -1));
        assert_eq!(offset(6), (-1, 0));
        assert_eq!(offset(7), (-1, 1));
    }

    #[test]
    fn opposite_of_wraps_by_four() {
        for r in 0..8u8 {
            assert_eq!(opposite_of(r), (r + 4) % 8);
            assert_eq!(opposite_of(opposite_of(r)), r);
        }
    }

    #[test]
    fn opposite_direction_rejects_negative() {
        assert!(!opposite(-1, 3));
        assert!(opposite(3, 7));
        assert!(opposite(7, 3));
        assert!(!opposite(0, 1));
    }
}
