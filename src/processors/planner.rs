// tierthumb/src/processors/planner.rs
use crate::core::Tier;

/// Maps the longest side of an image to the integer factor it is subsampled
/// by during decode. Brackets are inclusive at their upper bound.
pub fn plan(max_dimension: u32, tier: Tier) -> u32 {
    let base = if max_dimension > 3000 {
        6
    } else if max_dimension > 2000 {
        5
    } else if max_dimension > 1500 {
        4
    } else if max_dimension > 1000 {
        3
    } else if max_dimension > 400 {
        2
    } else {
        1
    };

    base * tier.multiplier()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_boundaries_big() {
        let cases = [
            (1, 1),
            (400, 1),
            (401, 2),
            (1000, 2),
            (1001, 3),
            (1500, 3),
            (1501, 4),
            (2000, 4),
            (2001, 5),
            (3000, 5),
            (3001, 6),
            (12_000, 6),
        ];

        for (dimension, expected) in cases {
            assert_eq!(plan(dimension, Tier::Big), expected, "max dimension {}", dimension);
        }
    }

    #[test]
    fn bracket_boundaries_small() {
        let cases = [
            (200, 2),
            (400, 2),
            (401, 4),
            (1000, 4),
            (1001, 6),
            (1500, 6),
            (1501, 8),
            (2000, 8),
            (2001, 10),
            (3000, 10),
            (3001, 12),
        ];

        for (dimension, expected) in cases {
            assert_eq!(plan(dimension, Tier::Small), expected, "max dimension {}", dimension);
        }
    }

    #[test]
    fn small_is_always_twice_big() {
        for dimension in (0..5000).step_by(37) {
            assert_eq!(plan(dimension, Tier::Small), 2 * plan(dimension, Tier::Big));
        }
    }
}
