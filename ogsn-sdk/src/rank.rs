//! Rating to kyu/dan label conversion.

const RATING_BASE: f64 = 525.0;
const RANK_SCALE: f64 = 23.15;
/// Ranks below this are kyu, at or above are dan.
const DAN_THRESHOLD: i64 = 30;
const MAX_DAN_RANK: i64 = 38;

/// Continuous rank for a rating, where 0 is 30k and 30 is 1d.
pub fn rating_to_rank(rating: f64) -> f64 {
    if !rating.is_finite() || rating <= 0.0 {
        return 0.0;
    }
    (rating / RATING_BASE).ln() * RANK_SCALE
}

/// Human readable rank such as `"3k"` or `"2d"`, clamped to 30k..9d.
pub fn rank_label(rating: f64) -> String {
    let rank = (rating_to_rank(rating).floor() as i64).clamp(0, MAX_DAN_RANK);
    if rank < DAN_THRESHOLD {
        format!("{}k", DAN_THRESHOLD - rank)
    } else {
        format!("{}d", rank - DAN_THRESHOLD + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_labels() {
        assert_eq!(rank_label(1000.0), "16k");
        assert_eq!(rank_label(1900.0), "1k");
        assert_eq!(rank_label(2100.0), "3d");
        assert_eq!(rank_label(2700.0), "8d");
    }

    #[test]
    fn test_rank_label_clamps() {
        assert_eq!(rank_label(100.0), "30k");
        assert_eq!(rank_label(0.0), "30k");
        assert_eq!(rank_label(-5.0), "30k");
        assert_eq!(rank_label(f64::NAN), "30k");
        assert_eq!(rank_label(5000.0), "9d");
    }
}
