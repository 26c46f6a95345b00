/// Scale applied to wire coordinates (micro-degrees).
pub const FIXED_POINT_SCALE: f64 = 1_000_000.0;

pub struct GeoHelper;

impl GeoHelper {
    pub fn from_fixed(value: i32) -> f64 {
        value as f64 / FIXED_POINT_SCALE
    }

    pub fn to_fixed(degrees: f64) -> i32 {
        (degrees * FIXED_POINT_SCALE).round() as i32
    }

    /// L1 distance in degree space.
    pub fn manhattan(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
        (lat_a - lat_b).abs() + (lng_a - lng_b).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_decodes_micro_degrees() {
        assert_eq!(GeoHelper::from_fixed(37_500_000), 37.5);
        assert_eq!(GeoHelper::from_fixed(-122_000_000), -122.0);
        assert_eq!(GeoHelper::to_fixed(-122.000001), -122_000_001);
    }

    #[test]
    fn manhattan_sums_both_axes() {
        let delta = GeoHelper::manhattan(1.0, 2.0, 1.5, 1.0);
        assert!((delta - 1.5).abs() < 1e-12);
        assert_eq!(GeoHelper::manhattan(3.0, 4.0, 3.0, 4.0), 0.0);
    }
}
