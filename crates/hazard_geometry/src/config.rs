use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Tuning for [`crate::algorithms::PolygonReducer`] and
/// [`crate::algorithms::simplify_to_count`].
///
/// `smooth_cutoff_ratio` and `kink_length_factor` are empirical values. They
/// are pinned, not derived.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ReductionConfig {
    /// Vertex budget for a reduced ring (closing vertex not counted).
    #[schemars(range(min = 3))]
    pub max_vertices: usize,
    /// Once three points are kept, selection stops when
    /// `max_deviation * smooth_cutoff_ratio < extent`.
    pub smooth_cutoff_ratio: f64,
    /// Smallest area bound a kink may be compared against.
    pub kink_min_area: f64,
    /// Kink area bound per unit of the removed span's length.
    pub kink_length_factor: f64,
    /// Spacing of the grid that repaired vertices snap to.
    pub repair_grid: f64,
    /// Decimal places kept when rounding a repaired ring.
    pub round_decimals: u32,
    /// Consecutive edges whose slopes differ by less than this are merged.
    pub collinear_slope_epsilon: f64,
    /// Upper bound on alternating reduce / kink-removal rounds and on repair
    /// sweeps.
    pub max_passes: usize,
    /// Upper bound on hole-filling rounds in the generic simplifier.
    pub hole_fill_passes: usize,
    /// Outward buffer applied to each hole before it is unioned back in.
    pub hole_buffer_distance: f64,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            max_vertices: 20,
            smooth_cutoff_ratio: 40.0,
            kink_min_area: 1.0,
            kink_length_factor: 0.64,
            repair_grid: 0.01,
            round_decimals: 2,
            collinear_slope_epsilon: 1e-4,
            max_passes: 10,
            hole_fill_passes: 3,
            hole_buffer_distance: 0.001,
        }
    }
}

impl ReductionConfig {
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }

    /// Reject budgets and tolerances the reducer cannot work with.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.max_vertices < 3 {
            return Err(GeometryError::invalid(format!(
                "max_vertices must be at least 3, got {}",
                self.max_vertices
            )));
        }
        let positive = [
            ("smooth_cutoff_ratio", self.smooth_cutoff_ratio),
            ("kink_length_factor", self.kink_length_factor),
            ("repair_grid", self.repair_grid),
            ("collinear_slope_epsilon", self.collinear_slope_epsilon),
            ("hole_buffer_distance", self.hole_buffer_distance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeometryError::invalid(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !self.kink_min_area.is_finite() || self.kink_min_area < 0.0 {
            return Err(GeometryError::invalid("kink_min_area must be non-negative"));
        }
        if self.max_passes == 0 {
            return Err(GeometryError::invalid("max_passes must be at least 1"));
        }
        Ok(())
    }

    pub fn from_json(content: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Smallest flattening limit honoured; a closed curve needs at least 4 segments.
pub const MIN_FLATTENING_LIMIT: u32 = 2;
/// Largest flattening limit honoured.
pub const MAX_FLATTENING_LIMIT: u32 = 20;

/// Flatness tolerance and recursion limit used when curves are turned into
/// straight segments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FlatteningParams {
    /// Largest allowed deviation of a segment from the true curve, in the
    /// shape's own linear unit.
    pub flatness: f64,
    /// Maximum doublings of the segment count; at most `2^limit` segments.
    #[schemars(range(min = 2, max = 20))]
    pub limit: u32,
}

impl Default for FlatteningParams {
    fn default() -> Self {
        Self { flatness: 0.1, limit: 8 }
    }
}

impl FlatteningParams {
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.flatness.is_finite() || self.flatness <= 0.0 {
            return Err(GeometryError::invalid(format!(
                "flatness must be positive and finite, got {}",
                self.flatness
            )));
        }
        if !(MIN_FLATTENING_LIMIT..=MAX_FLATTENING_LIMIT).contains(&self.limit) {
            return Err(GeometryError::invalid(format!(
                "limit must be between {MIN_FLATTENING_LIMIT} and {MAX_FLATTENING_LIMIT}, got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empirical_constants_are_pinned() {
        let config = ReductionConfig::default();
        assert_eq!(config.smooth_cutoff_ratio, 40.0);
        assert_eq!(config.kink_length_factor, 0.64);
        assert_eq!(config.kink_min_area, 1.0);
        assert_eq!(config.max_vertices, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ReductionConfig::from_json(r#"{ "max_vertices": 12 }"#)
            .expect("Should parse partial config");
        assert_eq!(config.max_vertices, 12);
        assert_eq!(config.repair_grid, 0.01);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ReductionConfig::default().with_max_vertices(2).validate().is_err());

        let config = ReductionConfig { repair_grid: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(GeometryError::InvalidInput(_))));

        let config = ReductionConfig { smooth_cutoff_ratio: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());

        assert!(ReductionConfig::from_json(r#"{ "max_passes": 0 }"#).is_err());
    }

    #[test]
    fn test_flattening_limit_below_four_segments_is_rejected() {
        assert!(FlatteningParams::default().validate().is_ok());
        for limit in [0, 1, 21] {
            let params = FlatteningParams { limit, ..Default::default() };
            assert!(matches!(params.validate(), Err(GeometryError::InvalidInput(_))), "limit {limit}");
        }
        let params = FlatteningParams { flatness: 0.0, ..Default::default() };
        assert!(params.validate().is_err());
    }
}
