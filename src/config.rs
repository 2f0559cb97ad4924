// Projection configuration: tunable engine parameters with the Capuchin
// defaults, weight-list parsing, and normalization.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Defaults (the final Capuchin surface)
// ---------------------------------------------------------------------------

pub const DEFAULT_WEIGHTS: [f64; 3] = [5.0, 4.0, 3.0];
pub const DEFAULT_REGRESS: f64 = 1200.0;
pub const DEFAULT_PA_BASE: f64 = 200.0;
pub const DEFAULT_PA_WEIGHTS: [f64; 2] = [0.5, 0.1];
pub const DEFAULT_PEAK_AGE: u8 = 29;
pub const DEFAULT_AGE_ADJUSTMENT: (f64, f64) = (0.003, 0.006);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot parse `{value}` as a comma-separated number list for {field}")]
    BadNumberList { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    EmptyWeights { field: &'static str },

    #[error("{field} must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("{field} weights sum to zero; nothing to normalize")]
    ZeroWeightSum { field: &'static str },
}

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Boolean toggles from the historical CLI surface. Accepted and carried,
/// but the working batting path does not consult them.
#[derive(Debug, Clone, Copy)]
pub struct UseFlags {
    pub regression: bool,
    pub weighting: bool,
    pub age: bool,
}

impl Default for UseFlags {
    fn default() -> Self {
        UseFlags {
            regression: true,
            weighting: true,
            age: true,
        }
    }
}

/// Batting engine parameters. `weights` is stored normalized (sums to 1);
/// `pa_weights` is used raw, exactly as supplied.
#[derive(Debug, Clone)]
pub struct BattingParams {
    pub weights: Vec<f64>,
    pub regress: f64,
    pub pa_base: f64,
    pub pa_weights: Vec<f64>,
}

impl BattingParams {
    pub fn new(
        weights: Vec<f64>,
        regress: f64,
        pa_base: f64,
        pa_weights: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        non_negative("regress", regress)?;
        non_negative("pa_base", pa_base)?;
        for w in &pa_weights {
            non_negative("pa_weights", *w)?;
        }
        Ok(BattingParams {
            weights: normalize_weights("weights", weights)?,
            regress,
            pa_base,
            pa_weights,
        })
    }
}

impl Default for BattingParams {
    fn default() -> Self {
        BattingParams {
            weights: normalize_weights("weights", DEFAULT_WEIGHTS.to_vec())
                .unwrap_or_else(|_| unreachable!("default weights are valid")),
            regress: DEFAULT_REGRESS,
            pa_base: DEFAULT_PA_BASE,
            pa_weights: DEFAULT_PA_WEIGHTS.to_vec(),
        }
    }
}

/// Pitching engine parameters. Carried for the (unimplemented) pitching
/// path; the defaults mirror the batting side pending a real numeric policy.
#[derive(Debug, Clone)]
pub struct PitchingParams {
    pub weights: Vec<f64>,
    pub regress: f64,
    pub starter_base: f64,
    pub reliever_base: f64,
    pub ip_weights: Vec<f64>,
}

impl PitchingParams {
    pub fn new(
        weights: Vec<f64>,
        regress: f64,
        starter_base: f64,
        reliever_base: f64,
        ip_weights: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        non_negative("pitcher_regress", regress)?;
        non_negative("starter_base", starter_base)?;
        non_negative("reliever_base", reliever_base)?;
        for w in &ip_weights {
            non_negative("ip_weights", *w)?;
        }
        Ok(PitchingParams {
            weights: normalize_weights("pitcher_weights", weights)?,
            regress,
            starter_base,
            reliever_base,
            ip_weights,
        })
    }
}

impl Default for PitchingParams {
    fn default() -> Self {
        PitchingParams {
            weights: normalize_weights("pitcher_weights", DEFAULT_WEIGHTS.to_vec())
                .unwrap_or_else(|_| unreachable!("default weights are valid")),
            regress: DEFAULT_REGRESS,
            starter_base: DEFAULT_PA_BASE,
            reliever_base: DEFAULT_PA_BASE,
            ip_weights: DEFAULT_PA_WEIGHTS.to_vec(),
        }
    }
}

/// Everything the projection engine can be tuned with. Constructed once at
/// startup (from the CLI) and read-only thereafter.
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Season to forecast.
    pub year: u16,
    pub batting: BattingParams,
    pub pitching: PitchingParams,
    /// Reserved for the age adjustment; carried, not applied.
    pub peak_age: u8,
    /// Reserved: (decline rate past peak, growth rate before peak).
    pub age_adjustment: (f64, f64),
    pub use_flags: UseFlags,
}

impl ProjectionConfig {
    pub fn for_year(year: u16) -> Self {
        ProjectionConfig {
            year,
            batting: BattingParams::default(),
            pitching: PitchingParams::default(),
            peak_age: DEFAULT_PEAK_AGE,
            age_adjustment: DEFAULT_AGE_ADJUSTMENT,
            use_flags: UseFlags::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Weight helpers
// ---------------------------------------------------------------------------

/// Parse a comma-separated list like "5,4,3" into numbers.
pub fn parse_number_list(field: &'static str, value: &str) -> Result<Vec<f64>, ConfigError> {
    value
        .split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| ConfigError::BadNumberList {
                field,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Normalize season weights so they sum to 1 while preserving ratios.
/// Tests compare against an absolute tolerance of 1e-9.
pub fn normalize_weights(field: &'static str, weights: Vec<f64>) -> Result<Vec<f64>, ConfigError> {
    if weights.is_empty() {
        return Err(ConfigError::EmptyWeights { field });
    }
    for w in &weights {
        non_negative(field, *w)?;
    }
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return Err(ConfigError::ZeroWeightSum { field });
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ConfigError::NegativeValue { field, value });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn weights_normalize_to_unit_sum_preserving_ratios() {
        let normalized = normalize_weights("weights", vec![5.0, 4.0, 3.0]).unwrap();
        let sum: f64 = normalized.iter().sum();
        assert!((sum - 1.0).abs() < TOL);
        // 5:4:3 ratios survive normalization.
        assert!((normalized[0] / normalized[1] - 5.0 / 4.0).abs() < TOL);
        assert!((normalized[1] / normalized[2] - 4.0 / 3.0).abs() < TOL);
    }

    #[test]
    fn empty_weights_rejected() {
        let err = normalize_weights("weights", vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyWeights { .. }));
    }

    #[test]
    fn negative_weight_rejected() {
        let err = normalize_weights("weights", vec![5.0, -4.0]).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeValue { .. }));
    }

    #[test]
    fn zero_sum_weights_rejected() {
        let err = normalize_weights("weights", vec![0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroWeightSum { .. }));
    }

    #[test]
    fn number_list_parses() {
        assert_eq!(
            parse_number_list("pa_weights", "0.5, 0.1").unwrap(),
            vec![0.5, 0.1]
        );
    }

    #[test]
    fn bad_number_list_rejected() {
        let err = parse_number_list("weights", "5,four,3").unwrap_err();
        assert!(matches!(err, ConfigError::BadNumberList { .. }));
    }

    #[test]
    fn pa_weights_stay_raw() {
        let params = BattingParams::new(vec![2.0, 1.0], 0.0, 0.0, vec![0.5, 0.1]).unwrap();
        // Season weights normalize, playing-time weights do not.
        assert!((params.weights[0] - 2.0 / 3.0).abs() < TOL);
        assert_eq!(params.pa_weights, vec![0.5, 0.1]);
    }

    #[test]
    fn defaults_match_capuchin() {
        let config = ProjectionConfig::for_year(2015);
        assert_eq!(config.batting.regress, 1200.0);
        assert_eq!(config.batting.pa_base, 200.0);
        assert_eq!(config.batting.pa_weights, vec![0.5, 0.1]);
        assert_eq!(config.peak_age, 29);
        assert!(config.use_flags.regression && config.use_flags.weighting && config.use_flags.age);
    }
}
