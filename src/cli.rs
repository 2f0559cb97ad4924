// Command-line parsing for the projection binary.
//
// Argument parsing stays separate from the engine: the flags here are
// collected into a read-only `ProjectionConfig` before any data is loaded.

use std::path::PathBuf;

use chrono::Datelike;
use clap::Parser;

use crate::config::{
    parse_number_list, BattingParams, ConfigError, PitchingParams, ProjectionConfig, UseFlags,
    DEFAULT_AGE_ADJUSTMENT, DEFAULT_PEAK_AGE,
};

/// Simple baseball projections.
#[derive(Debug, Parser)]
#[command(name = "capuchin", version, about = "Simple baseball projections")]
pub struct Cli {
    /// CSV file of batting input data.
    #[arg(long = "batter-in", value_name = "FILE")]
    pub batter_in: Option<PathBuf>,

    /// CSV file for the batting projection output (stdout when omitted).
    #[arg(long = "batter-out", value_name = "FILE")]
    pub batter_out: Option<PathBuf>,

    /// CSV file of pitching input data.
    #[arg(long = "pitcher-in", value_name = "FILE")]
    pub pitcher_in: Option<PathBuf>,

    /// CSV file for the pitching projection output (stdout when omitted).
    #[arg(long = "pitcher-out", value_name = "FILE")]
    pub pitcher_out: Option<PathBuf>,

    /// Year to generate projections for (default: the current year).
    #[arg(short = 'y', long = "year", value_name = "YEAR")]
    pub year: Option<u16>,

    /// Peak age.
    #[arg(short = 'a', long = "aging", value_name = "AGE")]
    pub peak_age: Option<u8>,

    /// Age adjustment rates as "decline,growth".
    #[arg(long = "age-adjustment", value_name = "RATES")]
    pub age_adjustment: Option<String>,

    /// Weights for batters' previous seasons, e.g. "5,4,3".
    #[arg(long = "batter-weights", value_name = "LIST")]
    pub batter_weights: Option<String>,

    /// Number of league-average PAs to regress batters by.
    #[arg(long = "batter-regress", value_name = "PAs")]
    pub batter_regress: Option<f64>,

    /// Weights for projecting PAs, e.g. "0.5,0.1".
    #[arg(long = "pa-weights", value_name = "LIST")]
    pub pa_weights: Option<String>,

    /// Base PA projection.
    #[arg(long = "pa-base", value_name = "PA")]
    pub pa_base: Option<f64>,

    /// Weights for pitchers' previous seasons.
    #[arg(long = "pitcher-weights", value_name = "LIST")]
    pub pitcher_weights: Option<String>,

    /// Number of league-average IPs to regress pitchers by.
    #[arg(long = "pitcher-regress", value_name = "IPs")]
    pub pitcher_regress: Option<f64>,

    /// Weights for projecting IPs.
    #[arg(long = "ip-weights", value_name = "LIST")]
    pub ip_weights: Option<String>,

    /// Base IP projection for starters.
    #[arg(long = "starter-base", value_name = "IP")]
    pub starter_base: Option<f64>,

    /// Base IP projection for relievers.
    #[arg(long = "reliever-base", value_name = "IP")]
    pub reliever_base: Option<f64>,

    /// Don't use the age adjustment.
    #[arg(long = "skip-aging")]
    pub skip_aging: bool,

    /// Don't use regression to the league average.
    #[arg(long = "skip-regression")]
    pub skip_regression: bool,

    /// Don't use seasonal weighting.
    #[arg(long = "skip-weighting")]
    pub skip_weighting: bool,
}

impl Cli {
    /// Assemble the engine configuration, applying Capuchin defaults for
    /// anything not given on the command line.
    pub fn to_config(&self) -> Result<ProjectionConfig, ConfigError> {
        let defaults = ProjectionConfig::for_year(
            self.year
                .unwrap_or_else(|| chrono::Utc::now().year() as u16),
        );

        let batting = BattingParams::new(
            match &self.batter_weights {
                Some(list) => parse_number_list("weights", list)?,
                None => crate::config::DEFAULT_WEIGHTS.to_vec(),
            },
            self.batter_regress.unwrap_or(defaults.batting.regress),
            self.pa_base.unwrap_or(defaults.batting.pa_base),
            match &self.pa_weights {
                Some(list) => parse_number_list("pa_weights", list)?,
                None => defaults.batting.pa_weights.clone(),
            },
        )?;

        let pitching = PitchingParams::new(
            match &self.pitcher_weights {
                Some(list) => parse_number_list("pitcher_weights", list)?,
                None => crate::config::DEFAULT_WEIGHTS.to_vec(),
            },
            self.pitcher_regress.unwrap_or(defaults.pitching.regress),
            self.starter_base.unwrap_or(defaults.pitching.starter_base),
            self.reliever_base.unwrap_or(defaults.pitching.reliever_base),
            match &self.ip_weights {
                Some(list) => parse_number_list("ip_weights", list)?,
                None => defaults.pitching.ip_weights.clone(),
            },
        )?;

        let age_adjustment = match &self.age_adjustment {
            Some(list) => {
                let rates = parse_number_list("age_adjustment", list)?;
                match rates.as_slice() {
                    [both] => (*both, *both),
                    [decline, growth] => (*decline, *growth),
                    _ => {
                        return Err(ConfigError::BadNumberList {
                            field: "age_adjustment",
                            value: list.clone(),
                        })
                    }
                }
            }
            None => DEFAULT_AGE_ADJUSTMENT,
        };

        Ok(ProjectionConfig {
            year: defaults.year,
            batting,
            pitching,
            peak_age: self.peak_age.unwrap_or(DEFAULT_PEAK_AGE),
            age_adjustment,
            use_flags: UseFlags {
                regression: !self.skip_regression,
                weighting: !self.skip_weighting,
                age: !self.skip_aging,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
