// The projection engine.
//
// Batting forecasts follow the Marcel recipe: weight the recent seasons,
// regress toward the league average, project playing time separately,
// pro-rate each player's line to that playing time, then re-baseline the
// league-wide rates to the most recent observed season.
//
// Pitching shares the contract but has no numeric policy yet; it returns
// `ProjectionError::PitchingUnimplemented`.

use nalgebra::{DMatrix, RowDVector};
use tracing::{info, warn};

use crate::config::{BattingParams, ProjectionConfig};
use crate::loader::Role;
use crate::matrix::Consolidated;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A finished forecast for one target year.
///
/// `stats` keeps full f64 precision; rounding to integer counts happens at
/// emission. Degenerate players (zero accumulated playing time, so nothing
/// to pro-rate) keep NaN rows and are listed in `degenerate`.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub year: u16,
    /// Row i of `stats` belongs to `player_ids[i]` (global sorted order).
    pub player_ids: Vec<String>,
    /// The source table's case-preserved header, for emission.
    pub header: Vec<String>,
    pub stats: DMatrix<f64>,
    /// Players whose projection could not be pro-rated.
    pub degenerate: Vec<String>,
}

impl Forecast {
    pub fn is_degenerate(&self, player_id: &str) -> bool {
        self.degenerate.iter().any(|p| p == player_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("pitching projection is not implemented")]
    PitchingUnimplemented,

    #[error("table has no {0} column to weight playing time by")]
    MissingPlayingTime(&'static str),
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Project the given consolidated table to `target_year`.
///
/// `Ok(None)` means no projection: none of the weighted window years exist
/// in the table. That is a defined empty result, not an error.
pub fn project(
    data: &Consolidated,
    config: &ProjectionConfig,
    target_year: u16,
) -> Result<Option<Forecast>, ProjectionError> {
    match data.role() {
        Role::Batting => project_batting(data, &config.batting, target_year),
        Role::Pitching => Err(ProjectionError::PitchingUnimplemented),
    }
}

// ---------------------------------------------------------------------------
// Batting
// ---------------------------------------------------------------------------

fn project_batting(
    data: &Consolidated,
    params: &BattingParams,
    target_year: u16,
) -> Result<Option<Forecast>, ProjectionError> {
    let pa = data
        .stat_index("PA")
        .ok_or(ProjectionError::MissingPlayingTime("PA"))?;

    // Window of prior years, most recent first, paired with its normalized
    // weight. Years before year 0 cannot exist; skip them outright.
    let window: Vec<(f64, u16)> = params
        .weights
        .iter()
        .enumerate()
        .filter_map(|(i, w)| target_year.checked_sub(1 + i as u16).map(|y| (*w, y)))
        .collect();

    // The most recent year present anchors the reference for re-baselining.
    let reference = window
        .iter()
        .find_map(|(_, y)| data.year(*y).map(|m| (*y, m)));
    let Some((reference_year, reference_matrix)) = reference else {
        info!(
            "no history in [{}..{}]; nothing to project",
            window.last().map(|(_, y)| *y).unwrap_or(target_year),
            target_year.saturating_sub(1)
        );
        return Ok(None);
    };

    let num_players = data.num_players();
    let num_stats = data.num_stats();

    // Step 2: weighted accumulation. Absent players hold zero rows, so they
    // add exactly zero everywhere, including the league totals.
    let mut projection = DMatrix::<f64>::zeros(num_players, num_stats);
    let mut league_total = RowDVector::<f64>::zeros(num_stats);
    for (weight, year) in &window {
        let Some(season) = data.year(*year) else {
            continue;
        };
        projection += season * *weight;
        for p in 0..num_players {
            let weighted_pa = weight * season[(p, pa)];
            for j in 0..num_stats {
                league_total[j] += weight * season[(p, j)] * weighted_pa;
            }
        }
    }

    // Step 3: regression. Blend `regress` PAs of league-average production
    // into every player. With regress = 0 the added row is zero.
    let total_pa = league_total[pa];
    if total_pa > 0.0 && params.regress > 0.0 {
        let league_average = &league_total * (params.regress / total_pa);
        for p in 0..num_players {
            for j in 0..num_stats {
                projection[(p, j)] += league_average[j];
            }
        }
    }

    // Step 4: playing time, projected from its own weighted history. The
    // pa_weights are applied raw on top of the base constant.
    let mut projected_pa = vec![params.pa_base; num_players];
    for (i, weight) in params.pa_weights.iter().enumerate() {
        let Some(year) = target_year.checked_sub(1 + i as u16) else {
            continue;
        };
        let Some(season) = data.year(year) else {
            continue;
        };
        for p in 0..num_players {
            projected_pa[p] += weight * season[(p, pa)];
        }
    }

    // Step 5: pro-ration. A zero accumulated PA cannot be scaled; mark the
    // player degenerate instead of silently zeroing the row.
    let mut degenerate_mask = vec![false; num_players];
    let mut degenerate = Vec::new();
    for p in 0..num_players {
        let accumulated_pa = projection[(p, pa)];
        if accumulated_pa == 0.0 {
            degenerate_mask[p] = true;
            degenerate.push(data.player_ids()[p].clone());
            projection.row_mut(p).fill(f64::NAN);
            continue;
        }
        let factor = projected_pa[p] / accumulated_pa;
        for j in 0..num_stats {
            projection[(p, j)] *= factor;
        }
    }
    if !degenerate.is_empty() {
        warn!(
            "{} player(s) with zero projected PA: {}",
            degenerate.len(),
            degenerate.join(", ")
        );
    }

    // Step 6: re-baseline the aggregate per-PA rates to the reference year,
    // correcting the drift the weighting and regression introduce.
    let reference_totals = reference_matrix.row_sum();
    let reference_pa_total = reference_totals[pa];
    let mut projection_totals = RowDVector::<f64>::zeros(num_stats);
    for p in 0..num_players {
        if degenerate_mask[p] {
            continue;
        }
        for j in 0..num_stats {
            projection_totals[j] += projection[(p, j)];
        }
    }
    let projection_pa_total = projection_totals[pa];
    if reference_pa_total > 0.0 && projection_pa_total > 0.0 {
        for j in 0..num_stats {
            let league_rate = reference_totals[j] / reference_pa_total;
            let projection_rate = projection_totals[j] / projection_pa_total;
            // A statistic nobody accumulated stays zero rather than NaN.
            if projection_rate == 0.0 {
                continue;
            }
            let scale = league_rate / projection_rate;
            for p in 0..num_players {
                if !degenerate_mask[p] {
                    projection[(p, j)] *= scale;
                }
            }
        }
    }

    info!(
        "projected {} batters to {} (reference year {})",
        num_players - degenerate.len(),
        target_year,
        reference_year
    );

    Ok(Some(Forecast {
        year: target_year,
        player_ids: data.player_ids().to_vec(),
        header: data.header().to_vec(),
        stats: projection,
        degenerate,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
