// Projection comparison.
//
// A standalone diff over two already-produced projection tables sharing a
// schema. Nothing here touches the projection engine: the comparator loads
// both files, lines up mutual players, and reports per-statistic
// discrepancy aggregates. Data mismatches (missing players, NaN values,
// age disagreements) are report output, never aborts.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Identification/demographic columns stripped before comparison when they
/// trail the player id.
const SKIP_COLUMNS: [&str; 4] = ["nameFirst", "nameLast", "playerID", "lgID"];

/// One loaded projection table, keyed by player id.
#[derive(Debug, Clone)]
pub struct ProjectionFile {
    /// Statistic names, in file order (demographic columns removed).
    pub headers: Vec<String>,
    pub players: BTreeMap<String, Vec<f64>>,
}

/// Aggregate discrepancy for one statistic across all mutual players.
#[derive(Debug, Clone)]
pub struct StatSummary {
    pub name: String,
    pub rmse: f64,
    pub stddev: f64,
    pub variance: f64,
}

/// A flagged per-player age mismatch (|difference| > 0.5).
#[derive(Debug, Clone)]
pub struct AgeDisagreement {
    pub player_id: String,
    pub baseline: f64,
    pub candidate: f64,
}

/// Everything the comparison produced.
#[derive(Debug, Clone, Default)]
pub struct CompareReport {
    /// Players present only in the baseline file, sorted.
    pub only_baseline: Vec<String>,
    /// Players present only in the candidate file, sorted.
    pub only_candidate: Vec<String>,
    /// Mutual players excluded from aggregates for candidate-side NaNs.
    pub nan_players: Vec<String>,
    pub age_disagreements: Vec<AgeDisagreement>,
    pub stats: Vec<StatSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("projection file is empty (no header row)")]
    Empty,

    #[error("line {line}, column {column}: cannot parse {value:?}")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a projection table from a reader.
///
/// `id_column` is the count of columns preceding the player id (raw exports
/// carry ranking columns up front; trimmed files use 0). Demographic
/// columns immediately after the id are dropped. Of the retained values,
/// the first two are integer pre-stats (age, playing time) and the rest are
/// floats; candidate-side NaN floats are loaded as NaN and dealt with
/// during comparison.
pub fn load_projection<R: Read>(rdr: R, id_column: usize) -> Result<ProjectionFile, CompareError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(CompareError::Empty),
    };

    // Count demographic columns directly after the player id.
    let after_id: Vec<&str> = header.iter().skip(id_column + 1).collect();
    let post_id_skip = after_id
        .iter()
        .take_while(|c| SKIP_COLUMNS.contains(&c.trim()))
        .count();
    let headers: Vec<String> = after_id[post_id_skip..]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut players = BTreeMap::new();
    for (i, record) in records.enumerate() {
        let line = i + 2;
        let record = record?;
        let mut fields = record.iter().skip(id_column);
        let Some(player_id) = fields.next() else {
            continue;
        };
        let mut stats = Vec::with_capacity(headers.len());
        for (j, field) in fields.skip(post_id_skip).enumerate() {
            let column = id_column + post_id_skip + j + 2;
            let value = if j < 2 {
                // Integer pre-stat columns.
                field
                    .parse::<i64>()
                    .map_err(|_| CompareError::Parse {
                        line,
                        column,
                        value: field.to_string(),
                    })? as f64
            } else {
                field.parse::<f64>().map_err(|_| CompareError::Parse {
                    line,
                    column,
                    value: field.to_string(),
                })?
            };
            stats.push(value);
        }
        players.insert(player_id.to_string(), stats);
    }

    Ok(ProjectionFile { headers, players })
}

/// Load a projection table from a file path.
pub fn load_projection_from_path(
    path: &Path,
    id_column: usize,
) -> Result<ProjectionFile, CompareError> {
    let file = std::fs::File::open(path).map_err(|e| CompareError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_projection(file, id_column)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare a candidate projection against a baseline.
///
/// Statistic names come from the baseline's header. Players missing from
/// either side are reported and excluded; a candidate row containing any
/// NaN drops that player from the aggregates.
pub fn compare(baseline: &ProjectionFile, candidate: &ProjectionFile) -> CompareReport {
    let baseline_players: BTreeSet<&String> = baseline.players.keys().collect();
    let candidate_players: BTreeSet<&String> = candidate.players.keys().collect();

    let only_baseline: Vec<String> = baseline_players
        .difference(&candidate_players)
        .map(|p| (*p).clone())
        .collect();
    let only_candidate: Vec<String> = candidate_players
        .difference(&baseline_players)
        .map(|p| (*p).clone())
        .collect();

    let mut nan_players = Vec::new();
    let mut mutual = Vec::new();
    for player in baseline_players.intersection(&candidate_players) {
        if candidate.players[*player].iter().any(|v| v.is_nan()) {
            nan_players.push((**player).clone());
        } else {
            mutual.push(*player);
        }
    }

    let mut age_disagreements = Vec::new();
    let mut differences: Vec<Vec<f64>> = vec![Vec::new(); baseline.headers.len()];
    for player in &mutual {
        let baseline_stats = &baseline.players[*player];
        let candidate_stats = &candidate.players[*player];
        for (j, name) in baseline.headers.iter().enumerate() {
            let (Some(b), Some(c)) = (baseline_stats.get(j), candidate_stats.get(j)) else {
                break;
            };
            let diff = b - c;
            if name == "Age" && diff.abs() > 0.5 {
                age_disagreements.push(AgeDisagreement {
                    player_id: (**player).clone(),
                    baseline: *b,
                    candidate: *c,
                });
            }
            differences[j].push(diff);
        }
    }

    let stats = baseline
        .headers
        .iter()
        .zip(&differences)
        .filter(|(_, diffs)| !diffs.is_empty())
        .map(|(name, diffs)| summarize(name, diffs))
        .collect();

    CompareReport {
        only_baseline,
        only_candidate,
        nan_players,
        age_disagreements,
        stats,
    }
}

/// RMSE plus population standard deviation and variance of the signed
/// differences for one statistic.
fn summarize(name: &str, diffs: &[f64]) -> StatSummary {
    let n = diffs.len() as f64;
    let mean_square = diffs.iter().map(|d| d * d).sum::<f64>() / n;
    let mean = diffs.iter().sum::<f64>() / n;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    StatSummary {
        name: name.to_string(),
        rmse: mean_square.sqrt(),
        stddev: variance.sqrt(),
        variance,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn file(csv_data: &str, id_column: usize) -> ProjectionFile {
        load_projection(csv_data.as_bytes(), id_column).unwrap()
    }

    #[test]
    fn single_stat_rmse() {
        let baseline = file("playerID,Age,PA,H\nP1,27,600,10.0", 0);
        let candidate = file("playerID,Age,PA,H\nP1,27,600,8.0", 0);
        let report = compare(&baseline, &candidate);

        let h = report.stats.iter().find(|s| s.name == "H").unwrap();
        assert!((h.rmse - 2.0).abs() < TOL);
        assert!(h.stddev.abs() < TOL);
        assert!(h.variance.abs() < TOL);
    }

    #[test]
    fn disjoint_players_reported_not_aggregated() {
        let baseline = file("playerID,Age,PA,H\nP1,27,600,10.0\nP2,30,500,9.0", 0);
        let candidate = file("playerID,Age,PA,H\nP1,27,600,10.0\nP3,24,400,7.0", 0);
        let report = compare(&baseline, &candidate);

        assert_eq!(report.only_baseline, vec!["P2"]);
        assert_eq!(report.only_candidate, vec!["P3"]);
        // Only P1 aggregates, with zero difference.
        let h = report.stats.iter().find(|s| s.name == "H").unwrap();
        assert!(h.rmse.abs() < TOL);
    }

    #[test]
    fn candidate_nan_excludes_player() {
        let baseline = file("playerID,Age,PA,H\nP1,27,600,10.0\nP2,30,500,9.0", 0);
        let candidate = file("playerID,Age,PA,H\nP1,27,600,NaN\nP2,30,500,6.0", 0);
        let report = compare(&baseline, &candidate);

        assert_eq!(report.nan_players, vec!["P1"]);
        let h = report.stats.iter().find(|s| s.name == "H").unwrap();
        // Only P2 remains: diff 3.0 exactly.
        assert!((h.rmse - 3.0).abs() < TOL);
    }

    #[test]
    fn age_disagreement_flagged() {
        let baseline = file("playerID,Age,PA,H\nP1,27,600,10.0", 0);
        let candidate = file("playerID,Age,PA,H\nP1,28,600,10.0", 0);
        let report = compare(&baseline, &candidate);

        assert_eq!(report.age_disagreements.len(), 1);
        let d = &report.age_disagreements[0];
        assert_eq!(d.player_id, "P1");
        assert_eq!(d.baseline, 27.0);
        assert_eq!(d.candidate, 28.0);
    }

    #[test]
    fn age_within_half_year_not_flagged() {
        // Integer pre-stat columns can only disagree by whole years, but the
        // guard itself is on the half-year threshold.
        let baseline = file("playerID,Age,PA,H\nP1,27,600,10.0", 0);
        let candidate = file("playerID,Age,PA,H\nP1,27,600,12.0", 0);
        let report = compare(&baseline, &candidate);
        assert!(report.age_disagreements.is_empty());
    }

    #[test]
    fn demographic_columns_skipped() {
        let baseline = file(
            "playerID,nameFirst,nameLast,Age,PA,H\nP1,Hank,Aaron,27,600,10.0",
            0,
        );
        assert_eq!(baseline.headers, vec!["Age", "PA", "H"]);
        assert_eq!(baseline.players["P1"], vec![27.0, 600.0, 10.0]);
    }

    #[test]
    fn pre_playerid_columns_skipped() {
        let baseline = file("rank,tier,playerID,Age,PA,H\n1,A,P1,27,600,10.0", 2);
        assert_eq!(baseline.headers, vec!["Age", "PA", "H"]);
        assert!(baseline.players.contains_key("P1"));
    }

    #[test]
    fn non_integer_pre_stat_rejected() {
        let err = load_projection("playerID,Age,PA,H\nP1,27.5,600,10.0".as_bytes(), 0)
            .unwrap_err();
        assert!(matches!(err, CompareError::Parse { line: 2, .. }));
    }
}
