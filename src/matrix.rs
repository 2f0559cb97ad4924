// Season matrix consolidation.
//
// Turns a loaded `SeasonTable` into dense per-year matrices aligned to one
// global player ordering. The alignment invariant (every year's matrix has
// identical shape and row order) is what lets the projection engine do
// whole-matrix arithmetic across years without per-player lookups.

use std::collections::{BTreeMap, HashMap};

use nalgebra::DMatrix;
use tracing::debug;

use crate::loader::{LoadError, Role, SeasonTable};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A consolidated season table: one dense `num_players x num_stats` matrix
/// per year, all sharing the same lexically-sorted player ordering.
#[derive(Debug, Clone)]
pub struct Consolidated {
    role: Role,
    header: Vec<String>,
    stat_names: Vec<String>,
    /// Global player ordering: ascending player id. Row i of every matrix
    /// belongs to `player_ids[i]`.
    player_ids: Vec<String>,
    /// player id -> row index, identical for every year by construction.
    player_index: HashMap<String, usize>,
    matrices: BTreeMap<u16, DMatrix<f64>>,
}

// ---------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------

/// Finalize a loaded table into aligned per-year matrices.
///
/// For every year, every player in the global sorted order gets a row:
/// their parsed statistics if they played that year, zeros otherwise.
/// The source table is only borrowed, so consolidating twice yields the
/// same matrices.
pub fn consolidate(table: &SeasonTable) -> Result<Consolidated, LoadError> {
    let player_ids: Vec<String> = table.players().iter().cloned().collect();
    let player_index: HashMap<String, usize> = player_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i))
        .collect();

    let num_players = player_ids.len();
    let num_stats = table.stat_names().len();

    let mut matrices = BTreeMap::new();
    for year in table.years() {
        let mut matrix = DMatrix::<f64>::zeros(num_players, num_stats);
        if let Some(rows) = table.rows_for(year) {
            for row in rows {
                let i = player_index[&row.player_id];
                for (j, value) in row.stats.iter().enumerate() {
                    matrix[(i, j)] = *value;
                }
            }
        }
        matrices.insert(year, matrix);
    }

    // Structurally impossible given the loader's row-width check, but schema
    // drift upstream has produced mismatched yearly exports before.
    for (year, matrix) in &matrices {
        if matrix.shape() != (num_players, num_stats) {
            return Err(LoadError::Alignment {
                year: *year,
                expected: (num_players, num_stats),
                found: matrix.shape(),
            });
        }
    }

    debug!(
        "consolidated {} players x {} stats over {} seasons",
        num_players,
        num_stats,
        matrices.len()
    );

    Ok(Consolidated {
        role: table.role(),
        header: table.header().to_vec(),
        stat_names: table.stat_names().to_vec(),
        player_ids,
        player_index,
        matrices,
    })
}

impl Consolidated {
    pub fn role(&self) -> Role {
        self.role
    }

    /// The original case-preserved header.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn stat_names(&self) -> &[String] {
        &self.stat_names
    }

    pub fn stat_index(&self, name: &str) -> Option<usize> {
        self.stat_names.iter().position(|s| s == name)
    }

    pub fn player_ids(&self) -> &[String] {
        &self.player_ids
    }

    pub fn player_index(&self) -> &HashMap<String, usize> {
        &self.player_index
    }

    pub fn num_players(&self) -> usize {
        self.player_ids.len()
    }

    pub fn num_stats(&self) -> usize {
        self.stat_names.len()
    }

    pub fn year(&self, year: u16) -> Option<&DMatrix<f64>> {
        self.matrices.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.matrices.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SeasonTable;

    const CSV: &str = "\
playerID,yearID,PA,RBI,SF,SH
bonilbo01,2013,400,40,3,1
aaronha01,2013,600,90,5,2
aaronha01,2014,580,85,4,0
carewro01,2014,300,30,2,6";

    fn consolidated() -> Consolidated {
        let table = SeasonTable::from_reader(CSV.as_bytes()).unwrap();
        consolidate(&table).unwrap()
    }

    #[test]
    fn every_year_has_identical_shape() {
        let c = consolidated();
        for year in [2013, 2014] {
            assert_eq!(c.year(year).unwrap().shape(), (3, 4));
        }
        assert_eq!(c.num_players(), 3);
    }

    #[test]
    fn rows_sorted_by_player_id() {
        let c = consolidated();
        assert_eq!(c.player_ids(), ["aaronha01", "bonilbo01", "carewro01"]);
        assert_eq!(c.player_index()["aaronha01"], 0);
        assert_eq!(c.player_index()["carewro01"], 2);
    }

    #[test]
    fn present_rows_copied_in_sorted_position() {
        let c = consolidated();
        let m2013 = c.year(2013).unwrap();
        // aaronha01 sorts first even though bonilbo01 was inserted first.
        assert_eq!(m2013[(0, 0)], 600.0);
        assert_eq!(m2013[(1, 0)], 400.0);
    }

    #[test]
    fn absent_players_get_zero_rows() {
        let c = consolidated();
        let m2013 = c.year(2013).unwrap();
        let carew = c.player_index()["carewro01"];
        assert!(m2013.row(carew).iter().all(|v| *v == 0.0));

        let m2014 = c.year(2014).unwrap();
        let bonilla = c.player_index()["bonilbo01"];
        assert!(m2014.row(bonilla).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn consolidation_is_idempotent() {
        let table = SeasonTable::from_reader(CSV.as_bytes()).unwrap();
        let first = consolidate(&table).unwrap();
        let second = consolidate(&table).unwrap();
        assert_eq!(first.player_ids(), second.player_ids());
        for year in first.years() {
            assert_eq!(first.year(year), second.year(year));
        }
    }

    #[test]
    fn missing_year_is_none() {
        let c = consolidated();
        assert!(c.year(1999).is_none());
    }
}
