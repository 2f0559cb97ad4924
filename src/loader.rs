// Tabular season loading and role classification.
//
// Reads a season-statistics CSV (one row per player-year): the first column
// is the player id, the second is the season year, and every remaining
// column is a named numeric statistic. Whether the table holds batting or
// pitching data is detected from the header.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which kind of season statistics a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Batting,
    Pitching,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Batting => write!(f, "batting"),
            Role::Pitching => write!(f, "pitching"),
        }
    }
}

/// One player's accumulated statistics for one season. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct SeasonRow {
    pub player_id: String,
    pub year: u16,
    /// One value per statistic column, in header order.
    pub stats: Vec<f64>,
}

/// A fully loaded season table, ready for consolidation.
///
/// Keeps every parsed row grouped by year, the set of distinct player ids,
/// and (per year) the insertion-order index of each player's row.
#[derive(Debug, Clone)]
pub struct SeasonTable {
    role: Role,
    /// Full header, case preserved, including the id and year columns.
    header: Vec<String>,
    /// Upper-cased statistic column names (id and year columns excluded).
    stat_names: Vec<String>,
    rows: BTreeMap<u16, Vec<SeasonRow>>,
    players: BTreeSet<String>,
    /// Per year: player id -> index of that player's row in `rows[year]`.
    row_order: BTreeMap<u16, HashMap<String, usize>>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("table is empty (no header row)")]
    Empty,

    #[error("header matches {0}")]
    Classification(&'static str),

    #[error("line {line}, column {column} ({name}): cannot parse {value:?} as a number")]
    Parse {
        line: usize,
        column: usize,
        name: String,
        value: String,
    },

    #[error("line {line}: expected {expected} fields, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("year {year}: matrix shape {found:?} disagrees with {expected:?}")]
    Alignment {
        year: u16,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

// ---------------------------------------------------------------------------
// Role classification
// ---------------------------------------------------------------------------

/// Columns that must all be present for a header to classify as batting.
const BATTING_SIGNATURE: [&str; 4] = ["PA", "RBI", "SF", "SH"];

/// Columns that must all be present for a header to classify as pitching.
const PITCHING_SIGNATURE: [&str; 4] = ["W", "L", "S", "CG"];

/// Derive the table's role from its upper-cased column names.
///
/// A table must match exactly one signature; matching neither or both is a
/// hard load error since neither half of the engine could trust the columns.
fn classify(columns: &[String]) -> Result<Role, LoadError> {
    let has = |sig: &[&str]| sig.iter().all(|c| columns.iter().any(|h| h == c));
    match (has(&BATTING_SIGNATURE), has(&PITCHING_SIGNATURE)) {
        (true, false) => Ok(Role::Batting),
        (false, true) => Ok(Role::Pitching),
        (true, true) => Err(LoadError::Classification(
            "both the batting and pitching signatures",
        )),
        (false, false) => Err(LoadError::Classification(
            "neither the batting nor the pitching signature",
        )),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl SeasonTable {
    /// Load a season table from a CSV file on disk.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_reader(file)
    }

    /// Load a season table from any reader. Exposed so tests can run on
    /// in-memory CSV strings.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, LoadError> {
        // Headers are handled manually: the statistic columns are dynamic,
        // so rows are parsed positionally rather than through serde.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let mut records = reader.records();
        let header: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(|s| s.to_string()).collect(),
            None => return Err(LoadError::Empty),
        };
        if header.len() < 3 {
            return Err(LoadError::Classification(
                "neither the batting nor the pitching signature",
            ));
        }

        let stat_names: Vec<String> = header[2..].iter().map(|s| s.to_uppercase()).collect();
        let role = classify(&stat_names)?;
        debug!("classified table as {} ({} stat columns)", role, stat_names.len());

        let mut table = SeasonTable {
            role,
            header,
            stat_names,
            rows: BTreeMap::new(),
            players: BTreeSet::new(),
            row_order: BTreeMap::new(),
        };

        // The header was line 1.
        for (i, record) in records.enumerate() {
            let line = i + 2;
            let record = record?;
            table.append(line, &record)?;
        }
        Ok(table)
    }

    /// Parse and record one data row.
    fn append(&mut self, line: usize, record: &csv::StringRecord) -> Result<(), LoadError> {
        if record.len() != self.header.len() {
            return Err(LoadError::RowWidth {
                line,
                expected: self.header.len(),
                found: record.len(),
            });
        }

        let player_id = record[0].to_string();
        let year: u16 = record[1].parse().map_err(|_| LoadError::Parse {
            line,
            column: 2,
            name: self.header[1].clone(),
            value: record[1].to_string(),
        })?;

        let mut stats = Vec::with_capacity(self.stat_names.len());
        for (j, field) in record.iter().skip(2).enumerate() {
            // Empty fields are zero counts; the raw exports leave rare
            // statistics blank instead of writing 0.
            if field.is_empty() {
                stats.push(0.0);
                continue;
            }
            let value: f64 = field.parse().map_err(|_| LoadError::Parse {
                line,
                column: j + 3,
                name: self.header[j + 2].clone(),
                value: field.to_string(),
            })?;
            stats.push(value);
        }

        let year_rows = self.rows.entry(year).or_default();
        let order = self.row_order.entry(year).or_default();
        if order.contains_key(&player_id) {
            warn!("duplicate row for {} in {} (line {}), keeping the later one", player_id, year, line);
        }
        order.insert(player_id.clone(), year_rows.len());
        self.players.insert(player_id.clone());
        year_rows.push(SeasonRow {
            player_id,
            year,
            stats,
        });
        Ok(())
    }

    // -- Accessors ----------------------------------------------------------

    pub fn role(&self) -> Role {
        self.role
    }

    /// The original header, case preserved, for output emission.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Upper-cased statistic column names (excludes the id and year columns).
    pub fn stat_names(&self) -> &[String] {
        &self.stat_names
    }

    /// Column index of a statistic by upper-cased name.
    pub fn stat_index(&self, name: &str) -> Option<usize> {
        self.stat_names.iter().position(|s| s == name)
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.rows.keys().copied()
    }

    pub fn players(&self) -> &BTreeSet<String> {
        &self.players
    }

    pub fn rows_for(&self, year: u16) -> Option<&[SeasonRow]> {
        self.rows.get(&year).map(|v| v.as_slice())
    }

    /// Per-year insertion-order index of each player's row.
    pub fn row_order(&self, year: u16) -> Option<&HashMap<String, usize>> {
        self.row_order.get(&year)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BATTING_CSV: &str = "\
playerID,yearID,PA,AB,H,HR,RBI,SH,SF
aaronha01,2013,600,550,170,25,90,2,5
bonilbo01,2013,400,360,90,10,40,1,3
aaronha01,2014,580,530,160,20,85,0,4";

    const PITCHING_CSV: &str = "\
playerID,yearID,W,L,S,CG,OUTS,H,ER
riverma01,2013,4,2,40,0,180,40,12";

    #[test]
    fn batting_header_classified() {
        let table = SeasonTable::from_reader(BATTING_CSV.as_bytes()).unwrap();
        assert_eq!(table.role(), Role::Batting);
        assert_eq!(table.stat_names()[0], "PA");
        assert_eq!(table.stat_index("HR"), Some(3));
    }

    #[test]
    fn pitching_header_classified() {
        let table = SeasonTable::from_reader(PITCHING_CSV.as_bytes()).unwrap();
        assert_eq!(table.role(), Role::Pitching);
    }

    #[test]
    fn ambiguous_header_rejected() {
        // Carries both full signatures at once.
        let csv_data = "\
playerID,yearID,PA,RBI,SF,SH,W,L,S,CG
x,2014,1,1,1,1,1,1,1,1";
        let err = SeasonTable::from_reader(csv_data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Classification(_)));
    }

    #[test]
    fn unrecognized_header_rejected() {
        let csv_data = "\
playerID,yearID,GOALS,ASSISTS
x,2014,10,7";
        let err = SeasonTable::from_reader(csv_data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Classification(_)));
    }

    #[test]
    fn header_classification_is_case_insensitive() {
        let csv_data = "\
playerID,yearID,pa,ab,h,hr,rbi,sh,sf
aaronha01,2013,600,550,170,25,90,2,5";
        let table = SeasonTable::from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(table.role(), Role::Batting);
    }

    #[test]
    fn rows_grouped_by_year_in_insertion_order() {
        let table = SeasonTable::from_reader(BATTING_CSV.as_bytes()).unwrap();
        assert_eq!(table.years().collect::<Vec<_>>(), vec![2013, 2014]);
        let rows = table.rows_for(2013).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player_id, "aaronha01");
        assert_eq!(rows[1].player_id, "bonilbo01");

        let order = table.row_order(2013).unwrap();
        assert_eq!(order["aaronha01"], 0);
        assert_eq!(order["bonilbo01"], 1);
    }

    #[test]
    fn distinct_players_accumulated() {
        let table = SeasonTable::from_reader(BATTING_CSV.as_bytes()).unwrap();
        let players: Vec<_> = table.players().iter().cloned().collect();
        assert_eq!(players, vec!["aaronha01", "bonilbo01"]);
    }

    #[test]
    fn alphanumeric_player_ids_tolerated() {
        let csv_data = "\
playerID,yearID,PA,RBI,SF,SH
o'neipa01,2013,500,70,4,1";
        let table = SeasonTable::from_reader(csv_data.as_bytes()).unwrap();
        assert!(table.players().contains("o'neipa01"));
    }

    #[test]
    fn empty_stat_fields_are_zero() {
        let csv_data = "\
playerID,yearID,PA,RBI,SF,SH
aaronha01,2013,600,,,2";
        let table = SeasonTable::from_reader(csv_data.as_bytes()).unwrap();
        let row = &table.rows_for(2013).unwrap()[0];
        assert_eq!(row.stats, vec![600.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn malformed_stat_names_row_and_column() {
        let csv_data = "\
playerID,yearID,PA,RBI,SF,SH
aaronha01,2013,600,ninety,4,2";
        let err = SeasonTable::from_reader(csv_data.as_bytes()).unwrap_err();
        match err {
            LoadError::Parse {
                line,
                column,
                name,
                value,
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, 4);
                assert_eq!(name, "RBI");
                assert_eq!(value, "ninety");
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_year_rejected() {
        let csv_data = "\
playerID,yearID,PA,RBI,SF,SH
aaronha01,20x3,600,90,4,2";
        let err = SeasonTable::from_reader(csv_data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { column: 2, .. }));
    }

    #[test]
    fn short_row_rejected() {
        let csv_data = "\
playerID,yearID,PA,RBI,SF,SH
aaronha01,2013,600,90";
        let err = SeasonTable::from_reader(csv_data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::RowWidth {
                line: 2,
                expected: 6,
                found: 4
            }
        ));
    }

    #[test]
    fn empty_input_rejected() {
        let err = SeasonTable::from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }
}
