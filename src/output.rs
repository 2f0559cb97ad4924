// Forecast CSV emission.
//
// Rows come out (player_id, target_year, stat...) in the global player
// order, under the source table's original case-preserved header. The
// forecast statistics are count stats, so they are rounded to integers
// here; degenerate players are emitted with explicit NaN markers instead
// of fabricated zeros.

use std::io::Write;
use std::path::Path;

use crate::engine::Forecast;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to create file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write a forecast to any writer.
pub fn write_forecast<W: Write>(forecast: &Forecast, wtr: W) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(&forecast.header)?;

    let num_stats = forecast.stats.ncols();
    for (i, player_id) in forecast.player_ids.iter().enumerate() {
        let mut record = Vec::with_capacity(num_stats + 2);
        record.push(player_id.clone());
        record.push(forecast.year.to_string());
        for j in 0..num_stats {
            let value = forecast.stats[(i, j)];
            if value.is_nan() {
                record.push("NaN".to_string());
            } else {
                record.push(format!("{}", value.round() as i64));
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write a forecast to a file path.
pub fn write_forecast_to_path(forecast: &Forecast, path: &Path) -> Result<(), OutputError> {
    let file = std::fs::File::create(path).map_err(|e| OutputError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    write_forecast(forecast, file)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn forecast() -> Forecast {
        Forecast {
            year: 2015,
            player_ids: vec!["aaronha01".into(), "ghostpl01".into()],
            header: vec!["playerID".into(), "yearID".into(), "PA".into(), "H".into()],
            stats: DMatrix::from_row_slice(2, 2, &[449.6, 120.4, f64::NAN, f64::NAN]),
            degenerate: vec!["ghostpl01".into()],
        }
    }

    #[test]
    fn rows_rounded_under_original_header() {
        let mut buffer = Vec::new();
        write_forecast(&forecast(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "playerID,yearID,PA,H");
        assert_eq!(lines[1], "aaronha01,2015,450,120");
    }

    #[test]
    fn degenerate_rows_marked_nan() {
        let mut buffer = Vec::new();
        write_forecast(&forecast(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().nth(2).unwrap(), "ghostpl01,2015,NaN,NaN");
    }
}
