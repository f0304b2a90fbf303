// src/screener/results.rs
use crate::error::ExportError;
use crate::types::Signal;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CSV_HEADERS: [&str; 7] = ["Symbol", "Signal Type", "Date", "Price", "RSI", "ADX", "Metadata"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Symbol,
    Price,
    Rsi,
    Adx,
    SignalDate,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Symbol => "Symbol",
            SortKey::Price => "Price",
            SortKey::Rsi => "RSI",
            SortKey::Adx => "ADX",
            SortKey::SignalDate => "Date",
        }
    }

    /// Cycles through the columns in table order.
    pub fn next(self) -> Self {
        match self {
            SortKey::Symbol => SortKey::Price,
            SortKey::Price => SortKey::Rsi,
            SortKey::Rsi => SortKey::Adx,
            SortKey::Adx => SortKey::SignalDate,
            SortKey::SignalDate => SortKey::Symbol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::SignalDate,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Same column flips direction; a new column starts ascending,
    /// except dates which start newest-first.
    pub fn select(self, key: SortKey) -> Self {
        if key == self.key {
            return Self {
                key,
                direction: self.direction.toggled(),
            };
        }
        let direction = match key {
            SortKey::SignalDate => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Self { key, direction }
    }
}

fn compare_metric(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Signal, b: &Signal, key: SortKey) -> Ordering {
    match key {
        SortKey::Symbol => a.symbol.cmp(&b.symbol),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::Rsi => compare_metric(a.rsi, b.rsi),
        SortKey::Adx => compare_metric(a.adx, b.adx),
        SortKey::SignalDate => a.signal_date.cmp(&b.signal_date),
    }
}

/// Stable sort into a fresh vector; equal keys keep their input order
/// in both directions.
pub fn sort(signals: &[Signal], spec: SortSpec) -> Vec<Signal> {
    let mut sorted = signals.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare(a, b, spec.key);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

fn fixed2(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("bist-signals-{}.csv", today.format("%Y-%m-%d"))
}

pub fn write_csv<W: Write>(signals: &[Signal], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADERS)?;

    for signal in signals {
        let metadata = serde_json::to_string(&signal.metadata)?;
        csv.write_record([
            signal.symbol.clone(),
            signal.signal_type.label(),
            signal.signal_date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", signal.price),
            fixed2(signal.rsi),
            fixed2(signal.adx),
            metadata,
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes the displayed rows to `<dir>/bist-signals-<date>.csv`.
/// An empty list is refused before anything touches the filesystem.
pub fn export_csv(signals: &[Signal], dir: &Path, today: NaiveDate) -> Result<PathBuf, ExportError> {
    if signals.is_empty() {
        return Err(ExportError::Empty);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(today));
    let partial = path.with_extension("csv.part");

    // only a fully written file ever appears under the final name
    let written = File::create(&partial)
        .map_err(ExportError::from)
        .and_then(|file| write_csv(signals, file));
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(&partial) {
            warn!("Could not remove {}: {}", partial.display(), cleanup);
        }
        return Err(e);
    }
    std::fs::rename(&partial, &path)?;

    info!("Exported {} signals to {}", signals.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::filter::tests::signal;
    use serde_json::json;

    fn dated(symbol: &str, price: f64, day: u32) -> Signal {
        let mut s = signal(symbol, Some(50.0), Some(20.0), price);
        s.signal_date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        s
    }

    fn symbols(signals: &[Signal]) -> Vec<&str> {
        signals.iter().map(|s| s.symbol.as_str()).collect()
    }

    #[test]
    fn default_order_is_newest_first() {
        let input = vec![dated("A", 1.0, 3), dated("B", 1.0, 12), dated("C", 1.0, 7)];
        assert_eq!(symbols(&sort(&input, SortSpec::default())), ["B", "C", "A"]);
    }

    #[test]
    fn dates_compare_as_dates_not_strings() {
        let mut early = dated("EARLY", 1.0, 9);
        early.signal_date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let late = dated("LATE", 1.0, 1);
        let spec = SortSpec {
            key: SortKey::SignalDate,
            direction: SortDirection::Asc,
        };
        assert_eq!(symbols(&sort(&[late, early], spec)), ["EARLY", "LATE"]);
    }

    #[test]
    fn equal_keys_keep_input_order_in_both_directions() {
        let input = vec![
            dated("X1", 10.0, 1),
            dated("Y", 20.0, 1),
            dated("X2", 10.0, 1),
            dated("X3", 10.0, 1),
        ];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let sorted = sort(&input, SortSpec { key: SortKey::Price, direction });
            let tied: Vec<_> = symbols(&sorted).into_iter().filter(|s| s.starts_with('X')).collect();
            assert_eq!(tied, ["X1", "X2", "X3"]);
        }
    }

    #[test]
    fn missing_rsi_sorts_below_present() {
        let mut none = dated("NONE", 1.0, 1);
        none.rsi = None;
        let low = dated("LOW", 1.0, 1);
        let spec = SortSpec {
            key: SortKey::Rsi,
            direction: SortDirection::Asc,
        };
        assert_eq!(symbols(&sort(&[low, none], spec)), ["NONE", "LOW"]);
    }

    #[test]
    fn sorting_leaves_input_untouched() {
        let input = vec![dated("B", 2.0, 1), dated("A", 1.0, 2)];
        let before = input.clone();
        let _ = sort(&input, SortSpec::default().select(SortKey::Symbol));
        assert_eq!(input, before);
    }

    #[test]
    fn selecting_same_key_flips_direction() {
        let spec = SortSpec::default().select(SortKey::Symbol);
        assert_eq!(spec.direction, SortDirection::Asc);
        assert_eq!(spec.select(SortKey::Symbol).direction, SortDirection::Desc);
        assert_eq!(spec.select(SortKey::SignalDate).direction, SortDirection::Desc);
    }

    #[test]
    fn csv_row_formats_numbers_and_metadata() {
        let mut with_meta = signal("AKBNK", Some(65.4), None, 50.0);
        with_meta.metadata.insert("score".into(), json!(3));
        with_meta.metadata.insert("note".into(), json!("a,b"));

        let mut buf = Vec::new();
        write_csv(&[with_meta], &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADERS);

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "AKBNK");
        assert_eq!(&row[1], "PULLBACK AL");
        assert_eq!(&row[2], "2025-03-14");
        assert_eq!(&row[3], "50.00");
        assert_eq!(&row[4], "65.40");
        assert_eq!(&row[5], "-");
        let meta: serde_json::Value = serde_json::from_str(&row[6]).unwrap();
        assert_eq!(meta, json!({"score": 3, "note": "a,b"}));
    }

    #[test]
    fn empty_export_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let err = export_csv(&[], dir.path(), today).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
        assert!(!dir.path().join(export_file_name(today)).exists());
    }

    #[test]
    fn export_uses_dated_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let path = export_csv(&[signal("SISE", None, None, 41.2)], dir.path(), today).unwrap();
        assert_eq!(path.file_name().unwrap(), "bist-signals-2025-03-14.csv");
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[test]
    fn failed_export_leaves_previous_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let path = export_csv(&[signal("SISE", None, None, 41.2)], dir.path(), today).unwrap();
        assert!(!path.with_extension("csv.part").exists());

        // a directory in the way makes the next write fail
        std::fs::create_dir(path.with_extension("csv.part")).unwrap();
        let two = [signal("SISE", None, None, 41.2), signal("EREGL", None, None, 30.0)];
        assert!(matches!(export_csv(&two, dir.path(), today), Err(ExportError::Io(_))));

        let kept = std::fs::read_to_string(&path).unwrap();
        assert_eq!(kept.lines().count(), 2);
    }
}
