#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `stats` formats the aligned tabular summary `dirload` prints after a
//! dispatch completes, one row per worker, plus the same table emitted
//! periodically by the optional monitor task.
//!
//! # Design
//!
//! Column widths are computed as the max over all rows (and the header
//! label) before any row is rendered, matching upstream `printStat`'s two-pass
//! approach: first measure every column, then emit a single `fmt`-style
//! template built from those widths. Kept here rather than inlined at each
//! call site so the monitor and the final report share one code path.

use worker::{WorkerRole, WorkerStats};

mod live;

pub use live::Live;

/// One row of the stats table: a worker's role plus its counters.
#[derive(Debug, Clone)]
pub struct Row {
    /// `Reader` or `Writer`.
    pub role: WorkerRole,
    /// The worker's counters and timing.
    pub stats: WorkerStats,
}

/// Renders `rows` into the aligned table upstream `dirload` prints.
///
/// Columns: index, type, repeat, stat, read, read\[B\], write, sec, MiB/sec,
/// path. A divider line of the header's exact width follows the header row.
#[must_use]
pub fn render(rows: &[Row]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let width_index = index_width(rows.len());
    let width_repeat = column_width("repeat", rows.iter().map(|r| r.stats.num_repeat));
    let width_stat = column_width("stat", rows.iter().map(|r| r.stats.num_stat));
    let width_read = column_width("read", rows.iter().map(|r| r.stats.num_read));
    let width_read_bytes = column_width("read[B]", rows.iter().map(|r| r.stats.num_read_bytes));
    let width_write = column_width("write", rows.iter().map(|r| r.stats.num_write));
    let width_sec = float_column_width("sec", rows.iter().map(|r| r.stats.elapsed_secs()));
    let width_mibs = float_column_width("MiB/sec", rows.iter().map(mib_per_sec));
    let width_path = rows
        .iter()
        .map(|r| r.stats.input_root.to_string_lossy().len())
        .max()
        .unwrap_or(0)
        .max("path".len());

    let mut out = String::new();
    let indent = " ".repeat(1 + width_index + 1);
    let header = format!(
        "{indent}{:<6} {:<width_repeat$} {:<width_stat$} {:<width_read$} {:<width_read_bytes$} {:<width_write$} {:<width_sec$} {:<width_mibs$} {:<width_path$}",
        "type", "repeat", "stat", "read", "read[B]", "write", "sec", "MiB/sec", "path",
    );
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.chars().count()));
    out.push('\n');

    for (i, row) in rows.iter().enumerate() {
        let role = match row.role {
            WorkerRole::Reader => "reader",
            WorkerRole::Writer => "writer",
        };
        let sec = row.stats.elapsed_secs();
        let mibs = mib_per_sec(row);
        out.push_str(&format!(
            "#{i:<width_index$} {role:<6} {:width_repeat$} {:width_stat$} {:width_read$} {:width_read_bytes$} {:width_write$} {sec:width_sec$.2} {mibs:width_mibs$.2} {}\n",
            row.stats.num_repeat,
            row.stats.num_stat,
            row.stats.num_read,
            row.stats.num_read_bytes,
            row.stats.num_write,
            row.stats.input_root.display(),
        ));
    }

    out
}

fn mib_per_sec(row: &Row) -> f64 {
    let sec = row.stats.elapsed_secs();
    if sec <= 0.0 {
        return 0.0;
    }
    let bytes = row.stats.num_read_bytes + row.stats.num_write_bytes;
    (bytes as f64 / f64::from(1u32 << 20)) / sec
}

fn index_width(num_rows: usize) -> usize {
    let last = num_rows.saturating_sub(1);
    last.to_string().len().max(1)
}

fn column_width(label: &str, values: impl Iterator<Item = u64>) -> usize {
    values.map(|v| v.to_string().len()).max().unwrap_or(0).max(label.len())
}

fn float_column_width(label: &str, values: impl Iterator<Item = f64>) -> usize {
    values
        .map(|v| format!("{v:.2}").len())
        .max()
        .unwrap_or(0)
        .max(label.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn row(role: WorkerRole, path: &str, num_stat: u64) -> Row {
        let begin = Instant::now();
        let end = begin + Duration::from_secs(2);
        Row {
            role,
            stats: WorkerStats {
                input_root: PathBuf::from(path),
                time_begin: Some(begin),
                time_end: Some(end),
                num_stat,
                num_read_bytes: 1 << 21,
                ..WorkerStats::default()
            },
        }
    }

    #[test]
    fn render_empty_is_empty() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn render_has_header_divider_and_one_row_per_worker() {
        let rows = vec![row(WorkerRole::Reader, "/data", 10), row(WorkerRole::Writer, "/data", 3)];
        let out = render(&rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("type"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].contains("reader"));
        assert!(lines[3].contains("writer"));
    }

    #[test]
    fn mib_per_sec_is_zero_when_elapsed_is_zero() {
        let mut r = row(WorkerRole::Reader, "/data", 1);
        r.stats.time_end = r.stats.time_begin;
        assert_eq!(mib_per_sec(&r), 0.0);
    }

    #[test]
    fn widths_grow_to_fit_largest_value() {
        let rows = vec![row(WorkerRole::Reader, "/data", 1), row(WorkerRole::Reader, "/data", 123_456)];
        let out = render(&rows);
        assert!(out.contains("123456"));
    }
}
