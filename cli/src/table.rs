//! Plain-text rendering of job reports.

use crate::job::JobReport;
use minmax_core::UncertaintyRow;
use std::fmt::Write;

pub fn render_equations(report: &JobReport) -> String {
    format!(
        "Equation: {}\nMin:      {}\nMax:      {}\n",
        report.equation, report.min, report.max
    )
}

/// Right-aligned table: input columns in data order, then min, max and final
pub fn render_rows(rows: &[UncertaintyRow]) -> String {
    let Some(first) = rows.first() else {
        return "(no data rows)\n".to_string();
    };

    let mut header: Vec<String> = first.inputs.keys().cloned().collect();
    header.extend(["min", "max", "final"].map(String::from));

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.inputs
                .values()
                .chain([&row.min, &row.max, &row.final_uncertainty])
                .map(|v| v.to_string())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            body.iter()
                .map(|cells| cells[col].len())
                .chain([header[col].len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for cells in std::iter::once(&header).chain(&body) {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = width))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

#[cfg(test)]
mod table_tests {
    use super::*;
    use indexmap::IndexMap;

    fn row(x: f64, min: f64, max: f64) -> UncertaintyRow {
        let mut inputs = IndexMap::new();
        inputs.insert("X".to_string(), x);
        inputs.insert("dX".to_string(), 0.5);
        UncertaintyRow {
            inputs,
            min,
            max,
            final_uncertainty: (max - min) / 2.0,
        }
    }

    #[test]
    fn test_render_rows_aligns_columns() {
        let table = render_rows(&[row(1.0, 0.5, 1.5), row(100.0, 99.5, 100.5)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "  X   dX   min    max  final");
        assert_eq!(lines[2], "100  0.5  99.5  100.5    0.5");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_rows(&[]), "(no data rows)\n");
    }

    #[test]
    fn test_render_equations() {
        let report = JobReport {
            equation: "X".to_string(),
            min: "X - dX".to_string(),
            max: "X + dX".to_string(),
            rows: None,
        };
        assert!(render_equations(&report).contains("Min:      X - dX"));
    }
}
