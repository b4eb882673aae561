use chrono::Utc;
use serde::Serialize;

use crate::fetcher::{GridRow, RgbColor};

/// Background color for padded cells and for cells the API sent no color
/// for. Unset channels default to full intensity, so "no color" is white.
pub const DEFAULT_COLOR: &str = "#ffffff";

/// One cell as the color-aware endpoints serve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColoredCell {
    pub value: String,
    pub color: String,
}

/// Normalized contents of one spreadsheet tab.
///
/// Invariant: every row in `rows` and in `rows_with_colors` has exactly
/// `headers.len()` cells; short source rows are padded, blank source rows
/// are gone entirely.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub rows_with_colors: Vec<Vec<ColoredCell>>,
    /// Fetch timestamp, used by clients only as an opaque change token.
    pub version: String,
}

/// Turn a raw grid into a [`Snapshot`].
///
/// Row 0 is the header row. Rows whose every cell is empty or whitespace
/// are dropped before anything else and never count toward totals.
pub fn normalize(grid: &[GridRow]) -> Snapshot {
    let version = Utc::now().timestamp_millis().to_string();

    let Some((header_row, body)) = grid.split_first() else {
        return Snapshot {
            headers: Vec::new(),
            rows: Vec::new(),
            rows_with_colors: Vec::new(),
            version,
        };
    };

    let headers: Vec<String> = header_row
        .values
        .iter()
        .map(|cell| cell.formatted_value.clone().unwrap_or_default())
        .collect();

    let mut rows = Vec::new();
    let mut rows_with_colors = Vec::new();

    for row in body {
        let blank = row
            .values
            .iter()
            .all(|cell| cell.formatted_value.as_deref().unwrap_or("").trim().is_empty());
        if blank {
            continue;
        }

        let mut values: Vec<String> = Vec::with_capacity(headers.len());
        let mut colored: Vec<ColoredCell> = Vec::with_capacity(headers.len());
        for cell in &row.values {
            let value = cell.formatted_value.clone().unwrap_or_default();
            let color = color_to_hex(
                cell.effective_format
                    .as_ref()
                    .and_then(|f| f.background_color.as_ref()),
            );
            colored.push(ColoredCell {
                value: value.clone(),
                color,
            });
            values.push(value);
        }

        // Short rows are padded up to the header count; anything past it is
        // dropped so the length invariant holds in both directions.
        values.resize(headers.len(), String::new());
        colored.resize(
            headers.len(),
            ColoredCell {
                value: String::new(),
                color: DEFAULT_COLOR.to_string(),
            },
        );

        rows.push(values);
        rows_with_colors.push(colored);
    }

    Snapshot {
        headers,
        rows,
        rows_with_colors,
        version,
    }
}

/// Convert an API color (float channels in [0, 1], unset meaning 1.0) into
/// a lowercase `#rrggbb` string.
pub fn color_to_hex(color: Option<&RgbColor>) -> String {
    match color {
        None => DEFAULT_COLOR.to_string(),
        Some(c) => format!(
            "#{:02x}{:02x}{:02x}",
            channel(c.red),
            channel(c.green),
            channel(c.blue)
        ),
    }
}

fn channel(value: Option<f64>) -> u8 {
    (value.unwrap_or(1.0).clamp(0.0, 1.0) * 255.0).round() as u8
}
