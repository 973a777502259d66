//! String formatting helpers for console output.

/// Render a header row and data rows as an ASCII grid table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut separator = String::from("+");
    for width in &widths {
        separator.push_str(&"-".repeat(width + 2));
        separator.push('+');
    }

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (i, width) in widths.iter().copied().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let padding = width - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(padding + 1));
            line.push('|');
        }
        line
    };

    let header_cells: Vec<String> = headers.iter().map(|header| header.to_string()).collect();

    let mut out = String::new();
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&render_row(&header_cells));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&separator);
    out
}

/// Reformat an ISO-8601 entered time for table display.
/// The API emits offsets both as `+0000` and as a trailing `Z`.
pub fn format_entered_time(raw: &str) -> String {
    let normalized = if raw.ends_with('Z') {
        raw.replacen('Z', "+0000", 1)
    } else {
        raw.to_string()
    };

    for pattern in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.3f%z"] {
        if let Ok(dt) = chrono::DateTime::parse_from_str(&normalized, pattern) {
            return dt.format("%Y-%m-%d %H:%M:%S").to_string();
        }
    }
    // Return original if it doesn't parse
    raw.to_string()
}

/// Format an order quantity, dropping the decimals of whole-share amounts.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        quantity.to_string()
    }
}
