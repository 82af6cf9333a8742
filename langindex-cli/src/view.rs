use langindex::{Error, ResourceIndex, ScanReport, locale::iso_entry};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Column width values are cut to unless `--full` is given.
pub const VALUE_WIDTH: usize = 50;

/// Cuts `value` to at most `width` terminal columns, marking the cut.
pub fn truncate(value: &str, width: usize) -> String {
    if value.width() <= width {
        return value.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in value.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 3 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Pads `value` with spaces to `width` terminal columns.
pub fn pad(value: &str, width: usize) -> String {
    let fill = width.saturating_sub(value.width());
    format!("{}{}", value, " ".repeat(fill))
}

/// Renders rows as left-aligned columns separated by two spaces.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| if i == last { cell.to_string() } else { pad(cell, widths[i]) })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = line(header.to_vec());
    for row in rows {
        out.push('\n');
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

/// Summary of a scan: one row per bundle, then what was skipped.
pub fn print_scan(index: &ResourceIndex, report: &ScanReport) {
    let rows: Vec<Vec<String>> = index
        .iter()
        .map(|bundle| {
            vec![
                bundle.code.clone(),
                iso_entry(&bundle.code)
                    .map(|entry| entry.name.to_string())
                    .unwrap_or_default(),
                bundle.keys().count().to_string(),
                bundle.file.display().to_string(),
            ]
        })
        .collect();
    println!("{}", render_table(&["LOCALE", "NAME", "KEYS", "FILE"], &rows));

    for path in &report.unresolved {
        eprintln!("Warning: {}", Error::LocaleUnresolved(path.clone()));
    }
    for (path, error) in &report.failures {
        eprintln!("Warning: skipped {}: {}", path.display(), error);
    }
    for path in &report.overwritten {
        eprintln!("Warning: {} was shadowed by a later file", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_by_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        // Each CJK character takes two columns.
        assert_eq!(truncate("你好世界你好", 8), "你好...");
    }

    #[test]
    fn test_table_aligns_wide_cells() {
        let rows = vec![
            vec!["zh-cn".to_string(), "应用".to_string()],
            vec!["en".to_string(), "App".to_string()],
        ];
        let table = render_table(&["LOCALE", "TEXT"], &rows);
        assert_eq!(table, "LOCALE  TEXT\nzh-cn   应用\nen      App");
    }
}
