use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for double-width characters.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `width` display columns, ending in ".." when cut.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s.chars().take(width).collect();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Plain-text table: header, dashed rule, rows. Columns are sized to
/// their widest cell, capped at `max_col`.
pub(crate) fn render_table(headers: &[String], rows: &[Vec<String>], max_col: usize) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h).min(max_col)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(display_width(cell).min(max_col));
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad_right(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_display("abc", 5), "abc");
        assert_eq!(truncate_display("abc", 3), "abc");
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("Mbabane East", 8), "Mbaban..");
        assert_eq!(truncate_display("abc", 2), "ab");
    }

    #[test]
    fn truncate_wide_chars() {
        let s = "\u{4e16}\u{754c}\u{4f60}\u{597d}";
        let t = truncate_display(s, 6);
        assert_eq!(t, "\u{4e16}\u{754c}..");
        assert!(display_width(&t) <= 6);
    }

    #[test]
    fn pad_right_short_and_long() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcdef", 5), "abc..");
    }

    #[test]
    fn table_aligns_columns() {
        let headers = vec!["Inkhundla".to_string(), "Initial".to_string()];
        let rows = vec![
            vec!["Lobamba".to_string(), "d1".to_string()],
            vec!["Mbabane East".to_string(), "".to_string()],
        ];
        let table = render_table(&headers, &rows, 30);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Inkhundla     Initial");
        assert_eq!(lines[1], "------------  -------");
        assert_eq!(lines[2], "Lobamba       d1");
        assert_eq!(lines[3], "Mbabane East");
    }
}
