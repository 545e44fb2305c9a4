use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Width of `s` in terminal cells.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// True when `s` is exactly one user-perceived character (ZWJ sequences and
/// flags included).
pub fn is_single_glyph(s: &str) -> bool {
    let mut graphemes = s.graphemes(true);
    graphemes.next().is_some() && graphemes.next().is_none()
}

/// Cut `s` to at most `max_cells` cells, ending in `…` when something was dropped.
/// Never splits a grapheme cluster.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let w = display_width(g);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Truncate or right-pad `s` with spaces to exactly `cells` cells (a wide
/// glyph that doesn't fit leaves one cell short, which is then padded).
pub fn fit_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let w = display_width(&out);
    if w < cells {
        out.push_str(&" ".repeat(cells - w));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(display_width("Buy milk"), 8);
        assert_eq!(display_width("你好"), 4);
        assert_eq!(display_width("📌"), 2);
        assert_eq!(display_width("cafe\u{0301}"), 4);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn single_glyph() {
        assert!(is_single_glyph("📌"));
        assert!(is_single_glyph("👨\u{200D}👩\u{200D}👧"));
        assert!(is_single_glyph("🇪🇸"));
        assert!(is_single_glyph("e\u{0301}"));
        assert!(!is_single_glyph(""));
        assert!(!is_single_glyph("📌📌"));
        assert!(!is_single_glyph("ab"));
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_to_width("hi", 10), "hi");
        assert_eq!(truncate_to_width("hello", 5), "hello");
        assert_eq!(truncate_to_width("hello world", 8), "hello w\u{2026}");
        assert_eq!(truncate_to_width("你好世界", 5), "你好\u{2026}");
        assert_eq!(truncate_to_width("🎉🚀💫", 4), "🎉\u{2026}");
        assert_eq!(truncate_to_width("hello", 1), "\u{2026}");
        assert_eq!(truncate_to_width("hello", 0), "");
    }

    #[test]
    fn fitting() {
        assert_eq!(fit_to_width("Work", 6), "Work  ");
        assert_eq!(fit_to_width("Groceries", 6), "Groce\u{2026}");
        // 你 + … is 3 cells, padded to 4
        assert_eq!(fit_to_width("你好世界", 4), "你\u{2026} ");
    }
}
