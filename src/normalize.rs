/// Glyphs accepted as a single leading list marker.
pub const BULLET_MARKERS: [char; 5] = ['•', '*', '-', '–', '—'];

/// Strip surrounding whitespace and at most one leading bullet marker.
///
/// `"  • Chicken Curry  "` becomes `"Chicken Curry"`; `"-- x"` keeps the
/// second dash (`"- x"`). Returns an empty string when nothing remains.
pub fn normalize_line(raw: &str) -> String {
    let t = raw.trim_start();
    let t = t.strip_prefix(BULLET_MARKERS).unwrap_or(t);
    t.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_each_bullet_kind() {
        for marker in BULLET_MARKERS {
            let line = format!("  {marker}  Oat milk ");
            assert_eq!(normalize_line(&line), "Oat milk", "marker {marker:?}");
        }
    }

    #[test]
    fn only_one_marker_is_removed() {
        assert_eq!(normalize_line("-- dashes"), "- dashes");
        assert_eq!(normalize_line("•• dots"), "• dots");
    }

    #[test]
    fn marker_without_space_is_stripped() {
        assert_eq!(normalize_line("*Eggs"), "Eggs");
    }

    #[test]
    fn plain_and_empty_lines() {
        assert_eq!(normalize_line("Pasta Bake"), "Pasta Bake");
        assert_eq!(normalize_line("   "), "");
        assert_eq!(normalize_line(" - "), "");
        assert_eq!(normalize_line(""), "");
    }
}
