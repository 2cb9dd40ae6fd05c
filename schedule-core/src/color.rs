//! Group colors and ordering.

use std::cmp::Ordering;
use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Colors the course groups are known by. Anything else gets a hashed color.
pub static DEFAULT_GROUP_COLORS: Lazy<HashMap<String, String>> = Lazy::new(|| {
    [
        ("M2", "#eb0909"),
        ("M2_ANDROIDE", "#bf1e9a"),
        ("MOSIMA", "#83d45b"),
        ("AI-ADAPT", "#3498db"),
        ("COCOMA", "#becc29"),
        ("MADMC", "#f1c40f"),
        ("MAOA", "#e67e22"),
        ("AOTJ", "#e74c3c"),
        ("MADI", "#ff365a"),
        ("HAII", "#b368de"),
        ("IAR", "#1f804f"),
        ("OIP Gr1", "#ab1f8d"),
        ("OIP Gr2", "#ab1f9d"),
        ("OIP Gr3", "#ab1fad"),
    ]
    .into_iter()
    .map(|(group, color)| (group.to_string(), color.to_string()))
    .collect()
});

/// Groups listed before every other one, in this order.
pub const DEFAULT_PINNED_GROUPS: [&str; 2] = ["M2", "M2_ANDROIDE"];

/// Deterministic `#RRGGBB` derived from the group name (31-multiplier string
/// hash over UTF-16 units, low 24 bits).
pub fn hashed_color(seed: &str) -> String {
    let hash = seed
        .encode_utf16()
        .fold(0i32, |hash, unit| i32::from(unit).wrapping_add((hash << 5).wrapping_sub(hash)));
    format!("#{:06X}", hash & 0x00FF_FFFF)
}

pub fn group_color(table: &HashMap<String, String>, group: &str) -> String {
    table
        .get(group)
        .cloned()
        .unwrap_or_else(|| hashed_color(group))
}

/// `#rrggbb` -> `rgba(r, g, b, alpha)`. Channels are read at fixed offsets
/// after the leading character; missing or unreadable ones count as 0.
pub fn hex_to_rgba(hex: &str, alpha: f64) -> String {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .unwrap_or(0)
    };
    format!("rgba({}, {}, {}, {alpha})", channel(1..3), channel(3..5), channel(5..7))
}

/// Pinned groups first (in pin order), then the rest alphabetically,
/// ignoring case.
pub fn sort_groups(groups: &mut [String], pinned: &[String]) {
    let rank = |group: &String| pinned.iter().position(|p| p == group);
    groups.sort_by(|a, b| match (rank(a), rank(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_color_is_stable() {
        assert_eq!(hashed_color("MADI"), hashed_color("MADI"));
        assert_eq!(hashed_color(""), "#000000");
        // "a" hashes to 97.
        assert_eq!(hashed_color("a"), "#000061");
        assert_eq!(hashed_color("ab"), format!("#{:06X}", 97 * 31 + 98));
    }

    #[test]
    fn explicit_table_wins() {
        assert_eq!(group_color(&DEFAULT_GROUP_COLORS, "MADI"), "#ff365a");
        assert_eq!(group_color(&DEFAULT_GROUP_COLORS, "OTHER"), hashed_color("OTHER"));
    }

    #[test]
    fn rgba_conversion() {
        assert_eq!(hex_to_rgba("#eb0909", 0.5), "rgba(235, 9, 9, 0.5)");
        assert_eq!(hex_to_rgba("bad", 1.0), "rgba(173, 0, 0, 1)");
        assert_eq!(hex_to_rgba("#zz", 0.2), "rgba(0, 0, 0, 0.2)");
    }

    #[test]
    fn pinned_groups_lead() {
        let pinned = DEFAULT_PINNED_GROUPS.map(String::from);
        let mut groups = ["MADI", "M2_ANDROIDE", "AOTJ", "M2"].map(String::from);
        sort_groups(&mut groups, &pinned);
        assert_eq!(groups, ["M2", "M2_ANDROIDE", "AOTJ", "MADI"]);
    }

    #[test]
    fn unpinned_order_ignores_case() {
        let mut groups = ["oip", "MADI", "aotj", "IAR"].map(String::from);
        sort_groups(&mut groups, &[]);
        assert_eq!(groups, ["aotj", "IAR", "MADI", "oip"]);
    }
}
