//! Text helpers for module prose.

/// Marker appended when prose is cut to fit `max_prose_length`.
const ELLIPSIS: char = '…';

/// Cap `text` at `max_chars` characters, cutting on a char boundary.
///
/// The result, ellipsis included, never exceeds `max_chars`.
pub fn fit(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.truncate(out.trim_end().len());
    out.push(ELLIPSIS);
    out
}

/// `part` as a percentage of `whole`.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}

/// Whole numbers without decimals, everything else with one.
pub fn num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Percentage with one decimal and a `%` sign.
pub fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// "a", "a and b", "a, b and c".
pub fn list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{} and {}", head.join(", "), last.as_ref())
        }
    }
}

/// "1 segment", "3 segments", "2 technologies".
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {}", plural(noun))
    }
}

/// English plural of the last word in `noun`, regular forms only.
fn plural(noun: &str) -> String {
    let ends_vowel_y = noun
        .chars()
        .rev()
        .nth(1)
        .is_some_and(|c| "aeiou".contains(c.to_ascii_lowercase()));
    if let Some(stem) = noun.strip_suffix('y').filter(|_| !ends_vowel_y) {
        format!("{stem}ies")
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|end| noun.ends_with(end)) {
        format!("{noun}es")
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_leaves_short_text() {
        assert_eq!(fit("short", 10), "short");
    }

    #[test]
    fn fit_truncates_on_char_boundary() {
        let text = "Größenordnung der Märkte";
        let out = fit(text, 8);
        assert!(out.chars().count() <= 8);
        assert!(out.ends_with('…'));
        assert!(out.starts_with("Größe"));
    }

    #[test]
    fn fit_zero_is_empty() {
        assert_eq!(fit("anything", 0), "");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.345), "12.3");
        assert_eq!(pct(percent(1.0, 3.0)), "33.3%");
        assert_eq!(percent(1.0, 0.0), 0.0);
    }

    #[test]
    fn list_joins_naturally() {
        assert_eq!(list::<&str>(&[]), "");
        assert_eq!(list(&["a"]), "a");
        assert_eq!(list(&["a", "b"]), "a and b");
        assert_eq!(list(&["a", "b", "c"]), "a, b and c");
    }

    #[test]
    fn count_pluralizes() {
        assert_eq!(count(1, "risk"), "1 risk");
        assert_eq!(count(4, "risk"), "4 risks");
        assert_eq!(count(1, "technology"), "1 technology");
        assert_eq!(count(3, "technology"), "3 technologies");
        assert_eq!(count(2, "key survey"), "2 key surveys");
        assert_eq!(count(2, "tax"), "2 taxes");
        assert_eq!(count(0, "inflow period"), "0 inflow periods");
    }
}
