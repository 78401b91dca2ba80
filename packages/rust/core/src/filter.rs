//! Length filtering and truncation of article text.

/// Inclusive length bounds in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthBounds {
    /// Shorter texts are rejected. Empty text is always rejected.
    pub min: usize,
    /// Longer texts are cut to exactly this many characters. `None` is unbounded.
    pub max: Option<usize>,
}

impl LengthBounds {
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

/// Result of [`filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Kept. `length` is the character count before truncation.
    Accepted { text: String, length: usize },
    /// Empty or too short.
    Rejected { length: usize },
}

/// Accept, reject or truncate `content` by its length in characters.
pub fn filter(content: String, bounds: &LengthBounds) -> FilterOutcome {
    let length = content.chars().count();
    if length == 0 || length < bounds.min {
        return FilterOutcome::Rejected { length };
    }

    let text = match bounds.max {
        Some(max) if length > max => truncate_chars(content, max),
        _ => content,
    };
    FilterOutcome::Accepted { text, length }
}

/// Cut `text` after `max` characters.
fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((byte_idx, _)) = text.char_indices().nth(max) {
        text.truncate(byte_idx);
    }
    text
}

/// Whether `title` contains one of the excluded substrings.
pub fn is_excluded_title(title: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| !p.is_empty() && title.contains(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_within_bounds() {
        let bounds = LengthBounds::new(3, Some(10));
        assert_eq!(
            filter("Hethiter".into(), &bounds),
            FilterOutcome::Accepted {
                text: "Hethiter".into(),
                length: 8
            }
        );
    }

    #[test]
    fn rejects_short_text() {
        let bounds = LengthBounds::new(100, None);
        assert_eq!(
            filter("x".repeat(50), &bounds),
            FilterOutcome::Rejected { length: 50 }
        );
    }

    #[test]
    fn truncates_by_characters() {
        let bounds = LengthBounds::new(0, Some(5));
        let outcome = filter("Hattuša liegt in Anatolien".into(), &bounds);
        assert_eq!(
            outcome,
            FilterOutcome::Accepted {
                text: "Hattu".into(),
                length: 26
            }
        );

        let outcome = filter("šššššššš".into(), &bounds);
        let FilterOutcome::Accepted { text, length } = outcome else {
            panic!("expected accepted");
        };
        assert_eq!(text, "ššššš");
        assert_eq!(length, 8);
    }

    #[test]
    fn truncation_is_idempotent() {
        let bounds = LengthBounds::new(0, Some(7));
        let FilterOutcome::Accepted { text: once, .. } = filter("Großreich der Hethiter".into(), &bounds)
        else {
            panic!("expected accepted");
        };
        let FilterOutcome::Accepted { text: twice, .. } = filter(once.clone(), &bounds) else {
            panic!("expected accepted");
        };
        assert_eq!(once, "Großrei");
        assert_eq!(once, twice);
    }

    #[test]
    fn exact_bounds_are_inclusive() {
        let bounds = LengthBounds::new(4, Some(4));
        assert!(matches!(
            filter("abcd".into(), &bounds),
            FilterOutcome::Accepted { ref text, length: 4 } if text == "abcd"
        ));
    }

    #[test]
    fn empty_text_is_rejected_without_minimum() {
        assert_eq!(
            filter(String::new(), &LengthBounds::default()),
            FilterOutcome::Rejected { length: 0 }
        );
        assert_eq!(
            filter("a".into(), &LengthBounds::default()),
            FilterOutcome::Accepted {
                text: "a".into(),
                length: 1
            }
        );
    }

    #[test]
    fn excludes_list_titles() {
        let patterns = vec!["Liste von".to_string(), "Liste d".to_string()];
        assert!(is_excluded_title("Liste der hethitischen Könige", &patterns));
        assert!(is_excluded_title("Liste von Städten", &patterns));
        assert!(!is_excluded_title("Hethiter", &patterns));
        assert!(!is_excluded_title("Hethiter", &[String::new()]));
    }
}
