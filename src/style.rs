pub const GOOD: &str = "good";
pub const BAD: &str = "bad";

/// Three-way classification of a category cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTag {
    Good,
    Bad,
    Neutral,
}

impl StyleTag {
    /// Inline CSS used for highlighted cells; empty for neutral cells.
    pub fn css(self) -> &'static str {
        match self {
            StyleTag::Good => "background-color: rgba(0, 255, 0, 0.2);",
            StyleTag::Bad => "background-color: rgba(255, 0, 0, 0.2);",
            StyleTag::Neutral => "",
        }
    }
}

/// Exact, case-sensitive: `"Good"` is neutral.
pub fn style_classification(value: &str) -> StyleTag {
    match value {
        GOOD => StyleTag::Good,
        BAD => StyleTag::Bad,
        _ => StyleTag::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_exact_values() {
        assert_eq!(style_classification("good"), StyleTag::Good);
        assert_eq!(style_classification("bad"), StyleTag::Bad);
        assert_eq!(style_classification(""), StyleTag::Neutral);
        assert_eq!(style_classification("n/a"), StyleTag::Neutral);
    }

    #[test]
    fn capitalised_values_are_neutral() {
        assert_eq!(style_classification("Good"), StyleTag::Neutral);
        assert_eq!(style_classification("BAD"), StyleTag::Neutral);
        assert_eq!(style_classification(" bad"), StyleTag::Neutral);
    }

    #[test]
    fn neutral_has_no_css() {
        assert!(StyleTag::Neutral.css().is_empty());
        assert!(StyleTag::Bad.css().contains("255, 0, 0"));
    }
}
