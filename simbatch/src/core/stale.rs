//! Matching of prior-run outputs (`<stem>_*_out.csv`) for cleanup.

use anyhow::{Context, Result};
use regex::Regex;

/// Matches `<stem>_*_out.csv` where the stem is literal and `*` is any run of
/// characters, including none.
///
/// A stem that prefixes another stem (`a` vs `a_b`) also matches the longer
/// stem's outputs, the same as a shell glob would.
#[derive(Debug, Clone)]
pub struct StalePattern {
    regex: Regex,
}

impl StalePattern {
    pub fn for_stem(stem: &str) -> Result<Self> {
        let pattern = format!(r"(?s)\A{}_.*_out\.csv\z", regex::escape(stem));
        let regex =
            Regex::new(&pattern).with_context(|| format!("compile stale pattern for {stem}"))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_both_variant_outputs() {
        let pattern = StalePattern::for_stem("sample").expect("pattern");
        assert!(pattern.matches("sample_forward_out.csv"));
        assert!(pattern.matches("sample_no_forward_out.csv"));
        assert!(pattern.matches("sample__out.csv"));
    }

    #[test]
    fn rejects_other_names() {
        let pattern = StalePattern::for_stem("sample").expect("pattern");
        assert!(!pattern.matches("sample_out.csv"));
        assert!(!pattern.matches("other_forward_out.csv"));
        assert!(!pattern.matches("sample_forward_out.csv.bak"));
        assert!(!pattern.matches("xsample_forward_out.csv"));
    }

    #[test]
    fn stem_is_literal() {
        let pattern = StalePattern::for_stem("run.1+[x]").expect("pattern");
        assert!(pattern.matches("run.1+[x]_forward_out.csv"));
        assert!(!pattern.matches("runa1+[x]_forward_out.csv"));
    }
}
