//! Category keyword table used by the categorizer's keyword pass.
//!
//! The file is line-oriented, one category per line:
//!
//! ```text
//! # comment
//! Dairy=piens,siers,jogurts
//! Bakery=maize,bulciņa
//! ```
//!
//! Line order is significant: the first category with a matching keyword wins.

use std::collections::HashSet;
use std::path::Path;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub category: String,
    /// Lowercase substrings.
    pub keywords: Vec<String>,
}

/// Ordered `category -> keywords` table, loaded once per categorize run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
}

impl KeywordTable {
    #[must_use]
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the first category whose keyword list has a substring match in
    /// `name` (compared lowercase).
    #[must_use]
    pub fn match_category(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw.as_str())))
            .map(|rule| rule.category.as_str())
    }
}

/// Load and validate the keyword table from a file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or a line is invalid.
pub fn load_keyword_table(path: &Path) -> Result<KeywordTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_keyword_table(&content)
}

/// Parse keyword table text.
///
/// # Errors
///
/// Returns [`ConfigError::KeywordLine`] for a line without `=`, an empty
/// category name, or a category that was already defined.
pub fn parse_keyword_table(content: &str) -> Result<KeywordTable, ConfigError> {
    let mut rules = Vec::new();
    let mut seen = HashSet::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((category, keywords)) = line.split_once('=') else {
            return Err(ConfigError::KeywordLine {
                line: line_no,
                reason: "expected `category=kw1,kw2,...`".to_string(),
            });
        };

        let category = category.trim();
        if category.is_empty() {
            return Err(ConfigError::KeywordLine {
                line: line_no,
                reason: "category name must be non-empty".to_string(),
            });
        }
        if !seen.insert(category.to_lowercase()) {
            return Err(ConfigError::KeywordLine {
                line: line_no,
                reason: format!("duplicate category '{category}'"),
            });
        }

        let keywords = keywords
            .split(',')
            .map(|kw| kw.trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .collect();

        rules.push(KeywordRule {
            category: category.to_string(),
            keywords,
        });
    }

    Ok(KeywordTable { rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_categories_in_file_order() {
        let table = parse_keyword_table("Dairy=piens,siers\nBakery=maize\n").unwrap();
        let categories: Vec<_> = table.rules().iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["Dairy", "Bakery"]);
        assert_eq!(table.rules()[0].keywords, vec!["piens", "siers"]);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let table = parse_keyword_table("# header\n\nDairy=piens\n   \n").unwrap();
        assert_eq!(table.rules().len(), 1);
    }

    #[test]
    fn lowercases_and_trims_keywords_and_drops_empty_ones() {
        let table = parse_keyword_table("Dairy = Piens , ,SIERS,").unwrap();
        assert_eq!(table.rules()[0].category, "Dairy");
        assert_eq!(table.rules()[0].keywords, vec!["piens", "siers"]);
    }

    #[test]
    fn rejects_line_without_separator() {
        let err = parse_keyword_table("Dairy=piens\nBakery maize").unwrap_err();
        assert!(matches!(err, ConfigError::KeywordLine { line: 2, .. }), "got {err:?}");
    }

    #[test]
    fn rejects_empty_category() {
        let err = parse_keyword_table("=piens").unwrap_err();
        assert!(matches!(err, ConfigError::KeywordLine { line: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_category_case_insensitively() {
        let err = parse_keyword_table("Dairy=piens\ndairy=siers").unwrap_err();
        assert!(
            matches!(err, ConfigError::KeywordLine { line: 2, ref reason } if reason.contains("duplicate")),
            "got {err:?}"
        );
    }

    #[test]
    fn match_category_uses_substring_and_table_order() {
        let table = parse_keyword_table("Dairy=piens\nDrinks=piens,sula").unwrap();
        assert_eq!(table.match_category("Svaigs Piens 2.5%"), Some("Dairy"));
        assert_eq!(table.match_category("Ābolu SULA"), Some("Drinks"));
        assert_eq!(table.match_category("Maize"), None);
    }

    #[test]
    fn match_category_is_deterministic() {
        let table = parse_keyword_table("Dairy=piens,siers").unwrap();
        let first = table.match_category("Kausētais siers");
        let second = table.match_category("Kausētais siers");
        assert_eq!(first, second);
        assert_eq!(first, Some("Dairy"));
    }

    #[test]
    fn load_keyword_table_reports_missing_file() {
        let err = load_keyword_table(Path::new("/nonexistent/keywords.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::KeywordFileIo { .. }));
    }
}
