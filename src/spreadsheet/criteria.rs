use glob::Pattern;

/// Criteria for selecting sheets and interpreting cells in a workbook.
#[derive(Clone, Debug, Default)]
pub(crate) struct Criteria {
    /// Sheet name patterns for filtering which sheets to process.
    pub(crate) sheet_name_patterns: Option<Vec<Pattern>>,

    /// Convert error cells to empty values instead of keeping their code.
    pub(crate) error_as_null: bool,
}

impl Criteria {
    /// Builds criteria from sheet name glob patterns. An empty list accepts every sheet.
    pub(crate) fn for_sheet_names(names: &[String], error_as_null: bool) -> Result<Self, glob::PatternError> {
        let patterns = names
            .iter()
            .map(|name| Pattern::new(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            sheet_name_patterns: Some(patterns).filter(|patterns| !patterns.is_empty()),
            error_as_null,
        })
    }

    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        if let Some(patterns) = &self.sheet_name_patterns {
            patterns.iter().any(|pattern| pattern.matches(sheet_name))
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_listed_names_only() {
        let names = vec!["ПЛАН_ПРОДАЖ".to_owned(), "ПЛАН ПРОДАЖ*".to_owned()];
        let criteria = Criteria::for_sheet_names(&names, false).unwrap();
        assert!(criteria.accept("ПЛАН_ПРОДАЖ"));
        assert!(criteria.accept("ПЛАН ПРОДАЖ 2024"));
        assert!(!criteria.accept("ПЛАН-ПРОДАЖ"));
        assert!(!criteria.accept("Лист1"));
    }

    #[test]
    fn no_names_accepts_everything() {
        let criteria = Criteria::for_sheet_names(&[], true).unwrap();
        assert!(criteria.accept("Лист1"));
        assert!(criteria.error_as_null);
    }
}
