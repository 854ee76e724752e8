//! Cell text normalization and scalar inference.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid space pattern"));
static DIGIT_GROUP_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\s+(\d)").expect("valid digit pattern"));

const TRUE_WORDS: [&str; 3] = ["да", "yes", "true"];
const FALSE_WORDS: [&str; 3] = ["нет", "no", "false"];

/// A typed cell value as written to the output records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Canonical form of a header or block cell: line breaks become spaces,
/// space runs collapse to one and the result is trimmed.
pub fn normalize(cell: Option<&str>) -> Option<String> {
    cell.map(|text| {
        let text = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
        SPACE_RUNS.replace_all(&text, " ").trim().to_owned()
    })
}

/// Removes thousands separators written as spaces between digits.
fn strip_digit_spaces(text: &str) -> String {
    let mut cleaned = text.trim().to_owned();
    // Overlapping groups such as "1 2 3" need a second pass
    while DIGIT_GROUP_SPACES.is_match(&cleaned) {
        cleaned = DIGIT_GROUP_SPACES.replace_all(&cleaned, "$1$2").into_owned();
    }
    cleaned
}

/// Reports whether the text reads as a number once digit-group spaces are removed.
pub fn looks_numeric(text: &str) -> bool {
    strip_digit_spaces(text).parse::<f64>().is_ok()
}

/// Infers the typed value of a data cell.
pub fn infer_scalar(text: Option<&str>) -> Scalar {
    let trimmed = match text.map(str::trim) {
        None | Some("") => return Scalar::Null,
        Some(trimmed) => trimmed,
    };

    let lowered = trimmed.to_lowercase();
    if TRUE_WORDS.contains(&lowered.as_str()) {
        return Scalar::Boolean(true);
    }
    if FALSE_WORDS.contains(&lowered.as_str()) {
        return Scalar::Boolean(false);
    }

    if looks_numeric(trimmed) {
        let cleaned = strip_digit_spaces(trimmed);
        let number = if cleaned.contains('.') {
            cleaned.parse::<f64>().ok().map(Scalar::Float)
        } else {
            cleaned.parse::<i64>().ok().map(Scalar::Integer)
        };
        if let Some(number) = number {
            return number;
        }
    }
    Scalar::String(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize(Some("  Клиент \n")), Some("Клиент".to_owned()));
        assert_eq!(normalize(Some("НАТУРАЛЬНЫЕ\nПОКАЗАТЕЛИ,   ктк")), Some("НАТУРАЛЬНЫЕ ПОКАЗАТЕЛИ, ктк".to_owned()));
        assert_eq!(normalize(Some("a\r\nb")), Some("a b".to_owned()));
        assert_eq!(normalize(Some("   ")), Some(String::new()));
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn numeric_detection() {
        assert!(looks_numeric("1234"));
        assert!(looks_numeric(" 1 234 567 "));
        assert!(looks_numeric("-12.5"));
        assert!(looks_numeric("1e5"));
        assert!(!looks_numeric("12 abc"));
        assert!(!looks_numeric("ABC"));
        assert!(!looks_numeric(""));
    }

    #[test]
    fn scalar_inference() {
        assert_eq!(infer_scalar(Some("1234")), Scalar::Integer(1234));
        assert_eq!(infer_scalar(Some("12.5")), Scalar::Float(12.5));
        assert_eq!(infer_scalar(Some("да")), Scalar::Boolean(true));
        assert_eq!(infer_scalar(Some("НЕТ")), Scalar::Boolean(false));
        assert_eq!(infer_scalar(Some("  ")), Scalar::Null);
        assert_eq!(infer_scalar(None), Scalar::Null);
        assert_eq!(infer_scalar(Some(" ABC ")), Scalar::String("ABC".to_owned()));
        assert_eq!(infer_scalar(Some("1 234")), Scalar::Integer(1234));
    }

    #[test]
    fn unconvertible_numbers_stay_text() {
        assert_eq!(infer_scalar(Some("1e5")), Scalar::String("1e5".to_owned()));
        assert_eq!(infer_scalar(Some("99999999999999999999")), Scalar::String("99999999999999999999".to_owned()));
        assert_eq!(infer_scalar(Some("inf")), Scalar::String("inf".to_owned()));
    }

    #[test]
    fn scalars_serialize_untagged() {
        let values = vec![Scalar::Null, Scalar::Boolean(true), Scalar::Integer(3), Scalar::Float(1.5), Scalar::String("x".to_owned())];
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[null,true,3,1.5,"x"]"#);
    }
}
