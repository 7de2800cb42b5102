//! Declarative field validation rules
//!
//! Rules are plain data attached to a field. [`validate`] walks them in
//! declaration order and reports the first failure.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::answers::AnswerValue;

/// A compiled regular expression that (de)serializes as its source string
#[derive(Clone)]
pub struct RulePattern(Regex);

impl RulePattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl fmt::Debug for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RulePattern({:?})", self.as_str())
    }
}

impl PartialEq for RulePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for RulePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RulePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        RulePattern::new(&source)
            .map_err(|e| serde::de::Error::custom(format!("invalid pattern '{}': {}", source, e)))
    }
}

/// A single validation rule with its caller-supplied failure message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Value must be present: not null, not blank text, not an unchecked box
    Required { message: String },
    /// Non-empty text must match the pattern
    Pattern { regex: RulePattern, message: String },
    /// Non-empty text must have at least `min` characters
    MinLength { min: usize, message: String },
    /// Text must have at most `max` characters
    MaxLength { max: usize, message: String },
    /// Non-empty text must be one of the listed values
    OneOf { values: Vec<String>, message: String },
}

impl Rule {
    pub fn required(message: impl Into<String>) -> Self {
        Rule::Required {
            message: message.into(),
        }
    }

    pub fn pattern(regex: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Rule::Pattern {
            regex: RulePattern::new(regex)?,
            message: message.into(),
        })
    }

    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Rule::MinLength {
            min,
            message: message.into(),
        }
    }

    pub fn max_length(max: usize, message: impl Into<String>) -> Self {
        Rule::MaxLength {
            max,
            message: message.into(),
        }
    }

    pub fn one_of(values: Vec<String>, message: impl Into<String>) -> Self {
        Rule::OneOf {
            values,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Rule::Required { message }
            | Rule::Pattern { message, .. }
            | Rule::MinLength { message, .. }
            | Rule::MaxLength { message, .. }
            | Rule::OneOf { message, .. } => message,
        }
    }

    /// Whether `value` satisfies this rule.
    ///
    /// Only `Required` rejects a missing value; the text rules pass on
    /// null or empty input so optional fields stay optional.
    pub fn accepts(&self, value: &AnswerValue) -> bool {
        let text = match value {
            AnswerValue::Text(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        };

        match self {
            Rule::Required { .. } => !value.is_blank(),
            Rule::Pattern { regex, .. } => text.map_or(true, |t| regex.is_match(t)),
            Rule::MinLength { min, .. } => text.map_or(true, |t| t.chars().count() >= *min),
            Rule::MaxLength { max, .. } => text.map_or(true, |t| t.chars().count() <= *max),
            Rule::OneOf { values, .. } => text.map_or(true, |t| values.iter().any(|v| v == t)),
        }
    }
}

/// Outcome of validating one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub field_name: String,
    pub is_valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Evaluate `rules` against `value`; the first failing rule's message wins
pub fn validate(field_name: &str, value: &AnswerValue, rules: &[Rule]) -> ValidationResult {
    match rules.iter().find(|rule| !rule.accepts(value)) {
        Some(rule) => ValidationResult::invalid(field_name, rule.message()),
        None => ValidationResult::valid(field_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_rules() -> Vec<Rule> {
        vec![
            Rule::required("Email required"),
            Rule::pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$", "Enter a valid email").unwrap(),
            Rule::max_length(20, "Email too long"),
        ]
    }

    #[test]
    fn test_required_rejects_blank_values() {
        let rules = vec![Rule::required("Color required")];

        for value in [
            AnswerValue::Null,
            AnswerValue::from(""),
            AnswerValue::from("  "),
            AnswerValue::Bool(false),
        ] {
            let result = validate("color", &value, &rules);
            assert!(!result.is_valid, "{:?} should fail", value);
            assert_eq!(result.message.as_deref(), Some("Color required"));
            assert_eq!(result.field_name, "color");
        }
    }

    #[test]
    fn test_required_accepts_checked_box_and_text() {
        let rules = vec![Rule::required("Terms acceptance required")];
        assert!(validate("terms", &AnswerValue::Bool(true), &rules).is_valid);
        assert!(validate("color", &AnswerValue::from("blue"), &rules).is_valid);
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let rules = email_rules();

        let missing = validate("email", &AnswerValue::Null, &rules);
        assert_eq!(missing.message.as_deref(), Some("Email required"));

        let malformed = validate("email", &AnswerValue::from("not-an-email-address-at-all"), &rules);
        assert_eq!(malformed.message.as_deref(), Some("Enter a valid email"));

        let long = validate("email", &AnswerValue::from("someone@example-domain.com"), &rules);
        assert_eq!(long.message.as_deref(), Some("Email too long"));

        assert!(validate("email", &AnswerValue::from("a@b.io"), &rules).is_valid);
    }

    #[test]
    fn test_text_rules_skip_empty_optional_values() {
        let rules = vec![
            Rule::pattern(r"^\d+$", "Digits only").unwrap(),
            Rule::min_length(3, "Too short"),
            Rule::one_of(vec!["123".to_string()], "Unknown code"),
        ];
        assert!(validate("code", &AnswerValue::Null, &rules).is_valid);
        assert!(validate("code", &AnswerValue::from(""), &rules).is_valid);
        assert!(!validate("code", &AnswerValue::from("12"), &rules).is_valid);
        assert!(!validate("code", &AnswerValue::from("124"), &rules).is_valid);
        assert!(validate("code", &AnswerValue::from("123"), &rules).is_valid);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let rules = vec![Rule::max_length(3, "Too long")];
        assert!(validate("name", &AnswerValue::from("äöü"), &rules).is_valid);
        assert!(!validate("name", &AnswerValue::from("äöüß"), &rules).is_valid);
    }

    #[test]
    fn test_validate_is_deterministic() {
        let rules = email_rules();
        let value = AnswerValue::from("bad@");
        let first = validate("email", &value, &rules);
        for _ in 0..10 {
            assert_eq!(validate("email", &value, &rules), first);
        }
    }

    #[test]
    fn test_empty_rule_set_always_passes() {
        assert!(validate("anything", &AnswerValue::Null, &[]).is_valid);
    }

    #[test]
    fn test_rules_deserialize_from_tagged_toml() {
        #[derive(Deserialize)]
        struct Holder {
            rules: Vec<Rule>,
        }

        let holder: Holder = toml::from_str(
            r#"
            [[rules]]
            kind = "required"
            message = "Color required"

            [[rules]]
            kind = "pattern"
            regex = "^[a-z]+$"
            message = "Lowercase only"
            "#,
        )
        .unwrap();

        assert_eq!(holder.rules.len(), 2);
        assert_eq!(holder.rules[0], Rule::required("Color required"));
        assert_eq!(holder.rules[1].message(), "Lowercase only");
    }

    #[test]
    fn test_invalid_pattern_rejected_on_deserialize() {
        let err = serde_json::from_str::<Rule>(
            r#"{"kind":"pattern","regex":"([unclosed","message":"x"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }
}
