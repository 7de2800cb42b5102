//! Step and wizard definitions
//!
//! A wizard is an ordered list of steps; the last step is the terminal
//! confirmation screen. Definitions load from TOML, YAML or JSON.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::validation::Rule;

/// Identifier of a step within a wizard
pub type StepId = String;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Errors raised while loading or checking a definition
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("failed to read definition {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported definition format '{0}' (expected toml, yaml, yml or json)")]
    UnsupportedFormat(String),

    #[error("failed to parse definition: {0}")]
    Parse(String),

    #[error("wizard '{0}' has no steps")]
    NoSteps(String),

    #[error("step id '{0}' is used more than once")]
    DuplicateStep(String),

    #[error("field '{field}' appears more than once in step '{step}'")]
    DuplicateField { step: String, field: String },

    #[error("select field '{field}' in step '{step}' has no option source")]
    MissingOptions { step: String, field: String },

    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Kind of input a field renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Select,
    Checkbox,
}

/// Where a select field gets its options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum OptionSource {
    /// GET the endpoint and decode a JSON array of strings
    Remote { endpoint: String },
    /// Fixed list shipped with the definition
    Static { values: Vec<String> },
}

/// One field on a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub options: Option<OptionSource>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            rules: Vec::new(),
            options: None,
            placeholder: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_options(mut self, source: OptionSource) -> Self {
        self.options = Some(source);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Label to display, falling back to the field name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn remote_endpoint(&self) -> Option<&str> {
        match &self.options {
            Some(OptionSource::Remote { endpoint }) => Some(endpoint),
            _ => None,
        }
    }
}

/// One screen of the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check field-level invariants: unique names, selects have a source
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(DefinitionError::DuplicateField {
                    step: self.id.clone(),
                    field: field.name.clone(),
                });
            }
            if field.kind == FieldKind::Select && field.options.is_none() {
                return Err(DefinitionError::MissingOptions {
                    step: self.id.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A complete wizard: steps in order, last one terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardDefinition {
    pub name: String,
    pub steps: Vec<StepDefinition>,
}

impl WizardDefinition {
    /// Load a definition file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self, DefinitionError> {
        let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let definition = Self::parse(&content, &ext)?;
        tracing::debug!(
            path = %path.display(),
            steps = definition.steps.len(),
            "Loaded wizard definition"
        );
        Ok(definition)
    }

    /// Parse definition text in the given format (`toml`, `yaml`/`yml`, `json`)
    pub fn parse(content: &str, format: &str) -> Result<Self, DefinitionError> {
        let raw: Value = match format {
            "toml" => toml::from_str(content).map_err(|e| DefinitionError::Parse(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(content).map_err(|e| DefinitionError::Parse(e.to_string()))?
            }
            "json" => {
                serde_json::from_str(content).map_err(|e| DefinitionError::Parse(e.to_string()))?
            }
            other => return Err(DefinitionError::UnsupportedFormat(other.to_string())),
        };
        check_patterns(&raw)?;

        let definition: WizardDefinition =
            serde_json::from_value(raw).map_err(|e| DefinitionError::Parse(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.steps.is_empty() {
            return Err(DefinitionError::NoSteps(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(DefinitionError::DuplicateStep(step.id.clone()));
            }
            step.validate()?;
        }
        Ok(())
    }

    pub fn step(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_ids(&self) -> Vec<StepId> {
        self.steps.iter().map(|s| s.id.clone()).collect()
    }

    /// The contact / additional-info / confirmation flow
    pub fn builtin(colors_endpoint: &str) -> Result<Self, DefinitionError> {
        let email_pattern = Rule::pattern(EMAIL_PATTERN, "Enter a valid email").map_err(|source| {
            DefinitionError::InvalidPattern {
                field: "email".to_string(),
                source,
            }
        })?;

        let contact = StepDefinition::new("contact", "Contact Details")
            .with_field(
                FieldSpec::new("first_name", FieldKind::Text)
                    .with_label("First Name")
                    .with_rule(Rule::required("First name required"))
                    .with_rule(Rule::max_length(64, "First name too long")),
            )
            .with_field(
                FieldSpec::new("email", FieldKind::Text)
                    .with_label("Email")
                    .with_rule(Rule::required("Email required"))
                    .with_rule(email_pattern),
            );

        let additional_info = StepDefinition::new("additional-info", "Additional Info")
            .with_field(
                FieldSpec::new("color", FieldKind::Select)
                    .with_label("Favorite Color")
                    .with_placeholder("Select Your Favorite Color")
                    .with_options(OptionSource::Remote {
                        endpoint: colors_endpoint.to_string(),
                    })
                    .with_rule(Rule::required("Color required")),
            )
            .with_field(
                FieldSpec::new("terms", FieldKind::Checkbox)
                    .with_label("I agree to Terms and Conditions.")
                    .with_rule(Rule::required("Terms acceptance required")),
            );

        let definition = WizardDefinition {
            name: "signup".to_string(),
            steps: vec![
                contact,
                additional_info,
                StepDefinition::new("confirmation", "Confirmation"),
            ],
        };
        definition.validate()?;
        Ok(definition)
    }
}

/// Compile every `pattern` rule up front so a bad regex names its field
fn check_patterns(raw: &Value) -> Result<(), DefinitionError> {
    let steps = raw.get("steps").and_then(Value::as_array).into_iter().flatten();
    let fields = steps
        .filter_map(|step| step.get("fields").and_then(Value::as_array))
        .flatten();

    for field in fields {
        let name = field.get("name").and_then(Value::as_str).unwrap_or_default();
        let rules = field.get("rules").and_then(Value::as_array).into_iter().flatten();
        for rule in rules.filter(|r| r.get("kind").and_then(Value::as_str) == Some("pattern")) {
            if let Some(source) = rule.get("regex").and_then(Value::as_str) {
                Regex::new(source).map_err(|source| DefinitionError::InvalidPattern {
                    field: name.to_string(),
                    source,
                })?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOML_DEFINITION: &str = r#"
name = "survey"

[[steps]]
id = "favorites"
title = "Favorites"

[[steps.fields]]
name = "color"
kind = "select"
placeholder = "Pick one"
options = { source = "remote", endpoint = "http://localhost:3001/api/colors" }
rules = [{ kind = "required", message = "Color required" }]

[[steps.fields]]
name = "size"
kind = "select"
options = { source = "static", values = ["S", "M", "L"] }

[[steps]]
id = "done"
title = "Done"
"#;

    #[test]
    fn test_builtin_definition_is_valid() {
        let def = WizardDefinition::builtin("http://localhost:3001/api/colors").unwrap();
        assert_eq!(def.step_ids(), vec!["contact", "additional-info", "confirmation"]);

        let info = def.step("additional-info").unwrap();
        let color = info.field("color").unwrap();
        assert_eq!(color.kind, FieldKind::Select);
        assert_eq!(color.remote_endpoint(), Some("http://localhost:3001/api/colors"));
        assert_eq!(color.rules, vec![Rule::required("Color required")]);

        let terms = info.field("terms").unwrap();
        assert_eq!(terms.kind, FieldKind::Checkbox);
        assert_eq!(terms.rules[0].message(), "Terms acceptance required");
    }

    #[test]
    fn test_parse_toml_definition() {
        let def = WizardDefinition::parse(TOML_DEFINITION, "toml").unwrap();
        assert_eq!(def.name, "survey");
        assert_eq!(def.steps.len(), 2);

        let favorites = &def.steps[0];
        assert_eq!(
            favorites.field("size").unwrap().options,
            Some(OptionSource::Static {
                values: vec!["S".to_string(), "M".to_string(), "L".to_string()]
            })
        );
        assert_eq!(favorites.field("size").unwrap().display_label(), "size");
    }

    #[test]
    fn test_parse_yaml_and_json_definitions() {
        let yaml = r"
name: tiny
steps:
  - id: only
    title: Only
    fields:
      - name: nickname
        rules:
          - kind: max_length
            max: 10
            message: Too long
";
        let def = WizardDefinition::parse(yaml, "yml").unwrap();
        assert_eq!(def.steps[0].fields[0].kind, FieldKind::Text);

        let json = serde_json::to_string(&def).unwrap();
        let round = WizardDefinition::parse(&json, "json").unwrap();
        assert_eq!(round, def);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let step = StepDefinition::new("s", "S")
            .with_field(FieldSpec::new("color", FieldKind::Text))
            .with_field(FieldSpec::new("color", FieldKind::Text));
        let err = step.validate().unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateField { ref field, .. } if field == "color"));
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let def = WizardDefinition {
            name: "dup".to_string(),
            steps: vec![StepDefinition::new("a", "A"), StepDefinition::new("a", "A again")],
        };
        assert!(matches!(def.validate(), Err(DefinitionError::DuplicateStep(id)) if id == "a"));
    }

    #[test]
    fn test_select_without_source_rejected() {
        let step = StepDefinition::new("s", "S").with_field(FieldSpec::new("color", FieldKind::Select));
        assert!(matches!(step.validate(), Err(DefinitionError::MissingOptions { .. })));
    }

    #[test]
    fn test_empty_wizard_rejected() {
        let err = WizardDefinition::parse(r#"{"name":"empty","steps":[]}"#, "json").unwrap_err();
        assert!(matches!(err, DefinitionError::NoSteps(_)));
    }

    #[test]
    fn test_invalid_pattern_names_its_field() {
        let json = r#"{"name":"bad","steps":[{"id":"s","title":"S","fields":[
            {"name":"code","rules":[{"kind":"pattern","regex":"(","message":"x"}]}]}]}"#;
        let err = WizardDefinition::parse(json, "json").unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidPattern { ref field, .. } if field == "code"));
    }

    #[test]
    fn test_invalid_pattern_in_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(
            &path,
            r#"
name = "bad"

[[steps]]
id = "s"
title = "S"

[[steps.fields]]
name = "zip"
rules = [{ kind = "pattern", regex = "[0-9", message = "Enter a zip code" }]
"#,
        )
        .unwrap();

        let err = WizardDefinition::load(&path).unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidPattern { ref field, .. } if field == "zip"));
        assert!(err.to_string().contains("'zip'"));
    }

    #[test]
    fn test_malformed_definition_is_a_parse_error() {
        let err = WizardDefinition::parse(r#"{"name": 3}"#, "json").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse(_)));
    }

    #[test]
    fn test_load_from_file_uses_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wizard.toml");
        std::fs::write(&path, TOML_DEFINITION).unwrap();

        let def = WizardDefinition::load(&path).unwrap();
        assert_eq!(def.name, "survey");

        let txt = dir.path().join("wizard.txt");
        std::fs::write(&txt, TOML_DEFINITION).unwrap();
        assert!(matches!(
            WizardDefinition::load(&txt),
            Err(DefinitionError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WizardDefinition::load(Path::new("/nonexistent/wizard.toml")).unwrap_err();
        assert!(matches!(err, DefinitionError::Io { .. }));
    }
}
