use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Supported field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Radio,
    Checkbox,
    Signature,
    Textarea,
    Email,
    Number,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Signature => "signature",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Date => "date",
        }
    }
}

/// One choice of a radio field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl FieldOption {
    /// Label shown to the user, falling back to the raw value.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.value
        } else {
            &self.label
        }
    }
}

/// Kind of a per-field validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Pattern,
    Min,
    Max,
    Email,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::MinLength => "minLength",
            RuleKind::MaxLength => "maxLength",
            RuleKind::Pattern => "pattern",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::Email => "email",
        }
    }

    /// Whether the rule needs a `value` to mean anything.
    pub fn takes_value(&self) -> bool {
        !matches!(self, RuleKind::Required | RuleKind::Email)
    }
}

/// Bound or pattern attached to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Text(String),
}

impl RuleValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RuleValue::Number(value) => Some(*value),
            RuleValue::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuleValue::Text(text) => Some(text),
            RuleValue::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleValue>,
    /// Shown when the rule fails; a generic message is used otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, value: Option<RuleValue>) -> Self {
        Self {
            kind,
            value,
            message: None,
        }
    }
}

/// Visibility conditions: prerequisite key mapped to the allowed answer strings.
pub type VisibleWhen = BTreeMap<String, BTreeSet<String>>;

/// A single schema-defined question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(
        default,
        rename = "helpText",
        alias = "help_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(
        default,
        alias = "visibleWhen",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub visible_when: VisibleWhen,
    /// Answer only steers the flow; hidden from review summaries.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub routing: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,
}

impl Field {
    pub fn new(key: impl Into<String>, kind: FieldType) -> Self {
        Self {
            key: key.into(),
            kind,
            label: String::new(),
            help_text: None,
            placeholder: None,
            required: false,
            options: Vec::new(),
            visible_when: VisibleWhen::new(),
            routing: false,
            validations: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_options<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = values
            .into_iter()
            .map(|value| {
                let value = value.into();
                FieldOption {
                    label: value.clone(),
                    value,
                }
            })
            .collect();
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validations.push(rule);
        self
    }

    /// Adds a condition: this field shows only when `dep` is one of `allowed`.
    pub fn visible_when<I, S>(mut self, dep: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visible_when
            .insert(dep.into(), allowed.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_conditional(&self) -> bool {
        !self.visible_when.is_empty()
    }

    pub fn option(&self, value: &str) -> Option<&FieldOption> {
        self.options.iter().find(|option| option.value == value)
    }

    /// Label shown to the user, falling back to the key.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}
