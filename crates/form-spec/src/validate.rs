use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerValue, Answers};
use crate::spec::{Catalog, Field, FieldType, RuleKind, RuleValue, ValidationRule};

pub const REQUIRED_MESSAGE: &str = "An answer is required to continue.";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

/// Whether the stored answer lets the wizard move past `field`.
pub fn answer_is_valid(field: &Field, answer: Option<&AnswerValue>) -> bool {
    answer_error(field, answer).is_none()
}

/// Message explaining why `answer` does not satisfy `field`, if it doesn't.
///
/// Checkbox fields pass the `required` flag even when unticked: an unticked
/// box is a legitimate "no". Explicit `validations` run after the flag, and
/// only against answers that are present and non-blank unless the rule is
/// `required` itself.
pub fn answer_error(field: &Field, answer: Option<&AnswerValue>) -> Option<String> {
    if field.required && !satisfies_required_flag(field, answer) {
        return Some(REQUIRED_MESSAGE.to_string());
    }

    let present = answer.filter(|value| !value.to_text().trim().is_empty());
    for rule in &field.validations {
        let broken = match (rule.kind, present) {
            (RuleKind::Required, _) => !present.is_some_and(AnswerValue::is_truthy),
            (_, None) => false,
            (_, Some(value)) => breaks_rule(rule, value),
        };
        if broken {
            return Some(rule.message.clone().unwrap_or_else(|| default_message(rule)));
        }
    }

    let value = present?;
    match field.kind {
        FieldType::Email if !email_regex().is_match(&value.to_text()) => {
            Some("Enter a valid email address.".to_string())
        }
        FieldType::Number if value.as_f64().is_none() => Some("Enter a number.".to_string()),
        _ => None,
    }
}

fn satisfies_required_flag(field: &Field, answer: Option<&AnswerValue>) -> bool {
    match field.kind {
        FieldType::Checkbox => true,
        FieldType::Signature => answer
            .and_then(AnswerValue::as_str)
            .is_some_and(|text| !text.trim().is_empty()),
        _ => answer.is_some_and(|value| !value.to_text().trim().is_empty()),
    }
}

fn breaks_rule(rule: &ValidationRule, value: &AnswerValue) -> bool {
    let bound = rule.value.as_ref();
    match rule.kind {
        RuleKind::Required => false,
        RuleKind::MinLength => value
            .as_str()
            .zip(bound.and_then(RuleValue::as_f64))
            .is_some_and(|(text, min)| (text.chars().count() as f64) < min),
        RuleKind::MaxLength => value
            .as_str()
            .zip(bound.and_then(RuleValue::as_f64))
            .is_some_and(|(text, max)| (text.chars().count() as f64) > max),
        RuleKind::Pattern => {
            if let Some(text) = value.as_str()
                && let Some(pattern) = bound.and_then(RuleValue::as_str)
                && let Ok(regex) = Regex::new(pattern)
            {
                !regex.is_match(text)
            } else {
                false
            }
        }
        RuleKind::Min => value
            .as_f64()
            .zip(bound.and_then(RuleValue::as_f64))
            .is_some_and(|(number, min)| number < min),
        RuleKind::Max => value
            .as_f64()
            .zip(bound.and_then(RuleValue::as_f64))
            .is_some_and(|(number, max)| number > max),
        RuleKind::Email => value
            .as_str()
            .is_some_and(|text| !email_regex().is_match(text)),
    }
}

fn default_message(rule: &ValidationRule) -> String {
    let bound = rule
        .value
        .as_ref()
        .map(|value| match value {
            RuleValue::Number(number) => number.to_string(),
            RuleValue::Text(text) => text.clone(),
        })
        .unwrap_or_default();
    match rule.kind {
        RuleKind::Required => REQUIRED_MESSAGE.to_string(),
        RuleKind::MinLength => format!("Enter at least {} characters.", bound),
        RuleKind::MaxLength => format!("Enter at most {} characters.", bound),
        RuleKind::Pattern => "The answer is not in the expected format.".to_string(),
        RuleKind::Min => format!("Enter a value of at least {}.", bound),
        RuleKind::Max => format!("Enter a value of at most {}.", bound),
        RuleKind::Email => "Enter a valid email address.".to_string(),
    }
}

pub fn field_is_answered(field: &Field, answers: &Answers) -> bool {
    answer_is_valid(field, answers.get(&field.key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintIssue {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LintReport {
    pub valid: bool,
    pub issues: Vec<LintIssue>,
}

impl LintReport {
    pub fn errors(&self) -> impl Iterator<Item = &LintIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LintIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }
}

/// Static checks over a catalog before it is handed to the wizard.
pub fn lint_catalog(catalog: &Catalog) -> LintReport {
    let mut issues = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let positions: HashMap<&str, usize> = catalog.positions();

    for (index, field) in catalog.fields.iter().enumerate() {
        if field.key.trim().is_empty() {
            issues.push(issue(Severity::Error, field, "field key is empty", "empty_key"));
            continue;
        }
        if !seen.insert(field.key.as_str()) {
            issues.push(issue(
                Severity::Error,
                field,
                "duplicate field key",
                "duplicate_key",
            ));
        }
        if field.label.trim().is_empty() {
            issues.push(issue(
                Severity::Warning,
                field,
                "field has no label",
                "missing_label",
            ));
        }

        match field.kind {
            FieldType::Radio if field.options.is_empty() => {
                issues.push(issue(
                    Severity::Error,
                    field,
                    "radio field has no options",
                    "missing_options",
                ));
            }
            FieldType::Radio => {}
            _ if !field.options.is_empty() => {
                issues.push(issue(
                    Severity::Warning,
                    field,
                    "options are only used by radio fields",
                    "unused_options",
                ));
            }
            _ => {}
        }

        lint_rules(field, &mut issues);

        for (dependency, allowed) in &field.visible_when {
            match positions.get(dependency.as_str()) {
                None => issues.push(issue(
                    Severity::Error,
                    field,
                    &format!("condition references unknown field '{}'", dependency),
                    "unknown_dependency",
                )),
                Some(position) if *position == index => issues.push(issue(
                    Severity::Error,
                    field,
                    "condition references the field itself",
                    "self_dependency",
                )),
                Some(position) if *position > index => issues.push(issue(
                    Severity::Error,
                    field,
                    &format!("condition references later field '{}'", dependency),
                    "forward_dependency",
                )),
                Some(position) => {
                    if allowed.is_empty() {
                        issues.push(issue(
                            Severity::Warning,
                            field,
                            &format!("condition on '{}' allows no values", dependency),
                            "empty_condition",
                        ));
                    }
                    lint_allowed_values(&catalog.fields[*position], field, allowed, &mut issues);
                }
            }
        }
    }

    let valid = !issues.iter().any(|issue| issue.severity == Severity::Error);
    LintReport { valid, issues }
}

fn lint_rules(field: &Field, issues: &mut Vec<LintIssue>) {
    for rule in &field.validations {
        let value = rule.value.as_ref();
        match rule.kind {
            RuleKind::Pattern => match value.and_then(RuleValue::as_str) {
                None => issues.push(issue(
                    Severity::Error,
                    field,
                    "pattern rule needs a string value",
                    "missing_rule_value",
                )),
                Some(pattern) => {
                    if let Err(err) = Regex::new(pattern) {
                        issues.push(issue(
                            Severity::Error,
                            field,
                            &format!("invalid pattern '{}': {}", pattern, err),
                            "invalid_pattern",
                        ));
                    }
                }
            },
            kind if kind.takes_value() && value.and_then(RuleValue::as_f64).is_none() => {
                issues.push(issue(
                    Severity::Error,
                    field,
                    &format!("{} rule needs a numeric value", kind.as_str()),
                    "missing_rule_value",
                ));
            }
            _ => {}
        }
    }
}

fn lint_allowed_values(
    dependency: &Field,
    field: &Field,
    allowed: &BTreeSet<String>,
    issues: &mut Vec<LintIssue>,
) {
    let unreachable: Vec<&str> = match dependency.kind {
        FieldType::Radio => allowed
            .iter()
            .filter(|value| dependency.option(value).is_none())
            .map(String::as_str)
            .collect(),
        FieldType::Checkbox => allowed
            .iter()
            .filter(|value| value.as_str() != "true" && value.as_str() != "false")
            .map(String::as_str)
            .collect(),
        _ => Vec::new(),
    };
    if !unreachable.is_empty() {
        issues.push(issue(
            Severity::Warning,
            field,
            &format!(
                "condition on '{}' lists values it can never take: {}",
                dependency.key,
                unreachable.join(", ")
            ),
            "unreachable_value",
        ));
    }
}

fn issue(severity: Severity, field: &Field, message: &str, code: &str) -> LintIssue {
    LintIssue {
        severity,
        key: if field.key.is_empty() {
            None
        } else {
            Some(field.key.clone())
        },
        message: message.into(),
        code: code.into(),
    }
}
