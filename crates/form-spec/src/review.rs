//! Display rows for the review screen shown before a submission is rendered.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::answers::{AnswerValue, Answers};
use crate::spec::{Catalog, Field, FieldType};

const DEFAULT_NOT_PROVIDED: &str = "Not provided";
const BULLET: char = '\u{2022}';

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("failed to parse review config: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid key pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// How a masked value is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStyle {
    /// `•••-••-1234`
    Ssn,
    /// `••-•••1234`
    Ein,
    /// `••••1234`
    Last4,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRule {
    pub keys: Vec<String>,
    pub style: MaskStyle,
}

/// Per-template review settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Glob patterns of keys never shown, on top of `routing: true` fields.
    #[serde(default)]
    pub hidden_keys: Vec<String>,
    #[serde(default)]
    pub mask: Vec<MaskRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_provided: Option<String>,
}

impl ReviewConfig {
    pub fn from_json(json: &str) -> Result<Self, ReviewError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(ReviewError::Parse)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub key: String,
    pub label: String,
    pub value: String,
    /// `value` holds a signature image data URI.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub signature_image: bool,
}

fn compile(patterns: &[String]) -> Result<GlobSet, ReviewError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ReviewError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ReviewError::Pattern {
        pattern: patterns.join(","),
        source,
    })
}

/// Rows for every answered, non-routing field in catalog order.
pub fn build_review(
    catalog: &Catalog,
    answers: &Answers,
    config: &ReviewConfig,
) -> Result<Vec<ReviewRow>, ReviewError> {
    let hidden = compile(&config.hidden_keys)?;
    let masks = config
        .mask
        .iter()
        .map(|rule| compile(&rule.keys).map(|set| (set, rule.style)))
        .collect::<Result<Vec<_>, _>>()?;
    let not_provided = config.not_provided.as_deref().unwrap_or(DEFAULT_NOT_PROVIDED);

    let rows = catalog
        .fields
        .iter()
        .filter(|field| !field.routing && !hidden.is_match(&field.key))
        .filter_map(|field| {
            let answer = answers.get(&field.key)?;
            let mask = masks
                .iter()
                .find(|(set, _)| set.is_match(&field.key))
                .map(|(_, style)| *style);
            let (value, signature_image) = format_value(field, answer, mask, not_provided);
            Some(ReviewRow {
                key: field.key.clone(),
                label: field.display_label().to_string(),
                value,
                signature_image,
            })
        })
        .collect();
    Ok(rows)
}

fn format_value(
    field: &Field,
    answer: &AnswerValue,
    mask: Option<MaskStyle>,
    not_provided: &str,
) -> (String, bool) {
    let text = answer.to_text();
    if text.is_empty() {
        return (not_provided.to_string(), false);
    }
    match field.kind {
        FieldType::Radio => {
            let label = field
                .option(&text)
                .map(|option| option.display_label().to_string())
                .unwrap_or(text);
            (label, false)
        }
        FieldType::Checkbox => {
            let label = if answer.is_truthy() { "Yes" } else { "No" };
            (label.to_string(), false)
        }
        FieldType::Signature => {
            if text.starts_with("data:image") {
                (text, true)
            } else if text.trim().is_empty() {
                ("Not signed".to_string(), false)
            } else {
                (format!("Signed: {}", text), false)
            }
        }
        _ => match mask {
            Some(style) => (mask_value(&text, style), false),
            None => (text, false),
        },
    }
}

/// Masks all but the last four digits.
pub fn mask_value(raw: &str, style: MaskStyle) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return BULLET.to_string().repeat(4);
    }
    let last4 = &digits[digits.len() - 4..];
    let prefix = match style {
        MaskStyle::Ssn => format!("{b}{b}{b}-{b}{b}-", b = BULLET),
        MaskStyle::Ein => format!("{b}{b}-{b}{b}{b}", b = BULLET),
        MaskStyle::Last4 => BULLET.to_string().repeat(4),
    };
    format!("{}{}", prefix, last4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_keep_last_four_digits() {
        assert_eq!(mask_value("123-45-6789", MaskStyle::Ssn), "•••-••-6789");
        assert_eq!(mask_value("12-3456789", MaskStyle::Ein), "••-•••6789");
        assert_eq!(mask_value("98765", MaskStyle::Last4), "••••8765");
        assert_eq!(mask_value("12", MaskStyle::Ssn), "••••");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let config = ReviewConfig {
            hidden_keys: vec!["[".into()],
            ..ReviewConfig::default()
        };
        let result = build_review(&Catalog::new(Vec::new()), &Answers::new(), &config);
        assert!(matches!(result, Err(ReviewError::Pattern { .. })));
    }
}
