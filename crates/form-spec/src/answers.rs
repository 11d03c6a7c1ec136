use std::{collections::BTreeMap, fmt};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// A single answer. Signatures are stored as text (typed name or data URI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl AnswerValue {
    /// Converts a raw JSON value; `null` means unanswered.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(AnswerValue::Bool(*flag)),
            Value::Number(num) => Some(AnswerValue::Number(num.clone())),
            Value::String(text) => Some(AnswerValue::Text(text.clone())),
            other => Some(AnswerValue::Text(other.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            AnswerValue::Bool(flag) => Value::Bool(*flag),
            AnswerValue::Number(num) => Value::Number(num.clone()),
            AnswerValue::Text(text) => Value::String(text.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// String form used for condition matching and emptiness checks.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Numeric reading of the answer; numeric text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(num) => num.as_f64(),
            AnswerValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            AnswerValue::Bool(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Truthiness as a checkbox would read it.
    pub fn is_truthy(&self) -> bool {
        match self {
            AnswerValue::Bool(flag) => *flag,
            AnswerValue::Number(num) => num.as_f64().is_some_and(|value| value != 0.0),
            AnswerValue::Text(text) => !text.is_empty(),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Bool(flag) => write!(f, "{}", flag),
            AnswerValue::Number(num) => write_number(f, num),
            AnswerValue::Text(text) => f.write_str(text),
        }
    }
}

/// Floats print in shortest form so `1.0` reads as `1`, matching how
/// condition values are written in catalogs.
fn write_number(f: &mut fmt::Formatter<'_>, num: &Number) -> fmt::Result {
    match num.as_f64() {
        Some(value) if num.is_f64() && value == 0.0 => f.write_str("0"),
        Some(value) if num.is_f64() => write!(f, "{}", value),
        _ => write!(f, "{}", num),
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Number(Number::from(value))
    }
}

/// Field key to answer. Absence means unanswered.
pub type Answers = BTreeMap<String, AnswerValue>;

#[derive(Debug, Error)]
pub enum AnswersError {
    #[error("answers must be a JSON object")]
    NotAnObject,
    #[error("failed to parse answers: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to encode answers as JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("failed to encode answers as CBOR: {0}")]
    Cbor(#[source] serde_cbor::Error),
}

/// Builds an answer store from a JSON object, dropping `null` entries.
pub fn answers_from_value(value: &Value) -> Result<Answers, AnswersError> {
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Answers::new()),
        _ => return Err(AnswersError::NotAnObject),
    };
    Ok(map
        .iter()
        .filter_map(|(key, value)| AnswerValue::from_json(value).map(|answer| (key.clone(), answer)))
        .collect())
}

pub fn parse_answers(json: &str) -> Result<Answers, AnswersError> {
    if json.trim().is_empty() {
        return Ok(Answers::new());
    }
    let value: Value = serde_json::from_str(json).map_err(AnswersError::Parse)?;
    answers_from_value(&value)
}

pub fn answers_to_value(answers: &Answers) -> Value {
    Value::Object(
        answers
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

/// Sanitized answers handed to the document renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub answers: Answers,
}

impl Submission {
    pub fn to_json_pretty(&self) -> Result<String, AnswersError> {
        serde_json::to_string_pretty(self).map_err(AnswersError::Json)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, AnswersError> {
        serde_cbor::to_vec(self).map_err(AnswersError::Cbor)
    }

    /// Request body expected by the render endpoint: `{"data": {...}}`.
    pub fn render_request(&self) -> Value {
        serde_json::json!({ "data": answers_to_value(&self.answers) })
    }
}
