use std::fmt::Write;

use form_spec::{ReviewRow, Submission};
use serde_json::Value;

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, visible fields, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts, status and the final summary.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, view: &WizardView) {
        if self.header_printed {
            return;
        }
        if let Some(title) = &view.title {
            println!("Form: {}", title);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, view: &WizardView) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{})",
                view.status.as_str(),
                (view.index + 1).min(view.visible_count),
                view.visible_count
            );
            println!("Visible fields: {}", view.visible_keys.join(", "));
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.label);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(help) = &prompt.help_text {
            println!("{}", help);
        }
        for (position, option) in prompt.options.iter().enumerate() {
            println!("  {}) {}", position + 1, option.label);
        }
        if let Some(current) = &prompt.current_value {
            println!("Current answer: {} (press enter to keep)", current);
        }
    }

    pub fn show_blocked(&self, message: Option<&str>) {
        eprintln!("{}", message.unwrap_or("An answer is required before continuing."));
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_review(&self, rows: &[ReviewRow]) {
        println!("Review:");
        for row in rows {
            if row.signature_image {
                println!("  {}: [signature image]", row.label);
            } else {
                println!("  {}: {}", row.label, row.value);
            }
        }
    }

    pub fn show_completion(&self, submission: &Submission) {
        println!("Done ✅");
        match submission.to_cbor() {
            Ok(bytes) => {
                println!("Submission (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize submission to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match submission.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize submission to JSON: {}", err);
                }
            }
        }
    }
}

/// Session status as reported by the component.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    InProgress,
    Complete,
}

impl ViewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewStatus::InProgress => "in_progress",
            ViewStatus::Complete => "complete",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "complete" => ViewStatus::Complete,
            _ => ViewStatus::InProgress,
        }
    }
}

/// View extracted from the component output.
pub struct WizardView {
    pub title: Option<String>,
    pub status: ViewStatus,
    pub index: usize,
    pub visible_count: usize,
    pub visible_keys: Vec<String>,
    pub current_field: Option<WizardField>,
}

impl WizardView {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let title = json
            .get("title")
            .and_then(Value::as_str)
            .map(String::from);
        let status = ViewStatus::from_label(
            json.get("status")
                .and_then(Value::as_str)
                .unwrap_or("in_progress"),
        );
        let index = json.get("index").and_then(Value::as_u64).unwrap_or(0) as usize;
        let visible_count = json
            .get("visible_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| "wizard view missing visible_count".to_string())?
            as usize;
        let visible_keys = json
            .get("visible_keys")
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let current_field = match json.get("current_field") {
            Some(Value::Null) | None => None,
            Some(field) => Some(WizardField::from_json(field)?),
        };
        Ok(Self {
            title,
            status,
            index,
            visible_count,
            visible_keys,
            current_field,
        })
    }
}

pub struct PromptOption {
    pub value: String,
    pub label: String,
}

/// Minimal view of a field used for prompting.
pub struct WizardField {
    pub key: String,
    pub label: String,
    pub help_text: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<PromptOption>,
    pub current_value: Option<Value>,
}

impl WizardField {
    fn from_json(value: &Value) -> Result<Self, String> {
        let key = value
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| "field missing key".to_string())?
            .to_string();
        let label = value
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(&key)
            .to_string();
        let help_text = value
            .get("helpText")
            .and_then(Value::as_str)
            .map(String::from);
        let kind = FieldKind::from_label(value.get("type").and_then(Value::as_str).unwrap_or("text"));
        let required = value
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let options = value
            .get("options")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| {
                        let value = option.get("value").and_then(Value::as_str)?;
                        let label = option.get("label").and_then(Value::as_str).unwrap_or(value);
                        Some(PromptOption {
                            value: value.to_string(),
                            label: label.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        let current_value = value.get("current_value").cloned();
        Ok(Self {
            key,
            label,
            help_text,
            kind,
            required,
            options,
            current_value,
        })
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub help_text: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub options: Vec<PromptOption>,
    pub current_value: Option<String>,
}

impl PromptContext {
    pub fn new(field: &WizardField, view: &WizardView) -> Self {
        Self {
            index: view.index + 1,
            total: view.visible_count,
            label: field.label.clone(),
            help_text: field.help_text.clone(),
            required: field.required,
            hint: field.kind.hint(),
            options: field
                .options
                .iter()
                .map(|option| PromptOption {
                    value: option.value.clone(),
                    label: option.label.clone(),
                })
                .collect(),
            current_value: field.current_value.as_ref().map(value_to_display),
        }
    }
}

/// Field kinds the prompt distinguishes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Radio,
    Checkbox,
    Signature,
    Number,
}

impl FieldKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            "radio" => FieldKind::Radio,
            "checkbox" => FieldKind::Checkbox,
            "signature" => FieldKind::Signature,
            "number" => FieldKind::Number,
            _ => FieldKind::Text,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            FieldKind::Radio => Some("(number or value)".to_string()),
            FieldKind::Checkbox => Some("(yes/no)".to_string()),
            FieldKind::Signature => Some("(type your full name)".to_string()),
            FieldKind::Number => Some("(number)".to_string()),
            FieldKind::Text => None,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        other => other.to_string(),
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}
