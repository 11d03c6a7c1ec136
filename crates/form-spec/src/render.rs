use serde_json::{Map, Value, json};

use crate::{
    answers::AnswerValue,
    session::{SessionStatus, Wizard},
    spec::{FieldOption, FieldType},
};

/// Describes the question under the cursor.
#[derive(Debug, Clone)]
pub struct ViewField {
    pub key: String,
    pub label: String,
    pub help_text: Option<String>,
    pub placeholder: Option<String>,
    pub kind: FieldType,
    pub required: bool,
    pub options: Vec<FieldOption>,
    pub current_value: Option<AnswerValue>,
}

/// Observable wizard state that front ends render from.
#[derive(Debug, Clone)]
pub struct WizardView {
    pub template_id: Option<String>,
    pub title: Option<String>,
    pub status: SessionStatus,
    pub index: usize,
    pub visible_count: usize,
    pub progress_fraction: f64,
    pub can_proceed: bool,
    /// Set when `can_proceed` is false.
    pub validation_message: Option<String>,
    pub is_last: bool,
    pub current_field: Option<ViewField>,
    pub visible_keys: Vec<String>,
}

pub fn build_view(wizard: &Wizard<'_>) -> WizardView {
    let catalog = wizard.catalog();
    let visible = wizard.visible();
    let visible_count = visible.len();
    let index = wizard.current_index();

    let status = if visible_count == 0 {
        SessionStatus::Complete
    } else {
        wizard.status()
    };
    let progress_fraction = if visible_count == 0 {
        1.0
    } else {
        (index + 1) as f64 / visible_count as f64
    };

    let current_field = visible.get(index).map(|field| ViewField {
        key: field.key.clone(),
        label: field.display_label().to_string(),
        help_text: field.help_text.clone(),
        placeholder: field.placeholder.clone(),
        kind: field.kind,
        required: field.required,
        options: field.options.clone(),
        current_value: wizard.answers().get(&field.key).cloned(),
    });

    WizardView {
        template_id: catalog.id.clone(),
        title: catalog.title.clone(),
        status,
        index,
        visible_count,
        progress_fraction,
        can_proceed: wizard.can_proceed(),
        validation_message: wizard.validation_message(),
        is_last: visible_count == 0 || index + 1 == visible_count,
        current_field,
        visible_keys: visible.iter().map(|field| field.key.clone()).collect(),
    }
}

/// Render the view as a structured JSON-friendly value.
pub fn render_json_ui(view: &WizardView) -> Value {
    let current_field = view.current_field.as_ref().map(|field| {
        let mut map = Map::new();
        map.insert("key".into(), Value::String(field.key.clone()));
        map.insert("label".into(), Value::String(field.label.clone()));
        map.insert("type".into(), Value::String(field.kind.as_str().to_string()));
        map.insert("required".into(), Value::Bool(field.required));
        if let Some(help) = &field.help_text {
            map.insert("helpText".into(), Value::String(help.clone()));
        }
        if let Some(placeholder) = &field.placeholder {
            map.insert("placeholder".into(), Value::String(placeholder.clone()));
        }
        if !field.options.is_empty() {
            map.insert(
                "options".into(),
                Value::Array(
                    field
                        .options
                        .iter()
                        .map(|option| {
                            json!({
                                "value": option.value,
                                "label": option.display_label(),
                            })
                        })
                        .collect(),
                ),
            );
        }
        if let Some(value) = &field.current_value {
            map.insert("current_value".into(), value.to_json());
        }
        Value::Object(map)
    });

    json!({
        "template_id": view.template_id,
        "title": view.title,
        "status": view.status.as_str(),
        "index": view.index,
        "visible_count": view.visible_count,
        "progress_fraction": view.progress_fraction,
        "can_proceed": view.can_proceed,
        "validation_message": view.validation_message,
        "is_last": view.is_last,
        "current_field": current_field,
        "visible_keys": view.visible_keys,
    })
}

/// Render the view as human-friendly text.
pub fn render_text(view: &WizardView) -> String {
    let mut lines = Vec::new();
    if let Some(title) = &view.title {
        lines.push(format!("Form: {}", title));
    }
    lines.push(format!(
        "Status: {} ({}/{})",
        view.status.as_str(),
        (view.index + 1).min(view.visible_count),
        view.visible_count
    ));

    match &view.current_field {
        Some(field) if view.status == SessionStatus::InProgress => {
            lines.push(format!("Question {} of {}", view.index + 1, view.visible_count));
            lines.push(format!("  {}", field.label));
            if let Some(help) = &field.help_text {
                lines.push(format!("  {}", help));
            }
            for (position, option) in field.options.iter().enumerate() {
                lines.push(format!(
                    "  {}) {} [{}]",
                    position + 1,
                    option.display_label(),
                    option.value
                ));
            }
            if field.required {
                lines.push("  Required: yes".to_string());
            }
            if let Some(value) = &field.current_value {
                lines.push(format!("  Current value: {}", value));
            }
            if let Some(message) = &view.validation_message {
                lines.push(format!("  {}", message));
            }
        }
        _ => lines.push("All visible questions are answered.".to_string()),
    }

    lines.join("\n")
}
