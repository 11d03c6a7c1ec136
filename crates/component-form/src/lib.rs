use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    Advance, AnswerValue, AnswersError, Catalog, CatalogError, Retreat, ReviewConfig,
    ReviewError, SessionState, Wizard, build_review, build_view, lint_catalog, parse_answers,
    project, render_json_ui,
};

#[derive(Debug, Error)]
enum ComponentError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to parse session state: {0}")]
    StateParse(#[source] serde_json::Error),
    #[error("failed to parse answer value: {0}")]
    ValueParse(#[source] serde_json::Error),
    #[error(transparent)]
    Answers(#[from] AnswersError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

fn load_catalog(catalog_json: &str) -> Result<Catalog, ComponentError> {
    Ok(Catalog::from_json(catalog_json)?)
}

fn parse_state(state_json: &str) -> Result<SessionState, ComponentError> {
    if state_json.trim().is_empty() {
        return Ok(SessionState::default());
    }
    serde_json::from_str(state_json).map_err(ComponentError::StateParse)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => {
            debug!(error = %err, "component call failed");
            json!({ "error": err.to_string() }).to_string()
        }
    }
}

fn transition_response(wizard: &Wizard<'_>, outcome: &str) -> Result<Value, ComponentError> {
    let state = serde_json::to_value(wizard.state()).map_err(ComponentError::JsonEncode)?;
    Ok(json!({
        "outcome": outcome,
        "state": state,
        "view": render_json_ui(&build_view(wizard)),
    }))
}

/// Run `op` against a wizard resumed from `state_json`.
fn with_wizard<F>(catalog_json: &str, state_json: &str, op: F) -> String
where
    F: FnOnce(&mut Wizard<'_>) -> Result<Value, ComponentError>,
{
    respond(load_catalog(catalog_json).and_then(|catalog| {
        let state = parse_state(state_json)?;
        let mut wizard = Wizard::resume(&catalog, state);
        op(&mut wizard)
    }))
}

/// Normalized catalog JSON.
pub fn describe(catalog_json: &str) -> String {
    respond(load_catalog(catalog_json).and_then(|catalog| {
        serde_json::to_value(catalog).map_err(ComponentError::JsonEncode)
    }))
}

pub fn lint(catalog_json: &str) -> String {
    respond(load_catalog(catalog_json).and_then(|catalog| {
        serde_json::to_value(lint_catalog(&catalog)).map_err(ComponentError::JsonEncode)
    }))
}

/// Visible keys for the given answers, in catalog order.
pub fn visible_fields(catalog_json: &str, answers_json: &str) -> String {
    respond(load_catalog(catalog_json).and_then(|catalog| {
        let answers = parse_answers(answers_json)?;
        let keys: Vec<&str> = project(&catalog, &answers)
            .into_iter()
            .map(|field| field.key.as_str())
            .collect();
        Ok(json!({ "visible": keys }))
    }))
}

/// Opens a session with optional pre-filled answers.
pub fn start(catalog_json: &str, answers_json: &str) -> String {
    respond(load_catalog(catalog_json).and_then(|catalog| {
        let answers = parse_answers(answers_json)?;
        let wizard = Wizard::new(&catalog, answers);
        transition_response(&wizard, "started")
    }))
}

pub fn view(catalog_json: &str, state_json: &str) -> String {
    with_wizard(catalog_json, state_json, |wizard| {
        transition_response(wizard, "unchanged")
    })
}

/// Stores an answer; a JSON `null` clears it.
pub fn set_answer(catalog_json: &str, state_json: &str, key: &str, value_json: &str) -> String {
    with_wizard(catalog_json, state_json, |wizard| {
        let raw: Value = serde_json::from_str(value_json).map_err(ComponentError::ValueParse)?;
        match AnswerValue::from_json(&raw) {
            Some(value) => wizard.set_answer(key, value),
            None => wizard.clear_answer(key),
        }
        transition_response(wizard, "updated")
    })
}

pub fn clear_answer(catalog_json: &str, state_json: &str, key: &str) -> String {
    with_wizard(catalog_json, state_json, |wizard| {
        wizard.clear_answer(key);
        transition_response(wizard, "updated")
    })
}

pub fn advance(catalog_json: &str, state_json: &str) -> String {
    with_wizard(catalog_json, state_json, |wizard| match wizard.advance() {
        Advance::Moved { .. } => transition_response(wizard, "moved"),
        Advance::Blocked => transition_response(wizard, "blocked"),
        Advance::Complete(submission) => {
            let mut response = transition_response(wizard, "complete")?;
            response["submission"] =
                serde_json::to_value(&submission).map_err(ComponentError::JsonEncode)?;
            response["render_request"] = submission.render_request();
            Ok(response)
        }
    })
}

pub fn retreat(catalog_json: &str, state_json: &str) -> String {
    with_wizard(catalog_json, state_json, |wizard| match wizard.retreat() {
        Retreat::Moved { .. } => transition_response(wizard, "moved"),
        Retreat::Exit => transition_response(wizard, "exit"),
    })
}

/// Review rows for a finished answer set.
pub fn review(catalog_json: &str, config_json: &str, answers_json: &str) -> String {
    respond(load_catalog(catalog_json).and_then(|catalog| {
        let config = ReviewConfig::from_json(config_json)?;
        let answers = parse_answers(answers_json)?;
        let rows = build_review(&catalog, &answers, &config)?;
        serde_json::to_value(rows).map_err(ComponentError::JsonEncode)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> String {
        json!({
            "id": "routing-form",
            "fields": [
                { "key": "a", "type": "text", "label": "A", "required": true },
                {
                    "key": "b",
                    "type": "radio",
                    "label": "B",
                    "options": [{ "value": "x", "label": "X" }, { "value": "y", "label": "Y" }]
                },
                { "key": "c", "type": "text", "label": "C", "visible_when": { "b": ["x"] } }
            ]
        })
        .to_string()
    }

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).expect("json")
    }

    fn state_of(response: &Value) -> String {
        response["state"].to_string()
    }

    #[test]
    fn describe_returns_catalog_json() {
        let parsed = parse(&describe(&catalog()));
        assert_eq!(parsed["id"], "routing-form");
        assert_eq!(parsed["fields"][2]["visible_when"]["b"][0], "x");
    }

    #[test]
    fn describe_reports_parse_errors() {
        let parsed = parse(&describe("{ not json"));
        assert!(
            parsed["error"]
                .as_str()
                .unwrap_or_default()
                .contains("failed to parse field catalog")
        );
    }

    #[test]
    fn start_prunes_stale_prefill() {
        let parsed = parse(&start(&catalog(), r#"{"a":"hi","b":"y","c":"old"}"#));
        assert_eq!(parsed["outcome"], "started");
        assert!(parsed["state"]["answers"].get("c").is_none());
        assert_eq!(parsed["view"]["visible_count"], 2);
    }

    #[test]
    fn advance_is_blocked_without_required_answer() {
        let started = parse(&start(&catalog(), ""));
        let parsed = parse(&advance(&catalog(), &state_of(&started)));
        assert_eq!(parsed["outcome"], "blocked");
        assert_eq!(parsed["state"]["current_index"], 0);
    }

    #[test]
    fn blocked_view_explains_the_block() {
        let started = parse(&start(&catalog(), ""));
        assert_eq!(
            started["view"]["validation_message"],
            "An answer is required to continue."
        );
        let answered = parse(&set_answer(&catalog(), &state_of(&started), "a", r#""hi""#));
        assert!(answered["view"]["validation_message"].is_null());
    }

    #[test]
    fn full_flow_produces_submission() {
        let catalog = catalog();
        let mut state = state_of(&parse(&start(&catalog, "")));
        state = state_of(&parse(&set_answer(&catalog, &state, "a", r#""hi""#)));
        state = state_of(&parse(&advance(&catalog, &state)));
        state = state_of(&parse(&set_answer(&catalog, &state, "b", r#""x""#)));
        state = state_of(&parse(&advance(&catalog, &state)));
        let moved = parse(&set_answer(&catalog, &state, "c", r#""ok""#));
        assert_eq!(moved["view"]["current_field"]["key"], "c");

        let done = parse(&advance(&catalog, &state_of(&moved)));
        assert_eq!(done["outcome"], "complete");
        assert_eq!(done["state"]["status"], "complete");
        assert_eq!(done["submission"]["template_id"], "routing-form");
        assert_eq!(done["submission"]["answers"]["c"], "ok");
        assert_eq!(done["render_request"]["data"]["a"], "hi");
    }

    #[test]
    fn null_value_clears_answer() {
        let catalog = catalog();
        let state = state_of(&parse(&start(&catalog, r#"{"a":"hi"}"#)));
        let parsed = parse(&set_answer(&catalog, &state, "a", "null"));
        assert!(parsed["state"]["answers"].get("a").is_none());
        assert_eq!(parsed["view"]["can_proceed"], false);
    }

    #[test]
    fn retreat_from_first_question_signals_exit() {
        let parsed = parse(&retreat(&catalog(), ""));
        assert_eq!(parsed["outcome"], "exit");
    }

    #[test]
    fn clear_answer_on_routing_field_prunes_dependents() {
        let catalog = catalog();
        let state = state_of(&parse(&start(&catalog, r#"{"a":"hi","b":"x","c":"ok"}"#)));
        let parsed = parse(&clear_answer(&catalog, &state, "b"));
        assert!(parsed["state"]["answers"].get("c").is_none());
        assert_eq!(parsed["view"]["visible_keys"], json!(["a", "b"]));
    }

    #[test]
    fn visible_fields_lists_keys_in_order() {
        let parsed = parse(&visible_fields(&catalog(), r#"{"b":"x"}"#));
        assert_eq!(parsed["visible"], json!(["a", "b", "c"]));
    }

    #[test]
    fn lint_reports_valid_catalog() {
        let parsed = parse(&lint(&catalog()));
        assert_eq!(parsed["valid"], true);
    }

    #[test]
    fn review_uses_option_labels() {
        let parsed = parse(&review(&catalog(), "", r#"{"a":"hi","b":"y"}"#));
        assert_eq!(parsed[1]["value"], "Y");
    }
}
