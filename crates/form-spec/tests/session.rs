use form_spec::{
    Advance, AnswerValue, Answers, Catalog, Field, FieldType, Retreat, SessionState,
    SessionStatus, Wizard, project,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "routing_form" => include_str!("../tests/fixtures/routing_form.json"),
        "w9_form" => include_str!("../tests/fixtures/w9_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn catalog(name: &str) -> Catalog {
    Catalog::from_json(fixture(name)).expect("deserialize catalog")
}

fn visible_keys(wizard: &Wizard<'_>) -> Vec<String> {
    wizard
        .visible()
        .into_iter()
        .map(|field| field.key.clone())
        .collect()
}

fn expect_complete(outcome: Advance) -> Answers {
    match outcome {
        Advance::Complete(submission) => submission.answers,
        other => panic!("expected completion, got {:?}", other),
    }
}

#[test]
fn route_y_hides_details_and_completes_from_b() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("a", "hi".into());
    wizard.set_answer("b", "y".into());
    assert_eq!(visible_keys(&wizard), vec!["a", "b"]);

    assert_eq!(wizard.advance(), Advance::Moved { index: 1 });
    assert_eq!(wizard.current_field().map(|f| f.key.as_str()), Some("b"));

    let payload = expect_complete(wizard.advance());
    assert_eq!(
        payload,
        Answers::from([("a".into(), "hi".into()), ("b".into(), "y".into())])
    );
    assert_eq!(wizard.status(), SessionStatus::Complete);
}

#[test]
fn route_x_reveals_details_and_includes_them() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("a", "hi".into());
    wizard.set_answer("b", "x".into());
    assert_eq!(visible_keys(&wizard), vec!["a", "b", "c"]);

    wizard.advance();
    wizard.advance();
    assert_eq!(wizard.current_field().map(|f| f.key.as_str()), Some("c"));
    wizard.set_answer("c", "ok".into());

    let payload = expect_complete(wizard.advance());
    assert_eq!(payload.len(), 3);
    assert_eq!(payload.get("c"), Some(&AnswerValue::from("ok")));
}

#[test]
fn changing_route_prunes_details_and_clamps_cursor() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("a", "hi".into());
    wizard.set_answer("b", "x".into());
    wizard.advance();
    wizard.advance();
    wizard.set_answer("c", "ok".into());
    assert_eq!(wizard.current_index(), 2);

    wizard.set_answer("b", "y".into());
    assert!(!wizard.answers().contains_key("c"));
    assert_eq!(wizard.current_index(), 1);
    assert_eq!(visible_keys(&wizard), vec!["a", "b"]);
}

#[test]
fn required_checkbox_never_blocks() {
    let catalog = Catalog::new(vec![Field::new("consent", FieldType::Checkbox).required()]);
    let wizard = Wizard::new(&catalog, Answers::new());
    assert!(wizard.can_proceed());
}

#[test]
fn required_signature_needs_non_blank_text() {
    let catalog = Catalog::new(vec![Field::new("sig", FieldType::Signature).required()]);
    let mut wizard = Wizard::new(&catalog, Answers::new());
    assert!(!wizard.can_proceed());

    wizard.set_answer("sig", "   ".into());
    assert!(!wizard.can_proceed());
    assert_eq!(wizard.advance(), Advance::Blocked);

    wizard.set_answer("sig", "John Doe".into());
    assert!(wizard.can_proceed());
}

#[test]
fn required_text_blocks_until_answered() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    assert_eq!(wizard.advance(), Advance::Blocked);
    wizard.set_answer("a", "  ".into());
    assert_eq!(wizard.advance(), Advance::Blocked);
    wizard.set_answer("a", "Ada".into());
    assert_eq!(wizard.advance(), Advance::Moved { index: 1 });
}

#[test]
fn retreat_from_first_question_exits() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    assert_eq!(wizard.retreat(), Retreat::Exit);
    wizard.set_answer("a", "hi".into());
    wizard.advance();
    assert_eq!(wizard.retreat(), Retreat::Moved { index: 0 });
}

#[test]
fn retreat_after_completion_reopens_last_question() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("a", "hi".into());
    wizard.set_answer("b", "y".into());
    wizard.advance();
    expect_complete(wizard.advance());

    assert_eq!(wizard.retreat(), Retreat::Moved { index: 1 });
    assert_eq!(wizard.status(), SessionStatus::InProgress);
}

#[test]
fn empty_catalog_completes_immediately() {
    let catalog = Catalog::new(Vec::new());
    let mut wizard = Wizard::new(&catalog, Answers::new());
    assert!(wizard.current_field().is_none());
    assert!(wizard.can_proceed());
    let payload = expect_complete(wizard.advance());
    assert!(payload.is_empty());
}

#[test]
fn fully_hidden_catalog_completes_with_empty_payload() {
    let catalog = Catalog::new(vec![
        Field::new("a", FieldType::Text).visible_when("missing", ["x"]),
        Field::new("b", FieldType::Text).visible_when("a", ["x"]),
    ]);
    let mut wizard = Wizard::new(&catalog, Answers::new());
    assert!(wizard.current_field().is_none());
    assert!(expect_complete(wizard.advance()).is_empty());
}

#[test]
fn chained_conditions_collapse_in_one_change() {
    let catalog = catalog("w9_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("name", "Ada".into());
    wizard.set_answer("entity_type", "llc".into());
    wizard.set_answer("llc_class", "p".into());
    wizard.set_answer("partner_note", "two partners".into());
    assert!(visible_keys(&wizard).contains(&"partner_note".to_string()));

    wizard.set_answer("entity_type", "individual".into());
    assert!(!wizard.answers().contains_key("llc_class"));
    assert!(!wizard.answers().contains_key("partner_note"));
    assert!(!visible_keys(&wizard).contains(&"partner_note".to_string()));
}

#[test]
fn initial_answers_are_pruned_and_stale_index_is_clamped() {
    let catalog = catalog("routing_form");
    let state = SessionState {
        current_index: 7,
        answers: Answers::from([
            ("a".into(), "hi".into()),
            ("b".into(), "y".into()),
            ("c".into(), "left over".into()),
        ]),
        status: SessionStatus::InProgress,
    };
    let wizard = Wizard::resume(&catalog, state);
    assert!(!wizard.answers().contains_key("c"));
    assert_eq!(wizard.current_index(), 1);
}

#[test]
fn unknown_keys_never_reach_the_payload() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("a", "hi".into());
    wizard.set_answer("stray", "value".into());
    assert!(wizard.answers().contains_key("stray"));
    wizard.advance();
    let payload = expect_complete(wizard.advance());
    assert!(!payload.contains_key("stray"));
}

#[test]
fn payload_keys_are_always_visible_keys() {
    let catalog = catalog("w9_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    for (key, value) in [
        ("name", AnswerValue::from("Ada")),
        ("entity_type", "individual".into()),
        ("tin_type", "ein".into()),
        ("ein", "12-3456789".into()),
        ("signature", "Ada Lovelace".into()),
    ] {
        wizard.set_answer(key, value);
    }
    let visible: Vec<String> = visible_keys(&wizard);
    let submission = wizard.submission();
    assert!(submission.answers.keys().all(|key| visible.contains(key)));
    assert_eq!(submission.template_id.as_deref(), Some("w9"));
}

#[test]
fn cursor_stays_in_bounds_after_every_change() {
    let catalog = catalog("w9_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    let steps: Vec<(&str, AnswerValue)> = vec![
        ("name", "Ada".into()),
        ("entity_type", "llc".into()),
        ("llc_class", "p".into()),
        ("partner_note", "note".into()),
        ("tin_type", "ssn".into()),
        ("ssn", "123-45-6789".into()),
        ("entity_type", "individual".into()),
        ("tin_type", "ein".into()),
    ];
    for (key, value) in steps {
        wizard.set_answer(key, value);
        wizard.advance();
        let len = wizard.visible().len();
        assert!(len == 0 || wizard.current_index() < len);
    }
}

#[test]
fn projection_preserves_catalog_order_and_is_idempotent() {
    let catalog = catalog("w9_form");
    let answers = Answers::from([
        ("entity_type".into(), "llc".into()),
        ("tin_type".into(), "ssn".into()),
    ]);
    let first: Vec<&str> = project(&catalog, &answers)
        .into_iter()
        .map(|field| field.key.as_str())
        .collect();
    let second: Vec<&str> = project(&catalog, &answers)
        .into_iter()
        .map(|field| field.key.as_str())
        .collect();
    assert_eq!(first, second);

    let catalog_order: Vec<&str> = catalog.fields.iter().map(|f| f.key.as_str()).collect();
    let mut cursor = 0;
    for key in &first {
        let position = catalog_order[cursor..]
            .iter()
            .position(|candidate| candidate == key)
            .expect("projected key follows catalog order");
        cursor += position + 1;
    }
}

#[test]
fn session_state_round_trips_through_json() {
    let catalog = catalog("routing_form");
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("a", "hi".into());
    wizard.set_answer("b", true.into());
    wizard.advance();

    let json = serde_json::to_string(wizard.state()).expect("encode state");
    let state: SessionState = serde_json::from_str(&json).expect("decode state");
    let resumed = Wizard::resume(&catalog, state);
    assert_eq!(resumed.current_index(), 1);
    assert_eq!(resumed.answers().get("b"), Some(&AnswerValue::Bool(true)));
}

#[test]
fn malformed_email_blocks_advance_with_a_message() {
    let catalog = Catalog::new(vec![Field::new("e", FieldType::Email).required()]);
    let mut wizard = Wizard::new(&catalog, Answers::new());
    wizard.set_answer("e", "nope".into());
    assert_eq!(wizard.advance(), Advance::Blocked);
    assert_eq!(
        wizard.validation_message().as_deref(),
        Some("Enter a valid email address.")
    );

    wizard.set_answer("e", "ada@example.com".into());
    assert_eq!(wizard.validation_message(), None);
    let answers = expect_complete(wizard.advance());
    assert_eq!(answers.get("e"), Some(&AnswerValue::from("ada@example.com")));
}
