#![allow(missing_docs)]

pub mod answers;
pub mod keygen;
pub mod render;
pub mod review;
pub mod session;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{
    AnswerValue, Answers, AnswersError, Submission, answers_from_value, answers_to_value,
    parse_answers,
};
pub use keygen::generate_key;
pub use render::{ViewField, WizardView, build_view, render_json_ui, render_text};
pub use review::{MaskRule, MaskStyle, ReviewConfig, ReviewError, ReviewRow, build_review};
pub use session::{Advance, Retreat, SessionState, SessionStatus, Wizard};
pub use spec::{
    Catalog, CatalogError, Field, FieldOption, FieldType, RuleKind, RuleValue, ValidationRule,
    VisibleWhen, catalog_schema,
};
pub use validate::{
    LintIssue, LintReport, Severity, answer_error, answer_is_valid, lint_catalog,
};
pub use visibility::{VisibilityMap, is_visible, project, resolve_visibility};
