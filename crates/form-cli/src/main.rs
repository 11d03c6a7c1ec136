mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_form::{
    advance, lint, retreat, review, set_answer, start, visible_fields,
};
use form_spec::{
    LintReport, ReviewRow, Severity, Submission, catalog_schema, generate_key,
};
use serde_json::{Number, Value};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use wizard::{
    AnswerParseError, FieldKind, PromptContext, Verbosity, ViewStatus, WizardField,
    WizardPresenter, WizardView,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "FORM_WIZARD_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conditional document questionnaire CLI",
    long_about = "Runs field catalogs as one-question-at-a-time wizards and checks catalogs before they ship"
)]
struct Cli {
    /// Log engine transitions to stderr (overridden by FORM_WIZARD_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Walk through a field catalog interactively.
    Wizard {
        /// Path to the field catalog JSON.
        #[arg(long, value_name = "CATALOG")]
        catalog: PathBuf,
        /// Optional JSON file containing pre-filled answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Optional review config (hidden keys, masking).
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Also print the submission as JSON.
        #[arg(long)]
        answers_json: bool,
        /// Extra render output per question.
        #[arg(long, value_enum)]
        format: Option<RenderMode>,
    },
    /// Check a field catalog for broken conditions and schema mistakes.
    Lint {
        #[arg(long, value_name = "CATALOG")]
        catalog: PathBuf,
    },
    /// Print the fields visible for a set of answers.
    Project {
        #[arg(long, value_name = "CATALOG")]
        catalog: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the review summary for a set of answers.
    Review {
        #[arg(long, value_name = "CATALOG")]
        catalog: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the JSON Schema of the catalog format.
    Schema,
    /// Print the field key generated from a label.
    KeyFor {
        label: String,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Wizard {
            catalog,
            answers,
            config,
            answers_json,
            format,
        } => run_wizard(
            &catalog,
            answers.as_deref(),
            config.as_deref(),
            cli.verbose,
            answers_json,
            format,
        ),
        Command::Lint { catalog } => run_lint(&catalog),
        Command::Project { catalog, answers } => run_project(&catalog, &answers),
        Command::Review {
            catalog,
            answers,
            config,
        } => run_review(&catalog, &answers, config.as_deref()),
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&catalog_schema())?);
            Ok(())
        }
        Command::KeyFor { label } => {
            println!("{}", generate_key(&label));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn read_optional(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => Ok(String::new()),
    }
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn run_lint(catalog_path: &Path) -> CliResult<()> {
    let catalog_json = fs::read_to_string(catalog_path)?;
    let report: LintReport = serde_json::from_value(parse_component_result(&lint(&catalog_json))?)?;
    describe_lint(&report);
    println!(
        "Lint result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    if report.valid {
        Ok(())
    } else {
        Err("catalog has errors".into())
    }
}

fn describe_lint(report: &LintReport) {
    for issue in &report.issues {
        let level = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!(
            "  {} [{}] {}: {}",
            level,
            issue.code,
            issue.key.as_deref().unwrap_or("<no key>"),
            issue.message
        );
    }
}

fn run_project(catalog_path: &Path, answers_path: &Path) -> CliResult<()> {
    let catalog_json = fs::read_to_string(catalog_path)?;
    let answers_json = fs::read_to_string(answers_path)?;
    let result = parse_component_result(&visible_fields(&catalog_json, &answers_json))?;
    for key in result["visible"].as_array().into_iter().flatten() {
        if let Some(key) = key.as_str() {
            println!("{}", key);
        }
    }
    Ok(())
}

fn run_review(catalog_path: &Path, answers_path: &Path, config: Option<&Path>) -> CliResult<()> {
    let catalog_json = fs::read_to_string(catalog_path)?;
    let answers_json = fs::read_to_string(answers_path)?;
    let config_json = read_optional(config)?;
    let rows = review_rows(&catalog_json, &config_json, &answers_json)?;
    let presenter = WizardPresenter::new(Verbosity::Clean, false);
    presenter.show_review(&rows);
    Ok(())
}

fn review_rows(catalog_json: &str, config_json: &str, answers_json: &str) -> CliResult<Vec<ReviewRow>> {
    let value = parse_component_result(&review(catalog_json, config_json, answers_json))?;
    Ok(serde_json::from_value(value)?)
}

fn run_wizard(
    catalog_path: &Path,
    answers_path: Option<&Path>,
    config_path: Option<&Path>,
    verbose: bool,
    answers_json: bool,
    format: Option<RenderMode>,
) -> CliResult<()> {
    let catalog_json = fs::read_to_string(catalog_path)?;
    let report: LintReport = serde_json::from_value(parse_component_result(&lint(&catalog_json))?)?;
    for issue in report.errors() {
        warn!(code = %issue.code, key = ?issue.key, "{}", issue.message);
    }
    let initial_answers = read_optional(answers_path)?;
    let config_json = read_optional(config_path)?;

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    let mut response = parse_component_result(&start(&catalog_json, &initial_answers))?;
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        let mut view = WizardView::from_json(&response["view"])
            .map_err(|err| format!("wizard view error: {}", err))?;
        presenter.show_header(&view);

        let field = match view.current_field.take() {
            Some(field) if view.status == ViewStatus::InProgress => field,
            _ => {
                let state = response["state"].to_string();
                response = parse_component_result(&advance(&catalog_json, &state))?;
                if response["outcome"] == "complete" {
                    return finish(&presenter, &catalog_json, &config_json, &response);
                }
                continue;
            }
        };

        presenter.show_status(&view);
        print_render_output(format, &response["view"])?;
        let prompt = PromptContext::new(&field, &view);
        let state = response["state"].to_string();

        let command = prompt_field(&prompt, &field, &presenter, &mut input)?;
        response = match command {
            Input::Back => {
                let next = parse_component_result(&retreat(&catalog_json, &state))?;
                if next["outcome"] == "exit" {
                    println!("Already at the first question.");
                }
                next
            }
            Input::Keep => advance_from(&presenter, &catalog_json, &state)?,
            Input::Answer(value) => {
                debug!(key = %field.key, "answer entered");
                let updated = parse_component_result(&set_answer(
                    &catalog_json,
                    &state,
                    &field.key,
                    &value.to_string(),
                ))?;
                advance_from(&presenter, &catalog_json, &updated["state"].to_string())?
            }
        };

        if response["outcome"] == "complete" {
            return finish(&presenter, &catalog_json, &config_json, &response);
        }
    }
}

fn advance_from(presenter: &WizardPresenter, catalog_json: &str, state: &str) -> CliResult<Value> {
    let next = parse_component_result(&advance(catalog_json, state))?;
    if next["outcome"] == "blocked" {
        presenter.show_blocked(next["view"]["validation_message"].as_str());
    }
    Ok(next)
}

fn finish(
    presenter: &WizardPresenter,
    catalog_json: &str,
    config_json: &str,
    response: &Value,
) -> CliResult<()> {
    let submission: Submission = serde_json::from_value(response["submission"].clone())?;
    let answers = serde_json::to_string(&submission.answers)?;
    let rows = review_rows(catalog_json, config_json, &answers)?;
    presenter.show_review(&rows);
    presenter.show_completion(&submission);
    Ok(())
}

fn print_render_output(format: Option<RenderMode>, view: &Value) -> CliResult<()> {
    match format {
        Some(RenderMode::Json) => println!("{}", serde_json::to_string_pretty(view)?),
        Some(RenderMode::Text) => {
            let parsed = WizardView::from_json(view)?;
            println!(
                "[{}/{}] {}",
                (parsed.index + 1).min(parsed.visible_count),
                parsed.visible_count,
                parsed.status.as_str()
            );
        }
        None => {}
    }
    Ok(())
}

/// What the user typed at a prompt.
#[derive(Debug, PartialEq)]
enum Input {
    Answer(Value),
    Keep,
    Back,
}

fn prompt_field(
    prompt: &PromptContext,
    field: &WizardField,
    presenter: &WizardPresenter,
    input: &mut impl BufRead,
) -> CliResult<Input> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err("input ended before the wizard finished".into());
        }

        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("wizard aborted by user".into());
        }
        if trimmed.eq_ignore_ascii_case("back") {
            return Ok(Input::Back);
        }

        match parse_answer(field, trimmed) {
            Ok(Some(value)) => return Ok(Input::Answer(value)),
            Ok(None) => return Ok(Input::Keep),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// Converts typed input into an answer; blank input keeps the current answer.
fn parse_answer(field: &WizardField, raw: &str) -> Result<Option<Value>, AnswerParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    match field.kind {
        FieldKind::Radio => parse_radio(field, raw).map(Some),
        FieldKind::Checkbox => parse_checkbox(raw).map(Some),
        FieldKind::Number => parse_number(raw).map(Some),
        FieldKind::Text | FieldKind::Signature => Ok(Some(Value::String(raw.to_string()))),
    }
}

fn parse_radio(field: &WizardField, raw: &str) -> Result<Value, AnswerParseError> {
    if let Ok(position) = raw.parse::<usize>()
        && let Some(option) = position.checked_sub(1).and_then(|index| field.options.get(index))
    {
        return Ok(Value::String(option.value.clone()));
    }
    field
        .options
        .iter()
        .find(|option| option.value == raw || option.label.eq_ignore_ascii_case(raw))
        .map(|option| Value::String(option.value.clone()))
        .ok_or_else(|| {
            let values = field
                .options
                .iter()
                .map(|option| option.value.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(
                "Pick one of the listed options.",
                Some(format!("one of: {} (or 1-{})", values, field.options.len())),
            )
        })
}

fn parse_checkbox(raw: &str) -> Result<Value, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(Value::Bool(true)),
        "no" | "n" | "false" | "0" => Ok(Value::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please answer yes or no.",
            Some("yes/y/true/1 or no/n/false/0".into()),
        )),
    }
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Value::Number(Number::from(value)));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| AnswerParseError::new("Please enter a number.", Some("finite number".into())))
}
