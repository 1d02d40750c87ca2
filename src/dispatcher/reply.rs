//! Outbound reply kinds and their localized rendering

use crate::catalog::MenuCatalog;
use crate::gateway::PredictionResult;
use crate::localization::{t_args_lang, t_lang, t_opt_lang};

/// Replies the dispatcher can send
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Subject listing
    Menu,
    /// Subject chosen, image requested
    SubjectSelected { subject_key: String },
    /// Text did not match any selector token
    InvalidSelection,
    /// Image received while not awaiting one
    UnexpectedImage,
    /// Non-image input while awaiting an image
    AwaitingImageReminder { subject_key: String },
    /// Image accepted, prediction running
    Analyzing { subject_key: String },
    /// Second image while a prediction is still running
    PredictionInProgress,
    Prediction(PredictionResult),
    /// Generic apology for transport or gateway failures
    PredictionFailed,
}

impl Reply {
    /// Render the reply text in the given language
    pub fn render(&self, catalog: &MenuCatalog, language: &str) -> String {
        match self {
            Reply::Menu => render_menu(catalog, language),
            Reply::SubjectSelected { subject_key } => t_args_lang(
                "subject-selected",
                &[("subject", &subject_name(catalog, subject_key, language))],
                language,
            ),
            Reply::InvalidSelection => {
                let (token, name) = catalog
                    .subjects()
                    .first()
                    .map(|s| (s.canonical_token().to_string(), subject_name(catalog, &s.key, language)))
                    .unwrap_or_default();
                t_args_lang(
                    "invalid-selection",
                    &[("example_token", &token), ("example_subject", &name)],
                    language,
                )
            }
            Reply::UnexpectedImage => t_lang("unexpected-image", language),
            Reply::AwaitingImageReminder { subject_key } => t_args_lang(
                "awaiting-image-reminder",
                &[("subject", &subject_name(catalog, subject_key, language))],
                language,
            ),
            Reply::Analyzing { subject_key } => t_args_lang(
                "analyzing",
                &[("subject", &subject_name(catalog, subject_key, language))],
                language,
            ),
            Reply::PredictionInProgress => t_lang("prediction-in-progress", language),
            Reply::Prediction(result) => {
                let mut text = t_args_lang("prediction-result", &[("label", &result.label)], language);
                if let Some(percent) = result.confidence_percent() {
                    text.push('\n');
                    text.push_str(&t_args_lang(
                        "prediction-confidence",
                        &[("confidence", &percent)],
                        language,
                    ));
                }
                text
            }
            Reply::PredictionFailed => t_lang("prediction-failed", language),
        }
    }
}

/// Display name for a subject key, localized when the language has one
pub fn subject_name(catalog: &MenuCatalog, subject_key: &str, language: &str) -> String {
    t_opt_lang(&format!("subject-{subject_key}"), language).unwrap_or_else(|| {
        catalog
            .subject_by_key(subject_key)
            .map(|subject| subject.display_name.clone())
            .unwrap_or_else(|| subject_key.to_string())
    })
}

fn render_menu(catalog: &MenuCatalog, language: &str) -> String {
    let listing = catalog.render_menu_with(|subject| subject_name(catalog, &subject.key, language));
    format!(
        "{}\n\n{}\n\n{}",
        t_lang("menu-header", language),
        listing,
        t_lang("menu-footer", language)
    )
}
