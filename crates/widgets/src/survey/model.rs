//! Survey payloads returned by the backend.

use serde::{Deserialize, Serialize};

/// How a question collects its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Email address text box.
    Email,
    /// Photo upload.
    Photo,
    /// Video link text box.
    Video,
    /// Location text box.
    Location,
    /// Integer text box.
    Integer,
    /// Decimal text box.
    Float,
    /// Single checkbox.
    Bool,
    /// Multi-line text area.
    Text,
    /// Drop-down list.
    Select,
    /// Radio button list.
    Choice,
    /// Checkbox list.
    BoolList,
    /// Numeric drop-down list.
    NumericSelect,
    /// Numeric radio button list.
    NumericChoice,
    /// Plain radio group.
    Radio,
    /// Single-line text. Also the fallback for unknown types.
    #[serde(other)]
    Char,
}

impl OptionType {
    /// Types answered by picking one of `options`.
    #[must_use]
    pub const fn is_choice_like(self) -> bool {
        matches!(
            self,
            Self::Radio | Self::Choice | Self::Select | Self::NumericSelect | Self::NumericChoice
        )
    }
}

/// One survey question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Backend identifier.
    pub cms_id: i64,
    /// Prompt, as HTML.
    pub question: String,
    /// Control type.
    pub option_type: OptionType,
    /// Whether an answer is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Help text, as HTML.
    #[serde(default)]
    pub help_text: Option<String>,
    /// Labels for choice-like types.
    #[serde(default)]
    pub options: Vec<String>,
}

/// A survey definition from `/api/questions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    /// Backend identifier.
    pub id: i64,
    /// URL slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Title, as HTML.
    pub title: String,
    /// Long description, as HTML.
    #[serde(default)]
    pub description: Option<String>,
    /// Short preview text, as HTML.
    #[serde(default)]
    pub tease: Option<String>,
    /// Where answers are posted.
    pub submit_url: String,
    /// Aggregate results page.
    #[serde(default)]
    pub report_url: String,
    /// Message shown after a successful submission.
    #[serde(default)]
    pub thanks: Option<String>,
    /// Questions in display order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Survey {
    /// Form field name for `question`: `{survey id}_{cms_id}-answer`.
    #[must_use]
    pub fn question_name(&self, question: &Question) -> String {
        format!("{}_{}-answer", self.id, question.cms_id)
    }

    /// Element id for `question`: `id_` followed by its field name.
    #[must_use]
    pub fn question_id(&self, question: &Question) -> String {
        format!("id_{}", self.question_name(question))
    }

    /// Id of the error slot rendered under `question`.
    #[must_use]
    pub fn error_slot_id(&self, question: &Question) -> String {
        format!("{}_error", self.question_id(question))
    }

    /// Thanks text, falling back to a generic message.
    #[must_use]
    pub fn thanks_text(&self) -> &str {
        self.thanks
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Thanks for responding!")
    }
}

/// What the current visitor may do, from `/api/allowed_actions/`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// May submit an entry.
    #[serde(default)]
    pub enter: bool,
    /// May see aggregate results.
    #[serde(default)]
    pub view: bool,
    /// Survey is accepting entries. Older backends omit it.
    #[serde(default)]
    pub open: Option<bool>,
    /// Entering requires a login. Older backends omit it.
    #[serde(default)]
    pub need_login: Option<bool>,
}

/// Why a survey cannot be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Anonymous visitor on a login-only survey.
    NeedLogin,
    /// Survey has not started or already ended.
    NotOpen,
    /// Visitor already submitted.
    AlreadyEntered,
}

impl BlockReason {
    /// Derive the reason from permissions that forbid entering.
    #[must_use]
    pub const fn from_permissions(permissions: &Permissions) -> Self {
        match (permissions.need_login, permissions.open) {
            (Some(true), _) => Self::NeedLogin,
            (_, Some(false)) => Self::NotOpen,
            _ => Self::AlreadyEntered,
        }
    }

    /// Text rendered in place of the form.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NeedLogin => "You must login to enter this survey.",
            Self::NotOpen => "This survey isn't open yet.",
            Self::AlreadyEntered => "You've already entered this survey.",
        }
    }
}

/// The three mutually exclusive ways a survey is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Entering is not allowed.
    Blocked(BlockReason),
    /// Single question answered with one click.
    Poll,
    /// Full form with a submit button.
    FullSurvey,
}

/// A server-side validation message tied to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Id of the control the message belongs to.
    pub field_id: String,
    /// Message HTML.
    pub message: String,
}

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Blocked client-side; ids of the unanswered required questions.
    Invalid {
        /// Question ids.
        missing: Vec<String>,
    },
    /// The backend returned field errors.
    Rejected {
        /// Errors whose field could be located.
        errors: Vec<FieldError>,
    },
    /// The entry was stored.
    Accepted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn survey() -> Survey {
        serde_json::from_value(json!({
            "id": 12,
            "title": "Best pizza?",
            "submit_url": "/crowdsourcing/pizza/submit/",
            "report_url": "/crowdsourcing/pizza/report/",
            "questions": [
                {"cms_id": 1, "question": "Where?", "option_type": "char", "required": true},
                {"cms_id": 2, "question": "Why?", "option_type": "text", "help_text": "Be brief"},
                {"cms_id": 3, "question": "Rate", "option_type": "numeric_choice", "options": ["1", "2"]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_defaults() {
        let survey = survey();
        assert_eq!(survey.questions.len(), 3);
        assert!(!survey.questions[1].required);
        assert_eq!(survey.questions[2].option_type, OptionType::NumericChoice);
        assert!(survey.thanks.is_none());
    }

    #[test]
    fn test_unknown_option_type_falls_back_to_char() {
        let q: Question = serde_json::from_value(json!({
            "cms_id": 9, "question": "?", "option_type": "hologram"
        }))
        .unwrap();
        assert_eq!(q.option_type, OptionType::Char);
    }

    #[test]
    fn test_name_and_id_derivation() {
        let survey = survey();
        let names: HashSet<String> = survey
            .questions
            .iter()
            .map(|q| survey.question_name(q))
            .collect();
        assert_eq!(names.len(), survey.questions.len());
        for q in &survey.questions {
            assert_eq!(survey.question_id(q), format!("id_{}", survey.question_name(q)));
        }
        assert_eq!(survey.question_name(&survey.questions[0]), "12_1-answer");
        assert_eq!(survey.error_slot_id(&survey.questions[0]), "id_12_1-answer_error");
    }

    #[test]
    fn test_thanks_fallback() {
        let mut survey = survey();
        assert_eq!(survey.thanks_text(), "Thanks for responding!");
        survey.thanks = Some("Cheers".to_string());
        assert_eq!(survey.thanks_text(), "Cheers");
    }

    #[test]
    fn test_block_reason() {
        let closed = Permissions {
            enter: false,
            view: true,
            open: Some(false),
            need_login: Some(false),
        };
        assert_eq!(BlockReason::from_permissions(&closed), BlockReason::NotOpen);
        assert_eq!(
            BlockReason::from_permissions(&closed).message(),
            "This survey isn't open yet."
        );

        let login = Permissions {
            need_login: Some(true),
            ..closed
        };
        assert_eq!(BlockReason::from_permissions(&login), BlockReason::NeedLogin);

        let legacy: Permissions = serde_json::from_value(json!({"enter": false, "view": false})).unwrap();
        assert_eq!(BlockReason::from_permissions(&legacy), BlockReason::AlreadyEntered);
    }
}
