//! The two deployments of the survey widget.
//!
//! Both flavors share the request sequence and naming scheme but differ in
//! poll detection, heading markup and where the full form comes from.

use super::model::{OptionType, Survey};

/// Which survey widget variant to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SurveyFlavor {
    /// Client-rendered form with client-side validation.
    #[default]
    Standard,
    /// Server-rendered form fetched from `submit_url`.
    Embedded,
}

impl SurveyFlavor {
    /// Whether `survey` is shown as a one-click poll.
    #[must_use]
    pub fn is_poll(self, survey: &Survey) -> bool {
        let [question] = survey.questions.as_slice() else {
            return false;
        };
        match self {
            Self::Standard => question.option_type == OptionType::Radio,
            Self::Embedded => matches!(
                question.option_type,
                OptionType::Choice
                    | OptionType::Select
                    | OptionType::NumericSelect
                    | OptionType::NumericChoice
            ),
        }
    }

    /// Tag for the survey title placed before the wrapper.
    #[must_use]
    pub const fn title_tag(self) -> &'static str {
        match self {
            Self::Standard => "h1",
            Self::Embedded => "h3",
        }
    }

    /// Tag for the poll question heading.
    #[must_use]
    pub const fn poll_heading_tag(self) -> &'static str {
        match self {
            Self::Standard => "h3",
            Self::Embedded => "h2",
        }
    }

    /// The lead paragraph under the title as `(class, html)`.
    #[must_use]
    pub fn lead(self, survey: &Survey) -> Option<(&'static str, String)> {
        let non_empty = |s: &Option<String>| s.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
        match self {
            Self::Standard => non_empty(&survey.description)
                .map(|d| ("description", d))
                .or_else(|| non_empty(&survey.tease).map(|t| ("subtitle", t))),
            Self::Embedded => non_empty(&survey.description)
                .or_else(|| non_empty(&survey.tease))
                .map(|d| ("subtitle", d)),
        }
    }

    /// Whether answers are checked before posting.
    #[must_use]
    pub const fn validates(self) -> bool {
        matches!(self, Self::Standard)
    }

    /// Normalize a poll option label into the submitted answer.
    #[must_use]
    pub fn poll_answer_value(self, label: &str) -> String {
        let value = label.replace("&amp;", "&");
        match self {
            Self::Standard => value.trim().to_string(),
            Self::Embedded => value.replace('"', "'").trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::model::Question;

    fn survey_with(types: &[OptionType]) -> Survey {
        Survey {
            id: 1,
            slug: None,
            title: "T".to_string(),
            description: None,
            tease: Some("tease".to_string()),
            submit_url: "/submit/".to_string(),
            report_url: "/report/".to_string(),
            thanks: None,
            questions: types
                .iter()
                .zip(1..)
                .map(|(&option_type, cms_id)| Question {
                    cms_id,
                    question: "Q".to_string(),
                    option_type,
                    required: false,
                    help_text: None,
                    options: vec!["a".to_string(), "b".to_string()],
                })
                .collect(),
        }
    }

    #[test]
    fn test_standard_poll_detection() {
        assert!(SurveyFlavor::Standard.is_poll(&survey_with(&[OptionType::Radio])));
        assert!(!SurveyFlavor::Standard.is_poll(&survey_with(&[OptionType::Select])));
        assert!(!SurveyFlavor::Standard.is_poll(&survey_with(&[
            OptionType::Radio,
            OptionType::Radio
        ])));
        assert!(!SurveyFlavor::Standard.is_poll(&survey_with(&[])));
    }

    #[test]
    fn test_embedded_poll_detection() {
        for t in [
            OptionType::Choice,
            OptionType::Select,
            OptionType::NumericSelect,
            OptionType::NumericChoice,
        ] {
            assert!(SurveyFlavor::Embedded.is_poll(&survey_with(&[t])), "{t:?}");
        }
        assert!(!SurveyFlavor::Embedded.is_poll(&survey_with(&[OptionType::Radio])));
    }

    #[test]
    fn test_lead_paragraph() {
        let mut survey = survey_with(&[]);
        assert_eq!(
            SurveyFlavor::Standard.lead(&survey),
            Some(("subtitle", "tease".to_string()))
        );
        survey.description = Some("long".to_string());
        assert_eq!(
            SurveyFlavor::Standard.lead(&survey),
            Some(("description", "long".to_string()))
        );
        assert_eq!(
            SurveyFlavor::Embedded.lead(&survey),
            Some(("subtitle", "long".to_string()))
        );
        survey.description = None;
        survey.tease = None;
        assert_eq!(SurveyFlavor::Embedded.lead(&survey), None);
    }

    #[test]
    fn test_poll_answer_value() {
        assert_eq!(
            SurveyFlavor::Standard.poll_answer_value("  Salt &amp; Pepper "),
            "Salt & Pepper"
        );
        assert_eq!(
            SurveyFlavor::Embedded.poll_answer_value(" 12\" &amp; up &amp; more"),
            "12' & up & more"
        );
    }
}
