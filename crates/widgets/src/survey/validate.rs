//! Client-side required-field checks.

use std::collections::HashMap;

use crowdsource_html::Element;

use super::model::Survey;

/// Result of checking a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Ids of required questions left empty, in question order.
    pub missing: Vec<String>,
}

impl Validation {
    /// Whether every required question is answered.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Form fields in document order as `(name, value)` pairs.
///
/// Unchecked radio and checkbox inputs, unnamed controls and disabled
/// controls are skipped. Selects contribute the selected option, or the
/// first option when none is marked.
#[must_use]
pub fn collect_values(form: &Element) -> Vec<(String, String)> {
    control_values(form, Checkboxes::CheckedOnly)
}

/// Which checkbox inputs count as having a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Checkboxes {
    /// Only checked boxes, as a browser posts them.
    CheckedOnly,
    /// Every box, by its `value`. The required check reads boxes this way.
    ByValue,
}

fn control_values(form: &Element, checkboxes: Checkboxes) -> Vec<(String, String)> {
    form.descendants()
        .into_iter()
        .filter(|el| matches!(el.tag.as_str(), "input" | "select" | "textarea"))
        .filter(|el| !el.has_attr("disabled"))
        .filter_map(|el| {
            let name = el.attr("name")?.to_string();
            let value = control_value(el, checkboxes)?;
            Some((name, value))
        })
        .collect()
}

fn control_value(el: &Element, checkboxes: Checkboxes) -> Option<String> {
    let checked_value = || {
        el.has_attr("checked")
            .then(|| el.attr("value").unwrap_or("on").to_string())
    };
    match el.tag.as_str() {
        "input" => match el.attr("type").unwrap_or("text") {
            "radio" => checked_value(),
            "checkbox" => match checkboxes {
                Checkboxes::CheckedOnly => checked_value(),
                Checkboxes::ByValue => Some(el.attr("value").unwrap_or("on").to_string()),
            },
            "submit" | "button" | "reset" | "image" => None,
            _ => Some(el.attr("value").unwrap_or_default().to_string()),
        },
        "select" => {
            let options = el.select("option");
            let chosen = options
                .iter()
                .find(|o| o.has_attr("selected"))
                .or_else(|| options.first())?;
            Some(
                chosen
                    .attr("value")
                    .map_or_else(|| chosen.text(), str::to_string),
            )
        }
        "textarea" => Some(el.text()),
        _ => None,
    }
}

/// Mark every required question with no answer in `form`.
///
/// Each missing question's `#{id}_error` slot is filled with "Required" and
/// shown. Radio groups need a checked button; a checkbox answers by its value.
pub fn validate(form: &mut Element, survey: &Survey) -> Validation {
    let mut values: HashMap<String, String> = HashMap::new();
    for (name, value) in control_values(form, Checkboxes::ByValue) {
        let slot = values.entry(name).or_default();
        if slot.is_empty() {
            *slot = value;
        }
    }

    let mut validation = Validation::default();
    for question in survey.questions.iter().filter(|q| q.required) {
        let answered = values
            .get(&survey.question_name(question))
            .is_some_and(|v| !v.is_empty());
        if answered {
            continue;
        }
        if let Some(slot) = form.find_by_id_mut(&survey.error_slot_id(question)) {
            slot.set_text("Required");
            slot.show();
        }
        validation.missing.push(survey.question_id(question));
    }
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::model::{OptionType, Question};
    use crate::survey::render::render_question_block;

    fn survey(option_type: OptionType, required: bool) -> Survey {
        Survey {
            id: 1,
            slug: Some("s".to_string()),
            title: "T".to_string(),
            description: None,
            tease: None,
            submit_url: "/submit/".to_string(),
            report_url: String::new(),
            thanks: None,
            questions: vec![Question {
                cms_id: 2,
                question: "Tell us".to_string(),
                option_type,
                required,
                help_text: None,
                options: vec!["Yes".to_string(), "No".to_string()],
            }],
        }
    }

    fn form_for(survey: &Survey) -> Element {
        let mut form = Element::new("form");
        for q in &survey.questions {
            render_question_block(&mut form, survey, q);
        }
        form
    }

    #[test]
    fn test_required_text_empty() {
        let survey = survey(OptionType::Text, true);
        let mut form = form_for(&survey);
        let validation = validate(&mut form, &survey);
        assert!(!validation.is_valid());
        assert_eq!(validation.missing, vec!["id_1_2-answer".to_string()]);
        let slot = form.find_by_id("id_1_2-answer_error").unwrap();
        assert!(!slot.is_hidden());
        assert_eq!(slot.text(), "Required");
    }

    #[test]
    fn test_required_text_filled() {
        let survey = survey(OptionType::Text, true);
        let mut form = form_for(&survey);
        form.find_by_id_mut("id_1_2-answer").unwrap().set_text("hello");
        let validation = validate(&mut form, &survey);
        assert!(validation.is_valid());
        assert!(form.find_by_id("id_1_2-answer_error").unwrap().is_hidden());
    }

    #[test]
    fn test_optional_question_never_missing() {
        let survey = survey(OptionType::Char, false);
        let mut form = form_for(&survey);
        assert!(validate(&mut form, &survey).is_valid());
    }

    #[test]
    fn test_radio_requires_checked() {
        let survey = survey(OptionType::Choice, true);
        let mut form = form_for(&survey);
        assert!(!validate(&mut form, &survey).is_valid());

        form.find_by_id_mut("id_1_2-answer_1")
            .unwrap()
            .set_flag("checked", true);
        assert!(validate(&mut form, &survey).is_valid());
        assert_eq!(
            collect_values(&form),
            vec![("1_2-answer".to_string(), "No".to_string())]
        );
    }

    #[test]
    fn test_required_bool_answers_by_value() {
        let survey = survey(OptionType::Bool, true);
        let mut form = form_for(&survey);
        let validation = validate(&mut form, &survey);
        assert!(validation.is_valid());
        assert!(form.find_by_id("id_1_2-answer_error").unwrap().is_hidden());
        // Unchecked boxes are still left out of the posted fields.
        assert!(collect_values(&form).is_empty());

        form.find_by_id_mut("id_1_2-answer")
            .unwrap()
            .set_flag("checked", true);
        assert_eq!(
            collect_values(&form),
            vec![("1_2-answer".to_string(), "on".to_string())]
        );
    }

    #[test]
    fn test_select_values() {
        let survey = survey(OptionType::Select, false);
        let mut form = form_for(&survey);
        assert_eq!(
            collect_values(&form),
            vec![("1_2-answer".to_string(), String::new())]
        );

        form.select_each_mut("option[value=Yes]", |o| o.set_flag("selected", true));
        assert_eq!(
            collect_values(&form),
            vec![("1_2-answer".to_string(), "Yes".to_string())]
        );
    }

    #[test]
    fn test_submit_inputs_are_not_fields() {
        let form = Element::new("form")
            .with_child(
                Element::new("input")
                    .with_attr("type", "text")
                    .with_attr("name", "q")
                    .with_attr("value", "x"),
            )
            .with_child(
                Element::new("input")
                    .with_attr("type", "submit")
                    .with_attr("name", "go")
                    .with_attr("value", "Submit"),
            );
        assert_eq!(collect_values(&form), vec![("q".to_string(), "x".to_string())]);
    }
}
