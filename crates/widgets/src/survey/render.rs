//! Question controls.

use crowdsource_html::{Element, Node};

use super::model::{OptionType, Question, Survey};

/// Append the control for `question` to `container`.
pub fn render_question(container: &mut Element, survey: &Survey, question: &Question) {
    let id = survey.question_id(question);
    let name = survey.question_name(question);
    match question.option_type {
        OptionType::Radio | OptionType::Choice | OptionType::NumericChoice => {
            container.append(option_list(&id, &name, "radio", &question.options));
        }
        OptionType::BoolList => {
            container.append(option_list(&id, &name, "checkbox", &question.options));
        }
        OptionType::Photo => container.append(input("file", &id, &name)),
        OptionType::Bool => container.append(input("checkbox", &id, &name)),
        OptionType::Text => container.append(
            Element::new("textarea")
                .with_attr("cols", "40")
                .with_attr("rows", "10")
                .with_id(id)
                .with_attr("name", name),
        ),
        OptionType::Select | OptionType::NumericSelect => {
            let mut select = Element::new("select").with_id(id).with_attr("name", name);
            if !question.required {
                select.append(
                    Element::new("option")
                        .with_attr("value", "")
                        .with_text("-----------"),
                );
            }
            for option in &question.options {
                select.append(
                    Element::new("option")
                        .with_attr("value", option.as_str())
                        .with_html(option),
                );
            }
            container.append(select);
        }
        OptionType::Char
        | OptionType::Email
        | OptionType::Video
        | OptionType::Location
        | OptionType::Integer
        | OptionType::Float => container.append(input("text", &id, &name)),
    }
}

/// Append the heading and paragraph for one question of a full survey:
/// the control, a required marker, help text and a hidden error slot.
pub fn render_question_block(container: &mut Element, survey: &Survey, question: &Question) {
    container.append(Element::new("h3").with_html(&question.question));
    let mut p = Element::new("p");
    render_question(&mut p, survey, question);
    if question.required {
        p.append(Element::new("span").with_class("required").with_text("*"));
    }
    if let Some(help) = question.help_text.as_deref().filter(|h| !h.is_empty()) {
        p.append(Element::new("label").with_class("help_text").with_html(help));
    }
    p.append(
        Element::new("span")
            .with_class("error")
            .with_id(survey.error_slot_id(question))
            .hidden(),
    );
    container.append(p);
}

/// Append the hidden answer input and the one-click option list of a poll.
pub fn render_poll_buttons(container: &mut Element, survey: &Survey, question: &Question) {
    container.append(
        Element::new("input")
            .with_attr("type", "hidden")
            .with_attr("name", survey.question_name(question)),
    );
    let mut ul = Element::new("ul").with_class("voteList").with_class("clearfix");
    for option in &question.options {
        ul.append(
            Element::new("li").with_child(
                Element::new("a")
                    .with_attr("href", "#")
                    .with_style("cursor", "pointer")
                    .with_html(option),
            ),
        );
    }
    container.append(ul);
}

fn input(kind: &str, id: &str, name: &str) -> Element {
    Element::new("input")
        .with_attr("type", kind)
        .with_id(id)
        .with_attr("name", name)
}

fn option_list(id: &str, name: &str, kind: &str, options: &[String]) -> Element {
    let mut ul = Element::new("ul");
    for (i, option) in options.iter().enumerate() {
        let option_id = format!("{id}_{i}");
        let label = Element::new("label")
            .with_attr("for", option_id.as_str())
            .with_child(
                Element::new("input")
                    .with_attr("type", kind)
                    .with_id(option_id.as_str())
                    .with_attr("name", name)
                    .with_attr("value", option.as_str()),
            )
            .with_child(Node::text(format!(" {option}")));
        ul.append(Element::new("li").with_child(label));
    }
    ul
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Survey {
        Survey {
            id: 3,
            slug: Some("s".to_string()),
            title: "T".to_string(),
            description: None,
            tease: None,
            submit_url: "/submit/".to_string(),
            report_url: "/report/".to_string(),
            thanks: None,
            questions: Vec::new(),
        }
    }

    fn question(option_type: OptionType, required: bool) -> Question {
        Question {
            cms_id: 7,
            question: "Pick <em>one</em>".to_string(),
            option_type,
            required,
            help_text: None,
            options: vec!["Red".to_string(), "Blue".to_string()],
        }
    }

    fn render(option_type: OptionType, required: bool) -> Element {
        let mut p = Element::new("p");
        render_question(&mut p, &survey(), &question(option_type, required));
        p
    }

    #[test]
    fn test_radio_list() {
        let p = render(OptionType::Choice, false);
        let radios = p.select("li label input[type=radio]");
        assert_eq!(radios.len(), 2);
        assert_eq!(radios[1].id(), Some("id_3_7-answer_1"));
        assert_eq!(radios[1].attr("name"), Some("3_7-answer"));
        assert_eq!(radios[1].attr("value"), Some("Blue"));
        let label = p.select_first("label").unwrap();
        assert_eq!(label.attr("for"), Some("id_3_7-answer_0"));
        assert_eq!(label.text(), " Red");
    }

    #[test]
    fn test_bool_list_uses_checkboxes() {
        let p = render(OptionType::BoolList, false);
        assert_eq!(p.select("input[type=checkbox]").len(), 2);
    }

    #[test]
    fn test_single_controls() {
        let cases = [
            (OptionType::Photo, "input", Some("file")),
            (OptionType::Bool, "input", Some("checkbox")),
            (OptionType::Email, "input", Some("text")),
            (OptionType::Float, "input", Some("text")),
            (OptionType::Text, "textarea", None),
        ];
        for (option_type, tag, kind) in cases {
            let p = render(option_type, false);
            let control = p.child_elements().next().unwrap();
            assert_eq!(control.tag, tag, "{option_type:?}");
            assert_eq!(control.attr("type"), kind, "{option_type:?}");
            assert_eq!(control.id(), Some("id_3_7-answer"));
        }
        let area = render(OptionType::Text, false);
        let area = area.select_first("textarea").unwrap();
        assert_eq!(area.attr("cols"), Some("40"));
        assert_eq!(area.attr("rows"), Some("10"));
    }

    #[test]
    fn test_select_blank_option() {
        let optional = render(OptionType::Select, false);
        let options = optional.select("option");
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].attr("value"), Some(""));
        assert_eq!(options[0].text(), "-----------");

        let required = render(OptionType::NumericSelect, true);
        assert_eq!(required.select("option").len(), 2);
    }

    #[test]
    fn test_question_block() {
        let mut div = Element::new("div");
        let mut q = question(OptionType::Char, true);
        q.help_text = Some("City name".to_string());
        render_question_block(&mut div, &survey(), &q);

        assert_eq!(div.select_first("h3").unwrap().inner_html(), "Pick <em>one</em>");
        assert_eq!(div.select("span.required").len(), 1);
        assert_eq!(div.select_first("label.help_text").unwrap().text(), "City name");
        let slot = div.find_by_id("id_3_7-answer_error").unwrap();
        assert!(slot.is_hidden());
        assert!(slot.has_class("error"));
    }

    #[test]
    fn test_poll_buttons() {
        let mut div = Element::new("div");
        render_poll_buttons(&mut div, &survey(), &question(OptionType::Radio, false));
        let hidden = div.select_first("input[type=hidden]").unwrap();
        assert_eq!(hidden.attr("name"), Some("3_7-answer"));
        let anchors = div.select("ul.voteList li a");
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].attr("href"), Some("#"));
        assert_eq!(anchors[0].text(), "Red");
    }
}
