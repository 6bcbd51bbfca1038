//! Survey and poll widget controller.
//!
//! A [`SurveyController`] owns one survey instance on a page: it fetches the
//! visitor's permissions, then the survey definition, renders the widget into
//! its container and handles submissions.

use std::sync::Arc;

use crowdsource_common::{AppError, AppResult, BackendConfig, QueryParams, Transport};
use crowdsource_html::{Element, Node, parse_fragment};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::flavor::SurveyFlavor;
use super::model::{
    BlockReason, FieldError, Permissions, RenderMode, Survey, SubmissionOutcome,
};
use super::render::{render_poll_buttons, render_question_block};
use super::validate::{collect_values, validate};
use crate::page::Page;
use crate::wrapper::initialize_wrapper;

const SURVEY_BROKEN: &str = "The survey appears to be broken. Sorry about that!";
const FORM_BROKEN: &str = "Crowdsourcing encountered and error. Sorry about that!";
const FIX_PROBLEMS: &str = "Fix the problems above.";

/// Pick how a survey is shown.
#[must_use]
pub fn select_mode(flavor: SurveyFlavor, permissions: &Permissions, survey: &Survey) -> RenderMode {
    if !permissions.enter {
        RenderMode::Blocked(BlockReason::from_permissions(permissions))
    } else if flavor.is_poll(survey) {
        RenderMode::Poll
    } else {
        RenderMode::FullSurvey
    }
}

#[derive(Debug, Clone)]
struct LoadedSurvey {
    survey: Survey,
    permissions: Permissions,
    mode: RenderMode,
}

/// One survey widget.
pub struct SurveyController {
    transport: Arc<dyn Transport>,
    config: BackendConfig,
    flavor: SurveyFlavor,
    slug: String,
    element_id: String,
    loaded: Option<LoadedSurvey>,
    closed: bool,
}

impl std::fmt::Debug for SurveyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveyController")
            .field("flavor", &self.flavor)
            .field("slug", &self.slug)
            .field("element_id", &self.element_id)
            .field("mode", &self.mode())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl SurveyController {
    /// Create a controller for survey `slug` rendered into `#element_id`.
    pub fn new(
        transport: Arc<dyn Transport>,
        config: BackendConfig,
        flavor: SurveyFlavor,
        slug: impl Into<String>,
        element_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            config,
            flavor,
            slug: slug.into(),
            element_id: element_id.into(),
            loaded: None,
            closed: false,
        }
    }

    /// Survey slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Container id.
    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// The fetched definition, once loaded.
    #[must_use]
    pub fn survey(&self) -> Option<&Survey> {
        self.loaded.as_ref().map(|l| &l.survey)
    }

    /// The visitor's permissions, once loaded.
    #[must_use]
    pub fn permissions(&self) -> Option<&Permissions> {
        self.loaded.as_ref().map(|l| &l.permissions)
    }

    /// The chosen render mode, once loaded.
    #[must_use]
    pub fn mode(&self) -> Option<RenderMode> {
        self.loaded.as_ref().map(|l| l.mode)
    }

    /// Whether an entry has been accepted.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn form_id(&self) -> String {
        format!("form_{}", self.slug)
    }

    fn inner_id(&self) -> String {
        format!("inner_{}", self.slug)
    }

    fn banner_id(&self) -> String {
        format!("error_{}", self.slug)
    }

    // ==================== Loading ====================

    /// Fetch the survey and render it.
    ///
    /// When either fetch fails the container shows an apology and the error
    /// is returned. If the container disappeared while a request was in
    /// flight nothing is rendered and `MissingElement` is returned. A
    /// controller renders once; loading it again is `InvalidState`.
    pub async fn load(&mut self, page: &mut Page) -> AppResult<RenderMode> {
        if self.loaded.is_some() {
            return Err(AppError::InvalidState(format!(
                "survey {} is already rendered",
                self.slug
            )));
        }
        let (permissions, survey) = match self.fetch_definition().await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(slug = %self.slug, error = %err, "Failed to load survey");
                self.ensure_attached(page, &self.element_id)?;
                self.render_broken(page, &err)?;
                return Err(err);
            }
        };
        self.ensure_attached(page, &self.element_id)?;

        let mode = select_mode(self.flavor, &permissions, &survey);
        let poll_layout = self.flavor.is_poll(&survey);
        info!(
            slug = %self.slug,
            element_id = %self.element_id,
            ?mode,
            questions = survey.questions.len(),
            "Rendering survey"
        );

        hide_tease_preview(page, &self.element_id);
        initialize_wrapper(
            &mut page.document,
            &self.element_id,
            if poll_layout { "poll" } else { "survey" },
        )?;
        self.render_headings(page, &survey);

        let form = self.build_form(&survey, &permissions, mode, poll_layout);
        let container = page
            .document
            .get_mut(&self.element_id)
            .ok_or_else(|| AppError::MissingElement(self.element_id.clone()))?;
        container.append(form);
        if permissions.view && self.flavor == SurveyFlavor::Embedded {
            container.append(see_results(&survey));
        }

        if mode == RenderMode::FullSurvey && self.flavor == SurveyFlavor::Embedded {
            self.load_server_form(page, &survey).await?;
        }

        self.loaded = Some(LoadedSurvey {
            survey,
            permissions,
            mode,
        });
        Ok(mode)
    }

    async fn fetch_definition(&self) -> AppResult<(Permissions, Survey)> {
        let permissions: Permissions = self.fetch_json("allowed_actions").await?;
        let survey: Survey = self.fetch_json("questions").await?;
        Ok((permissions, survey))
    }

    async fn fetch_json<T: DeserializeOwned>(&self, endpoint: &str) -> AppResult<T> {
        let url = self.config.api_path(&self.slug, endpoint);
        debug!(url = %url, "Fetching survey data");
        self.transport
            .get(&url, &QueryParams::new())
            .await?
            .error_for_status()?
            .json()
    }

    fn ensure_attached(&self, page: &Page, id: &str) -> AppResult<()> {
        if page.document.contains(id) {
            Ok(())
        } else {
            info!(slug = %self.slug, id, "Survey target left the page, not rendering");
            Err(AppError::MissingElement(id.to_string()))
        }
    }

    fn render_broken(&self, page: &mut Page, err: &AppError) -> AppResult<()> {
        let container = page
            .document
            .get_mut(&self.element_id)
            .ok_or_else(|| AppError::MissingElement(self.element_id.clone()))?;
        container.clear();
        container.append(Node::text(SURVEY_BROKEN));
        container.append(hidden_status(err));
        Ok(())
    }

    fn render_headings(&self, page: &mut Page, survey: &Survey) {
        let body = page.document.body_mut();
        if !survey.title.is_empty() {
            body.insert_before_id(
                &self.element_id,
                Element::new(self.flavor.title_tag()).with_html(&survey.title),
            );
        }
        if let Some((class, html)) = self.flavor.lead(survey) {
            body.insert_before_id(
                &self.element_id,
                Element::new("p").with_class(class).with_html(&html),
            );
        }
    }

    fn build_form(
        &self,
        survey: &Survey,
        permissions: &Permissions,
        mode: RenderMode,
        poll_layout: bool,
    ) -> Element {
        let mut form = Element::new("form")
            .with_id(self.form_id())
            .with_attr("method", "POST")
            .with_attr("action", survey.submit_url.as_str())
            .with_class(if poll_layout { "vote" } else { "survey" });

        let mut inner = Element::new("div").with_id(self.inner_id());
        match mode {
            RenderMode::Blocked(reason) => inner.set_text(reason.message()),
            RenderMode::Poll => {
                if let Some(question) = survey.questions.first() {
                    inner.append(
                        Element::new(self.flavor.poll_heading_tag()).with_html(&question.question),
                    );
                    render_poll_buttons(&mut inner, survey, question);
                }
            }
            RenderMode::FullSurvey => {
                if self.flavor == SurveyFlavor::Standard {
                    for question in &survey.questions {
                        render_question_block(&mut inner, survey, question);
                    }
                }
            }
        }

        if self.flavor == SurveyFlavor::Standard {
            if mode == RenderMode::FullSurvey {
                inner.append(
                    Element::new("input")
                        .with_attr("type", "submit")
                        .with_attr("value", "Submit"),
                );
            }
            inner.append(
                Element::new("span")
                    .with_id(self.banner_id())
                    .with_class("error")
                    .with_text(FIX_PROBLEMS)
                    .hidden(),
            );
        }
        form.append(inner);

        if permissions.view && self.flavor == SurveyFlavor::Standard {
            form.append(see_results(survey));
        }
        form
    }

    async fn load_server_form(&self, page: &mut Page, survey: &Survey) -> AppResult<()> {
        let query = page.query_params();
        let result = self
            .transport
            .get(&survey.submit_url, &query)
            .await
            .and_then(|r| r.error_for_status());

        let form_id = self.form_id();
        self.ensure_attached(page, &form_id)?;
        let form = page
            .document
            .get_mut(&form_id)
            .ok_or_else(|| AppError::MissingElement(form_id.clone()))?;
        match result {
            Ok(response) => form.set_inner_html(&response.body),
            Err(err) => {
                warn!(slug = %self.slug, error = %err, "Failed to load survey form");
                form.set_text(FORM_BROKEN);
            }
        }
        Ok(())
    }

    // ==================== Submitting ====================

    /// Submit the form.
    ///
    /// A transport failure or non-success status re-enables the form, shows
    /// an apology and returns the error.
    pub async fn submit(&mut self, page: &mut Page) -> AppResult<SubmissionOutcome> {
        if self.closed {
            return Err(AppError::InvalidState(format!(
                "survey {} already accepted an entry",
                self.slug
            )));
        }
        let Some(loaded) = self.loaded.as_ref() else {
            return Err(AppError::InvalidState(format!("survey {} is not loaded", self.slug)));
        };
        if matches!(loaded.mode, RenderMode::Blocked(_)) {
            return Err(AppError::InvalidState(format!(
                "survey {} does not accept entries",
                self.slug
            )));
        }

        let form_id = self.form_id();
        let form = page
            .document
            .get_mut(&form_id)
            .ok_or_else(|| AppError::MissingElement(form_id.clone()))?;

        if self.flavor.validates() {
            let validation = validate(form, &loaded.survey);
            if let Some(banner) = form.find_by_id_mut(&self.banner_id()) {
                if validation.is_valid() {
                    banner.hide();
                } else {
                    show_fix_problems(banner);
                }
            }
            if !validation.is_valid() {
                debug!(slug = %self.slug, missing = ?validation.missing, "Survey failed validation");
                return Ok(SubmissionOutcome::Invalid {
                    missing: validation.missing,
                });
            }
        }

        set_submit_controls(form, "Submitting...", true);
        let fields = collect_values(form);
        let submit_url = loaded.survey.submit_url.clone();
        debug!(slug = %self.slug, url = %submit_url, fields = fields.len(), "Submitting survey");

        let result = self
            .transport
            .post_form(&submit_url, &fields)
            .await
            .and_then(|r| r.error_for_status());
        self.ensure_attached(page, &form_id)?;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(slug = %self.slug, error = %err, "Survey submission failed");
                self.render_submit_failure(page, &err);
                return Err(err);
            }
        };

        let outcome = match self.flavor {
            SurveyFlavor::Standard => self.apply_standard_response(page, &response.body),
            SurveyFlavor::Embedded => self.apply_embedded_response(page, &response.body),
        };
        if outcome == SubmissionOutcome::Accepted {
            self.closed = true;
            info!(slug = %self.slug, "Survey entry accepted");
        } else {
            info!(slug = %self.slug, "Survey entry rejected by server");
        }
        Ok(outcome)
    }

    fn apply_standard_response(&self, page: &mut Page, body: &str) -> SubmissionOutcome {
        let nodes = parse_fragment(body);
        let mut reported = Vec::new();
        collect_error_lists(&nodes, &mut reported);

        if reported.is_empty() {
            let thanks = self
                .loaded
                .as_ref()
                .map_or("Thanks for responding!", |l| l.survey.thanks_text());
            if let Some(inner) = page.document.get_mut(&self.inner_id()) {
                inner.set_inner_html(thanks);
            }
            return SubmissionOutcome::Accepted;
        }

        let mut errors = Vec::new();
        for (field_id, message) in reported {
            let Some(field_id) = field_id else { continue };
            let Some(slot) = page.document.get_mut(&format!("{field_id}_error")) else {
                debug!(field_id = %field_id, "No error slot for field");
                continue;
            };
            slot.set_inner_html(&message);
            slot.show();
            errors.push(FieldError { field_id, message });
        }
        if let Some(form) = page.document.get_mut(&self.form_id()) {
            if let Some(banner) = form.find_by_id_mut(&self.banner_id()) {
                show_fix_problems(banner);
            }
            set_submit_controls(form, "Submit", false);
        }
        SubmissionOutcome::Rejected { errors }
    }

    fn apply_embedded_response(&self, page: &mut Page, body: &str) -> SubmissionOutcome {
        let nodes = parse_fragment(body);
        let mut reported = Vec::new();
        collect_error_lists(&nodes, &mut reported);
        if let Some(form) = page.document.get_mut(&self.form_id()) {
            form.children = nodes;
        }
        if reported.is_empty() {
            return SubmissionOutcome::Accepted;
        }
        let errors = reported
            .into_iter()
            .filter_map(|(field_id, message)| Some(FieldError { field_id: field_id?, message }))
            .collect();
        SubmissionOutcome::Rejected { errors }
    }

    fn render_submit_failure(&self, page: &mut Page, err: &AppError) {
        let Some(form) = page.document.get_mut(&self.form_id()) else {
            return;
        };
        set_submit_controls(form, "Submit", false);
        match self.flavor {
            SurveyFlavor::Standard => {
                if let Some(banner) = form.find_by_id_mut(&self.banner_id()) {
                    banner.set_text(SURVEY_BROKEN);
                    banner.show();
                }
            }
            SurveyFlavor::Embedded => {
                form.append(
                    Element::new("span")
                        .with_class("error")
                        .with_text(SURVEY_BROKEN)
                        .with_child(hidden_status(err)),
                );
            }
        }
    }

    // ==================== Poll buttons ====================

    /// Answer a poll with option `index` and submit it.
    pub async fn choose(&mut self, page: &mut Page, index: usize) -> AppResult<SubmissionOutcome> {
        let name = self.poll_answer_name()?;
        let form_id = self.form_id();
        let form = page
            .document
            .get_mut(&form_id)
            .ok_or_else(|| AppError::MissingElement(form_id.clone()))?;

        let label = {
            let anchors = form.select("ul.voteList li a");
            let anchor = anchors.get(index).ok_or_else(|| {
                AppError::InvalidState(format!("poll {} has no option {index}", self.slug))
            })?;
            match self.flavor {
                SurveyFlavor::Standard => anchor.inner_html(),
                SurveyFlavor::Embedded => anchor.text(),
            }
        };
        let value = self.flavor.poll_answer_value(&label);
        debug!(slug = %self.slug, index, answer = %value, "Poll option chosen");
        form.select_each_mut(&format!("input[type=hidden][name={name}]"), |input| {
            input.set_attr("value", value.as_str());
        });

        self.submit(page).await
    }

    /// Toggle the hover highlight on poll option `index`.
    pub fn hover(&self, page: &mut Page, index: usize, on: bool) -> AppResult<()> {
        self.poll_answer_name()?;
        let form_id = self.form_id();
        let form = page
            .document
            .get_mut(&form_id)
            .ok_or_else(|| AppError::MissingElement(form_id.clone()))?;
        let mut position = 0;
        form.select_each_mut("ul.voteList li", |li| {
            if position == index {
                li.set_class("surveyRoll", on);
                li.select_each_mut("a", |a| a.set_class("surveyRoll", on));
            }
            position += 1;
        });
        if index >= position {
            return Err(AppError::InvalidState(format!(
                "poll {} has no option {index}",
                self.slug
            )));
        }
        Ok(())
    }

    fn poll_answer_name(&self) -> AppResult<String> {
        match &self.loaded {
            Some(LoadedSurvey {
                survey,
                mode: RenderMode::Poll,
                ..
            }) => survey
                .questions
                .first()
                .map(|q| survey.question_name(q))
                .ok_or_else(|| AppError::Internal("poll without a question".to_string())),
            _ => Err(AppError::InvalidState(format!(
                "survey {} is not shown as a poll",
                self.slug
            ))),
        }
    }
}

fn see_results(survey: &Survey) -> Element {
    Element::new("p").with_class("results").with_child(
        Element::new("a")
            .with_attr("href", survey.report_url.as_str())
            .with_text("See Results"),
    )
}

fn hidden_status(err: &AppError) -> Element {
    Element::new("input")
        .with_attr("type", "hidden")
        .with_attr("value", err.status_text())
}

fn set_submit_controls(form: &mut Element, label: &str, disabled: bool) {
    form.select_each_mut("input[type=submit]", |input| {
        input.set_attr("value", label);
        input.set_flag("disabled", disabled);
    });
}

/// Show the banner with its validation text, replacing any apology.
fn show_fix_problems(banner: &mut Element) {
    banner.set_text(FIX_PROBLEMS);
    banner.show();
}

/// When the container sits in a `tease` block, hide the preview shown ahead
/// of it.
fn hide_tease_preview(page: &mut Page, element_id: &str) {
    let Some(parent) = page.document.body_mut().parent_of_mut(element_id) else {
        return;
    };
    if parent.attr("class") != Some("tease") {
        return;
    }
    if let Some(first) = parent.children.iter_mut().find_map(Node::as_element_mut)
        && first.id() != Some(element_id)
    {
        first.hide();
    }
}

/// Pairs of `(label for, first message)` for every `ul.errorlist`, taking the
/// field from the first label inside the element that follows the list.
fn collect_error_lists(nodes: &[Node], out: &mut Vec<(Option<String>, String)>) {
    for (i, node) in nodes.iter().enumerate() {
        let Node::Element(el) = node else { continue };
        if el.tag == "ul" && el.has_class("errorlist") {
            let field_id = nodes[i + 1..]
                .iter()
                .find_map(Node::as_element)
                .and_then(|next| next.select_first("label"))
                .and_then(|label| label.attr("for"))
                .map(str::to_string);
            let message = el
                .select_first("li")
                .map(Element::inner_html)
                .unwrap_or_default();
            out.push((field_id, message));
        }
        collect_error_lists(&el.children, out);
    }
}
