//! Surveys, polls and their reports.

mod controller;
mod flavor;
mod model;
mod render;
mod report;
mod validate;

pub use controller::{SurveyController, select_mode};
pub use flavor::SurveyFlavor;
pub use model::{
    BlockReason, FieldError, OptionType, Permissions, Question, RenderMode, SubmissionOutcome,
    Survey,
};
pub use render::{render_poll_buttons, render_question, render_question_block};
pub use report::{load_survey_results, report_path};
pub use validate::{Validation, collect_values, validate};
