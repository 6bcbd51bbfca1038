//! Crowdsourcing widgets for crowdsource-rs.
//!
//! This crate renders the crowdsourcing widgets into a [`Page`] and talks to
//! the backend through a [`Transport`](crowdsource_common::Transport):
//!
//! - **Surveys and polls**: [`SurveyController`] loads, renders and submits
//! - **Reports**: Aggregate results via [`load_survey_results`]
//! - **Lightbox**: Full-size image viewer via [`LightboxController`]
//! - **Enlargeable images**: Thumbnail wiring via [`init_enlargeable`]
//! - **Maps**: Submission maps via [`MapController`]
//! - **Load gate**: One-shot async initialization via [`LoadGate`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use crowdsource_common::{AppResult, Config, HttpTransport};
//! use crowdsource_widgets::{Page, SurveyController, SurveyFlavor};
//!
//! async fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let transport = Arc::new(HttpTransport::new(&config.backend)?);
//!     let mut page = Page::new(r#"<div id="poll"></div>"#, "https://example.com/")?;
//!
//!     let mut survey = SurveyController::new(
//!         transport,
//!         config.backend.clone(),
//!         SurveyFlavor::Standard,
//!         "best-pizza",
//!         "poll",
//!     );
//!     survey.load(&mut page).await?;
//!     println!("{}", page.document.to_html());
//!     Ok(())
//! }
//! ```

pub mod enlarge;
pub mod lightbox;
pub mod loader;
pub mod map;
pub mod page;
pub mod survey;
pub mod wrapper;

pub use enlarge::init_enlargeable;
pub use lightbox::{Credits, ImageLoader, ImageSize, LightboxController, LightboxState, LoadSignal};
pub use loader::LoadGate;
pub use map::{
    BoundingBox, LatLng, MapController, MapEntry, MapProvider, MapRequest, MapStatus, MapView,
    Marker, MarkerIcon, bounding_box, bounds_zoom_level, toggle_map_embed,
};
pub use page::{Enlargeable, Page, Viewport};
pub use survey::{
    BlockReason, FieldError, OptionType, Permissions, Question, RenderMode, SubmissionOutcome,
    Survey, SurveyController, SurveyFlavor, load_survey_results,
};
pub use wrapper::initialize_wrapper;
