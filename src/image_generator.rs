//! Cover-image generation for the post page.
//!
//! One [`ImageGenerator`] backs one open post page. It asks the image service
//! for candidates, renders them into a fixed set of display slots and
//! publishes the user's pick on a `watch` channel that the post form reads.
//!
//! Per generation cycle the view moves `Idle → Loading → Displayed | Error`.
//! A failed cycle with nothing valid on screen renders the local fallback
//! set. That leaves the phase `Displayed` with the error message still set.

use crate::{
    config::{Config, DEFAULT_FALLBACK_IMAGES, DEFAULT_PLACEHOLDER_TEMPLATE},
    domain::ImageService,
    errors::{FormError, ServiceError, ValidationError},
    models::{GenerateImagesRequest, ImageSelected},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

const GENERATION_FAILED: &str = "Could not generate the images. Please try again later.";
const MISSING_SLOTS: &str = "Interface error: image containers not found.";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Displayed,
    Error,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    pub index: usize,
    pub src: Option<String>,
    pub selected: bool,
    /// Set once the placeholder replaced a src that failed to load.
    pub fallback_applied: bool,
}

impl ImageSlot {
    fn empty(index: usize) -> Self {
        Self {
            index,
            src: None,
            selected: false,
            fallback_applied: false,
        }
    }

    fn has_valid_src(&self) -> bool {
        self.src
            .as_deref()
            .is_some_and(|src| !src.is_empty() && src != "about:blank" && !src.ends_with("/undefined"))
    }
}

/// What a renderer needs to draw the generator.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GeneratorView {
    pub phase: Phase,
    pub error: Option<String>,
    pub images_visible: bool,
    pub focus_title: bool,
    pub slots: Vec<ImageSlot>,
    pub selected_image_url: Option<String>,
    /// The generation whose response may still land in this view.
    #[serde(skip)]
    cycle: Option<Uuid>,
}

impl GeneratorView {
    fn idle(slots: usize) -> Self {
        Self {
            phase: Phase::Idle,
            error: None,
            images_visible: false,
            focus_title: false,
            slots: (0..slots).map(ImageSlot::empty).collect(),
            selected_image_url: None,
            cycle: None,
        }
    }

    fn has_valid_image(&self) -> bool {
        self.slots.iter().any(ImageSlot::has_valid_src)
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub count: u32,
    pub slots: usize,
    pub fallback_images: Vec<String>,
    /// `{n}` is replaced by the 1-based slot number.
    pub placeholder_template: String,
}

impl GeneratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            count: config.image_count,
            slots: config.image_slots,
            fallback_images: config.fallback_images.clone(),
            placeholder_template: config.placeholder_url_template.clone(),
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            count: 4,
            slots: 4,
            fallback_images: DEFAULT_FALLBACK_IMAGES.iter().map(|s| s.to_string()).collect(),
            placeholder_template: DEFAULT_PLACEHOLDER_TEMPLATE.to_string(),
        }
    }
}

pub struct ImageGenerator {
    service: Arc<dyn ImageService>,
    settings: GeneratorSettings,
    view: Mutex<GeneratorView>,
    selection: watch::Sender<Option<ImageSelected>>,
}

impl ImageGenerator {
    pub fn new(service: Arc<dyn ImageService>, settings: GeneratorSettings) -> Self {
        if settings.slots == 0 {
            tracing::warn!("Image generator has no display slots; generated images cannot be shown");
        }
        tracing::info!(slots = settings.slots, count = settings.count, "Image generator initialized");
        let (selection, _) = watch::channel(None);
        Self {
            view: Mutex::new(GeneratorView::idle(settings.slots)),
            service,
            settings,
            selection,
        }
    }

    /// Receiver for selection notifications. Holds `None` while nothing is
    /// selected.
    pub fn subscribe(&self) -> watch::Receiver<Option<ImageSelected>> {
        self.selection.subscribe()
    }

    pub async fn view(&self) -> GeneratorView {
        self.view.lock().await.clone()
    }

    pub async fn selected_image_url(&self) -> Option<String> {
        self.view.lock().await.selected_image_url.clone()
    }

    /// Back to `Idle` with empty slots and no selection. A response still in
    /// flight is discarded when it arrives.
    pub async fn reset(&self) {
        *self.view.lock().await = GeneratorView::idle(self.settings.slots);
        self.selection.send_if_modified(|current| current.take().is_some());
    }

    /// Runs one generation cycle for `title`.
    pub async fn generate(&self, title: &str) -> Result<GeneratorView, FormError> {
        let title = title.trim();
        if title.is_empty() {
            let err = ValidationError::EmptyTitle;
            let mut view = self.view.lock().await;
            view.error = Some(err.to_string());
            view.focus_title = true;
            tracing::debug!("Generation refused: empty title");
            return Err(err.into());
        }

        let cycle_id = Uuid::new_v4();
        {
            let mut view = self.view.lock().await;
            view.images_visible = false;
            view.error = None;
            view.focus_title = false;
            view.phase = Phase::Loading;
            view.cycle = Some(cycle_id);
        }

        tracing::info!(%cycle_id, %title, "Generating cover images");
        let request = GenerateImagesRequest {
            title: title.to_string(),
            count: self.settings.count,
        };
        let outcome = match self.service.generate(&request).await {
            Ok(images) if images.is_empty() => Err(ServiceError::EmptyResult),
            Ok(images) => Ok(images),
            Err(e) => Err(ServiceError::from(e)),
        };

        let mut view = self.view.lock().await;
        if view.cycle != Some(cycle_id) {
            // Reset or a newer generation took over the view.
            tracing::debug!(%cycle_id, "Discarding response of a superseded generation");
            return Ok(view.clone());
        }
        view.cycle = None;

        match outcome {
            Ok(images) => {
                tracing::info!(%cycle_id, count = images.len(), "Cover images generated");
                let urls: Vec<String> = images.iter().map(|image| image.url().to_string()).collect();
                self.render(&mut view, &urls)?;
                Ok(view.clone())
            }
            Err(err) => {
                tracing::error!(%cycle_id, error = ?err, "Image generation failed");
                view.phase = Phase::Error;
                view.error = Some(GENERATION_FAILED.to_string());

                if !view.slots.is_empty() && !view.has_valid_image() {
                    tracing::warn!(%cycle_id, "Nothing usable on screen, showing local fallback images");
                    let fallback = self.settings.fallback_images.clone();
                    self.render_slots(&mut view, &fallback);
                }
                Err(err.into())
            }
        }
    }

    /// The renderer reports that `slot` failed to load its image. The
    /// placeholder is substituted at most once per src.
    pub async fn report_load_error(&self, slot: usize) -> Result<GeneratorView, FormError> {
        let mut view = self.view.lock().await;
        let placeholder = self.placeholder_for(slot);
        let Some(target) = view.slots.get_mut(slot) else {
            tracing::error!(slot, "Load error reported for an unknown image slot");
            return Err(FormError::Integration(format!("image slot {} not found", slot)));
        };

        if target.fallback_applied || target.src.is_none() {
            return Ok(view.clone());
        }

        tracing::warn!(slot, src = ?target.src, "Image failed to load, using placeholder");
        target.src = Some(placeholder);
        target.fallback_applied = true;
        Ok(view.clone())
    }

    /// Picks `slot` as the cover image and notifies subscribers.
    pub async fn select(&self, slot: usize) -> Result<GeneratorView, FormError> {
        let mut view = self.view.lock().await;
        let src = match view.slots.get(slot) {
            Some(target) => target.src.clone().filter(|src| !src.is_empty()),
            None => {
                tracing::error!(slot, "Selection of an unknown image slot");
                return Err(FormError::Integration(format!("image slot {} not found", slot)));
            }
        };
        let Some(image_url) = src else {
            tracing::debug!(slot, "Ignoring selection of an empty slot");
            return Ok(view.clone());
        };

        self.clear_selection(&mut view);
        if let Some(target) = view.slots.get_mut(slot) {
            target.selected = true;
        }
        view.selected_image_url = Some(image_url.clone());
        self.selection.send_replace(Some(ImageSelected {
            image_url: image_url.clone(),
        }));

        tracing::info!(slot, %image_url, "Cover image selected");
        Ok(view.clone())
    }

    fn render(&self, view: &mut GeneratorView, urls: &[String]) -> Result<(), FormError> {
        if view.slots.is_empty() {
            tracing::error!("No image slots to render into");
            view.phase = Phase::Error;
            view.error = Some(MISSING_SLOTS.to_string());
            return Err(FormError::Integration("no image slots configured".to_string()));
        }
        self.render_slots(view, urls);
        Ok(())
    }

    /// Fills the slots in order. Extra urls are dropped, missing ones leave
    /// the slot as it was.
    fn render_slots(&self, view: &mut GeneratorView, urls: &[String]) {
        for (slot, url) in view.slots.iter_mut().zip(urls) {
            slot.src = Some(url.clone());
            slot.fallback_applied = false;
        }
        self.clear_selection(view);
        view.images_visible = true;
        view.phase = Phase::Displayed;
    }

    fn clear_selection(&self, view: &mut GeneratorView) {
        for slot in &mut view.slots {
            slot.selected = false;
        }
        view.selected_image_url = None;
        self.selection.send_if_modified(|current| current.take().is_some());
    }

    fn placeholder_for(&self, slot: usize) -> String {
        self.settings.placeholder_template.replace("{n}", &(slot + 1).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::models::GeneratedImage;
    use crate::testing::{server_error, urls, FakeImageService, HeldImageService, Scripted};
    use pretty_assertions::assert_eq;

    const FOUR: [&str; 4] = [
        "https://img.test/1.png",
        "https://img.test/2.png",
        "https://img.test/3.png",
        "https://img.test/4.png",
    ];

    fn generator(answers: Vec<Scripted>) -> (ImageGenerator, Arc<FakeImageService>) {
        let service = Arc::new(FakeImageService::answering(answers));
        (ImageGenerator::new(service.clone(), GeneratorSettings::default()), service)
    }

    fn srcs(view: &GeneratorView) -> Vec<Option<&str>> {
        view.slots.iter().map(|s| s.src.as_deref()).collect()
    }

    #[tokio::test]
    async fn generate_sends_one_request_with_trimmed_title_and_count() {
        let (generator, service) = generator(vec![Scripted::Images(urls(&FOUR))]);

        generator.generate("  Rust at the beach  ").await.unwrap();

        let requests = service.requests.lock().unwrap();
        assert_eq!(
            *requests,
            vec![GenerateImagesRequest {
                title: "Rust at the beach".to_string(),
                count: 4
            }]
        );
    }

    #[tokio::test]
    async fn blank_titles_issue_no_request() {
        for title in ["", "   ", "\t\n"] {
            let (generator, service) = generator(vec![]);
            let err = generator.generate(title).await.unwrap_err();

            assert!(matches!(err, FormError::Validation(ValidationError::EmptyTitle)));
            assert_eq!(service.request_count(), 0);
            let view = generator.view().await;
            assert!(view.focus_title);
            assert_eq!(view.error, Some(ValidationError::EmptyTitle.to_string()));
            assert_eq!(view.phase, Phase::Idle);
        }
    }

    #[tokio::test]
    async fn success_fills_slots_in_order() {
        let (generator, _) = generator(vec![Scripted::Images(urls(&FOUR))]);

        let view = generator.generate("Sunset").await.unwrap();

        assert_eq!(view.phase, Phase::Displayed);
        assert!(view.images_visible);
        assert_eq!(view.error, None);
        assert_eq!(srcs(&view), FOUR.iter().map(|u| Some(*u)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn object_payloads_and_short_results_render() {
        let images = vec![
            GeneratedImage::Object {
                url: "https://img.test/a.png".into(),
            },
            GeneratedImage::Url("https://img.test/b.png".into()),
        ];
        let (generator, _) = generator(vec![Scripted::Images(images)]);

        let view = generator.generate("Two only").await.unwrap();

        assert_eq!(
            srcs(&view),
            vec![Some("https://img.test/a.png"), Some("https://img.test/b.png"), None, None]
        );
    }

    #[tokio::test]
    async fn selecting_a_slot_deselects_the_previous_one() {
        let (generator, _) = generator(vec![Scripted::Images(urls(&FOUR))]);
        let mut receiver = generator.subscribe();
        generator.generate("Sunset").await.unwrap();

        generator.select(1).await.unwrap();
        let view = generator.select(3).await.unwrap();

        let selected: Vec<bool> = view.slots.iter().map(|s| s.selected).collect();
        assert_eq!(selected, vec![false, false, false, true]);
        assert_eq!(generator.selected_image_url().await.as_deref(), Some(FOUR[3]));

        assert!(receiver.has_changed().unwrap());
        let published = receiver.borrow_and_update().clone();
        assert_eq!(
            published,
            Some(ImageSelected {
                image_url: FOUR[3].to_string()
            })
        );
    }

    #[tokio::test]
    async fn new_generation_clears_the_selection() {
        let (generator, _) = generator(vec![Scripted::Images(urls(&FOUR)), Scripted::Images(urls(&FOUR))]);
        let receiver = generator.subscribe();
        generator.generate("First").await.unwrap();
        generator.select(0).await.unwrap();

        let view = generator.generate("Second").await.unwrap();

        assert!(view.slots.iter().all(|s| !s.selected));
        assert_eq!(view.selected_image_url, None);
        assert_eq!(*receiver.borrow(), None);
    }

    #[tokio::test]
    async fn server_error_with_nothing_shown_uses_fallback_set() {
        let (generator, _) = generator(vec![Scripted::Fail(server_error())]);

        let err = generator.generate("Sunset").await.unwrap_err();

        assert!(matches!(err, FormError::Service(ServiceError::Request(ApiError::Status { status: 500, .. }))));
        let view = generator.view().await;
        assert_eq!(view.phase, Phase::Displayed);
        assert_eq!(view.error.as_deref(), Some(GENERATION_FAILED));
        assert_eq!(
            srcs(&view),
            DEFAULT_FALLBACK_IMAGES.iter().map(|u| Some(*u)).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn failure_keeps_previously_displayed_images() {
        let (generator, _) = generator(vec![Scripted::Images(urls(&FOUR)), Scripted::Fail(server_error())]);
        generator.generate("First").await.unwrap();

        generator.generate("Second").await.unwrap_err();

        let view = generator.view().await;
        assert_eq!(view.phase, Phase::Error);
        assert!(!view.images_visible);
        assert_eq!(srcs(&view), FOUR.iter().map(|u| Some(*u)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_result_is_a_service_error() {
        let (generator, _) = generator(vec![Scripted::Images(vec![])]);

        let err = generator.generate("Sunset").await.unwrap_err();

        assert!(matches!(err, FormError::Service(ServiceError::EmptyResult)));
        assert_eq!(generator.view().await.slots[0].src.as_deref(), Some(DEFAULT_FALLBACK_IMAGES[0]));
    }

    #[tokio::test]
    async fn load_error_substitutes_placeholder_once() {
        let (generator, _) = generator(vec![Scripted::Images(urls(&FOUR))]);
        generator.generate("Sunset").await.unwrap();

        let view = generator.report_load_error(2).await.unwrap();
        let expected = "https://via.placeholder.com/800x600?text=Imagem+3";
        assert_eq!(view.slots[2].src.as_deref(), Some(expected));
        assert!(view.slots[2].fallback_applied);

        // The placeholder failing as well does not loop.
        let again = generator.report_load_error(2).await.unwrap();
        assert_eq!(again, view);
    }

    #[tokio::test]
    async fn unknown_slots_are_integration_errors() {
        let (generator, _) = generator(vec![]);
        assert!(matches!(generator.select(9).await, Err(FormError::Integration(_))));
        assert!(matches!(generator.report_load_error(9).await, Err(FormError::Integration(_))));
    }

    #[tokio::test]
    async fn selecting_an_empty_slot_is_ignored() {
        let (generator, _) = generator(vec![]);
        let view = generator.select(0).await.unwrap();
        assert!(!view.slots[0].selected);
        assert_eq!(generator.selected_image_url().await, None);
    }

    #[tokio::test]
    async fn zero_slots_reports_interface_error() {
        let service = Arc::new(FakeImageService::answering(vec![Scripted::Images(urls(&FOUR))]));
        let settings = GeneratorSettings {
            slots: 0,
            ..GeneratorSettings::default()
        };
        let generator = ImageGenerator::new(service, settings);

        let err = generator.generate("Sunset").await.unwrap_err();

        assert!(matches!(err, FormError::Integration(_)));
        let view = generator.view().await;
        assert_eq!(view.phase, Phase::Error);
        assert_eq!(view.error.as_deref(), Some(MISSING_SLOTS));
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let (generator, _) = generator(vec![Scripted::Images(urls(&FOUR))]);
        generator.generate("Sunset").await.unwrap();
        generator.select(0).await.unwrap();

        generator.reset().await;

        let view = generator.view().await;
        assert_eq!(view, GeneratorView::idle(4));
        assert_eq!(*generator.subscribe().borrow(), None);
    }

    #[tokio::test]
    async fn response_arriving_after_reset_is_discarded() {
        let service = Arc::new(HeldImageService::default());
        let generator = Arc::new(ImageGenerator::new(service.clone(), GeneratorSettings::default()));

        let pending = tokio::spawn({
            let generator = generator.clone();
            async move { generator.generate("Sunset").await }
        });
        service.started.notified().await;
        assert_eq!(generator.view().await.phase, Phase::Loading);

        generator.reset().await;
        service.release.notify_one();

        let view = pending.await.unwrap().unwrap();
        assert_eq!(view, GeneratorView::idle(4));
        assert_eq!(generator.view().await, GeneratorView::idle(4));
    }
}
