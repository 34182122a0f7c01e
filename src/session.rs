use std::fmt;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::animation::{Clock, Sequencer};
use crate::camera::{Camera, SharedCamera};
use crate::config::ConfiguratorConfig;
use crate::intent::{Intent, IntentQueue, IntentSender};
use crate::interaction::{ClickOutcome, InteractionController, InteractionState};
use crate::material::{MaterialState, MaterialStore};
use crate::order::OrderDraft;
use crate::picking;
use crate::pointer::Viewport;
use crate::registry::{PartCategory, PartRegistry};
use crate::scene::Scene;
use crate::texture::TextureLibrary;

/// Result of handling one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The model has not loaded yet; nothing happened.
    NotReady,
    Updated(PartCategory),
    /// The category has no parts or cannot be configured.
    Unchanged(PartCategory),
    /// The requested texture could not be found; the category kept its
    /// previous look.
    TextureUnavailable(PartCategory),
    Reset,
    Click(ClickOutcome),
}

impl fmt::Display for IntentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => f.write_str("not ready"),
            Self::Updated(category) => write!(f, "updated {category}"),
            Self::Unchanged(category) => write!(f, "unchanged {category}"),
            Self::TextureUnavailable(category) => write!(f, "texture unavailable for {category}"),
            Self::Reset => f.write_str("reset"),
            Self::Click(ClickOutcome::Missed) => f.write_str("click missed"),
            Self::Click(ClickOutcome::Unrecognized) => f.write_str("click on unrecognized part"),
            Self::Click(ClickOutcome::Busy) => f.write_str("click ignored (busy)"),
            Self::Click(ClickOutcome::Highlighted(category)) => {
                write!(f, "highlighted {category}")
            }
        }
    }
}

/// One configurator instance: the loaded model and everything that acts on
/// it.
pub struct ConfiguratorSession {
    config: ConfiguratorConfig,
    scene: Option<Scene>,
    registry: PartRegistry,
    store: MaterialStore,
    controller: InteractionController,
    sequencer: Sequencer,
    camera: SharedCamera,
    textures: TextureLibrary,
    intents: IntentQueue,
}

impl fmt::Debug for ConfiguratorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguratorSession")
            .field("loaded", &self.is_loaded())
            .field("parts", &self.registry.len())
            .field("state", self.controller.state())
            .field("sequencer", &self.sequencer)
            .finish()
    }
}

impl ConfiguratorSession {
    pub fn new(config: ConfiguratorConfig, clock: Arc<dyn Clock>) -> Self {
        let store = MaterialStore::new(
            MaterialState::with_color(config.default_color),
            config.neutral_texture_color,
        );
        Self {
            controller: InteractionController::new(&config),
            sequencer: Sequencer::new(clock),
            camera: Arc::new(RwLock::new(config.initial_camera())),
            scene: None,
            registry: PartRegistry::default(),
            store,
            textures: TextureLibrary::default(),
            intents: IntentQueue::new(),
            config,
        }
    }

    pub fn with_textures(mut self, textures: TextureLibrary) -> Self {
        self.textures = textures;
        self
    }

    /// Installs a freshly loaded model, replacing any previous one.
    pub fn load_scene(&mut self, scene: Scene) {
        self.controller.cancel(&mut self.sequencer);
        let registry = PartRegistry::build(Some(&scene.root));
        self.store.bind(&registry);
        for category in registry.categories() {
            info!(
                "{category}: {} part(s)",
                registry.parts(category).len()
            );
        }
        info!("Model loaded with {} parts", registry.len());
        self.registry = registry;
        self.scene = Some(scene);
    }

    pub fn is_loaded(&self) -> bool {
        self.scene.is_some()
    }

    pub fn config(&self) -> &ConfiguratorConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    pub fn store(&self) -> &MaterialStore {
        &self.store
    }

    pub fn camera(&self) -> Camera {
        *self.camera.read()
    }

    /// Matches the camera to a resized drawing surface.
    pub fn resize(&self, viewport: Viewport) {
        self.camera.write().aspect = viewport.aspect();
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.controller.state()
    }

    pub fn is_animating(&self) -> bool {
        self.controller.is_animating()
    }

    pub fn intent_sender(&self) -> IntentSender {
        self.intents.sender()
    }

    pub fn submit(&self, intent: Intent) {
        self.intents.push(intent);
    }

    /// Handles every queued intent in submission order.
    pub fn process_intents(&mut self) -> Vec<(Intent, IntentOutcome)> {
        self.intents
            .drain()
            .into_iter()
            .map(|intent| {
                let outcome = self.handle(intent.clone());
                (intent, outcome)
            })
            .collect()
    }

    pub fn handle(&mut self, intent: Intent) -> IntentOutcome {
        if !self.is_loaded() {
            debug!("dropping {intent}: model not loaded yet");
            return IntentOutcome::NotReady;
        }
        match intent {
            Intent::ColorChangeRequested { category, color } => {
                self.outcome(category, self.store.set_color(category, color))
            }
            Intent::TextureChangeRequested { category, texture } => {
                match self.textures.load(&texture) {
                    Ok(texture) => {
                        self.outcome(category, self.store.set_texture(category, texture))
                    }
                    Err(err) => {
                        warn!("keeping {category} unchanged: {err}");
                        IntentOutcome::TextureUnavailable(category)
                    }
                }
            }
            Intent::ResetRequested => {
                self.store.reset();
                IntentOutcome::Reset
            }
            Intent::PartClicked { ndc_x, ndc_y } => {
                IntentOutcome::Click(self.click_ndc(Vec2::new(ndc_x, ndc_y)))
            }
        }
    }

    fn outcome(&self, category: PartCategory, changed: bool) -> IntentOutcome {
        if changed {
            IntentOutcome::Updated(category)
        } else {
            IntentOutcome::Unchanged(category)
        }
    }

    /// Picks the part under `ndc` and hands the nearest hit to the
    /// interaction controller.
    pub fn click_ndc(&mut self, ndc: Vec2) -> ClickOutcome {
        let Some(scene) = &self.scene else {
            debug!("click before the model finished loading");
            return ClickOutcome::Missed;
        };
        let camera = *self.camera.read();
        let hits = picking::resolve(ndc, &camera, &scene.root);
        self.controller
            .click(hits.first(), &mut self.sequencer, &self.camera)
    }

    /// Advances running animations. Call once per frame.
    pub fn tick(&mut self) {
        for id in self.sequencer.tick() {
            self.controller.animation_completed(id);
        }
    }

    /// Current emissive of the material with `identity`, if loaded.
    pub fn emissive(&self, identity: &str) -> Option<Vec3> {
        let material = self.scene.as_ref()?.material(identity)?;
        let emissive = material.read().emissive;
        Some(emissive)
    }

    pub fn order(&self) -> OrderDraft {
        OrderDraft::from_snapshot(&self.store.snapshot())
    }

    /// Cancels pending animations so no callback outlives the session.
    pub fn shutdown(&mut self) {
        self.controller.cancel(&mut self.sequencer);
    }
}

impl Drop for ConfiguratorSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
