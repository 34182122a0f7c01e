//! Part targeting and material state engine for interactive 3D product
//! configurators.
//!
//! The crate maps pointer clicks to named parts of a loaded model, keeps the
//! per-category color/texture configuration, and drives the transient
//! highlight and camera focus animation that follows a click. Rendering,
//! asset decoding and order transport stay outside of the crate so the core
//! remains testable headless.

pub mod animation;
pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod intent;
pub mod interaction;
pub mod material;
pub mod obj;
pub mod order;
pub mod picking;
pub mod pointer;
pub mod registry;
pub mod scene;
pub mod session;
pub mod texture;

pub use animation::{AnimationId, Clock, ManualClock, Sequencer, SystemClock};
pub use camera::{Camera, CameraFocusTarget};
pub use config::{ConfiguratorConfig, HighlightGroup};
pub use error::ConfiguratorError;
pub use intent::{Intent, IntentSender};
pub use interaction::{ClickOutcome, HighlightToken, InteractionController, InteractionState};
pub use material::{MaterialState, MaterialStore};
pub use order::OrderDraft;
pub use picking::{resolve, Hit};
pub use pointer::{to_ndc, PointerState, Viewport};
pub use registry::{classify, Part, PartCategory, PartRegistry};
pub use scene::{Material, MaterialHandle, PartId, Scene, SceneNode};
pub use session::{ConfiguratorSession, IntentOutcome};
pub use texture::{TextureLibrary, TextureRef};
