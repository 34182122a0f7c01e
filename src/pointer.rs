use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Pointer travel in pixels above which a press/release pair is a drag
/// (orbiting the camera) rather than a click.
pub const CLICK_SLOP_PX: f32 = 4.0;

/// Size of the surface the pointer moves over, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Converts a pixel position (origin top-left, y down) into normalized
/// device coordinates (origin centre, y up).
pub fn to_ndc(position: Vec2, viewport: Viewport) -> Vec2 {
    let width = viewport.width.max(1) as f32;
    let height = viewport.height.max(1) as f32;
    Vec2::new(
        position.x / width * 2.0 - 1.0,
        -(position.y / height * 2.0 - 1.0),
    )
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Default)]
struct PointerInner {
    position: Vec2,
    pressed_at: Option<Vec2>,
}

/// Thread-safe pointer tracker that turns raw button events into clicks.
#[derive(Debug)]
pub struct PointerState {
    viewport: RwLock<Viewport>,
    inner: RwLock<PointerInner>,
}

impl PointerState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: RwLock::new(viewport),
            inner: RwLock::new(PointerInner::default()),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        *self.viewport.write() = Viewport::new(width.max(1), height.max(1));
    }

    pub fn viewport(&self) -> Viewport {
        *self.viewport.read()
    }

    pub fn set_position(&self, position: Vec2) {
        self.inner.write().position = position;
    }

    pub fn position(&self) -> Vec2 {
        self.inner.read().position
    }

    pub fn button_down(&self, button: MouseButton) {
        if button != MouseButton::LEFT {
            return;
        }
        let mut inner = self.inner.write();
        inner.pressed_at = Some(inner.position);
    }

    /// Returns the click position in NDC when the release completes a click.
    pub fn button_up(&self, button: MouseButton) -> Option<Vec2> {
        if button != MouseButton::LEFT {
            return None;
        }
        let mut inner = self.inner.write();
        let pressed_at = inner.pressed_at.take()?;
        if pressed_at.distance(inner.position) > CLICK_SLOP_PX {
            return None;
        }
        Some(to_ndc(inner.position, self.viewport()))
    }
}
