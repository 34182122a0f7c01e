//! Click handling state machine.
//!
//! The controller is either `Idle` or `Animating`. A click on a part whose
//! material belongs to a highlight group lights the material up, schedules
//! its restoration and moves the camera towards the group's focus target.
//! While that is in flight every further click is ignored, so the emissive
//! channel only ever has one writer. Color and texture edits go through
//! [`crate::material::MaterialStore`] and are not gated here.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use log::{debug, info};

use crate::animation::{ease_in_out_cubic, AnimationId, Sequencer};
use crate::camera::{CameraFocusTarget, SharedCamera};
use crate::config::ConfiguratorConfig;
use crate::picking::Hit;
use crate::registry::PartCategory;
use crate::scene::MaterialHandle;

/// Record of the highlight/focus animation currently in flight.
#[derive(Debug, Clone)]
pub struct HighlightToken {
    pub category: PartCategory,
    pub material: MaterialHandle,
    /// Emissive value captured before the highlight was applied.
    pub original_emissive: Vec3,
    pub focus: CameraFocusTarget,
    pub started_at: Instant,
    pub expires_at: Instant,
    pub highlight_run: AnimationId,
    pub focus_run: AnimationId,
    pending: Vec<AnimationId>,
}

impl HighlightToken {
    fn restore_emissive(&self) {
        restore(&self.material, self.original_emissive);
    }

    /// Runs of this token that have not completed yet.
    pub fn pending_runs(&self) -> &[AnimationId] {
        &self.pending
    }
}

#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Animating(HighlightToken),
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing under the pointer, or the part has no material identity.
    Missed,
    /// The part is in the `other` category, or its material is not part of
    /// any highlight group.
    Unrecognized,
    /// Another highlight is still running; the click was dropped.
    Busy,
    Highlighted(PartCategory),
}

#[derive(Debug)]
pub struct InteractionController {
    state: InteractionState,
    config: ConfiguratorConfig,
}

impl InteractionController {
    pub fn new(config: &ConfiguratorConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            config: config.clone(),
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, InteractionState::Animating(_))
    }

    pub fn token(&self) -> Option<&HighlightToken> {
        match &self.state {
            InteractionState::Animating(token) => Some(token),
            InteractionState::Idle => None,
        }
    }

    /// Handles the nearest hit of a pointer click.
    pub fn click(
        &mut self,
        hit: Option<&Hit>,
        sequencer: &mut Sequencer,
        camera: &SharedCamera,
    ) -> ClickOutcome {
        if self.is_animating() {
            debug!("click ignored while a highlight is running");
            return ClickOutcome::Busy;
        }
        let Some(hit) = hit else {
            debug!("click missed the model");
            return ClickOutcome::Missed;
        };
        let (Some(material), Some(identity)) = (hit.material.clone(), hit.material_identity())
        else {
            debug!("clicked part {} has no material identity", hit.name);
            return ClickOutcome::Missed;
        };
        if !hit.category.is_configurable() {
            debug!("part {} is not configurable", hit.name);
            return ClickOutcome::Unrecognized;
        }
        let Some(group) = self.config.group_for(&identity) else {
            debug!("material {identity} of part {} is not highlightable", hit.name);
            return ClickOutcome::Unrecognized;
        };
        let category = group.category;
        let focus = group.focus_target();

        let original_emissive = {
            let mut guard = material.write();
            let original = guard.emissive;
            guard.emissive = self.config.highlight_color;
            guard.needs_update = true;
            original
        };

        let highlight_duration = self.config.highlight_duration();
        let focus_duration = self.config.focus_duration();
        let restore_handle = Arc::clone(&material);
        let highlight_run = sequencer.run(
            highlight_duration,
            |_| {},
            move || restore(&restore_handle, original_emissive),
        );

        let start = camera.read().position;
        let end = focus.position;
        let pivot = self.config.focus_pivot;
        let update_camera = Arc::clone(camera);
        let final_camera = Arc::clone(camera);
        let focus_run = sequencer.run(
            focus_duration,
            move |t| {
                let mut camera = update_camera.write();
                camera.position = start.lerp(end, ease_in_out_cubic(t));
                camera.target = pivot;
            },
            move || {
                let mut camera = final_camera.write();
                camera.position = end;
                camera.target = pivot;
            },
        );

        let started_at = sequencer.now();
        let expires_at = started_at + highlight_duration.max(focus_duration);
        info!("highlighting {category} via {identity} (part {})", hit.name);
        self.state = InteractionState::Animating(HighlightToken {
            category,
            material,
            original_emissive,
            focus,
            started_at,
            expires_at,
            highlight_run,
            focus_run,
            pending: vec![highlight_run, focus_run],
        });
        ClickOutcome::Highlighted(category)
    }

    /// Notifies the controller that a sequencer run finished.
    ///
    /// Returns `true` when this completion brought the controller back to
    /// `Idle`.
    pub fn animation_completed(&mut self, id: AnimationId) -> bool {
        let InteractionState::Animating(token) = &mut self.state else {
            return false;
        };
        token.pending.retain(|pending| *pending != id);
        if !token.pending.is_empty() {
            return false;
        }
        token.restore_emissive();
        debug!("highlight of {} finished", token.category);
        self.state = InteractionState::Idle;
        true
    }

    /// Cancels the running highlight, if any, and restores the material
    /// right away. Used on teardown.
    pub fn cancel(&mut self, sequencer: &mut Sequencer) {
        let InteractionState::Animating(token) = std::mem::take(&mut self.state) else {
            return;
        };
        for id in &token.pending {
            sequencer.cancel(*id);
        }
        token.restore_emissive();
        info!("canceled highlight of {}", token.category);
    }
}

fn restore(material: &MaterialHandle, emissive: Vec3) {
    let mut material = material.write();
    material.emissive = emissive;
    material.needs_update = true;
}
