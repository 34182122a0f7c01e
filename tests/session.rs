mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use glam::{Vec2, Vec3};

use product_configurator::{
    to_ndc, ClickOutcome, ConfiguratorConfig, ConfiguratorSession, Intent, IntentOutcome,
    InteractionState, ManualClock, MaterialState, PartCategory, Scene, TextureLibrary, Viewport,
};

use common::SHOE_SCENE;

fn loaded_session() -> (Arc<ManualClock>, ConfiguratorSession) {
    let clock = Arc::new(ManualClock::new());
    let mut session = ConfiguratorSession::new(ConfiguratorConfig::default(), clock.clone());
    session.load_scene(Scene::from_xml(SHOE_SCENE).unwrap());
    (clock, session)
}

fn ndc_of(session: &ConfiguratorSession, world: Vec3) -> Vec2 {
    session
        .camera()
        .view_proj()
        .project_point3(world)
        .truncate()
}

fn advance(session: &mut ConfiguratorSession, clock: &ManualClock, millis: u64) {
    for _ in 0..millis / 10 {
        clock.advance(Duration::from_millis(10));
        session.tick();
    }
}

#[test]
fn intents_before_load_are_ignored() {
    let clock = Arc::new(ManualClock::new());
    let mut session = ConfiguratorSession::new(ConfiguratorConfig::default(), clock);
    assert!(!session.is_loaded());
    session.submit(Intent::ResetRequested);
    session.submit(Intent::click(Vec2::ZERO));
    let outcomes = session.process_intents();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes
        .iter()
        .all(|(_, outcome)| *outcome == IntentOutcome::NotReady));
    assert!(session.store().snapshot().is_empty());
    assert_eq!(session.click_ndc(Vec2::ZERO), ClickOutcome::Missed);
}

#[test]
fn registry_groups_the_shoe_parts() {
    let (_clock, session) = loaded_session();
    let registry = session.registry();
    assert_eq!(registry.len(), 4);
    for (category, name) in [
        (PartCategory::Outside, "outside_1"),
        (PartCategory::Laces, "laces_a"),
        (PartCategory::Sole, "sole_top"),
        (PartCategory::Other, "misc_strap"),
    ] {
        let parts = registry.parts(category);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, name);
    }
}

#[test]
fn clicking_laces_highlights_and_returns_to_idle() {
    let (clock, mut session) = loaded_session();
    let before = session.emissive("mat_laces").unwrap();

    let ndc = ndc_of(&session, Vec3::ZERO);
    assert_eq!(
        session.click_ndc(ndc),
        ClickOutcome::Highlighted(PartCategory::Laces)
    );
    assert!(session.is_animating());
    assert_eq!(
        session.emissive("mat_laces").unwrap(),
        session.config().highlight_color
    );

    advance(&mut session, &clock, 500);
    assert!(matches!(session.interaction_state(), InteractionState::Idle));
    assert_eq!(session.emissive("mat_laces").unwrap(), before);
    assert_eq!(session.camera().position, Vec3::new(0.0, 3.0, 4.0));
}

#[test]
fn second_click_while_animating_changes_nothing() {
    let (clock, mut session) = loaded_session();
    let laces = ndc_of(&session, Vec3::ZERO);
    let sole = ndc_of(&session, Vec3::new(3.0, 0.0, 0.0));
    session.click_ndc(laces);
    let expires_at = match session.interaction_state() {
        InteractionState::Animating(token) => token.expires_at,
        InteractionState::Idle => panic!("expected a running highlight"),
    };

    advance(&mut session, &clock, 100);
    assert_eq!(session.click_ndc(sole), ClickOutcome::Busy);
    match session.interaction_state() {
        InteractionState::Animating(token) => {
            assert_eq!(token.category, PartCategory::Laces);
            assert_eq!(token.expires_at, expires_at);
        }
        InteractionState::Idle => panic!("highlight ended early"),
    }
    assert_eq!(session.emissive("mat_sole").unwrap(), Vec3::ZERO);
}

#[test]
fn misses_and_other_parts_leave_everything_unchanged() {
    let (_clock, mut session) = loaded_session();
    session.submit(Intent::ColorChangeRequested {
        category: PartCategory::Sole,
        color: Vec3::new(0.5, 0.5, 0.5),
    });
    session.process_intents();
    let snapshot = session.store().snapshot();
    let camera = session.camera();

    assert_eq!(session.click_ndc(Vec2::new(0.95, 0.95)), ClickOutcome::Missed);
    let strap = ndc_of(&session, Vec3::new(0.0, -3.0, 0.0));
    assert_eq!(session.click_ndc(strap), ClickOutcome::Unrecognized);

    assert!(!session.is_animating());
    assert_eq!(session.store().snapshot(), snapshot);
    assert_eq!(session.camera(), camera);
    assert_eq!(session.emissive("mat_strap").unwrap(), Vec3::ZERO);
}

#[test]
fn other_part_wearing_a_grouped_material_is_not_highlighted() {
    let scene = r#"<scene>
  <material><name>mat_laces</name></material>
  <node>
    <name>misc_strap</name>
    <material>mat_laces</material>
    <box>1 1 1</box>
  </node>
</scene>
"#;
    let clock = Arc::new(ManualClock::new());
    let mut session = ConfiguratorSession::new(ConfiguratorConfig::default(), clock);
    session.load_scene(Scene::from_xml(scene).unwrap());
    let camera = session.camera();

    assert_eq!(session.click_ndc(Vec2::ZERO), ClickOutcome::Unrecognized);
    assert!(!session.is_animating());
    assert_eq!(session.emissive("mat_laces").unwrap(), Vec3::ZERO);
    assert_eq!(session.camera(), camera);
}

#[test]
fn resize_updates_the_camera_and_pixel_clicks_still_land() {
    let (_clock, mut session) = loaded_session();
    let viewport = Viewport::new(600, 600);
    session.resize(viewport);
    assert_eq!(session.camera().aspect, 1.0);

    let ndc = to_ndc(Vec2::new(300.0, 300.0), viewport);
    assert_eq!(
        session.click_ndc(ndc),
        ClickOutcome::Highlighted(PartCategory::Laces)
    );
}

#[test]
fn color_edits_are_not_blocked_by_a_running_highlight() {
    let (_clock, mut session) = loaded_session();
    session.click_ndc(ndc_of(&session, Vec3::ZERO));
    assert!(session.is_animating());

    let red = Vec3::new(1.0, 0.0, 0.0);
    assert_eq!(
        session.handle(Intent::ColorChangeRequested {
            category: PartCategory::Laces,
            color: red,
        }),
        IntentOutcome::Updated(PartCategory::Laces)
    );
    assert_eq!(
        session.store().state(PartCategory::Laces),
        Some(MaterialState::with_color(red))
    );
    assert!(session.is_animating());
}

#[test]
fn texture_then_color_then_reset() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("knit.png"), b"png").unwrap();
    let (_clock, session) = loaded_session();
    let mut session = session.with_textures(TextureLibrary::new(Some(dir.path().to_path_buf())));

    assert_eq!(
        session.handle(Intent::TextureChangeRequested {
            category: PartCategory::Outside,
            texture: "knit.png".to_string(),
        }),
        IntentOutcome::Updated(PartCategory::Outside)
    );
    let state = session.store().state(PartCategory::Outside).unwrap();
    assert_eq!(state.texture.unwrap().name, "knit.png");

    assert_eq!(
        session.handle(Intent::TextureChangeRequested {
            category: PartCategory::Sole,
            texture: "missing.png".to_string(),
        }),
        IntentOutcome::TextureUnavailable(PartCategory::Sole)
    );
    assert_eq!(
        session.store().state(PartCategory::Sole),
        Some(MaterialState::default())
    );

    let blue = Vec3::new(0.0, 0.0, 1.0);
    session.handle(Intent::ColorChangeRequested {
        category: PartCategory::Outside,
        color: blue,
    });
    assert_eq!(
        session.store().state(PartCategory::Outside),
        Some(MaterialState::with_color(blue))
    );

    assert_eq!(session.handle(Intent::ResetRequested), IntentOutcome::Reset);
    for category in PartCategory::CONFIGURABLE {
        assert_eq!(
            session.store().state(category),
            Some(MaterialState::default())
        );
    }
    assert_eq!(
        session.handle(Intent::ColorChangeRequested {
            category: PartCategory::Other,
            color: blue,
        }),
        IntentOutcome::Unchanged(PartCategory::Other)
    );
}

#[test]
fn shutdown_mid_animation_restores_the_material() {
    let (clock, mut session) = loaded_session();
    session.click_ndc(ndc_of(&session, Vec3::new(-3.0, 0.0, 0.0)));
    assert!(session.is_animating());
    assert_ne!(session.emissive("mat_outside_1").unwrap(), Vec3::ZERO);

    session.shutdown();
    assert!(!session.is_animating());
    assert_eq!(session.emissive("mat_outside_1").unwrap(), Vec3::ZERO);

    let camera = session.camera();
    advance(&mut session, &clock, 1000);
    assert_eq!(session.camera(), camera);
}

#[test]
fn intents_from_another_thread_are_applied_in_order() {
    let (_clock, mut session) = loaded_session();
    let sender = session.intent_sender();
    std::thread::spawn(move || {
        sender
            .send(Intent::ColorChangeRequested {
                category: PartCategory::Laces,
                color: Vec3::ZERO,
            })
            .unwrap();
        sender.send(Intent::ResetRequested).unwrap();
    })
    .join()
    .unwrap();

    let outcomes: Vec<IntentOutcome> = session
        .process_intents()
        .into_iter()
        .map(|(_, outcome)| outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![IntentOutcome::Updated(PartCategory::Laces), IntentOutcome::Reset]
    );
    assert_eq!(
        session.order().to_json().unwrap(),
        r##"{"parts":{"outside":{"color":"#ffffff"},"laces":{"color":"#ffffff"},"sole":{"color":"#ffffff"}}}"##
    );
}
