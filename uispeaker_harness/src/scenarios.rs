// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior over the synthetic document.

use std::cell::Cell;
use std::rc::Rc;

use futures::executor::LocalPool;
use uispeaker_core::binder::{ShapeOptions, Trigger, Triggers, bind_event};
use uispeaker_core::dom::Signal;
use uispeaker_core::element::{ToggleSurface, infer_event};
use uispeaker_core::{EventCategory, SoundEntry, Speaker, SpeakerConfig};

use crate::{FakeAudio, NodeId, Rig, SyntheticDom};

const SOUND: &str = "data-uispeaker";
const EVENT: &str = "data-uispeaker-event";
const CLOSE: &str = "data-uispeaker-close";

fn rig_with(markup: impl FnOnce(&Rig) -> Vec<NodeId>) -> (Rig, Vec<NodeId>) {
    let mut rig = Rig::new();
    let nodes = markup(&rig);
    rig.init();
    (rig, nodes)
}

fn count(played: &[String], url: &str) -> usize {
    played.iter().filter(|p| *p == url).count()
}

#[test]
fn one_binding_per_marked_element() {
    let (mut rig, nodes) = rig_with(|rig| {
        let body = rig.dom.body();
        let button = rig.dom.add(body, "button", &[(SOUND, "click")]);
        let card = rig.dom.add(body, "div", &[(SOUND, "pop")]);
        let plain = rig.dom.add(body, "span", &[]);
        let nested = rig.dom.add(plain, "a", &[(SOUND, "tap")]);
        vec![button, card, plain, nested]
    });
    assert_eq!(rig.speaker.bound_count(), 3);
    assert_eq!(rig.dom.listener_count(nodes[0]), 1);
    assert_eq!(rig.dom.listener_count(nodes[2]), 0);
    assert_eq!(rig.dom.listener_count(nodes[3]), 1);

    rig.init();
    rig.speaker.init(None);
    assert_eq!(rig.speaker.bound_count(), 3);
    assert_eq!(rig.dom.total_listeners(), 3);
}

#[test]
fn button_click_plays_builtin_from_cdn() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    assert_eq!(
        rig.speaker.binding_of(&nodes[0]),
        Some(("click".into(), EventCategory::Click))
    );

    rig.click(nodes[0]);
    let url = rig.cdn_url("click.mp3");
    assert_eq!(rig.played(), vec![url.clone()]);
    assert_eq!(rig.audio.fetches(), vec![url.clone()]);

    rig.click(nodes[0]);
    assert_eq!(count(&rig.played(), &url), 2);
    assert_eq!(rig.audio.fetch_count(), 1, "second play hits the cache");
}

#[test]
fn nothing_loads_before_first_play() {
    let (rig, _) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    assert_eq!(rig.audio.contexts_created(), 0);
    assert_eq!(rig.audio.fetch_count(), 0);
}

#[test]
fn every_play_tries_to_resume() {
    let mut rig = Rig::new();
    rig.play("click");
    rig.play("click");
    assert_eq!(rig.audio.contexts_created(), 1);
    assert_eq!(rig.audio.resumes(), 2);
}

#[test]
fn checkbox_infers_click() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "input",
            &[("type", "checkbox"), (SOUND, "tap")],
        )]
    });
    assert_eq!(
        rig.speaker.binding_of(&nodes[0]),
        Some(("tap".into(), EventCategory::Click))
    );
    rig.click(nodes[0]);
    assert_eq!(rig.played(), vec![rig.cdn_url("tap.mp3")]);
}

#[test]
fn focus_and_blur_fire_on_their_signals() {
    let (mut rig, nodes) = rig_with(|rig| {
        let body = rig.dom.body();
        vec![
            rig.dom.add(body, "input", &[(SOUND, "tap"), (EVENT, "focus")]),
            rig.dom.add(body, "button", &[(SOUND, "pop"), (EVENT, "blur")]),
        ]
    });
    let (field, button) = (nodes[0], nodes[1]);
    let tap = rig.cdn_url("tap.mp3");
    let pop = rig.cdn_url("pop.mp3");

    rig.click(field);
    rig.dispatch(field, Signal::Blur);
    rig.click(button);
    rig.dispatch(button, Signal::Focus);
    assert!(rig.played().is_empty(), "only the chosen signal is wired");

    rig.dispatch(field, Signal::Focus);
    rig.dispatch(button, Signal::Blur);
    assert_eq!(rig.played(), vec![tap, pop]);
}

#[test]
fn notifications_fire_on_click() {
    let (mut rig, nodes) = rig_with(|rig| {
        let body = rig.dom.body();
        vec![
            rig.dom.add(body, "div", &[(SOUND, "success")]),
            rig.dom.add(body, "button", &[(SOUND, "error"), (EVENT, "error")]),
            rig.dom.add(body, "span", &[(SOUND, "warning"), (EVENT, "warning")]),
        ]
    });
    assert_eq!(
        rig.speaker.binding_of(&nodes[0]),
        Some(("success".into(), EventCategory::Click))
    );
    assert_eq!(
        rig.speaker.binding_of(&nodes[1]),
        Some(("error".into(), EventCategory::Error))
    );
    assert_eq!(
        rig.speaker.binding_of(&nodes[2]),
        Some(("warning".into(), EventCategory::Warning))
    );

    rig.dispatch(nodes[1], Signal::PointerEnter);
    rig.dispatch(nodes[2], Signal::Focus);
    assert!(rig.played().is_empty());

    for node in &nodes {
        rig.click(*node);
    }
    assert_eq!(
        rig.played(),
        vec![
            rig.cdn_url("success.mp3"),
            rig.cdn_url("error.mp3"),
            rig.cdn_url("warning.mp3"),
        ]
    );
}

#[test]
fn removed_element_stops_firing() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    let button = nodes[0];

    rig.dom.remove(button);
    rig.flush();
    assert_eq!(rig.speaker.bound_count(), 0);
    assert_eq!(rig.dom.listener_count(button), 0);

    rig.click(button);
    assert!(rig.played().is_empty());
}

#[test]
fn removing_a_container_unbinds_its_descendants() {
    let (mut rig, nodes) = rig_with(|rig| {
        let body = rig.dom.body();
        let menu = rig.dom.add(body, "nav", &[]);
        let first = rig.dom.add(menu, "a", &[(SOUND, "tap")]);
        let second = rig.dom.add(menu, "a", &[(SOUND, "tap")]);
        vec![menu, first, second]
    });
    assert_eq!(rig.speaker.bound_count(), 2);

    rig.dom.remove(nodes[0]);
    rig.flush();
    assert_eq!(rig.speaker.bound_count(), 0);
    assert_eq!(rig.dom.total_listeners(), 0);
}

#[test]
fn inserted_subtree_is_bound() {
    let mut rig = Rig::new();
    rig.init();
    assert_eq!(rig.speaker.bound_count(), 0);

    let panel = rig.dom.create("section");
    let button = rig.dom.add(panel, "button", &[(SOUND, "pop")]);
    rig.dom.append(rig.dom.body(), panel);
    assert_eq!(rig.speaker.bound_count(), 0, "bound only on delivery");

    rig.flush();
    assert_eq!(rig.speaker.bound_count(), 1);
    rig.click(button);
    assert_eq!(rig.played(), vec![rig.cdn_url("pop.mp3")]);
}

#[test]
fn add_remove_add_in_one_batch_binds_once() {
    let mut rig = Rig::new();
    rig.init();
    let body = rig.dom.body();
    let button = rig.dom.add(body, "button", &[(SOUND, "click")]);
    rig.dom.remove(button);
    rig.dom.append(body, button);

    rig.flush();
    assert_eq!(rig.speaker.bound_count(), 1);
    assert_eq!(rig.dom.listener_count(button), 1);
}

#[test]
fn trigger_change_rebinds() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    let button = nodes[0];

    rig.dom.set_attribute(button, SOUND, "pop");
    rig.flush();
    assert_eq!(
        rig.speaker.binding_of(&button),
        Some(("pop".into(), EventCategory::Click))
    );
    assert_eq!(rig.dom.listener_count(button), 1);

    rig.click(button);
    assert_eq!(rig.played(), vec![rig.cdn_url("pop.mp3")]);
}

#[test]
fn removing_trigger_unbinds() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    rig.dom.remove_attribute(nodes[0], SOUND);
    rig.flush();
    assert_eq!(rig.speaker.bound_count(), 0);
    assert_eq!(rig.dom.listener_count(nodes[0]), 0);
}

#[test]
fn event_override_change_rebinds() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "div", &[(SOUND, "swoosh")])]
    });
    let card = nodes[0];
    assert_eq!(
        rig.speaker.binding_of(&card),
        Some(("swoosh".into(), EventCategory::Click))
    );

    rig.dom.set_attribute(card, EVENT, "hover");
    rig.flush();
    assert_eq!(
        rig.speaker.binding_of(&card),
        Some(("swoosh".into(), EventCategory::Hover))
    );

    rig.click(card);
    assert!(rig.played().is_empty());
    rig.dispatch(card, Signal::PointerEnter);
    rig.dispatch(card, Signal::PointerEnter);
    assert_eq!(count(&rig.played(), &rig.cdn_url("swoosh.mp3")), 2);
}

#[test]
fn unknown_override_falls_back_to_inference() {
    let (rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "textarea",
            &[(SOUND, "keystroke"), (EVENT, "wiggle")],
        )]
    });
    assert_eq!(
        rig.speaker.binding_of(&nodes[0]),
        Some(("keystroke".into(), EventCategory::Input))
    );
}

#[test]
fn empty_trigger_is_not_bound() {
    let (rig, _) = rig_with(|rig| vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "")])]);
    assert_eq!(rig.speaker.bound_count(), 0);
}

#[test]
fn input_is_debounced_from_the_last_event() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "input", &[(SOUND, "keystroke")])]
    });
    let field = nodes[0];

    rig.dispatch(field, Signal::Input);
    rig.advance(30);
    rig.dispatch(field, Signal::KeyDown);
    rig.advance(30);
    rig.dispatch(field, Signal::Input);
    rig.advance(79);
    assert!(rig.played().is_empty());
    assert_eq!(rig.dom.pending_timers(), 1);

    rig.advance(1);
    assert_eq!(rig.played(), vec![rig.cdn_url("keystroke.mp3")]);
    assert_eq!(rig.dom.pending_timers(), 0);
}

#[test]
fn custom_debounce_window() {
    let mut rig = Rig::with_config(SpeakerConfig::default().with_input_debounce_ms(20));
    let field = rig.dom.add(rig.dom.body(), "textarea", &[(SOUND, "typewriter")]);
    rig.init();

    rig.dispatch(field, Signal::Input);
    rig.advance(20);
    assert_eq!(rig.played().len(), 1);
}

#[test]
fn release_cancels_pending_debounce() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "input", &[(SOUND, "keystroke")])]
    });
    rig.dispatch(nodes[0], Signal::Input);
    rig.dom.remove(nodes[0]);
    rig.flush();
    assert_eq!(rig.dom.pending_timers(), 0);

    rig.advance(500);
    assert!(rig.played().is_empty());
}

#[test]
fn mousemove_is_throttled_leading_edge() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "canvas",
            &[(SOUND, "slide"), (EVENT, "mousemove")],
        )]
    });
    let surface = nodes[0];
    let url = rig.cdn_url("slide.mp3");

    rig.dispatch(surface, Signal::PointerMove);
    assert_eq!(count(&rig.played(), &url), 1, "first move fires immediately");

    // 250 ms of moves every 10 ms.
    for _ in 0..25 {
        rig.advance(10);
        rig.dispatch(surface, Signal::PointerMove);
    }
    assert_eq!(count(&rig.played(), &url), 3);
}

#[test]
fn details_plays_open_and_close_once_per_transition() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "details",
            &[(SOUND, "open"), (CLOSE, "close")],
        )]
    });
    let details = nodes[0];
    let open = rig.cdn_url("open.mp3");
    let close = rig.cdn_url("close.mp3");
    assert_eq!(rig.dom.listener_count(details), 1);

    rig.dom.set_attribute(details, "open", "");
    rig.dispatch(details, Signal::Toggle);
    assert_eq!(rig.played(), vec![open.clone()]);

    rig.dom.remove_attribute(details, "open");
    rig.dispatch(details, Signal::Toggle);
    assert_eq!(rig.played(), vec![open, close]);
}

#[test]
fn details_without_close_sound_is_silent_on_close() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "details", &[(SOUND, "open")])]
    });
    rig.dispatch(nodes[0], Signal::Toggle);
    assert!(rig.played().is_empty());
}

#[test]
fn dialog_watches_open_and_close_signal() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "dialog",
            &[(SOUND, "open"), (CLOSE, "close")],
        )]
    });
    let dialog = nodes[0];
    let open = rig.cdn_url("open.mp3");
    let close = rig.cdn_url("close.mp3");

    rig.dom.set_attribute(dialog, "open", "");
    rig.flush();
    assert_eq!(rig.played(), vec![open.clone()]);

    rig.dom.remove_attribute(dialog, "open");
    rig.flush();
    assert_eq!(count(&rig.played(), &close), 1);

    rig.dispatch(dialog, Signal::Close);
    assert_eq!(count(&rig.played(), &close), 2);
    assert_eq!(count(&rig.played(), &open), 1);
}

#[test]
fn data_state_toggle() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "div",
            &[("data-state", "closed"), (SOUND, "open"), (CLOSE, "close")],
        )]
    });
    let panel = nodes[0];
    assert_eq!(
        rig.speaker.binding_of(&panel),
        Some(("open".into(), EventCategory::Open))
    );

    rig.dom.set_attribute(panel, "data-state", "open");
    rig.flush();
    rig.dom.set_attribute(panel, "data-state", "closed");
    rig.flush();
    rig.dom.set_attribute(panel, "data-state", "indeterminate");
    rig.flush();
    assert_eq!(
        rig.played(),
        vec![rig.cdn_url("open.mp3"), rig.cdn_url("close.mp3")]
    );
}

#[test]
fn close_override_drives_primary_sound() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "details",
            &[("open", ""), (SOUND, "close"), (EVENT, "close")],
        )]
    });
    let details = nodes[0];
    rig.dispatch(details, Signal::Toggle);
    assert!(rig.played().is_empty(), "open half is not wired");

    rig.dom.remove_attribute(details, "open");
    rig.dispatch(details, Signal::Toggle);
    assert_eq!(rig.played(), vec![rig.cdn_url("close.mp3")]);
}

#[test]
fn open_override_on_plain_element_watches_data_state() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "button",
            &[(SOUND, "open"), (EVENT, "open"), (CLOSE, "close")],
        )]
    });
    let trigger = nodes[0];
    assert_eq!(
        rig.speaker.binding_of(&trigger),
        Some(("open".into(), EventCategory::Open))
    );

    rig.click(trigger);
    assert!(rig.played().is_empty(), "click is not wired");

    rig.dom.set_attribute(trigger, "data-state", "open");
    rig.flush();
    rig.dom.set_attribute(trigger, "data-state", "closed");
    rig.flush();
    assert_eq!(
        rig.played(),
        vec![rig.cdn_url("open.mp3"), rig.cdn_url("close.mp3")]
    );
}

#[test]
fn close_override_on_dialog() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "dialog",
            &[(SOUND, "close"), (EVENT, "close")],
        )]
    });
    let dialog = nodes[0];
    let close = rig.cdn_url("close.mp3");
    assert_eq!(rig.dom.listener_count(dialog), 1);

    rig.dom.set_attribute(dialog, "open", "");
    rig.flush();
    assert!(rig.played().is_empty(), "open half is not wired");

    rig.dom.remove_attribute(dialog, "open");
    rig.flush();
    assert_eq!(rig.played(), vec![close.clone()]);

    rig.dispatch(dialog, Signal::Close);
    assert_eq!(count(&rig.played(), &close), 2);
}

#[test]
fn close_override_on_data_state() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "div",
            &[("data-state", "closed"), (SOUND, "close"), (EVENT, "close")],
        )]
    });
    let panel = nodes[0];

    rig.dom.set_attribute(panel, "data-state", "open");
    rig.flush();
    assert!(rig.played().is_empty());

    rig.dom.set_attribute(panel, "data-state", "closed");
    rig.flush();
    assert_eq!(rig.played(), vec![rig.cdn_url("close.mp3")]);
}

#[test]
fn close_sound_ignored_outside_open() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(
            rig.dom.body(),
            "button",
            &[(SOUND, "click"), (CLOSE, "close")],
        )]
    });
    rig.click(nodes[0]);
    assert_eq!(rig.played(), vec![rig.cdn_url("click.mp3")]);
}

#[test]
fn concurrent_cold_plays_share_one_fetch() {
    let mut rig = Rig::new();
    rig.audio.hold_fetches(true);
    rig.play("success");
    rig.play("success");
    assert_eq!(rig.audio.fetch_count(), 1);
    assert!(rig.played().is_empty());

    rig.audio.release_fetches();
    rig.run();
    let url = rig.cdn_url("success.mp3");
    assert_eq!(rig.played(), vec![url.clone(), url]);
    assert_eq!(rig.audio.fetch_count(), 1);
    assert_eq!(rig.speaker.pipeline().loading_count(), 0);
}

#[test]
fn failed_load_is_retried_next_time() {
    let mut rig = Rig::new();
    let url = rig.cdn_url("error.mp3");
    rig.audio.fail(&url);
    rig.play("error");
    rig.play("error");
    assert!(rig.played().is_empty());
    assert_eq!(rig.audio.fetch_count(), 2);
    assert!(!rig.speaker.pipeline().is_cached(&url));
}

#[test]
fn unknown_sound_is_skipped() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "kazoo")])]
    });
    assert_eq!(rig.speaker.bound_count(), 1);
    rig.click(nodes[0]);
    assert_eq!(rig.audio.fetch_count(), 0);
    assert!(rig.played().is_empty());
}

#[test]
fn direct_urls_play_as_is() {
    let mut rig = Rig::new();
    rig.play("/sounds/local.wav");
    rig.play("https://example.test/a.ogg");
    assert_eq!(
        rig.played(),
        vec!["/sounds/local.wav".to_owned(), "https://example.test/a.ogg".to_owned()]
    );
}

#[test]
fn custom_registration_shadows_builtin_until_unregistered() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    rig.speaker.register("click", SoundEntry::new("/mine/click.wav"));
    rig.click(nodes[0]);
    assert_eq!(rig.played(), vec!["/mine/click.wav".to_owned()]);

    assert!(rig.speaker.unregister("click"));
    rig.click(nodes[0]);
    assert_eq!(rig.played().last(), Some(&rig.cdn_url("click.mp3")));
}

#[test]
fn registered_names_are_listed() {
    let rig = Rig::new();
    rig.speaker.register("x", SoundEntry::new("/x.mp3"));
    assert!(rig.speaker.sounds().contains(&"x".to_owned()));
    rig.speaker.unregister("x");
    assert!(!rig.speaker.sounds().contains(&"x".to_owned()));
    assert_eq!(rig.speaker.sounds().len(), 13);
}

#[test]
fn cdn_base_change_applies_to_later_plays() {
    let mut rig = Rig::new();
    rig.speaker.set_cdn_base("https://cdn.test/sfx/");
    assert_eq!(rig.speaker.cdn_base(), "https://cdn.test/sfx");
    rig.play("pop");
    assert_eq!(rig.played(), vec!["https://cdn.test/sfx/pop.mp3".to_owned()]);
}

#[test]
fn muted_play_skips_loading() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    rig.speaker.mute();
    rig.click(nodes[0]);
    assert_eq!(rig.audio.fetch_count(), 0);
    assert!(rig.played().is_empty());

    rig.speaker.unmute();
    rig.click(nodes[0]);
    assert_eq!(rig.played().len(), 1);
}

#[test]
fn volume_and_mute_drive_gain() {
    let mut rig = Rig::with_config(SpeakerConfig::default().with_volume(0.5));
    rig.play("click");
    assert_eq!(rig.audio.last_gain(), Some(0.5));

    rig.speaker.volume(2.0);
    assert_eq!(rig.speaker.get_volume(), 1.0);
    assert_eq!(rig.audio.last_gain(), Some(1.0));

    rig.speaker.mute();
    assert!(rig.speaker.is_muted());
    assert_eq!(rig.audio.last_gain(), Some(0.0));
    rig.speaker.volume(0.3);
    assert_eq!(rig.audio.last_gain(), Some(0.0));

    rig.speaker.unmute();
    assert_eq!(rig.audio.last_gain(), Some(0.3));
}

#[test]
fn destroy_releases_everything_and_init_restarts() {
    let (mut rig, nodes) = rig_with(|rig| {
        vec![rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")])]
    });
    rig.click(nodes[0]);
    assert_eq!(rig.audio.contexts_created(), 1);

    rig.speaker.destroy();
    assert_eq!(rig.speaker.bound_count(), 0);
    assert_eq!(rig.dom.total_listeners(), 0);
    assert_eq!(rig.dom.watcher_count(), 0);
    assert_eq!(rig.audio.contexts_closed(), 1);
    rig.speaker.destroy();
    assert_eq!(rig.audio.contexts_closed(), 1);

    rig.click(nodes[0]);
    assert_eq!(rig.played().len(), 1, "no listeners after destroy");

    rig.init();
    assert_eq!(rig.speaker.bound_count(), 1);
    rig.click(nodes[0]);
    assert_eq!(rig.played().len(), 2);
    assert_eq!(rig.audio.contexts_created(), 2);
    assert_eq!(rig.audio.fetch_count(), 2, "cache was dropped");
}

#[test]
fn load_abandoned_by_destroy_is_not_cached() {
    let mut rig = Rig::new();
    rig.audio.hold_fetches(true);
    rig.play("warning");
    rig.speaker.destroy();

    rig.audio.release_fetches();
    rig.run();
    assert!(rig.played().is_empty());
    assert_eq!(rig.speaker.pipeline().cached_count(), 0);
}

#[test]
fn init_without_root_can_be_retried() {
    let mut rig = Rig::new();
    rig.dom.add(rig.dom.body(), "button", &[(SOUND, "click")]);
    rig.speaker.init(None);
    assert!(!rig.speaker.is_initialized());

    rig.init();
    assert!(rig.speaker.is_initialized());
    assert_eq!(rig.speaker.bound_count(), 1);
}

#[test]
fn configured_root_limits_the_scan() {
    let pool = LocalPool::new();
    let dom = Rc::new(SyntheticDom::new());
    let body = dom.body();
    let section = dom.add(body, "section", &[]);
    dom.add(section, "button", &[(SOUND, "click")]);
    dom.add(body, "button", &[(SOUND, "pop")]);

    let config = SpeakerConfig::default().with_root(section);
    let speaker = Speaker::new(Rc::clone(&dom), FakeAudio::new(pool.spawner()), config);
    speaker.init(None);
    assert!(speaker.is_initialized());
    assert_eq!(speaker.bound_count(), 1);
}

#[test]
fn manifest_extends_and_versions_the_registry() {
    let mut rig = Rig::new();
    rig.audio.serve(
        "/registry.json",
        r#"{"version":"2.0.0","sounds":{"chime":{"file":"chime.ogg","defaultEvent":"success"}}}"#,
    );
    assert_eq!(rig.speaker.version(), "1.0.0");

    rig.load_manifest("/registry.json");
    assert_eq!(rig.speaker.version(), "2.0.0");
    assert!(rig.speaker.sounds().contains(&"chime".to_owned()));

    let details = rig.speaker.sound_details();
    let (_, chime) = details.iter().find(|(name, _)| name == "chime").unwrap();
    assert_eq!(chime.default_event, Some(EventCategory::Success));
    assert_eq!(chime.category.as_deref(), Some("other"));

    rig.play("chime");
    assert_eq!(rig.played(), vec![rig.cdn_url("chime.ogg")]);
}

#[test]
fn failed_manifest_leaves_registry_unchanged() {
    let mut rig = Rig::new();
    rig.audio.fail("/missing.json");
    rig.load_manifest("/missing.json");
    rig.audio.serve("/broken.json", "{not json");
    rig.load_manifest("/broken.json");
    assert_eq!(rig.speaker.version(), "1.0.0");
    assert_eq!(rig.speaker.sounds().len(), 13);
}

fn counter() -> (Rc<Cell<u32>>, Trigger) {
    let hits = Rc::new(Cell::new(0));
    let trigger: Trigger = {
        let hits = Rc::clone(&hits);
        Rc::new(move || hits.set(hits.get() + 1))
    };
    (hits, trigger)
}

#[test]
fn binding_owns_its_attachments_until_released() {
    let dom = Rc::new(SyntheticDom::new());
    let dialog = dom.add(dom.body(), "dialog", &[]);
    let (opened, on_open) = counter();
    let (closed, on_close) = counter();

    let mut binding = bind_event(
        &dom,
        &dialog,
        ToggleSurface::Modal,
        EventCategory::Open,
        Triggers::new(on_open).with_close(on_close),
        ShapeOptions::default(),
    );
    assert_eq!(binding.category(), EventCategory::Open);
    assert!(binding.triggers().close.is_some());
    assert!(binding.is_live());
    assert_eq!(binding.attachment_count(), 2, "close listener and open watcher");
    assert_eq!(dom.listener_count(dialog), 1);
    assert_eq!(dom.watcher_count(), 1);

    dom.set_attribute(dialog, "open", "");
    dom.flush();
    dom.dispatch(dialog, Signal::Close);
    assert_eq!((opened.get(), closed.get()), (1, 1));

    binding.release();
    assert!(!binding.is_live());
    assert_eq!(binding.attachment_count(), 0);
    assert_eq!(dom.total_listeners(), 0);
    assert_eq!(dom.watcher_count(), 0);

    dom.remove_attribute(dialog, "open");
    dom.flush();
    dom.dispatch(dialog, Signal::Close);
    assert_eq!((opened.get(), closed.get()), (1, 1));

    binding.release();
    assert_eq!(binding.attachment_count(), 0);
}

#[test]
fn disclosure_binding_without_close_trigger() {
    let dom = Rc::new(SyntheticDom::new());
    let details = dom.add(dom.body(), "details", &[]);
    let (opened, on_open) = counter();

    let binding = bind_event(
        &dom,
        &details,
        ToggleSurface::Disclosure,
        EventCategory::Open,
        Triggers::new(on_open),
        ShapeOptions::default(),
    );
    assert!(binding.triggers().close.is_none());
    assert_eq!(binding.attachment_count(), 1);

    dom.set_attribute(details, "open", "");
    dom.dispatch(details, Signal::Toggle);
    dom.remove_attribute(details, "open");
    dom.dispatch(details, Signal::Toggle);
    assert_eq!(opened.get(), 1);

    drop(binding);
    assert_eq!(dom.listener_count(details), 0);
}

#[test]
fn inference_reads_the_live_element() {
    let dom = SyntheticDom::new();
    let body = dom.body();
    let cases = [
        (dom.add(body, "input", &[("type", "checkbox")]), EventCategory::Click),
        (dom.add(body, "input", &[]), EventCategory::Input),
        (dom.add(body, "textarea", &[]), EventCategory::Input),
        (dom.add(body, "div", &[("contenteditable", "true")]), EventCategory::Input),
        (dom.add(body, "details", &[]), EventCategory::Open),
        (dom.add(body, "dialog", &[]), EventCategory::Open),
        (dom.add(body, "div", &[("data-state", "closed")]), EventCategory::Open),
        (dom.add(body, "div", &[("role", "switch")]), EventCategory::Click),
        (dom.add(body, "section", &[]), EventCategory::Click),
    ];
    for (node, expected) in cases {
        assert_eq!(infer_event(&dom, &node), expected, "{node:?}");
    }

    let overridden = dom.add(body, "textarea", &[(EVENT, "hover")]);
    assert_eq!(infer_event(&dom, &overridden), EventCategory::Input);
}
