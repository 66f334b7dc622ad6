//! End-to-end flows through `Viewer` with an in-memory map and store.

use quickscale_map::layout::SheetState;
use quickscale_map::measure::EMPTY_LENGTH_LABEL;
use quickscale_map::prefs::{SHEET_KEY, THEME_KEY};
use quickscale_map::scale::{hud_scale_label, scale_from_zoom};
use quickscale_map::testing::FakeMap;
use quickscale_map::{
    ControlCorner, LatLng, Layer, MapCursor, MapEvent, MemoryStore, PreferenceStore, Theme,
    Viewer, ViewerConfig,
};
use std::time::{Duration, Instant};

const DESKTOP: [f32; 2] = [1280.0, 800.0];
const PHONE: [f32; 2] = [390.0, 844.0];

fn fixed_dpi_config() -> ViewerConfig {
    ViewerConfig {
        dpi: Some(96),
        ..ViewerConfig::default()
    }
}

fn started(store: MemoryStore, viewport: [f32; 2]) -> (Viewer<MemoryStore>, FakeMap, Instant) {
    let mut viewer = Viewer::new(fixed_dpi_config(), store);
    let mut map = FakeMap::ready();
    let now = Instant::now();
    viewer.install(&mut map, None, viewport, now);
    viewer.pump(&mut map);
    (viewer, map, now)
}

#[test]
fn startup_shows_hud_for_initial_view() {
    let (viewer, map, _) = started(MemoryStore::new(), DESKTOP);

    assert_eq!(viewer.hud().zoom_label, "12.00");
    assert_eq!(
        viewer.hud().scale_label,
        hud_scale_label(scale_from_zoom(19.4326, 12.0, 96))
    );
    assert_eq!(viewer.theme().current(), Theme::Dark);
    assert_eq!(map.tile_layers(), ["carto-dark"]);
    assert_eq!(map.zoom_control, ControlCorner::TopLeft);
}

#[test]
fn hud_follows_moves() {
    let (mut viewer, mut map, _) = started(MemoryStore::new(), DESKTOP);
    map.pan_to(LatLng::new(0.0, 0.0));
    viewer.pump(&mut map);
    assert_eq!(
        viewer.hud().scale_label,
        hud_scale_label(scale_from_zoom(0.0, 12.0, 96))
    );
}

#[test]
fn quick_scale_round_trips_through_the_hud() {
    let (mut viewer, mut map, _) = started(MemoryStore::new(), DESKTOP);

    let zoom = viewer.select_quick_scale(2, &mut map).unwrap();
    viewer.pump(&mut map);

    assert_eq!(map.zoom, zoom);
    assert_eq!(viewer.ribbon().selected_label(), "1:10,000");
    assert_eq!(viewer.hud().scale_label, "1:10,000");
}

#[test]
fn measuring_three_points_and_clearing() {
    let (mut viewer, mut map, _) = started(MemoryStore::new(), DESKTOP);
    let points = [
        LatLng::new(19.0, -99.0),
        LatLng::new(19.0, -98.99),
        LatLng::new(19.01, -98.99),
    ];

    viewer.toggle_measure(&mut map);
    assert_eq!(map.cursor, MapCursor::Crosshair);
    for p in points {
        map.click(p);
    }
    viewer.pump(&mut map);

    let expected = points[0].distance_to(&points[1]) + points[1].distance_to(&points[2]);
    assert!(expected >= 1000.0);
    assert_eq!(
        viewer.measure().length_label(),
        format!("{:.3} km", expected / 1000.0)
    );
    assert_eq!(map.count(|l| matches!(l, Layer::CircleMarker { .. })), 3);
    assert_eq!(map.count(|l| matches!(l, Layer::Polyline { points, .. } if points.len() == 3)), 1);

    viewer.clear_measure(&mut map);
    assert_eq!(viewer.measure().length_label(), EMPTY_LENGTH_LABEL);
    assert_eq!(map.count(|l| !matches!(l, Layer::Tiles(_))), 0);
    assert!(!viewer.measure().is_measuring());
    assert_eq!(map.cursor, MapCursor::Grab);
}

#[test]
fn short_measurement_is_in_meters() {
    let (mut viewer, mut map, _) = started(MemoryStore::new(), DESKTOP);
    viewer.toggle_measure(&mut map);
    map.click(LatLng::new(19.0, -99.0));
    map.click(LatLng::new(19.001, -99.0));
    viewer.pump(&mut map);
    assert!(viewer.measure().length_label().ends_with(" m"));
    assert_eq!(viewer.measure().length_label(), "111.2 m");
}

#[test]
fn double_click_stops_measuring_but_keeps_points() {
    let (mut viewer, mut map, _) = started(MemoryStore::new(), DESKTOP);
    viewer.toggle_measure(&mut map);
    map.click(LatLng::new(19.0, -99.0));
    map.click(LatLng::new(19.0, -98.99));
    map.events.push(MapEvent::DoubleClick(LatLng::new(19.0, -98.99)));
    map.click(LatLng::new(19.5, -98.5));
    viewer.pump(&mut map);

    assert!(!viewer.measure().is_measuring());
    assert_eq!(viewer.measure().points().len(), 2);
}

#[test]
fn theme_toggle_twice_restores_theme_and_storage() {
    let mut store = MemoryStore::new();
    store.set(THEME_KEY, "light").unwrap();
    let (mut viewer, mut map, _) = started(store, DESKTOP);
    assert_eq!(viewer.theme().current(), Theme::Light);

    viewer.toggle_theme(&mut map);
    assert_eq!(map.tile_layers(), ["carto-dark"]);
    viewer.toggle_theme(&mut map);

    assert_eq!(viewer.theme().current(), Theme::Light);
    assert_eq!(viewer.store().get(THEME_KEY).as_deref(), Some("light"));
    assert_eq!(map.tile_layers(), ["carto-light"]);
}

#[test]
fn measurement_survives_theme_and_viewport_changes() {
    let (mut viewer, mut map, now) = started(MemoryStore::new(), DESKTOP);
    viewer.toggle_measure(&mut map);
    map.click(LatLng::new(19.0, -99.0));
    map.click(LatLng::new(19.0, -98.99));
    viewer.pump(&mut map);
    let label = viewer.measure().length_label().to_owned();

    viewer.toggle_theme(&mut map);
    viewer.observe_viewport(PHONE, &mut map, now);

    assert_eq!(viewer.measure().points().len(), 2);
    assert_eq!(viewer.measure().length_label(), label);
    assert_eq!(map.count(|l| matches!(l, Layer::CircleMarker { .. })), 2);
}

#[test]
fn sheet_toggle_on_desktop_only_touches_storage() {
    let (mut viewer, _map, now) = started(MemoryStore::new(), DESKTOP);

    viewer.toggle_sheet(now);

    assert_eq!(viewer.store().get(SHEET_KEY).as_deref(), Some("collapsed"));
    let view = viewer.layout().view();
    assert!(!view.sheet_button_visible);
    assert!(!view.sheet_collapsed);
}

#[test]
fn mobile_sheet_collapses_and_map_is_invalidated_after_settling() {
    let (mut viewer, mut map, now) = started(MemoryStore::new(), PHONE);
    assert_eq!(map.zoom_control, ControlCorner::BottomRight);
    viewer.tick(&mut map, now + Duration::from_secs(1));
    let before = map.invalidations;

    viewer.toggle_sheet(now + Duration::from_secs(1));
    let view = viewer.layout().view();
    assert!(view.sheet_collapsed);
    assert_eq!(view.sheet_glyph, SheetState::Collapsed.glyph());

    let wait = viewer.tick(&mut map, now + Duration::from_secs(1));
    assert_eq!(wait, Some(Duration::from_millis(220)));
    viewer.tick(&mut map, now + Duration::from_millis(1220));
    assert_eq!(map.invalidations, before + 1);
}

#[test]
fn persisted_collapsed_sheet_is_restored_on_mobile() {
    let mut store = MemoryStore::new();
    store.set(SHEET_KEY, "collapsed").unwrap();
    let (viewer, _map, _) = started(store, PHONE);
    assert!(viewer.layout().view().sheet_collapsed);
    assert!(viewer.layout().view().sheet_button_visible);
}

#[test]
fn narrowing_the_window_switches_to_mobile_layout() {
    let (mut viewer, mut map, now) = started(MemoryStore::new(), DESKTOP);
    viewer.observe_viewport([640.0, 800.0], &mut map, now);

    assert!(viewer.layout().view().mobile);
    assert_eq!(map.zoom_control, ControlCorner::BottomRight);
    assert_eq!(map.invalidations, 1);
}
