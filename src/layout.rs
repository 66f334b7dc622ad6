//! Side panel layout for narrow viewports.
//!
//! On a mobile-width viewport the side panel becomes a bottom sheet that can
//! be collapsed, the sheet toggle is shown and the zoom control moves to the
//! bottom-right corner. Any layout shift the map did not cause itself is
//! followed by a (deferred) size invalidation of the map.

use crate::map_widget::{ControlCorner, MapWidget};
use crate::prefs::{PreferenceStore, SHEET_KEY, persist};
use crate::schedule::Deferred;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::{Duration, Instant};

/// Viewports this wide or narrower use the mobile layout.
pub const MOBILE_BREAKPOINT: f32 = 700.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetState {
    #[default]
    Expanded,
    Collapsed,
}

impl SheetState {
    pub fn as_str(self) -> &'static str {
        match self {
            SheetState::Expanded => "expanded",
            SheetState::Collapsed => "collapsed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "expanded" => Some(SheetState::Expanded),
            "collapsed" => Some(SheetState::Collapsed),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SheetState::Expanded => SheetState::Collapsed,
            SheetState::Collapsed => SheetState::Expanded,
        }
    }

    /// Glyph for the sheet toggle: points where the sheet will go.
    pub fn glyph(self) -> &'static str {
        match self {
            SheetState::Expanded => "▾",
            SheetState::Collapsed => "▴",
        }
    }
}

/// Persisted sheet state; missing or unknown values mean expanded.
pub fn sheet_state(store: &impl PreferenceStore) -> SheetState {
    store
        .get(SHEET_KEY)
        .as_deref()
        .and_then(SheetState::parse)
        .unwrap_or_default()
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub mobile_breakpoint: f32,
    /// Quiet period after the last resize before the map is invalidated.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub resize_debounce: Duration,
    /// Delay after a sheet change, long enough for the panel to settle.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub sheet_settle: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub orientation_settle: Duration,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            mobile_breakpoint: MOBILE_BREAKPOINT,
            resize_debounce: Duration::from_millis(120),
            sheet_settle: Duration::from_millis(220),
            orientation_settle: Duration::from_millis(300),
        }
    }
}

/// What the panels should look like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutView {
    pub mobile: bool,
    pub sheet_collapsed: bool,
    pub sheet_button_visible: bool,
    pub sheet_glyph: &'static str,
    pub zoom_control: ControlCorner,
}

impl Default for LayoutView {
    fn default() -> Self {
        Self {
            mobile: false,
            sheet_collapsed: false,
            sheet_button_visible: false,
            sheet_glyph: SheetState::Expanded.glyph(),
            zoom_control: ControlCorner::TopRight,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MobileLayout {
    options: LayoutOptions,
    viewport: Option<[f32; 2]>,
    view: LayoutView,
    settle: Deferred,
    resize: Deferred,
    orientation: Deferred,
}

fn is_portrait(size: [f32; 2]) -> bool {
    size[1] > size[0]
}

impl MobileLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn view(&self) -> &LayoutView {
        &self.view
    }

    pub fn viewport(&self) -> Option<[f32; 2]> {
        self.viewport
    }

    pub fn is_mobile(&self) -> bool {
        self.viewport
            .is_some_and(|size| size[0] <= self.options.mobile_breakpoint)
    }

    /// Records the viewport size without reacting to the change.
    pub fn set_viewport(&mut self, size: [f32; 2]) {
        self.viewport = Some(size);
    }

    /// Places the zoom control for the current viewport and applies the sheet.
    pub fn setup(&mut self, map: &mut impl MapWidget, store: &impl PreferenceStore, now: Instant) {
        let corner = if self.is_mobile() {
            ControlCorner::BottomRight
        } else {
            ControlCorner::TopLeft
        };
        map.set_zoom_control_position(corner);
        self.view.zoom_control = corner;
        self.apply_sheet_state(store, now);
    }

    /// Reflects the persisted sheet state into the view. Only mobile viewports
    /// show the toggle or collapse the panel.
    pub fn apply_sheet_state(&mut self, store: &impl PreferenceStore, now: Instant) {
        if !self.is_mobile() {
            self.view.mobile = false;
            self.view.sheet_collapsed = false;
            self.view.sheet_button_visible = false;
            return;
        }

        let state = sheet_state(store);
        self.view.mobile = true;
        self.view.sheet_button_visible = true;
        self.view.sheet_collapsed = state == SheetState::Collapsed;
        self.view.sheet_glyph = state.glyph();
        self.settle.schedule(now, self.options.sheet_settle);
    }

    /// Flips and persists the sheet state, then re-applies it.
    pub fn toggle_sheet(&mut self, store: &mut impl PreferenceStore, now: Instant) -> SheetState {
        let next = sheet_state(&*store).toggled();
        persist(store, SHEET_KEY, next.as_str());
        self.apply_sheet_state(&*store, now);
        next
    }

    /// Reacts to a new viewport size. Crossing the breakpoint re-runs the setup
    /// and invalidates the map at once; every change is also a debounced resize
    /// and a portrait/landscape flip counts as an orientation change.
    pub fn observe_viewport(
        &mut self,
        size: [f32; 2],
        map: &mut impl MapWidget,
        store: &impl PreferenceStore,
        now: Instant,
    ) {
        let Some(previous) = self.viewport.replace(size) else {
            self.setup(map, store, now);
            return;
        };
        if previous == size {
            return;
        }

        let breakpoint = self.options.mobile_breakpoint;
        if (previous[0] <= breakpoint) != (size[0] <= breakpoint) {
            log::debug!(
                "Viewport crossed {breakpoint}px: {} -> {}",
                previous[0],
                size[0]
            );
            self.setup(map, store, now);
            map.invalidate_size();
        }

        if is_portrait(previous) != is_portrait(size) {
            self.orientation.schedule(now, self.options.orientation_settle);
        }

        self.resize.schedule(now, self.options.resize_debounce);
    }

    /// Runs due invalidations. Returns whether the map was invalidated.
    pub fn poll(&mut self, map: &mut impl MapWidget, now: Instant) -> bool {
        let fired = [&mut self.settle, &mut self.resize, &mut self.orientation]
            .into_iter()
            .fold(false, |fired, deferred| deferred.fire_if_due(now) | fired);
        if fired {
            map.invalidate_size();
        }
        fired
    }

    /// Time until the next pending invalidation.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        [&self.settle, &self.resize, &self.orientation]
            .into_iter()
            .filter_map(|deferred| deferred.remaining(now))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryStore;
    use crate::testing::FakeMap;

    const PHONE: [f32; 2] = [390.0, 844.0];
    const DESKTOP: [f32; 2] = [1280.0, 800.0];

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn invalid_sheet_value_means_expanded() {
        let mut store = MemoryStore::new();
        assert_eq!(sheet_state(&store), SheetState::Expanded);
        store.set(SHEET_KEY, "half").unwrap();
        assert_eq!(sheet_state(&store), SheetState::Expanded);
        store.set(SHEET_KEY, "collapsed").unwrap();
        assert_eq!(sheet_state(&store), SheetState::Collapsed);
    }

    #[test]
    fn desktop_setup_hides_sheet_controls() {
        let mut map = FakeMap::default();
        let store = MemoryStore::new();
        let mut layout = MobileLayout::default();
        layout.set_viewport(DESKTOP);
        layout.setup(&mut map, &store, Instant::now());

        assert_eq!(map.zoom_control, ControlCorner::TopLeft);
        assert!(!layout.view().mobile);
        assert!(!layout.view().sheet_button_visible);
        assert!(!layout.view().sheet_collapsed);
        assert_eq!(layout.next_deadline(Instant::now()), None);
    }

    #[test]
    fn mobile_setup_applies_collapsed_sheet_and_settles() {
        let mut map = FakeMap::default();
        let mut store = MemoryStore::new();
        store.set(SHEET_KEY, "collapsed").unwrap();
        let mut layout = MobileLayout::default();
        let start = Instant::now();
        layout.set_viewport(PHONE);
        layout.setup(&mut map, &store, start);

        assert_eq!(map.zoom_control, ControlCorner::BottomRight);
        assert!(layout.view().sheet_button_visible);
        assert!(layout.view().sheet_collapsed);
        assert_eq!(layout.view().sheet_glyph, "▴");

        assert!(!layout.poll(&mut map, start + ms(219)));
        assert!(layout.poll(&mut map, start + ms(220)));
        assert_eq!(map.invalidations, 1);
    }

    #[test]
    fn toggling_on_desktop_changes_storage_only() {
        let mut store = MemoryStore::new();
        let mut layout = MobileLayout::default();
        layout.set_viewport(DESKTOP);

        assert_eq!(layout.toggle_sheet(&mut store, Instant::now()), SheetState::Collapsed);
        assert_eq!(store.get(SHEET_KEY).as_deref(), Some("collapsed"));
        assert!(!layout.view().sheet_button_visible);
        assert!(!layout.view().sheet_collapsed);
    }

    #[test]
    fn toggling_on_mobile_flips_the_sheet() {
        let mut store = MemoryStore::new();
        let mut layout = MobileLayout::default();
        layout.set_viewport(PHONE);
        let now = Instant::now();

        layout.toggle_sheet(&mut store, now);
        assert!(layout.view().sheet_collapsed);
        layout.toggle_sheet(&mut store, now);
        assert!(!layout.view().sheet_collapsed);
        assert_eq!(layout.view().sheet_glyph, "▾");
        assert_eq!(store.get(SHEET_KEY).as_deref(), Some("expanded"));
    }

    #[test]
    fn crossing_breakpoint_invalidates_immediately() {
        let mut map = FakeMap::default();
        let store = MemoryStore::new();
        let mut layout = MobileLayout::default();
        let start = Instant::now();
        layout.observe_viewport(DESKTOP, &mut map, &store, start);
        assert_eq!(map.invalidations, 0);

        layout.observe_viewport([650.0, 800.0], &mut map, &store, start);
        assert_eq!(map.invalidations, 1);
        assert!(layout.view().mobile);
        assert_eq!(map.zoom_control, ControlCorner::BottomRight);
    }

    #[test]
    fn resize_burst_is_debounced() {
        let mut map = FakeMap::default();
        let store = MemoryStore::new();
        let mut layout = MobileLayout::default();
        let start = Instant::now();
        layout.observe_viewport(DESKTOP, &mut map, &store, start);

        for step in 0..5 {
            let size = [1200.0 - step as f32 * 10.0, 800.0];
            layout.observe_viewport(size, &mut map, &store, start + ms(step * 50));
        }
        assert!(!layout.poll(&mut map, start + ms(300)));
        assert_eq!(layout.next_deadline(start + ms(300)), Some(ms(20)));
        assert!(layout.poll(&mut map, start + ms(320)));
        assert_eq!(map.invalidations, 1);
    }

    #[test]
    fn orientation_flip_invalidates_after_settle() {
        let mut map = FakeMap::default();
        let store = MemoryStore::new();
        let mut layout = MobileLayout::default();
        let start = Instant::now();
        layout.observe_viewport(PHONE, &mut map, &store, start);
        layout.poll(&mut map, start + ms(1000));
        let before = map.invalidations;

        layout.observe_viewport([600.0, 390.0], &mut map, &store, start + ms(1000));
        assert!(layout.poll(&mut map, start + ms(1120)));
        assert!(layout.poll(&mut map, start + ms(1300)));
        assert_eq!(map.invalidations, before + 2);
    }
}
