//! Application state shared by every control, and the handlers that mutate it.
//!
//! The viewer never talks to the screen directly: the UI reads its labels and
//! layout view, forwards user actions to the `toggle_*`/`select_*` methods and
//! passes the map widget in by reference so handlers can drive it.

use crate::config::ViewerConfig;
use crate::hud::Hud;
use crate::layout::MobileLayout;
use crate::map_widget::{MapEvent, MapWidget};
use crate::measure::MeasureTool;
use crate::prefs::PreferenceStore;
use crate::ribbon::ScaleRibbon;
use crate::scale::auto_dpi;
use crate::theme::{Theme, ThemeController};
use std::time::{Duration, Instant};

pub struct Viewer<S> {
    config: ViewerConfig,
    store: S,
    pixel_ratio: f32,
    theme: ThemeController,
    hud: Hud,
    ribbon: ScaleRibbon,
    measure: MeasureTool,
    layout: MobileLayout,
}

impl<S: PreferenceStore> Viewer<S> {
    pub fn new(config: ViewerConfig, store: S) -> Self {
        let ribbon = ScaleRibbon::new(&config.quick_scales);
        let measure = MeasureTool::new(config.measure);
        let layout = MobileLayout::new(config.layout.clone());
        Self {
            config,
            store,
            pixel_ratio: 1.0,
            theme: ThemeController::default(),
            hud: Hud::default(),
            ribbon,
            measure,
            layout,
        }
    }

    /// Startup wiring: theme and basemap, then the panel layout for the
    /// initial viewport.
    pub fn install(
        &mut self,
        map: &mut impl MapWidget,
        system_theme: Option<Theme>,
        viewport: [f32; 2],
        now: Instant,
    ) {
        self.theme
            .install(map, &mut self.store, system_theme, &self.config.basemaps);
        self.layout.set_viewport(viewport);
        self.layout.setup(map, &self.store, now);
        if map.is_ready() {
            let dpi = self.dpi();
            self.hud.update(&*map, dpi);
        }
    }

    /// Dispatches every event the map queued since the last call.
    pub fn pump(&mut self, map: &mut impl MapWidget) {
        for event in map.take_events() {
            self.handle_event(event, map);
        }
    }

    pub fn handle_event(&mut self, event: MapEvent, map: &mut impl MapWidget) {
        let dpi = self.dpi();
        match event {
            MapEvent::Ready | MapEvent::Move | MapEvent::Zoom => self.hud.update(&*map, dpi),
            MapEvent::Click(at) => self.measure.on_click(map, at),
            MapEvent::DoubleClick(_) => self.measure.stop(map),
        }
    }

    pub fn toggle_theme(&mut self, map: &mut impl MapWidget) -> Theme {
        self.theme
            .toggle(map, &mut self.store, &self.config.basemaps)
    }

    pub fn select_quick_scale(&mut self, index: usize, map: &mut impl MapWidget) -> Option<f64> {
        let dpi = self.dpi();
        self.ribbon.select(index, map, dpi)
    }

    pub fn toggle_measure(&mut self, map: &mut impl MapWidget) {
        self.measure.toggle(map);
    }

    pub fn clear_measure(&mut self, map: &mut impl MapWidget) {
        self.measure.clear(map);
    }

    pub fn toggle_sheet(&mut self, now: Instant) {
        self.layout.toggle_sheet(&mut self.store, now);
    }

    pub fn observe_viewport(&mut self, size: [f32; 2], map: &mut impl MapWidget, now: Instant) {
        self.layout.observe_viewport(size, map, &self.store, now);
    }

    /// Runs deferred work that is due and returns how long until the next.
    pub fn tick(&mut self, map: &mut impl MapWidget, now: Instant) -> Option<Duration> {
        self.layout.poll(map, now);
        self.layout.next_deadline(now)
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio;
    }

    /// Configured DPI, or an estimate from the device pixel ratio.
    pub fn dpi(&self) -> u32 {
        self.config
            .dpi
            .unwrap_or_else(|| auto_dpi(self.pixel_ratio))
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn ribbon(&self) -> &ScaleRibbon {
        &self.ribbon
    }

    pub fn measure(&self) -> &MeasureTool {
        &self.measure
    }

    pub fn layout(&self) -> &MobileLayout {
        &self.layout
    }
}
