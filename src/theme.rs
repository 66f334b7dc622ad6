//! Light/dark theme preference and the matching basemap.

use crate::map_widget::{Layer, LayerId, MapWidget};
use crate::prefs::{PreferenceStore, THEME_KEY, persist};
use crate::tiles::TileSource;
use serde::{Deserialize, Serialize};

const CARTO_ATTRIBUTION: &str = "© OpenStreetMap contributors © CARTO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parses a persisted value. Anything but the two exact names is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Glyph shown on the theme toggle button.
    pub fn glyph(self) -> &'static str {
        match self {
            Theme::Light => "\u{2600}\u{fe0f}",
            Theme::Dark => "🌙",
        }
    }
}

/// One basemap per theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basemaps {
    pub light: TileSource,
    pub dark: TileSource,
}

impl Basemaps {
    pub fn for_theme(&self, theme: Theme) -> &TileSource {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}

impl Default for Basemaps {
    fn default() -> Self {
        let carto = |name: &str, style: &str| TileSource {
            name: name.to_owned(),
            url: format!("https://{{s}}.basemaps.cartocdn.com/{style}/{{z}}/{{x}}/{{y}}{{r}}.png"),
            subdomains: "abcd".to_owned(),
            max_zoom: 20,
            attribution: CARTO_ATTRIBUTION.to_owned(),
        };
        Self {
            light: carto("carto-light", "light_all"),
            dark: carto("carto-dark", "dark_all"),
        }
    }
}

/// Persisted theme, or the system hint when nothing valid is stored.
/// Without a hint the viewer starts dark.
pub fn saved_theme(store: &impl PreferenceStore, system_hint: Option<Theme>) -> Theme {
    store
        .get(THEME_KEY)
        .as_deref()
        .and_then(Theme::parse)
        .unwrap_or(match system_hint {
            Some(Theme::Light) => Theme::Light,
            _ => Theme::Dark,
        })
}

#[derive(Debug, Clone)]
pub struct ThemeController {
    current: Theme,
    basemap: Option<LayerId>,
}

impl Default for ThemeController {
    fn default() -> Self {
        Self {
            current: Theme::Dark,
            basemap: None,
        }
    }
}

impl ThemeController {
    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn glyph(&self) -> &'static str {
        self.current.glyph()
    }

    /// Resolves the initial theme and adds its basemap to the map.
    pub fn install(
        &mut self,
        map: &mut impl MapWidget,
        store: &mut impl PreferenceStore,
        system_hint: Option<Theme>,
        basemaps: &Basemaps,
    ) {
        let theme = saved_theme(&*store, system_hint);
        self.set_theme_attr(theme, store);
        if let Some(old) = self.basemap.take() {
            map.remove_layer(old);
        }
        self.basemap = Some(map.add_layer(Layer::Tiles(basemaps.for_theme(theme).clone())));
        log::info!("Starting with {} theme", theme.as_str());
    }

    /// Makes `theme` current and persists it.
    pub fn set_theme_attr(&mut self, theme: Theme, store: &mut impl PreferenceStore) {
        self.current = theme;
        persist(store, THEME_KEY, theme.as_str());
    }

    /// Swaps the basemap and flips the theme.
    pub fn toggle(
        &mut self,
        map: &mut impl MapWidget,
        store: &mut impl PreferenceStore,
        basemaps: &Basemaps,
    ) -> Theme {
        let next = self.current.toggled();
        if let Some(old) = self.basemap.take() {
            map.remove_layer(old);
        }
        self.basemap = Some(map.add_layer(Layer::Tiles(basemaps.for_theme(next).clone())));
        self.set_theme_attr(next, store);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryStore;
    use crate::testing::FakeMap;

    #[test]
    fn stored_value_wins_over_system_hint() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(saved_theme(&store, Some(Theme::Dark)), Theme::Light);
    }

    #[test]
    fn invalid_value_falls_back_to_hint() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(saved_theme(&store, Some(Theme::Light)), Theme::Light);
        assert_eq!(saved_theme(&store, Some(Theme::Dark)), Theme::Dark);
        assert_eq!(saved_theme(&store, None), Theme::Dark);
    }

    #[test]
    fn install_persists_and_adds_basemap() {
        let mut map = FakeMap::default();
        let mut store = MemoryStore::new();
        let basemaps = Basemaps::default();
        let mut controller = ThemeController::default();

        controller.install(&mut map, &mut store, Some(Theme::Light), &basemaps);

        assert_eq!(controller.current(), Theme::Light);
        assert_eq!(controller.glyph(), "\u{2600}\u{fe0f}");
        assert_eq!(controller.glyph().chars().count(), 2);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(map.tile_layers(), vec![basemaps.light.name.clone()]);
    }

    #[test]
    fn toggle_swaps_basemap_and_twice_restores() {
        let mut map = FakeMap::default();
        let mut store = MemoryStore::new();
        let basemaps = Basemaps::default();
        let mut controller = ThemeController::default();
        controller.install(&mut map, &mut store, None, &basemaps);

        assert_eq!(controller.toggle(&mut map, &mut store, &basemaps), Theme::Light);
        assert_eq!(map.tile_layers(), vec![basemaps.light.name.clone()]);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));

        assert_eq!(controller.toggle(&mut map, &mut store, &basemaps), Theme::Dark);
        assert_eq!(map.tile_layers(), vec![basemaps.dark.name.clone()]);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(controller.glyph(), "🌙");
    }

    #[test]
    fn default_basemaps_are_valid_templates() {
        let basemaps = Basemaps::default();
        assert!(basemaps.light.template().is_ok());
        assert!(basemaps.dark.template().is_ok());
        assert!(basemaps.dark.url.contains("dark_all"));
    }
}
