#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod colors;
mod constants;
mod slippy;
mod tile_cache;
mod ui;

use clap::Parser;
use color_eyre::eyre::eyre;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use quickscale_map::prefs::KEYS;
use quickscale_map::{ConfigError, LatLng, MemoryStore, Theme, Viewer, ViewerConfig};
use slippy::SlippyMap;
use std::path::PathBuf;
use std::time::Instant;
use tile_cache::TileCache;
use ui::UiAction;

const APP_NAME: &str = "QuickScale Map";

#[derive(Parser, Debug)]
#[command(version, about = "Basemap viewer with a live scale readout and distance measurement")]
struct Args {
    /// Viewer configuration (RON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Latitude of the initial view center.
    #[arg(long, allow_negative_numbers = true, requires = "lng")]
    lat: Option<f64>,

    /// Longitude of the initial view center.
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    lng: Option<f64>,

    /// Initial zoom level.
    #[arg(long)]
    zoom: Option<f64>,

    /// Screen DPI for scale math instead of the estimate from the pixel ratio.
    #[arg(long)]
    dpi: Option<u32>,

    /// Tile cache directory.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Only show tiles that are already in the cache.
    #[arg(long)]
    offline: bool,
}

impl Args {
    fn viewer_config(&self) -> Result<ViewerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            config.start.center = LatLng::new(lat, lng);
        }
        if let Some(zoom) = self.zoom {
            config.start.zoom = zoom;
        }
        if self.dpi.is_some() {
            config.dpi = self.dpi;
        }
        config.validate()?;
        Ok(config)
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("quickscale-map")))
    }
}

/// Main application state for the viewer.
pub struct QuickScaleApp {
    viewer: Viewer<MemoryStore>,
    map: SlippyMap,
    tiles: TileCache,
    toasts: Toasts,
    installed: bool,
    applied_theme: Option<Theme>,
}

impl QuickScaleApp {
    fn new(cc: &eframe::CreationContext<'_>, config: ViewerConfig, tiles: TileCache) -> Self {
        let mut toasts = Toasts::new()
            .anchor(egui::Align2::RIGHT_TOP, (-10.0, 10.0))
            .direction(egui::Direction::TopDown);

        let store = match cc.storage {
            Some(storage) => MemoryStore::seeded(&KEYS, |key| storage.get_string(key)),
            None => {
                log::warn!("No persistent storage, preferences last for this session only");
                toasts.add(Toast {
                    kind: ToastKind::Info,
                    text: "Preferences will not be saved between sessions.".into(),
                    options: ToastOptions::default()
                        .duration_in_seconds(6.0)
                        .show_icon(true),
                    ..Default::default()
                });
                MemoryStore::new()
            }
        };

        let map = SlippyMap::new(&config.start, config.map);

        Self {
            viewer: Viewer::new(config, store),
            map,
            tiles,
            toasts,
            installed: false,
            applied_theme: None,
        }
    }

    /// Wires the viewer to the map once the real window size is known.
    fn install(&mut self, ctx: &egui::Context, now: Instant) {
        if self.installed {
            return;
        }
        self.installed = true;

        let system_theme = ctx.system_theme().map(|theme| match theme {
            egui::Theme::Light => Theme::Light,
            egui::Theme::Dark => Theme::Dark,
        });
        self.viewer.set_pixel_ratio(ctx.pixels_per_point());
        self.viewer
            .install(&mut self.map, system_theme, viewport_size(ctx), now);
        log::info!("Estimated screen DPI {}", self.viewer.dpi());
    }

    /// Mirrors the viewer theme into egui's visuals.
    fn sync_theme(&mut self, ctx: &egui::Context) {
        let theme = self.viewer.theme().current();
        if self.applied_theme == Some(theme) {
            return;
        }
        ctx.set_theme(match theme {
            Theme::Light => egui::Theme::Light,
            Theme::Dark => egui::Theme::Dark,
        });
        self.applied_theme = Some(theme);
    }

    fn poll_tiles(&mut self, ctx: &egui::Context) {
        for message in self.tiles.poll(ctx) {
            self.toasts.add(Toast {
                kind: ToastKind::Error,
                text: message.into(),
                options: ToastOptions::default()
                    .duration_in_seconds(8.0)
                    .show_icon(true),
                ..Default::default()
            });
        }
    }

    fn dispatch(&mut self, action: UiAction, now: Instant) {
        match action {
            UiAction::ToggleTheme => {
                let theme = self.viewer.toggle_theme(&mut self.map);
                log::debug!("Switched to {} theme", theme.as_str());
            }
            UiAction::SelectScale(index) => {
                if let Some(zoom) = self.viewer.select_quick_scale(index, &mut self.map) {
                    log::debug!("Quick scale {index} -> zoom {zoom:.2}");
                }
            }
            UiAction::ToggleMeasure => self.viewer.toggle_measure(&mut self.map),
            UiAction::ClearMeasure => self.viewer.clear_measure(&mut self.map),
            UiAction::ToggleSheet => self.viewer.toggle_sheet(now),
            UiAction::OpenInBrowser => {
                let url = self.map.permalink();
                if let Err(err) = open::that(&url) {
                    log::error!("Failed to open {url}: {err}");
                    self.toasts.add(Toast {
                        kind: ToastKind::Error,
                        text: format!("Could not open a browser: {err}").into(),
                        options: ToastOptions::default()
                            .duration_in_seconds(6.0)
                            .show_icon(true),
                        ..Default::default()
                    });
                }
            }
        }
    }
}

impl eframe::App for QuickScaleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.install(ctx, now);
        self.viewer.set_pixel_ratio(ctx.pixels_per_point());
        self.viewer
            .observe_viewport(viewport_size(ctx), &mut self.map, now);
        self.sync_theme(ctx);
        self.poll_tiles(ctx);

        let mut actions = Vec::new();
        self.show_status_bar(ctx, &mut actions);
        self.show_panel(ctx, &mut actions);
        self.show_central_panel(ctx);

        for action in actions {
            self.dispatch(action, now);
        }
        self.viewer.pump(&mut self.map);

        if let Some(wait) = self.viewer.tick(&mut self.map, now) {
            ctx.request_repaint_after(wait);
        }
        if self.map.size_stale() {
            ctx.request_repaint();
        }

        self.toasts.show(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        for (key, value) in self.viewer.store().entries() {
            storage.set_string(key, value.to_owned());
        }
    }
}

fn viewport_size(ctx: &egui::Context) -> [f32; 2] {
    let size = ctx.screen_rect().size();
    [size.x, size.y]
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();
    let config = args.viewer_config()?;
    let tiles = TileCache::new(args.cache_dir(), args.offline)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([320.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| Ok(Box::new(QuickScaleApp::new(cc, config, tiles)))),
    )
    .map_err(|err| eyre!("{err}"))
}
