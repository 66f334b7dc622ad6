//! Tile addressing: URL templates, visible tile ranges and the disk cache layout.

use crate::geo::{LatLng, TILE_SIZE, project};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"));

/// Deepest tile level addressed. Keeps tile indices within `u32`.
pub const MAX_TILE_ZOOM: u8 = 30;

/// Columns a view may span when it is wider than the world at low zoom.
const MAX_REPEATED_COLUMNS: i64 = 64;

const KNOWN_PLACEHOLDERS: [&str; 5] = ["s", "z", "x", "y", "r"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}' in tile URL")]
    UnknownPlaceholder(String),
    #[error("tile URL is missing the '{{{0}}}' placeholder")]
    MissingPlaceholder(&'static str),
    #[error("tile URL uses '{{s}}' but no subdomains are configured")]
    NoSubdomains,
}

/// A tiled basemap endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSource {
    /// Short identifier, also the disk cache directory name.
    pub name: String,
    /// URL template with `{s}`, `{z}`, `{x}`, `{y}` and `{r}` placeholders.
    pub url: String,
    /// One character per subdomain substituted for `{s}`.
    pub subdomains: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl TileSource {
    pub fn template(&self) -> Result<TileTemplate, TemplateError> {
        TileTemplate::parse(&self.url, &self.subdomains)
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// The tile one level up that contains this one.
    pub fn parent(&self) -> Option<TileCoord> {
        (self.z > 0).then(|| TileCoord::new(self.x / 2, self.y / 2, self.z - 1))
    }
}

/// A validated tile URL template.
#[derive(Debug, Clone, PartialEq)]
pub struct TileTemplate {
    url: String,
    subdomains: Vec<char>,
}

impl TileTemplate {
    pub fn parse(url: &str, subdomains: &str) -> Result<Self, TemplateError> {
        let mut seen = Vec::new();
        for caps in PLACEHOLDER.captures_iter(url) {
            let name = &caps[1];
            if !KNOWN_PLACEHOLDERS.contains(&name) {
                return Err(TemplateError::UnknownPlaceholder(name.to_owned()));
            }
            seen.push(name.to_owned());
        }

        for required in ["z", "x", "y"] {
            if !seen.iter().any(|name| name == required) {
                return Err(TemplateError::MissingPlaceholder(required));
            }
        }

        let subdomains: Vec<char> = subdomains.chars().collect();
        if seen.iter().any(|name| name == "s") && subdomains.is_empty() {
            return Err(TemplateError::NoSubdomains);
        }

        Ok(Self {
            url: url.to_owned(),
            subdomains,
        })
    }

    /// Expands the template for `coord`. `retina` selects `@2x` tiles.
    pub fn url(&self, coord: TileCoord, retina: bool) -> String {
        let subdomain = if self.subdomains.is_empty() {
            String::new()
        } else {
            let index = (u64::from(coord.x) + u64::from(coord.y)) % self.subdomains.len() as u64;
            self.subdomains[index as usize].to_string()
        };

        self.url
            .replace("{s}", &subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{r}", if retina { "@2x" } else { "" })
    }
}

/// A tile needed to cover a viewport. `col` and `row` are unwrapped grid
/// positions used for placement; `coord` is the wrapped tile to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSlot {
    pub coord: TileCoord,
    pub col: i64,
    pub row: i64,
}

/// Tiles at `tile_zoom` covering a `size` (pixels) view centered on `center`
/// at fractional `zoom`. `tile_zoom` is capped at [`MAX_TILE_ZOOM`] and the
/// column count at one world width, or a few world copies at low zoom.
pub fn tile_range(center: LatLng, zoom: f64, tile_zoom: u8, size: [f64; 2]) -> Vec<TileSlot> {
    let tile_zoom = tile_zoom.min(MAX_TILE_ZOOM);
    let scale = 2f64.powf(zoom - f64::from(tile_zoom));
    let (cx, cy) = project(center, f64::from(tile_zoom));
    let half_w = size[0] / 2.0 / scale;
    let half_h = size[1] / 2.0 / scale;

    let tiles_per_axis = 1i64 << tile_zoom;
    let min_col = ((cx - half_w) / TILE_SIZE).floor() as i64;
    let max_col = (((cx + half_w) / TILE_SIZE).floor() as i64)
        .min(min_col + tiles_per_axis.max(MAX_REPEATED_COLUMNS) - 1);
    let min_row = (((cy - half_h) / TILE_SIZE).floor() as i64).max(0);
    let max_row = (((cy + half_h) / TILE_SIZE).floor() as i64).min(tiles_per_axis - 1);

    let mut slots = Vec::new();
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            let x = col.rem_euclid(tiles_per_axis) as u32;
            slots.push(TileSlot {
                coord: TileCoord::new(x, row as u32, tile_zoom),
                col,
                row,
            });
        }
    }
    slots
}

/// Location of a cached tile: `<root>/<name>/<z>/<x>/<y>[@2x].png`.
pub fn cache_path(root: &Path, source_name: &str, coord: TileCoord, retina: bool) -> PathBuf {
    let suffix = if retina { "@2x" } else { "" };
    root.join(source_name)
        .join(coord.z.to_string())
        .join(coord.x.to_string())
        .join(format!("{}{suffix}.png", coord.y))
}
