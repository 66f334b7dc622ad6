use std::time::Duration;

/// Width of the side panel on desktop viewports.
pub const SIDEBAR_WIDTH: f32 = 240.0;

/// Gap between the map edge and floating controls.
pub const CONTROL_MARGIN: f32 = 10.0;

/// Parent tile levels tried while a tile is still loading.
pub const TILE_FALLBACK_LEVELS: u8 = 3;

/// Decoded tile textures kept in memory.
pub const TILE_CACHE_CAPACITY: usize = 512;

/// Concurrent tile downloads in the viewer.
pub const TILE_DOWNLOADS: usize = 6;

/// Wait before a tile that failed to load is requested again.
pub const TILE_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Screen pixels moved per arrow key press.
pub const KEYBOARD_PAN: f32 = 80.0;

pub const USER_AGENT: &str = concat!("quickscale-map/", env!("CARGO_PKG_VERSION"));
