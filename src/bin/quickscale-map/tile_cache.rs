//! Background tile loading with a disk cache and an in-memory texture LRU.

use crate::constants::{TILE_CACHE_CAPACITY, TILE_DOWNLOADS, TILE_RETRY_AFTER, USER_AGENT};
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use lru::LruCache;
use quickscale_map::tiles::{TileCoord, TileSource, TileTemplate, cache_path};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Error, Debug)]
pub enum TileError {
    #[error("request for {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("tile {0} is not cached and the viewer is offline")]
    NotCached(String),
    #[error("failed to decode tile {url}: {source}")]
    Decode {
        url: String,
        source: image::ImageError,
    },
}

/// Decoded tile pixels ready for texture upload.
pub struct DecodedTile {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

enum TileState {
    Loading(mpsc::Receiver<Result<DecodedTile, TileError>>),
    Ready(TextureHandle),
    /// Load failed at this instant. Retried once [`retry_in`] reaches zero.
    Failed(Instant),
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct TileKey {
    source: String,
    coord: TileCoord,
    retina: bool,
}

pub struct TileCache {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    downloads: Arc<Semaphore>,
    cache_dir: Option<PathBuf>,
    offline: bool,
    templates: HashMap<String, Option<TileTemplate>>,
    tiles: LruCache<TileKey, TileState>,
    reported: HashSet<String>,
}

impl TileCache {
    pub fn new(cache_dir: Option<PathBuf>, offline: bool) -> color_eyre::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let capacity = NonZeroUsize::new(TILE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);

        match &cache_dir {
            Some(dir) => log::info!("Tile cache at {}", dir.display()),
            None => log::warn!("No cache directory available, tiles are not kept on disk"),
        }

        Ok(Self {
            runtime,
            client,
            downloads: Arc::new(Semaphore::new(TILE_DOWNLOADS)),
            cache_dir,
            offline,
            templates: HashMap::new(),
            tiles: LruCache::new(capacity),
            reported: HashSet::new(),
        })
    }

    /// Texture for a tile, starting a background load if it is not known yet.
    pub fn request(
        &mut self,
        ctx: &egui::Context,
        source: &TileSource,
        coord: TileCoord,
        retina: bool,
    ) -> Option<egui::TextureId> {
        let key = TileKey {
            source: source.name.clone(),
            coord,
            retina,
        };
        match self.tiles.get(&key) {
            Some(TileState::Ready(texture)) => return Some(texture.id()),
            Some(TileState::Loading(_)) => return None,
            Some(TileState::Failed(at)) => match retry_in(*at, Instant::now()) {
                Some(wait) => {
                    ctx.request_repaint_after(wait);
                    return None;
                }
                None => log::debug!("Retrying tile {}/{:?}", key.source, key.coord),
            },
            None => {}
        }

        let template = self
            .templates
            .entry(source.name.clone())
            .or_insert_with(|| match source.template() {
                Ok(template) => Some(template),
                Err(err) => {
                    log::error!("Basemap {} has an unusable URL: {err}", source.name);
                    None
                }
            });
        let Some(template) = template else {
            self.tiles.put(key, TileState::Failed(Instant::now()));
            return None;
        };

        let url = template.url(coord, retina);
        let path = self
            .cache_dir
            .as_deref()
            .map(|dir| cache_path(dir, &source.name, coord, retina));
        let (tx, rx) = mpsc::channel();
        let ctx = ctx.clone();
        let client = self.client.clone();
        let downloads = Arc::clone(&self.downloads);
        let offline = self.offline;

        self.runtime.spawn(async move {
            let result = load_tile(&client, &downloads, &url, path.as_deref(), offline).await;
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        self.tiles.put(key, TileState::Loading(rx));
        None
    }

    /// Texture for a tile that is already loaded. Never starts a load.
    pub fn peek(&self, source: &TileSource, coord: TileCoord, retina: bool) -> Option<egui::TextureId> {
        let key = TileKey {
            source: source.name.clone(),
            coord,
            retina,
        };
        match self.tiles.peek(&key) {
            Some(TileState::Ready(texture)) => Some(texture.id()),
            _ => None,
        }
    }

    /// Uploads finished tiles. Returns one message per basemap on its first
    /// failure so the caller can notify without flooding.
    pub fn poll(&mut self, ctx: &egui::Context) -> Vec<String> {
        let mut finished: Vec<(TileKey, TileState)> = Vec::new();
        let mut failures = Vec::new();
        let now = Instant::now();

        for (key, state) in self.tiles.iter_mut() {
            let TileState::Loading(rx) = state else {
                continue;
            };
            let result = match rx.try_recv() {
                Ok(result) => result,
                Err(mpsc::TryRecvError::Empty) => continue,
                Err(mpsc::TryRecvError::Disconnected) => {
                    finished.push((key.clone(), TileState::Failed(now)));
                    continue;
                }
            };

            match result {
                Ok(decoded) => {
                    let image = ColorImage::from_rgba_unmultiplied(
                        [decoded.width as usize, decoded.height as usize],
                        &decoded.pixels,
                    );
                    let name = format!(
                        "tile/{}/{}/{}/{}",
                        key.source, key.coord.z, key.coord.x, key.coord.y
                    );
                    let texture = ctx.load_texture(name, image, TextureOptions::LINEAR);
                    finished.push((key.clone(), TileState::Ready(texture)));
                }
                Err(err) => {
                    log::warn!("{err}");
                    if self.reported.insert(key.source.clone()) {
                        failures.push(format!("Tiles for {} failed to load: {err}", key.source));
                    }
                    finished.push((key.clone(), TileState::Failed(now)));
                }
            }
        }

        for (key, state) in finished {
            self.tiles.put(key, state);
        }
        failures
    }
}

/// Time left before a tile that failed at `failed_at` may be requested
/// again, or `None` once it is due.
fn retry_in(failed_at: Instant, now: Instant) -> Option<Duration> {
    let elapsed = now.saturating_duration_since(failed_at);
    (elapsed < TILE_RETRY_AFTER).then(|| TILE_RETRY_AFTER - elapsed)
}

async fn load_tile(
    client: &reqwest::Client,
    downloads: &Semaphore,
    url: &str,
    path: Option<&Path>,
    offline: bool,
) -> Result<DecodedTile, TileError> {
    let cached = match path {
        Some(path) => tokio::fs::read(path).await.ok(),
        None => None,
    };

    let bytes = match cached {
        Some(bytes) => bytes,
        None if offline => return Err(TileError::NotCached(url.to_owned())),
        None => {
            let bytes = {
                let _permit = downloads.acquire().await;
                download(client, url).await?
            };
            if let Some(path) = path {
                store(path, &bytes).await;
            }
            bytes
        }
    };

    decode(&bytes, url)
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, TileError> {
    let request = |source| TileError::Request {
        url: url.to_owned(),
        source,
    };
    let response = client.get(url).send().await.map_err(request)?;
    let status = response.status();
    if !status.is_success() {
        return Err(TileError::Status {
            url: url.to_owned(),
            status,
        });
    }
    Ok(response.bytes().await.map_err(request)?.to_vec())
}

async fn store(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent()
        && let Err(err) = tokio::fs::create_dir_all(parent).await
    {
        log::warn!("Failed to create {}: {err}", parent.display());
        return;
    }
    if let Err(err) = tokio::fs::write(path, bytes).await {
        log::warn!("Failed to cache tile at {}: {err}", path.display());
    }
}

fn decode(bytes: &[u8], url: &str) -> Result<DecodedTile, TileError> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|source| TileError::Decode {
            url: url.to_owned(),
            source,
        })?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedTile {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_tiles_wait_out_the_backoff() {
        let failed_at = Instant::now();
        assert_eq!(retry_in(failed_at, failed_at), Some(TILE_RETRY_AFTER));

        let halfway = failed_at + TILE_RETRY_AFTER / 2;
        assert_eq!(retry_in(failed_at, halfway), Some(TILE_RETRY_AFTER / 2));
    }

    #[test]
    fn failed_tiles_are_retried_after_the_backoff() {
        let failed_at = Instant::now();
        assert_eq!(retry_in(failed_at, failed_at + TILE_RETRY_AFTER), None);
        assert_eq!(
            retry_in(failed_at, failed_at + TILE_RETRY_AFTER * 3),
            None
        );
    }
}
