use clap::{Parser, ValueEnum};
use color_eyre::eyre::eyre;
use indicatif::{ProgressBar, ProgressStyle};
use quickscale_map::geo::{MAX_LATITUDE, world_size};
use quickscale_map::scale::meters_per_pixel;
use quickscale_map::tiles::{MAX_TILE_ZOOM, TileSource, cache_path, tile_range};
use quickscale_map::{LatLng, Theme, ViewerConfig};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs as tokio_fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const USER_AGENT: &str = concat!("quickscale-map/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Basemap {
    Light,
    Dark,
    Both,
}

impl Basemap {
    fn themes(self) -> &'static [Theme] {
        match self {
            Basemap::Light => &[Theme::Light],
            Basemap::Dark => &[Theme::Dark],
            Basemap::Both => &[Theme::Light, Theme::Dark],
        }
    }
}

/// Downloads the basemap tiles around a point into the viewer's tile cache.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    lng: f64,

    /// Radius around the point, in kilometers.
    #[arg(long, default_value_t = 5.0)]
    radius_km: f64,

    #[arg(long, default_value_t = 10)]
    min_zoom: u8,

    #[arg(long, default_value_t = 16)]
    max_zoom: u8,

    #[arg(long, value_enum, default_value_t = Basemap::Both)]
    basemap: Basemap,

    /// Fetch `@2x` tiles for HiDPI screens.
    #[arg(long)]
    retina: bool,

    /// Viewer configuration providing the basemap URLs.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 8)]
    concurrency: usize,
}

struct Job {
    url: String,
    path: PathBuf,
}

async fn download_url_to_path(
    client: &reqwest::Client,
    url: &str,
    output_path: &Path,
) -> color_eyre::Result<()> {
    if let Some(parent) = output_path.parent() {
        tokio_fs::create_dir_all(parent).await?;
    }

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(eyre!("Failed to fetch {}: {}", url, response.status()));
    }

    let bytes = response.bytes().await?;
    tokio_fs::write(output_path, &bytes).await?;

    Ok(())
}

impl Args {
    fn check(&self) -> color_eyre::Result<()> {
        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&self.lat) {
            return Err(eyre!("--lat {} is outside ±{MAX_LATITUDE}", self.lat));
        }
        if !self.lng.is_finite() {
            return Err(eyre!("--lng is not a number"));
        }
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            return Err(eyre!("--radius-km must be a positive number"));
        }
        if self.min_zoom > self.max_zoom {
            return Err(eyre!(
                "--min-zoom {} is above --max-zoom {}",
                self.min_zoom,
                self.max_zoom
            ));
        }
        if self.max_zoom > MAX_TILE_ZOOM {
            return Err(eyre!("--max-zoom is capped at {MAX_TILE_ZOOM}"));
        }
        Ok(())
    }
}

/// Every missing tile of `source` covering the radius, across the zoom range.
fn plan(args: &Args, source: &TileSource, root: &Path) -> color_eyre::Result<Vec<Job>> {
    let template = source.template()?;
    let center = LatLng::new(args.lat, args.lng);
    let max_zoom = args.max_zoom.min(source.max_zoom);
    let radius = args.radius_km * 1000.0;

    let mut seen = HashSet::new();
    let mut jobs = Vec::new();
    for z in args.min_zoom..=max_zoom {
        // A radius wider than the world needs each column once.
        let span = (2.0 * radius / meters_per_pixel(args.lat, f64::from(z)))
            .min(world_size(f64::from(z)));
        for slot in tile_range(center, f64::from(z), z, [span, span]) {
            if !seen.insert(slot.coord) {
                continue;
            }
            let path = cache_path(root, &source.name, slot.coord, args.retina);
            if path.exists() {
                continue;
            }
            jobs.push(Job {
                url: template.url(slot.coord, args.retina),
                path,
            });
        }
    }
    Ok(jobs)
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let args = Args::parse();
    args.check()?;

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let root = args
        .cache_dir
        .clone()
        .or_else(|| dirs::cache_dir().map(|dir| dir.join("quickscale-map")))
        .ok_or_else(|| eyre!("No cache directory; pass --cache-dir"))?;

    let mut jobs = Vec::new();
    for theme in args.basemap.themes() {
        let source = config.basemaps.for_theme(*theme);
        let planned = plan(&args, source, &root)?;
        println!("{}: {} tiles to fetch", source.name, planned.len());
        jobs.extend(planned);
    }

    if jobs.is_empty() {
        println!("Cache at {} is already complete", root.display());
        return Ok(());
    }

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let semaphore = Arc::new(Semaphore::new(args.concurrency.max(1)));
    let progress = ProgressBar::new(jobs.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} tiles ({eta})",
    )?);

    let mut join_set: JoinSet<color_eyre::Result<()>> = JoinSet::new();
    for job in jobs {
        let client = client.clone();
        let semaphore = semaphore.clone();
        let progress = progress.clone();

        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|err| eyre!(err))?;

            let result = download_url_to_path(&client, &job.url, &job.path).await;
            progress.inc(1);
            result
        });
    }

    let mut failed = 0usize;
    while let Some(result) = join_set.join_next().await {
        if let Err(err) = result? {
            log::warn!("{err}");
            failed += 1;
        }
    }
    progress.finish();

    println!("Wrote tiles to {}", root.display());
    if failed > 0 {
        return Err(eyre!("{failed} tiles failed to download"));
    }
    Ok(())
}
