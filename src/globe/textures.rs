//! Globe texture loading.
//!
//! The globe needs four maps: surface color, normal map, specular (used as
//! roughness) and the cloud layer. Maps load on a background thread so the
//! frame loop keeps running; the globe is not drawn until they arrive.
//!
//! A map that cannot be loaded is retried with exponential backoff, then
//! replaced by a neutral 1x1 fallback so the globe still renders.
//!
//! ```ignore
//! let mut loader = TextureLoader::spawn(GlobeTextureSources::default(), RetryPolicy::default());
//!
//! // Per frame:
//! if let Some(result) = loader.poll() {
//!     let textures = result?;
//!     // upload...
//! }
//! ```

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TextureError;

/// The four maps of the globe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Color,
    Normal,
    Specular,
    Clouds,
}

impl MapKind {
    pub const ALL: [MapKind; 4] = [MapKind::Color, MapKind::Normal, MapKind::Specular, MapKind::Clouds];

    pub fn label(&self) -> &'static str {
        match self {
            MapKind::Color => "color",
            MapKind::Normal => "normal",
            MapKind::Specular => "specular",
            MapKind::Clouds => "clouds",
        }
    }

    /// Whether the map holds color (sRGB) rather than data (linear).
    pub fn is_srgb(&self) -> bool {
        matches!(self, MapKind::Color | MapKind::Clouds)
    }

    /// Neutral pixel used when the map cannot be loaded.
    pub fn fallback_rgba(&self) -> [u8; 4] {
        match self {
            MapKind::Color => [38, 92, 150, 255],   // Ocean blue
            MapKind::Normal => [128, 128, 255, 255], // Flat surface
            MapKind::Specular => [128, 128, 128, 255],
            MapKind::Clouds => [0, 0, 0, 0], // No clouds
        }
    }
}

/// Where a map comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureSource {
    /// Image file on disk.
    Path(PathBuf),
    /// Encoded image bytes already in memory (embedded or fetched remotely).
    Bytes(Vec<u8>),
}

impl TextureSource {
    fn describe(&self) -> String {
        match self {
            TextureSource::Path(p) => p.display().to_string(),
            TextureSource::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for TextureSource {
    fn from(path: &str) -> Self {
        TextureSource::Path(PathBuf::from(path))
    }
}

/// Decoded RGBA8 pixels for one map.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Whether the pixels should be sampled as sRGB.
    pub srgb: bool,
    /// Set when this is a stand-in for a map that failed to load.
    pub fallback: bool,
}

impl TextureData {
    /// Wrap raw RGBA data, checking it matches the dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            srgb: true,
            fallback: false,
        })
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// Read and decode an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::decode(&bytes)
    }

    /// 1x1 texture of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            data: rgba.to_vec(),
            width: 1,
            height: 1,
            srgb: true,
            fallback: false,
        }
    }

    /// The stand-in for a map that could not be loaded.
    pub fn fallback_for(kind: MapKind) -> Self {
        Self {
            srgb: kind.is_srgb(),
            fallback: true,
            ..Self::solid(kind.fallback_rgba())
        }
    }

    fn load(source: &TextureSource) -> Result<Self, TextureError> {
        match source {
            TextureSource::Path(path) => Self::from_file(path),
            TextureSource::Bytes(bytes) => Self::decode(bytes),
        }
    }
}

/// Retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per map, including the first.
    pub attempts: u32,
    /// Wait before the second attempt, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Backoff growth per retry.
    pub multiplier: f32,
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.saturating_sub(1) as i32);
        Duration::from_millis((self.initial_backoff_ms as f32 * factor) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff_ms: 200,
            multiplier: 2.0,
        }
    }
}

/// Load one map, retrying per `policy`, falling back if every attempt fails.
///
/// `sleep` is called between attempts with the backoff duration.
pub fn load_with_retry<F>(
    kind: MapKind,
    source: &TextureSource,
    policy: &RetryPolicy,
    mut sleep: F,
) -> TextureData
where
    F: FnMut(Duration),
{
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match TextureData::load(source) {
            Ok(mut texture) => {
                texture.srgb = kind.is_srgb();
                log::debug!(
                    "Loaded {} map {} ({}x{})",
                    kind.label(),
                    source.describe(),
                    texture.width,
                    texture.height
                );
                return texture;
            }
            Err(e) if attempt < attempts => {
                let wait = policy.backoff(attempt);
                log::warn!(
                    "Loading {} map {} failed (attempt {}/{}): {}; retrying in {:?}",
                    kind.label(),
                    source.describe(),
                    attempt,
                    attempts,
                    e,
                    wait
                );
                sleep(wait);
            }
            Err(e) => {
                log::error!(
                    "Giving up on {} map {} after {} attempts: {}; using fallback",
                    kind.label(),
                    source.describe(),
                    attempts,
                    e
                );
            }
        }
    }
    TextureData::fallback_for(kind)
}

/// Sources for the four globe maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeTextureSources {
    pub color: TextureSource,
    pub normal: TextureSource,
    pub specular: TextureSource,
    pub clouds: TextureSource,
}

impl GlobeTextureSources {
    pub fn get(&self, kind: MapKind) -> &TextureSource {
        match kind {
            MapKind::Color => &self.color,
            MapKind::Normal => &self.normal,
            MapKind::Specular => &self.specular,
            MapKind::Clouds => &self.clouds,
        }
    }
}

impl Default for GlobeTextureSources {
    fn default() -> Self {
        Self {
            color: "textures/earth_atmos_2048.jpg".into(),
            normal: "textures/earth_normal_2048.jpg".into(),
            specular: "textures/earth_specular_2048.jpg".into(),
            clouds: "textures/earth_clouds_1024.png".into(),
        }
    }
}

/// The decoded globe maps.
#[derive(Debug, Clone)]
pub struct GlobeTextures {
    pub color: TextureData,
    pub normal: TextureData,
    pub specular: TextureData,
    pub clouds: TextureData,
}

impl GlobeTextures {
    /// Load every map in turn with the given retry policy.
    pub fn load_blocking(sources: &GlobeTextureSources, policy: &RetryPolicy) -> Self {
        let load = |kind| load_with_retry(kind, sources.get(kind), policy, std::thread::sleep);
        Self {
            color: load(MapKind::Color),
            normal: load(MapKind::Normal),
            specular: load(MapKind::Specular),
            clouds: load(MapKind::Clouds),
        }
    }

    /// All maps replaced by fallbacks.
    pub fn fallback() -> Self {
        Self {
            color: TextureData::fallback_for(MapKind::Color),
            normal: TextureData::fallback_for(MapKind::Normal),
            specular: TextureData::fallback_for(MapKind::Specular),
            clouds: TextureData::fallback_for(MapKind::Clouds),
        }
    }

    pub fn get(&self, kind: MapKind) -> &TextureData {
        match kind {
            MapKind::Color => &self.color,
            MapKind::Normal => &self.normal,
            MapKind::Specular => &self.specular,
            MapKind::Clouds => &self.clouds,
        }
    }

    /// Number of maps that are fallbacks.
    pub fn fallback_count(&self) -> usize {
        MapKind::ALL.iter().filter(|k| self.get(**k).fallback).count()
    }
}

/// Loads the globe maps off the frame thread.
#[derive(Debug)]
pub struct TextureLoader {
    handle: Option<JoinHandle<GlobeTextures>>,
    ready: Option<GlobeTextures>,
}

impl TextureLoader {
    /// Start loading in the background.
    ///
    /// If no thread can be spawned the maps are loaded on the calling thread.
    pub fn spawn(sources: GlobeTextureSources, policy: RetryPolicy) -> Self {
        let worker_sources = sources.clone();
        let spawned = std::thread::Builder::new()
            .name("globe-textures".into())
            .spawn(move || GlobeTextures::load_blocking(&worker_sources, &policy));

        match spawned {
            Ok(handle) => Self {
                handle: Some(handle),
                ready: None,
            },
            Err(e) => {
                log::warn!("Could not spawn texture thread ({}), loading inline", e);
                Self {
                    handle: None,
                    ready: Some(GlobeTextures::load_blocking(&sources, &policy)),
                }
            }
        }
    }

    /// Whether maps are still being loaded.
    pub fn is_loading(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Take the loaded maps once they are ready.
    ///
    /// Returns `None` while loading and after the maps were taken. A loader
    /// thread that panicked yields `Err` with the panic message.
    pub fn poll(&mut self) -> Option<Result<GlobeTextures, String>> {
        if let Some(ready) = self.ready.take() {
            return Some(Ok(ready));
        }
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let handle = self.handle.take()?;
        Some(handle.join().map_err(|panic| panic_message(panic.as_ref())))
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_from_rgba_checks_size() {
        assert!(TextureData::from_rgba(vec![0; 16], 2, 2).is_ok());
        let err = TextureData::from_rgba(vec![0; 12], 2, 2).unwrap_err();
        assert!(matches!(err, TextureError::SizeMismatch { expected: 16, actual: 12 }));
    }

    #[test]
    fn test_decode_png_bytes() {
        let tex = TextureData::decode(&png_bytes(4, 2)).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(&tex.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_backoff_grows() {
        let policy = RetryPolicy { attempts: 4, initial_backoff_ms: 100, multiplier: 2.0 };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_missing_file_retries_then_falls_back() {
        let policy = RetryPolicy { attempts: 3, initial_backoff_ms: 50, multiplier: 2.0 };
        let mut waits = Vec::new();
        let source = TextureSource::from("definitely/not/here.png");

        let tex = load_with_retry(MapKind::Normal, &source, &policy, |d| waits.push(d));

        assert!(tex.fallback);
        assert_eq!(tex.data, MapKind::Normal.fallback_rgba().to_vec());
        assert!(!tex.srgb);
        assert_eq!(waits, vec![Duration::from_millis(50), Duration::from_millis(100)]);
    }

    #[test]
    fn test_bytes_source_loads_first_try() {
        let source = TextureSource::Bytes(png_bytes(2, 2));
        let mut slept = false;
        let tex = load_with_retry(MapKind::Clouds, &source, &RetryPolicy::default(), |_| slept = true);
        assert!(!tex.fallback);
        assert!(tex.srgb);
        assert!(!slept);
    }

    #[test]
    fn test_loader_delivers_once() {
        let bytes = png_bytes(2, 2);
        let sources = GlobeTextureSources {
            color: TextureSource::Bytes(bytes.clone()),
            normal: TextureSource::Bytes(bytes.clone()),
            specular: TextureSource::Bytes(bytes.clone()),
            clouds: TextureSource::Bytes(bytes),
        };
        let mut loader = TextureLoader::spawn(sources, RetryPolicy::default());

        let textures = loop {
            if let Some(result) = loader.poll() {
                break result.unwrap();
            }
            std::thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(textures.fallback_count(), 0);
        assert!(loader.poll().is_none());
        assert!(!loader.is_loading());
    }

    #[test]
    fn test_fallback_set() {
        assert_eq!(GlobeTextures::fallback().fallback_count(), 4);
    }
}
