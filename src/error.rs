//! Error types for folio-fx.
//!
//! Only the pieces that touch external resources can fail: the GPU surface,
//! texture files, the config file and the window/event loop. The particle
//! simulation and the typewriter have no error paths.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The device rejected a resource or command.
    Validation(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::Validation(msg) => write!(f, "GPU validation failed: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter | GpuError::Validation(_) => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur during texture loading.
#[derive(Debug)]
pub enum TextureError {
    /// Failed to decode image data.
    ImageLoad(image::ImageError),
    /// Failed to read file from disk.
    Io(std::io::Error),
    /// Raw RGBA data does not match the declared dimensions.
    SizeMismatch {
        /// Bytes expected from `width * height * 4`.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::ImageLoad(e) => write!(f, "Failed to load image: {}", e),
            TextureError::Io(e) => write!(f, "Failed to read texture file: {}", e),
            TextureError::SizeMismatch { expected, actual } => write!(
                f,
                "RGBA data size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::ImageLoad(e) => Some(e),
            TextureError::Io(e) => Some(e),
            TextureError::SizeMismatch { .. } => None,
        }
    }
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::ImageLoad(e)
    }
}

impl From<std::io::Error> for TextureError {
    fn from(e: std::io::Error) -> Self {
        TextureError::Io(e)
    }
}

/// Errors that can occur while loading a showcase config file.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    Io(std::io::Error),
    /// The file is not valid config JSON.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur when running the showcase window.
#[derive(Debug)]
pub enum ShowcaseError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Config could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for ShowcaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowcaseError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            ShowcaseError::Window(e) => write!(f, "Failed to create window: {}", e),
            ShowcaseError::Gpu(e) => write!(f, "GPU error: {}", e),
            ShowcaseError::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for ShowcaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShowcaseError::EventLoop(e) => Some(e),
            ShowcaseError::Window(e) => Some(e),
            ShowcaseError::Gpu(e) => Some(e),
            ShowcaseError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for ShowcaseError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ShowcaseError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for ShowcaseError {
    fn from(e: winit::error::OsError) -> Self {
        ShowcaseError::Window(e)
    }
}

impl From<GpuError> for ShowcaseError {
    fn from(e: GpuError) -> Self {
        ShowcaseError::Gpu(e)
    }
}

impl From<ConfigError> for ShowcaseError {
    fn from(e: ConfigError) -> Self {
        ShowcaseError::Config(e)
    }
}
