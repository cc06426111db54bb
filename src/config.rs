use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::detector::types::SearchRegion;
use crate::errors::PostpadResult;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Zero-based physical display index for capture.
    #[serde(default)]
    pub display_index: usize,
    #[serde(default = "default_screen_width")]
    pub width: u32,
    #[serde(default = "default_screen_height")]
    pub height: u32,
    /// Pixels reserved for the taskbar band at the bottom of the screen,
    /// excluded from the icon search region.
    #[serde(default = "default_taskbar_height")]
    pub taskbar_height: u32,
}

impl ScreenConfig {
    /// Desktop-only search region: the full screen minus the taskbar band.
    pub fn search_region(&self) -> SearchRegion {
        SearchRegion {
            x_min: 0,
            y_min: 0,
            x_max: self.width,
            y_max: self.height.saturating_sub(self.taskbar_height),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            display_index: 0,
            width: default_screen_width(),
            height: default_screen_height(),
            taskbar_height: default_taskbar_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Inclusive HSV lower bound; hue on the 0..180 scale, saturation and
    /// value on 0..255. Defaults match the target icon's blue.
    #[serde(default = "default_hsv_lower")]
    pub hsv_lower: [u8; 3],
    #[serde(default = "default_hsv_upper")]
    pub hsv_upper: [u8; 3],
    /// Accepted bounding-box area range in pixels, inclusive.
    #[serde(default = "default_min_icon_area")]
    pub min_icon_area: u32,
    #[serde(default = "default_max_icon_area")]
    pub max_icon_area: u32,
    /// Accepted width/height ratio range, inclusive. Icons are near-square.
    #[serde(default = "default_min_aspect_ratio")]
    pub min_aspect_ratio: f32,
    #[serde(default = "default_max_aspect_ratio")]
    pub max_aspect_ratio: f32,
    /// Minimum fraction of a candidate's box that must be color-matched.
    #[serde(default = "default_fill_ratio_threshold")]
    pub fill_ratio_threshold: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Write an annotated screenshot whenever the icon is found.
    #[serde(default = "default_true")]
    pub save_screenshots: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            hsv_lower: default_hsv_lower(),
            hsv_upper: default_hsv_upper(),
            min_icon_area: default_min_icon_area(),
            max_icon_area: default_max_icon_area(),
            min_aspect_ratio: default_min_aspect_ratio(),
            max_aspect_ratio: default_max_aspect_ratio(),
            fill_ratio_threshold: default_fill_ratio_threshold(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            save_screenshots: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
    /// How many posts to process per run.
    #[serde(default = "default_post_limit")]
    pub post_limit: usize,
    /// Locally generated posts used when the API is unreachable.
    #[serde(default = "default_fallback_count")]
    pub fallback_count: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_api_timeout_secs(),
            post_limit: default_post_limit(),
            fallback_count: default_fallback_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Where saved files land. Empty means `<Desktop>/tjm-project`.
    #[serde(default)]
    pub target_dir: Option<PathBuf>,
    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: PathBuf,
    /// Regex matched against window titles to confirm the editor launched.
    #[serde(default = "default_window_title_pattern")]
    pub window_title_pattern: String,
    #[serde(default = "default_window_timeout_secs")]
    pub window_timeout_secs: u64,
    /// Workflow-level attempts per post: desktop is re-shown between them.
    #[serde(default = "default_open_attempts")]
    pub open_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            target_dir: None,
            screenshots_dir: default_screenshots_dir(),
            window_title_pattern: default_window_title_pattern(),
            window_timeout_secs: default_window_timeout_secs(),
            open_attempts: default_open_attempts(),
        }
    }
}

fn default_screen_width() -> u32 {
    1920
}

fn default_screen_height() -> u32 {
    1080
}

fn default_taskbar_height() -> u32 {
    80
}

fn default_hsv_lower() -> [u8; 3] {
    [95, 70, 70]
}

fn default_hsv_upper() -> [u8; 3] {
    [125, 255, 255]
}

fn default_min_icon_area() -> u32 {
    16 * 16
}

fn default_max_icon_area() -> u32 {
    128 * 128
}

fn default_min_aspect_ratio() -> f32 {
    0.7
}

fn default_max_aspect_ratio() -> f32 {
    1.4
}

fn default_fill_ratio_threshold() -> f32 {
    0.12
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_api_url() -> String {
    "https://jsonplaceholder.typicode.com/posts".to_string()
}

fn default_api_timeout_secs() -> u64 {
    10
}

fn default_post_limit() -> usize {
    10
}

fn default_fallback_count() -> u32 {
    3
}

fn default_screenshots_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_window_title_pattern() -> String {
    "- Notepad$|^Notepad$".to_string()
}

fn default_window_timeout_secs() -> u64 {
    10
}

fn default_open_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    None
}

/// Load `config.toml` from next to the executable or the working directory.
/// A missing file is not an error: the built-in defaults mirror the
/// reference deployment (1920x1080, blue icon, JSONPlaceholder).
pub fn load_config() -> PostpadResult<AppConfig> {
    let Some(path) = resolve_config_path() else {
        tracing::info!("no config.toml found, using built-in defaults");
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}
