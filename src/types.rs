use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CreativeError;

pub const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Signed/shared URLs stay valid for an hour.
pub const SHARE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
pub struct FilterConfig {
    /// Labels that never become hotspots, whatever their score.
    pub excluded_labels: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_labels: vec!["Person".to_string()],
        }
    }
}

impl FilterConfig {
    pub fn is_excluded(&self, label: &str) -> bool {
        self.excluded_labels.iter().any(|l| l == label)
    }
}

#[derive(Clone, Debug)]
pub struct BundleConfig {
    pub css_files: Vec<String>,
    pub js_files: Vec<String>,
    pub html_file_name: String,
    pub transparent_gif_name: String,
    /// Directory holding `css/`, `js/` and `images/` runtime assets.
    pub static_dir: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        let css_files = [
            "gwdgooglead_style.css",
            "gwdpage_style.css",
            "gwdimage_style.css",
            "gwdpagedeck_style.css",
            "gwdtaparea_style.css",
        ];
        let js_files = [
            "Enabler.js",
            "gwdtaparea_min.js",
            "gwdpage_min.js",
            "gwd-events-support.1.0.js",
            "gwd_webcomponents_v1_min.js",
            "gwdgooglead_min.js",
            "gwdpagedeck_min.js",
            "gwdimage_min.js",
        ];

        Self {
            css_files: css_files.iter().map(|s| s.to_string()).collect(),
            js_files: js_files.iter().map(|s| s.to_string()).collect(),
            html_file_name: "creative.html".to_string(),
            transparent_gif_name: "transparent.gif".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum StorageConfig {
    /// Files under `root`, served back from `base_url`.
    Local { root: PathBuf, base_url: String },
    /// Google Cloud Storage bucket. Uploads and deletes use the OAuth access
    /// token; shared links are signed with the service-account key file.
    Gcs {
        bucket: String,
        access_token: String,
        credentials: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local {
            root: PathBuf::from("static"),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl StorageConfig {
    /// App Engine default bucket for a project.
    pub fn gcs_for_project(project: &str, access_token: String, credentials: PathBuf) -> Self {
        StorageConfig::Gcs {
            bucket: format!("{}.appspot.com", project),
            access_token,
            credentials,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GlobalConfig {
    pub api_key: String,
    pub vision_endpoint: String,
    pub share_ttl: Duration,
    pub storage: StorageConfig,
    pub filter: FilterConfig,
    pub bundle: BundleConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            vision_endpoint: VISION_ENDPOINT.to_string(),
            share_ttl: SHARE_TTL,
            storage: StorageConfig::default(),
            filter: FilterConfig::default(),
            bundle: BundleConfig::default(),
        }
    }
}

/// Requested creative size, parsed from `WIDTHxHEIGHT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl FromStr for ImageDimensions {
    type Err = CreativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CreativeError::InvalidDimensions(s.to_string());
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

pub fn parse_threshold(s: &str) -> Result<f64, CreativeError> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| CreativeError::InvalidThreshold(f64::NAN))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(CreativeError::InvalidThreshold(value));
    }
    Ok(value)
}
