//! # hotspot - interactive HTML5 creatives from a single image
//!
//! Sends an image URL to the Cloud Vision object localizer, overlays a
//! clickable "hotspot" for every detected object and packages the result as
//! a deployable ad-creative ZIP.
//!
//! ## Pipeline
//!
//! - **Detection**: `OBJECT_LOCALIZATION` request, bounding polygons + scores
//! - **Filtering**: exclusion list and score threshold, unique `<Label>_<n>` names
//! - **Markup**: clip paths, cut layers, tap areas, exit metrics and marker circles
//! - **Packaging**: resized image, GWD runtime assets and the creative HTML in one ZIP
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotspot::{GlobalConfig, HotspotCreative};
//!
//! let config = GlobalConfig {
//!     api_key: std::env::var("API_KEY")?,
//!     ..GlobalConfig::default()
//! };
//!
//! let app = HotspotCreative::new(config)?;
//! let creative = app.build_creative("https://example.com/shoes.jpg", 0.85, Some("300x600".parse()?))?;
//!
//! for name in &creative.fragments.object_names {
//!     println!("{}", name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bundle;
mod creative;
mod error;
mod geometry;
mod image_impl;
mod markup;
mod polygons;
mod storage;
mod types;
mod vision;

pub use crate::bundle::{build_bundle, bundle_name, package_creative};
pub use crate::creative::{BuildRequest, Creative, CreativeBuilder};
pub use crate::error::{CreativeError, Result};
pub use crate::geometry::{normalize_vertices, to_pixel_vertices, PixelVertex};
pub use crate::image_impl::{resize_to_width, HttpFetcher, ImageFetcher};
pub use crate::markup::{
    circles, exit_metric, generate_html5_parts, map_area, render_html, rounded_clip_path,
    rounded_cut_layer, rounded_tap_area, CreativeFragments, InteractionMode, JoinedFragments,
};
pub use crate::polygons::{get_polygons, PolygonEntry, PolygonSet};
pub use crate::storage::{
    clean_files, ArtifactKind, CreativeStorage, GcsStorage, LocalStorage, ServiceAccountKey, SigningRequest,
    StoredObject, UrlSigner,
};
pub use crate::types::{parse_threshold, BundleConfig, FilterConfig, GlobalConfig, ImageDimensions, StorageConfig};
pub use crate::vision::{AnnotateResponse, LocalizedObject, ObjectLocalizer, VisionClient};

/// Detection client, downloader and storage wired from one [`GlobalConfig`].
pub struct HotspotCreative {
    config: GlobalConfig,
    localizer: VisionClient,
    fetcher: HttpFetcher,
    storage: Box<dyn CreativeStorage>,
}

impl HotspotCreative {
    pub fn new(config: GlobalConfig) -> Result<Self> {
        let localizer = VisionClient::new(&config.vision_endpoint, &config.api_key)?;
        let fetcher = HttpFetcher::new()?;
        let storage = storage::from_config(&config.storage)?;

        Ok(Self {
            config,
            localizer,
            fetcher,
            storage,
        })
    }

    /// Detect objects in `img_url` and build the hotspot markup.
    pub fn build_creative(
        &self,
        img_url: &str,
        threshold: f64,
        dimensions: Option<ImageDimensions>,
    ) -> Result<Creative> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CreativeError::InvalidThreshold(threshold));
        }
        let request = BuildRequest {
            img_url: img_url.to_string(),
            threshold,
            dimensions,
        };
        CreativeBuilder::new(&self.localizer, &self.fetcher, self.storage.as_ref(), &self.config)
            .build(&request)
    }

    /// Package the edited creative HTML with its image; returns the ZIP URL.
    pub fn generate_zip(&self, img_url: &str, img_name: &str, html: &[u8]) -> Result<String> {
        package_creative(
            &self.fetcher,
            self.storage.as_ref(),
            &self.config.bundle,
            img_url,
            img_name,
            html,
            self.config.share_ttl,
        )
    }

    /// Best-effort removal of a creative's image and ZIP.
    pub fn clean(&self, img_url: &str, zip_file_url: &str) {
        clean_files(self.storage.as_ref(), img_url, zip_file_url)
    }
}
