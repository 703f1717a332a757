use std::time::Instant;

use image::GenericImageView;
use log::{info, warn};
use serde::Serialize;

use crate::error::Result;
use crate::image_impl::{decode, encode, format_for_name, image_name_from_url, resize_to_width, ImageFetcher};
use crate::markup::{generate_html5_parts, CreativeFragments};
use crate::polygons::get_polygons;
use crate::storage::{ArtifactKind, CreativeStorage};
use crate::types::{GlobalConfig, ImageDimensions};
use crate::vision::ObjectLocalizer;

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub img_url: String,
    pub threshold: f64,
    pub dimensions: Option<ImageDimensions>,
}

/// Everything the creative page needs.
#[derive(Debug, Clone, Serialize)]
pub struct Creative {
    pub img_url: String,
    pub img_name: String,
    pub width: u32,
    pub height: u32,
    pub fragments: CreativeFragments,
    pub elapse: f64,
}

pub struct CreativeBuilder<'a> {
    pub localizer: &'a dyn ObjectLocalizer,
    pub fetcher: &'a dyn ImageFetcher,
    pub storage: &'a dyn CreativeStorage,
    pub config: &'a GlobalConfig,
}

impl<'a> CreativeBuilder<'a> {
    pub fn new(
        localizer: &'a dyn ObjectLocalizer,
        fetcher: &'a dyn ImageFetcher,
        storage: &'a dyn CreativeStorage,
        config: &'a GlobalConfig,
    ) -> Self {
        Self {
            localizer,
            fetcher,
            storage,
            config,
        }
    }

    /// Detect, download, resize, store, then turn the detections into markup.
    ///
    /// A detection API error aborts before anything is downloaded or written.
    pub fn build(&self, request: &BuildRequest) -> Result<Creative> {
        let start = Instant::now();

        let detections = self.localizer.localize(&request.img_url)?.into_result()?;
        info!(
            "Detected {} objects in {}",
            detections.objects().len(),
            request.img_url
        );

        let bytes = self.fetcher.fetch(&request.img_url)?;
        let img = decode(&bytes)?;

        // Only the width drives the resize; the requested height is ignored.
        let desired_width = request.dimensions.map(|d| d.width);
        let img = resize_to_width(img, desired_width);
        let (width, height) = img.dimensions();
        if let Some(dims) = request.dimensions {
            if dims.height != height {
                warn!(
                    "Requested height {} ignored, image is {}x{}",
                    dims.height, width, height
                );
            }
        }

        let img_name = image_name_from_url(&request.img_url)?;
        let encoded = encode(&img, format_for_name(&img_name))?;
        let stored = self.storage.put(ArtifactKind::Image, &img_name, &encoded)?;
        let img_url = self.storage.share_url(&stored, self.config.share_ttl)?;

        let polygons = get_polygons(
            detections.objects(),
            width,
            height,
            request.threshold,
            &self.config.filter,
        );
        info!("{} hotspots above threshold {}", polygons.len(), request.threshold);

        let fragments = generate_html5_parts(&polygons);

        Ok(Creative {
            img_url,
            img_name,
            width,
            height,
            fragments,
            elapse: start.elapsed().as_secs_f64(),
        })
    }
}
