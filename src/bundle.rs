//! Deployable ZIP bundle for a finished creative.
//!
//! Layout under `<bundle>/`: `images/<img>`, `images/transparent.gif`,
//! `css/*`, `js/*` and the creative HTML itself.

use std::fs;
use std::io::{Cursor, Write};

use log::{debug, info};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{CreativeError, Result};
use crate::image_impl::{transparent_gif, ImageFetcher};
use crate::storage::{ArtifactKind, CreativeStorage};
use crate::types::BundleConfig;

/// `creative_<unix micros>`.
pub fn bundle_name() -> String {
    format!("creative_{}", chrono::Utc::now().timestamp_micros())
}

fn read_transparent_gif(config: &BundleConfig) -> Result<Vec<u8>> {
    let path = config
        .static_dir
        .join("images")
        .join(&config.transparent_gif_name);
    if path.exists() {
        Ok(fs::read(path)?)
    } else {
        debug!("{} not found, generating one", path.display());
        transparent_gif()
    }
}

/// Entry names must stay inside the bundle directory.
fn check_file_name(name: &str) -> Result<&str> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(CreativeError::InvalidFileName(name.to_string()));
    }
    Ok(name)
}

pub fn build_bundle(
    bundle: &str,
    html: &[u8],
    image: &[u8],
    image_name: &str,
    config: &BundleConfig,
) -> Result<Vec<u8>> {
    let image_name = check_file_name(image_name)?;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file(format!("{}/images/{}", bundle, image_name), options)?;
    zip.write_all(image)?;

    zip.start_file(
        format!("{}/images/{}", bundle, config.transparent_gif_name),
        options,
    )?;
    zip.write_all(&read_transparent_gif(config)?)?;

    for file_name in &config.css_files {
        let bytes = fs::read(config.static_dir.join("css").join(file_name))?;
        zip.start_file(format!("{}/css/{}", bundle, file_name), options)?;
        zip.write_all(&bytes)?;
    }

    for file_name in &config.js_files {
        let bytes = fs::read(config.static_dir.join("js").join(file_name))?;
        zip.start_file(format!("{}/js/{}", bundle, file_name), options)?;
        zip.write_all(&bytes)?;
    }

    zip.start_file(format!("{}/{}", bundle, config.html_file_name), options)?;
    zip.write_all(html)?;

    Ok(zip.finish()?.into_inner())
}

/// Downloads the stored image, zips it with the HTML and stores the bundle.
/// Returns a shareable URL for the ZIP.
pub fn package_creative(
    fetcher: &dyn ImageFetcher,
    storage: &dyn CreativeStorage,
    config: &BundleConfig,
    img_url: &str,
    img_name: &str,
    html: &[u8],
    share_ttl: std::time::Duration,
) -> Result<String> {
    let bundle = bundle_name();
    let image = fetcher.fetch(img_url)?;
    let bytes = build_bundle(&bundle, html, &image, img_name, config)?;

    let stored = storage.put(ArtifactKind::Bundle, &format!("{}.zip", bundle), &bytes)?;
    let url = storage.share_url(&stored, share_ttl)?;
    info!("Results generated at {}", url);
    Ok(url)
}
