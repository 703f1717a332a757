//! Image download, decode, resize and encode.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use crate::error::{CreativeError, Result};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.11 (KHTML, like Gecko) Chrome/23.0.1271.64 Safari/537.11";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Downloads with browser-like headers; some CDNs refuse bare clients.
pub struct HttpFetcher {
    http: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { http })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Downloading {}", url);
        let bytes = self.http.get(url).send()?.error_for_status()?.bytes()?;
        Ok(bytes.to_vec())
    }
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

/// Scales to `width` keeping the aspect ratio; the new height is truncated.
pub fn resize_to_width(img: DynamicImage, width: Option<u32>) -> DynamicImage {
    let width = match width {
        Some(w) if w > 0 => w,
        _ => return img,
    };
    let (w, h) = img.dimensions();
    if w == 0 || w == width {
        return img;
    }
    let ratio = width as f64 / w as f64;
    let height = ((h as f64 * ratio) as u32).max(1);
    img.resize_exact(width, height, FilterType::Triangle)
}

/// Output format from the file name, PNG when unknown.
pub fn format_for_name(name: &str) -> ImageFormat {
    ImageFormat::from_path(name).unwrap_or(ImageFormat::Png)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut buf, format)?,
        _ => img.write_to(&mut buf, format)?,
    }
    Ok(buf.into_inner())
}

/// Last path segment of `url`, query and fragment dropped.
pub fn image_name_from_url(url: &str) -> Result<String> {
    let invalid = || CreativeError::InvalidUrl(url.to_string());
    let name = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut s| s.next_back())
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|p| p.rsplit('/').next())
            .map(str::to_string),
    };
    name.filter(|n| !n.is_empty()).ok_or_else(invalid)
}

/// A 1x1 fully transparent GIF.
pub fn transparent_gif() -> Result<Vec<u8>> {
    let img = DynamicImage::ImageRgba8(image::RgbaImage::new(1, 1));
    encode(&img, ImageFormat::Gif)
}
