//! Wire types and client for the Cloud Vision `images:annotate` endpoint.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CreativeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateRequest {
    pub requests: Vec<ImageRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub image: ImageRef,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub source: ImageSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub image_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
}

impl AnnotateRequest {
    pub fn object_localization(img_url: &str) -> Self {
        Self {
            requests: vec![ImageRequest {
                image: ImageRef {
                    source: ImageSource {
                        image_uri: img_url.to_string(),
                    },
                },
                features: vec![Feature {
                    kind: "OBJECT_LOCALIZATION".to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<ImageResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(default)]
    pub localized_object_annotations: Vec<LocalizedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub bounding_poly: BoundingPoly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    #[serde(default)]
    pub normalized_vertices: Vec<RawVertex>,
}

/// The API omits a coordinate when it is zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RawVertex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl AnnotateResponse {
    /// Request-level error first, then the first per-image error.
    pub fn first_error(&self) -> Option<&ApiStatus> {
        self.error
            .as_ref()
            .or_else(|| self.responses.iter().find_map(|r| r.error.as_ref()))
    }

    /// Objects of the first (only) image, in API order.
    pub fn objects(&self) -> &[LocalizedObject] {
        self.responses
            .first()
            .map(|r| r.localized_object_annotations.as_slice())
            .unwrap_or(&[])
    }

    pub fn into_result(self) -> Result<Self> {
        if let Some(status) = self.first_error() {
            return Err(CreativeError::Detection {
                code: status.code,
                message: status.message.clone(),
            });
        }
        Ok(self)
    }
}

pub trait ObjectLocalizer {
    fn localize(&self, img_url: &str) -> Result<AnnotateResponse>;
}

pub struct VisionClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl VisionClient {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl ObjectLocalizer for VisionClient {
    fn localize(&self, img_url: &str) -> Result<AnnotateResponse> {
        let body = AnnotateRequest::object_localization(img_url);
        debug!("Vision request: {}", serde_json::to_string(&body)?);

        // Error statuses still carry a JSON body with an `error` member,
        // so the status code is not checked here.
        let response: AnnotateResponse = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?
            .json()?;
        Ok(response)
    }
}
