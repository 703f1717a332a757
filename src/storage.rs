//! Where resized images and packaged bundles are kept.
//!
//! The backend is picked once from [`StorageConfig`]; nothing downstream
//! checks which one is in use.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{CreativeError, Result};
use crate::image_impl::image_name_from_url;
use crate::types::StorageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Bundle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ArtifactKind,
    pub name: String,
    /// Location as written, before any sharing step.
    pub url: String,
}

pub trait CreativeStorage {
    fn put(&self, kind: ArtifactKind, name: &str, bytes: &[u8]) -> Result<StoredObject>;

    fn delete(&self, kind: ArtifactKind, name: &str) -> Result<()>;

    /// URL a browser can fetch for `ttl`.
    fn share_url(&self, object: &StoredObject, ttl: Duration) -> Result<String>;
}

pub fn from_config(config: &StorageConfig) -> Result<Box<dyn CreativeStorage>> {
    Ok(match config {
        StorageConfig::Local { root, base_url } => {
            Box::new(LocalStorage::new(root.clone(), base_url.clone()))
        }
        StorageConfig::Gcs {
            bucket,
            access_token,
            credentials,
        } => {
            let signer = UrlSigner::new(&ServiceAccountKey::from_file(credentials)?)?;
            Box::new(GcsStorage::new(bucket.clone(), access_token.clone(), signer)?)
        }
    })
}

/// Serves files from the app's own `static/` tree.
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn relative(kind: ArtifactKind, name: &str) -> String {
        match kind {
            ArtifactKind::Image => format!("images/{}", name),
            ArtifactKind::Bundle => name.to_string(),
        }
    }

    pub fn path_for(&self, kind: ArtifactKind, name: &str) -> PathBuf {
        self.root.join(Self::relative(kind, name))
    }
}

impl CreativeStorage for LocalStorage {
    fn put(&self, kind: ArtifactKind, name: &str, bytes: &[u8]) -> Result<StoredObject> {
        let path = self.path_for(kind, name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        Ok(StoredObject {
            kind,
            name: name.to_string(),
            url: format!("{}/static/{}", self.base_url, Self::relative(kind, name)),
        })
    }

    fn delete(&self, kind: ArtifactKind, name: &str) -> Result<()> {
        fs::remove_file(self.path_for(kind, name))?;
        Ok(())
    }

    fn share_url(&self, object: &StoredObject, _ttl: Duration) -> Result<String> {
        Ok(object.url.clone())
    }
}

const GCS_UPLOAD_ENDPOINT: &str = "https://storage.googleapis.com/upload/storage/v1/b";
const GCS_OBJECT_ENDPOINT: &str = "https://storage.googleapis.com/storage/v1/b";
const GCS_BROWSER_ENDPOINT: &str = "https://storage.cloud.google.com";
const GCS_SIGNING_HOST: &str = "storage.googleapis.com";
const SIGNING_ALGORITHM: &str = "GOOG4-RSA-SHA256";
/// Longest lifetime V4 signing accepts.
const MAX_SIGNED_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

// RFC 3986 unreserved characters stay literal.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
const PATH_ENCODE: &AsciiSet = &QUERY_ENCODE.remove(b'/');

/// The fields of a service-account JSON key needed for signing.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Canonical pieces of a V4 signed GET, before the signature is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub path: String,
    pub canonical_query: String,
    pub string_to_sign: String,
}

impl SigningRequest {
    pub fn new(
        bucket: &str,
        name: &str,
        client_email: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if ttl.is_zero() || ttl > MAX_SIGNED_TTL {
            return Err(CreativeError::Storage(format!(
                "signed URL lifetime must be between 1 and {} seconds, got {}",
                MAX_SIGNED_TTL.as_secs(),
                ttl.as_secs()
            )));
        }

        let date = now.format("%Y%m%d").to_string();
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{}/auto/storage/goog4_request", date);
        let credential = format!("{}/{}", client_email, scope);
        let path = format!("/{}/{}", bucket, utf8_percent_encode(name, PATH_ENCODE));

        // Already in sorted key order.
        let params = [
            ("X-Goog-Algorithm", SIGNING_ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", timestamp.clone()),
            ("X-Goog-Expires", ttl.as_secs().to_string()),
            ("X-Goog-SignedHeaders", "host".to_string()),
        ];
        let canonical_query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, QUERY_ENCODE)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            path, canonical_query, GCS_SIGNING_HOST
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            timestamp,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        Ok(Self {
            path,
            canonical_query,
            string_to_sign,
        })
    }

    pub fn url_with_signature(&self, signature: &[u8]) -> String {
        format!(
            "https://{}{}?{}&X-Goog-Signature={}",
            GCS_SIGNING_HOST,
            self.path,
            self.canonical_query,
            hex::encode(signature)
        )
    }
}

/// Signs V4 URLs with a service-account RSA key (RSASSA-PKCS1-v1_5, SHA-256).
pub struct UrlSigner {
    client_email: String,
    key: SigningKey<Sha256>,
}

impl UrlSigner {
    pub fn new(account: &ServiceAccountKey) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(&account.private_key)
            .map_err(|e| CreativeError::Storage(format!("invalid service account key: {}", e)))?;
        Ok(Self {
            client_email: account.client_email.clone(),
            key: SigningKey::<Sha256>::new(key),
        })
    }

    pub fn sign(&self, bucket: &str, name: &str, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        let request = SigningRequest::new(bucket, name, &self.client_email, ttl, now)?;
        let signature = self
            .key
            .try_sign(request.string_to_sign.as_bytes())
            .map_err(|e| CreativeError::Storage(format!("signing failed: {}", e)))?;
        Ok(request.url_with_signature(&signature.to_bytes()))
    }
}

fn gcs_object_url(bucket: &str, name: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(GCS_OBJECT_ENDPOINT)
        .map_err(|e| CreativeError::Storage(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| CreativeError::Storage("cannot build object URL".to_string()))?
        .extend([bucket, "o", name]);
    Ok(url)
}

/// Google Cloud Storage via the JSON API. Objects are keyed by bare name.
pub struct GcsStorage {
    http: reqwest::blocking::Client,
    bucket: String,
    access_token: String,
    signer: UrlSigner,
}

impl GcsStorage {
    pub fn new(bucket: String, access_token: String, signer: UrlSigner) -> Result<Self> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            http,
            bucket,
            access_token,
            signer,
        })
    }
}

impl CreativeStorage for GcsStorage {
    fn put(&self, kind: ArtifactKind, name: &str, bytes: &[u8]) -> Result<StoredObject> {
        let endpoint = format!("{}/{}/o", GCS_UPLOAD_ENDPOINT, self.bucket);
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "media"), ("name", name)])
            .body(bytes.to_vec())
            .send()?;
        if !response.status().is_success() {
            return Err(CreativeError::Storage(format!(
                "upload of {} failed with {}",
                name,
                response.status()
            )));
        }
        info!("Uploaded {} to bucket {}", name, self.bucket);

        Ok(StoredObject {
            kind,
            name: name.to_string(),
            url: format!("{}/{}/{}", GCS_BROWSER_ENDPOINT, self.bucket, name),
        })
    }

    fn delete(&self, _kind: ArtifactKind, name: &str) -> Result<()> {
        let response = self
            .http
            .delete(gcs_object_url(&self.bucket, name)?)
            .bearer_auth(&self.access_token)
            .send()?;
        if !response.status().is_success() {
            return Err(CreativeError::Storage(format!(
                "delete of {} failed with {}",
                name,
                response.status()
            )));
        }
        info!("Blob {} deleted", name);
        Ok(())
    }

    fn share_url(&self, object: &StoredObject, ttl: Duration) -> Result<String> {
        debug!("Signing {} for {}s", object.name, ttl.as_secs());
        self.signer.sign(&self.bucket, &object.name, ttl, Utc::now())
    }
}

/// Deletes a creative's image and bundle. Failures are logged, never returned.
pub fn clean_files(storage: &dyn CreativeStorage, img_url: &str, zip_url: &str) {
    for (kind, url) in [(ArtifactKind::Image, img_url), (ArtifactKind::Bundle, zip_url)] {
        let name = match image_name_from_url(url) {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping cleanup of {}: {}", url, e);
                continue;
            }
        };
        match storage.delete(kind, &name) {
            Ok(()) => info!("Deleted {}", name),
            Err(e) => warn!("Could not delete {}: {}", name, e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hotspot_{}_{}_{}",
            tag,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_local_layout_and_urls() {
        let root = scratch_dir("layout");
        let storage = LocalStorage::new(root.clone(), "http://localhost:8080/".to_string());

        let img = storage.put(ArtifactKind::Image, "car.png", b"png").unwrap();
        assert_eq!(img.url, "http://localhost:8080/static/images/car.png");
        assert!(root.join("images/car.png").exists());

        let zip = storage.put(ArtifactKind::Bundle, "creative_1.zip", b"zip").unwrap();
        assert_eq!(zip.url, "http://localhost:8080/static/creative_1.zip");
        assert_eq!(storage.share_url(&zip, Duration::from_secs(60)).unwrap(), zip.url);

        storage.delete(ArtifactKind::Image, "car.png").unwrap();
        assert!(!root.join("images/car.png").exists());
        assert!(storage.delete(ArtifactKind::Image, "car.png").is_err());

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_clean_is_best_effort() {
        let root = scratch_dir("clean");
        let storage = LocalStorage::new(root.clone(), "http://localhost:8080".to_string());
        let img = storage.put(ArtifactKind::Image, "car.png", b"png").unwrap();

        // The bundle was never written; the image must still go.
        clean_files(&storage, &img.url, "http://localhost:8080/static/creative_9.zip");
        assert!(!root.join("images/car.png").exists());

        clean_files(&storage, "", "not a url");
        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_gcs_object_url_escapes_name() {
        let url = gcs_object_url("proj.appspot.com", "creative 1.zip").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/proj.appspot.com/o/creative%201.zip"
        );
    }

    fn signing_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_signed_query_pins_ttl() {
        let hour = SigningRequest::new(
            "proj.appspot.com",
            "creative_1.zip",
            "svc@proj.iam.gserviceaccount.com",
            Duration::from_secs(3600),
            signing_time(),
        )
        .unwrap();
        assert_eq!(
            hour.canonical_query,
            "X-Goog-Algorithm=GOOG4-RSA-SHA256\
             &X-Goog-Credential=svc%40proj.iam.gserviceaccount.com%2F20240305%2Fauto%2Fstorage%2Fgoog4_request\
             &X-Goog-Date=20240305T070809Z\
             &X-Goog-Expires=3600\
             &X-Goog-SignedHeaders=host"
        );
        assert_eq!(hour.path, "/proj.appspot.com/creative_1.zip");

        let minute = SigningRequest::new(
            "proj.appspot.com",
            "creative_1.zip",
            "svc@proj.iam.gserviceaccount.com",
            Duration::from_secs(60),
            signing_time(),
        )
        .unwrap();
        assert!(minute.canonical_query.contains("&X-Goog-Expires=60&"));
        assert_ne!(hour.string_to_sign, minute.string_to_sign);
    }

    #[test]
    fn test_string_to_sign_layout() {
        let req = SigningRequest::new(
            "b",
            "images/car 1.png",
            "svc@p.iam.gserviceaccount.com",
            Duration::from_secs(3600),
            signing_time(),
        )
        .unwrap();
        assert_eq!(req.path, "/b/images/car%201.png");

        let lines: Vec<&str> = req.string_to_sign.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "GOOG4-RSA-SHA256");
        assert_eq!(lines[1], "20240305T070809Z");
        assert_eq!(lines[2], "20240305/auto/storage/goog4_request");
        assert_eq!(lines[3].len(), 64);
        assert!(lines[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signed_ttl_bounds() {
        for ttl in [Duration::ZERO, MAX_SIGNED_TTL + Duration::from_secs(1)] {
            let err = SigningRequest::new("b", "x.zip", "svc@p", ttl, signing_time()).unwrap_err();
            assert!(matches!(err, CreativeError::Storage(_)));
        }
        assert!(SigningRequest::new("b", "x.zip", "svc@p", MAX_SIGNED_TTL, signing_time()).is_ok());
    }

    #[test]
    fn test_signature_verifies_with_public_key() {
        use rsa::pkcs1v15::{Signature, VerifyingKey};
        use rsa::pkcs8::{EncodePrivateKey, LineEnding};
        use rsa::signature::Verifier;

        let private = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, 1024).unwrap();
        let verifying = VerifyingKey::<Sha256>::new(private.to_public_key());
        let account = ServiceAccountKey {
            client_email: "svc@p.iam.gserviceaccount.com".to_string(),
            private_key: private.to_pkcs8_pem(LineEnding::LF).unwrap().to_string(),
        };

        let signer = UrlSigner::new(&account).unwrap();
        let ttl = Duration::from_secs(3600);
        let url = signer.sign("b", "creative_1.zip", ttl, signing_time()).unwrap();

        let request =
            SigningRequest::new("b", "creative_1.zip", &account.client_email, ttl, signing_time()).unwrap();
        let (unsigned, signature_hex) = url.split_once("&X-Goog-Signature=").unwrap();
        assert_eq!(
            unsigned,
            format!("https://storage.googleapis.com/b/creative_1.zip?{}", request.canonical_query)
        );

        let bytes = hex::decode(signature_hex).unwrap();
        let signature = Signature::try_from(bytes.as_slice()).unwrap();
        assert!(verifying
            .verify(request.string_to_sign.as_bytes(), &signature)
            .is_ok());
    }

    #[test]
    fn test_service_account_key_file() {
        let dir = scratch_dir("credentials");
        let path = dir.join("key.json");
        fs::write(
            &path,
            r#"{"type":"service_account","client_email":"svc@p.iam.gserviceaccount.com","private_key":"not a key"}"#,
        )
        .unwrap();

        let account = ServiceAccountKey::from_file(&path).unwrap();
        assert_eq!(account.client_email, "svc@p.iam.gserviceaccount.com");
        assert!(matches!(UrlSigner::new(&account), Err(CreativeError::Storage(_))));

        fs::remove_dir_all(dir).unwrap();
    }
}
