use serde::{Deserialize, Serialize};

/// How public URLs are built for stored keys.
///
/// With a custom `endpoint` (MinIO, LocalStack, a CDN) the URL is
/// path-style: `<endpoint>/<bucket>/<key>`. Without one it is the default
/// regional S3 virtual-host form: `https://<bucket>.s3.<region>.amazonaws.com/<key>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUrl {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

impl Default for PublicUrl {
    fn default() -> Self {
        Self {
            bucket: "images".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }
}

impl PublicUrl {
    pub fn url_for(&self, key: &str) -> String {
        match self.endpoint.as_deref().map(|e| e.trim_end_matches('/')) {
            Some(endpoint) if !endpoint.is_empty() => {
                format!("{}/{}/{}", endpoint, self.bucket, key)
            }
            _ => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}
