//! HTTP implementation of `RoundSource`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use paperguess_core::error::FetchError;
use paperguess_core::model::{ActualValues, CacheStats, Round, ScoreResult};
use paperguess_core::scoring::MAX_AXIS_SCORE;
use paperguess_core::traits::{GuessSubmission, ImageStatus, RemoteScore, RoundSource};

use crate::error::classify;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Round source backed by the paperguess HTTP API.
pub struct HttpRoundSource {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpRoundSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Deserialize)]
struct RandomPaperResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    cites: Option<i64>,
    #[serde(default)]
    id: Option<PaperId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Paper ids arrive as numbers from some servers and strings from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum PaperId {
    Number(u64),
    Text(String),
}

impl From<PaperId> for String {
    fn from(id: PaperId) -> Self {
        match id {
            PaperId::Number(n) => n.to_string(),
            PaperId::Text(s) => s,
        }
    }
}

impl RandomPaperResponse {
    fn into_round(self) -> Result<Round, FetchError> {
        if !self.success {
            return Err(FetchError::Rejected(
                self.error
                    .unwrap_or_else(|| "server reported failure".to_string()),
            ));
        }
        let image = self
            .image
            .filter(|i| !i.is_empty())
            .ok_or_else(|| FetchError::Malformed("missing image".into()))?;
        // A server may withhold both actual values until the guess is in.
        let actual = match (self.year, self.cites) {
            (Some(year), Some(cites)) => {
                let citations = u32::try_from(cites).map_err(|_| {
                    FetchError::Malformed(format!("invalid citation count {cites}"))
                })?;
                Some(ActualValues { year, citations })
            }
            (None, None) => None,
            (Some(_), None) => return Err(FetchError::Malformed("missing cites".into())),
            (None, Some(_)) => return Err(FetchError::Malformed("missing year".into())),
        };

        Ok(Round {
            id: self.id.map(String::from),
            title: self.title.unwrap_or_default(),
            actual,
            image,
        })
    }
}

#[derive(Serialize)]
struct SubmitGuessRequest {
    year_guess: i32,
    cite_guess: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    paper_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_cites: Option<u32>,
}

impl From<&GuessSubmission> for SubmitGuessRequest {
    fn from(s: &GuessSubmission) -> Self {
        Self {
            year_guess: s.guess.year,
            cite_guess: s.guess.citations,
            paper_id: s.round_id.clone(),
            actual_year: s.actual.map(|a| a.year),
            actual_cites: s.actual.map(|a| a.citations),
        }
    }
}

#[derive(Deserialize)]
struct SubmitGuessResponse {
    /// Absent on servers that only answer on success.
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    year_score: Option<f64>,
    #[serde(default)]
    cite_score: Option<f64>,
    #[serde(default)]
    actual_year: Option<i32>,
    #[serde(default)]
    actual_cites: Option<u32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Scores may arrive as floats; clamp them into the axis range.
fn axis_score(raw: f64) -> u32 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, f64::from(MAX_AXIS_SCORE)) as u32
}

impl SubmitGuessResponse {
    fn into_remote_score(self) -> Result<RemoteScore, FetchError> {
        if self.success == Some(false) {
            return Err(FetchError::Rejected(
                self.error
                    .unwrap_or_else(|| "server reported failure".to_string()),
            ));
        }
        let year_score = self
            .year_score
            .ok_or_else(|| FetchError::Malformed("missing year_score".into()))?;
        let cite_score = self
            .cite_score
            .ok_or_else(|| FetchError::Malformed("missing cite_score".into()))?;

        // total_score is recomputed from the clamped axis scores
        let actual = match (self.actual_year, self.actual_cites) {
            (Some(year), Some(citations)) => Some(ActualValues { year, citations }),
            _ => None,
        };

        Ok(RemoteScore {
            score: ScoreResult::new(axis_score(year_score), axis_score(cite_score)),
            actual,
            title: self.title,
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Turn an error status into `Rejected`, using the body's `error` field if any.
async fn rejected(response: reqwest::Response) -> FetchError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or(body);
    FetchError::Rejected(format!("HTTP {status}: {message}"))
}

/// Decode an inline `data:` image.
fn decode_data_uri(locator: &str) -> Result<Vec<u8>, String> {
    let (header, payload) = locator
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| "malformed data URI".to_string())?;
    let bytes = if header.ends_with(";base64") {
        BASE64
            .decode(payload)
            .map_err(|e| format!("invalid base64 image: {e}"))?
    } else {
        payload.as_bytes().to_vec()
    };
    if bytes.is_empty() {
        return Err("empty image data".into());
    }
    Ok(bytes)
}

#[async_trait]
impl RoundSource for HttpRoundSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_round(&self) -> anyhow::Result<Round> {
        let response = self
            .client
            .get(self.url("/api/random-paper"))
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(rejected(response).await.into());
        }

        let body: RandomPaperResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(format!("failed to parse paper: {e}")))?;
        Ok(body.into_round()?)
    }

    #[instrument(skip(self, submission), fields(base_url = %self.base_url))]
    async fn submit_guess(&self, submission: &GuessSubmission) -> anyhow::Result<RemoteScore> {
        let response = self
            .client
            .post(self.url("/api/submit-guess"))
            .json(&SubmitGuessRequest::from(submission))
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(rejected(response).await.into());
        }

        let body: SubmitGuessResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(format!("failed to parse score: {e}")))?;
        Ok(body.into_remote_score()?)
    }

    async fn cache_stats(&self) -> anyhow::Result<CacheStats> {
        let response = self
            .client
            .get(self.url("/api/cache-stats"))
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(rejected(response).await.into());
        }

        let stats = response
            .json::<CacheStats>()
            .await
            .map_err(|e| FetchError::Malformed(format!("failed to parse cache stats: {e}")))?;
        Ok(stats)
    }

    async fn load_image(&self, locator: &str) -> ImageStatus {
        if locator.starts_with("data:") {
            return match decode_data_uri(locator) {
                Ok(bytes) => ImageStatus::Loaded { bytes: bytes.len() },
                Err(reason) => ImageStatus::Broken { reason },
            };
        }

        let url = if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_string()
        } else if locator.starts_with('/') {
            self.url(locator)
        } else {
            return ImageStatus::Broken {
                reason: format!("unsupported image locator: {locator}"),
            };
        };

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                return ImageStatus::Broken {
                    reason: classify(e, self.timeout).to_string(),
                }
            }
        };
        if !response.status().is_success() {
            return ImageStatus::Broken {
                reason: format!("HTTP {}", response.status().as_u16()),
            };
        }
        match response.bytes().await {
            Ok(bytes) => ImageStatus::Loaded { bytes: bytes.len() },
            Err(e) => ImageStatus::Broken {
                reason: e.to_string(),
            },
        }
    }
}
