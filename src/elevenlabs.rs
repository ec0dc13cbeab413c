//! ElevenLabs speech synthesis client.
//!
//! `SpeechClient` is the seam the rest of the crate talks to; the HTTP
//! implementation lives in `ElevenLabsClient`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ElevenLabsConfig;
use crate::error::{Result, XiError};

/// A synthesis voice as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// Voice settings sent with every synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Fetch every voice available to the account.
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// Synthesize `text` with `voice_id`, returning the encoded MP3 payload.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> Result<Vec<u8>>;
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<ApiVoice>,
}

#[derive(Deserialize)]
struct ApiVoice {
    voice_id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
}

impl From<ApiVoice> for Voice {
    fn from(v: ApiVoice) -> Self {
        Self {
            id: v.voice_id,
            name: v.name,
            category: v.category.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<&'a str>,
    voice_settings: &'a VoiceSettings,
}

pub struct ElevenLabsClient {
    api_key: String,
    base_url: String,
    model_id: Option<String>,
    client: Client,
}

impl ElevenLabsClient {
    pub fn new(api_key: String, config: &ElevenLabsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| XiError::Upstream(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_id: config.model_id.clone(),
            client,
        })
    }

    /// Build a client from the API key in the configured environment variable.
    pub fn from_env(config: &ElevenLabsConfig) -> Result<Self> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Self::new(key, config),
            _ => Err(XiError::MissingApiKey(config.api_key_env.clone())),
        }
    }

    async fn check(resp: Response, what: &str) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(XiError::Upstream(format!("{what} returned {status}: {}", body.trim())))
    }
}

#[async_trait]
impl SpeechClient for ElevenLabsClient {
    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let url = format!("{}/v1/voices", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| XiError::Upstream(format!("failed to get voices: {e}")))?;

        let data: VoicesResponse = Self::check(resp, "voice listing")
            .await?
            .json()
            .await
            .map_err(|e| XiError::Upstream(format!("failed to parse voices: {e}")))?;

        debug!("Fetched {} voices", data.voices.len());
        Ok(data.voices.into_iter().map(Voice::from).collect())
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> Result<Vec<u8>> {
        let t0 = Instant::now();
        let url = format!("{}/v1/text-to-speech/{voice_id}", self.base_url);
        let body = TtsRequest {
            text,
            model_id: self.model_id.as_deref(),
            voice_settings: settings,
        };

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| XiError::Upstream(format!("failed to generate speech: {e}")))?;

        let audio = Self::check(resp, "text-to-speech")
            .await?
            .bytes()
            .await
            .map_err(|e| XiError::Upstream(format!("failed to read speech payload: {e}")))?;

        debug!(
            "Synthesized {} chars -> {} bytes in {:.0}ms",
            text.chars().count(),
            audio.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voices_response_tolerates_null_category() {
        let json = r#"{"voices":[
            {"voice_id":"21m00","name":"Rachel","category":"premade","labels":{}},
            {"voice_id":"abc","name":"Clone","category":null}
        ]}"#;
        let data: VoicesResponse = serde_json::from_str(json).unwrap();
        let voices: Vec<Voice> = data.voices.into_iter().map(Voice::from).collect();
        assert_eq!(voices[0].id, "21m00");
        assert_eq!(voices[0].category, "premade");
        assert_eq!(voices[1].category, "");
    }

    #[test]
    fn tts_body_omits_missing_model() {
        let settings = VoiceSettings::default();
        let body = TtsRequest {
            text: "hi",
            model_id: None,
            voice_settings: &settings,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("model_id").is_none());
        assert_eq!(value["voice_settings"]["stability"], 0.5);
        assert_eq!(value["voice_settings"]["similarity_boost"], 0.5);
    }

    #[test]
    fn missing_api_key_is_reported_by_variable_name() {
        let config = ElevenLabsConfig {
            api_key_env: "XI_MCP_TEST_KEY_THAT_IS_NOT_SET".into(),
            ..Default::default()
        };
        match ElevenLabsClient::from_env(&config) {
            Err(XiError::MissingApiKey(var)) => assert_eq!(var, "XI_MCP_TEST_KEY_THAT_IS_NOT_SET"),
            _ => panic!("expected MissingApiKey"),
        }
    }
}
