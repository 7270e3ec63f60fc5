use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::SweepFault;

/// Typed session configuration. Replaces the original deployment's
/// string-templated model configuration document.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_model: String,
    pub temperature: f64,
    pub system_instruction: String,
}

/// Opaque handle to a registered generative session. Obtained from
/// `open_session`, consumed by `close_session`.
#[derive(Debug)]
pub struct SessionHandle {
    name: String,
}

impl SessionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The inference backend the sweep talks to. All calls are synchronous
/// blocking round-trips; the backend holds at most one open session at a
/// time (opening a second before closing the first is a usage error and
/// asserts, it is not a recoverable fault).
pub trait InferenceBackend {
    fn embed(&mut self, model: &str, input: &str) -> Result<Vec<f32>, SweepFault>;

    fn open_session(&mut self, config: &SessionConfig) -> Result<SessionHandle, SweepFault>;

    fn generate(&mut self, session: &SessionHandle, prompt: &str) -> Result<String, SweepFault>;

    fn close_session(&mut self, session: SessionHandle) -> Result<(), SweepFault>;
}

/// Ollama-compatible HTTP backend. A session is a derived model registered
/// under a fixed name, carrying the base model, the sampling temperature,
/// and the system instruction.
pub struct OllamaBackend {
    client: HttpClient,
    base_url: String,
    active_session: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    model: &'a str,
    from: &'a str,
    system: &'a str,
    parameters: SessionParameters,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct SessionParameters {
    temperature: f64,
    penalize_newline: bool,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct DeleteSessionRequest<'a> {
    model: &'a str,
}

impl OllamaBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SweepFault> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SweepFault::ServiceUnavailable(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            active_session: None,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn check_status(status: StatusCode, model: &str, operation: &str) -> Result<(), SweepFault> {
        if status == StatusCode::NOT_FOUND {
            return Err(SweepFault::ModelUnavailable(model.to_string()));
        }
        if !status.is_success() {
            return Err(SweepFault::ServiceUnavailable(format!(
                "{operation} returned status {status}"
            )));
        }
        Ok(())
    }
}

impl InferenceBackend for OllamaBackend {
    fn embed(&mut self, model: &str, input: &str) -> Result<Vec<f32>, SweepFault> {
        let response = self
            .client
            .post(self.endpoint("api/embed"))
            .json(&EmbedRequest { model, input })
            .send()
            .map_err(|err| SweepFault::ServiceUnavailable(err.to_string()))?;

        Self::check_status(response.status(), model, "embed")?;

        let body: EmbedResponse = response
            .json()
            .map_err(|err| SweepFault::ServiceUnavailable(format!("embed response: {err}")))?;

        body.embeddings
            .into_iter()
            .next()
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| {
                SweepFault::ServiceUnavailable("embed response carried no vectors".to_string())
            })
    }

    fn open_session(&mut self, config: &SessionConfig) -> Result<SessionHandle, SweepFault> {
        assert!(
            self.active_session.is_none(),
            "a generative session is already open; close it before opening another"
        );

        let name = crate::config::SESSION_NAME;
        let response = self
            .client
            .post(self.endpoint("api/create"))
            .json(&CreateSessionRequest {
                model: name,
                from: &config.base_model,
                system: &config.system_instruction,
                parameters: SessionParameters {
                    temperature: config.temperature,
                    penalize_newline: true,
                },
                stream: false,
            })
            .send()
            .map_err(|err| SweepFault::ServiceUnavailable(err.to_string()))?;

        Self::check_status(response.status(), &config.base_model, "open_session")?;

        self.active_session = Some(name.to_string());
        Ok(SessionHandle {
            name: name.to_string(),
        })
    }

    fn generate(&mut self, session: &SessionHandle, prompt: &str) -> Result<String, SweepFault> {
        let response = self
            .client
            .post(self.endpoint("api/generate"))
            .json(&GenerateRequest {
                model: session.name(),
                prompt,
                stream: false,
            })
            .send()
            .map_err(|err| SweepFault::ServiceUnavailable(err.to_string()))?;

        Self::check_status(response.status(), session.name(), "generate")?;

        let body: GenerateResponse = response
            .json()
            .map_err(|_| SweepFault::MalformedAnswer)?;

        if body.response.trim().is_empty() {
            return Err(SweepFault::MalformedAnswer);
        }

        Ok(body.response)
    }

    fn close_session(&mut self, session: SessionHandle) -> Result<(), SweepFault> {
        let result = self
            .client
            .delete(self.endpoint("api/delete"))
            .json(&DeleteSessionRequest {
                model: session.name(),
            })
            .send()
            .map_err(|err| SweepFault::ServiceUnavailable(err.to_string()))
            .and_then(|response| {
                Self::check_status(response.status(), session.name(), "close_session")
            });

        // The slot is released even when deletion fails; the backend state is
        // gone either way once the next cell re-registers the session name.
        self.active_session = None;
        result
    }
}
