//! Application state management

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::chat::ChatService;
use crate::config::Config;
use crate::flashcard::FlashcardService;
use crate::generation::{GeminiGenerator, TextGenerator};
use crate::ocr::{AsyncJobClient, JobTransport, MathpixTransport, PdfConverter, TextRecognizer};
use crate::speech::SpeechToText;

/// Timeout applied to every upstream request
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Upstream service clients
pub struct Services {
    pub pdf_transport: Arc<dyn JobTransport>,
    pub text_recognizer: TextRecognizer,
    pub speech: SpeechToText,
    pub flashcards: FlashcardService,
    pub chat: ChatService,
}

impl Services {
    /// Build the real upstream clients over one shared HTTP client
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        let generator: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::new(
            http.clone(),
            &config.gemini.api_url,
            &config.gemini.model,
            config.gemini.api_key.clone(),
        ));

        Ok(Self {
            pdf_transport: Arc::new(MathpixTransport::new(http.clone(), &config.ocr.api_url)),
            text_recognizer: TextRecognizer::new(http.clone(), &config.ocr.api_url),
            speech: SpeechToText::new(http, &config.speech.api_url, config.speech.api_key.clone()),
            flashcards: FlashcardService::new(Arc::clone(&generator)),
            chat: ChatService::new(generator),
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    services: Services,
    shutdown: CancellationToken,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self, StateError> {
        let services = Services::from_config(&config)?;
        Ok(Self::with_services(config, services))
    }

    /// Create application state around pre-built services
    pub fn with_services(config: Config, services: Services) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// A converter for one PDF job
    pub fn pdf_converter(&self) -> PdfConverter {
        let client = AsyncJobClient::new(
            Arc::clone(&self.inner.services.pdf_transport),
            self.inner.config.ocr.poll,
        );
        PdfConverter::new(client)
    }

    pub fn text_recognizer(&self) -> &TextRecognizer {
        &self.inner.services.text_recognizer
    }

    pub fn speech(&self) -> &SpeechToText {
        &self.inner.services.speech
    }

    pub fn flashcards(&self) -> &FlashcardService {
        &self.inner.services.flashcards
    }

    pub fn chat(&self) -> &ChatService {
        &self.inner.services.chat
    }

    /// Token cancelled when the server begins shutting down
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    /// Stop in-flight poll loops before their next poll
    pub fn shutdown(&self) {
        tracing::info!("Shutting down application state...");
        self.inner.shutdown.cancel();
    }
}
