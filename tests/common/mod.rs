#![allow(dead_code)]

use async_trait::async_trait;
use fontweave::{
    ConversionConfig, ConversionOrchestrator, FontCollection, PipelineBuilder, ProgressEvent, ProgressListener,
    RenderEngine, RenderError, RetryConfig,
};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TTF: &[u8] = &[0x00, 0x01, 0x00, 0x00, 0x00, 0x04, 0x00, 0x80, 0x00, 0x02];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fast retries so failure paths finish quickly.
pub fn quick_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 2,
        base_delay_ms: 1,
        max_delay_ms: Some(2),
        timeout_ms: None,
    }
}

/// Serves a stylesheet for every family and the same TrueType file for all.
pub async fn font_server() -> MockServer {
    let server = MockServer::start().await;
    let css = format!(
        "/* latin */\n@font-face {{\n  font-family: 'Any';\n  src: url({}/s/any.ttf) format('truetype');\n}}\n",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/css2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(css))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/s/.*\.ttf$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(TTF.to_vec()))
        .mount(&server)
        .await;
    server
}

pub async fn orchestrator(server: &MockServer, renderer: Arc<dyn RenderEngine>) -> ConversionOrchestrator {
    PipelineBuilder::new()
        .with_stylesheet_url(format!("{}/css2", server.uri()))
        .with_retry(quick_retry())
        .with_renderer(renderer)
        .build()
        .await
        .expect("pipeline should build")
}

/// Renders a fake PDF listing the families it was given.
#[derive(Default)]
pub struct StubRenderer {
    pub seen: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl RenderEngine for StubRenderer {
    async fn render(
        &self,
        source: &str,
        _config: &ConversionConfig,
        fonts: Arc<FontCollection>,
    ) -> Result<Vec<u8>, RenderError> {
        let families: Vec<String> = fonts.iter().map(|f| f.family.clone()).collect();
        self.seen.lock().unwrap().push(families.clone());
        Ok(format!("%PDF-1.7\n% {} bytes, fonts: {}\n%%EOF", source.len(), families.join(", ")).into_bytes())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Returns a fixed result without looking at the input.
pub struct FixedRenderer(pub Result<Vec<u8>, RenderError>);

#[async_trait]
impl RenderEngine for FixedRenderer {
    async fn render(&self, _: &str, _: &ConversionConfig, _: Arc<FontCollection>) -> Result<Vec<u8>, RenderError> {
        self.0.clone()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Blocks documents containing `hold` until released; others render at once.
/// Documents containing `fail` end in a render error.
#[derive(Default)]
pub struct GatedRenderer {
    pub release: Notify,
    pub rendered: Mutex<Vec<String>>,
}

#[async_trait]
impl RenderEngine for GatedRenderer {
    async fn render(&self, source: &str, _: &ConversionConfig, _: Arc<FontCollection>) -> Result<Vec<u8>, RenderError> {
        self.rendered.lock().unwrap().push(source.to_string());
        if source.contains("hold") {
            self.release.notified().await;
        }
        if source.contains("fail") {
            return Err(RenderError::new("engine crashed").with_code("E_CRASH"));
        }
        Ok(format!("%PDF-1.7 {}", source.len()).into_bytes())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Collects every event it receives.
#[derive(Default)]
pub struct Recorder {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl Recorder {
    pub fn stages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Stage { stage, .. } => Some(stage.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressListener for Recorder {
    fn on_event(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Forwards stage events into a channel so tests can wait for them.
pub struct StageChannel(pub mpsc::UnboundedSender<ProgressEvent>);

impl ProgressListener for StageChannel {
    fn on_event(&self, event: &ProgressEvent) {
        if matches!(event, ProgressEvent::Stage { .. }) {
            let _ = self.0.send(event.clone());
        }
    }
}
