mod common;

use common::*;
use fontweave::{
    ConversionConfig, ConversionJob, CustomFontRecord, ErrorKind, FontStyle, FontWeight, JobError, JobOutcome,
    JobStage, NoopListener, ProgressEvent, RenderError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const DOCUMENT: &str = r#"<!DOCTYPE html>
<html><head><style>
  body { font-family: "Merriweather", serif; }
  h1 { font-family: Brand; font-weight: 700; }
  code { font-family: 'DejaVu Sans Mono', monospace; }
</style></head>
<body><h1>Title</h1><p>Body text</p><code>x</code></body></html>"#;

fn job(id: &str, source: &str) -> ConversionJob {
    ConversionJob::new(id, source, ConversionConfig::default())
}

#[tokio::test]
async fn converts_with_remote_custom_and_bundled_fonts() {
    init_logger();
    let server = font_server().await;
    let renderer = Arc::new(StubRenderer::default());
    let orchestrator = orchestrator(&server, renderer.clone()).await;
    orchestrator
        .store()
        .save(CustomFontRecord::new(
            "brand-bold",
            "Brand",
            FontWeight::BOLD,
            FontStyle::Normal,
            vec![0u8, 1, 0, 0, 7],
        ))
        .await
        .unwrap();

    let recorder = Arc::new(Recorder::default());
    let outcome = orchestrator.convert("editor", job("job-1", DOCUMENT), recorder.clone()).await;

    let output = outcome.output().expect("job should succeed");
    assert!(output.pdf.starts_with(b"%PDF-"));
    assert_eq!(output.fonts.resolved.len(), 3);
    assert!(output.fonts.failed.is_empty());
    assert_eq!(output.fonts.primary.as_deref(), Some("merriweather 400 normal"));

    // Bundled fonts stay with the engine; the rest are handed over.
    let seen = renderer.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![vec!["Brand".to_string(), "Merriweather".to_string()]]);

    assert_eq!(
        recorder.stages(),
        vec!["validating", "detecting_fonts", "resolving_fonts", "rendering", "succeeded"]
    );
    let view = orchestrator.slot("editor").unwrap();
    assert_eq!(view.job_id, "job-1");
    assert_eq!(view.stage, JobStage::Succeeded);
    assert_eq!(view.outcome, Some(outcome));
}

#[tokio::test]
async fn font_events_arrive_inside_the_resolving_stage() {
    let server = font_server().await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;
    let recorder = Arc::new(Recorder::default());
    orchestrator.convert("s", job("job-1", DOCUMENT), recorder.clone()).await;

    let events = recorder.snapshot();
    let position = |stage: JobStage| {
        events
            .iter()
            .position(|e| matches!(e, ProgressEvent::Stage { stage: s, .. } if *s == stage))
            .unwrap()
    };
    let resolving = position(JobStage::ResolvingFonts);
    let rendering = position(JobStage::Rendering);
    let font_events: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, ProgressEvent::FontResolved { .. } | ProgressEvent::FontFailed { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(font_events.len(), 3);
    assert!(font_events.iter().all(|i| *i > resolving && *i < rendering));
    assert!(events.iter().all(|e| e.job_id() == "job-1"));
}

#[tokio::test]
async fn invalid_documents_fail_in_validation() {
    let server = font_server().await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;
    let recorder = Arc::new(Recorder::default());

    let outcome = orchestrator.convert("s", job("job-1", "   \n"), recorder.clone()).await;
    assert_eq!(outcome.error().map(JobError::kind), Some(ErrorKind::ValidationError));
    assert_eq!(recorder.stages(), vec!["validating", "failed"]);
    assert_eq!(orchestrator.slot("s").unwrap().stage, JobStage::Failed);
}

#[tokio::test]
async fn malformed_styles_fail_in_detection() {
    let server = font_server().await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;
    let recorder = Arc::new(Recorder::default());

    let outcome = orchestrator
        .convert("s", job("job-1", "<style>body { font-family: Lora</style>"), recorder.clone())
        .await;
    assert!(matches!(outcome, JobOutcome::Failed(JobError::Detection(_))));
    assert_eq!(recorder.stages(), vec!["validating", "detecting_fonts", "failed"]);
}

#[tokio::test]
async fn html_fragments_resolve_inline_fonts() {
    let server = font_server().await;
    let renderer = Arc::new(StubRenderer::default());
    let orchestrator = orchestrator(&server, renderer.clone()).await;

    let fragment = r#"<div style="font-family: Lora"><h1>Price {tbd</h1></div>"#;
    let outcome = orchestrator.convert("s", job("job-1", fragment), Arc::new(NoopListener)).await;

    let output = outcome.output().expect("fragment should convert");
    assert_eq!(output.fonts.primary.as_deref(), Some("lora 400 normal"));
    assert_eq!(renderer.seen.lock().unwrap()[0], vec!["Lora".to_string()]);
}

#[tokio::test]
async fn secondary_font_failures_are_reported_not_fatal() {
    let server = font_server().await;
    Mock::given(method("GET"))
        .and(path("/css2"))
        .and(query_param("family", "NonExistentFont:wght@400"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;

    let source = "body { font-family: Merriweather } aside { font-family: NonExistentFont }";
    let recorder = Arc::new(Recorder::default());
    let outcome = orchestrator.convert("s", job("job-1", source), recorder.clone()).await;

    let output = outcome.output().expect("missing secondary font is not fatal");
    assert_eq!(output.fonts.failed.len(), 1);
    assert_eq!(output.fonts.failed[0].family, "NonExistentFont");
    assert_eq!(output.fonts.failed[0].kind, ErrorKind::NotFound);
    assert!(output.fonts.failed[0].message.contains("404"));
    assert!(recorder.snapshot().iter().any(|e| matches!(
        e,
        ProgressEvent::FontFailed { kind: ErrorKind::NotFound, .. }
    )));
}

#[tokio::test]
async fn unresolved_primary_font_fails_the_job() {
    let server = font_server().await;
    Mock::given(method("GET"))
        .and(path("/css2"))
        .and(query_param("family", "Vanished:wght@400"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&server)
        .await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;
    let recorder = Arc::new(Recorder::default());

    let outcome = orchestrator
        .convert("s", job("job-1", ":root { font-family: Vanished }"), recorder.clone())
        .await;
    match outcome {
        JobOutcome::Failed(JobError::FontResolutionFailed { family, cause, .. }) => {
            assert_eq!(family, "Vanished");
            assert_eq!(cause, ErrorKind::NotFound);
        }
        other => panic!("expected font_resolution_failed, got {other:?}"),
    }
    assert_eq!(
        recorder.stages(),
        vec!["validating", "detecting_fonts", "resolving_fonts", "failed"]
    );
}

#[tokio::test]
async fn explicit_default_font_becomes_the_primary() {
    let server = font_server().await;
    let renderer = Arc::new(StubRenderer::default());
    let orchestrator = orchestrator(&server, renderer.clone()).await;
    let config = ConversionConfig {
        default_font: Some("Source Serif 4".into()),
        ..ConversionConfig::default()
    };

    let outcome = orchestrator
        .convert(
            "s",
            ConversionJob::new("job-1", "<p style=\"color: red\">x</p>", config),
            Arc::new(NoopListener),
        )
        .await;
    let output = outcome.output().unwrap();
    assert_eq!(output.fonts.primary.as_deref(), Some("source serif 4 400 normal"));
    assert_eq!(renderer.seen.lock().unwrap()[0], vec!["Source Serif 4".to_string()]);
}

#[tokio::test]
async fn render_errors_surface_verbatim() {
    let server = font_server().await;
    let error = RenderError::new("template references unknown element").with_code("E_TEMPLATE");
    let orchestrator = orchestrator(&server, Arc::new(FixedRenderer(Err(error.clone())))).await;

    let outcome = orchestrator.convert("s", job("job-1", DOCUMENT), Arc::new(NoopListener)).await;
    assert_eq!(outcome, JobOutcome::Failed(JobError::Render(error)));
}

#[tokio::test]
async fn output_without_pdf_header_is_rejected() {
    let server = font_server().await;
    let orchestrator = orchestrator(&server, Arc::new(FixedRenderer(Ok(b"<html>".to_vec())))).await;

    let outcome = orchestrator.convert("s", job("job-1", DOCUMENT), Arc::new(NoopListener)).await;
    match outcome {
        JobOutcome::Failed(JobError::Render(err)) => assert_eq!(err.code.as_deref(), Some("invalid_output")),
        other => panic!("expected render_error, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_jobs_reuse_cached_fonts() {
    let server = font_server().await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;
    let source = "body { font-family: Merriweather } h1 { font-family: Oswald; font-weight: 600 }";

    for i in 0..3 {
        let outcome = orchestrator
            .convert("s", job(&format!("job-{i}"), source), Arc::new(NoopListener))
            .await;
        assert_eq!(outcome.stage(), JobStage::Succeeded);
    }
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 4, "two stylesheets and two font files, once each");
    assert_eq!(orchestrator.cache().stats().size, 2);
}

#[tokio::test]
async fn newer_job_supersedes_an_in_flight_one() {
    init_logger();
    let server = font_server().await;
    let renderer = Arc::new(GatedRenderer::default());
    let orchestrator = Arc::new(orchestrator(&server, renderer.clone()).await);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .convert("editor", job("job-a", "<p>hold</p>"), Arc::new(StageChannel(tx)))
                .await
        })
    };

    // Wait until job A is blocked inside the render engine.
    loop {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(ProgressEvent::Stage {
                stage: JobStage::Rendering,
                ..
            })) => break,
            Ok(Some(_)) => continue,
            other => panic!("job A never reached rendering: {other:?}"),
        }
    }

    let outcome_b = orchestrator
        .convert("editor", job("job-b", "<p>go</p>"), Arc::new(NoopListener))
        .await;
    assert_eq!(outcome_b.stage(), JobStage::Succeeded);

    renderer.release.notify_one();
    let outcome_a = first.await.unwrap();
    assert_eq!(outcome_a, JobOutcome::Superseded);

    let view = orchestrator.slot("editor").unwrap();
    assert_eq!(view.job_id, "job-b");
    assert_eq!(view.outcome, Some(outcome_b));

    // A announced its supersession exactly once and nothing after it.
    let mut trailing = Vec::new();
    while let Ok(event) = rx.try_recv() {
        trailing.push(event);
    }
    assert_eq!(
        trailing,
        vec![ProgressEvent::Stage {
            job_id: "job-a".into(),
            stage: JobStage::Superseded
        }]
    );
}

/// Waits on `rx` until the job reports `stage`.
async fn wait_for_stage(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>, stage: JobStage) {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(ProgressEvent::Stage { stage: seen, .. })) if seen == stage => return,
            Ok(Some(_)) => continue,
            other => panic!("job never reached {stage}: {other:?}"),
        }
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn superseded_job_that_fails_does_not_overwrite_the_slot() {
    let server = font_server().await;
    let renderer = Arc::new(GatedRenderer::default());
    let orchestrator = Arc::new(orchestrator(&server, renderer.clone()).await);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .convert("editor", job("job-a", "<p>hold then fail</p>"), Arc::new(StageChannel(tx)))
                .await
        })
    };
    wait_for_stage(&mut rx, JobStage::Rendering).await;

    let outcome_b = orchestrator
        .convert("editor", job("job-b", "<p>go</p>"), Arc::new(NoopListener))
        .await;
    assert_eq!(outcome_b.stage(), JobStage::Succeeded);

    renderer.release.notify_one();
    assert_eq!(first.await.unwrap(), JobOutcome::Superseded);

    let view = orchestrator.slot("editor").unwrap();
    assert_eq!(view.job_id, "job-b");
    assert_eq!(view.stage, JobStage::Succeeded);
    assert_eq!(view.outcome, Some(outcome_b));
    assert_eq!(
        drain(&mut rx),
        vec![ProgressEvent::Stage {
            job_id: "job-a".into(),
            stage: JobStage::Superseded
        }]
    );
}

#[tokio::test]
async fn job_superseded_while_resolving_never_renders() {
    let server = font_server().await;
    let css = format!(
        "@font-face {{ font-family: 'Slow'; src: url({}/s/slow.ttf) format('truetype'); }}",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/css2"))
        .and(query_param("family", "Slow:wght@400"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(css)
                .set_delay(Duration::from_millis(300)),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    let renderer = Arc::new(GatedRenderer::default());
    let orchestrator = Arc::new(orchestrator(&server, renderer.clone()).await);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .convert("editor", job("job-a", "body { font-family: Slow }"), Arc::new(StageChannel(tx)))
                .await
        })
    };
    wait_for_stage(&mut rx, JobStage::ResolvingFonts).await;

    let outcome_b = orchestrator
        .convert("editor", job("job-b", "<p>go</p>"), Arc::new(NoopListener))
        .await;
    assert_eq!(outcome_b.stage(), JobStage::Succeeded);

    assert_eq!(first.await.unwrap(), JobOutcome::Superseded);
    assert_eq!(*renderer.rendered.lock().unwrap(), vec!["<p>go</p>".to_string()]);
    assert_eq!(orchestrator.slot("editor").unwrap().outcome, Some(outcome_b));
    assert_eq!(
        drain(&mut rx),
        vec![ProgressEvent::Stage {
            job_id: "job-a".into(),
            stage: JobStage::Superseded
        }]
    );
}

#[tokio::test]
async fn jobs_in_different_slots_are_independent() {
    let server = font_server().await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;

    let a = orchestrator.convert("left", job("a", DOCUMENT), Arc::new(NoopListener)).await;
    let b = orchestrator.convert("right", job("b", DOCUMENT), Arc::new(NoopListener)).await;
    assert_eq!(a.stage(), JobStage::Succeeded);
    assert_eq!(b.stage(), JobStage::Succeeded);
    assert_eq!(orchestrator.slot("left").unwrap().job_id, "a");
    assert_eq!(orchestrator.slot("right").unwrap().job_id, "b");
}

#[tokio::test]
async fn reset_discards_slot_state() {
    let server = font_server().await;
    let orchestrator = orchestrator(&server, Arc::new(StubRenderer::default())).await;
    orchestrator.convert("s", job("a", DOCUMENT), Arc::new(NoopListener)).await;

    assert!(orchestrator.reset("s"));
    assert!(orchestrator.slot("s").is_none());
    assert!(!orchestrator.reset("s"));
}
