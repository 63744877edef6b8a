//! End-to-end tests for the generation pipeline

use async_trait::async_trait;
use circuitforge::ai::{ModelInfo, ProviderError};
use circuitforge::export::to_svg_string;
use circuitforge::{
    export, export_with_theme, parse, render, CircuitForgeCore, ForgeError, GenerationOptions,
    InferenceProvider, Severity, Theme, TranslateError, Translator,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Provider that replays the stored model output.
struct ReplayModel {
    output: String,
    loads: AtomicUsize,
}

#[async_trait]
impl InferenceProvider for ReplayModel {
    fn name(&self) -> &str {
        "replay"
    }

    async fn load(&self) -> Result<ModelInfo, ProviderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.model_info())
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Ok(self.output.clone())
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "replay".to_string(),
            model_name: "replay-t5".to_string(),
            is_local: true,
            max_output_tokens: 512,
        }
    }
}

/// Provider that is never reachable.
struct OfflineModel;

#[async_trait]
impl InferenceProvider for OfflineModel {
    fn name(&self) -> &str {
        "offline"
    }

    async fn load(&self) -> Result<ModelInfo, ProviderError> {
        Err(ProviderError::ApiError {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        unreachable!("generate called before a successful load")
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "offline".to_string(),
            model_name: "none".to_string(),
            is_local: false,
            max_output_tokens: 0,
        }
    }
}

fn replay_translator() -> (Arc<ReplayModel>, Translator) {
    let output = std::fs::read_to_string(fixture_path("model_output.txt")).unwrap();
    let model = Arc::new(ReplayModel {
        output,
        loads: AtomicUsize::new(0),
    });
    let translator = Translator::new(model.clone()).with_retry_delay(Duration::from_millis(1));
    (model, translator)
}

#[tokio::test]
async fn test_generate_produces_all_artifacts() {
    let (model, translator) = replay_translator();
    let options = GenerationOptions::default();

    let generation = CircuitForgeCore::generate(
        &translator,
        "5V battery with 100 ohm resistor and 10uF capacitor",
        &options,
    )
    .await
    .unwrap();

    assert_eq!(
        generation.normalized_prompt.as_deref(),
        Some("A series circuit with 5V source, a 100 resistor and a 10uF capacitor.")
    );
    assert!(generation.raw_output.contains("<pad>"));
    assert!(!generation.netlist_text.contains("<pad>"));
    assert_eq!(generation.components.len(), 3);
    assert_eq!(generation.drawing.symbols.len(), 3);
    assert!(generation.svg(Theme::Display).unwrap().contains("#fafafa"));
    assert!(generation.svg(Theme::Download).unwrap().contains("#000000"));
    assert_eq!(generation.stats.critical, 0);

    // A second run reuses the loaded model.
    CircuitForgeCore::generate(&translator, "a 1k resistor", &options)
        .await
        .unwrap();
    assert_eq!(model.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generation_serializes_without_svg() {
    let (_, translator) = replay_translator();
    let generation =
        CircuitForgeCore::generate(&translator, "a 1k resistor", &GenerationOptions::default())
            .await
            .unwrap();

    let json = serde_json::to_value(&generation).unwrap();
    assert_eq!(json["model"], "replay-t5");
    assert_eq!(json["components"][0]["reference"], "V1");
    assert!(json.get("svg_display").is_none());
    assert!(json.get("drawing").is_none());
}

#[tokio::test]
async fn test_unreachable_model_aborts_before_parsing() {
    let translator = Translator::new(Arc::new(OfflineModel)).with_retry_delay(Duration::from_millis(1));
    let err = CircuitForgeCore::generate(&translator, "a 1k resistor", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Translate(TranslateError::ModelUnavailable(_))
    ));
    assert!(!translator.is_loaded());
}

#[test]
fn test_netlist_file_pipeline() {
    let generation =
        CircuitForgeCore::from_file(&fixture_path("broken.cir"), &GenerationOptions::default())
            .unwrap();

    let rules: Vec<&str> = generation.issues.iter().map(|i| i.rule_id.as_str()).collect();
    assert!(rules.contains(&"power_source"));
    assert!(rules.contains(&"incomplete_component"));
    assert!(rules.contains(&"duplicate_reference"));
    assert!(generation.has_critical());

    // Checks never stop rendering.
    assert_eq!(generation.drawing.symbols.len(), 4);
    assert!(generation.drawing.dangling_count() >= 2);
    assert!(generation
        .svg(Theme::Download)
        .unwrap()
        .contains(r#"data-symbol="placeholder""#));
}

#[test]
fn test_clean_fixture_has_no_issues() {
    let generation =
        CircuitForgeCore::from_file(&fixture_path("rc_series.cir"), &GenerationOptions::default())
            .unwrap();
    assert_eq!(generation.total_issues(), 0, "{:?}", generation.issues);
}

#[test]
fn test_issue_lines_point_into_the_file() {
    let generation =
        CircuitForgeCore::from_file(&fixture_path("broken.cir"), &GenerationOptions::default())
            .unwrap();
    let unknown = generation
        .issues
        .iter()
        .find(|i| i.rule_id == "unknown_component")
        .unwrap();
    assert_eq!(unknown.severity, Severity::Warning);
    assert_eq!(unknown.line, Some(3));
}

#[test]
fn test_export_themes() {
    let text = std::fs::read_to_string(fixture_path("transistor.cir")).unwrap();
    let drawing = render(&parse(&text));

    let download = String::from_utf8(export(&drawing).unwrap()).unwrap();
    let display = String::from_utf8(export_with_theme(&drawing, Theme::Display).unwrap()).unwrap();

    assert_eq!(download.matches(r#"class="symbol""#).count(), drawing.symbols.len());
    assert_eq!(download.matches("<g").count(), download.matches("</g>").count());
    assert_eq!(
        display.replace("#fafafa", "#000000").replace("transparent", "#ffffff"),
        download
    );
    assert_eq!(to_svg_string(&drawing, Theme::Download).unwrap(), download);
}

#[test]
fn test_svg_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("divider.svg");
    let generation =
        CircuitForgeCore::from_file(&fixture_path("divider.cir"), &GenerationOptions::default())
            .unwrap();

    std::fs::write(&path, generation.svg(Theme::Download).unwrap()).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains(r#"data-ref="D1""#));
    assert!(written.contains("D1N4148"));
}
