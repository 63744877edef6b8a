//! Generation pipeline shared by the CLI and library users.
//!
//! description → (normalize) → translate → clean → parse → checks → render
//! → export. Only the translation step can fail before a netlist exists.
//! Everything after it is total; an export failure is kept in the
//! generation and reported when the SVG is asked for.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ai::{normalize_prompt, TranslateError, Translator};
use crate::analyzer::rules::{Issue, RulesEngine, Severity};
use crate::config::ConfigError;
use crate::export::{to_svg_string, Theme};
use crate::parser::{clean_model_output, parse, ComponentRecord, Netlist};
use crate::render::{Drawing, Renderer};

#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    #[error("{0}")]
    Translate(#[from] TranslateError),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Options for one pipeline run.
#[derive(Clone, Debug)]
pub struct GenerationOptions {
    /// Rewrite the description into the canonical training sentence first
    pub normalize_prompt: bool,
    /// Run the model-output cleaner before parsing
    pub clean_output: bool,
    /// Count warnings as critical
    pub strict_mode: bool,
    /// Rule ids to run; empty runs all
    pub rules: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            normalize_prompt: true,
            clean_output: true,
            strict_mode: false,
            rules: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

/// One row of the component table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRow {
    pub reference: String,
    pub kind: String,
    pub nodes: Vec<String>,
    pub value: String,
}

impl From<&ComponentRecord> for ComponentRow {
    fn from(record: &ComponentRecord) -> Self {
        Self {
            reference: record.reference.clone(),
            kind: record.kind.name().to_string(),
            nodes: record.nodes.iter().map(|n| n.to_string()).collect(),
            value: record.value_label().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Artifacts of one end-to-end run.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Description as given; empty for netlist-only runs
    pub prompt: String,
    /// Canonical sentence actually sent to the model, if normalization applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Text as returned by the model (or supplied by the caller)
    pub raw_output: String,
    /// Text that was parsed
    pub netlist_text: String,
    pub netlist: Netlist,
    pub components: Vec<ComponentRow>,
    pub issues: Vec<Issue>,
    pub stats: GenerationStats,
    #[serde(skip)]
    pub drawing: Drawing,
    /// Display-theme SVG, or the export error message
    #[serde(skip)]
    pub svg_display: Result<String, String>,
    #[serde(skip)]
    pub svg_download: Result<String, String>,
}

impl Generation {
    pub fn has_critical(&self) -> bool {
        self.stats.critical > 0
    }

    pub fn has_high_or_critical(&self) -> bool {
        self.stats.critical > 0 || self.stats.high > 0
    }

    pub fn total_issues(&self) -> usize {
        self.stats.critical + self.stats.high + self.stats.medium + self.stats.low + self.stats.info
    }

    /// SVG for `theme`; fails only if that export failed.
    pub fn svg(&self, theme: Theme) -> Result<&str, ForgeError> {
        let slot = match theme {
            Theme::Display => &self.svg_display,
            Theme::Download => &self.svg_download,
        };
        slot.as_deref()
            .map_err(|message| ForgeError::Export(message.clone()))
    }
}

fn issues_to_stats(issues: &[Issue], strict: bool) -> GenerationStats {
    let mut stats = GenerationStats::default();
    for issue in issues {
        match issue.severity {
            Severity::Error => stats.critical += 1,
            Severity::Warning if strict => stats.critical += 1,
            Severity::Warning => stats.high += 1,
            Severity::Suggestion => stats.medium += 1,
            Severity::Info => stats.low += 1,
        }
    }
    stats
}

/// Core pipeline API used by the CLI.
pub struct CircuitForgeCore;

impl CircuitForgeCore {
    /// Run the whole pipeline for a description.
    pub async fn generate(
        translator: &Translator,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, ForgeError> {
        if prompt.trim().is_empty() {
            return Err(TranslateError::EmptyPrompt.into());
        }

        let normalized = if options.normalize_prompt {
            normalize_prompt(prompt)
        } else {
            None
        };
        match &normalized {
            Some(sentence) => tracing::debug!("Normalized prompt: {}", sentence),
            None if options.normalize_prompt => {
                tracing::debug!("No components recognized; sending description as is")
            }
            None => {}
        }
        let model_input = normalized.as_deref().unwrap_or(prompt);

        let raw_output = translator.translate(model_input).await?;

        let mut generation = Self::from_netlist(&raw_output, options);
        generation.prompt = prompt.to_string();
        generation.normalized_prompt = normalized;
        generation.model = translator.model_info().map(|m| m.model_name.clone());

        tracing::info!(
            "Generated {} components with {} issues",
            generation.netlist.len(),
            generation.issues.len()
        );
        Ok(generation)
    }

    /// Run the post-model part of the pipeline on netlist text.
    pub fn from_netlist(text: &str, options: &GenerationOptions) -> Generation {
        Self::from_netlist_with(text, options, &Renderer::default())
    }

    /// Like [`Self::from_netlist`], drawing with `renderer`.
    pub fn from_netlist_with(
        text: &str,
        options: &GenerationOptions,
        renderer: &Renderer,
    ) -> Generation {
        let netlist_text = if options.clean_output {
            clean_model_output(text)
        } else {
            text.to_string()
        };
        let netlist = parse(&netlist_text);

        let mut engine = RulesEngine::with_default_rules();
        engine.retain_rules(&options.rules);
        let issues = engine.analyze(&netlist);
        let stats = issues_to_stats(&issues, options.strict_mode);

        let drawing = renderer.render(&netlist);
        let svg_display = export_slot(&drawing, Theme::Display);
        let svg_download = export_slot(&drawing, Theme::Download);

        Generation {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            prompt: String::new(),
            normalized_prompt: None,
            model: None,
            raw_output: text.to_string(),
            netlist_text,
            components: netlist.components.iter().map(ComponentRow::from).collect(),
            netlist,
            issues,
            stats,
            drawing,
            svg_display,
            svg_download,
        }
    }

    /// Read a netlist file and run [`Self::from_netlist`] on it.
    pub fn from_file(path: &Path, options: &GenerationOptions) -> Result<Generation, ForgeError> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!("Read {} bytes from {}", text.len(), path.display());
        Ok(Self::from_netlist(&text, options))
    }
}

fn export_slot(drawing: &Drawing, theme: Theme) -> Result<String, String> {
    to_svg_string(drawing, theme).map_err(|e| {
        tracing::warn!("{} export failed: {}", theme, e);
        e.to_string()
    })
}
