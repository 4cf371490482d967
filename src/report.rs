use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::annotate::LookaheadConfig;
use crate::error::{Diagnostic, Severity};

/// Summary of one tool run, saved next to the log file.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RunReport {
    pub tool: String,
    pub version: String,
    pub generated_at: String,
    pub input: String,
    pub output: String,
    pub records_in: usize,
    pub records_out: usize,
    pub lookahead: Option<LookaheadConfig>,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(tool: &str, input: &Path, output: &Path) -> Self {
        Self {
            tool: tool.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            input: input.display().to_string(),
            output: output.display().to_string(),
            records_in: 0,
            records_out: 0,
            lookahead: None,
            errors: 0,
            warnings: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: &[Diagnostic]) -> Self {
        self.errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        self.warnings = diagnostics.len() - self.errors;
        self.diagnostics = diagnostics.to_vec();
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        fs::write(path, json)?;
        Ok(())
    }
}
