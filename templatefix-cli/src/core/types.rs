use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;

/// A located template function inside a file buffer.
///
/// `start..end` runs from the `export function` header through the end of
/// the anchor statement (`const { ... } = data;`). The remaining offsets are
/// absolute byte positions into the same buffer and are only valid for the
/// buffer the span was computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub start: usize,
    pub end: usize,

    /// The anchor statement itself
    pub anchor: Range<usize>,

    /// Text between the anchor's braces
    pub bindings: Range<usize>,

    /// End of the function body; edits never reach past this
    pub body_end: usize,

    /// Identifier of the function's single parameter
    pub param: String,
}

impl FunctionSpan {
    /// The full editable region, header through closing brace
    pub fn body(&self) -> Range<usize> {
        self.start..self.body_end
    }
}

/// Identifies a content-changing rule of the migration pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    BindingAugmentation,
    DescriptionsAlias,
    CallSiteNormalization,
    FetchElision,
    FallbackInjection,
    CaptionSubstitution,
    AltTextSubstitution,
}

impl RuleId {
    pub fn label(&self) -> &'static str {
        match self {
            RuleId::BindingAugmentation => "binding augmentation",
            RuleId::DescriptionsAlias => "descriptions alias",
            RuleId::CallSiteNormalization => "call-site normalization",
            RuleId::FetchElision => "fetch elision",
            RuleId::FallbackInjection => "fallback injection",
            RuleId::CaptionSubstitution => "caption substitution",
            RuleId::AltTextSubstitution => "alt-text substitution",
        }
    }
}

/// What happened to one target function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FunctionOutcome {
    /// At least one rule changed the function
    Migrated { rules: Vec<RuleId> },

    /// The anchor already binds the descriptions field
    AlreadyMigrated,

    /// Every rule ran and none matched
    Unchanged,

    /// The function could not be processed; the rest of the file still is
    Skipped { reason: String },
}

impl FunctionOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, FunctionOutcome::Migrated { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: FunctionOutcome,
}

/// Result of processing one file of the batch
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,

    pub functions: Vec<FunctionReport>,

    /// Whether the content differs from what was read
    pub modified: bool,

    /// Whether the new content was written back
    pub written: bool,

    pub lines_added: usize,
    pub lines_removed: usize,

    /// Unified diff of the change, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,

    /// I/O or lookup failure that made this file fail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            functions: Vec::new(),
            modified: false,
            written: false,
            lines_added: 0,
            lines_removed: 0,
            diff: None,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(path)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn migrated_count(&self) -> usize {
        self.functions.iter().filter(|f| f.outcome.changed()).count()
    }
}
