//! Export pipeline stages
//!
//! ```text
//! Created -> CheckingFreshness -> Succeeded                       (cached)
//!                              -> CleaningWorkspace -> StagingArtifacts
//!                                 -> [GeneratingDescriptor] -> Archiving -> Succeeded
//! ```
//!
//! `Failed` is reachable from every non-terminal stage. `GeneratingDescriptor`
//! only appears on the compose path.

use crate::domain::errors::AppExportError;
use crate::domain::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportStage {
    Created,
    CheckingFreshness,
    CleaningWorkspace,
    StagingArtifacts,
    GeneratingDescriptor,
    Archiving,
    Succeeded,
    Failed,
}

impl ExportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStage::Created => "created",
            ExportStage::CheckingFreshness => "checking-freshness",
            ExportStage::CleaningWorkspace => "cleaning-workspace",
            ExportStage::StagingArtifacts => "staging-artifacts",
            ExportStage::GeneratingDescriptor => "generating-descriptor",
            ExportStage::Archiving => "archiving",
            ExportStage::Succeeded => "succeeded",
            ExportStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportStage::Succeeded | ExportStage::Failed)
    }

    /// Whether the pipeline may move from `self` to `next`
    pub fn can_transition_to(&self, next: ExportStage) -> bool {
        use ExportStage::*;

        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Created, CheckingFreshness)
                | (CheckingFreshness, Succeeded)
                | (CheckingFreshness, CleaningWorkspace)
                | (CleaningWorkspace, StagingArtifacts)
                | (StagingArtifacts, GeneratingDescriptor)
                | (StagingArtifacts, Archiving)
                | (GeneratingDescriptor, Archiving)
                | (Archiving, Succeeded)
        )
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current stage plus the path taken to reach it
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: ExportStage,
    history: Vec<ExportStage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: ExportStage::Created,
            history: vec![ExportStage::Created],
        }
    }

    pub fn current(&self) -> ExportStage {
        self.current
    }

    pub fn history(&self) -> &[ExportStage] {
        &self.history
    }

    /// Moves to `next`
    ///
    /// # Errors
    ///
    /// Returns a validation error for a transition the pipeline never makes.
    pub fn advance(&mut self, next: ExportStage) -> Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(AppExportError::Validation(format!(
                "illegal stage transition {} -> {}",
                self.current, next
            )));
        }
        tracing::debug!(from = %self.current, to = %next, "Stage transition");
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    /// Moves to `Failed` unless already terminal
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            self.current = ExportStage::Failed;
            self.history.push(ExportStage::Failed);
        }
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
