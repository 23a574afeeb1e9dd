//! Post-game review: per-ply analysis steps and a cursor over them

use serde::Serialize;

use crate::api::EvalStep;

/// One analysed ply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisStep {
    pub move_number: u32,
    pub fen: String,
    /// Positive favours the side the analysis was requested for
    pub score: f64,
}

impl From<&EvalStep> for AnalysisStep {
    fn from(step: &EvalStep) -> Self {
        Self {
            move_number: step.move_number,
            fen: step.fen.clone(),
            score: step.display_score(),
        }
    }
}

/// Cursor over a completed analysis.
///
/// `index == None` means no step is selected and the live game's final
/// position is shown. While an index is set the live game is frozen.
#[derive(Debug, Clone, Default)]
pub struct ReviewNavigator {
    steps: Vec<AnalysisStep>,
    index: Option<usize>,
}

impl ReviewNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the analysis and returns to the final position.
    pub fn load(&mut self, steps: Vec<AnalysisStep>) {
        self.steps = steps;
        self.index = None;
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.index = None;
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// True while a historical position is on display
    pub fn is_active(&self) -> bool {
        self.index.is_some()
    }

    pub fn current(&self) -> Option<&AnalysisStep> {
        self.index.and_then(|i| self.steps.get(i))
    }

    pub fn displayed_fen(&self) -> Option<&str> {
        self.current().map(|s| s.fen.as_str())
    }

    /// Selects `index`, clamped to the last step. No-op without analysis.
    pub fn go_to(&mut self, index: usize) {
        if self.steps.is_empty() {
            return;
        }
        self.index = Some(index.min(self.steps.len() - 1));
    }

    pub fn go_to_start(&mut self) {
        self.go_to(0);
    }

    pub fn go_to_final(&mut self) {
        self.index = None;
    }

    /// Next ply; stays on the last step. Does nothing while on the final position.
    pub fn step_forward(&mut self) {
        if let Some(i) = self.index {
            self.go_to(i + 1);
        }
    }

    /// Previous ply. From the final position this enters review at the last step.
    pub fn step_backward(&mut self) {
        match self.index {
            Some(i) => self.go_to(i.saturating_sub(1)),
            None => self.go_to(self.steps.len().saturating_sub(1)),
        }
    }

    /// Score series for the evaluation chart
    pub fn scores(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.score).collect()
    }
}
