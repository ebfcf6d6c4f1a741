//! Backtest-driven model selection

use crate::backtest::Backtester;
use crate::features::FeatureTable;
use crate::models::{DeterministicGrowthModel, ForecastModel, SeasonalModel};
use tracing::{info, warn};

/// Fewest rows for which candidates are scored at all
pub const MIN_SELECTION_ROWS: usize = 10;

/// Picks the candidate with the lowest walk-forward MAPE
#[derive(Debug, Clone)]
pub struct ModelSelector {
    candidates: Vec<Box<dyn ForecastModel>>,
    backtester: Backtester,
    scores: Vec<(String, f64)>,
    selected_score: Option<f64>,
}

impl ModelSelector {
    /// Create a selector over an ordered list of candidates
    pub fn new(candidates: Vec<Box<dyn ForecastModel>>) -> Self {
        Self {
            candidates,
            backtester: Backtester::default(),
            scores: Vec::new(),
            selected_score: None,
        }
    }

    /// Deterministic growth first, then seasonal
    pub fn with_default_candidates() -> Self {
        Self::new(vec![
            Box::new(DeterministicGrowthModel::new()),
            Box::new(SeasonalModel::new()),
        ])
    }

    /// Use a differently sized backtester for scoring
    pub fn with_backtester(mut self, backtester: Backtester) -> Self {
        self.backtester = backtester;
        self
    }

    /// Candidates in the order they were given
    pub fn candidates(&self) -> &[Box<dyn ForecastModel>] {
        &self.candidates
    }

    /// `(model name, score)` pairs from the last selection, in candidate order
    pub fn performance_scores(&self) -> &[(String, f64)] {
        &self.scores
    }

    /// Backtest score of the last selected model; `None` when nothing was scored
    pub fn selected_score(&self) -> Option<f64> {
        self.selected_score
    }

    /// Fit and score every candidate, returning a copy of the winner.
    ///
    /// Ties go to the earlier candidate. With fewer than 10 rows the first
    /// candidate is returned as given and no scores are recorded.
    pub fn select_best_model(&mut self, features: &FeatureTable) -> Box<dyn ForecastModel> {
        self.scores.clear();
        self.selected_score = None;

        let first = match self.candidates.first() {
            Some(first) => first,
            None => {
                warn!("no candidate models, using deterministic growth");
                return Box::new(DeterministicGrowthModel::new());
            }
        };

        if features.len() < MIN_SELECTION_ROWS {
            info!(
                rows = features.len(),
                model = first.name(),
                "too little history to compare models, using first candidate"
            );
            return first.clone_box();
        }

        let mut best_index = 0;
        let mut best_score = f64::INFINITY;

        for (index, candidate) in self.candidates.iter_mut().enumerate() {
            let score = match candidate.fit(features) {
                Ok(()) => self.backtester.score(candidate.as_ref(), features),
                Err(e) => {
                    warn!(model = candidate.name(), error = %e, "candidate failed to fit");
                    f64::INFINITY
                }
            };

            if score < best_score {
                best_score = score;
                best_index = index;
            }
            self.scores.push((candidate.name().to_string(), score));
        }

        let best = &self.candidates[best_index];
        info!(model = best.name(), mape = best_score, "selected forecasting model");
        self.selected_score = Some(best_score);

        best.clone_box()
    }
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::with_default_candidates()
    }
}
