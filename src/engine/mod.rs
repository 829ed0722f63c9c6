//! Game engine: plays a lesson's modules in order and scores them.
//!
//! ```text
//! Presenting(0) --answer--> Presenting(0) --next--> Presenting(1) ... --next--> Completed
//! ```
//!
//! Each module records at most one outcome (score 100 when correct, 0 otherwise).
//! There is no backward navigation; `restart` starts the whole session over.

pub mod matching;
pub mod mcq;
pub mod rearrange;

use serde::{Deserialize, Serialize};

use crate::domain::{GameKind, GameModule, GamePayload};

pub use matching::{MatchEvent, MatchingBoard};
pub use mcq::McqRound;
pub use rearrange::RearrangeRound;

/// Score for a correct module
pub const FULL_SCORE: u32 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
  #[error("The game is already completed")]
  Completed,
  #[error("This module has already been answered")]
  AlreadyAnswered,
  #[error("Expected a {expected} answer, got {got}")]
  AnswerMismatch { expected: &'static str, got: &'static str },
  #[error("No answer has been given yet")]
  Unanswered,
}

/// A complete answer to one module, as submitted in one shot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Answer {
  #[serde(rename = "MCQ")]
  Mcq { selected: usize },
  #[serde(rename = "REARRANGE")]
  Rearrange { ordering: Vec<String> },
  /// Every `[left, right]` pair the player settled on
  #[serde(rename = "MATCHING")]
  Matching { pairs: Vec<(String, String)> },
}

impl Answer {
  pub fn kind(&self) -> GameKind {
    match self {
      Self::Mcq { .. } => GameKind::Mcq,
      Self::Rearrange { .. } => GameKind::Rearrange,
      Self::Matching { .. } => GameKind::Matching,
    }
  }
}

/// Check a one-shot answer against a module.
///
/// A matching answer is correct when it pairs every left item correctly.
pub fn check_answer(module: &GameModule, answer: &Answer) -> Result<bool, EngineError> {
  match (&module.payload, answer) {
    (GamePayload::Mcq(mcq), Answer::Mcq { selected }) => Ok(mcq.is_correct(*selected)),
    (GamePayload::Rearrange(challenge), Answer::Rearrange { ordering }) => {
      Ok(challenge.is_correct(ordering))
    }
    (GamePayload::Matching(matching), Answer::Matching { pairs }) => {
      let mut paired: Vec<&str> = pairs
        .iter()
        .filter(|(l, r)| matching.is_pair(l, r))
        .map(|(l, _)| l.as_str())
        .collect();
      paired.sort_unstable();
      paired.dedup();
      Ok(pairs.len() == matching.left_items.len() && paired.len() == matching.left_items.len())
    }
    (payload, answer) => Err(EngineError::AnswerMismatch {
      expected: payload.kind().as_str(),
      got: answer.kind().as_str(),
    }),
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleOutcome {
  pub module_id: i64,
  pub correct: bool,
  pub score: u32,
}

impl ModuleOutcome {
  pub fn new(module_id: i64, correct: bool) -> Self {
    Self {
      module_id,
      correct,
      score: if correct { FULL_SCORE } else { 0 },
    }
  }
}

/// Aggregate results emitted when the session completes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
  pub results: Vec<ModuleOutcome>,
  pub correct_count: usize,
  pub answered: usize,
  pub average_score: f64,
}

impl GameSummary {
  pub fn from_results(results: Vec<ModuleOutcome>) -> Self {
    let correct_count = results.iter().filter(|r| r.correct).count();
    let answered = results.len();
    let average_score = if answered > 0 {
      results.iter().map(|r| r.score as f64).sum::<f64>() / answered as f64
    } else {
      0.0
    };
    Self {
      results,
      correct_count,
      answered,
      average_score,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Presenting(usize),
  Completed,
}

/// Interactive state for the module on screen
#[derive(Debug, Clone)]
pub enum ModuleRound {
  Mcq(McqRound),
  Rearrange(RearrangeRound),
  Matching(MatchingBoard),
}

impl ModuleRound {
  pub fn for_module(module: &GameModule) -> Self {
    match &module.payload {
      GamePayload::Mcq(mcq) => Self::Mcq(McqRound::new(mcq.clone())),
      GamePayload::Rearrange(challenge) => Self::Rearrange(RearrangeRound::new(challenge.clone())),
      GamePayload::Matching(matching) => Self::Matching(MatchingBoard::new(matching.clone())),
    }
  }

  /// Evaluate the round; `None` while it cannot be judged yet
  fn evaluate(&mut self) -> Option<bool> {
    match self {
      Self::Mcq(round) => round.submit(),
      Self::Rearrange(round) => Some(round.submit()),
      Self::Matching(board) => board.is_complete().then_some(true),
    }
  }

  pub fn reset(&mut self) {
    match self {
      Self::Mcq(round) => round.reset(),
      Self::Rearrange(round) => round.reset(),
      Self::Matching(board) => board.reset(),
    }
  }
}

/// One play-through of a lesson's modules
#[derive(Debug, Clone)]
pub struct GameSession {
  modules: Vec<GameModule>,
  index: usize,
  round: Option<ModuleRound>,
  results: Vec<ModuleOutcome>,
  answered_current: bool,
  completed: bool,
}

impl GameSession {
  pub fn new(modules: Vec<GameModule>) -> Self {
    let round = modules.first().map(ModuleRound::for_module);
    let completed = modules.is_empty();
    Self {
      modules,
      index: 0,
      round,
      results: Vec::new(),
      answered_current: false,
      completed,
    }
  }

  pub fn state(&self) -> SessionState {
    if self.completed {
      SessionState::Completed
    } else {
      SessionState::Presenting(self.index)
    }
  }

  pub fn current(&self) -> Option<&GameModule> {
    if self.completed {
      None
    } else {
      self.modules.get(self.index)
    }
  }

  /// Interactive state of the current module
  pub fn round_mut(&mut self) -> Option<&mut ModuleRound> {
    if self.completed {
      None
    } else {
      self.round.as_mut()
    }
  }

  /// (1-based position, module count) for progress display
  pub fn progress(&self) -> (usize, usize) {
    let position = if self.completed {
      self.modules.len()
    } else {
      self.index + 1
    };
    (position, self.modules.len())
  }

  pub fn results(&self) -> &[ModuleOutcome] {
    &self.results
  }

  /// Record the outcome for the current module
  pub fn record_answer(&mut self, correct: bool) -> Result<&ModuleOutcome, EngineError> {
    if self.completed {
      return Err(EngineError::Completed);
    }
    if self.answered_current {
      return Err(EngineError::AlreadyAnswered);
    }
    let module_id = self.modules[self.index].id;
    self.answered_current = true;
    self.results.push(ModuleOutcome::new(module_id, correct));
    Ok(&self.results[self.results.len() - 1])
  }

  /// Check a one-shot answer for the current module and record it
  pub fn answer(&mut self, answer: &Answer) -> Result<&ModuleOutcome, EngineError> {
    let module = self.current().ok_or(EngineError::Completed)?;
    let correct = check_answer(module, answer)?;
    self.record_answer(correct)
  }

  /// Judge the interactive round of the current module and record it
  pub fn submit(&mut self) -> Result<&ModuleOutcome, EngineError> {
    if self.completed {
      return Err(EngineError::Completed);
    }
    let correct = self
      .round
      .as_mut()
      .and_then(ModuleRound::evaluate)
      .ok_or(EngineError::Unanswered)?;
    self.record_answer(correct)
  }

  /// Clear in-progress interaction on the current module only
  pub fn reset_round(&mut self) {
    if let Some(round) = self.round.as_mut() {
      round.reset();
    }
  }

  /// Advance to the next module; returns the summary when the last module is left.
  pub fn next(&mut self) -> Option<GameSummary> {
    if self.completed {
      return None;
    }
    if self.index + 1 < self.modules.len() {
      self.index += 1;
      self.round = Some(ModuleRound::for_module(&self.modules[self.index]));
      self.answered_current = false;
      None
    } else {
      self.completed = true;
      self.round = None;
      Some(self.summary())
    }
  }

  pub fn summary(&self) -> GameSummary {
    GameSummary::from_results(self.results.clone())
  }

  /// Start over from the first module with no results
  pub fn restart(&mut self) {
    self.index = 0;
    self.results.clear();
    self.answered_current = false;
    self.completed = self.modules.is_empty();
    self.round = self.modules.first().map(ModuleRound::for_module);
  }
}
