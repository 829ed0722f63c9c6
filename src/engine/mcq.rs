use crate::domain::McqChallenge;

/// One attempt at a multiple-choice question
#[derive(Debug, Clone)]
pub struct McqRound {
  challenge: McqChallenge,
  selected: Option<usize>,
  result: Option<bool>,
}

impl McqRound {
  pub fn new(challenge: McqChallenge) -> Self {
    Self {
      challenge,
      selected: None,
      result: None,
    }
  }

  pub fn challenge(&self) -> &McqChallenge {
    &self.challenge
  }

  pub fn selected(&self) -> Option<usize> {
    self.selected
  }

  /// Select an option. Ignored once submitted or when out of range.
  pub fn select(&mut self, index: usize) -> bool {
    if self.result.is_some() || index >= self.challenge.options.len() {
      return false;
    }
    self.selected = Some(index);
    true
  }

  /// Check the selection. Returns `None` if nothing is selected yet.
  pub fn submit(&mut self) -> Option<bool> {
    if let Some(result) = self.result {
      return Some(result);
    }
    let correct = self.challenge.is_correct(self.selected?);
    self.result = Some(correct);
    Some(correct)
  }

  pub fn result(&self) -> Option<bool> {
    self.result
  }

  pub fn reset(&mut self) {
    self.selected = None;
    self.result = None;
  }
}
