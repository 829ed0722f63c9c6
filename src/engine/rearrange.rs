use crate::domain::RearrangeChallenge;

/// One attempt at putting items in order
#[derive(Debug, Clone)]
pub struct RearrangeRound {
  challenge: RearrangeChallenge,
  items: Vec<String>,
  result: Option<bool>,
}

impl RearrangeRound {
  pub fn new(challenge: RearrangeChallenge) -> Self {
    let items = challenge.items.clone();
    Self {
      challenge,
      items,
      result: None,
    }
  }

  pub fn items(&self) -> &[String] {
    &self.items
  }

  /// Take the item at `from` and insert it at `to` (drag-and-drop semantics).
  pub fn move_item(&mut self, from: usize, to: usize) -> bool {
    if self.result.is_some() || from >= self.items.len() || to >= self.items.len() {
      return false;
    }
    if from != to {
      let item = self.items.remove(from);
      self.items.insert(to, item);
    }
    true
  }

  pub fn submit(&mut self) -> bool {
    if let Some(result) = self.result {
      return result;
    }
    let correct = self.challenge.is_correct(&self.items);
    self.result = Some(correct);
    correct
  }

  pub fn result(&self) -> Option<bool> {
    self.result
  }

  /// Restore the authored starting order
  pub fn reset(&mut self) {
    self.items = self.challenge.items.clone();
    self.result = None;
  }
}
