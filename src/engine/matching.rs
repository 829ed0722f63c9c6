//! Left/right matching board.
//!
//! A wrong pair flashes for [`FLASH_DURATION_MS`] and is then released. The
//! release is driven by the caller passing the current time: either through
//! [`MatchingBoard::tick`] or implicitly on the next selection, which
//! supersedes a pending flash.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::domain::MatchingChallenge;

/// How long an incorrect pair stays highlighted
pub const FLASH_DURATION_MS: i64 = 1000;

/// Points per correct pair (shown while playing, not part of the module score)
pub const POINTS_PER_MATCH: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
  /// Selection refused (already matched, unknown item, or board complete)
  Ignored,
  /// Waiting for an item from the other column
  Selected,
  Matched { left: String, right: String },
  Mismatched { left: String, right: String },
  /// The last pair was matched
  Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Flash {
  left: String,
  right: String,
  until: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MatchingBoard {
  challenge: MatchingChallenge,
  matches: BTreeMap<String, String>,
  selected_left: Option<String>,
  selected_right: Option<String>,
  flash: Option<Flash>,
  attempts: u32,
  points: u32,
}

impl MatchingBoard {
  pub fn new(challenge: MatchingChallenge) -> Self {
    Self {
      challenge,
      matches: BTreeMap::new(),
      selected_left: None,
      selected_right: None,
      flash: None,
      attempts: 0,
      points: 0,
    }
  }

  pub fn select_left(&mut self, item: &str, now: DateTime<Utc>) -> MatchEvent {
    self.tick(now);
    if self.is_complete()
      || self.is_left_matched(item)
      || !self.challenge.left_items.iter().any(|l| l == item)
    {
      return MatchEvent::Ignored;
    }
    self.release_flash();
    self.selected_left = Some(item.to_string());
    self.try_pair(now)
  }

  pub fn select_right(&mut self, item: &str, now: DateTime<Utc>) -> MatchEvent {
    self.tick(now);
    if self.is_complete()
      || self.is_right_matched(item)
      || !self.challenge.right_items.iter().any(|r| r == item)
    {
      return MatchEvent::Ignored;
    }
    self.release_flash();
    self.selected_right = Some(item.to_string());
    self.try_pair(now)
  }

  /// Release an expired flash. Returns true if something was released.
  pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
    match &self.flash {
      Some(flash) if now >= flash.until => {
        self.release_flash();
        true
      }
      _ => false,
    }
  }

  fn release_flash(&mut self) {
    if self.flash.take().is_some() {
      self.selected_left = None;
      self.selected_right = None;
    }
  }

  fn try_pair(&mut self, now: DateTime<Utc>) -> MatchEvent {
    let (Some(left), Some(right)) = (&self.selected_left, &self.selected_right) else {
      return MatchEvent::Selected;
    };
    let (left, right) = (left.clone(), right.clone());
    self.attempts += 1;

    if self.challenge.is_pair(&left, &right) {
      self.matches.insert(left.clone(), right.clone());
      self.points += POINTS_PER_MATCH;
      self.selected_left = None;
      self.selected_right = None;

      if self.is_complete() {
        tracing::debug!("Matching board complete after {} attempts", self.attempts);
        MatchEvent::Completed
      } else {
        MatchEvent::Matched { left, right }
      }
    } else {
      self.flash = Some(Flash {
        left: left.clone(),
        right: right.clone(),
        until: now + Duration::milliseconds(FLASH_DURATION_MS),
      });
      MatchEvent::Mismatched { left, right }
    }
  }

  pub fn is_complete(&self) -> bool {
    self.matches.len() == self.challenge.left_items.len()
  }

  pub fn is_left_matched(&self, item: &str) -> bool {
    self.matches.contains_key(item)
  }

  pub fn is_right_matched(&self, item: &str) -> bool {
    self.matches.values().any(|r| r == item)
  }

  /// Items currently highlighted as a wrong pair
  pub fn flashing(&self) -> Option<(&str, &str)> {
    self.flash.as_ref().map(|f| (f.left.as_str(), f.right.as_str()))
  }

  pub fn matched_count(&self) -> usize {
    self.matches.len()
  }

  pub fn attempts(&self) -> u32 {
    self.attempts
  }

  pub fn points(&self) -> u32 {
    self.points
  }

  pub fn reset(&mut self) {
    self.matches.clear();
    self.selected_left = None;
    self.selected_right = None;
    self.flash = None;
    self.attempts = 0;
    self.points = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn board() -> MatchingBoard {
    let mut pairs = BTreeMap::new();
    pairs.insert("dog".to_string(), "chien".to_string());
    pairs.insert("cat".to_string(), "chat".to_string());
    MatchingBoard::new(MatchingChallenge {
      prompt: "Translate".to_string(),
      left_items: vec!["dog".to_string(), "cat".to_string()],
      right_items: vec!["chat".to_string(), "chien".to_string()],
      correct_pairs: pairs,
    })
  }

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
  }

  #[test]
  fn test_correct_pair_locks_both_items() {
    let mut b = board();
    assert_eq!(b.select_left("dog", t0()), MatchEvent::Selected);
    assert_eq!(
      b.select_right("chien", t0()),
      MatchEvent::Matched { left: "dog".into(), right: "chien".into() }
    );
    assert!(b.is_left_matched("dog"));
    assert!(b.is_right_matched("chien"));
    assert_eq!(b.select_left("dog", t0()), MatchEvent::Ignored);
    assert_eq!(b.select_right("chien", t0()), MatchEvent::Ignored);
  }

  #[test]
  fn test_right_first_selection_also_pairs() {
    let mut b = board();
    b.select_right("chat", t0());
    assert_eq!(
      b.select_left("cat", t0()),
      MatchEvent::Matched { left: "cat".into(), right: "chat".into() }
    );
  }

  #[test]
  fn test_wrong_pair_flashes_then_releases() {
    let mut b = board();
    b.select_left("dog", t0());
    assert!(matches!(b.select_right("chat", t0()), MatchEvent::Mismatched { .. }));
    assert_eq!(b.flashing(), Some(("dog", "chat")));

    assert!(!b.tick(t0() + Duration::milliseconds(500)));
    assert!(b.flashing().is_some());

    assert!(b.tick(t0() + Duration::milliseconds(FLASH_DURATION_MS)));
    assert_eq!(b.flashing(), None);
    assert_eq!(b.matched_count(), 0);
  }

  #[test]
  fn test_new_selection_supersedes_flash() {
    let mut b = board();
    b.select_left("dog", t0());
    b.select_right("chat", t0());

    // Before the flash expires the user picks another left item
    let later = t0() + Duration::milliseconds(200);
    assert_eq!(b.select_left("cat", later), MatchEvent::Selected);
    assert_eq!(b.flashing(), None);
    assert_eq!(
      b.select_right("chat", later),
      MatchEvent::Matched { left: "cat".into(), right: "chat".into() }
    );
  }

  #[test]
  fn test_completes_when_all_left_items_matched() {
    let mut b = board();
    b.select_left("dog", t0());
    b.select_right("chien", t0());
    assert!(!b.is_complete());

    b.select_left("cat", t0());
    assert_eq!(b.select_right("chat", t0()), MatchEvent::Completed);
    assert!(b.is_complete());
    assert_eq!(b.matched_count(), 2);
    assert_eq!(b.points(), 2 * POINTS_PER_MATCH);
    assert_eq!(b.select_left("dog", t0()), MatchEvent::Ignored);
  }

  #[test]
  fn test_attempts_count_wrong_and_right_pairs() {
    let mut b = board();
    b.select_left("dog", t0());
    b.select_right("chat", t0());
    let later = t0() + Duration::seconds(2);
    b.select_left("dog", later);
    b.select_right("chien", later);
    assert_eq!(b.attempts(), 2);
    assert_eq!(b.points(), POINTS_PER_MATCH);
  }

  #[test]
  fn test_unknown_item_ignored() {
    let mut b = board();
    assert_eq!(b.select_left("bird", t0()), MatchEvent::Ignored);
    assert_eq!(b.select_right("oiseau", t0()), MatchEvent::Ignored);
  }

  #[test]
  fn test_reset_clears_matches() {
    let mut b = board();
    b.select_left("dog", t0());
    b.select_right("chien", t0());
    b.reset();
    assert_eq!(b.matched_count(), 0);
    assert_eq!(b.attempts(), 0);
    assert!(!b.is_left_matched("dog"));
  }
}
