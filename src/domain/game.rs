//! Game modules: the interactive exercises attached to a lesson.
//!
//! Each module carries exactly one typed payload. The wire format keeps the
//! three payload slots (`mcq`, `rearrangeChallenge`, `matching`) with only the
//! one matching `type` populated.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

/// Which kind of exercise a module is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
  #[serde(rename = "MCQ")]
  Mcq,
  #[serde(rename = "REARRANGE")]
  Rearrange,
  #[serde(rename = "MATCHING")]
  Matching,
}

impl GameKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Mcq => "MCQ",
      Self::Rearrange => "REARRANGE",
      Self::Matching => "MATCHING",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "MCQ" => Some(Self::Mcq),
      "REARRANGE" => Some(Self::Rearrange),
      "MATCHING" => Some(Self::Matching),
      _ => None,
    }
  }
}

// ============================================================================
// Payloads
// ============================================================================

/// Multiple-choice question; `correct` indexes into `options`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqChallenge {
  pub question: String,
  pub options: Vec<String>,
  pub correct: usize,
}

impl McqChallenge {
  pub fn validate(&self) -> Result<(), String> {
    if self.question.trim().is_empty() {
      return Err("Question is required".to_string());
    }
    if self.options.len() < 2 {
      return Err("Options must contain at least two entries".to_string());
    }
    if self.correct >= self.options.len() {
      return Err("Correct must be a valid index within the options array".to_string());
    }
    Ok(())
  }

  pub fn is_correct(&self, selected: usize) -> bool {
    selected == self.correct
  }
}

/// Put `items` into `correct_order`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RearrangeChallenge {
  pub prompt: String,
  pub items: Vec<String>,
  pub correct_order: Vec<String>,
}

impl RearrangeChallenge {
  pub fn validate(&self) -> Result<(), String> {
    if self.prompt.trim().is_empty() {
      return Err("Prompt is required".to_string());
    }
    if self.items.len() != self.correct_order.len() {
      return Err("Items and correctOrder must have the same length".to_string());
    }
    Ok(())
  }

  /// Order-sensitive, element-wise comparison
  pub fn is_correct(&self, ordering: &[String]) -> bool {
    ordering == self.correct_order.as_slice()
  }
}

/// Pair every left item with its right item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingChallenge {
  pub prompt: String,
  pub left_items: Vec<String>,
  pub right_items: Vec<String>,
  pub correct_pairs: BTreeMap<String, String>,
}

impl MatchingChallenge {
  pub fn validate(&self) -> Result<(), String> {
    if self.prompt.trim().is_empty() {
      return Err("Prompt is required".to_string());
    }

    let left: HashSet<&str> = self.left_items.iter().map(String::as_str).collect();
    let right: HashSet<&str> = self.right_items.iter().map(String::as_str).collect();
    if left.len() != self.left_items.len() {
      return Err("Left items must be unique".to_string());
    }
    if right.len() != self.right_items.len() {
      return Err("Right items must be unique".to_string());
    }

    // A matched right item is taken off the board, so no two pairs may share one
    let mut targets = HashSet::new();
    for (l, r) in &self.correct_pairs {
      if !left.contains(l.as_str()) {
        return Err(format!("Pair key '{}' is not a left item", l));
      }
      if !right.contains(r.as_str()) {
        return Err(format!("Pair value '{}' is not a right item", r));
      }
      if !targets.insert(r.as_str()) {
        return Err(format!("Right item '{}' is paired more than once", r));
      }
    }

    // Otherwise the exercise can never be completed
    if let Some(unpaired) = self
      .left_items
      .iter()
      .find(|l| !self.correct_pairs.contains_key(*l))
    {
      return Err(format!("Left item '{}' has no pair", unpaired));
    }

    Ok(())
  }

  pub fn is_pair(&self, left: &str, right: &str) -> bool {
    self.correct_pairs.get(left).is_some_and(|r| r == right)
  }
}

/// The type-specific content of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePayload {
  Mcq(McqChallenge),
  Rearrange(RearrangeChallenge),
  Matching(MatchingChallenge),
}

impl GamePayload {
  pub fn kind(&self) -> GameKind {
    match self {
      Self::Mcq(_) => GameKind::Mcq,
      Self::Rearrange(_) => GameKind::Rearrange,
      Self::Matching(_) => GameKind::Matching,
    }
  }

  /// Decode the untyped `gameData` body for `kind` and validate it.
  pub fn from_json(kind: GameKind, data: serde_json::Value) -> Result<Self, String> {
    let invalid = |e: serde_json::Error| format!("Invalid {} data: {}", kind.as_str(), e);

    let payload = match kind {
      GameKind::Mcq => Self::Mcq(serde_json::from_value(data).map_err(invalid)?),
      GameKind::Rearrange => Self::Rearrange(serde_json::from_value(data).map_err(invalid)?),
      GameKind::Matching => Self::Matching(serde_json::from_value(data).map_err(invalid)?),
    };
    payload.validate()?;
    Ok(payload)
  }

  pub fn validate(&self) -> Result<(), String> {
    match self {
      Self::Mcq(mcq) => mcq.validate(),
      Self::Rearrange(challenge) => challenge.validate(),
      Self::Matching(matching) => matching.validate(),
    }
  }
}

// ============================================================================
// Module
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameModule {
  pub id: i64,
  pub lesson_id: i64,
  pub title: String,
  pub order: i64,
  pub xp_reward: i64,
  pub payload: GamePayload,
}

impl GameModule {
  pub fn kind(&self) -> GameKind {
    self.payload.kind()
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameModuleWire<'a> {
  id: i64,
  lesson_id: i64,
  #[serde(rename = "type")]
  kind: GameKind,
  title: &'a str,
  order: i64,
  xp_reward: i64,
  mcq: Option<&'a McqChallenge>,
  rearrange_challenge: Option<&'a RearrangeChallenge>,
  matching: Option<&'a MatchingChallenge>,
}

impl Serialize for GameModule {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let (mcq, rearrange_challenge, matching) = match &self.payload {
      GamePayload::Mcq(m) => (Some(m), None, None),
      GamePayload::Rearrange(r) => (None, Some(r), None),
      GamePayload::Matching(m) => (None, None, Some(m)),
    };

    GameModuleWire {
      id: self.id,
      lesson_id: self.lesson_id,
      kind: self.kind(),
      title: &self.title,
      order: self.order,
      xp_reward: self.xp_reward,
      mcq,
      rearrange_challenge,
      matching,
    }
    .serialize(serializer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn counting_mcq() -> McqChallenge {
    McqChallenge {
      question: "1 + 2 = ?".to_string(),
      options: vec!["2".to_string(), "3".to_string(), "4".to_string()],
      correct: 1,
    }
  }

  #[test]
  fn test_game_kind_serde() {
    assert_eq!(serde_json::to_string(&GameKind::Mcq).unwrap(), "\"MCQ\"");
    let kind: GameKind = serde_json::from_str("\"REARRANGE\"").unwrap();
    assert_eq!(kind, GameKind::Rearrange);
    assert_eq!(GameKind::from_str("MATCHING"), Some(GameKind::Matching));
    assert_eq!(GameKind::from_str("mcq"), None);
  }

  #[test]
  fn test_mcq_correctness() {
    let mcq = McqChallenge {
      question: "Pick".to_string(),
      options: vec!["2".to_string(), "3".to_string(), "4".to_string()],
      correct: 2,
    };
    assert!(mcq.is_correct(2));
    assert!(!mcq.is_correct(0));
    assert!(!mcq.is_correct(1));
  }

  #[test]
  fn test_mcq_validation() {
    assert!(counting_mcq().validate().is_ok());

    let mut too_few = counting_mcq();
    too_few.options.truncate(1);
    too_few.correct = 0;
    assert!(too_few.validate().is_err());

    let mut out_of_range = counting_mcq();
    out_of_range.correct = 3;
    assert!(out_of_range.validate().unwrap_err().contains("valid index"));

    let mut blank = counting_mcq();
    blank.question = "  ".to_string();
    assert!(blank.validate().is_err());
  }

  #[test]
  fn test_rearrange_correctness_is_order_sensitive() {
    let challenge = RearrangeChallenge {
      prompt: "Sort".to_string(),
      items: vec!["c".into(), "a".into(), "b".into()],
      correct_order: vec!["a".into(), "b".into(), "c".into()],
    };
    assert!(challenge.is_correct(&strings(&["a", "b", "c"])));
    assert!(!challenge.is_correct(&strings(&["b", "a", "c"])));
    assert!(!challenge.is_correct(&strings(&["a", "b"])));
  }

  #[test]
  fn test_rearrange_length_mismatch_rejected() {
    let challenge = RearrangeChallenge {
      prompt: "Sort".to_string(),
      items: vec!["a".into(), "b".into()],
      correct_order: vec!["a".into()],
    };
    assert!(challenge.validate().is_err());
  }

  #[test]
  fn test_matching_validation() {
    let mut pairs = BTreeMap::new();
    pairs.insert("dog".to_string(), "chien".to_string());
    pairs.insert("cat".to_string(), "chat".to_string());
    let matching = MatchingChallenge {
      prompt: "Translate".to_string(),
      left_items: vec!["dog".into(), "cat".into()],
      right_items: vec!["chat".into(), "chien".into()],
      correct_pairs: pairs,
    };
    assert!(matching.validate().is_ok());
    assert!(matching.is_pair("dog", "chien"));
    assert!(!matching.is_pair("dog", "chat"));
    assert!(!matching.is_pair("bird", "chat"));

    let mut stray_value = matching.clone();
    stray_value
      .correct_pairs
      .insert("cat".to_string(), "oiseau".to_string());
    assert!(stray_value.validate().unwrap_err().contains("not a right item"));

    let mut unpaired = matching.clone();
    unpaired.left_items.push("bird".into());
    assert!(unpaired.validate().unwrap_err().contains("has no pair"));
  }

  #[test]
  fn test_matching_rejects_shared_right_item() {
    let mut pairs = BTreeMap::new();
    pairs.insert("a".to_string(), "x".to_string());
    pairs.insert("b".to_string(), "x".to_string());
    let shared = MatchingChallenge {
      prompt: "Pair them".to_string(),
      left_items: vec!["a".into(), "b".into()],
      right_items: vec!["x".into(), "y".into()],
      correct_pairs: pairs,
    };
    assert_eq!(
      shared.validate().unwrap_err(),
      "Right item 'x' is paired more than once"
    );

    let mut repeated = shared.clone();
    repeated.correct_pairs.insert("b".to_string(), "y".to_string());
    repeated.right_items.push("y".into());
    assert_eq!(repeated.validate().unwrap_err(), "Right items must be unique");
  }

  #[test]
  fn test_payload_from_json_reports_missing_fields() {
    let err = GamePayload::from_json(GameKind::Mcq, json!({ "question": "Q" })).unwrap_err();
    assert!(err.starts_with("Invalid MCQ data"));

    let err = GamePayload::from_json(
      GameKind::Rearrange,
      json!({ "prompt": "P", "items": ["a"], "correctOrder": ["a", "b"] }),
    )
    .unwrap_err();
    assert!(err.contains("same length"));

    let ok = GamePayload::from_json(
      GameKind::Mcq,
      json!({ "question": "Q", "options": ["x", "y"], "correct": 0 }),
    )
    .unwrap();
    assert_eq!(ok.kind(), GameKind::Mcq);
  }

  #[test]
  fn test_module_wire_shape() {
    let module = GameModule {
      id: 7,
      lesson_id: 2,
      title: "Counting".to_string(),
      order: 1,
      xp_reward: 10,
      payload: GamePayload::Mcq(counting_mcq()),
    };
    let json = serde_json::to_value(&module).unwrap();
    assert_eq!(json["type"], "MCQ");
    assert_eq!(json["lessonId"], 2);
    assert_eq!(json["mcq"]["correct"], 1);
    assert!(json["rearrangeChallenge"].is_null());
    assert!(json["matching"].is_null());
  }
}
