use serde::Serialize;

/// A course owned by the user who created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub created_by: i64,
}

/// A lesson within a course. `order` is unique per course and starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: i64,
  pub course_id: i64,
  pub title: String,
  pub description: Option<String>,
  pub content: Option<String>,
  pub order: i64,
  pub is_locked: bool,
  pub xp_reward: i64,
}

impl Lesson {
  /// Only the first lesson of a course starts unlocked
  pub fn starts_locked(order: i64) -> bool {
    order > 1
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_first_lesson_starts_unlocked() {
    assert!(!Lesson::starts_locked(1));
    assert!(Lesson::starts_locked(2));
    assert!(Lesson::starts_locked(10));
  }

  #[test]
  fn test_lesson_serializes_camel_case() {
    let lesson = Lesson {
      id: 3,
      course_id: 1,
      title: "Intro".to_string(),
      description: None,
      content: Some("Welcome".to_string()),
      order: 1,
      is_locked: false,
      xp_reward: 10,
    };
    let json = serde_json::to_value(&lesson).unwrap();
    assert_eq!(json["courseId"], 1);
    assert_eq!(json["order"], 1);
    assert_eq!(json["isLocked"], false);
    assert_eq!(json["xpReward"], 10);
  }
}
