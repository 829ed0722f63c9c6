pub mod courses;
pub mod current;
pub mod enrollment;
pub mod game_modules;
pub mod health;
pub mod lessons;
pub mod play;
pub mod progress;

use serde::Deserialize;

use crate::config::MAX_XP_REWARD;
use crate::error::{ApiError, ApiResult};

/// An id as clients send it: a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdParam {
  Number(i64),
  Text(String),
}

impl IdParam {
  pub fn parse(&self) -> Option<i64> {
    match self {
      IdParam::Number(n) => Some(*n),
      IdParam::Text(s) => s.trim().parse().ok(),
    }
  }
}

/// Resolve a required id field, rejecting missing or non-numeric values with 400
pub(crate) fn require_id(raw: Option<&IdParam>, field: &str) -> ApiResult<i64> {
  match raw {
    None => Err(ApiError::validation(format!("{} is required", field))),
    Some(value) => value
      .parse()
      .ok_or_else(|| ApiError::validation(format!("{} must be a number", field))),
  }
}

/// Query-string variant of [`require_id`]
pub(crate) fn require_query_id(raw: Option<String>, field: &str) -> ApiResult<i64> {
  require_id(raw.map(IdParam::Text).as_ref(), field)
}

/// Trimmed, non-empty text field
pub(crate) fn non_empty(raw: Option<&str>) -> Option<&str> {
  raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Optional `xpReward` must lie in `0..=MAX_XP_REWARD`
pub(crate) fn check_xp_reward(xp_reward: Option<i64>) -> ApiResult<()> {
  match xp_reward {
    Some(xp) if xp < 0 => Err(ApiError::validation("xpReward cannot be negative")),
    Some(xp) if xp > MAX_XP_REWARD => Err(ApiError::validation(format!(
      "xpReward cannot exceed {}",
      MAX_XP_REWARD
    ))),
    _ => Ok(()),
  }
}

pub use courses::{create_course, list_courses};
pub use current::{course_id_for_lesson, get_current_course, set_current_course};
pub use enrollment::{enroll, list_enrollments};
pub use game_modules::{create_game_module, list_game_modules};
pub use health::health;
pub use lessons::{create_lesson, list_lessons};
pub use play::check_answer;
pub use progress::{complete_lesson, progress};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_id_param_accepts_numbers_and_numeric_strings() {
    let n: IdParam = serde_json::from_str("7").unwrap();
    let s: IdParam = serde_json::from_str("\" 12 \"").unwrap();
    assert_eq!(require_id(Some(&n), "courseId").unwrap(), 7);
    assert_eq!(require_id(Some(&s), "courseId").unwrap(), 12);
  }

  #[test]
  fn test_id_param_rejections() {
    let bad: IdParam = serde_json::from_str("\"abc\"").unwrap();
    assert_eq!(
      require_id(Some(&bad), "lessonId").unwrap_err().to_string(),
      "lessonId must be a number"
    );
    assert_eq!(
      require_id(None, "lessonId").unwrap_err().to_string(),
      "lessonId is required"
    );
  }

  #[test]
  fn test_xp_reward_bounds() {
    assert!(check_xp_reward(None).is_ok());
    assert!(check_xp_reward(Some(0)).is_ok());
    assert!(check_xp_reward(Some(MAX_XP_REWARD)).is_ok());
    assert_eq!(
      check_xp_reward(Some(-1)).unwrap_err().to_string(),
      "xpReward cannot be negative"
    );
    assert!(matches!(
      check_xp_reward(Some(i64::MAX)),
      Err(ApiError::Validation(_))
    ));
  }

  #[test]
  fn test_non_empty() {
    assert_eq!(non_empty(Some("  Rust ")), Some("Rust"));
    assert_eq!(non_empty(Some("   ")), None);
    assert_eq!(non_empty(None), None);
  }
}
