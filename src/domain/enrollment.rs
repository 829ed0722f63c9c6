use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A user's progress record within one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
  pub id: i64,
  pub user_id: i64,
  pub course_id: i64,
  /// `None` once the course is finished (or if it had no lessons at enrollment)
  pub current_lesson_id: Option<i64>,
  pub total_xp: i64,
  pub streak_days: i64,
  pub last_activity_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
  pub fn is_completed(&self) -> bool {
    self.completed_at.is_some()
  }
}

/// Completion record for one lesson of an enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
  pub enrollment_id: i64,
  pub lesson_id: i64,
  pub completed_at: DateTime<Utc>,
  pub xp_earned: i64,
}

/// Streak after a completion at `now`.
///
/// Calendar days are compared in UTC: activity yesterday extends the streak,
/// activity earlier today keeps it, anything older (or no activity) restarts at 1.
pub fn next_streak(last_activity: Option<DateTime<Utc>>, current: i64, now: DateTime<Utc>) -> i64 {
  let Some(last) = last_activity else {
    return 1;
  };

  let today = now.date_naive();
  let last_day = last.date_naive();

  if last_day == today {
    current
  } else if last_day + Duration::days(1) == today {
    current + 1
  } else {
    1
  }
}

/// Result of completing one lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
  pub lesson_id: i64,
  pub xp_earned: i64,
  pub total_xp: i64,
  pub streak_days: i64,
  /// `None` when the completed lesson was the last one
  pub next_lesson_id: Option<i64>,
  pub course_completed: bool,
}

// ==================== Progress query ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLesson {
  pub id: i64,
  pub title: String,
  pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressCounts {
  pub completed: i64,
  pub total: i64,
  pub percentage: i64,
}

impl ProgressCounts {
  pub fn new(completed: i64, total: i64) -> Self {
    Self {
      completed,
      total,
      percentage: Self::calculate_percentage(completed, total),
    }
  }

  /// Rounded to the nearest integer; 0 for an empty course
  pub fn calculate_percentage(completed: i64, total: i64) -> i64 {
    if total > 0 {
      ((completed as f64 / total as f64) * 100.0).round() as i64
    } else {
      0
    }
  }
}

/// Read model returned by the progress endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
  pub course_title: String,
  pub current_lesson: Option<CurrentLesson>,
  pub progress: ProgressCounts,
  pub total_xp: i64,
  pub streak_days: i64,
  pub last_activity: Option<DateTime<Utc>>,
  pub is_completed: bool,
}
