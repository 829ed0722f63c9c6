//! Enrollments, lesson progress and the lesson-completion workflow.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use super::courses::{count_lessons, first_lesson, get_course, get_lesson, next_lesson, unlock_lesson};
use super::{parse_db_time, required_db_time, to_db_time};
use crate::domain::{
  next_streak, CompletionOutcome, CourseProgress, CurrentLesson, Enrollment, LessonProgress,
  ProgressCounts,
};

const ENROLLMENT_COLUMNS: &str = "id, user_id, course_id, current_lesson_id, total_xp, streak_days, \
   last_activity_at, completed_at, enrolled_at";

fn row_to_enrollment(row: &Row) -> Result<Enrollment> {
  let last_activity: Option<String> = row.get(6)?;
  let completed: Option<String> = row.get(7)?;
  Ok(Enrollment {
    id: row.get(0)?,
    user_id: row.get(1)?,
    course_id: row.get(2)?,
    current_lesson_id: row.get(3)?,
    total_xp: row.get(4)?,
    streak_days: row.get(5)?,
    last_activity_at: last_activity.as_deref().and_then(parse_db_time),
    completed_at: completed.as_deref().and_then(parse_db_time),
    enrolled_at: required_db_time(8, row.get(8)?)?,
  })
}

/// Enroll a user, pointing them at the first lesson of the course.
///
/// Returns `None` if the user is already enrolled; the existing record is untouched.
pub fn enroll(conn: &Connection, user_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
  let current_lesson_id = first_lesson(conn, course_id)?.map(|l| l.id);

  let inserted = conn.execute(
    r#"INSERT INTO enrollments (user_id, course_id, current_lesson_id, enrolled_at)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT(user_id, course_id) DO NOTHING"#,
    params![user_id, course_id, current_lesson_id, to_db_time(Utc::now())],
  )?;
  if inserted == 0 {
    return Ok(None);
  }

  tracing::info!("User {} enrolled in course {}", user_id, course_id);
  get_enrollment(conn, user_id, course_id)
}

pub fn get_enrollment(conn: &Connection, user_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM enrollments WHERE user_id = ?1 AND course_id = ?2",
        ENROLLMENT_COLUMNS
      ),
      params![user_id, course_id],
      row_to_enrollment,
    )
    .optional()
}

pub fn is_enrolled(conn: &Connection, user_id: i64, course_id: i64) -> Result<bool> {
  Ok(get_enrollment(conn, user_id, course_id)?.is_some())
}

/// An enrollment together with the title of its course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
  #[serde(flatten)]
  pub enrollment: Enrollment,
  pub course_title: String,
}

/// All enrollments of a user, oldest first
pub fn list_enrollments(conn: &Connection, user_id: i64) -> Result<Vec<EnrolledCourse>> {
  let mut stmt = conn.prepare(
    r#"SELECT e.id, e.user_id, e.course_id, e.current_lesson_id, e.total_xp, e.streak_days,
              e.last_activity_at, e.completed_at, e.enrolled_at, c.title
       FROM enrollments e
       JOIN courses c ON c.id = e.course_id
       WHERE e.user_id = ?1
       ORDER BY e.enrolled_at, e.id"#,
  )?;
  let rows = stmt
    .query_map(params![user_id], |row| {
      Ok(EnrolledCourse {
        enrollment: row_to_enrollment(row)?,
        course_title: row.get(9)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(rows)
}

// ==================== Lesson progress ====================

/// Insert or overwrite the completion record for (enrollment, lesson)
pub fn upsert_lesson_progress(
  conn: &Connection,
  enrollment_id: i64,
  lesson_id: i64,
  xp_earned: i64,
  completed_at: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    r#"INSERT INTO lesson_progress (enrollment_id, lesson_id, completed_at, xp_earned)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT(enrollment_id, lesson_id) DO UPDATE SET
         completed_at = excluded.completed_at,
         xp_earned = excluded.xp_earned"#,
    params![enrollment_id, lesson_id, to_db_time(completed_at), xp_earned],
  )?;
  Ok(())
}

pub fn get_lesson_progress(conn: &Connection, enrollment_id: i64) -> Result<Vec<LessonProgress>> {
  let mut stmt = conn.prepare(
    r#"SELECT enrollment_id, lesson_id, completed_at, xp_earned
       FROM lesson_progress WHERE enrollment_id = ?1
       ORDER BY completed_at"#,
  )?;
  let rows = stmt
    .query_map(params![enrollment_id], |row| {
      Ok(LessonProgress {
        enrollment_id: row.get(0)?,
        lesson_id: row.get(1)?,
        completed_at: required_db_time(2, row.get(2)?)?,
        xp_earned: row.get(3)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(rows)
}

fn count_completed_lessons(conn: &Connection, enrollment_id: i64) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM lesson_progress WHERE enrollment_id = ?1",
    params![enrollment_id],
    |row| row.get(0),
  )
}

// ==================== Completion workflow ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonCompletion {
  Recorded(CompletionOutcome),
  LessonNotFound,
  NotEnrolled,
}

/// Record that `user_id` finished `lesson_id` at `now`.
///
/// Progress, XP and streak are written together; advancing to the next lesson
/// (or closing out the course) is a second write.
pub fn complete_lesson(
  conn: &Connection,
  user_id: i64,
  lesson_id: i64,
  now: DateTime<Utc>,
) -> Result<LessonCompletion> {
  let Some(lesson) = get_lesson(conn, lesson_id)? else {
    return Ok(LessonCompletion::LessonNotFound);
  };
  let Some(enrollment) = get_enrollment(conn, user_id, lesson.course_id)? else {
    return Ok(LessonCompletion::NotEnrolled);
  };

  let streak_days = next_streak(enrollment.last_activity_at, enrollment.streak_days, now);
  // Computed here so the stored column never leaves the INTEGER range
  let total_xp = enrollment.total_xp.saturating_add(lesson.xp_reward);

  let tx = conn.unchecked_transaction()?;
  upsert_lesson_progress(&tx, enrollment.id, lesson.id, lesson.xp_reward, now)?;
  tx.execute(
    r#"UPDATE enrollments
       SET total_xp = ?1, streak_days = ?2, last_activity_at = ?3
       WHERE id = ?4"#,
    params![total_xp, streak_days, to_db_time(now), enrollment.id],
  )?;
  tx.commit()?;

  let next = next_lesson(conn, lesson.course_id, lesson.order)?;

  let tx = conn.unchecked_transaction()?;
  match &next {
    Some(next) => {
      unlock_lesson(&tx, next.id)?;
      tx.execute(
        "UPDATE enrollments SET current_lesson_id = ?1 WHERE id = ?2",
        params![next.id, enrollment.id],
      )?;
    }
    None => {
      tx.execute(
        "UPDATE enrollments SET completed_at = ?1, current_lesson_id = NULL WHERE id = ?2",
        params![to_db_time(now), enrollment.id],
      )?;
      tracing::info!("User {} completed course {}", user_id, lesson.course_id);
    }
  }
  tx.commit()?;

  tracing::debug!(
    "User {} completed lesson {} (+{} XP, streak {})",
    user_id,
    lesson.id,
    lesson.xp_reward,
    streak_days
  );

  Ok(LessonCompletion::Recorded(CompletionOutcome {
    lesson_id: lesson.id,
    xp_earned: lesson.xp_reward,
    total_xp,
    streak_days,
    next_lesson_id: next.as_ref().map(|l| l.id),
    course_completed: next.is_none(),
  }))
}

// ==================== Progress query ====================

/// Progress summary for one enrollment, `None` if the user is not enrolled
pub fn get_progress(conn: &Connection, user_id: i64, course_id: i64) -> Result<Option<CourseProgress>> {
  let Some(enrollment) = get_enrollment(conn, user_id, course_id)? else {
    return Ok(None);
  };
  let Some(course) = get_course(conn, course_id)? else {
    return Ok(None);
  };

  let current_lesson = match enrollment.current_lesson_id {
    Some(id) => get_lesson(conn, id)?.map(|l| CurrentLesson {
      id: l.id,
      title: l.title,
      order: l.order,
    }),
    None => None,
  };

  let completed = count_completed_lessons(conn, enrollment.id)?;
  let total = count_lessons(conn, course_id)?;

  Ok(Some(CourseProgress {
    course_title: course.title,
    current_lesson,
    progress: ProgressCounts::new(completed, total),
    total_xp: enrollment.total_xp,
    streak_days: enrollment.streak_days,
    last_activity: enrollment.last_activity_at,
    is_completed: enrollment.is_completed(),
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::courses::{create_course, create_lesson, NewLesson};
  use crate::db::schema::run_migrations;
  use crate::db::users::create_user;
  use crate::domain::Lesson;
  use chrono::{Duration, TimeZone};

  struct Fixture {
    conn: Connection,
    student: i64,
    course_id: i64,
    lessons: Vec<Lesson>,
  }

  fn setup(lesson_count: usize) -> Fixture {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    let teacher = create_user(&conn, "Teacher", "t@example.com", "hash").unwrap();
    let student = create_user(&conn, "Student", "s@example.com", "hash").unwrap();
    let course = create_course(&conn, "Chemistry", "Atoms", teacher).unwrap();
    let lessons = (1..=lesson_count)
      .map(|i| {
        create_lesson(
          &conn,
          course.id,
          &NewLesson {
            title: format!("Lesson {}", i),
            xp_reward: Some(10 * i as i64),
            ..Default::default()
          },
        )
        .unwrap()
      })
      .collect();
    Fixture {
      conn,
      student,
      course_id: course.id,
      lessons,
    }
  }

  fn day(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, d, h, 0, 0).unwrap()
  }

  fn recorded(result: LessonCompletion) -> CompletionOutcome {
    match result {
      LessonCompletion::Recorded(outcome) => outcome,
      other => panic!("expected a recorded completion, got {:?}", other),
    }
  }

  #[test]
  fn test_enroll_points_at_first_lesson() {
    let f = setup(3);
    let enrollment = enroll(&f.conn, f.student, f.course_id).unwrap().unwrap();
    assert_eq!(enrollment.current_lesson_id, Some(f.lessons[0].id));
    assert_eq!(enrollment.total_xp, 0);
    assert_eq!(enrollment.streak_days, 0);
    assert_eq!(enrollment.last_activity_at, None);
    assert!(!enrollment.is_completed());
  }

  #[test]
  fn test_enroll_twice_is_rejected() {
    let f = setup(1);
    assert!(enroll(&f.conn, f.student, f.course_id).unwrap().is_some());
    assert!(enroll(&f.conn, f.student, f.course_id).unwrap().is_none());
    assert_eq!(list_enrollments(&f.conn, f.student).unwrap().len(), 1);
  }

  #[test]
  fn test_enroll_in_empty_course() {
    let f = setup(0);
    let enrollment = enroll(&f.conn, f.student, f.course_id).unwrap().unwrap();
    assert_eq!(enrollment.current_lesson_id, None);
  }

  #[test]
  fn test_list_enrollments_includes_course_title() {
    let f = setup(1);
    enroll(&f.conn, f.student, f.course_id).unwrap();
    let listed = list_enrollments(&f.conn, f.student).unwrap();
    assert_eq!(listed[0].course_title, "Chemistry");
    assert!(is_enrolled(&f.conn, f.student, f.course_id).unwrap());
  }

  #[test]
  fn test_three_lesson_walkthrough() {
    let f = setup(3);
    enroll(&f.conn, f.student, f.course_id).unwrap();

    let first = recorded(complete_lesson(&f.conn, f.student, f.lessons[0].id, day(1, 9)).unwrap());
    assert_eq!(first.next_lesson_id, Some(f.lessons[1].id));
    assert!(!first.course_completed);
    assert!(!get_lesson(&f.conn, f.lessons[1].id).unwrap().unwrap().is_locked);
    assert!(get_lesson(&f.conn, f.lessons[2].id).unwrap().unwrap().is_locked);

    let enrollment = get_enrollment(&f.conn, f.student, f.course_id).unwrap().unwrap();
    assert_eq!(enrollment.current_lesson_id, Some(f.lessons[1].id));
    assert_eq!(enrollment.total_xp, 10);
    assert_eq!(enrollment.streak_days, 1);

    recorded(complete_lesson(&f.conn, f.student, f.lessons[1].id, day(1, 10)).unwrap());
    let last = recorded(complete_lesson(&f.conn, f.student, f.lessons[2].id, day(2, 8)).unwrap());
    assert!(last.course_completed);
    assert_eq!(last.next_lesson_id, None);
    assert_eq!(last.total_xp, 60);
    assert_eq!(last.streak_days, 2);

    let enrollment = get_enrollment(&f.conn, f.student, f.course_id).unwrap().unwrap();
    assert_eq!(enrollment.current_lesson_id, None);
    assert_eq!(enrollment.completed_at, Some(day(2, 8)));
  }

  #[test]
  fn test_recompletion_overwrites_progress() {
    let f = setup(2);
    let enrollment = enroll(&f.conn, f.student, f.course_id).unwrap().unwrap();
    let lesson = f.lessons[0].id;

    complete_lesson(&f.conn, f.student, lesson, day(3, 9)).unwrap();
    complete_lesson(&f.conn, f.student, lesson, day(3, 12)).unwrap();

    let progress = get_lesson_progress(&f.conn, enrollment.id).unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].completed_at, day(3, 12));
    assert_eq!(progress[0].xp_earned, 10);
  }

  #[test]
  fn test_total_xp_saturates() {
    let f = setup(1);
    let lesson = create_lesson(
      &f.conn,
      f.course_id,
      &NewLesson {
        title: "Jackpot".to_string(),
        xp_reward: Some(i64::MAX),
        ..Default::default()
      },
    )
    .unwrap();
    enroll(&f.conn, f.student, f.course_id).unwrap();

    recorded(complete_lesson(&f.conn, f.student, lesson.id, day(6, 9)).unwrap());
    let again = recorded(complete_lesson(&f.conn, f.student, lesson.id, day(6, 10)).unwrap());
    assert_eq!(again.total_xp, i64::MAX);

    let progress = get_progress(&f.conn, f.student, f.course_id).unwrap().unwrap();
    assert_eq!(progress.total_xp, i64::MAX);
  }

  #[test]
  fn test_recompleting_finished_course_moves_pointer_back() {
    let f = setup(2);
    enroll(&f.conn, f.student, f.course_id).unwrap();
    complete_lesson(&f.conn, f.student, f.lessons[0].id, day(7, 9)).unwrap();
    complete_lesson(&f.conn, f.student, f.lessons[1].id, day(7, 10)).unwrap();

    let outcome = recorded(complete_lesson(&f.conn, f.student, f.lessons[0].id, day(7, 11)).unwrap());
    assert_eq!(outcome.next_lesson_id, Some(f.lessons[1].id));
    assert!(!outcome.course_completed);

    // The pointer follows the replayed lesson; the course stays finished
    let enrollment = get_enrollment(&f.conn, f.student, f.course_id).unwrap().unwrap();
    assert_eq!(enrollment.current_lesson_id, Some(f.lessons[1].id));
    assert_eq!(enrollment.completed_at, Some(day(7, 10)));
    assert!(enrollment.is_completed());
    assert!(get_progress(&f.conn, f.student, f.course_id).unwrap().unwrap().is_completed);
  }

  #[test]
  fn test_streak_resets_after_gap() {
    let f = setup(3);
    enroll(&f.conn, f.student, f.course_id).unwrap();
    complete_lesson(&f.conn, f.student, f.lessons[0].id, day(4, 9)).unwrap();
    let outcome = recorded(
      complete_lesson(&f.conn, f.student, f.lessons[1].id, day(4, 9) + Duration::days(3)).unwrap(),
    );
    assert_eq!(outcome.streak_days, 1);
  }

  #[test]
  fn test_completion_failures() {
    let f = setup(1);
    assert_eq!(
      complete_lesson(&f.conn, f.student, 999, day(1, 9)).unwrap(),
      LessonCompletion::LessonNotFound
    );
    assert_eq!(
      complete_lesson(&f.conn, f.student, f.lessons[0].id, day(1, 9)).unwrap(),
      LessonCompletion::NotEnrolled
    );
  }

  #[test]
  fn test_progress_summary() {
    let f = setup(3);
    enroll(&f.conn, f.student, f.course_id).unwrap();
    complete_lesson(&f.conn, f.student, f.lessons[0].id, day(5, 9)).unwrap();

    let progress = get_progress(&f.conn, f.student, f.course_id).unwrap().unwrap();
    assert_eq!(progress.course_title, "Chemistry");
    assert_eq!(
      progress.current_lesson,
      Some(CurrentLesson {
        id: f.lessons[1].id,
        title: "Lesson 2".to_string(),
        order: 2,
      })
    );
    assert_eq!(progress.progress, ProgressCounts::new(1, 3));
    assert_eq!(progress.progress.percentage, 33);
    assert_eq!(progress.total_xp, 10);
    assert_eq!(progress.last_activity, Some(day(5, 9)));
    assert!(!progress.is_completed);
  }

  #[test]
  fn test_progress_requires_enrollment() {
    let f = setup(1);
    assert_eq!(get_progress(&f.conn, f.student, f.course_id).unwrap(), None);
  }
}
