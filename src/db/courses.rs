//! Course and lesson registry.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::config;
use crate::domain::{Course, Lesson};

const LESSON_COLUMNS: &str =
  "id, course_id, title, description, content, position, is_locked, xp_reward";

fn row_to_lesson(row: &Row) -> Result<Lesson> {
  Ok(Lesson {
    id: row.get(0)?,
    course_id: row.get(1)?,
    title: row.get(2)?,
    description: row.get(3)?,
    content: row.get(4)?,
    order: row.get(5)?,
    is_locked: row.get(6)?,
    xp_reward: row.get(7)?,
  })
}

fn row_to_course(row: &Row) -> Result<Course> {
  Ok(Course {
    id: row.get(0)?,
    title: row.get(1)?,
    description: row.get(2)?,
    created_by: row.get(3)?,
  })
}

// ==================== Courses ====================

pub fn create_course(conn: &Connection, title: &str, description: &str, created_by: i64) -> Result<Course> {
  let now = Utc::now().to_rfc3339();
  conn.execute(
    "INSERT INTO courses (title, description, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
    params![title, description, created_by, now],
  )?;
  Ok(Course {
    id: conn.last_insert_rowid(),
    title: title.to_string(),
    description: description.to_string(),
    created_by,
  })
}

pub fn list_courses(conn: &Connection) -> Result<Vec<Course>> {
  let mut stmt = conn.prepare("SELECT id, title, description, created_by FROM courses ORDER BY id")?;
  let courses = stmt
    .query_map([], row_to_course)?
    .collect::<Result<Vec<_>>>()?;
  Ok(courses)
}

pub fn get_course(conn: &Connection, course_id: i64) -> Result<Option<Course>> {
  conn
    .query_row(
      "SELECT id, title, description, created_by FROM courses WHERE id = ?1",
      params![course_id],
      row_to_course,
    )
    .optional()
}

// ==================== Lessons ====================

/// Author-supplied fields for a new lesson; the order is always assigned
#[derive(Debug, Clone, Default)]
pub struct NewLesson {
  pub title: String,
  pub description: Option<String>,
  pub content: Option<String>,
  pub xp_reward: Option<i64>,
}

/// Append a lesson to a course with order = max existing order + 1.
pub fn create_lesson(conn: &Connection, course_id: i64, lesson: &NewLesson) -> Result<Lesson> {
  let tx = conn.unchecked_transaction()?;

  let max_order: i64 = tx.query_row(
    "SELECT COALESCE(MAX(position), 0) FROM lessons WHERE course_id = ?1",
    params![course_id],
    |row| row.get(0),
  )?;
  let order = max_order + 1;
  let is_locked = Lesson::starts_locked(order);
  let xp_reward = lesson.xp_reward.unwrap_or(config::DEFAULT_LESSON_XP);

  tx.execute(
    r#"INSERT INTO lessons (course_id, title, description, content, position, is_locked, xp_reward, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
    params![
      course_id,
      lesson.title,
      lesson.description,
      lesson.content,
      order,
      is_locked,
      xp_reward,
      Utc::now().to_rfc3339()
    ],
  )?;
  let id = tx.last_insert_rowid();
  tx.commit()?;

  tracing::debug!("Created lesson {} at order {} in course {}", id, order, course_id);

  Ok(Lesson {
    id,
    course_id,
    title: lesson.title.clone(),
    description: lesson.description.clone(),
    content: lesson.content.clone(),
    order,
    is_locked,
    xp_reward,
  })
}

/// Lessons of a course in `order`
pub fn list_lessons(conn: &Connection, course_id: i64) -> Result<Vec<Lesson>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM lessons WHERE course_id = ?1 ORDER BY position",
    LESSON_COLUMNS
  ))?;
  let lessons = stmt
    .query_map(params![course_id], row_to_lesson)?
    .collect::<Result<Vec<_>>>()?;
  Ok(lessons)
}

pub fn get_lesson(conn: &Connection, lesson_id: i64) -> Result<Option<Lesson>> {
  conn
    .query_row(
      &format!("SELECT {} FROM lessons WHERE id = ?1", LESSON_COLUMNS),
      params![lesson_id],
      row_to_lesson,
    )
    .optional()
}

pub fn count_lessons(conn: &Connection, course_id: i64) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM lessons WHERE course_id = ?1",
    params![course_id],
    |row| row.get(0),
  )
}

/// Lesson with the lowest order in a course
pub fn first_lesson(conn: &Connection, course_id: i64) -> Result<Option<Lesson>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM lessons WHERE course_id = ?1 ORDER BY position ASC LIMIT 1",
        LESSON_COLUMNS
      ),
      params![course_id],
      row_to_lesson,
    )
    .optional()
}

/// Lesson with the smallest order strictly greater than `after_order`
pub fn next_lesson(conn: &Connection, course_id: i64, after_order: i64) -> Result<Option<Lesson>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM lessons WHERE course_id = ?1 AND position > ?2 ORDER BY position ASC LIMIT 1",
        LESSON_COLUMNS
      ),
      params![course_id, after_order],
      row_to_lesson,
    )
    .optional()
}

/// Unlocking is one-way; there is no corresponding lock operation
pub fn unlock_lesson(conn: &Connection, lesson_id: i64) -> Result<()> {
  conn.execute(
    "UPDATE lessons SET is_locked = 0 WHERE id = ?1",
    params![lesson_id],
  )?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::schema::run_migrations;
  use crate::db::users::create_user;

  fn setup() -> (Connection, Course) {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    let teacher = create_user(&conn, "Teacher", "t@example.com", "hash").unwrap();
    let course = create_course(&conn, "Rust 101", "Ownership and friends", teacher).unwrap();
    (conn, course)
  }

  fn lesson(title: &str) -> NewLesson {
    NewLesson {
      title: title.to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn test_course_round_trip() {
    let (conn, course) = setup();
    assert_eq!(get_course(&conn, course.id).unwrap(), Some(course.clone()));
    assert_eq!(list_courses(&conn).unwrap(), vec![course]);
    assert_eq!(get_course(&conn, 999).unwrap(), None);
  }

  #[test]
  fn test_lessons_get_increasing_orders() {
    let (conn, course) = setup();
    let l1 = create_lesson(&conn, course.id, &lesson("Borrowing")).unwrap();
    let l2 = create_lesson(&conn, course.id, &lesson("Lifetimes")).unwrap();
    let l3 = create_lesson(&conn, course.id, &lesson("Traits")).unwrap();

    assert_eq!((l1.order, l2.order, l3.order), (1, 2, 3));
    assert!(!l1.is_locked);
    assert!(l2.is_locked && l3.is_locked);
    assert_eq!(l1.xp_reward, config::DEFAULT_LESSON_XP);

    let listed: Vec<i64> = list_lessons(&conn, course.id).unwrap().iter().map(|l| l.id).collect();
    assert_eq!(listed, vec![l1.id, l2.id, l3.id]);
    assert_eq!(count_lessons(&conn, course.id).unwrap(), 3);
  }

  #[test]
  fn test_orders_are_per_course() {
    let (conn, course) = setup();
    let other = create_course(&conn, "Go 101", "Goroutines", course.created_by).unwrap();
    create_lesson(&conn, course.id, &lesson("A")).unwrap();
    create_lesson(&conn, course.id, &lesson("B")).unwrap();
    let first_other = create_lesson(&conn, other.id, &lesson("X")).unwrap();
    assert_eq!(first_other.order, 1);
    assert!(!first_other.is_locked);
  }

  #[test]
  fn test_next_lesson_lookup() {
    let (conn, course) = setup();
    let l1 = create_lesson(&conn, course.id, &lesson("One")).unwrap();
    let l2 = create_lesson(&conn, course.id, &lesson("Two")).unwrap();
    let l3 = create_lesson(&conn, course.id, &lesson("Three")).unwrap();

    assert_eq!(first_lesson(&conn, course.id).unwrap().map(|l| l.id), Some(l1.id));
    assert_eq!(next_lesson(&conn, course.id, l1.order).unwrap().map(|l| l.id), Some(l2.id));
    assert_eq!(next_lesson(&conn, course.id, l2.order).unwrap().map(|l| l.id), Some(l3.id));
    assert_eq!(next_lesson(&conn, course.id, l3.order).unwrap(), None);
  }

  #[test]
  fn test_next_lesson_skips_gaps() {
    let (conn, course) = setup();
    create_lesson(&conn, course.id, &lesson("One")).unwrap();
    let l2 = create_lesson(&conn, course.id, &lesson("Two")).unwrap();
    let l3 = create_lesson(&conn, course.id, &lesson("Three")).unwrap();
    conn.execute("DELETE FROM lessons WHERE id = ?1", params![l2.id]).unwrap();

    assert_eq!(next_lesson(&conn, course.id, 1).unwrap().map(|l| l.id), Some(l3.id));
  }

  #[test]
  fn test_unlock_lesson() {
    let (conn, course) = setup();
    create_lesson(&conn, course.id, &lesson("One")).unwrap();
    let l2 = create_lesson(&conn, course.id, &lesson("Two")).unwrap();
    unlock_lesson(&conn, l2.id).unwrap();
    assert!(!get_lesson(&conn, l2.id).unwrap().unwrap().is_locked);
  }
}
