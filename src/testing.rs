//! Test fixtures built on the real schema and store functions.

use rusqlite::Connection;

use crate::config::Config;
use crate::db::{self, NewLesson};
use crate::domain::{Course, Lesson};
use crate::state::AppState;

/// Application state over a fresh in-memory database
pub fn test_state() -> rusqlite::Result<AppState> {
    Ok(AppState::new(db::open_in_memory()?, Config::default()))
}

/// A course owned by a teacher account, plus one student account
pub struct SeededCourse {
    pub teacher_id: i64,
    pub student_id: i64,
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

/// Create a teacher, a student and a course with `lesson_count` lessons
pub fn seed_course(conn: &Connection, lesson_count: usize) -> rusqlite::Result<SeededCourse> {
    let teacher_id = db::create_user(conn, "Teacher", "teacher@example.com", "unused-hash")?;
    let student_id = db::create_user(conn, "Student", "student@example.com", "unused-hash")?;
    let course = db::create_course(conn, "Seeded course", "Fixture", teacher_id)?;

    let lessons = (1..=lesson_count)
        .map(|i| {
            db::create_lesson(
                conn,
                course.id,
                &NewLesson {
                    title: format!("Lesson {}", i),
                    ..Default::default()
                },
            )
        })
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(SeededCourse {
        teacher_id,
        student_id,
        course,
        lessons,
    })
}
