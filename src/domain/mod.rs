pub mod course;
pub mod enrollment;
pub mod game;

pub use course::{Course, Lesson};
pub use enrollment::{
  next_streak, CompletionOutcome, CourseProgress, CurrentLesson, Enrollment, LessonProgress,
  ProgressCounts,
};
pub use game::{GameKind, GameModule, GamePayload, MatchingChallenge, McqChallenge, RearrangeChallenge};
