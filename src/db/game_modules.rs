//! Game module store: one `game_modules` row plus one typed payload row.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::de::DeserializeOwned;

use crate::config;
use crate::domain::{
  GameKind, GameModule, GamePayload, MatchingChallenge, McqChallenge, RearrangeChallenge,
};

/// Fields for a module about to be created
#[derive(Debug, Clone)]
pub struct NewGameModule {
  pub lesson_id: i64,
  pub title: String,
  /// `None` appends after the last module of the lesson
  pub order: Option<i64>,
  pub xp_reward: Option<i64>,
  pub payload: GamePayload,
}

const MODULE_SELECT: &str = r#"
  SELECT m.id, m.lesson_id, m.kind, m.title, m.position, m.xp_reward,
         q.question, q.options, q.correct,
         r.prompt, r.items, r.correct_order,
         p.prompt, p.left_items, p.right_items, p.correct_pairs
  FROM game_modules m
  LEFT JOIN mcq_challenges q ON q.module_id = m.id
  LEFT JOIN rearrange_challenges r ON r.module_id = m.id
  LEFT JOIN matching_challenges p ON p.module_id = m.id
"#;

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> Result<T> {
  let text: String = row.get(idx)?;
  serde_json::from_str(&text).map_err(|e| conversion_error(idx, e.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
  serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_module(row: &Row) -> Result<GameModule> {
  let kind_str: String = row.get(2)?;
  let kind = GameKind::from_str(&kind_str)
    .ok_or_else(|| conversion_error(2, format!("unknown module kind: {}", kind_str)))?;

  // A missing payload row surfaces as a NULL read error here
  let payload = match kind {
    GameKind::Mcq => GamePayload::Mcq(McqChallenge {
      question: row.get(6)?,
      options: json_column(row, 7)?,
      correct: row.get::<_, i64>(8)? as usize,
    }),
    GameKind::Rearrange => GamePayload::Rearrange(RearrangeChallenge {
      prompt: row.get(9)?,
      items: json_column(row, 10)?,
      correct_order: json_column(row, 11)?,
    }),
    GameKind::Matching => GamePayload::Matching(MatchingChallenge {
      prompt: row.get(12)?,
      left_items: json_column(row, 13)?,
      right_items: json_column(row, 14)?,
      correct_pairs: json_column(row, 15)?,
    }),
  };

  Ok(GameModule {
    id: row.get(0)?,
    lesson_id: row.get(1)?,
    title: row.get(3)?,
    order: row.get(4)?,
    xp_reward: row.get(5)?,
    payload,
  })
}

/// Insert the module and its payload as one grouped write.
pub fn create_game_module(conn: &Connection, module: &NewGameModule) -> Result<GameModule> {
  let tx = conn.unchecked_transaction()?;

  let order = match module.order {
    Some(order) => order,
    None => {
      let max_order: i64 = tx.query_row(
        "SELECT COALESCE(MAX(position), 0) FROM game_modules WHERE lesson_id = ?1",
        params![module.lesson_id],
        |row| row.get(0),
      )?;
      max_order + 1
    }
  };
  let xp_reward = module.xp_reward.unwrap_or(config::DEFAULT_MODULE_XP);

  tx.execute(
    r#"INSERT INTO game_modules (lesson_id, kind, title, position, xp_reward, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
    params![
      module.lesson_id,
      module.payload.kind().as_str(),
      module.title,
      order,
      xp_reward,
      Utc::now().to_rfc3339()
    ],
  )?;
  let id = tx.last_insert_rowid();

  match &module.payload {
    GamePayload::Mcq(mcq) => {
      tx.execute(
        "INSERT INTO mcq_challenges (module_id, question, options, correct) VALUES (?1, ?2, ?3, ?4)",
        params![id, mcq.question, to_json(&mcq.options)?, mcq.correct as i64],
      )?;
    }
    GamePayload::Rearrange(challenge) => {
      tx.execute(
        "INSERT INTO rearrange_challenges (module_id, prompt, items, correct_order) VALUES (?1, ?2, ?3, ?4)",
        params![
          id,
          challenge.prompt,
          to_json(&challenge.items)?,
          to_json(&challenge.correct_order)?
        ],
      )?;
    }
    GamePayload::Matching(matching) => {
      tx.execute(
        r#"INSERT INTO matching_challenges (module_id, prompt, left_items, right_items, correct_pairs)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
        params![
          id,
          matching.prompt,
          to_json(&matching.left_items)?,
          to_json(&matching.right_items)?,
          to_json(&matching.correct_pairs)?
        ],
      )?;
    }
  }

  tx.commit()?;
  tracing::debug!(
    "Created {} module {} in lesson {}",
    module.payload.kind().as_str(),
    id,
    module.lesson_id
  );

  Ok(GameModule {
    id,
    lesson_id: module.lesson_id,
    title: module.title.clone(),
    order,
    xp_reward,
    payload: module.payload.clone(),
  })
}

/// Modules of a lesson in play order
pub fn list_game_modules(conn: &Connection, lesson_id: i64) -> Result<Vec<GameModule>> {
  let mut stmt = conn.prepare(&format!(
    "{} WHERE m.lesson_id = ?1 ORDER BY m.position, m.id",
    MODULE_SELECT
  ))?;
  let modules = stmt
    .query_map(params![lesson_id], row_to_module)?
    .collect::<Result<Vec<_>>>()?;
  Ok(modules)
}

pub fn get_game_module(conn: &Connection, module_id: i64) -> Result<Option<GameModule>> {
  conn
    .query_row(
      &format!("{} WHERE m.id = ?1", MODULE_SELECT),
      params![module_id],
      row_to_module,
    )
    .optional()
}
