//! Support/question service: a bounded queue of pending questions per
//! user plus the admin answer workflow.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// Question lifecycle: pending until an admin answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Pending,
    Answered,
}

impl QuestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionStatus::Pending => "pending",
            QuestionStatus::Answered => "answered",
        }
    }

    pub fn parse(value: &str) -> QuestionStatus {
        match value {
            "answered" => QuestionStatus::Answered,
            _ => QuestionStatus::Pending,
        }
    }
}

/// A support question.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
    pub status: QuestionStatus,
    pub answer: Option<String>,
    pub created_at: NaiveDateTime,
}

fn row_to_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    let status_raw: String = row.get(4)?;
    Ok(Question {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        text: row.get(3)?,
        status: QuestionStatus::parse(&status_raw),
        answer: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const QUESTION_COLUMNS: &str = "id, user_id, username, text, status, answer, created_at";

/// Counts a user's currently pending questions.
pub fn pending_count(conn: &Connection, user_id: i64) -> AppResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM questions WHERE user_id = ?1 AND status = 'pending'",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Submits a question, enforcing the per-user pending limit.
///
/// Count and insert run inside one immediate transaction so concurrent
/// submissions from the same user cannot slip past the limit.
pub fn submit(conn: &mut Connection, user_id: i64, username: Option<&str>, text: &str) -> AppResult<Question> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let pending = pending_count(&tx, user_id)?;
    if pending >= config::support::MAX_PENDING_QUESTIONS {
        return Err(AppError::QuestionLimitExceeded { pending });
    }

    tx.execute(
        "INSERT INTO questions (user_id, username, text) VALUES (?1, ?2, ?3)",
        params![user_id, username, text],
    )?;
    let question = get_question(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    Ok(question)
}

/// Fetches a question, failing with `NotFound` when absent.
pub fn get_question(conn: &Connection, id: i64) -> AppResult<Question> {
    conn.query_row(
        &format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS),
        params![id],
        row_to_question,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Question".to_string()))
}

/// Records an admin's answer and marks the question answered.
/// Precondition: admin role.
pub fn answer(conn: &Connection, id: i64, response_text: &str) -> AppResult<Question> {
    let question = get_question(conn, id)?;
    if question.status == QuestionStatus::Answered {
        return Err(AppError::Validation(format!(
            "Question #{} is already answered.",
            id
        )));
    }

    conn.execute(
        "UPDATE questions SET status = 'answered', answer = ?1 WHERE id = ?2",
        params![response_text, id],
    )?;
    get_question(conn, id)
}

/// Lists all pending questions, oldest first, for the admin board.
pub fn list_pending(conn: &Connection) -> AppResult<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM questions WHERE status = 'pending' ORDER BY created_at, id",
        QUESTION_COLUMNS
    ))?;
    let rows = stmt.query_map([], row_to_question)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::{ensure_user, init_schema};

    fn test_conn() -> Connection {
        #[allow(clippy::unwrap_used)]
        let conn = Connection::open_in_memory().unwrap();
        #[allow(clippy::unwrap_used)]
        {
            conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
            init_schema(&conn).unwrap();
        }
        ensure_user(&conn, 1, Some("alice")).ok();
        conn
    }

    #[test]
    fn fourth_pending_question_is_rejected() {
        let mut conn = test_conn();
        for i in 0..3 {
            assert!(submit(&mut conn, 1, Some("alice"), &format!("q{}", i)).is_ok());
        }
        assert!(matches!(
            submit(&mut conn, 1, Some("alice"), "q3"),
            Err(AppError::QuestionLimitExceeded { pending: 3 })
        ));
    }

    #[test]
    fn answering_frees_a_slot() {
        let mut conn = test_conn();
        let first = submit(&mut conn, 1, None, "q0").map(|q| q.id).unwrap_or(0);
        submit(&mut conn, 1, None, "q1").ok();
        submit(&mut conn, 1, None, "q2").ok();

        assert!(answer(&conn, first, "a0").is_ok());
        assert!(submit(&mut conn, 1, None, "q3").is_ok());
    }

    #[test]
    fn double_answer_is_rejected() {
        let mut conn = test_conn();
        let id = submit(&mut conn, 1, None, "q").map(|q| q.id).unwrap_or(0);
        assert!(answer(&conn, id, "a").is_ok());
        assert!(matches!(answer(&conn, id, "again"), Err(AppError::Validation(_))));
    }

    #[test]
    fn pending_list_is_oldest_first_and_shrinks() {
        let mut conn = test_conn();
        let first = submit(&mut conn, 1, None, "first").map(|q| q.id).unwrap_or(0);
        submit(&mut conn, 1, None, "second").ok();

        let pending = list_pending(&conn).unwrap_or_default();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].text, "first");

        answer(&conn, first, "done").ok();
        assert_eq!(list_pending(&conn).map(|p| p.len()).ok(), Some(1));
    }

    #[test]
    fn missing_question_is_not_found() {
        let conn = test_conn();
        assert!(matches!(answer(&conn, 404, "a"), Err(AppError::NotFound(_))));
    }
}
