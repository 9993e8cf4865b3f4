use crate::engine::session::ExamSession;
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// In-process home of every live exam session. One live session per user:
/// starting a new exam silently displaces whatever that user had in
/// progress (the discarded session leaves no ExamResult).
///
/// The registry lock is held across finalize-and-persist so a user submit
/// and the sweeper can never both record the same session.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<Sessions>,
}

#[derive(Default)]
pub struct Sessions {
    by_exam: HashMap<Uuid, ExamSession>,
    by_user: HashMap<Uuid, Uuid>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.inner.lock().await
    }
}

impl Sessions {
    /// Registers a session, dropping the owner's previous one if any.
    /// Returns the displaced session.
    pub fn insert(&mut self, session: ExamSession) -> Option<ExamSession> {
        let displaced = self
            .by_user
            .insert(session.user_id, session.exam_id)
            .and_then(|old_exam_id| self.by_exam.remove(&old_exam_id));
        self.by_exam.insert(session.exam_id, session);
        displaced
    }

    pub fn get_mut(&mut self, exam_id: Uuid) -> Option<&mut ExamSession> {
        self.by_exam.get_mut(&exam_id)
    }

    pub fn remove(&mut self, exam_id: Uuid) -> Option<ExamSession> {
        let session = self.by_exam.remove(&exam_id)?;
        if self.by_user.get(&session.user_id) == Some(&exam_id) {
            self.by_user.remove(&session.user_id);
        }
        Some(session)
    }

    pub fn live_exam_ids(&self) -> Vec<Uuid> {
        self.by_exam.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_exam.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_exam.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::ExamType;
    use chrono::Utc;

    fn session_for(user_id: Uuid) -> ExamSession {
        ExamSession::new(user_id, ExamType::Practice, None, Vec::new(), Utc::now())
    }

    #[tokio::test]
    async fn starting_again_displaces_previous_session() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();

        let first = session_for(user);
        let first_id = first.exam_id;
        let second = session_for(user);
        let second_id = second.exam_id;

        let mut guard = registry.lock().await;
        assert!(guard.insert(first).is_none());
        let displaced = guard.insert(second).expect("previous session displaced");
        assert_eq!(displaced.exam_id, first_id);
        assert_eq!(guard.len(), 1);
        assert!(guard.get_mut(first_id).is_none());
        assert!(guard.get_mut(second_id).is_some());
    }

    #[tokio::test]
    async fn remove_clears_the_user_index() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let session = session_for(user);
        let exam_id = session.exam_id;

        let mut guard = registry.lock().await;
        guard.insert(session);
        assert!(guard.remove(exam_id).is_some());
        assert!(guard.is_empty());
        assert!(guard.remove(exam_id).is_none());

        // A fresh session for the same user registers cleanly.
        assert!(guard.insert(session_for(user)).is_none());
    }

    #[tokio::test]
    async fn live_ids_snapshot_covers_all_users() {
        let registry = SessionRegistry::new();
        let mut guard = registry.lock().await;
        guard.insert(session_for(Uuid::new_v4()));
        guard.insert(session_for(Uuid::new_v4()));
        guard.insert(session_for(Uuid::new_v4()));
        assert_eq!(guard.live_exam_ids().len(), 3);
    }
}
