//! Conversation continuity.

/// The backend session an adapter is currently continuing.
///
/// Lives only in memory; a restart always begins a fresh conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    id: Option<String>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session id, if a conversation is active.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Check whether a conversation is active.
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Forget the current conversation.
    pub fn reset(&mut self) {
        self.id = None;
    }

    /// Record the id returned by the backend.
    ///
    /// `None` and empty ids leave the current session in place.
    pub fn advance(&mut self, id: Option<String>) {
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            self.id = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::new();
        assert!(!session.is_active());

        session.advance(Some("abc".to_string()));
        assert_eq!(session.id(), Some("abc"));

        session.advance(None);
        assert_eq!(session.id(), Some("abc"));

        session.advance(Some(String::new()));
        assert_eq!(session.id(), Some("abc"));

        session.advance(Some("def".to_string()));
        assert_eq!(session.id(), Some("def"));

        session.reset();
        assert_eq!(session.id(), None);
    }
}
