use jobtrack_api::{ClassifiedError, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Bootstrapping,
    Authenticated,
    Anonymous,
}

/// Snapshot of who is signed in, published by the session manager.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    phase: SessionPhase,
    user: Option<UserProfile>,
    loading: bool,
    error: Option<ClassifiedError>,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        self.error.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    pub(crate) fn begin_bootstrap(&mut self) {
        self.phase = SessionPhase::Bootstrapping;
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn begin_transition(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn authenticate(&mut self, user: UserProfile) {
        self.phase = SessionPhase::Authenticated;
        self.user = Some(user);
        self.loading = false;
        self.error = None;
    }

    pub(crate) fn sign_out(&mut self, error: Option<ClassifiedError>) {
        self.phase = SessionPhase::Anonymous;
        self.user = None;
        self.loading = false;
        self.error = error;
    }

    pub(crate) fn end_transition(&mut self) {
        self.loading = false;
    }
}
