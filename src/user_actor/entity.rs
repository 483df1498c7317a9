use crate::actor_framework::{Entity, FrameworkError};
use crate::domain::{User, UserCreate, UserId, UserPatch};

impl Entity for User {
    type Id = UserId;
    type CreateParams = UserCreate;
    type Patch = UserPatch;

    fn id(&self) -> UserId {
        self.id
    }

    /// Registers a user under the id chosen by the actor.
    ///
    /// Both `username` and `name` are trimmed and must be non-empty.
    fn from_create_params(id: UserId, params: UserCreate) -> Result<Self, FrameworkError> {
        let username = params.username.trim();
        let name = params.name.trim();
        if username.is_empty() {
            return Err(FrameworkError::Validation("username must not be empty".to_string()));
        }
        if name.is_empty() {
            return Err(FrameworkError::Validation("name must not be empty".to_string()));
        }
        Ok(Self {
            id,
            username: username.to_string(),
            name: name.to_string(),
        })
    }

    fn on_update(&mut self, patch: UserPatch) -> Result<(), FrameworkError> {
        if let Some(name) = patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(FrameworkError::Validation("name must not be empty".to_string()));
            }
            self.name = name.to_string();
        }
        Ok(())
    }

    /// Usernames are unique, compared case-insensitively.
    fn conflicts_with(&self, other: &Self) -> Option<String> {
        self.username
            .eq_ignore_ascii_case(&other.username)
            .then(|| format!("username '{}' is taken", self.username))
    }
}
