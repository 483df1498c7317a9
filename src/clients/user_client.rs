use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::auth::Caller;
use crate::domain::{User, UserCreate, UserId};
use crate::user_actor::UserError;

/// Client for interacting with the user registry actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_client_methods!(UserClient, User, UserError, user);

impl UserClient {
    #[instrument(skip(self), fields(username = %params.username))]
    pub async fn register_user(&self, params: UserCreate) -> Result<User, UserError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(UserError::from)
    }

    /// Resolve a verified identity into a caller context. Unknown users are
    /// `NotFound`.
    #[instrument(skip(self))]
    pub async fn authenticate(&self, id: UserId) -> Result<Caller, UserError> {
        let user = self
            .get_user(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        Ok(Caller::from_user(&user))
    }
}
