//! # Mock Framework
//!
//! Utilities for testing code that talks to a [`ResourceActor`](crate::actor_framework::ResourceActor)
//! without spinning one up.
//!
//! Use [`create_mock_client`] to get a client and the receiving end of its
//! channel, then answer requests by hand with [`expect_create`] or
//! [`expect_get`]. This makes failures, delays and odd answers deterministic.

use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, ResourceRequest};

/// Creates a mock client and a receiver for asserting requests.
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, oneshot::Sender<Result<T, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UserClient;
    use crate::domain::{User, UserCreate, UserId};
    use crate::user_actor::UserError;

    #[tokio::test]
    async fn test_register_user_through_mock() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let task = tokio::spawn(async move { client.register_user(UserCreate::new("dana", "Dana")).await });

        let (params, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(params.username, "dana");
        let user = User {
            id: UserId::new(1),
            username: params.username,
            name: params.name,
        };
        responder.send(Ok(user.clone())).unwrap();

        assert_eq!(task.await.unwrap(), Ok(user));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let task = tokio::spawn(async move { client.authenticate(UserId::new(7)).await });

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, UserId::new(7));
        responder.send(Ok(None)).unwrap();

        assert!(matches!(task.await.unwrap(), Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dropped_actor_is_a_communication_error() {
        let (inner, receiver) = create_mock_client::<User>(1);
        drop(receiver);
        let client = UserClient::new(inner);

        let result = client.get_user(UserId::new(1)).await;
        assert!(matches!(result, Err(UserError::ActorCommunicationError(_))));
    }
}
