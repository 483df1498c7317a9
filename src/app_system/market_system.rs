use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::actor_framework::ResourceActor;
use crate::arbitration::ArbitrationEngine;
use crate::auth::Caller;
use crate::clients::{MarketClient, UserClient};
use crate::clock::{Clock, SystemClock};
use crate::config::MarketConfig;
use crate::domain::{User, UserId};
use crate::error::MarketResult;
use crate::market_actor::MarketService;
use crate::store::{InMemoryStore, MarketStore};

/// Starts the actors, wires them together, and shuts them down.
///
/// **Startup Order:**
/// 1. User registry (no dependencies)
/// 2. Market service, given the user client and the injected store
pub struct MarketSystem {
    pub market_client: MarketClient,
    pub user_client: UserClient,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl MarketSystem {
    /// In-memory store and wall clock.
    pub fn new(config: &MarketConfig) -> Self {
        Self::with_store(config, InMemoryStore::new(), Arc::new(SystemClock))
    }

    #[instrument(name = "market_system", skip(store, clock))]
    pub fn with_store<S: MarketStore>(config: &MarketConfig, store: S, clock: Arc<dyn Clock>) -> Self {
        info!("Starting market system");
        let mut handles = Vec::new();

        let user_id_counter = Arc::new(AtomicU64::new(1));
        let next_user_id = move || UserId::new(user_id_counter.fetch_add(1, Ordering::SeqCst));
        let (user_actor, user_resource_client) =
            ResourceActor::<User>::new(config.channel_buffer, next_user_id);
        let user_client = UserClient::new(user_resource_client);
        handles.push(tokio::spawn(user_actor.run()));

        let engine = ArbitrationEngine::new(store, clock, config.max_message_len);
        let (market_service, market_client) =
            MarketService::new(config.channel_buffer, engine, user_client.clone());
        handles.push(tokio::spawn(market_service.run()));

        info!("Market system started successfully");
        Self {
            market_client,
            user_client,
            handles,
        }
    }

    /// The single identity check: a verified user id becomes a [`Caller`].
    pub async fn authenticate(&self, id: UserId) -> MarketResult<Caller> {
        Ok(self.user_client.authenticate(id).await?)
    }

    /// Market first (it calls into the user registry), then wait for every
    /// task. The user actor stops once its last client is dropped.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down market system");

        let _ = self.market_client.shutdown().await;
        drop(self.market_client);
        drop(self.user_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Service shutdown error");
                return Err(format!("Service task failed: {}", e));
            }
        }

        info!("Market system shutdown complete");
        Ok(())
    }
}
