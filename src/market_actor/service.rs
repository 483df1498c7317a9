use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::arbitration::ArbitrationEngine;
use crate::auth::Caller;
use crate::catalog;
use crate::clients::{MarketClient, UserClient};
use crate::domain::{
    Approval, BuyerRequestView, Category, Product, ProductCreate, ProductListing, PurchaseRequest,
    RequestId, SellerRequestView, User, UserId,
};
use crate::error::{MarketError, MarketResult};
use crate::messages::{MarketRequest, MarketResponse};
use crate::store::MarketStore;

/// Single owner of all market state.
///
/// Messages are handled one at a time, so every engine operation runs with
/// exclusive access to the store. Two approvals racing for one product are
/// serialized here: the second sees the product sold and gets `Conflict`.
pub struct MarketService<S: MarketStore> {
    receiver: mpsc::Receiver<MarketRequest>,
    engine: ArbitrationEngine<S>,
    user_client: UserClient,
}

impl<S: MarketStore> MarketService<S> {
    pub fn new(
        buffer_size: usize,
        engine: ArbitrationEngine<S>,
        user_client: UserClient,
    ) -> (Self, MarketClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            engine,
            user_client,
        };
        (service, MarketClient::new(sender))
    }

    #[instrument(name = "market_service", skip(self))]
    pub async fn run(mut self) {
        info!("MarketService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                MarketRequest::CreateProduct { caller, listing, respond_to } => {
                    self.handle_create_product(caller, listing, respond_to);
                }
                MarketRequest::UpdateProduct { caller, id, patch, respond_to } => {
                    let result = catalog::update_product(self.engine.store_mut(), &caller, id, patch);
                    let _ = respond_to.send(result);
                }
                MarketRequest::DeleteProduct { caller, id, respond_to } => {
                    let result = catalog::delete_product(self.engine.store_mut(), &caller, id);
                    let _ = respond_to.send(result);
                }
                MarketRequest::GetProduct { id, respond_to } => {
                    let _ = respond_to.send(self.engine.store().get_product(id).map_err(Into::into));
                }
                MarketRequest::ListProducts { category, respond_to } => {
                    self.handle_list_products(category, respond_to).await;
                }
                MarketRequest::ListSellerProducts { caller, respond_to } => {
                    self.handle_list_seller_products(caller, respond_to).await;
                }
                MarketRequest::SubmitRequest { caller, product_id, message, respond_to } => {
                    let result = self.engine.submit_request(&caller, product_id, message);
                    let _ = respond_to.send(result);
                }
                MarketRequest::Approve { caller, request_id, respond_to } => {
                    self.handle_approve(caller, request_id, respond_to);
                }
                MarketRequest::Reject { caller, request_id, respond_to } => {
                    self.handle_reject(caller, request_id, respond_to);
                }
                MarketRequest::GetRequest { id, respond_to } => {
                    let _ = respond_to.send(self.engine.store().get_request(id).map_err(Into::into));
                }
                MarketRequest::ListRequestsForProduct { caller, product_id, respond_to } => {
                    let result = catalog::requests_for_product(self.engine.store(), &caller, product_id);
                    let _ = respond_to.send(result);
                }
                MarketRequest::ListRequestsForSeller { caller, respond_to } => {
                    self.handle_requests_for_seller(caller, respond_to).await;
                }
                MarketRequest::ListRequestsForBuyer { caller, respond_to } => {
                    self.handle_requests_for_buyer(caller, respond_to).await;
                }
                MarketRequest::Shutdown => {
                    info!("MarketService shutting down");
                    break;
                }
            }
        }

        info!("MarketService stopped");
    }

    fn handle_create_product(
        &mut self,
        caller: Caller,
        listing: ProductCreate,
        respond_to: MarketResponse<Product>,
    ) {
        let now = self.engine.clock().now();
        let result = catalog::create_product(self.engine.store_mut(), &caller, listing, now);
        let _ = respond_to.send(result);
    }

    /// Authorization and the decision run back to back inside one message,
    /// so nothing can interleave between the check and the writes.
    #[instrument(fields(seller_id = %caller.user_id(), request_id = %request_id), skip(self, caller, respond_to))]
    fn handle_approve(&mut self, caller: Caller, request_id: RequestId, respond_to: MarketResponse<Approval>) {
        debug!("Processing approve request");
        let result = self
            .engine
            .authorize_decision(&caller, request_id)
            .and_then(|grant| self.engine.approve(&grant, request_id));
        if let Err(e) = &result {
            error!(error = %e, "Approve failed");
        }
        let _ = respond_to.send(result);
    }

    #[instrument(fields(seller_id = %caller.user_id(), request_id = %request_id), skip(self, caller, respond_to))]
    fn handle_reject(
        &mut self,
        caller: Caller,
        request_id: RequestId,
        respond_to: MarketResponse<PurchaseRequest>,
    ) {
        debug!("Processing reject request");
        let result = self
            .engine
            .authorize_decision(&caller, request_id)
            .and_then(|grant| self.engine.reject(&grant, request_id));
        if let Err(e) = &result {
            error!(error = %e, "Reject failed");
        }
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, respond_to))]
    async fn handle_list_products(
        &mut self,
        category: Option<Category>,
        respond_to: MarketResponse<Vec<ProductListing>>,
    ) {
        debug!("Processing list_products request");
        let result = match self.engine.store().list_products(category) {
            Ok(products) => self.with_sellers(products).await,
            Err(e) => Err(e.into()),
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(seller_id = %caller.user_id()), skip(self, caller, respond_to))]
    async fn handle_list_seller_products(
        &mut self,
        caller: Caller,
        respond_to: MarketResponse<Vec<ProductListing>>,
    ) {
        debug!("Processing list_seller_products request");
        let result = match self.engine.store().list_products_by_seller(caller.user_id()) {
            Ok(products) => self.with_sellers(products).await,
            Err(e) => Err(e.into()),
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(seller_id = %caller.user_id()), skip(self, caller, respond_to))]
    async fn handle_requests_for_seller(
        &mut self,
        caller: Caller,
        respond_to: MarketResponse<Vec<SellerRequestView>>,
    ) {
        debug!("Processing requests_for_seller request");
        let result = self.requests_for_seller(caller).await;
        match &result {
            Ok(views) => info!(request_count = views.len(), "Listed incoming requests"),
            Err(e) => error!(error = %e, "Listing incoming requests failed"),
        }
        let _ = respond_to.send(result);
    }

    #[instrument(fields(buyer_id = %caller.user_id()), skip(self, caller, respond_to))]
    async fn handle_requests_for_buyer(
        &mut self,
        caller: Caller,
        respond_to: MarketResponse<Vec<BuyerRequestView>>,
    ) {
        debug!("Processing requests_for_buyer request");
        let result = self.requests_for_buyer(caller).await;
        match &result {
            Ok(views) => info!(request_count = views.len(), "Listed outgoing requests"),
            Err(e) => error!(error = %e, "Listing outgoing requests failed"),
        }
        let _ = respond_to.send(result);
    }

    async fn requests_for_seller(&self, caller: Caller) -> MarketResult<Vec<SellerRequestView>> {
        let store = self.engine.store();
        let requests = store.list_requests_for_seller(caller.user_id())?;
        let mut users = UserCache::new(&self.user_client);
        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let product = catalog::load_product(store, request.product_id)?;
            let buyer = users.get(request.buyer_id).await?;
            views.push(SellerRequestView { request, product, buyer });
        }
        Ok(views)
    }

    async fn requests_for_buyer(&self, caller: Caller) -> MarketResult<Vec<BuyerRequestView>> {
        let store = self.engine.store();
        let requests = store.list_requests_for_buyer(caller.user_id())?;
        let mut users = UserCache::new(&self.user_client);
        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let product = catalog::load_product(store, request.product_id)?;
            let seller = users.get(product.seller_id).await?;
            views.push(BuyerRequestView { request, product, seller });
        }
        Ok(views)
    }

    async fn with_sellers(&self, products: Vec<Product>) -> MarketResult<Vec<ProductListing>> {
        let mut users = UserCache::new(&self.user_client);
        let mut listings = Vec::with_capacity(products.len());
        for product in products {
            let seller = users.get(product.seller_id).await?;
            listings.push(ProductListing { product, seller });
        }
        Ok(listings)
    }
}

/// Per-query memo of user lookups against the user actor.
struct UserCache<'a> {
    client: &'a UserClient,
    users: HashMap<UserId, User>,
}

impl<'a> UserCache<'a> {
    fn new(client: &'a UserClient) -> Self {
        Self {
            client,
            users: HashMap::new(),
        }
    }

    async fn get(&mut self, id: UserId) -> MarketResult<User> {
        if let Some(user) = self.users.get(&id) {
            return Ok(user.clone());
        }
        let user = self
            .client
            .get_user(id)
            .await?
            .ok_or_else(|| MarketError::not_found(id))?;
        self.users.insert(id, user.clone());
        Ok(user)
    }
}
