use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::auth::Caller;
use crate::domain::{
    Approval, BuyerRequestView, Category, Product, ProductCreate, ProductId, ProductListing,
    ProductPatch, PurchaseRequest, RequestId, SellerRequestView,
};
use crate::messages::MarketRequest;

/// Client for the market actor. Cheap to clone; every clone talks to the
/// same actor, so all callers share one serialized view of the market.
#[derive(Clone)]
pub struct MarketClient {
    sender: mpsc::Sender<MarketRequest>,
}

impl MarketClient {
    pub fn new(sender: mpsc::Sender<MarketRequest>) -> Self {
        Self { sender }
    }

    /// Manual method for special cases (no response needed)
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), String> {
        debug!("Sending shutdown request");
        self.sender
            .send(MarketRequest::Shutdown)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

// Catalog
client_method!(MarketClient => fn create_product(caller: Caller, listing: ProductCreate) -> Product as MarketRequest::CreateProduct);
client_method!(MarketClient => fn update_product(caller: Caller, id: ProductId, patch: ProductPatch) -> Product as MarketRequest::UpdateProduct);
client_method!(MarketClient => fn delete_product(caller: Caller, id: ProductId) -> () as MarketRequest::DeleteProduct);
client_method!(MarketClient => fn get_product(id: ProductId) -> Option<Product> as MarketRequest::GetProduct);
client_method!(MarketClient => fn list_products(category: Option<Category>) -> Vec<ProductListing> as MarketRequest::ListProducts);
client_method!(MarketClient => fn list_seller_products(caller: Caller) -> Vec<ProductListing> as MarketRequest::ListSellerProducts);

// Arbitration
client_method!(MarketClient => fn submit_request(caller: Caller, product_id: ProductId, message: Option<String>) -> PurchaseRequest as MarketRequest::SubmitRequest);
client_method!(MarketClient => fn approve(caller: Caller, request_id: RequestId) -> Approval as MarketRequest::Approve);
client_method!(MarketClient => fn reject(caller: Caller, request_id: RequestId) -> PurchaseRequest as MarketRequest::Reject);

// Request queries
client_method!(MarketClient => fn get_request(id: RequestId) -> Option<PurchaseRequest> as MarketRequest::GetRequest);
client_method!(MarketClient => fn list_requests_for_product(caller: Caller, product_id: ProductId) -> Vec<PurchaseRequest> as MarketRequest::ListRequestsForProduct);
client_method!(MarketClient => fn list_requests_for_seller(caller: Caller) -> Vec<SellerRequestView> as MarketRequest::ListRequestsForSeller);
client_method!(MarketClient => fn list_requests_for_buyer(caller: Caller) -> Vec<BuyerRequestView> as MarketRequest::ListRequestsForBuyer);
