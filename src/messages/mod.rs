use tokio::sync::oneshot;

use crate::auth::Caller;
use crate::domain::{
    Approval, BuyerRequestView, Category, Product, ProductCreate, ProductId, ProductListing,
    ProductPatch, PurchaseRequest, RequestId, SellerRequestView,
};
use crate::error::MarketError;

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;
pub type MarketResponse<T> = ServiceResponse<T, MarketError>;

/// Messages handled by the market actor. Each variant carries its parameters
/// and a oneshot channel for the reply.
#[derive(Debug)]
pub enum MarketRequest {
    // --- catalog ---
    CreateProduct {
        caller: Caller,
        listing: ProductCreate,
        respond_to: MarketResponse<Product>,
    },
    UpdateProduct {
        caller: Caller,
        id: ProductId,
        patch: ProductPatch,
        respond_to: MarketResponse<Product>,
    },
    DeleteProduct {
        caller: Caller,
        id: ProductId,
        respond_to: MarketResponse<()>,
    },
    GetProduct {
        id: ProductId,
        respond_to: MarketResponse<Option<Product>>,
    },
    ListProducts {
        category: Option<Category>,
        respond_to: MarketResponse<Vec<ProductListing>>,
    },
    ListSellerProducts {
        caller: Caller,
        respond_to: MarketResponse<Vec<ProductListing>>,
    },

    // --- arbitration ---
    SubmitRequest {
        caller: Caller,
        product_id: ProductId,
        message: Option<String>,
        respond_to: MarketResponse<PurchaseRequest>,
    },
    Approve {
        caller: Caller,
        request_id: RequestId,
        respond_to: MarketResponse<Approval>,
    },
    Reject {
        caller: Caller,
        request_id: RequestId,
        respond_to: MarketResponse<PurchaseRequest>,
    },

    // --- request queries ---
    GetRequest {
        id: RequestId,
        respond_to: MarketResponse<Option<PurchaseRequest>>,
    },
    ListRequestsForProduct {
        caller: Caller,
        product_id: ProductId,
        respond_to: MarketResponse<Vec<PurchaseRequest>>,
    },
    ListRequestsForSeller {
        caller: Caller,
        respond_to: MarketResponse<Vec<SellerRequestView>>,
    },
    ListRequestsForBuyer {
        caller: Caller,
        respond_to: MarketResponse<Vec<BuyerRequestView>>,
    },

    Shutdown,
}
