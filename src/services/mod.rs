pub mod cart;
pub mod payments;
pub mod pincode;
pub mod serviceability;

pub use cart::CartService;
pub use payments::PaymentService;
pub use pincode::PincodeResolver;
pub use serviceability::ServiceabilityGate;
