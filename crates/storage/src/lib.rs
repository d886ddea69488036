pub mod error;
pub mod price_store;

pub use error::LoadError;
pub use price_store::PriceStore;
