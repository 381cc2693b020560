mod catalog_error;
mod intentlayer_error;
mod storage_error;

pub use catalog_error::CatalogError;
pub use intentlayer_error::{ErrorKind, IntentLayerError, IntentLayerResult};
pub use storage_error::StorageError;
