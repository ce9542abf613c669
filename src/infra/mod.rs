pub mod file_store;
pub mod http_client;
pub mod in_memory;

pub use file_store::FileStateStore;
pub use http_client::ReqwestPageFetcher;
pub use in_memory::InMemoryStateStore;
