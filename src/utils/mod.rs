pub mod cache;
pub mod logger;

pub use cache::QuoteCache;
pub use logger::init_logger;
