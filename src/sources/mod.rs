pub mod traits;
pub mod syndication;
pub mod news_api;
pub mod registry;

pub use traits::{ContentFetcher, FeedTarget, RawPayload, SourceDescriptor};
pub use syndication::{parse_feed, ParsedFeed, SyndicationFetcher};
pub use news_api::NewsApiFetcher;
pub use registry::FetcherRegistry;
