pub mod auth_api;
pub mod caching;
pub mod open_er_api;
pub mod static_rates;
pub mod util;

pub use auth_api::HttpAuthApi;
pub use caching::RateCache;
pub use open_er_api::OpenErApiProvider;
pub use static_rates::StaticRateProvider;
