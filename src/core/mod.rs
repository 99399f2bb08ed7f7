//! Core business logic abstractions

pub mod aggregation;
pub mod auth;
pub mod config;
pub mod currency;
pub mod log;
pub mod pipeline;
pub mod sort;
pub mod subscription;

// Re-export main types for cleaner imports
pub use aggregation::{HomeView, MonthlyTotal};
pub use auth::{AuthApi, LoginError, LoginService};
pub use currency::{RateFetchError, RateProvider, RateSnapshot};
pub use pipeline::{Pipeline, PipelineDeps};
pub use sort::SortCriterion;
pub use subscription::{DisplaySubscription, SubscriptionRecord, SubscriptionStatus};
