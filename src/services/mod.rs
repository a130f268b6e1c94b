pub mod account;
pub mod aggregation;
pub mod comments;
pub mod identity_store;
pub mod likes;
pub mod session;
pub mod subscriptions;
pub mod tweets;
pub mod videos;
