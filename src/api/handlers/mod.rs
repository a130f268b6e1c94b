pub mod comments;
pub mod health;
pub mod likes;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;
