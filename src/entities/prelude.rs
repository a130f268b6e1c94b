pub use super::comments::Entity as Comments;
pub use super::likes::Entity as Likes;
pub use super::subscriptions::Entity as Subscriptions;
pub use super::tweets::Entity as Tweets;
pub use super::users::Entity as Users;
pub use super::videos::Entity as Videos;
pub use super::watch_history::Entity as WatchHistory;
