use crate::entities::{comments, likes, subscriptions, tweets, users, videos, watch_history};
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", database_url);

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

fn unique_indexes() -> Vec<(&'static str, IndexCreateStatement)> {
    vec![
        (
            "idx_likes_unique_target",
            Index::create()
                .name("idx_likes_unique_target")
                .table(likes::Entity)
                .col(likes::Column::LikedBy)
                .col(likes::Column::TargetKind)
                .col(likes::Column::TargetId)
                .unique()
                .if_not_exists()
                .to_owned(),
        ),
        (
            "idx_subscriptions_unique_pair",
            Index::create()
                .name("idx_subscriptions_unique_pair")
                .table(subscriptions::Entity)
                .col(subscriptions::Column::SubscriberId)
                .col(subscriptions::Column::ChannelId)
                .unique()
                .if_not_exists()
                .to_owned(),
        ),
        (
            "idx_watch_history_unique_pair",
            Index::create()
                .name("idx_watch_history_unique_pair")
                .table(watch_history::Entity)
                .col(watch_history::Column::UserId)
                .col(watch_history::Column::VideoId)
                .unique()
                .if_not_exists()
                .to_owned(),
        ),
    ]
}

/// Creates missing tables from the entity definitions, then the composite
/// unique indexes the toggle operations rely on.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Users first: every other table references it.
    let stmts = vec![
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "videos",
            schema
                .create_table_from_entity(videos::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "comments",
            schema
                .create_table_from_entity(comments::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "tweets",
            schema
                .create_table_from_entity(tweets::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "likes",
            schema
                .create_table_from_entity(likes::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "subscriptions",
            schema
                .create_table_from_entity(subscriptions::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "watch_history",
            schema
                .create_table_from_entity(watch_history::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        db.execute(builder.build(&stmt)).await?;
        info!("   - Table '{}' checked/created", name);
    }

    for (name, stmt) in unique_indexes() {
        db.execute(builder.build(&stmt)).await?;
        info!("   - Index '{}' checked/created", name);
    }

    Ok(())
}
