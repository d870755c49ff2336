mod watch_migration_events;

pub use watch_migration_events::WatchMigrationEvents;
