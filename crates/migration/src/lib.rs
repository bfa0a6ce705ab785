//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20220101_000001_create_credential;
mod m20220101_000002_create_agent;
mod m20220101_000003_create_phone_number;
mod m20220101_000004_create_voice;
mod m20220101_000005_create_connection;
mod m20220101_000006_create_migration_attempt;
mod m20220101_000007_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220101_000001_create_credential::Migration),
            Box::new(m20220101_000002_create_agent::Migration),
            Box::new(m20220101_000003_create_phone_number::Migration),
            Box::new(m20220101_000004_create_voice::Migration),
            Box::new(m20220101_000005_create_connection::Migration),
            Box::new(m20220101_000006_create_migration_attempt::Migration),
            // Indexes should always be applied last
            Box::new(m20220101_000007_add_indexes::Migration),
        ]
    }
}
