// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use cliniq_core::CliniqError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), CliniqError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(CliniqError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(migration = %migration, "applied storage migration");
    }
    Ok(())
}
