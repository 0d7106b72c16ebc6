//! `seed-zones`: load the zones file and upsert it.

use std::path::Path;

pub(crate) async fn run_seed_zones(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let zones_file = cafe_core::load_zones(path)?;
    tracing::info!(path = %path.display(), zones = zones_file.zones.len(), "loaded zones file");

    let count = cafe_db::upsert_zones(pool, &zones_file.zones).await?;
    println!("seeded {count} zone(s) from {}", path.display());
    Ok(())
}
