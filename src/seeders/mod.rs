pub mod user_seeder;

use sea_orm::DatabaseConnection;

pub async fn run_seeders(db: &DatabaseConnection) -> Result<(), String> {
    user_seeder::seed_admin_user(db).await?;
    Ok(())
}
