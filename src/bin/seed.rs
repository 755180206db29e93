//! Database seed script for creating the initial admin account
//! Run with: cargo run --bin seed

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use blog_api::security::password;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE__URL")
        .unwrap_or_else(|_| "postgres://localhost/blog".to_string());

    println!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    println!("Connected successfully!");

    let username =
        std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "Example@123".to_string());

    println!("Hashing password...");
    let password_hash = password::hash_password(&password)?;

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&pool)
        .await?;

    if let Some((id,)) = existing {
        println!("Updating existing admin password...");
        sqlx::query(
            "UPDATE users SET password_hash = $1, is_admin = TRUE, is_active = TRUE, updated_at = NOW() WHERE id = $2",
        )
        .bind(&password_hash)
        .bind(id)
        .execute(&pool)
        .await?;
        println!("Admin password updated successfully!");
    } else {
        println!("Creating new admin...");
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_admin, is_active)
            VALUES ($1, $2, $3, $4, TRUE, TRUE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&username)
        .bind(&username)
        .bind(&password_hash)
        .execute(&pool)
        .await?;
        println!("Admin created successfully!");
    }

    println!("\n========================================");
    println!("Admin Account Ready!");
    println!("========================================");
    println!("Username: {}", username);
    println!("Password: {}", password);
    println!("========================================");
    println!("\nChange the password before exposing the service.");

    Ok(())
}
