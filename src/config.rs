use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub private_key_path: String,
    pub public_key_path: String,
    /// Key-wrap algorithm carried in the token header ("RSA-OAEP" or "RSA-OAEP-256").
    pub key_algorithm: String,
    /// Content-encryption algorithm carried in the token header ("A128GCM" or "A256GCM").
    pub content_algorithm: String,
    pub token_ttl_hours: u64,
    /// How long revocation records are kept past the token's own expiry.
    pub revocation_retention_hours: u64,
    /// Identity whose sessions pass the administrator gate.
    pub admin_identity: String,
    /// Upper bound on any single revocation-store operation.
    pub store_timeout_secs: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("environment", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/blog")?
            .set_default("database.max_connections", 10)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("auth.private_key_path", "keys/private_key.pem")?
            .set_default("auth.public_key_path", "keys/public_key.pem")?
            .set_default("auth.key_algorithm", "RSA-OAEP-256")?
            .set_default("auth.content_algorithm", "A256GCM")?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("auth.revocation_retention_hours", 48)?
            .set_default("auth.admin_identity", "admin@example.com")?
            .set_default("auth.store_timeout_secs", 5)?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
