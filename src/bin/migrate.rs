use storefront::{config::AppConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    db::init(&config).await?;
    println!("Migrations applied");
    Ok(())
}
