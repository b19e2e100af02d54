use bricktopia::BricktopiaServerBuilder;
use bricktopia::config::ServerConfig;
use bricktopia_session::{MemoryProfiles, SignedTokenIdentity};
use rand::RngCore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), bricktopia::BricktopiaError> {
    let config = ServerConfig::load()?;

    let secret = match config.auth.token_secret.clone() {
        Some(secret) => secret,
        None => {
            tracing::warn!("no token secret configured, generating an ephemeral one; tokens will not survive a restart");
            let mut bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut bytes);
            hex::encode(bytes)
        }
    };

    let profiles = MemoryProfiles::new();
    let identity = SignedTokenIdentity::new(secret).with_profiles(profiles.clone());

    let server = BricktopiaServerBuilder::new()
        .config(config)
        .build(identity, profiles)
        .await?;
    server.run().await
}
