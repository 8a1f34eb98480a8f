use anyhow::{Context, Result};
use markflow_shared::{endpoints::CurrentUser, models::RegisterRequest, TokenStore};

use crate::CliClient;

pub async fn login(client: &CliClient, email: &str, password: &str) -> Result<()> {
    let payload = client
        .login(email, password)
        .await
        .context("sign-in failed")?;
    match payload.user.as_ref() {
        Some(user) => tracing::info!("signed in as {}", user.display_name()),
        None => tracing::info!("signed in"),
    }
    tracing::info!("session saved to {}", client.tokens().path().display());
    Ok(())
}

pub async fn register(
    client: &CliClient,
    name: String,
    email: String,
    password: String,
) -> Result<()> {
    let request = RegisterRequest {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password,
    };
    let payload = client
        .register(request)
        .await
        .context("registration failed")?;
    let who = payload
        .user
        .as_ref()
        .map(|user| user.display_name().to_string())
        .unwrap_or_else(|| "new account".to_string());
    tracing::info!("registered and signed in as {who}");
    Ok(())
}

pub fn logout(client: &CliClient) -> Result<()> {
    if client.tokens().access_token().is_none() {
        tracing::info!("no session to sign out of");
        return Ok(());
    }
    client.logout();
    tracing::info!("signed out");
    Ok(())
}

pub async fn whoami(client: &CliClient) -> Result<()> {
    let user = client
        .call(&CurrentUser)
        .await
        .context("failed to load the signed-in user")?;
    println!("{} <{}>", user.display_name(), user.email);
    Ok(())
}
