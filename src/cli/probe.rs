use crate::core::credentials::Credentials;
use crate::core::settings::Settings;
use crate::query::{QueryError, SonarClient};
use anyhow::{Context, Result};

pub async fn run(settings: &Settings, json: bool) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let client = SonarClient::new(&credentials, settings.http.timeout())
        .context("Failed to build HTTP client")?;

    tracing::debug!(endpoint = %credentials.graphql_url, "Probing GraphQL endpoint");

    let response = match client.probe().await {
        Ok(response) => response,
        Err(QueryError::Status { status, body }) => {
            anyhow::bail!("HTTP error occurred: {} - {}", status, body);
        }
        Err(e) => return Err(e).context("Endpoint probe failed"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response.body)?);
        return Ok(());
    }

    println!("Status Code: {}", response.status.as_u16());
    println!("Response: {}", response.body);

    if let Some(name) = response.body["data"]["__schema"]["queryType"]["name"].as_str() {
        println!("Endpoint is responding (query type: {})", name);
    }

    Ok(())
}
