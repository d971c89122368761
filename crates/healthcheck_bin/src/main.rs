use std::env;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_HEALTHCHECK_URL: &str = "http://localhost:8080/healthz";

#[derive(Debug, Error)]
enum HealthcheckError {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Status code != 200 or no healthcheck")]
    NotOk,
}

#[derive(Debug, Deserialize)]
struct StatusJSON {
    status: String,
}

fn healthcheck_url() -> String {
    env::var("HEALTHCHECK_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HEALTHCHECK_URL.to_string())
}

fn check_status(status: &StatusJSON) -> Result<(), HealthcheckError> {
    if status.status != "ok" {
        return Err(HealthcheckError::NotOk);
    }
    Ok(())
}

fn main() -> Result<(), HealthcheckError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let res = client.get(healthcheck_url()).send()?;
    if res.status() != 200 {
        return Err(HealthcheckError::NotOk);
    }
    let status = res.json::<StatusJSON>()?;
    check_status(&status)
}
