//! Model served over HTTP.
//!
//! Protocol: `POST <url>` with `{"features": [...]}`, response
//! `{"prediction": <f64>}`. Any transport or decoding failure is an oracle
//! failure for that step; the caller decides how to degrade.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::oracle::Oracle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct PredictBody<'a> {
    features: &'a [f64],
}

#[derive(Deserialize)]
struct PredictReply {
    prediction: f64,
}

pub struct RemoteOracle {
    client: Client,
    url: String,
}

impl RemoteOracle {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::new(2, format!("Invalid model URL '{url}'.")));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

impl Oracle for RemoteOracle {
    fn predict(&self, features: &[f64]) -> Result<f64, AppError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&PredictBody { features })
            .send()
            .map_err(|e| AppError::new(4, format!("Model request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Model server returned HTTP {}.", resp.status()),
            ));
        }

        let reply: PredictReply = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Invalid model server response: {e}")))?;
        Ok(reply.prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        assert_eq!(RemoteOracle::new("ftp://model").err().map(|e| e.exit_code()), Some(2));
        assert!(RemoteOracle::new("http://127.0.0.1:9/predict").is_ok());
    }

    #[test]
    fn unreachable_server_is_an_oracle_failure() {
        // Port 9 (discard) is not expected to run an HTTP server locally.
        let oracle = RemoteOracle::new("http://127.0.0.1:9/predict").unwrap();
        let err = oracle.predict(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
