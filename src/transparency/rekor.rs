use crate::DEFAULT_REKOR_URL;
use crate::error::{Error, Result};
use crate::in_toto::dsse::Envelope;
use crate::transparency::traits::{TransparencyLog, TransparencyRecord};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub struct RekorLog {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    log_index: Option<u64>,
    integrated_time: Option<i64>,
}

impl RekorLog {
    pub fn new() -> Self {
        Self::new_with_url(DEFAULT_REKOR_URL)
    }

    pub fn new_with_url(url: &str) -> Self {
        RekorLog {
            client: Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    fn entries_url(&self) -> String {
        format!("{}/api/v1/log/entries", self.base_url)
    }
}

impl Default for RekorLog {
    fn default() -> Self {
        Self::new()
    }
}

/// The proposed `intoto` entry for an envelope.
pub fn intoto_entry(envelope: &Envelope, certificate_pem: &str) -> Result<Value> {
    Ok(json!({
        "apiVersion": "0.0.1",
        "kind": "intoto",
        "spec": {
            "content": {
                "envelope": envelope.to_json()?,
            },
            "publicKey": STANDARD.encode(certificate_pem),
        },
    }))
}

fn parse_created_entry(body: &str) -> Result<TransparencyRecord> {
    let entries: BTreeMap<String, LogEntry> = serde_json::from_str(body)
        .map_err(|e| Error::Upload(format!("invalid log entry response: {e}")))?;

    let (uuid, entry) = entries
        .into_iter()
        .next()
        .ok_or_else(|| Error::Upload("log returned no entry".to_string()))?;

    Ok(TransparencyRecord {
        uuid,
        log_index: entry.log_index,
        integrated_time: entry.integrated_time,
    })
}

impl TransparencyLog for RekorLog {
    fn get_base_uri(&self) -> String {
        self.base_url.clone()
    }

    fn upload(&self, envelope: &Envelope, certificate_pem: &str) -> Result<TransparencyRecord> {
        let entry = intoto_entry(envelope, certificate_pem)?;

        debug!("uploading intoto entry to {}", self.base_url);
        let response = self
            .client
            .post(self.entries_url())
            .json(&entry)
            .send()
            .map_err(|e| Error::Upload(format!("log unreachable: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Upload(format!("failed to read log response: {e}")))?;

        if status != StatusCode::CREATED {
            return Err(Error::Upload(format!("log returned {status}: {body}")));
        }

        let record = parse_created_entry(&body)?;
        info!("transparency log entry created: {record}");
        Ok(record)
    }
}
