//! JSON-over-HTTP remote record store client.
//!
//! Speaks a CloudKit-web-services style protocol: `records/query` with a
//! `continuationMarker` for pagination and `records/modify` with non-atomic
//! `forceDelete` operations. Failures arrive either as HTTP statuses or as a
//! `serverErrorCode` in the body (per request or per record).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{DeletionError, RemoteError, RemoteErrorCode};
use crate::remote::{
    BatchDeleteOutcome, DesiredKeys, RecordQuery, RemotePage, RemoteRecordStore,
};
use crate::types::{Cursor, Predicate, RecordId, RecordType};

const TIMESTAMP_FIELD: &str = "timestamp";

pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    zone: String,
    api_token: Option<String>,
    page_size: usize,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, DeletionError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            DeletionError::Config("remote.endpoint is not configured".to_string())
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeletionError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/database/1/{}/{}/{}",
                endpoint.trim_end_matches('/'),
                config.container,
                config.environment,
                config.database
            ),
            zone: config.zone.clone(),
            api_token: config.api_token.clone(),
            page_size: config.page_size,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.client.post(format!("{}/{}", self.base_url, path));
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RemoteError> {
        let response = self
            .post(path)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let text = response.text().await.map_err(map_transport_error)?;
        debug!(path, status = status.as_u16(), bytes = text.len(), "remote response");

        if !status.is_success() {
            let mut err = map_status(status, &text);
            if err.retry_after.is_none() {
                err.retry_after = retry_after;
            }
            return Err(err);
        }
        serde_json::from_str(&text).map_err(|e| {
            RemoteError::new(
                RemoteErrorCode::InternalError,
                format!("Failed to parse response: {}", e),
            )
        })
    }

    async fn run_query(
        &self,
        query: &RecordQuery,
        cursor: Option<&Cursor>,
    ) -> Result<RemotePage, RemoteError> {
        let body = build_query_request(query, &self.zone, self.page_size, cursor);
        let response: QueryResponse = self.send("records/query", &body).await?;
        Ok(parse_query_response(response))
    }
}

#[async_trait]
impl RemoteRecordStore for HttpRemoteStore {
    async fn query(&self, query: &RecordQuery) -> Result<RemotePage, RemoteError> {
        self.run_query(query, None).await
    }

    async fn continue_query(
        &self,
        query: &RecordQuery,
        cursor: &Cursor,
    ) -> Result<RemotePage, RemoteError> {
        self.run_query(query, Some(cursor)).await
    }

    async fn delete_batch(
        &self,
        _record_type: RecordType,
        ids: &[RecordId],
    ) -> Result<BatchDeleteOutcome, RemoteError> {
        let body = build_modify_request(ids, &self.zone);
        let response: ModifyResponse = self.send("records/modify", &body).await?;
        Ok(parse_modify_response(response))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZoneId<'a> {
    zone_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    value: i64,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Filter {
    comparator: &'static str,
    field_name: &'static str,
    field_value: FieldValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    record_type: &'static str,
    filter_by: Vec<Filter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    #[serde(rename = "zoneID")]
    zone_id: ZoneId<'a>,
    results_limit: usize,
    query: QueryBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    desired_keys: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation_marker: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordRef<'a> {
    record_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Operation<'a> {
    operation_type: &'static str,
    record: RecordRef<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyRequest<'a> {
    #[serde(rename = "zoneID")]
    zone_id: ZoneId<'a>,
    operations: Vec<Operation<'a>>,
    atomic: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordEntry {
    record_name: Option<String>,
    server_error_code: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    records: Vec<RecordEntry>,
    continuation_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModifyResponse {
    #[serde(default)]
    records: Vec<RecordEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    server_error_code: Option<String>,
    reason: Option<String>,
    retry_after: Option<u64>,
}

fn timestamp_filter(comparator: &'static str, millis: i64) -> Filter {
    Filter {
        comparator,
        field_name: TIMESTAMP_FIELD,
        field_value: FieldValue {
            value: millis,
            kind: "TIMESTAMP",
        },
    }
}

fn build_query_request<'a>(
    query: &RecordQuery,
    zone: &'a str,
    page_size: usize,
    cursor: Option<&'a Cursor>,
) -> QueryRequest<'a> {
    let filter_by = match query.predicate {
        Predicate::All => Vec::new(),
        Predicate::Before { cutoff } => {
            vec![timestamp_filter("LESS_THAN", cutoff.timestamp_millis())]
        }
        Predicate::InRange { start, end } => vec![
            timestamp_filter("GREATER_THAN_OR_EQUALS", start.timestamp_millis()),
            timestamp_filter("LESS_THAN", end.timestamp_millis()),
        ],
    };
    QueryRequest {
        zone_id: ZoneId { zone_name: zone },
        results_limit: page_size,
        query: QueryBody {
            record_type: query.record_type.remote_name(),
            filter_by,
        },
        desired_keys: match query.desired_keys {
            DesiredKeys::Full => None,
            DesiredKeys::IdentifiersOnly => Some(Vec::new()),
        },
        continuation_marker: cursor.map(|c| c.token()),
    }
}

fn build_modify_request<'a>(ids: &'a [RecordId], zone: &'a str) -> ModifyRequest<'a> {
    ModifyRequest {
        zone_id: ZoneId { zone_name: zone },
        operations: ids
            .iter()
            .map(|id| Operation {
                operation_type: "forceDelete",
                record: RecordRef {
                    record_name: id.as_str(),
                },
            })
            .collect(),
        atomic: false,
    }
}

fn entry_error(entry: &RecordEntry, code: &str) -> RemoteError {
    RemoteError::new(
        RemoteErrorCode::from_server_code(code),
        entry.reason.clone().unwrap_or_default(),
    )
}

fn parse_query_response(response: QueryResponse) -> RemotePage {
    let records = response
        .records
        .into_iter()
        .map(|entry| match (&entry.server_error_code, &entry.record_name) {
            (Some(code), _) => Err(entry_error(&entry, code)),
            (None, Some(name)) => Ok(RecordId::new(name.clone())),
            (None, None) => Err(RemoteError::new(
                RemoteErrorCode::InternalError,
                "record without recordName",
            )),
        })
        .collect();
    RemotePage {
        records,
        cursor: response.continuation_marker.map(Cursor::new),
    }
}

fn parse_modify_response(response: ModifyResponse) -> BatchDeleteOutcome {
    let mut outcome = BatchDeleteOutcome::default();
    for entry in response.records {
        let Some(name) = entry.record_name.clone() else {
            continue;
        };
        match &entry.server_error_code {
            Some(code) => outcome
                .failed
                .push((RecordId::new(name), entry_error(&entry, code))),
            None => outcome.deleted.push(RecordId::new(name)),
        }
    }
    outcome
}

/// Map a non-success HTTP response to a remote error.
fn map_status(status: StatusCode, body: &str) -> RemoteError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let reason = parsed
        .reason
        .clone()
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    let code = match parsed.server_error_code.as_deref() {
        Some(code) => RemoteErrorCode::from_server_code(code),
        None => match status.as_u16() {
            401 => RemoteErrorCode::AuthenticationRequired,
            403 => RemoteErrorCode::AccessDenied,
            404 => RemoteErrorCode::NotFound,
            409 => RemoteErrorCode::Conflict,
            413 => RemoteErrorCode::LimitExceeded,
            429 => RemoteErrorCode::Throttled,
            503 => RemoteErrorCode::ServiceUnavailable,
            400 => RemoteErrorCode::BadRequest,
            _ => RemoteErrorCode::InternalError,
        },
    };
    let err = RemoteError::new(code, reason);
    match parsed.retry_after {
        Some(secs) => err.with_retry_after(Duration::from_secs(secs)),
        None => err,
    }
}

fn map_transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_connect() {
        RemoteError::new(
            RemoteErrorCode::NetworkUnavailable,
            format!("Connection error: {}", error),
        )
    } else if error.is_timeout() {
        RemoteError::new(
            RemoteErrorCode::NetworkFailure,
            format!("Request timeout: {}", error),
        )
    } else {
        RemoteError::new(
            RemoteErrorCode::Other("TRANSPORT".to_string()),
            format!("HTTP error: {}", error),
        )
    }
}
