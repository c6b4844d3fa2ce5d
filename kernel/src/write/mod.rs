// Write Endpoint
//
// Accepts one record per call and hands back the resulting log
// length as the writer's uid. Payload validation happens before
// a request gets here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::log::{AppendLog, MemoryStore, Record, RecordStore, Uid};

/// Request body: `{"record": {"data": <int>}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendRequest {
    pub record: RecordPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub data: Record,
}

impl AppendRequest {
    pub fn new(record: Record) -> Self {
        Self {
            record: RecordPayload { data: record },
        }
    }
}

/// Response body: `{"uid": <int>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendResponse {
    pub uid: Uid,
}

/// Single-record write path into the shared log.
pub struct WriteEndpoint<S: RecordStore = MemoryStore> {
    log: Arc<AppendLog<S>>,
}

impl<S: RecordStore> Clone for WriteEndpoint<S> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

impl<S: RecordStore> WriteEndpoint<S> {
    pub fn new(log: Arc<AppendLog<S>>) -> Self {
        Self { log }
    }

    /// Append one record; exactly one log mutation per call.
    pub fn accept_record(&self, record: Record) -> Uid {
        self.log.append(record)
    }

    pub fn accept(&self, request: AppendRequest) -> AppendResponse {
        AppendResponse {
            uid: self.accept_record(request.record.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_is_length_after_append() {
        let log = Arc::new(AppendLog::new());
        let endpoint = WriteEndpoint::new(log.clone());

        for (i, value) in [10, 20, 30].into_iter().enumerate() {
            let response = endpoint.accept(AppendRequest::new(Record(value)));
            assert_eq!(response.uid, i as u64 + 1);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.get(2), Some(Record(30)));
    }

    #[test]
    fn request_wire_shape() {
        let request: AppendRequest =
            serde_json::from_str(r#"{ "record": { "data": 5 } }"#).unwrap();
        assert_eq!(request, AppendRequest::new(Record(5)));

        let response = serde_json::to_value(AppendResponse { uid: 1 }).unwrap();
        assert_eq!(response, serde_json::json!({ "uid": 1 }));
    }

    #[test]
    fn non_integer_payload_does_not_parse() {
        assert!(serde_json::from_str::<AppendRequest>(r#"{ "record": { "data": "x" } }"#).is_err());
        assert!(serde_json::from_str::<AppendRequest>(r#"{ "record": {} }"#).is_err());
        assert!(serde_json::from_str::<AppendRequest>(r#"{ "data": 1 }"#).is_err());
    }

    #[test]
    fn clones_share_the_log() {
        let log = Arc::new(AppendLog::new());
        let a = WriteEndpoint::new(log.clone());
        let b = a.clone();

        assert_eq!(a.accept_record(Record(1)), 1);
        assert_eq!(b.accept_record(Record(2)), 2);
    }
}
