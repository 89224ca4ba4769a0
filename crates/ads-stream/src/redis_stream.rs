use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;

use crate::error::Error;
use crate::stream::{EventStream, StreamEntry};

const PAYLOAD_FIELD: &str = "ad";

/// An [`EventStream`] backed by a Redis Stream (`XADD`/`XREAD`), capped at
/// `maxlen` entries with approximate trimming (`MAXLEN ~`).
pub struct RedisEventStream {
    conn: ConnectionManager,
    stream_key: String,
    maxlen: usize,
}

impl RedisEventStream {
    pub fn new(conn: ConnectionManager, stream_key: impl Into<String>, maxlen: usize) -> Self {
        Self {
            conn,
            stream_key: stream_key.into(),
            maxlen,
        }
    }
}

#[async_trait]
impl EventStream for RedisEventStream {
    async fn append(&self, version: i64, payload: Vec<u8>) -> Result<String, Error> {
        let mut conn = self.conn.clone();
        let id = format!("0-{version}");
        let reply: String = conn
            .xadd_maxlen(
                &self.stream_key,
                redis::streams::StreamMaxlen::Approx(self.maxlen),
                id.as_str(),
                &[(PAYLOAD_FIELD, payload)],
            )
            .await?;
        Ok(reply)
    }

    async fn read_from(&self, after_version: i64, limit: usize) -> Result<Vec<StreamEntry>, Error> {
        let mut conn = self.conn.clone();
        let start_id = format!("0-{after_version}");
        let opts = StreamReadOptions::default().count(limit);

        let reply: StreamReadReply = conn
            .xread_options(&[&self.stream_key], &[start_id.as_str()], &opts)
            .await?;

        let mut entries = Vec::new();
        for key in reply.keys {
            for entry in key.ids {
                let payload = entry
                    .map
                    .get(PAYLOAD_FIELD)
                    .and_then(|v| match v {
                        redis::Value::Data(bytes) => Some(bytes.clone()),
                        _ => None,
                    })
                    .ok_or_else(|| Error::MalformedEntry {
                        id: entry.id.clone(),
                        reason: format!("missing `{PAYLOAD_FIELD}` field"),
                    })?;
                entries.push(StreamEntry {
                    id: entry.id,
                    payload,
                });
            }
        }
        Ok(entries)
    }
}
