// ============================================
// JSON Lines Server (標準輸入/輸出服務)
// ============================================
//
// One request per input line, one response per output line. A line that is
// not UTF-8 or not a valid request is answered with an error response and
// the loop moves on; only I/O failures end it.

use crate::models::{InboundRequest, OutboundResponse};
use crate::services::EngineHandle;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Serve requests from `reader` until EOF. Returns the number of responses
/// written. The handle is released when this returns or is dropped.
pub async fn serve_lines<R, W>(
    handle: EngineHandle,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut answered = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let request_id = Uuid::new_v4();
        let span = info_span!("request", request_id = %request_id);

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => {
                let line = line.trim();
                async {
                    match serde_json::from_str::<InboundRequest>(line) {
                        Ok(request) => handle.handle_request(request).await,
                        Err(e) => {
                            warn!(error = %e, "Malformed request line");
                            OutboundResponse::error(format!("malformed request: {}", e))
                        }
                    }
                }
                .instrument(span)
                .await
            }
            Err(e) => {
                span.in_scope(|| warn!(error = %e, "Request line is not valid UTF-8"));
                OutboundResponse::error(format!("malformed request: {}", e))
            }
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
        answered += 1;
    }

    info!(answered, "Input closed");
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityClass;
    use crate::services::rating::ConstantRating;
    use crate::services::scoring::ScoreBounds;
    use crate::services::{spawn_engine, ScoringEngine};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::BufReader;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoreBounds::default(), Arc::new(ConstantRating(1.0))).unwrap()
    }

    fn statuses(output: &[u8]) -> Vec<String> {
        output
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| {
                let value: serde_json::Value = serde_json::from_slice(line).unwrap();
                value["status"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_serving() {
        let (handle, _task) = spawn_engine(engine(), 8);
        let mut input = Vec::new();
        input.extend_from_slice(b"{\"kind\":\"top\",\"class\":\"user\",\"k\":3}\n");
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(
            b"{\"kind\":\"message\",\"class\":\"user\",\"entity\":\"U1\",\"text\":\"hi\"}\n",
        );
        input.extend_from_slice(b"not json\n");

        let mut output = Vec::new();
        let answered = serve_lines(handle, &input[..], &mut output).await.unwrap();

        assert_eq!(answered, 4);
        assert_eq!(statuses(&output), vec!["ranking", "error", "scored", "error"]);
    }

    #[tokio::test]
    async fn test_blank_lines_and_missing_newline() {
        let (handle, _task) = spawn_engine(engine(), 8);
        let input = b"\n   \n{\"kind\":\"score\",\"class\":\"channel\",\"entity\":\"C9\"}";

        let mut output = Vec::new();
        let answered = serve_lines(handle, &input[..], &mut output).await.unwrap();

        assert_eq!(answered, 1);
        assert_eq!(statuses(&output), vec!["not_found"]);
    }

    #[tokio::test]
    async fn test_dropping_server_releases_engine() {
        let (handle, task) = spawn_engine(engine(), 8);
        let (mut client, server) = tokio::io::duplex(256);
        let request = b"{\"kind\":\"message\",\"class\":\"user\",\"entity\":\"U1\",\"text\":\"hi\"}\n";
        client.write_all(request).await.unwrap();

        // input stays open, so serving only stops when the future is dropped
        let served = tokio::time::timeout(
            Duration::from_millis(100),
            serve_lines(handle, BufReader::new(server), tokio::io::sink()),
        )
        .await;
        assert!(served.is_err());

        let engine = task.await.unwrap();
        assert_eq!(engine.registry(EntityClass::User).query_score("U1"), Some(75));
    }
}
