//! Newline-delimited JSON front end.

use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use super::service::LimitService;
use crate::error::Result;
use crate::ratelimit::RateLimiterBackend;

/// Reads one JSON request per line and writes one JSON response per line.
pub struct LineServer<R: RateLimiterBackend + 'static> {
    service: LimitService<R>,
}

impl<R: RateLimiterBackend + 'static> LineServer<R> {
    /// Create a new line server backed by a rate limiter.
    pub fn new(rate_limiter: Arc<R>) -> Self {
        Self {
            service: LimitService::new(rate_limiter),
        }
    }

    /// Serve until the input is exhausted.
    pub async fn serve<I, O>(&self, input: I, output: O) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        self.serve_with_shutdown(input, output, std::future::pending())
            .await
    }

    /// Serve until the input is exhausted or `signal` resolves.
    ///
    /// A request already read is always answered before shutting down.
    pub async fn serve_with_shutdown<I, O, F>(&self, input: I, mut output: O, signal: F) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let mut lines = input.lines();
        let mut served: u64 = 0;
        tokio::pin!(signal);

        info!("Line driver accepting requests");

        loop {
            let line = tokio::select! {
                _ = &mut signal => {
                    info!("Shutdown signal received, closing line driver");
                    break;
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                info!("Input closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let response = self.service.handle_line(&line);
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            output.write_all(&encoded).await?;
            output.flush().await?;
            served += 1;
        }

        info!(served, "Line driver stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{LimitRules, ManualClock, RateLimiter};
    use serde_json::Value;
    use tokio::io::BufReader;

    fn server() -> LineServer<RateLimiter<ManualClock>> {
        let limiter = RateLimiter::with_clock(LimitRules::default(), ManualClock::new());
        LineServer::new(Arc::new(limiter))
    }

    fn parse_lines(output: &[u8]) -> Vec<Value> {
        String::from_utf8(output.to_vec())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serves_split_input() {
        let input = tokio_test::io::Builder::new()
            .read(b"{\"op\":\"consume\",\"ident")
            .read(b"ifier\":\"10.0.0.5\"}\n\n")
            .read(b"{\"op\":\"remaining\",\"identifier\":\"10.0.0.5\"}\n")
            .build();
        let mut output = Vec::new();

        server()
            .serve(BufReader::new(input), &mut output)
            .await
            .unwrap();

        let responses = parse_lines(&output);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["op"], "consume");
        assert_eq!(responses[0]["limited"], false);
        assert_eq!(responses[1]["remaining"], 999);
    }

    #[tokio::test]
    async fn test_bad_line_does_not_stop_server() {
        let input: &[u8] = b"garbage\n{\"op\":\"reset\",\"identifier\":\"x\",\"class\":\"login\"}\n";
        let mut output = Vec::new();

        server().serve(input, &mut output).await.unwrap();

        let responses = parse_lines(&output);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["status"], 400);
        assert_eq!(responses[1]["op"], "reset");
        assert_eq!(responses[1]["remaining"], 20);
    }

    #[tokio::test]
    async fn test_stops_on_signal() {
        let (_client, server_side) = tokio::io::duplex(64);
        let mut output = Vec::new();

        server()
            .serve_with_shutdown(BufReader::new(server_side), &mut output, async {})
            .await
            .unwrap();

        assert!(output.is_empty());
    }
}
