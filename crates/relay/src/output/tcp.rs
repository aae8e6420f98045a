//! TCP 송신기 — 연결 상태 기계와 메시지 단위 재시도
//!
//! 연결은 게으르게(lazy) 수립됩니다: 송신할 레코드가 있을 때 연결이
//! 없으면 연결부터 시도하고, 실패하면 `backoff_base * 2^(attempt-1)`
//! (상한 30초) 동안 대기한 뒤 다시 시도합니다. `max_attempts`를
//! 소진한 레코드는 send_failed로 폐기됩니다.
//!
//! 백오프 대기는 종료 신호에 즉시 깨어나며, 종료 중에는 레코드당
//! 단 한 번의 best-effort 송신만 수행합니다.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use logpost_core::{DestinationConfig, SyslogRecord, metrics as m};

use crate::output::sanitize_for_line_framing;
use crate::pipeline::RelayStats;

/// 지수 백오프 상한
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// TCP 송신기
pub struct TcpSender {
    config: DestinationConfig,
    cancel: CancellationToken,
    stats: Arc<RelayStats>,
    stream: Option<TcpStream>,
}

impl TcpSender {
    /// 새 TCP 송신기를 생성합니다.
    pub fn new(
        config: DestinationConfig,
        cancel: CancellationToken,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            config,
            cancel,
            stats,
            stream: None,
        }
    }

    /// 큐가 닫힐 때까지 레코드를 순서대로 송신합니다.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SyslogRecord>) {
        while let Some(record) = rx.recv().await {
            self.deliver(record).await;
        }

        // 쓰기 방향 half-close 후 종료
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        gauge!(m::DESTINATION_UP, m::LABEL_DESTINATION => self.config.name.clone()).set(0.0);
        debug!(destination = %self.config.name, "TCP forwarder stopped");
    }

    /// 레코드 하나를 재시도 정책에 따라 송신합니다.
    async fn deliver(&mut self, record: SyslogRecord) {
        let max_attempts = if self.cancel.is_cancelled() {
            // 드레인 중에는 한 번만 시도
            1
        } else {
            self.config.retry.max_attempts
        };

        for attempt in 1..=max_attempts {
            match self.try_send(&record).await {
                Ok(()) => {
                    self.stats.note_forwarded();
                    counter!(
                        m::MESSAGES_FORWARDED_TOTAL,
                        m::LABEL_DESTINATION => self.config.name.clone()
                    )
                    .increment(1);
                    return;
                }
                Err(e) => {
                    warn!(
                        destination = %self.config.name,
                        attempt,
                        max_attempts,
                        error = %e,
                        "send attempt failed"
                    );
                    self.mark_disconnected();

                    if attempt < max_attempts {
                        let delay = backoff_delay(self.config.retry.backoff_seconds, attempt);
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = self.cancel.cancelled() => break,
                        }
                    }
                }
            }
        }

        warn!(
            destination = %self.config.name,
            attempts = max_attempts,
            "dropping record after exhausted retries"
        );
        self.stats.note_send_failed();
        counter!(m::MESSAGES_DROPPED_TOTAL, m::LABEL_REASON => m::REASON_SEND_FAILED).increment(1);
    }

    /// 필요 시 연결을 수립하고 프레임 하나를 기록합니다.
    async fn try_send(&mut self, record: &SyslogRecord) -> io::Result<()> {
        let io_timeout = Duration::from_secs_f64(self.config.timeout_seconds);

        if self.stream.is_none() {
            let stream = timeout(io_timeout, TcpStream::connect(self.config.address.as_str()))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timeout"))??;

            info!(
                destination = %self.config.name,
                address = %self.config.address,
                "TCP forwarder connected"
            );
            gauge!(m::DESTINATION_UP, m::LABEL_DESTINATION => self.config.name.clone()).set(1.0);
            self.stream = Some(stream);
        }

        let mut payload = record.encode(self.config.format).to_vec();
        sanitize_for_line_framing(&mut payload);

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no connection"))?;

        match timeout(io_timeout, stream.write_all(&payload)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timeout")),
        }
    }

    fn mark_disconnected(&mut self) {
        self.stream = None;
        gauge!(m::DESTINATION_UP, m::LABEL_DESTINATION => self.config.name.clone()).set(0.0);
    }
}

/// attempt번째 실패 후 대기 시간: `base * 2^(attempt-1)`, 상한 30초.
fn backoff_delay(base_seconds: f64, attempt: u32) -> Duration {
    let exp = 2f64.powi(attempt.saturating_sub(1).min(16) as i32);
    Duration::from_secs_f64((base_seconds * exp).min(BACKOFF_CAP.as_secs_f64()))
}
