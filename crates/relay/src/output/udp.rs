//! UDP 송신기
//!
//! 데이터그램 단발 송신이며 재시도가 없습니다. 송신 실패는 로그와
//! send_failed 카운터로만 남습니다.

use std::sync::Arc;

use metrics::{counter, gauge};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use logpost_core::{DestinationConfig, SyslogRecord, metrics as m};

use crate::pipeline::RelayStats;

/// UDP 송신기
pub struct UdpSender {
    config: DestinationConfig,
    stats: Arc<RelayStats>,
}

impl UdpSender {
    /// 새 UDP 송신기를 생성합니다.
    pub fn new(config: DestinationConfig, stats: Arc<RelayStats>) -> Self {
        Self { config, stats }
    }

    /// 큐가 닫힐 때까지 레코드를 송신합니다.
    pub async fn run(self, mut rx: mpsc::Receiver<SyslogRecord>) {
        let name = self.config.name.clone();

        let socket = match UdpSocket::bind("0.0.0.0:0").await {
            Ok(socket) => socket,
            Err(e) => {
                error!(destination = %name, error = %e, "failed to create UDP socket");
                gauge!(m::DESTINATION_UP, m::LABEL_DESTINATION => name.clone()).set(0.0);
                // 소켓 없이는 모든 레코드가 송신 실패
                while rx.recv().await.is_some() {
                    self.note_failure();
                }
                return;
            }
        };

        info!(destination = %name, address = %self.config.address, "UDP forwarder ready");
        gauge!(m::DESTINATION_UP, m::LABEL_DESTINATION => name.clone()).set(1.0);

        while let Some(record) = rx.recv().await {
            let payload = record.encode(self.config.format);
            match socket.send_to(&payload, self.config.address.as_str()).await {
                Ok(_) => {
                    debug!(destination = %name, bytes = payload.len(), "datagram forwarded");
                    self.stats.note_forwarded();
                    counter!(
                        m::MESSAGES_FORWARDED_TOTAL,
                        m::LABEL_DESTINATION => name.clone()
                    )
                    .increment(1);
                }
                Err(e) => {
                    warn!(destination = %name, error = %e, "UDP send failed");
                    self.note_failure();
                }
            }
        }

        gauge!(m::DESTINATION_UP, m::LABEL_DESTINATION => name.clone()).set(0.0);
        debug!(destination = %name, "UDP forwarder stopped");
    }

    fn note_failure(&self) {
        self.stats.note_send_failed();
        counter!(m::MESSAGES_DROPPED_TOTAL, m::LABEL_REASON => m::REASON_SEND_FAILED).increment(1);
    }
}
