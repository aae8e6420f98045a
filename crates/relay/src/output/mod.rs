//! 송신 모듈 — destination별 독립 송신 태스크
//!
//! destination마다 하나의 태스크가 소켓을 단독 소유하며, mpsc 큐를
//! 통해 레코드를 받습니다. 큐가 송신 순서를 보존하므로 하나의
//! (수신 컨텍스트 → destination) 경로에서 TCP 송신 순서는 도착 순서와
//! 같습니다.
//!
//! - [`UdpSender`]: 단발 송신, 재시도 없음 (손실 허용이 UDP의 계약)
//! - [`TcpSender`]: 연결 상태 기계 + 메시지 단위 지수 백오프 재시도

pub mod tcp;
pub mod udp;

pub use tcp::TcpSender;
pub use udp::UdpSender;

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use logpost_core::{DestinationConfig, Protocol, SyslogRecord, metrics as m};

use crate::pipeline::RelayStats;

/// destination 송신 큐 용량
pub(crate) const SEND_QUEUE_CAPACITY: usize = 1024;

/// 직렬화된 본문에서 프레이밍 충돌 문자를 제거합니다.
///
/// non-transparent 프레이밍은 LF가 메시지 경계이므로, 본문 안의
/// CR/LF는 공백으로 바꾼 뒤 종료 LF를 붙입니다.
pub(crate) fn sanitize_for_line_framing(payload: &mut Vec<u8>) {
    for byte in payload.iter_mut() {
        if *byte == b'\n' || *byte == b'\r' {
            *byte = b' ';
        }
    }
    payload.push(b'\n');
}

/// 파이프라인이 송신 태스크로 레코드를 넘길 때 쓰는 핸들
///
/// 핸들이 모두 드롭되면 큐가 닫히고 송신 태스크는 남은 레코드를
/// 비운 뒤 종료합니다.
#[derive(Clone)]
pub struct SenderHandle {
    name: String,
    tx: mpsc::Sender<SyslogRecord>,
    stats: Arc<RelayStats>,
}

impl SenderHandle {
    /// destination 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 레코드를 송신 큐에 넣습니다.
    ///
    /// 큐가 닫힌 경우(종료 중) 레코드는 send_failed로 계수됩니다.
    pub async fn enqueue(&self, record: SyslogRecord) {
        if self.tx.send(record).await.is_err() {
            warn!(destination = %self.name, "send queue closed, dropping record");
            self.stats.note_send_failed();
            counter!(m::MESSAGES_DROPPED_TOTAL, m::LABEL_REASON => m::REASON_SEND_FAILED)
                .increment(1);
        }
    }
}

/// destination 설정에 맞는 송신 태스크를 스폰합니다.
pub(crate) fn spawn_sender(
    config: DestinationConfig,
    cancel: CancellationToken,
    stats: Arc<RelayStats>,
) -> (SenderHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(SEND_QUEUE_CAPACITY);
    let handle = SenderHandle {
        name: config.name.clone(),
        tx,
        stats: Arc::clone(&stats),
    };

    let task = match config.protocol {
        Protocol::Udp => {
            let sender = UdpSender::new(config, stats);
            tokio::spawn(async move { sender.run(rx).await })
        }
        Protocol::Tcp => {
            let sender = TcpSender::new(config, cancel, stats);
            tokio::spawn(async move { sender.run(rx).await })
        }
    };

    (handle, task)
}
