//! UDP syslog 리스너
//!
//! 데이터그램 하나를 메시지 하나로 취급하므로 프레이밍 상태가 없습니다.
//! 길이 0의 데이터그램은 파싱 에러로 계수되며 리스너는 계속 동작합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use logpost_core::{InputConfig, Protocol};

use crate::error::RelayError;
use crate::pipeline::Dispatcher;

/// UDP 수신 버퍼 크기 — UDP 페이로드 상한(64KiB)을 수용
const RECV_BUFFER_SIZE: usize = 64 * 1024;

/// UDP syslog 리스너
pub struct UdpInput {
    name: String,
    socket: UdpSocket,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl UdpInput {
    /// 설정된 주소에 바인드합니다.
    pub async fn bind(
        config: &InputConfig,
        dispatcher: Arc<Dispatcher>,
        cancel: CancellationToken,
    ) -> Result<Self, RelayError> {
        let socket =
            UdpSocket::bind(&config.address)
                .await
                .map_err(|e| RelayError::Listener {
                    input: config.name.clone(),
                    reason: format!("failed to bind to {}: {}", config.address, e),
                })?;

        info!(input = %config.name, address = %config.address, "UDP listener started");

        Ok(Self {
            name: config.name.clone(),
            socket,
            dispatcher,
            cancel,
        })
    }

    /// 실제로 바인드된 주소를 반환합니다.
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.socket.local_addr()?)
    }

    /// 수신 루프를 실행합니다. 취소될 때까지 동작합니다.
    pub async fn run(self) -> Result<(), RelayError> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, addr)) => {
                            debug!(input = %self.name, bytes = len, peer = %addr, "datagram received");
                            self.dispatcher.handle_raw(&buf[..len], Protocol::Udp).await;
                        }
                        Err(e) => {
                            warn!(input = %self.name, error = %e, "UDP recv error");
                        }
                    }
                }
                _ = self.cancel.cancelled() => {
                    info!(input = %self.name, "UDP listener shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
