//! TCP syslog 리스너
//!
//! 연결마다 별도 태스크에서 RFC 6587 프레임을 추출합니다. 프레이밍
//! 에러는 해당 연결만 닫고, 리스너와 다른 연결은 계속 동작합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use metrics::gauge;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use logpost_core::{InputConfig, Protocol, metrics as m};

use crate::error::RelayError;
use crate::input::framing::FrameDecoder;
use crate::pipeline::Dispatcher;

/// 연결당 읽기 버퍼 크기
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// TCP syslog 리스너
pub struct TcpInput {
    name: String,
    listener: TcpListener,
    max_message_size: usize,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl TcpInput {
    /// 설정된 주소에 바인드합니다.
    pub async fn bind(
        config: &InputConfig,
        dispatcher: Arc<Dispatcher>,
        cancel: CancellationToken,
    ) -> Result<Self, RelayError> {
        let listener =
            TcpListener::bind(&config.address)
                .await
                .map_err(|e| RelayError::Listener {
                    input: config.name.clone(),
                    reason: format!("failed to bind to {}: {}", config.address, e),
                })?;

        info!(input = %config.name, address = %config.address, "TCP listener started");

        Ok(Self {
            name: config.name.clone(),
            listener,
            max_message_size: config.max_message_size,
            dispatcher,
            cancel,
        })
    }

    /// 실제로 바인드된 주소를 반환합니다.
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    /// 연결 수락 루프를 실행합니다. 취소될 때까지 동작합니다.
    ///
    /// 종료 시에는 수락을 멈춘 뒤 열려 있는 연결 핸들러가 모두
    /// 돌아올 때까지 기다립니다.
    pub async fn run(self) -> Result<(), RelayError> {
        let connections = TaskTracker::new();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(input = %self.name, peer = %peer, "connection accepted");
                            let input = self.name.clone();
                            let dispatcher = Arc::clone(&self.dispatcher);
                            let cancel = self.cancel.clone();
                            let max = self.max_message_size;
                            connections.spawn(async move {
                                handle_connection(stream, peer, input, max, dispatcher, cancel)
                                    .await;
                            });
                        }
                        Err(e) => {
                            warn!(input = %self.name, error = %e, "accept error");
                        }
                    }
                }
                _ = self.cancel.cancelled() => {
                    info!(input = %self.name, "TCP listener shutting down");
                    break;
                }
            }
        }

        connections.close();
        connections.wait().await;
        Ok(())
    }
}

/// 단일 TCP 연결을 처리합니다.
///
/// 연결 단위의 모든 비정상 상황(읽기 에러, 프레이밍 에러)은 연결
/// 종료로 수렴하며 상위로 전파되지 않습니다.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    input: String,
    max_message_size: usize,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) {
    gauge!(m::ACTIVE_CONNECTIONS, m::LABEL_INPUT => input.clone()).increment(1.0);

    let mut decoder = FrameDecoder::new(max_message_size);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    'conn: loop {
        tokio::select! {
            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!(input = %input, peer = %peer, "connection closed by peer");
                        break;
                    }
                    Ok(n) => {
                        decoder.extend(&buf[..n]);
                        loop {
                            match decoder.next_frame() {
                                Ok(Some(frame)) => {
                                    dispatcher.handle_raw(&frame, Protocol::Tcp).await;
                                }
                                Ok(None) => break,
                                Err(e) => {
                                    warn!(
                                        input = %input,
                                        peer = %peer,
                                        error = %e,
                                        "framing error, closing connection"
                                    );
                                    break 'conn;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(input = %input, peer = %peer, error = %e, "read error");
                        break;
                    }
                }
            }
            _ = cancel.cancelled() => {
                debug!(input = %input, peer = %peer, "connection handler shutting down");
                break;
            }
        }
    }

    gauge!(m::ACTIVE_CONNECTIONS, m::LABEL_INPUT => input.clone()).decrement(1.0);
}
