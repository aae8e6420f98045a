//! 수신 모듈 — UDP/TCP 리스너와 TCP 프레이밍
//!
//! # 구성
//! - [`UdpInput`]: 데이터그램 하나 = 메시지 하나 (RFC 5426)
//! - [`TcpInput`]: RFC 6587 프레이밍 (octet-counting / non-transparent 자동 감지)
//! - [`framing`]: 소켓 없이 테스트 가능한 프레임 디코더
//!
//! # 아키텍처
//! 각 리스너는 자체 tokio 태스크에서 실행되며, TCP는 연결마다 별도
//! 태스크를 사용합니다. 파싱된 레코드는 도착 순서대로
//! [`Dispatcher`](crate::pipeline::Dispatcher)를 거쳐 라우팅됩니다.

pub mod framing;
pub mod tcp;
pub mod udp;

pub use framing::{FrameDecoder, FramingError};
pub use tcp::TcpInput;
pub use udp::UdpInput;
