//! 릴레이 파이프라인 에러 타입
//!
//! [`RelayError`]는 파이프라인 구성과 실행 중 발생하는 모든 에러를
//! 표현합니다. 와이어 메시지 파싱 에러는 레코드 단위로 소비되므로
//! [`logpost_core::ParseError`]를 그대로 사용하며 여기로 전파되지 않습니다.

use logpost_core::ConfigError;

/// 릴레이 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// 파이프라인 구성 실패 (첫 번째 문제만 보고)
    #[error("pipeline build error: {0}")]
    Build(#[from] ConfigError),

    /// 입력 리스너 에러 (바인드 실패 등)
    #[error("listener error: {input}: {reason}")]
    Listener { input: String, reason: String },

    /// 송신기 에러
    #[error("sender error: {destination}: {reason}")]
    Sender {
        destination: String,
        reason: String,
    },

    /// 생명주기 상태 오류 (이미 실행 중, 실행 전 정지 등)
    #[error("pipeline state error: {0}")]
    State(&'static str),

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
