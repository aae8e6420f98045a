//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `syslog_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 수신 프로토콜 레이블 키 (udp, tcp)
pub const LABEL_PROTOCOL: &str = "protocol";

/// Facility 레이블 키 (kern, user, auth, ...)
pub const LABEL_FACILITY: &str = "facility";

/// Severity 레이블 키 (emerg ... debug)
pub const LABEL_SEVERITY: &str = "severity";

/// 전달 대상 레이블 키
pub const LABEL_DESTINATION: &str = "destination";

/// 드롭 사유 레이블 키
pub const LABEL_REASON: &str = "reason";

/// 입력 리스너 레이블 키
pub const LABEL_INPUT: &str = "input";

/// 매칭된 필터 레이블 키
pub const LABEL_FILTER: &str = "filter";

// ─── 드롭 사유 값 ──────────────────────────────────────────────────

/// drop action을 가진 필터에 매칭됨
pub const REASON_FILTER: &str = "filter";

/// 어떤 필터에도 매칭되지 않음
pub const REASON_NO_MATCH: &str = "no_match";

/// 파싱 실패
pub const REASON_PARSE_ERROR: &str = "parse_error";

/// 재전송 소진 또는 UDP 송신 실패
pub const REASON_SEND_FAILED: &str = "send_failed";

// ─── 메트릭 이름 ───────────────────────────────────────────────────

/// 수신 후 파싱에 성공한 메시지 수 (counter, labels: protocol/facility/severity)
pub const MESSAGES_RECEIVED_TOTAL: &str = "syslog_messages_received_total";

/// 전달에 성공한 메시지 수 (counter, label: destination)
pub const MESSAGES_FORWARDED_TOTAL: &str = "syslog_messages_forwarded_total";

/// 드롭된 메시지 수 (counter, label: reason)
pub const MESSAGES_DROPPED_TOTAL: &str = "syslog_messages_dropped_total";

/// 파싱 실패 수 (counter, label: protocol)
pub const MESSAGES_PARSE_ERRORS_TOTAL: &str = "syslog_messages_parse_errors_total";

/// 대상 연결 상태 (gauge, 1=연결됨, label: destination)
pub const DESTINATION_UP: &str = "syslog_destination_up";

/// 활성 TCP 수신 연결 수 (gauge, label: input)
pub const ACTIVE_CONNECTIONS: &str = "syslog_active_connections";

/// 레코드당 라우터 평가 시간 (histogram, 초, label: filter)
pub const PROCESSING_LATENCY_SECONDS: &str = "syslog_processing_latency_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 라우터 평가 지연 시간 히스토그램 버킷 (초)
///
/// 100us ~ 100ms 범위, 로그 단위 분포
pub const PROCESSING_LATENCY_BUCKETS: [f64; 7] =
    [0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다. 일반적으로
/// `logpost-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        MESSAGES_RECEIVED_TOTAL,
        "Total number of syslog messages received and parsed"
    );
    describe_counter!(
        MESSAGES_FORWARDED_TOTAL,
        "Total number of syslog messages forwarded per destination"
    );
    describe_counter!(
        MESSAGES_DROPPED_TOTAL,
        "Total number of syslog messages dropped, by reason"
    );
    describe_counter!(
        MESSAGES_PARSE_ERRORS_TOTAL,
        "Total number of message parse errors per ingress protocol"
    );
    describe_gauge!(
        DESTINATION_UP,
        "Whether a destination is reachable (1=up, 0=down)"
    );
    describe_gauge!(
        ACTIVE_CONNECTIONS,
        "Number of active TCP ingress connections per input"
    );
    describe_histogram!(
        PROCESSING_LATENCY_SECONDS,
        "Router evaluation time per record in seconds"
    );
}
