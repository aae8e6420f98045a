//! Syslog 레코드 모델 — 파이프라인 단계 간에 전달되는 정규화된 메시지
//!
//! [`SyslogRecord`]는 파서가 생성하고 라우터/트랜스포머를 거쳐 출력으로
//! 전달되는 표준 형식입니다. 원본 와이어 바이트(`raw`)는 레코드의 전체
//! 수명 동안 보존되며, passthrough 직렬화에 사용됩니다.
//!
//! 재직렬화(canonical re-encoding)도 이 모듈이 담당합니다:
//! [`SyslogRecord::to_rfc3164`], [`SyslogRecord::to_rfc5424`],
//! [`SyslogRecord::encode`].

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};

use crate::facility::Facility;
use crate::severity::Severity;

/// 수신 메시지의 원본 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// RFC 5424 (버전 1 헤더)
    Rfc5424,
    /// RFC 3164 (BSD syslog)
    Rfc3164,
    /// PRI 없이 수신된 메시지 전체를 본문으로 취급
    Permissive,
}

impl WireFormat {
    /// 소문자 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            WireFormat::Rfc5424 => "rfc5424",
            WireFormat::Rfc3164 => "rfc3164",
            WireFormat::Permissive => "permissive",
        }
    }
}

/// 출력 직렬화 형식 (destination 설정에서 역직렬화됨)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 항상 RFC 3164로 재직렬화
    Rfc3164,
    /// 항상 RFC 5424로 재직렬화 (기본값)
    #[default]
    Rfc5424,
    /// 변형되지 않은 레코드는 원본 바이트 그대로, 그 외에는 원본 형식으로 재직렬화
    Auto,
}

/// 트랜스포머가 수정할 수 있는 레코드 필드의 닫힌 집합
///
/// `set_fields` / `remove_fields`는 이 enum을 통해서만 디스패치되며,
/// facility/severity/timestamp/raw는 여기 포함되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    /// 호스트명
    Hostname,
    /// 애플리케이션 이름 (RFC 3164의 TAG)
    AppName,
    /// 프로세스 ID
    ProcId,
    /// 메시지 ID (RFC 5424 전용)
    MsgId,
    /// RFC 5424 structured data 블록
    StructuredData,
}

impl EditableField {
    /// 설정에서 쓰이는 snake_case 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            EditableField::Hostname => "hostname",
            EditableField::AppName => "app_name",
            EditableField::ProcId => "proc_id",
            EditableField::MsgId => "msg_id",
            EditableField::StructuredData => "structured_data",
        }
    }
}

/// 정규화된 syslog 레코드
///
/// 빈 문자열은 해당 필드가 없거나 NILVALUE(`-`)였음을 의미합니다.
/// `timestamp`는 파서가 시각을 복원하지 못한 경우 `None`입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct SyslogRecord {
    /// Facility (0-23)
    pub facility: Facility,
    /// Severity (0-7)
    pub severity: Severity,
    /// 타임존이 포함된 수신 시각. 복원 불가 시 `None`.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// 호스트명 (빈 문자열 = 없음)
    pub hostname: String,
    /// 애플리케이션 이름
    pub app_name: String,
    /// 프로세스 ID
    pub proc_id: String,
    /// 메시지 ID
    pub msg_id: String,
    /// 괄호를 포함한 불투명 structured data 문자열
    pub structured_data: String,
    /// 메시지 본문 (BOM 제거 후 UTF-8, 비정상 바이트는 대체 문자)
    pub message: String,
    /// 와이어에서 수신한 원본 바이트. 트랜스포머는 절대 건드리지 않습니다.
    pub raw: Bytes,
    /// 원본 형식
    pub origin_format: WireFormat,
    /// 트랜스포머가 레코드를 실제로 변경했는지 여부
    pub modified: bool,
}

impl SyslogRecord {
    /// PRI 값(`facility * 8 + severity`)을 계산합니다.
    pub fn priority(&self) -> u8 {
        self.facility.code() * 8 + self.severity.code()
    }

    /// 지정한 필드를 덮어씁니다.
    pub fn set_field(&mut self, field: EditableField, value: &str) {
        let slot = self.field_mut(field);
        if slot != value {
            *slot = value.to_owned();
            self.modified = true;
        }
    }

    /// 지정한 필드를 비웁니다.
    pub fn clear_field(&mut self, field: EditableField) {
        let slot = self.field_mut(field);
        if !slot.is_empty() {
            slot.clear();
            self.modified = true;
        }
    }

    fn field_mut(&mut self, field: EditableField) -> &mut String {
        match field {
            EditableField::Hostname => &mut self.hostname,
            EditableField::AppName => &mut self.app_name,
            EditableField::ProcId => &mut self.proc_id,
            EditableField::MsgId => &mut self.msg_id,
            EditableField::StructuredData => &mut self.structured_data,
        }
    }

    /// RFC 3164 형식으로 직렬화합니다.
    ///
    /// `<PRI>Mmm dd hh:mm:ss HOSTNAME TAG[PID]: MESSAGE`
    ///
    /// 타임스탬프는 포워더의 로컬 시간으로 표기하며, 없으면 현재 시각을
    /// 사용합니다. 호스트명이 비어 있으면 `-`, 태그가 비어 있으면 태그와
    /// 콜론을 생략합니다.
    pub fn to_rfc3164(&self) -> Bytes {
        let ts = self
            .timestamp
            .map(|t| t.with_timezone(&Local))
            .unwrap_or_else(Local::now);

        let mut out = format!(
            "<{}>{} ",
            self.priority(),
            ts.format("%b %e %H:%M:%S"),
        );

        if self.hostname.is_empty() {
            out.push('-');
        } else {
            out.push_str(&self.hostname);
        }

        if !self.app_name.is_empty() {
            out.push(' ');
            out.push_str(&self.app_name);
            if !self.proc_id.is_empty() {
                out.push('[');
                out.push_str(&self.proc_id);
                out.push(']');
            }
            out.push(':');
        }

        if !self.message.is_empty() {
            out.push(' ');
            out.push_str(&self.message);
        }

        Bytes::from(out)
    }

    /// RFC 5424 형식으로 직렬화합니다.
    ///
    /// `<PRI>1 TIMESTAMP HOSTNAME APP-NAME PROCID MSGID SD MSG`
    ///
    /// 빈 필드는 NILVALUE(`-`)로 표기합니다. 타임스탬프는 마이크로초
    /// 정밀도의 RFC 3339이며, 본문에 ASCII 이외 문자가 있으면 UTF-8
    /// BOM을 앞에 붙입니다.
    pub fn to_rfc5424(&self) -> Bytes {
        fn nil_or(value: &str) -> &str {
            if value.is_empty() { "-" } else { value }
        }

        let ts = match self.timestamp {
            Some(t) => t.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string(),
            None => "-".to_owned(),
        };

        let mut out = format!(
            "<{}>1 {} {} {} {} {} {}",
            self.priority(),
            ts,
            nil_or(&self.hostname),
            nil_or(&self.app_name),
            nil_or(&self.proc_id),
            nil_or(&self.msg_id),
            nil_or(&self.structured_data),
        );

        if !self.message.is_empty() {
            out.push(' ');
            if !self.message.is_ascii() {
                out.push('\u{feff}');
            }
            out.push_str(&self.message);
        }

        Bytes::from(out)
    }

    /// 대상 형식에 맞춰 직렬화합니다.
    ///
    /// `Auto`는 트랜스포머가 레코드를 변경하지 않은 경우에만 `raw`를
    /// 그대로 내보내고, 변경된 경우 원본 형식으로 재직렬화합니다.
    /// permissive 원본은 RFC 3164로 재직렬화됩니다.
    pub fn encode(&self, format: OutputFormat) -> Bytes {
        match format {
            OutputFormat::Rfc3164 => self.to_rfc3164(),
            OutputFormat::Rfc5424 => self.to_rfc5424(),
            OutputFormat::Auto => {
                if !self.modified {
                    self.raw.clone()
                } else {
                    match self.origin_format {
                        WireFormat::Rfc5424 => self.to_rfc5424(),
                        WireFormat::Rfc3164 | WireFormat::Permissive => self.to_rfc3164(),
                    }
                }
            }
        }
    }
}

impl fmt::Display for SyslogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}> {}.{} host={} app={} format={}",
            self.priority(),
            self.facility,
            self.severity,
            if self.hostname.is_empty() { "-" } else { &self.hostname },
            if self.app_name.is_empty() { "-" } else { &self.app_name },
            self.origin_format.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> SyslogRecord {
        SyslogRecord {
            facility: Facility::Auth,
            severity: Severity::Info,
            timestamp: Some(
                FixedOffset::east_opt(0)
                    .unwrap()
                    .with_ymd_and_hms(2024, 10, 11, 22, 14, 15)
                    .unwrap(),
            ),
            hostname: "host1".to_owned(),
            app_name: "sshd".to_owned(),
            proc_id: "1234".to_owned(),
            msg_id: String::new(),
            structured_data: String::new(),
            message: "Failed password for root".to_owned(),
            raw: Bytes::from_static(b"<38>Oct 11 22:14:15 host1 sshd[1234]: Failed password for root"),
            origin_format: WireFormat::Rfc3164,
            modified: false,
        }
    }

    #[test]
    fn priority_combines_facility_and_severity() {
        let record = sample();
        assert_eq!(record.priority(), 4 * 8 + 6);
    }

    #[test]
    fn rfc5424_encoding_fills_nilvalues() {
        let mut record = sample();
        record.msg_id.clear();
        record.structured_data.clear();
        let encoded = record.to_rfc5424();
        let text = std::str::from_utf8(&encoded).unwrap();
        assert!(text.starts_with("<38>1 2024-10-11T22:14:15.000000+00:00 host1 sshd 1234 - - "));
        assert!(text.ends_with("Failed password for root"));
    }

    #[test]
    fn rfc5424_absent_timestamp_is_nil() {
        let mut record = sample();
        record.timestamp = None;
        let encoded = record.to_rfc5424();
        assert!(encoded.starts_with(b"<38>1 - host1 "));
    }

    #[test]
    fn rfc5424_non_ascii_message_gets_bom() {
        let mut record = sample();
        record.message = "auf Wiedersehen ü".to_owned();
        let encoded = record.to_rfc5424();
        let text = std::str::from_utf8(&encoded).unwrap();
        let msg_start = text.find("auf").unwrap();
        assert_eq!(&text[msg_start - 3..msg_start], "\u{feff}");
    }

    #[test]
    fn rfc3164_encoding_with_pid() {
        let record = sample();
        let encoded = record.to_rfc3164();
        let text = std::str::from_utf8(&encoded).unwrap();
        assert!(text.starts_with("<38>"));
        assert!(text.contains(" host1 sshd[1234]: Failed password for root"));
    }

    #[test]
    fn rfc3164_empty_hostname_becomes_dash() {
        let mut record = sample();
        record.hostname.clear();
        record.app_name.clear();
        record.proc_id.clear();
        let text = String::from_utf8(record.to_rfc3164().to_vec()).unwrap();
        assert!(text.contains(" - Failed password for root"));
    }

    #[test]
    fn rfc3164_empty_tag_omits_colon() {
        let mut record = sample();
        record.app_name.clear();
        record.proc_id.clear();
        let text = String::from_utf8(record.to_rfc3164().to_vec()).unwrap();
        assert!(text.contains(" host1 Failed password for root"));
        assert!(!text.contains("]:"));
    }

    #[test]
    fn auto_passes_raw_through_for_untouched_record() {
        let record = sample();
        assert_eq!(record.encode(OutputFormat::Auto), record.raw);
    }

    #[test]
    fn auto_reserializes_modified_record_in_origin_format() {
        let mut record = sample();
        record.set_field(EditableField::Hostname, "rewritten");
        let encoded = record.encode(OutputFormat::Auto);
        assert_ne!(encoded, record.raw);
        assert!(encoded.starts_with(b"<38>")); // rfc3164 재직렬화
        assert!(String::from_utf8(encoded.to_vec())
            .unwrap()
            .contains("rewritten"));
    }

    #[test]
    fn set_field_marks_record_modified() {
        let mut record = sample();
        assert!(!record.modified);
        record.set_field(EditableField::AppName, "relay");
        assert!(record.modified);
        assert_eq!(record.app_name, "relay");
    }

    #[test]
    fn set_field_with_same_value_is_not_a_modification() {
        let mut record = sample();
        record.set_field(EditableField::AppName, "sshd");
        assert!(!record.modified);
    }

    #[test]
    fn clear_field_on_empty_field_is_not_a_modification() {
        let mut record = sample();
        record.clear_field(EditableField::MsgId);
        assert!(!record.modified);
        record.clear_field(EditableField::ProcId);
        assert!(record.modified);
        assert!(record.proc_id.is_empty());
    }

    #[test]
    fn editable_field_names() {
        assert_eq!(EditableField::AppName.as_str(), "app_name");
        let field: EditableField = serde_yaml::from_str("structured_data").unwrap();
        assert_eq!(field, EditableField::StructuredData);
    }

    #[test]
    fn display_is_compact() {
        let record = sample();
        let text = record.to_string();
        assert!(text.contains("auth.info"));
        assert!(text.contains("host=host1"));
    }
}
