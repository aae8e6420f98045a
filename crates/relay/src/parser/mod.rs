//! Syslog 파서 — 와이어 바이트를 [`SyslogRecord`]로 디코딩
//!
//! 형식 감지는 엄격한 순서를 따릅니다:
//!
//! 1. `<PRI>` 뒤에 버전 숫자 `1`과 공백이 오면 RFC 5424
//! 2. `<PRI>`로 시작하면 RFC 3164
//! 3. 그 외에는 permissive: 전체를 본문으로 취급
//!
//! 파서는 프레이밍이 끝난 메시지 한 건을 입력으로 받습니다. 파싱에
//! 실패한 레코드는 호출자(ingress)가 폐기하고 카운터를 증가시킵니다.

mod rfc3164;
mod rfc5424;

use bytes::Bytes;
use logpost_core::{Facility, ParseError, Severity, SyslogRecord, WireFormat};

/// 유효한 최대 PRI 값: facility 23 * 8 + severity 7
const MAX_PRI: u16 = 191;

/// 메시지 한 건을 파싱합니다.
///
/// 끝의 CR/LF는 프레이밍 잔여물로 간주하여 제거합니다. `raw`에는
/// 제거 후의 바이트가 보존됩니다.
pub fn parse(data: &[u8]) -> Result<SyslogRecord, ParseError> {
    let trimmed = trim_trailing_newlines(data);
    if trimmed.is_empty() {
        return Err(ParseError::TruncatedHeader("empty message".to_owned()));
    }

    let raw = Bytes::copy_from_slice(trimmed);
    let text = String::from_utf8_lossy(trimmed);

    if !text.starts_with('<') {
        return Ok(permissive(text.into_owned(), raw));
    }

    let (facility, severity, rest) = parse_priority(&text)?;

    let head = rest.as_bytes();
    if head.len() >= 2 && head[0].is_ascii_digit() && head[1] == b' ' {
        if head[0] == b'1' {
            return rfc5424::parse_message(&rest[2..], facility, severity, raw);
        }
        return Err(ParseError::BadVersion(format!(
            "unsupported syslog version '{}'",
            &rest[..1]
        )));
    }

    Ok(rfc3164::parse_message(rest, facility, severity, raw))
}

/// `<N>` PRI 필드를 파싱하여 facility/severity와 나머지를 반환합니다.
fn parse_priority(text: &str) -> Result<(Facility, Severity, &str), ParseError> {
    let inner = &text[1..];
    let end = inner
        .find('>')
        .ok_or_else(|| ParseError::BadPriority("unterminated PRI field".to_owned()))?;

    let digits = &inner[..end];
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::BadPriority(format!(
            "invalid PRI value '{digits}'"
        )));
    }

    let pri: u16 = digits
        .parse()
        .map_err(|_| ParseError::BadPriority(format!("invalid PRI value '{digits}'")))?;
    if pri > MAX_PRI {
        return Err(ParseError::BadPriority(format!(
            "PRI {pri} out of range 0-{MAX_PRI}"
        )));
    }

    let facility = Facility::from_code((pri / 8) as u8)
        .ok_or_else(|| ParseError::BadPriority(format!("invalid facility in PRI {pri}")))?;
    let severity = Severity::from_code((pri % 8) as u8)
        .ok_or_else(|| ParseError::BadPriority(format!("invalid severity in PRI {pri}")))?;

    Ok((facility, severity, &inner[end + 1..]))
}

/// PRI 없는 메시지를 위한 permissive 레코드를 생성합니다.
fn permissive(message: String, raw: Bytes) -> SyslogRecord {
    SyslogRecord {
        facility: Facility::User,
        severity: Severity::Notice,
        timestamp: None,
        hostname: String::new(),
        app_name: String::new(),
        proc_id: String::new(),
        msg_id: String::new(),
        structured_data: String::new(),
        message,
        raw,
        origin_format: WireFormat::Permissive,
        modified: false,
    }
}

fn trim_trailing_newlines(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && (data[end - 1] == b'\n' || data[end - 1] == b'\r') {
        end -= 1;
    }
    &data[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn detects_rfc5424_by_version_and_space() {
        let record = parse(b"<34>1 2024-01-15T12:00:00Z host app 123 ID47 - hello").unwrap();
        assert_eq!(record.origin_format, WireFormat::Rfc5424);
        assert_eq!(record.facility, Facility::Auth);
        assert_eq!(record.severity, Severity::Crit);
        assert_eq!(record.hostname, "host");
        assert_eq!(record.app_name, "app");
        assert_eq!(record.proc_id, "123");
        assert_eq!(record.msg_id, "ID47");
        assert_eq!(record.message, "hello");
    }

    #[test]
    fn detects_rfc3164_without_version() {
        let record = parse(b"<13>Oct 11 22:14:15 host1 app: hello").unwrap();
        assert_eq!(record.origin_format, WireFormat::Rfc3164);
        assert_eq!(record.hostname, "host1");
        assert_eq!(record.app_name, "app");
        assert_eq!(record.message, "hello");
    }

    #[test]
    fn falls_back_to_permissive_without_pri() {
        let record = parse(b"plain message without priority").unwrap();
        assert_eq!(record.origin_format, WireFormat::Permissive);
        assert_eq!(record.facility, Facility::User);
        assert_eq!(record.severity, Severity::Notice);
        assert!(record.timestamp.is_none());
        assert!(record.hostname.is_empty());
        assert_eq!(record.message, "plain message without priority");
    }

    #[test]
    fn priority_boundaries() {
        assert!(parse(b"<0>1 - - - - - - msg").is_ok());
        let max = parse(b"<191>1 - - - - - - msg").unwrap();
        assert_eq!(max.facility, Facility::Local7);
        assert_eq!(max.severity, Severity::Debug);
        assert!(matches!(
            parse(b"<192>1 - - - - - - msg"),
            Err(ParseError::BadPriority(_))
        ));
    }

    #[test]
    fn non_numeric_priority_is_rejected() {
        assert!(matches!(
            parse(b"<abc>1 hello"),
            Err(ParseError::BadPriority(_))
        ));
        assert!(matches!(
            parse(b"<-1>1 hello"),
            Err(ParseError::BadPriority(_))
        ));
    }

    #[test]
    fn unterminated_priority_is_rejected() {
        assert!(matches!(parse(b"<34"), Err(ParseError::BadPriority(_))));
    }

    #[test]
    fn overlong_priority_digits_rejected() {
        assert!(matches!(
            parse(b"<0034>1 hello"),
            Err(ParseError::BadPriority(_))
        ));
    }

    #[test]
    fn version_other_than_one_is_bad_version() {
        assert!(matches!(
            parse(b"<34>2 2024-01-15T12:00:00Z host app - - - msg"),
            Err(ParseError::BadVersion(_))
        ));
    }

    #[test]
    fn empty_input_is_truncated_header() {
        assert!(matches!(parse(b""), Err(ParseError::TruncatedHeader(_))));
        assert!(matches!(parse(b"\r\n"), Err(ParseError::TruncatedHeader(_))));
    }

    #[test]
    fn trailing_newlines_are_stripped_from_raw() {
        let record = parse(b"<13>Oct 11 22:14:15 h app: hi\r\n").unwrap();
        assert_eq!(&record.raw[..], b"<13>Oct 11 22:14:15 h app: hi");
    }

    #[test]
    fn rfc3164_with_unparseable_date_keeps_body_as_message() {
        let record = parse(b"<13>not a date at all").unwrap();
        assert_eq!(record.origin_format, WireFormat::Rfc3164);
        assert!(record.timestamp.is_none());
        assert!(record.hostname.is_empty());
        assert_eq!(record.message, "not a date at all");
    }

    #[test]
    fn rfc5424_timestamp_fields_are_recovered() {
        let record =
            parse(b"<165>1 2003-10-11T22:14:15.003Z mymachine evntslog - ID47 - An event").unwrap();
        let ts = record.timestamp.unwrap();
        assert_eq!(ts.year(), 2003);
        assert_eq!(ts.second(), 15);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let record = parse(b"<13>Oct 11 22:14:15 h app: bad \xff byte").unwrap();
        assert!(record.message.contains('\u{fffd}'));
    }

    #[test]
    fn permissive_records_never_fail_on_binary_input() {
        let record = parse(&[0xff, 0xfe, 0x01, 0x02]).unwrap();
        assert_eq!(record.origin_format, WireFormat::Permissive);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_arbitrary_bytes_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
                let _ = parse(&bytes);
            }

            #[test]
            fn parse_valid_priority_range(pri in 0u16..=191) {
                let raw = format!("<{pri}>1 2024-01-15T12:00:00Z host app - - - msg");
                let record = parse(raw.as_bytes()).unwrap();
                prop_assert_eq!(u16::from(record.priority()), pri);
            }

            #[test]
            fn parse_out_of_range_priority_fails(pri in 192u16..=999) {
                let raw = format!("<{pri}>1 2024-01-15T12:00:00Z host app - - - msg");
                prop_assert!(parse(raw.as_bytes()).is_err());
            }
        }
    }
}
