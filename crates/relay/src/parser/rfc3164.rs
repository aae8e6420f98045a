//! RFC 3164 (BSD syslog) 본문 파싱
//!
//! ```text
//! Mmm dd hh:mm:ss HOSTNAME TAG[PID]: MSG
//! ```
//!
//! 연도가 없으므로 수신 측 로컬 시계로 보충하며, 파싱된 월이 현재보다
//! 한 달 넘게 앞서면 작년으로 간주합니다. 날짜 해석에 실패하면 에러가
//! 아니라 PRI 이후 전체를 본문으로 취급합니다.

use bytes::Bytes;
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, TimeZone};
use logpost_core::{Facility, Severity, SyslogRecord, WireFormat};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `Mmm dd hh:mm:ss ` 헤더의 길이 (마지막 공백 포함)
const TIMESTAMP_LEN: usize = 16;

pub(super) fn parse_message(
    body: &str,
    facility: Facility,
    severity: Severity,
    raw: Bytes,
) -> SyslogRecord {
    let mut record = SyslogRecord {
        facility,
        severity,
        timestamp: None,
        hostname: String::new(),
        app_name: String::new(),
        proc_id: String::new(),
        msg_id: String::new(),
        structured_data: String::new(),
        message: String::new(),
        raw,
        origin_format: WireFormat::Rfc3164,
        modified: false,
    };

    match parse_header(body) {
        Some((timestamp, hostname, app_name, proc_id, message)) => {
            record.timestamp = Some(timestamp);
            record.hostname = hostname;
            record.app_name = app_name;
            record.proc_id = proc_id;
            record.message = message;
        }
        None => {
            // 날짜/호스트 구조가 없으면 본문만 있는 메시지로 취급
            record.message = body.to_owned();
        }
    }

    record
}

#[allow(clippy::type_complexity)]
fn parse_header(body: &str) -> Option<(DateTime<FixedOffset>, String, String, String, String)> {
    if body.len() < TIMESTAMP_LEN || !body.is_char_boundary(TIMESTAMP_LEN) {
        return None;
    }
    let (ts_part, rest) = body.split_at(TIMESTAMP_LEN);
    if !ts_part.is_ascii() || !ts_part.ends_with(' ') {
        return None;
    }

    let timestamp = parse_bsd_timestamp(&ts_part[..TIMESTAMP_LEN - 1])?;

    let (hostname, tag_msg) = rest.split_once(' ')?;
    if hostname.is_empty() {
        return None;
    }

    let (app_name, proc_id, message) = split_tag(tag_msg);
    Some((timestamp, hostname.to_owned(), app_name, proc_id, message))
}

/// `Mmm dd hh:mm:ss`를 파싱합니다. 날짜 자릿수는 공백 패딩을 허용합니다.
fn parse_bsd_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    if !text.is_ascii() {
        return None;
    }
    let bytes = text.as_bytes();
    if bytes.len() != 15 || bytes[3] != b' ' || bytes[6] != b' ' {
        return None;
    }

    let month = MONTHS.iter().position(|m| *m == &text[..3])? as u32 + 1;
    let day: u32 = text[4..6].trim_start().parse().ok()?;

    let time = &text[7..15];
    if time.as_bytes()[2] != b':' || time.as_bytes()[5] != b':' {
        return None;
    }
    let hour: u32 = time[..2].parse().ok()?;
    let minute: u32 = time[3..5].parse().ok()?;
    let second: u32 = time[6..8].parse().ok()?;

    let now = Local::now();
    let year = rollover_year(month, now.month(), now.year());

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(local.fixed_offset())
}

/// 연도 보충 규칙: 파싱된 월이 현재 월보다 한 달 넘게 앞서면 작년.
///
/// 12월 메시지를 1월에 수신하는 연말 경계가 대표적인 경우입니다.
fn rollover_year(parsed_month: u32, current_month: u32, current_year: i32) -> i32 {
    if parsed_month > current_month + 1 {
        current_year - 1
    } else {
        current_year
    }
}

/// `TAG[PID]: MSG` / `TAG: MSG` / `MSG`를 분리합니다.
///
/// 태그는 첫 `:` 또는 `[`까지이며, 그 구조가 없으면 전체가 메시지입니다.
fn split_tag(tag_msg: &str) -> (String, String, String) {
    let whole = || (String::new(), String::new(), tag_msg.to_owned());

    let Some(stop) = tag_msg.find([':', '[']) else {
        return whole();
    };

    let tag = &tag_msg[..stop];
    if tag.is_empty() || tag.contains(' ') {
        return whole();
    }

    if tag_msg.as_bytes()[stop] == b'[' {
        let after = &tag_msg[stop + 1..];
        let Some(close) = after.find(']') else {
            return whole();
        };
        let proc_id = &after[..close];
        let Some(tail) = after[close + 1..].strip_prefix(':') else {
            return whole();
        };
        (
            tag.to_owned(),
            proc_id.to_owned(),
            tail.trim_start().to_owned(),
        )
    } else {
        let tail = &tag_msg[stop + 1..];
        (tag.to_owned(), String::new(), tail.trim_start().to_owned())
    }
}
