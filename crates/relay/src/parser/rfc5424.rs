//! RFC 5424 본문 파싱
//!
//! PRI와 버전은 상위 모듈이 소비한 뒤, 남은 본문을 이 모듈이 처리합니다:
//!
//! ```text
//! TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA MSG
//! ```
//!
//! 다섯 개 헤더 필드는 각각 NILVALUE(`-`)일 수 있습니다. SD는 괄호
//! 균형과 인용 문자열 이스케이프만 확인하는 어휘적(lexical) 파싱으로
//! 불투명 문자열로 보존됩니다.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use logpost_core::{Facility, ParseError, Severity, SyslogRecord, WireFormat};

pub(super) fn parse_message(
    body: &str,
    facility: Facility,
    severity: Severity,
    raw: Bytes,
) -> Result<SyslogRecord, ParseError> {
    let mut rest = body;

    let timestamp = parse_timestamp(next_token(&mut rest, "timestamp")?);
    let hostname = nil_to_empty(next_token(&mut rest, "hostname")?);
    let app_name = nil_to_empty(next_token(&mut rest, "app-name")?);
    let proc_id = nil_to_empty(next_token(&mut rest, "procid")?);
    let msg_id = nil_to_empty(next_token(&mut rest, "msgid")?);

    let (structured_data, message) = parse_sd_and_message(rest)?;

    Ok(SyslogRecord {
        facility,
        severity,
        timestamp,
        hostname: hostname.to_owned(),
        app_name: app_name.to_owned(),
        proc_id: proc_id.to_owned(),
        msg_id: msg_id.to_owned(),
        structured_data,
        message,
        raw,
        origin_format: WireFormat::Rfc5424,
        modified: false,
    })
}

/// 단일 공백으로 구분된 다음 토큰을 소비합니다.
fn next_token<'a>(rest: &mut &'a str, field: &'static str) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::TruncatedHeader(format!("missing {field}")));
    }
    let token = match rest.split_once(' ') {
        Some((token, tail)) => {
            *rest = tail;
            token
        }
        None => {
            let token = *rest;
            *rest = "";
            token
        }
    };
    if token.is_empty() {
        return Err(ParseError::TruncatedHeader(format!("empty {field}")));
    }
    Ok(token)
}

fn nil_to_empty(token: &str) -> &str {
    if token == "-" { "" } else { token }
}

/// RFC 3339 타임스탬프를 파싱합니다. `-` 또는 해석 불가 값은 `None`.
fn parse_timestamp(token: &str) -> Option<DateTime<FixedOffset>> {
    if token == "-" {
        return None;
    }
    DateTime::parse_from_rfc3339(token).ok()
}

/// SD 블록과 메시지를 분리합니다.
///
/// SD는 `-` 또는 하나 이상의 `[...]` 요소입니다. 닫히지 않은 괄호나
/// 요소 뒤에 공백 아닌 문자가 오면 malformed로 보고합니다.
fn parse_sd_and_message(rest: &str) -> Result<(String, String), ParseError> {
    if rest.is_empty() {
        return Err(ParseError::TruncatedHeader(
            "missing structured data".to_owned(),
        ));
    }

    if let Some(after) = rest.strip_prefix('-') {
        return match after.strip_prefix(' ') {
            Some(msg) => Ok((String::new(), strip_bom(msg).to_owned())),
            None if after.is_empty() => Ok((String::new(), String::new())),
            None => Err(ParseError::MalformedStructuredData(
                "expected space after nilvalue".to_owned(),
            )),
        };
    }

    if !rest.starts_with('[') {
        return Err(ParseError::MalformedStructuredData(format!(
            "unexpected structured data start '{}'",
            rest.chars().next().unwrap_or(' ')
        )));
    }

    let sd_end = scan_sd_elements(rest)?;
    let sd = rest[..sd_end].to_owned();
    let tail = &rest[sd_end..];

    match tail.strip_prefix(' ') {
        Some(msg) => Ok((sd, strip_bom(msg).to_owned())),
        None if tail.is_empty() => Ok((sd, String::new())),
        None => Err(ParseError::MalformedStructuredData(
            "expected space between structured data and message".to_owned(),
        )),
    }
}

/// 연속된 SD 요소들의 끝 인덱스를 찾습니다.
///
/// 인용 문자열 내부에서는 `\`가 다음 문자를 이스케이프하며, 괄호는
/// 인용 밖에서만 깊이에 반영됩니다.
fn scan_sd_elements(input: &str) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    let mut iter = input.char_indices().peekable();

    while let Some((idx, ch)) = iter.next() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            '[' if !in_quote => depth += 1,
            ']' if !in_quote => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ParseError::MalformedStructuredData("unbalanced ']'".to_owned())
                })?;
                if depth == 0 {
                    // 다음 요소가 바로 이어지면 계속 스캔
                    if !matches!(iter.peek(), Some((_, '['))) {
                        return Ok(idx + ch.len_utf8());
                    }
                }
            }
            _ => {}
        }
    }

    Err(ParseError::MalformedStructuredData(
        "unclosed structured data element".to_owned(),
    ))
}

fn strip_bom(message: &str) -> &str {
    message.strip_prefix('\u{feff}').unwrap_or(message)
}
