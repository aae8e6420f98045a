//! Syslog severity 코드 (RFC 5424 Section 6.2.1)
//!
//! PRI 값의 하위 3비트(`pri % 8`)에 해당하는 severity를 닫힌 enum으로
//! 표현합니다. severity 3은 `err`와 `error` 두 이름을 모두 허용합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Syslog severity (0 = emerg, 7 = debug)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 시스템 사용 불가
    Emerg = 0,
    /// 즉시 조치 필요
    Alert = 1,
    /// 치명적 상태
    Crit = 2,
    /// 에러 상태
    #[serde(alias = "error")]
    Err = 3,
    /// 경고 상태
    Warning = 4,
    /// 정상이지만 주목할 만한 상태
    Notice = 5,
    /// 정보성 메시지
    Info = 6,
    /// 디버그 메시지
    Debug = 7,
}

impl Severity {
    /// 숫자 코드(0-7)를 severity로 변환합니다. 범위를 벗어나면 `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        let severity = match code {
            0 => Severity::Emerg,
            1 => Severity::Alert,
            2 => Severity::Crit,
            3 => Severity::Err,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Info,
            7 => Severity::Debug,
            _ => return None,
        };
        Some(severity)
    }

    /// 숫자 코드(0-7)를 반환합니다.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 표준 소문자 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Emerg => "emerg",
            Severity::Alert => "alert",
            Severity::Crit => "crit",
            Severity::Err => "err",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_roundtrip() {
        for code in 0..=7u8 {
            let severity = Severity::from_code(code).unwrap();
            assert_eq!(severity.code(), code);
        }
    }

    #[test]
    fn from_code_out_of_range() {
        assert!(Severity::from_code(8).is_none());
    }

    #[test]
    fn err_accepts_both_spellings() {
        let short: Severity = serde_yaml::from_str("err").unwrap();
        let long: Severity = serde_yaml::from_str("error").unwrap();
        assert_eq!(short, Severity::Err);
        assert_eq!(long, Severity::Err);
    }

    #[test]
    fn canonical_name_is_err() {
        assert_eq!(Severity::Err.as_str(), "err");
    }

    #[test]
    fn ordering_follows_codes() {
        assert!(Severity::Emerg < Severity::Debug);
    }
}
