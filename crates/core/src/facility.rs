//! Syslog facility 코드 (RFC 5424 Section 6.2.1)
//!
//! PRI 값의 상위 비트(`pri / 8`)에 해당하는 facility를 닫힌 enum으로 표현합니다.
//! 설정 파일과 메트릭 레이블에서는 소문자 이름(`kern`, `auth`, `local0` 등)을
//! 사용합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Syslog facility (0-23)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facility {
    /// 커널 메시지
    Kern = 0,
    /// 사용자 레벨 메시지
    User = 1,
    /// 메일 시스템
    Mail = 2,
    /// 시스템 데몬
    Daemon = 3,
    /// 보안/인증 메시지
    Auth = 4,
    /// syslogd 내부 메시지
    Syslog = 5,
    /// 프린터 서브시스템
    Lpr = 6,
    /// 네트워크 뉴스
    News = 7,
    /// UUCP 서브시스템
    Uucp = 8,
    /// 스케줄러 (cron)
    Cron = 9,
    /// 보안/인증 메시지 (private)
    Authpriv = 10,
    /// FTP 데몬
    Ftp = 11,
    /// NTP 서브시스템
    Ntp = 12,
    /// 로그 감사
    Audit = 13,
    /// 로그 알림
    Alert = 14,
    /// 클럭 데몬
    Clock = 15,
    /// 로컬 사용 0
    Local0 = 16,
    /// 로컬 사용 1
    Local1 = 17,
    /// 로컬 사용 2
    Local2 = 18,
    /// 로컬 사용 3
    Local3 = 19,
    /// 로컬 사용 4
    Local4 = 20,
    /// 로컬 사용 5
    Local5 = 21,
    /// 로컬 사용 6
    Local6 = 22,
    /// 로컬 사용 7
    Local7 = 23,
}

impl Facility {
    /// 숫자 코드(0-23)를 facility로 변환합니다. 범위를 벗어나면 `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        let facility = match code {
            0 => Facility::Kern,
            1 => Facility::User,
            2 => Facility::Mail,
            3 => Facility::Daemon,
            4 => Facility::Auth,
            5 => Facility::Syslog,
            6 => Facility::Lpr,
            7 => Facility::News,
            8 => Facility::Uucp,
            9 => Facility::Cron,
            10 => Facility::Authpriv,
            11 => Facility::Ftp,
            12 => Facility::Ntp,
            13 => Facility::Audit,
            14 => Facility::Alert,
            15 => Facility::Clock,
            16 => Facility::Local0,
            17 => Facility::Local1,
            18 => Facility::Local2,
            19 => Facility::Local3,
            20 => Facility::Local4,
            21 => Facility::Local5,
            22 => Facility::Local6,
            23 => Facility::Local7,
            _ => return None,
        };
        Some(facility)
    }

    /// 숫자 코드(0-23)를 반환합니다.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 표준 소문자 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::Authpriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Ntp => "ntp",
            Facility::Audit => "audit",
            Facility::Alert => "alert",
            Facility::Clock => "clock",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_roundtrip() {
        for code in 0..=23u8 {
            let facility = Facility::from_code(code).unwrap();
            assert_eq!(facility.code(), code);
        }
    }

    #[test]
    fn from_code_out_of_range() {
        assert!(Facility::from_code(24).is_none());
        assert!(Facility::from_code(255).is_none());
    }

    #[test]
    fn names_match_standard_vocabulary() {
        assert_eq!(Facility::Kern.as_str(), "kern");
        assert_eq!(Facility::Auth.as_str(), "auth");
        assert_eq!(Facility::Clock.as_str(), "clock");
        assert_eq!(Facility::Local7.as_str(), "local7");
    }

    #[test]
    fn deserializes_from_lowercase_name() {
        let facility: Facility = serde_yaml::from_str("auth").unwrap();
        assert_eq!(facility, Facility::Auth);
    }

    #[test]
    fn unknown_name_fails_deserialization() {
        let result: Result<Facility, _> = serde_yaml::from_str("nonsense");
        assert!(result.is_err());
    }
}
