//! 필터 조건 평가 — 절 단위 매칭과 정규식 캐싱
//!
//! 하나의 필터가 가진 조건 절(facility, severity, hostname_pattern,
//! message_pattern)은 AND로 결합됩니다. 생략된 절은 항상 참이며,
//! 정규식 패턴은 구성 시점에 컴파일하여 매칭 시 재컴파일이 없습니다.

use std::collections::HashSet;

use regex::Regex;

use logpost_core::{Facility, FilterMatch, Severity, SyslogRecord};

/// 컴파일된 필터 조건
pub struct RulePredicate {
    facilities: Option<HashSet<Facility>>,
    severities: Option<HashSet<Severity>>,
    hostname_pattern: Option<Regex>,
    message_pattern: Option<Regex>,
}

impl RulePredicate {
    /// 조건 블록을 컴파일합니다. 정규식 오류는 그대로 전파됩니다.
    pub fn compile(matcher: &FilterMatch) -> Result<Self, regex::Error> {
        let hostname_pattern = matcher
            .hostname_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()?;
        let message_pattern = matcher
            .message_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()?;

        Ok(Self {
            facilities: matcher
                .facility
                .as_ref()
                .map(|list| list.iter().copied().collect()),
            severities: matcher
                .severity
                .as_ref()
                .map(|list| list.iter().copied().collect()),
            hostname_pattern,
            message_pattern,
        })
    }

    /// 모든 절이 레코드에 매칭되는지 평가합니다.
    pub fn matches(&self, record: &SyslogRecord) -> bool {
        if let Some(facilities) = &self.facilities {
            if !facilities.contains(&record.facility) {
                return false;
            }
        }

        if let Some(severities) = &self.severities {
            if !severities.contains(&record.severity) {
                return false;
            }
        }

        if let Some(pattern) = &self.hostname_pattern {
            // hostname 절이 있는데 레코드에 hostname이 없으면 매칭 실패
            if record.hostname.is_empty() || !pattern.is_match(&record.hostname) {
                return false;
            }
        }

        if let Some(pattern) = &self.message_pattern {
            if !pattern.is_match(&record.message) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use logpost_core::WireFormat;

    fn sample_record() -> SyslogRecord {
        SyslogRecord {
            facility: Facility::Auth,
            severity: Severity::Warning,
            timestamp: None,
            hostname: "web-server-01".to_owned(),
            app_name: "sshd".to_owned(),
            proc_id: "5678".to_owned(),
            msg_id: String::new(),
            structured_data: String::new(),
            message: "Failed password for root from 192.168.1.100 port 22".to_owned(),
            raw: Bytes::from_static(b"raw"),
            origin_format: WireFormat::Rfc3164,
            modified: false,
        }
    }

    fn compile(matcher: FilterMatch) -> RulePredicate {
        RulePredicate::compile(&matcher).unwrap()
    }

    #[test]
    fn empty_match_block_matches_everything() {
        let predicate = compile(FilterMatch::default());
        assert!(predicate.matches(&sample_record()));
    }

    #[test]
    fn facility_set_matches() {
        let predicate = compile(FilterMatch {
            facility: Some(vec![Facility::Auth, Facility::Authpriv]),
            ..Default::default()
        });
        assert!(predicate.matches(&sample_record()));
    }

    #[test]
    fn facility_set_mismatch() {
        let predicate = compile(FilterMatch {
            facility: Some(vec![Facility::Mail]),
            ..Default::default()
        });
        assert!(!predicate.matches(&sample_record()));
    }

    #[test]
    fn severity_set_matches() {
        let predicate = compile(FilterMatch {
            severity: Some(vec![Severity::Warning, Severity::Err]),
            ..Default::default()
        });
        assert!(predicate.matches(&sample_record()));
    }

    #[test]
    fn hostname_pattern_searches_anywhere() {
        let predicate = compile(FilterMatch {
            hostname_pattern: Some("server-[0-9]+".to_owned()),
            ..Default::default()
        });
        assert!(predicate.matches(&sample_record()));
    }

    #[test]
    fn hostname_pattern_against_empty_hostname_fails() {
        let predicate = compile(FilterMatch {
            hostname_pattern: Some(".*".to_owned()),
            ..Default::default()
        });
        let mut record = sample_record();
        record.hostname.clear();
        assert!(!predicate.matches(&record));
    }

    #[test]
    fn message_pattern_searches_anywhere() {
        let predicate = compile(FilterMatch {
            message_pattern: Some(r"Failed password.*root".to_owned()),
            ..Default::default()
        });
        assert!(predicate.matches(&sample_record()));
    }

    #[test]
    fn clauses_combine_with_and() {
        let predicate = compile(FilterMatch {
            facility: Some(vec![Facility::Auth]),
            message_pattern: Some("no such text".to_owned()),
            ..Default::default()
        });
        assert!(!predicate.matches(&sample_record()));
    }

    #[test]
    fn invalid_regex_fails_compilation() {
        let result = RulePredicate::compile(&FilterMatch {
            message_pattern: Some("[unclosed".to_owned()),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
