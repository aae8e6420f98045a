//! 설정 스냅샷 — YAML 로딩, 환경 변수 치환, 참조 검증
//!
//! 파이프라인은 이 모듈이 만들어 낸 검증 완료 스냅샷만 소비합니다.
//! 스냅샷은 `inputs[]`, `destinations[]`, `transforms[]`, `filters[]`와
//! `service` 블록으로 구성되며, 실행 중에는 불변입니다. 설정 변경은
//! 새 파이프라인을 구성하는 방식으로만 반영됩니다.
//!
//! `${VAR}` / `${VAR:-default}` 치환은 YAML 파싱 전에 수행됩니다.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::facility::Facility;
use crate::record::{EditableField, OutputFormat};
use crate::severity::Severity;

/// 입출력 네트워크 프로토콜
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// UDP (RFC 5426)
    #[default]
    Udp,
    /// TCP (RFC 6587)
    Tcp,
}

impl Protocol {
    /// 메트릭 레이블로 쓰이는 소문자 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Udp => "udp",
            Protocol::Tcp => "tcp",
        }
    }
}

/// 필터의 action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// 지정한 destination으로 전달 (기본값)
    #[default]
    Forward,
    /// 레코드 폐기
    Drop,
}

fn default_listen_address() -> String {
    "0.0.0.0:514".to_owned()
}

fn default_max_message_size() -> usize {
    1024 * 1024 // 1MB
}

/// 입력 리스너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// 고유 이름 (메트릭 레이블 `input`에 사용)
    pub name: String,
    /// 수신 프로토콜
    #[serde(default)]
    pub protocol: Protocol,
    /// 바인드 주소 (`host:port`)
    #[serde(default = "default_listen_address")]
    pub address: String,
    /// TCP 프레임당 최대 크기 (바이트). 초과 시 해당 연결을 닫습니다.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// 필터 매칭 조건 — 모든 절이 AND로 결합됩니다.
///
/// 생략된 절은 항상 참으로 평가되며, 조건 블록이 아예 없는 필터는
/// 모든 레코드에 매칭되는 catch-all입니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterMatch {
    /// 이 facility 집합에 속하면 매칭
    #[serde(default)]
    pub facility: Option<Vec<Facility>>,
    /// 이 severity 집합에 속하면 매칭
    #[serde(default)]
    pub severity: Option<Vec<Severity>>,
    /// hostname에서 찾을 정규식
    #[serde(default)]
    pub hostname_pattern: Option<String>,
    /// message에서 찾을 정규식
    #[serde(default)]
    pub message_pattern: Option<String>,
}

/// 필터 규칙 — 순서대로 평가되며 첫 매칭이 결과를 결정합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 고유 이름
    pub name: String,
    /// 매칭 조건 (없으면 catch-all)
    #[serde(default, rename = "match")]
    pub matcher: Option<FilterMatch>,
    /// forward 또는 drop
    #[serde(default)]
    pub action: Action,
    /// 전달할 destination 이름 목록 (선언 순서 유지)
    #[serde(default)]
    pub destinations: Vec<String>,
    /// 전달 전에 적용할 transform 이름 목록 (선언 순서 유지)
    #[serde(default)]
    pub transforms: Vec<String>,
}

/// 메시지 본문 정규식 치환 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceConfig {
    /// 찾을 정규식
    pub pattern: String,
    /// 치환 문자열 (`\1`-`\9` 역참조 지원)
    #[serde(default)]
    pub replacement: String,
}

fn default_mask_replacement() -> String {
    "***MASKED***".to_owned()
}

/// 민감 정보 마스킹 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskConfig {
    /// 마스킹 대상 정규식
    pub pattern: String,
    /// 치환 문자열 (`\1`-`\9` 역참조 지원)
    #[serde(default = "default_mask_replacement")]
    pub replacement: String,
}

/// 메시지 변형 설정
///
/// 하나의 transform 안에서 연산은 고정된 순서로 적용됩니다:
/// remove_fields -> set_fields -> message_replace -> mask_patterns ->
/// message_prefix/message_suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// 고유 이름
    pub name: String,
    /// 이 정규식이 message에 매칭될 때만 transform을 적용
    #[serde(default)]
    pub match_pattern: Option<String>,
    /// 비울 필드 목록
    #[serde(default)]
    pub remove_fields: Vec<EditableField>,
    /// 덮어쓸 필드와 리터럴 값
    #[serde(default)]
    pub set_fields: BTreeMap<EditableField, String>,
    /// 메시지 본문 정규식 치환
    #[serde(default)]
    pub message_replace: Option<ReplaceConfig>,
    /// 순서대로 적용되는 마스킹 패턴 목록
    #[serde(default)]
    pub mask_patterns: Vec<MaskConfig>,
    /// 메시지 앞에 붙일 문자열
    #[serde(default)]
    pub message_prefix: Option<String>,
    /// 메시지 뒤에 붙일 문자열
    #[serde(default)]
    pub message_suffix: Option<String>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_seconds() -> f64 {
    1.0
}

/// 재전송 정책
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 메시지당 최대 시도 횟수 (1-10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 지수 백오프의 기본 간격 (초, 0.1-60)
    #[serde(default = "default_backoff_seconds")]
    pub backoff_seconds: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_seconds: default_backoff_seconds(),
        }
    }
}

fn default_timeout_seconds() -> f64 {
    5.0
}

/// 전달 대상 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// 고유 이름 (메트릭 레이블 `destination`에 사용)
    pub name: String,
    /// 송신 프로토콜
    #[serde(default)]
    pub protocol: Protocol,
    /// 대상 주소 (`host:port`)
    pub address: String,
    /// 출력 직렬화 형식
    #[serde(default)]
    pub format: OutputFormat,
    /// 재전송 정책 (TCP 전용; UDP는 단발 송신)
    #[serde(default)]
    pub retry: RetryConfig,
    /// TCP 연결/쓰기 타임아웃 (초)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_address() -> String {
    "0.0.0.0:9090".to_owned()
}

fn default_metrics_required() -> bool {
    true
}

/// 관측 엔드포인트 설정 (`/metrics`, `/health`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 엔드포인트 활성화 여부
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    /// 바인드 주소 (`host:port`)
    #[serde(default = "default_metrics_address")]
    pub address: String,
    /// true면 바인드 실패가 치명적 에러
    #[serde(default = "default_metrics_required")]
    pub required: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            address: default_metrics_address(),
            required: default_metrics_required(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "json".to_owned()
}

/// 서비스 수준 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// 관측 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_version() -> String {
    "1".to_owned()
}

/// 루트 설정 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 스키마 버전
    #[serde(default = "default_version")]
    pub version: String,
    /// 입력 리스너 목록
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
    /// 메시지 변형 목록
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
    /// 필터 규칙 목록 (선언 순서 = 평가 순서)
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    /// 전달 대상 목록
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
    /// 서비스 설정
    #[serde(default)]
    pub service: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            inputs: Vec::new(),
            transforms: Vec::new(),
            filters: Vec::new(),
            destinations: Vec::new(),
            service: ServiceConfig::default(),
        }
    }
}

impl Config {
    /// 설정 전체의 유효성을 검증합니다.
    ///
    /// 첫 번째로 발견된 문제를 담은 에러를 반환합니다. 검증 항목:
    /// 주소 형식, 재전송 한계, 네임스페이스별 이름 중복, 필터의
    /// destination/transform 참조, 모든 정규식의 컴파일 가능 여부.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for input in &self.inputs {
            // 입력은 포트 0(임시 포트 할당)을 허용
            validate_bind_address(&format!("inputs.{}.address", input.name), &input.address)?;
            if input.max_message_size == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("inputs.{}.max_message_size", input.name),
                    reason: "must be greater than 0".to_owned(),
                });
            }
        }

        for dest in &self.destinations {
            validate_address(
                &format!("destinations.{}.address", dest.name),
                &dest.address,
            )?;
            if !(1..=10).contains(&dest.retry.max_attempts) {
                return Err(ConfigError::InvalidValue {
                    field: format!("destinations.{}.retry.max_attempts", dest.name),
                    reason: "must be 1-10".to_owned(),
                });
            }
            if !(0.1..=60.0).contains(&dest.retry.backoff_seconds) {
                return Err(ConfigError::InvalidValue {
                    field: format!("destinations.{}.retry.backoff_seconds", dest.name),
                    reason: "must be 0.1-60".to_owned(),
                });
            }
            if dest.timeout_seconds <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("destinations.{}.timeout_seconds", dest.name),
                    reason: "must be greater than 0".to_owned(),
                });
            }
        }

        check_unique("input", self.inputs.iter().map(|i| i.name.as_str()))?;
        check_unique("destination", self.destinations.iter().map(|d| d.name.as_str()))?;
        check_unique("transform", self.transforms.iter().map(|t| t.name.as_str()))?;
        check_unique("filter", self.filters.iter().map(|f| f.name.as_str()))?;

        let dest_names: HashSet<&str> =
            self.destinations.iter().map(|d| d.name.as_str()).collect();
        let transform_names: HashSet<&str> =
            self.transforms.iter().map(|t| t.name.as_str()).collect();

        for filter in &self.filters {
            match filter.action {
                Action::Forward => {
                    if filter.destinations.is_empty() {
                        return Err(ConfigError::InvalidValue {
                            field: format!("filters.{}.destinations", filter.name),
                            reason: "filter with 'forward' action must specify destinations"
                                .to_owned(),
                        });
                    }
                }
                Action::Drop => {
                    if !filter.destinations.is_empty() {
                        return Err(ConfigError::InvalidValue {
                            field: format!("filters.{}.destinations", filter.name),
                            reason: "filter with 'drop' action must not have destinations"
                                .to_owned(),
                        });
                    }
                }
            }

            for dest in &filter.destinations {
                if !dest_names.contains(dest.as_str()) {
                    return Err(ConfigError::UnknownReference {
                        filter: filter.name.clone(),
                        kind: "destination",
                        name: dest.clone(),
                    });
                }
            }
            for transform in &filter.transforms {
                if !transform_names.contains(transform.as_str()) {
                    return Err(ConfigError::UnknownReference {
                        filter: filter.name.clone(),
                        kind: "transform",
                        name: transform.clone(),
                    });
                }
            }

            if let Some(matcher) = &filter.matcher {
                if let Some(pattern) = &matcher.hostname_pattern {
                    validate_regex(
                        &format!("filter '{}' hostname_pattern", filter.name),
                        pattern,
                    )?;
                }
                if let Some(pattern) = &matcher.message_pattern {
                    validate_regex(
                        &format!("filter '{}' message_pattern", filter.name),
                        pattern,
                    )?;
                }
            }
        }

        for transform in &self.transforms {
            if let Some(pattern) = &transform.match_pattern {
                validate_regex(
                    &format!("transform '{}' match_pattern", transform.name),
                    pattern,
                )?;
            }
            if let Some(replace) = &transform.message_replace {
                validate_regex(
                    &format!("transform '{}' message_replace", transform.name),
                    &replace.pattern,
                )?;
            }
            for (idx, mask) in transform.mask_patterns.iter().enumerate() {
                validate_regex(
                    &format!("transform '{}' mask_patterns[{}]", transform.name, idx),
                    &mask.pattern,
                )?;
            }
        }

        Ok(())
    }
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                kind,
                name: name.to_owned(),
            });
        }
    }
    Ok(())
}

fn validate_address(field: &str, address: &str) -> Result<(), ConfigError> {
    match split_address(field, address)? {
        0 => Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: "port must be 1-65535".to_owned(),
        }),
        _ => Ok(()),
    }
}

fn validate_bind_address(field: &str, address: &str) -> Result<(), ConfigError> {
    split_address(field, address).map(|_| ())
}

fn split_address(field: &str, address: &str) -> Result<u16, ConfigError> {
    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: "address must be in 'host:port' form".to_owned(),
        });
    };
    if host.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: "host must not be empty".to_owned(),
        });
    }
    port.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: format!("invalid port '{port}'"),
    })
}

fn validate_regex(context: &str, pattern: &str) -> Result<(), ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
        context: context.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// `${VAR}` / `${VAR:-default}` 패턴을 환경 변수 값으로 치환합니다.
///
/// 변수가 없고 기본값도 없으면 원문을 그대로 유지합니다.
pub fn substitute_env_vars(content: &str) -> String {
    static ENV_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = ENV_PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("environment variable pattern is a valid regex")
    });

    pattern
        .replace_all(content, |caps: &regex::Captures<'_>| {
            match std::env::var(&caps[1]) {
                Ok(value) => value,
                Err(_) => match caps.get(2) {
                    Some(default) => default.as_str().to_owned(),
                    None => caps[0].to_owned(),
                },
            }
        })
        .into_owned()
}

/// YAML 설정 파일을 읽어 검증된 스냅샷을 반환합니다.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            ConfigError::ParseFailed {
                reason: format!("failed to read {}: {}", path.display(), e),
            }
        }
    })?;

    let config = parse_config(&content)?;
    config.validate()?;
    Ok(config)
}

/// YAML 문자열을 설정으로 파싱합니다 (환경 변수 치환 포함, 검증 제외).
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let content = substitute_env_vars(content);
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: "1"
inputs:
  - name: udp-in
    protocol: udp
    address: "0.0.0.0:5514"
  - name: tcp-in
    protocol: tcp
    address: "0.0.0.0:6601"
transforms:
  - name: mask-password
    mask_patterns:
      - pattern: '(password)=\S+'
        replacement: '\1=***'
filters:
  - name: drop-debug
    match:
      severity: [debug]
    action: drop
  - name: auth-to-siem
    match:
      facility: [auth, authpriv]
    destinations: [siem]
    transforms: [mask-password]
  - name: catch-all
    destinations: [central]
destinations:
  - name: siem
    protocol: tcp
    address: "siem.example.com:6514"
    format: rfc5424
  - name: central
    protocol: udp
    address: "10.0.0.1:514"
    format: rfc3164
service:
  log_level: info
  metrics:
    enabled: true
    address: "127.0.0.1:9090"
"#;

    #[test]
    fn sample_config_parses_and_validates() {
        let config = parse_config(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.filters.len(), 3);
        assert_eq!(config.destinations.len(), 2);
        assert_eq!(config.inputs[1].protocol, Protocol::Tcp);
        assert_eq!(config.filters[0].action, Action::Drop);
        assert!(config.filters[2].matcher.is_none());
    }

    #[test]
    fn empty_content_yields_default_config() {
        let config = parse_config("").unwrap();
        assert!(config.inputs.is_empty());
        assert_eq!(config.version, "1");
        assert!(config.service.metrics.enabled);
    }

    #[test]
    fn severity_error_alias_accepted_in_filter() {
        let yaml = r#"
filters:
  - name: errors
    match:
      severity: [error, crit]
    destinations: [d]
destinations:
  - name: d
    address: "127.0.0.1:514"
"#;
        let config = parse_config(yaml).unwrap();
        config.validate().unwrap();
        let matcher = config.filters[0].matcher.as_ref().unwrap();
        assert_eq!(
            matcher.severity.as_ref().unwrap(),
            &vec![Severity::Err, Severity::Crit]
        );
    }

    #[test]
    fn duplicate_destination_name_rejected() {
        let yaml = r#"
destinations:
  - name: d
    address: "127.0.0.1:514"
  - name: d
    address: "127.0.0.1:515"
"#;
        let config = parse_config(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { kind: "destination", .. }));
    }

    #[test]
    fn unknown_destination_reference_rejected() {
        let yaml = r#"
filters:
  - name: f
    destinations: [nowhere]
"#;
        let config = parse_config(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownReference { kind: "destination", .. }
        ));
    }

    #[test]
    fn unknown_transform_reference_rejected() {
        let yaml = r#"
filters:
  - name: f
    destinations: [d]
    transforms: [missing]
destinations:
  - name: d
    address: "127.0.0.1:514"
"#;
        let config = parse_config(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownReference { kind: "transform", .. }
        ));
    }

    #[test]
    fn invalid_filter_regex_rejected() {
        let yaml = r#"
filters:
  - name: f
    match:
      message_pattern: "[unclosed"
    destinations: [d]
destinations:
  - name: d
    address: "127.0.0.1:514"
"#;
        let config = parse_config(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { .. }));
    }

    #[test]
    fn invalid_mask_regex_rejected() {
        let yaml = r#"
transforms:
  - name: t
    mask_patterns:
      - pattern: "(broken"
"#;
        let config = parse_config(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { .. }));
    }

    #[test]
    fn forward_filter_without_destinations_rejected() {
        let yaml = r#"
filters:
  - name: f
"#;
        let config = parse_config(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn drop_filter_with_destinations_rejected() {
        let yaml = r#"
filters:
  - name: f
    action: drop
    destinations: [d]
destinations:
  - name: d
    address: "127.0.0.1:514"
"#;
        let config = parse_config(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn address_without_port_rejected() {
        let yaml = r#"
inputs:
  - name: i
    address: "0.0.0.0"
"#;
        let config = parse_config(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn destination_port_zero_rejected() {
        let yaml = r#"
destinations:
  - name: d
    address: "127.0.0.1:0"
"#;
        let config = parse_config(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn input_port_zero_allowed_for_ephemeral_bind() {
        let yaml = r#"
inputs:
  - name: i
    address: "127.0.0.1:0"
"#;
        let config = parse_config(yaml).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn retry_bounds_enforced() {
        let yaml = r#"
destinations:
  - name: d
    address: "127.0.0.1:514"
    retry:
      max_attempts: 11
"#;
        let config = parse_config(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_var_substitution() {
        std::env::set_var("LOGPOST_TEST_PORT", "5514");
        let content = substitute_env_vars("address: \"0.0.0.0:${LOGPOST_TEST_PORT}\"");
        assert_eq!(content, "address: \"0.0.0.0:5514\"");
        std::env::remove_var("LOGPOST_TEST_PORT");
    }

    #[test]
    fn env_var_default_used_when_unset() {
        std::env::remove_var("LOGPOST_TEST_MISSING");
        let content = substitute_env_vars("${LOGPOST_TEST_MISSING:-fallback}");
        assert_eq!(content, "fallback");
    }

    #[test]
    fn env_var_without_default_kept_verbatim() {
        std::env::remove_var("LOGPOST_TEST_MISSING2");
        let content = substitute_env_vars("${LOGPOST_TEST_MISSING2}");
        assert_eq!(content, "${LOGPOST_TEST_MISSING2}");
    }

    #[test]
    fn transform_set_fields_use_closed_field_names() {
        let yaml = r#"
transforms:
  - name: t
    set_fields:
      hostname: relay-01
      app_name: relay
"#;
        let config = parse_config(yaml).unwrap();
        let set = &config.transforms[0].set_fields;
        assert_eq!(set.get(&EditableField::Hostname).map(String::as_str), Some("relay-01"));
        assert_eq!(set.get(&EditableField::AppName).map(String::as_str), Some("relay"));
    }

    #[test]
    fn transform_unknown_field_name_rejected_at_parse() {
        let yaml = r#"
transforms:
  - name: t
    remove_fields: [facility]
"#;
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn destination_defaults() {
        let yaml = r#"
destinations:
  - name: d
    address: "127.0.0.1:514"
"#;
        let config = parse_config(yaml).unwrap();
        let dest = &config.destinations[0];
        assert_eq!(dest.protocol, Protocol::Udp);
        assert_eq!(dest.format, OutputFormat::Rfc5424);
        assert_eq!(dest.retry.max_attempts, 3);
        assert_eq!(dest.timeout_seconds, 5.0);
    }
}
