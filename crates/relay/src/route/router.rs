//! First-match-wins 규칙 엔진
//!
//! 필터는 선언 순서대로 평가되며 첫 번째로 매칭된 필터가 결과를
//! 결정합니다. 라우팅은 순수 함수입니다: 같은 (레코드, 필터 목록)에
//! 대해 항상 같은 결정을 반환하고 어떤 상태도 바꾸지 않습니다.

use logpost_core::{Action, ConfigError, FilterConfig, SyslogRecord};

use crate::error::RelayError;
use crate::route::matcher::RulePredicate;

/// 라우팅 결정
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    /// 어떤 필터든 매칭되었는지 여부
    pub matched: bool,
    /// 매칭된 필터 이름
    pub rule_name: Option<String>,
    /// 매칭된 필터의 action (매칭 실패 시 Drop)
    pub action: Action,
    /// 전달할 destination 이름 (선언 순서)
    pub destinations: Vec<String>,
    /// 적용할 transform 이름 (선언 순서)
    pub transforms: Vec<String>,
}

impl RouteDecision {
    fn no_match() -> Self {
        Self {
            matched: false,
            rule_name: None,
            action: Action::Drop,
            destinations: Vec::new(),
            transforms: Vec::new(),
        }
    }
}

struct CompiledRule {
    name: String,
    action: Action,
    destinations: Vec<String>,
    transforms: Vec<String>,
    predicate: Option<RulePredicate>,
}

/// 순서 있는 필터 목록에 대한 규칙 엔진
pub struct Router {
    rules: Vec<CompiledRule>,
}

impl Router {
    /// 필터 목록을 컴파일합니다. 잘못된 정규식은 구성 에러입니다.
    pub fn new(filters: &[FilterConfig]) -> Result<Self, RelayError> {
        let mut rules = Vec::with_capacity(filters.len());
        for filter in filters {
            let predicate = match &filter.matcher {
                Some(matcher) => Some(RulePredicate::compile(matcher).map_err(|e| {
                    RelayError::Build(ConfigError::InvalidRegex {
                        context: format!("filter '{}'", filter.name),
                        reason: e.to_string(),
                    })
                })?),
                None => None,
            };
            rules.push(CompiledRule {
                name: filter.name.clone(),
                action: filter.action,
                destinations: filter.destinations.clone(),
                transforms: filter.transforms.clone(),
                predicate,
            });
        }
        Ok(Self { rules })
    }

    /// 로드된 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 레코드에 대한 라우팅 결정을 내립니다.
    ///
    /// 조건 블록이 없는 필터는 catch-all로 항상 매칭됩니다.
    /// 매칭된 필터가 없으면 drop(no_match) 결정을 반환합니다.
    pub fn route(&self, record: &SyslogRecord) -> RouteDecision {
        for rule in &self.rules {
            let matched = match &rule.predicate {
                Some(predicate) => predicate.matches(record),
                None => true,
            };
            if matched {
                return RouteDecision {
                    matched: true,
                    rule_name: Some(rule.name.clone()),
                    action: rule.action,
                    destinations: rule.destinations.clone(),
                    transforms: rule.transforms.clone(),
                };
            }
        }
        RouteDecision::no_match()
    }
}
