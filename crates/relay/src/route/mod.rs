//! 라우팅 모듈 — 필터 조건 평가와 first-match-wins 규칙 엔진
//!
//! [`RulePredicate`]는 필터 하나의 조건을, [`Router`]는 순서 있는 필터
//! 목록 전체를 담당합니다. 정규식은 파이프라인 구성 시점에 한 번만
//! 컴파일됩니다.

pub mod matcher;
pub mod router;

pub use matcher::RulePredicate;
pub use router::{RouteDecision, Router};
