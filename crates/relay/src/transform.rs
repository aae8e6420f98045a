//! 메시지 변형 — 이름으로 해석되는 순서 있는 필드/본문 편집
//!
//! 필터가 나열한 transform은 나열 순서대로 적용되며, 하나의 transform
//! 안에서 연산 순서는 고정입니다:
//!
//! 1. `remove_fields`
//! 2. `set_fields`
//! 3. `message_replace`
//! 4. `mask_patterns` (목록 순서대로)
//! 5. `message_prefix` / `message_suffix`
//!
//! 치환 문자열의 `\1`-`\9` 역참조를 지원합니다. transform은 `raw`,
//! `origin_format`, facility/severity/timestamp를 절대 건드리지 않으며,
//! 실제 변경이 일어난 경우에만 레코드의 `modified`가 설정됩니다.

use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;

use logpost_core::{ConfigError, EditableField, SyslogRecord, TransformConfig};

use crate::error::RelayError;

struct CompiledTransform {
    match_pattern: Option<Regex>,
    remove_fields: Vec<EditableField>,
    set_fields: Vec<(EditableField, String)>,
    message_replace: Option<(Regex, String)>,
    mask_patterns: Vec<(Regex, String)>,
    message_prefix: Option<String>,
    message_suffix: Option<String>,
}

/// 이름으로 transform을 해석하고 적용하는 엔진
///
/// 알 수 없는 transform 이름은 파이프라인 구성 시점에
/// [`Transformer::resolve`]로 검출됩니다. 메시지 처리 시점에는
/// 이름 해석이 실패하지 않습니다.
pub struct Transformer {
    transforms: HashMap<String, CompiledTransform>,
}

impl Transformer {
    /// transform 설정 목록을 컴파일합니다.
    pub fn new(configs: &[TransformConfig]) -> Result<Self, RelayError> {
        let mut transforms = HashMap::with_capacity(configs.len());

        for config in configs {
            let context = |what: &str| format!("transform '{}' {}", config.name, what);

            let match_pattern = config
                .match_pattern
                .as_deref()
                .map(|p| compile(p, &context("match_pattern")))
                .transpose()?;

            let message_replace = config
                .message_replace
                .as_ref()
                .map(|r| {
                    compile(&r.pattern, &context("message_replace"))
                        .map(|regex| (regex, translate_backrefs(&r.replacement)))
                })
                .transpose()?;

            let mut mask_patterns = Vec::with_capacity(config.mask_patterns.len());
            for (idx, mask) in config.mask_patterns.iter().enumerate() {
                let regex = compile(&mask.pattern, &context(&format!("mask_patterns[{idx}]")))?;
                mask_patterns.push((regex, translate_backrefs(&mask.replacement)));
            }

            transforms.insert(
                config.name.clone(),
                CompiledTransform {
                    match_pattern,
                    remove_fields: config.remove_fields.clone(),
                    set_fields: config
                        .set_fields
                        .iter()
                        .map(|(field, value)| (*field, value.clone()))
                        .collect(),
                    message_replace,
                    mask_patterns,
                    message_prefix: config.message_prefix.clone(),
                    message_suffix: config.message_suffix.clone(),
                },
            );
        }

        Ok(Self { transforms })
    }

    /// 필터가 참조하는 transform 이름이 모두 존재하는지 확인합니다.
    pub fn resolve(&self, filter_name: &str, names: &[String]) -> Result<(), RelayError> {
        for name in names {
            if !self.transforms.contains_key(name) {
                return Err(RelayError::Build(ConfigError::UnknownReference {
                    filter: filter_name.to_owned(),
                    kind: "transform",
                    name: name.clone(),
                }));
            }
        }
        Ok(())
    }

    /// 이름 목록의 transform을 순서대로 적용합니다.
    pub fn apply(&self, record: &mut SyslogRecord, names: &[String]) {
        for name in names {
            // 이름은 구성 시점에 검증되었음
            let Some(transform) = self.transforms.get(name) else {
                continue;
            };
            apply_one(transform, record);
        }
    }
}

fn apply_one(transform: &CompiledTransform, record: &mut SyslogRecord) {
    if let Some(gate) = &transform.match_pattern {
        if !gate.is_match(&record.message) {
            return;
        }
    }

    for field in &transform.remove_fields {
        record.clear_field(*field);
    }

    for (field, value) in &transform.set_fields {
        record.set_field(*field, value);
    }

    if let Some((regex, replacement)) = &transform.message_replace {
        replace_message(record, regex, replacement);
    }

    for (regex, replacement) in &transform.mask_patterns {
        replace_message(record, regex, replacement);
    }

    if let Some(prefix) = &transform.message_prefix {
        if !prefix.is_empty() {
            record.message.insert_str(0, prefix);
            record.modified = true;
        }
    }

    if let Some(suffix) = &transform.message_suffix {
        if !suffix.is_empty() {
            record.message.push_str(suffix);
            record.modified = true;
        }
    }
}

/// 본문에 정규식 치환을 적용합니다. 실제 변경 시에만 `modified` 설정.
fn replace_message(record: &mut SyslogRecord, regex: &Regex, replacement: &str) {
    match regex.replace_all(&record.message, replacement) {
        Cow::Borrowed(_) => {}
        Cow::Owned(new_message) => {
            record.message = new_message;
            record.modified = true;
        }
    }
}

fn compile(pattern: &str, context: &str) -> Result<Regex, RelayError> {
    Regex::new(pattern).map_err(|e| {
        RelayError::Build(ConfigError::InvalidRegex {
            context: context.to_owned(),
            reason: e.to_string(),
        })
    })
}

/// `\1`-`\9` 역참조 표기를 regex 크레이트의 `${n}` 표기로 변환합니다.
///
/// 리터럴 `$`는 `$$`로 이스케이프하고, `\\`는 리터럴 백슬래시가 됩니다.
fn translate_backrefs(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek() {
                Some(digit @ '1'..='9') => {
                    out.push_str("${");
                    out.push(*digit);
                    out.push('}');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }

    out
}
