//! 索引规则领域模型
//!
//! 规则文档为 UTF-8 文本，一行一条，形如 `<关键词> >> <章节标记>`。
//! 空行忽略，格式不符的行静默丢弃；规则顺序与源文件一致，
//! 重复关键词允许存在且各自独立解析。

use std::sync::LazyLock;

use regex::Regex;

static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*>>\s*(\S+)").expect("rule pattern"));

/// 单条索引规则：标题关键词 -> 章节标记
///
/// `resolved_message_id` 在某条已迁移消息的原始标题包含 `chapter_target`
/// （大小写不敏感）时写入目标侧消息 ID，首次命中后不再覆盖。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexRule {
    pub keyword: String,
    pub chapter_target: String,
    pub resolved_message_id: Option<i64>,
}

impl IndexRule {
    pub fn new(keyword: impl Into<String>, chapter_target: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            chapter_target: chapter_target.into(),
            resolved_message_id: None,
        }
    }

    /// 尝试用一条已迁移消息解析本规则（首次命中生效）
    ///
    /// 返回是否发生了新的解析。
    pub fn try_resolve(&mut self, original_caption: &str, new_message_id: i64) -> bool {
        if self.resolved_message_id.is_some() {
            return false;
        }
        if original_caption
            .to_lowercase()
            .contains(&self.chapter_target.to_lowercase())
        {
            self.resolved_message_id = Some(new_message_id);
            return true;
        }
        false
    }
}

/// 解析规则文档
pub fn parse_rules(text: &str) -> Vec<IndexRule> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            RULE_RE.captures(line).map(|caps| IndexRule {
                keyword: caps[1].trim().to_string(),
                chapter_target: caps[2].trim().to_string(),
                resolved_message_id: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_rule_forms() {
        let text = "Ch - 01 : Mole Concept >> chapterId\n\
                    Homework Discussion >> chapterId\n\
                    PYQ Practice Sheet || Only PDF >> ChapterId\n\
                    Mind Maps || Only PDF >> chapterId\n";
        let rules = parse_rules(text);
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].keyword, "Ch - 01 : Mole Concept");
        assert_eq!(rules[0].chapter_target, "chapterId");
        assert_eq!(rules[2].keyword, "PYQ Practice Sheet || Only PDF");
        assert!(rules.iter().all(|r| r.resolved_message_id.is_none()));
    }

    #[test]
    fn drops_malformed_lines_silently() {
        let text = "valid >> target\nno separator here\n\n   \nanother >> t2\n";
        let rules = parse_rules(text);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].keyword, "another");
    }

    #[test]
    fn blank_document_yields_no_rules() {
        assert!(parse_rules("").is_empty());
        assert!(parse_rules("\n  \n\t\n").is_empty());
    }

    #[test]
    fn duplicate_keywords_tracked_independently() {
        let rules = parse_rules("Lecture >> ch1\nLecture >> ch2\n");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].chapter_target, "ch1");
        assert_eq!(rules[1].chapter_target, "ch2");
    }

    #[test]
    fn resolution_is_case_insensitive_and_first_match_wins() {
        let mut rule = IndexRule::new("Mole Concept", "ChapterId");
        assert!(rule.try_resolve("Lecture 01 chapterid > xyz", 42));
        assert_eq!(rule.resolved_message_id, Some(42));
        // 已解析的规则不会被覆盖
        assert!(!rule.try_resolve("chapterid again", 99));
        assert_eq!(rule.resolved_message_id, Some(42));
    }

    #[test]
    fn unmatched_caption_leaves_rule_unresolved() {
        let mut rule = IndexRule::new("Mole Concept", "chapterX");
        assert!(!rule.try_resolve("unrelated caption", 7));
        assert_eq!(rule.resolved_message_id, None);
    }
}
