//! 标题改写
//!
//! 迁移时去掉原标题中的 `ChapterId > <token>` 片段并整理首尾空白，
//! 非空结果在重发时加粗（HTML）。

use std::sync::LazyLock;

use regex::Regex;

static CHAPTER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ChapterId\s*>\s*\S+").expect("chapter tag pattern"));

/// 去除章节标记并修剪空白
pub fn strip_chapter_tag(caption: &str) -> String {
    CHAPTER_TAG_RE.replace_all(caption, "").trim().to_string()
}

/// 重发用的加粗标题；空标题保持为空
pub fn format_caption(transformed: &str) -> String {
    if transformed.is_empty() {
        String::new()
    } else {
        format!("<b>{transformed}</b>")
    }
}
