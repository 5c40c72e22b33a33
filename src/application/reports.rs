//! 汇总报告渲染
//!
//! 迁移结束后产出两个文档工件：消息 ID 对应表与索引解析结果。

use crate::domain::link::ChannelId;
use crate::domain::rules::IndexRule;
use crate::domain::session::Correspondence;

pub const MAPPING_FILE_NAME: &str = "message_id_mapping.txt";
pub const MAPPING_CAPTION: &str = "Message ID Mapping";
pub const INDEX_FILE_NAME: &str = "index_results.txt";
pub const INDEX_CAPTION: &str = "Index Results";

/// 对应表：每行 `sourceLink = destinationLink`，按处理顺序排列
pub fn render_mapping(correspondences: &[Correspondence]) -> String {
    correspondences
        .iter()
        .map(Correspondence::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 索引结果：每条规则一行，`keyword > 链接` 或 `keyword > Not Found`
pub fn render_index_results(rules: &[IndexRule], target: &ChannelId) -> String {
    let mut out = String::from("Index Results:\n");
    for rule in rules {
        match rule.resolved_message_id {
            Some(message_id) => {
                out.push_str(&format!(
                    "{} > {}\n",
                    rule.keyword,
                    target.message_link(message_id)
                ));
            }
            None => {
                out.push_str(&format!("{} > Not Found\n", rule.keyword));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_renders_one_line_per_entry() {
        let entries = vec![
            Correspondence {
                source_link: "https://t.me/c/111/1".to_string(),
                target_link: "https://t.me/c/222/9".to_string(),
            },
            Correspondence {
                source_link: "https://t.me/c/111/2".to_string(),
                target_link: "https://t.me/c/222/10".to_string(),
            },
        ];
        assert_eq!(
            render_mapping(&entries),
            "https://t.me/c/111/1 = https://t.me/c/222/9\n\
             https://t.me/c/111/2 = https://t.me/c/222/10"
        );
    }

    #[test]
    fn index_results_mark_unresolved_rules() {
        let target = ChannelId::parse("-100222").unwrap();
        let mut resolved = IndexRule::new("Lecture 01", "ch1");
        resolved.resolved_message_id = Some(15);
        let unresolved = IndexRule::new("Lecture 02", "ch2");

        let report = render_index_results(&[resolved, unresolved], &target);
        assert_eq!(
            report,
            "Index Results:\n\
             Lecture 01 > https://t.me/c/222/15\n\
             Lecture 02 > Not Found\n"
        );
    }
}
