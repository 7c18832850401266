//! 文本处理工具

use regex::Regex;
use std::sync::LazyLock;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// 按字符（而非字节）截断，保证不会切断多字节字符
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// 将换行替换为空格
pub fn collapse_newlines(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// 生成图谱实体名：去除非字母数字与空白字符，空白折叠为下划线，截断到100字符
pub fn sanitize_entity_name(name: &str) -> String {
    let stripped = NON_ALPHANUMERIC.replace_all(name, "");
    let underscored = WHITESPACE_RUN.replace_all(&stripped, "_");
    truncate_chars(&underscored, 100)
}

/// 对HTML特殊字符转义
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
