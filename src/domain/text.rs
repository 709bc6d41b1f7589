//! 文本行提取
//!
//! 将输入文本拆分为可朗读的行：按行分割，去除首尾空白，跳过空行

/// 提取文本中所有可朗读的行
///
/// 规则：
/// 1. 按行分割（支持 \n 和 \r\n）
/// 2. 去除每行首尾空白
/// 3. 跳过空行（空行不产生任何音频）
pub fn speakable_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
