use std::fs;
use std::path::Path;

use itertools::Itertools;

use crate::error::ScanError;

const LETTER_TOKEN: &str = "{letter}";
const NUMBER_TOKEN: &str = "{number}";

/// 生成固定长度的全排列字符串，`repeat` 为0时只返回一个空串
fn product(alphabet: &[char], repeat: usize) -> Vec<String> {
    if repeat == 0 {
        return vec![String::new()];
    }
    (0..repeat)
        .map(|_| alphabet.iter().copied())
        .multi_cartesian_product()
        .map(|chars: Vec<char>| chars.into_iter().collect::<String>())
        .collect()
}

/// 展开字典模板行
///
/// 行内连续出现的 `{letter}` 会被替换为等长的小写字母组合，
/// 连续出现的 `{number}` 会被替换为等长的数字组合。
/// 两种占位符都存在时结果为两者的笛卡尔积；都不存在时原样返回。
pub fn generate_general_dicts(line: &str) -> Vec<String> {
    let letter_count = line.matches(LETTER_TOKEN).count();
    let number_count = line.matches(NUMBER_TOKEN).count();

    let letters: Vec<char> = ('a'..='z').collect();
    let digits: Vec<char> = ('0'..='9').collect();

    let letter_run = LETTER_TOKEN.repeat(letter_count);
    let number_run = NUMBER_TOKEN.repeat(number_count);

    let mut subnames = Vec::new();
    for l in product(&letters, letter_count) {
        let iter_line = if letter_count > 0 {
            line.replace(&letter_run, &l)
        } else {
            line.to_string()
        };
        for n in product(&digits, number_count) {
            if number_count > 0 {
                subnames.push(iter_line.replace(&number_run, &n));
            } else {
                subnames.push(iter_line.clone());
            }
        }
    }
    subnames
}

/// 解析字典文本：去除空行与 `#` 注释，统一小写并展开模板
pub fn parse_dict_lines(text: &str) -> Vec<String> {
    let mut subnames = Vec::new();
    for line in text.lines() {
        let line = line.trim().to_lowercase();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.contains(LETTER_TOKEN) || line.contains(NUMBER_TOKEN) {
            subnames.extend(generate_general_dicts(&line));
        } else {
            subnames.push(line);
        }
    }
    subnames
}

/// 从文件加载字典
pub fn load_dict_file(path: &Path) -> Result<Vec<String>, ScanError> {
    let text = fs::read_to_string(path).map_err(|e| ScanError::Load {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_dict_lines(&text))
}

/// 启动时加载的静态字典
#[derive(Debug, Clone, Default)]
pub struct WordLists {
    /// 一级子域名候选
    pub subnames: Vec<String>,
    /// 递归时拼接到已发现子域名前的下一级模板
    pub next_subs: Vec<String>,
}

impl WordLists {
    pub fn new(subnames: Vec<String>, next_subs: Vec<String>) -> Self {
        WordLists { subnames, next_subs }
    }

    /// 从字典目录加载，`full` 为真时使用 `_full` 版本
    pub fn load(db_dir: &Path, full: bool) -> Result<Self, ScanError> {
        let (subnames_file, next_sub_file) = if full {
            ("subnames_full.txt", "next_sub_full.txt")
        } else {
            ("subnames.txt", "next_sub.txt")
        };

        log::info!("Load next level subs ...");
        let next_subs = load_dict_file(&db_dir.join(next_sub_file))?;
        log::info!("Load sub names ...");
        let subnames = load_dict_file(&db_dir.join(subnames_file))?;
        log::debug!(
            "loaded {} sub names and {} next level templates",
            subnames.len(),
            next_subs.len()
        );

        Ok(WordLists { subnames, next_subs })
    }
}
