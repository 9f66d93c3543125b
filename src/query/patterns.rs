//! Cue table, capture patterns and stop words for query parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::QueryType;

/// A classification cue: every fragment must occur, in order.
pub(crate) struct Cue {
    pub fragments: &'static [&'static str],
    pub query_type: QueryType,
}

impl Cue {
    pub fn matches(&self, text: &str) -> bool {
        let mut rest = text;
        for fragment in self.fragments {
            match rest.find(fragment) {
                Some(at) => rest = &rest[at + fragment.len()..],
                None => return false,
            }
        }
        true
    }
}

const fn cue(fragments: &'static [&'static str], query_type: QueryType) -> Cue {
    Cue {
        fragments,
        query_type,
    }
}

/// Priority-ordered cues. The first match decides the query type.
pub(crate) static CUES: &[Cue] = &[
    cue(&["和", "关系"], QueryType::Relation),
    cue(&["与", "关系"], QueryType::Relation),
    cue(&["跟", "关系"], QueryType::Relation),
    cue(&["区别"], QueryType::Comparison),
    cue(&["不同"], QueryType::Comparison),
    cue(&["差别"], QueryType::Comparison),
    cue(&["差异"], QueryType::Comparison),
    cue(&["比较"], QueryType::Comparison),
    cue(&["哪个更"], QueryType::Comparison),
    cue(&["和", "哪个"], QueryType::Comparison),
    cue(&["与", "哪个"], QueryType::Comparison),
    cue(&["是不是"], QueryType::Fact),
    cue(&["是否"], QueryType::Fact),
    cue(&["什么是"], QueryType::Definition),
    cue(&["是什么意思"], QueryType::Definition),
    cue(&["的定义"], QueryType::Definition),
    cue(&["是指什么"], QueryType::Definition),
    cue(&["指的是什么"], QueryType::Definition),
    cue(&["有哪些"], QueryType::List),
    cue(&["包括哪些"], QueryType::List),
    cue(&["包含哪些"], QueryType::List),
    cue(&["的", "是什么"], QueryType::Attribute),
    cue(&["的", "是多少"], QueryType::Attribute),
    cue(&["的", "是哪里"], QueryType::Attribute),
    cue(&["的", "在哪里"], QueryType::Attribute),
    cue(&["的", "多大"], QueryType::Attribute),
    cue(&["的", "多高"], QueryType::Attribute),
    cue(&["的", "多长"], QueryType::Attribute),
    cue(&["的", "有多少"], QueryType::Attribute),
    cue(&["是谁"], QueryType::Entity),
    cue(&["谁是"], QueryType::Entity),
    cue(&["介绍"], QueryType::Entity),
    cue(&["是什么"], QueryType::Definition),
    cue(&["有什么"], QueryType::List),
];

/// Markers that make an otherwise unclassified query open-ended.
pub(crate) const OPEN_MARKERS: &[&str] = &["?", "为什么", "怎么样", "如何"];

/// Punctuation kept by normalization.
pub(crate) const KEPT_PUNCTUATION: &[char] = &['?', '！', '。'];

/// Sentence-final particles and punctuation ignored by the capture patterns.
pub(crate) const TRAILING: &[char] = &['?', '！', '。', '吗', '呢', '吧', '啊', ' '];

pub(crate) const STOP_WORDS: &[&str] = &[
    "的", "了", "是", "在", "和", "与", "跟", "有", "吗", "呢", "吧", "啊", "我", "你", "他", "她",
    "它", "我们", "你们", "他们", "这", "那", "这个", "那个", "什么", "为什么", "怎么", "怎么样",
    "如何", "哪些", "哪个", "哪里", "谁", "请问", "请", "一下", "告诉", "知道", "关于", "一个",
    "what", "who", "why", "how", "where", "when", "which", "is", "are", "the", "a", "an", "of",
    "to", "in", "and", "or", "do", "does",
];

fn re(pattern: &str) -> Regex {
    // Patterns are compile-time constants exercised by the unit tests.
    Regex::new(pattern).expect("query pattern must compile")
}

pub(crate) static ENTITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"^谁是(.+)$"),
        re(r"^(.+?)是谁$"),
        re(r"^(?:请)?(?:介绍一下|介绍)(.+)$"),
    ]
});

pub(crate) static RELATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    re(r"^(.+?)(?:和|与|跟)(.+?)(?:之间)?(?:是什么|有什么|有何|的)?关系")
});

pub(crate) static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    re(r"^(.+?)的(.+?)(?:是|有|在)?(?:什么|多少|多大|多高|多长|哪里|哪儿)$")
});

pub(crate) static DEFINITION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"^什么是(.+)$"),
        re(r"^(.+?)(?:是什么意思|的定义是什么|的定义|指的是什么|是指什么|是什么)$"),
    ]
});

pub(crate) static LIST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| re(r"^(.+?)(?:有哪些|包括哪些|包含哪些|有什么)(.*)$"));

pub(crate) static FACT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| re(r"^(.+?)(?:是不是|是否是|是否)(.+)$"));

pub(crate) static COMPARISON_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"^(?:比较)?(.+?)(?:和|与|跟)(.+?)(?:哪个|谁)(?:更)?(.+)$"),
        re(r"^(?:比较)?(.+?)(?:和|与|跟)(.+?)的?(?:区别|不同|差别|差异)"),
        re(r"^比较(.+?)(?:和|与|跟)(.+)$"),
    ]
});
