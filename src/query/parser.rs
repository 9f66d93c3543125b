//! Rule-based query parser.

use std::collections::HashSet;

use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use crate::graph::KnowledgeGraph;

use super::patterns::{
    ATTRIBUTE_PATTERN, COMPARISON_PATTERNS, CUES, DEFINITION_PATTERNS, ENTITY_PATTERNS,
    FACT_PATTERN, KEPT_PUNCTUATION, LIST_PATTERN, OPEN_MARKERS, RELATION_PATTERN, STOP_WORDS,
    TRAILING,
};
use super::{LinkedEntity, LinkedRelation, QueryIntent, QueryParseResult, QueryType};

/// Relation mention emitted for "X和Y是什么关系" queries.
pub const RELATION_MENTION: &str = "关系";

/// Parameter key holding the member kind of a list query ("河流" in "中国有哪些河流").
pub const LIST_TYPE: &str = "list_type";

/// CJK punctuation that survives NFKC and is not in the kept set.
const CJK_PUNCTUATION: &[char] = &[
    '、', '「', '」', '『', '』', '【', '】', '《', '》', '〈', '〉', '“', '”', '‘', '’', '…', '—',
    '·', '〔', '〕',
];

/// Tunables for [`QueryParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Stop words dropped by generic tokenization, on top of the built-in set.
    pub extra_stop_words: Vec<String>,
    /// Generic tokens shorter than this many characters are dropped.
    pub min_token_chars: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            extra_stop_words: Vec::new(),
            min_token_chars: 2,
        }
    }
}

/// Classifies queries and extracts entity, relation and attribute mentions.
///
/// The parser holds only configuration, so one instance can serve any
/// number of threads.
#[derive(Debug, Clone)]
pub struct QueryParser {
    options: ParserOptions,
    stop_words: HashSet<String>,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        let stop_words = STOP_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(options.extra_stop_words.iter().map(|w| w.to_lowercase()))
            .collect();
        Self {
            options,
            stop_words,
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a query. Mentions come back unlinked; see [`QueryParser::link`].
    pub fn parse(&self, text: &str) -> QueryParseResult {
        let normalized = self.preprocess_query(text);
        let query_type = self.recognize_query_type(&normalized);
        let intent = self.extract_intent(&normalized, query_type);
        let confidence = intent_confidence(&intent);

        tracing::debug!(
            query = text,
            query_type = %intent.query_type,
            entities = ?intent.entities,
            relations = ?intent.relations,
            attributes = ?intent.attributes,
            confidence,
            "parsed query"
        );

        QueryParseResult {
            original_query: text.to_string(),
            normalized_query: normalized,
            linked_entities: placeholder_entities(&intent),
            linked_relations: placeholder_relations(&intent),
            intent,
            confidence,
        }
    }

    /// NFKC-normalize, lowercase ASCII, strip punctuation other than
    /// `?`, `！` and `。`, then collapse whitespace.
    ///
    /// A half-width `!` is stripped like any other ASCII punctuation.
    pub fn preprocess_query(&self, text: &str) -> String {
        // NFKC folds `！` to `!`, so each run between full-width marks is
        // normalized on its own and the marks are put back afterwards.
        let cleaned = text
            .split('！')
            .map(|run| {
                run.nfkc()
                    .map(|c| match c {
                        c if KEPT_PUNCTUATION.contains(&c) => c,
                        c if c.is_ascii_punctuation() || CJK_PUNCTUATION.contains(&c) => ' ',
                        c => c.to_ascii_lowercase(),
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("！");
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Classify a normalized query. The first cue that matches wins.
    pub fn recognize_query_type(&self, normalized: &str) -> QueryType {
        if let Some(cue) = CUES.iter().find(|cue| cue.matches(normalized)) {
            return cue.query_type;
        }
        if OPEN_MARKERS.iter().any(|m| normalized.contains(m)) {
            QueryType::Open
        } else {
            QueryType::Unknown
        }
    }

    /// Extract mentions for `query_type`.
    ///
    /// When the type's pattern does not match, the intent keeps the type
    /// and takes its entity mentions from [`QueryParser::tokenize`].
    pub fn extract_intent(&self, normalized: &str, query_type: QueryType) -> QueryIntent {
        let body = normalized.trim_end_matches(TRAILING);
        let mut intent = QueryIntent::new(query_type);

        let matched = match query_type {
            QueryType::Entity => first_captures(&ENTITY_PATTERNS, body)
                .map(|caps| push_mention(&mut intent.entities, group(&caps, 1)))
                .is_some(),
            QueryType::Relation => RELATION_PATTERN
                .captures(body)
                .map(|caps| {
                    push_mention(&mut intent.entities, group(&caps, 1));
                    push_mention(&mut intent.entities, group(&caps, 2));
                    push_mention(&mut intent.relations, RELATION_MENTION);
                })
                .is_some(),
            QueryType::Attribute => ATTRIBUTE_PATTERN
                .captures(body)
                .map(|caps| {
                    push_mention(&mut intent.entities, group(&caps, 1));
                    push_mention(&mut intent.attributes, group(&caps, 2));
                })
                .is_some(),
            QueryType::Definition => first_captures(&DEFINITION_PATTERNS, body)
                .map(|caps| push_mention(&mut intent.entities, group(&caps, 1)))
                .is_some(),
            QueryType::List => LIST_PATTERN
                .captures(body)
                .map(|caps| {
                    push_mention(&mut intent.entities, group(&caps, 1));
                    let list_type = clean(group(&caps, 2));
                    if !list_type.is_empty() {
                        intent
                            .parameters
                            .insert(LIST_TYPE.to_string(), list_type.to_string());
                    }
                })
                .is_some(),
            QueryType::Fact => FACT_PATTERN
                .captures(body)
                .map(|caps| {
                    push_mention(&mut intent.entities, group(&caps, 1));
                    let claim = group(&caps, 2);
                    match claim.split_once('的') {
                        Some((entity, attribute)) => {
                            push_mention(&mut intent.entities, entity);
                            push_mention(&mut intent.attributes, attribute);
                        }
                        None => push_mention(&mut intent.entities, claim),
                    }
                })
                .is_some(),
            QueryType::Comparison => first_captures(&COMPARISON_PATTERNS, body)
                .map(|caps| {
                    push_mention(&mut intent.entities, group(&caps, 1));
                    push_mention(&mut intent.entities, group(&caps, 2));
                    push_mention(&mut intent.attributes, group(&caps, 3));
                })
                .is_some(),
            QueryType::Open | QueryType::Unknown => false,
        };

        if !matched || intent.entities.is_empty() {
            intent.entities = self.tokenize(normalized);
        }
        intent
    }

    /// Whitespace tokenization without stop words or short tokens, deduplicated in order.
    pub fn tokenize(&self, normalized: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for raw in normalized.split_whitespace() {
            let token = raw.trim_matches(KEPT_PUNCTUATION);
            if token.chars().count() < self.options.min_token_chars
                || self.stop_words.contains(token)
                || tokens.iter().any(|t| t == token)
            {
                continue;
            }
            tokens.push(token.to_string());
        }
        tokens
    }

    /// Resolve mentions against `graph`. Returns how many mentions were linked.
    ///
    /// Mentions that resolve to nothing keep `None`; searching falls back to
    /// the same name lookup, so linking is an optimization, not a requirement.
    pub fn link(&self, result: &mut QueryParseResult, graph: &KnowledgeGraph) -> usize {
        let mut linked = 0;
        for mention in &mut result.linked_entities {
            mention.entity_id = graph.resolve_entity(&mention.mention).map(|e| e.id.clone());
            linked += usize::from(mention.entity_id.is_some());
        }
        for mention in &mut result.linked_relations {
            mention.relation_id = graph
                .resolve_relation(&mention.mention)
                .map(|r| r.id.clone());
            linked += usize::from(mention.relation_id.is_some());
        }
        tracing::debug!(
            mentions = result.linked_entities.len() + result.linked_relations.len(),
            linked,
            "linked query mentions"
        );
        linked
    }
}

/// 0.3 for a recognized type, up to 0.3 for entity mentions (two saturate),
/// 0.2 for any relation mention, 0.2 for any attribute mention. Capped at 1.
pub(crate) fn intent_confidence(intent: &QueryIntent) -> f32 {
    let mut score = 0.0f32;
    if intent.query_type != QueryType::Unknown {
        score += 0.3;
    }
    score += 0.3 * (intent.entities.len() as f32 / 2.0).min(1.0);
    if !intent.relations.is_empty() {
        score += 0.2;
    }
    if !intent.attributes.is_empty() {
        score += 0.2;
    }
    score.min(1.0)
}

pub(crate) fn placeholder_entities(intent: &QueryIntent) -> Vec<LinkedEntity> {
    intent
        .entities
        .iter()
        .map(|m| LinkedEntity {
            mention: m.clone(),
            entity_id: None,
        })
        .collect()
}

pub(crate) fn placeholder_relations(intent: &QueryIntent) -> Vec<LinkedRelation> {
    intent
        .relations
        .iter()
        .map(|m| LinkedRelation {
            mention: m.clone(),
            relation_id: None,
        })
        .collect()
}

fn first_captures<'t>(patterns: &[Regex], text: &'t str) -> Option<Captures<'t>> {
    patterns.iter().find_map(|re| re.captures(text))
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn clean(raw: &str) -> &str {
    raw.trim().trim_end_matches(TRAILING).trim()
}

fn push_mention(mentions: &mut Vec<String>, raw: &str) {
    let mention = clean(raw);
    if !mention.is_empty() && !mentions.iter().any(|m| m == mention) {
        mentions.push(mention.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityType};
    use crate::relation::{Relation, RelationType};

    fn parser() -> QueryParser {
        QueryParser::new()
    }

    #[test]
    fn definition_query() {
        let r = parser().parse("什么是人工智能");
        assert_eq!(r.intent.query_type, QueryType::Definition);
        assert_eq!(r.intent.entities, ["人工智能"]);
        assert!((r.confidence - 0.45).abs() < 1e-6);
    }

    #[test]
    fn definition_suffix_form() {
        let r = parser().parse("人工智能是什么意思？");
        assert_eq!(r.intent.query_type, QueryType::Definition);
        assert_eq!(r.intent.entities, ["人工智能"]);
    }

    #[test]
    fn preprocess_normalizes_width_case_and_spacing() {
        let p = parser();
        assert_eq!(p.preprocess_query("  Hello,   WORLD？ "), "hello world?");
        assert_eq!(p.preprocess_query("北京，上海！"), "北京 上海！");
        assert_eq!(p.preprocess_query("《长江》。"), "长江 。");
        assert_eq!(p.preprocess_query(""), "");
    }

    #[test]
    fn only_full_width_exclamation_survives() {
        let p = parser();
        assert_eq!(p.preprocess_query("北京!上海"), "北京 上海");
        assert_eq!(p.preprocess_query("Wow!！"), "wow ！");
        assert_eq!(p.preprocess_query("ＡＢ！ｃ"), "ab！c");
    }

    #[test]
    fn relation_query_has_two_entities_and_relation_mention() {
        let r = parser().parse("北京和中国是什么关系？");
        assert_eq!(r.intent.query_type, QueryType::Relation);
        assert_eq!(r.intent.entities, ["北京", "中国"]);
        assert_eq!(r.intent.relations, [RELATION_MENTION]);
        assert!((r.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn attribute_query() {
        let r = parser().parse("长江的长度是多少");
        assert_eq!(r.intent.query_type, QueryType::Attribute);
        assert_eq!(r.intent.entities, ["长江"]);
        assert_eq!(r.intent.attributes, ["长度"]);
        assert!((r.confidence - 0.65).abs() < 1e-6);
    }

    #[test]
    fn list_query_records_list_type() {
        let r = parser().parse("中国有哪些河流");
        assert_eq!(r.intent.query_type, QueryType::List);
        assert_eq!(r.intent.entities, ["中国"]);
        assert_eq!(r.intent.parameter(LIST_TYPE), Some("河流"));
    }

    #[test]
    fn fact_query_splits_possessive() {
        let r = parser().parse("北京是不是中国的首都");
        assert_eq!(r.intent.query_type, QueryType::Fact);
        assert_eq!(r.intent.entities, ["北京", "中国"]);
        assert_eq!(r.intent.attributes, ["首都"]);
        assert!((r.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn comparison_query() {
        let r = parser().parse("长江和黄河哪个更长");
        assert_eq!(r.intent.query_type, QueryType::Comparison);
        assert_eq!(r.intent.entities, ["长江", "黄河"]);
        assert_eq!(r.intent.attributes, ["长"]);

        let r = parser().parse("长江与黄河的区别");
        assert_eq!(r.intent.query_type, QueryType::Comparison);
        assert_eq!(r.intent.entities, ["长江", "黄河"]);
        assert!(r.intent.attributes.is_empty());
    }

    #[test]
    fn entity_queries() {
        for q in ["李白是谁", "谁是李白", "介绍一下李白"] {
            let r = parser().parse(q);
            assert_eq!(r.intent.query_type, QueryType::Entity, "{q}");
            assert_eq!(r.intent.entities, ["李白"], "{q}");
        }
    }

    #[test]
    fn cue_order_decides_ambiguous_queries() {
        // Contains both a relation cue and "是什么"; the relation cue comes first.
        assert_eq!(
            parser().recognize_query_type("北京和中国是什么关系"),
            QueryType::Relation
        );
        // "的...是什么" is an attribute before the bare "是什么" definition cue.
        assert_eq!(
            parser().recognize_query_type("中国的首都是什么"),
            QueryType::Attribute
        );
        assert_eq!(
            parser().recognize_query_type("人工智能是什么"),
            QueryType::Definition
        );
    }

    #[test]
    fn open_and_unknown_fallbacks() {
        let p = parser();
        assert_eq!(p.recognize_query_type("为什么天空是蓝色的"), QueryType::Open);
        assert_eq!(p.recognize_query_type("天气好?"), QueryType::Open);
        assert_eq!(p.recognize_query_type("hello world"), QueryType::Unknown);
    }

    #[test]
    fn unknown_query_tokenizes() {
        let r = parser().parse("What is   the Yangtze river");
        assert_eq!(r.intent.query_type, QueryType::Unknown);
        assert_eq!(r.intent.entities, ["yangtze", "river"]);
        assert!((r.confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn tokenize_drops_short_tokens_stop_words_and_duplicates() {
        let p = parser();
        assert_eq!(
            p.tokenize("长江 的 x 长江 黄河 什么 黄河?"),
            ["长江", "黄河"]
        );
    }

    #[test]
    fn extra_stop_words_and_min_chars_are_honored() {
        let p = QueryParser::with_options(ParserOptions {
            extra_stop_words: vec!["River".into()],
            min_token_chars: 3,
        });
        assert_eq!(p.tokenize("yangtze river ai"), ["yangtze"]);
    }

    #[test]
    fn empty_query_is_unknown_with_zero_confidence() {
        let r = parser().parse("   ");
        assert_eq!(r.intent.query_type, QueryType::Unknown);
        assert!(r.intent.is_empty());
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn unmatched_pattern_falls_back_to_tokens() {
        let intent = parser().extract_intent("北京 首都", QueryType::Relation);
        assert_eq!(intent.query_type, QueryType::Relation);
        assert_eq!(intent.entities, ["北京", "首都"]);
        assert!(intent.relations.is_empty());
    }

    #[test]
    fn confidence_is_capped() {
        let mut intent = QueryIntent::new(QueryType::Fact);
        intent.entities = vec!["a".into(), "b".into(), "c".into()];
        intent.relations = vec!["r".into()];
        intent.attributes = vec!["x".into()];
        assert_eq!(intent_confidence(&intent), 1.0);
    }

    #[test]
    fn parse_leaves_placeholders_and_link_resolves_them() {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(Entity::new("e1", "北京", EntityType::Location))
            .unwrap();
        kg.add_entity(Entity::new("e3", "中国", EntityType::Location))
            .unwrap();
        kg.add_relation(Relation::new("r9", "关系", RelationType::RelatedTo))
            .unwrap();

        let p = parser();
        let mut r = p.parse("北京和火星是什么关系");
        assert!(r.linked_entities.iter().all(|l| l.entity_id.is_none()));
        assert_eq!(r.linked_entities.len(), 2);

        assert_eq!(p.link(&mut r, &kg), 2);
        assert_eq!(r.linked_entity_id(0).map(|id| id.as_str()), Some("e1"));
        assert_eq!(r.linked_entity_id(1), None);
        assert_eq!(
            r.linked_relations[0].relation_id.as_ref().map(|id| id.as_str()),
            Some("r9")
        );
    }
}
