//! Known analysis component factories and how their parameters translate into
//! cluster analysis settings.

use std::collections::BTreeMap;

use crate::declaration::Parameter;
use crate::schema::{ ComponentKind, ParamValue };
use crate::schema::ComponentKind::{ CharFilter, TokenFilter, Tokenizer };
use self::ValueStyle::{ CommaList, Flag, Text, WhitespaceList };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueStyle {
    Text,
    WhitespaceList,
    CommaList,
    /// Rendered as "1" or "0".
    Flag,
}

#[derive(Debug)]
pub(crate) struct ParamRule {
    source: &'static str,
    target: &'static str,
    style: ValueStyle,
}

const fn rule(source: &'static str, target: &'static str, style: ValueStyle) -> ParamRule {
    ParamRule { source, target, style }
}

#[derive(Debug)]
pub struct FactoryTranslation {
    pub factory: &'static str,
    pub kind: ComponentKind,
    /// Type name understood by the cluster, e.g. `word_delimiter`.
    pub type_name: &'static str,
    rules: &'static [ParamRule],
}

const fn factory(
    factory: &'static str,
    kind: ComponentKind,
    type_name: &'static str,
    rules: &'static [ParamRule]
) -> FactoryTranslation {
    FactoryTranslation { factory, kind, type_name, rules }
}

const HTML_STRIP_RULES: &[ParamRule] = &[rule("escapedTags", "escaped_tags", WhitespaceList)];
const MAPPING_RULES: &[ParamRule] = &[rule("mapping", "mappings_path", Text)];
const STOP_RULES: &[ParamRule] = &[
    rule("words", "stopwords_path", Text),
    rule("ignoreCase", "ignore_case", Text),
];
const ELISION_RULES: &[ParamRule] = &[rule("articles", "articles_path", Text)];
const KEEP_RULES: &[ParamRule] = &[rule("words", "keep_words_path", Text)];
const PATTERN_CAPTURE_RULES: &[ParamRule] = &[rule("pattern", "patterns", CommaList)];

const NGRAM_RULES: &[ParamRule] = &[
    rule("minGramSize", "min_gram", Text),
    rule("maxGramSize", "max_gram", Text),
];

const WORD_DELIMITER_RULES: &[ParamRule] = &[
    rule("generateWordParts", "generate_word_parts", Flag),
    rule("generateNumberParts", "generate_number_parts", Flag),
    rule("catenateWords", "catenate_words", Flag),
    rule("catenateNumbers", "catenate_numbers", Flag),
    rule("catenateAll", "catenate_all", Flag),
    rule("splitOnCaseChange", "split_on_case_change", Flag),
    rule("splitOnNumerics", "split_on_numerics", Flag),
    rule("preserveOriginal", "preserve_original", Flag),
    rule("stemEnglishPossessive", "stem_english_possessive", Flag),
    rule("protected", "protected_words_path", Text),
    rule("types", "type_table_path", Text),
];

static FACTORIES: &[FactoryTranslation] = &[
    factory("HTMLStripCharFilterFactory", CharFilter, "html_strip", HTML_STRIP_RULES),
    factory("MappingCharFilterFactory", CharFilter, "mapping", MAPPING_RULES),
    factory("PatternReplaceCharFilterFactory", CharFilter, "pattern_replace", &[]),
    factory("StandardTokenizerFactory", Tokenizer, "standard", &[]),
    factory("ClassicTokenizerFactory", Tokenizer, "classic", &[]),
    factory("WhitespaceTokenizerFactory", Tokenizer, "whitespace", &[]),
    factory("KeywordTokenizerFactory", Tokenizer, "keyword", &[]),
    factory("LetterTokenizerFactory", Tokenizer, "letter", &[]),
    factory("LowerCaseTokenizerFactory", Tokenizer, "lowercase", &[]),
    factory("UAX29URLEmailTokenizerFactory", Tokenizer, "uax_url_email", &[]),
    factory("PathHierarchyTokenizerFactory", Tokenizer, "path_hierarchy", &[]),
    factory("PatternTokenizerFactory", Tokenizer, "pattern", &[]),
    factory("NGramTokenizerFactory", Tokenizer, "nGram", NGRAM_RULES),
    factory("EdgeNGramTokenizerFactory", Tokenizer, "edgeNGram", NGRAM_RULES),
    factory("LowerCaseFilterFactory", TokenFilter, "lowercase", &[]),
    factory("UpperCaseFilterFactory", TokenFilter, "uppercase", &[]),
    factory("StandardFilterFactory", TokenFilter, "standard", &[]),
    factory("ASCIIFoldingFilterFactory", TokenFilter, "asciifolding", &[]),
    factory("TrimFilterFactory", TokenFilter, "trim", &[]),
    factory("ReverseStringFilterFactory", TokenFilter, "reverse", &[]),
    factory("PorterStemFilterFactory", TokenFilter, "porter_stem", &[]),
    factory("KeywordRepeatFilterFactory", TokenFilter, "keyword_repeat", &[]),
    factory("LengthFilterFactory", TokenFilter, "length", &[]),
    factory("SnowballPorterFilterFactory", TokenFilter, "snowball", &[]),
    factory("StopFilterFactory", TokenFilter, "stop", STOP_RULES),
    factory("ElisionFilterFactory", TokenFilter, "elision", ELISION_RULES),
    factory("KeepWordFilterFactory", TokenFilter, "keep", KEEP_RULES),
    factory("ShingleFilterFactory", TokenFilter, "shingle", &[]),
    factory("PatternCaptureGroupFilterFactory", TokenFilter, "pattern_capture", PATTERN_CAPTURE_RULES),
    factory("NGramFilterFactory", TokenFilter, "nGram", NGRAM_RULES),
    factory("EdgeNGramFilterFactory", TokenFilter, "edgeNGram", NGRAM_RULES),
    factory("WordDelimiterFilterFactory", TokenFilter, "word_delimiter", WORD_DELIMITER_RULES),
];

/// Strips any package qualifier: `a.b.ClassicTokenizerFactory` -> `ClassicTokenizerFactory`.
pub fn simple_name(factory: &str) -> &str {
    factory.rsplit('.').next().unwrap_or(factory)
}

pub fn lookup(factory: &str) -> Option<&'static FactoryTranslation> {
    let name = simple_name(factory);
    FACTORIES.iter().find(|translation| translation.factory == name)
}

/// Whether `name` is a type the cluster already provides for components of `kind`.
pub fn is_builtin(kind: ComponentKind, name: &str) -> bool {
    FACTORIES.iter().any(|translation| translation.kind == kind && translation.type_name == name)
}

impl FactoryTranslation {
    /// Translates declared parameters into canonical cluster parameters.
    pub(crate) fn translate_params(
        &self,
        params: &[Parameter]
    ) -> Result<BTreeMap<String, ParamValue>, String> {
        let mut translated = BTreeMap::new();
        for param in params {
            let (target, style) = match self.rules.iter().find(|r| r.source == param.name) {
                Some(rule) => (rule.target.to_string(), rule.style),
                None => (camel_to_snake(&param.name), Text),
            };
            let value = apply_style(style, &ParamValue::Text(param.value.clone())).ok_or_else(||
                format!(
                    "parameter '{}' of {} expects a flag (1/0, true/false), got '{}'",
                    param.name,
                    self.factory,
                    param.value
                )
            )?;
            if translated.insert(target, value).is_some() {
                return Err(format!("parameter '{}' is declared twice on {}", param.name, self.factory));
            }
        }
        Ok(translated)
    }
}

fn apply_style(style: ValueStyle, value: &ParamValue) -> Option<ParamValue> {
    match (style, value) {
        (Text, value) => Some(value.clone()),
        (WhitespaceList, ParamValue::Text(text)) => {
            Some(ParamValue::List(text.split_whitespace().map(String::from).collect()))
        }
        (CommaList, ParamValue::Text(text)) => {
            Some(
                ParamValue::List(
                    text
                        .split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(String::from)
                        .collect()
                )
            )
        }
        (WhitespaceList | CommaList, list @ ParamValue::List(_)) => Some(list.clone()),
        (Flag, ParamValue::Text(text)) => parse_flag(text).map(|flag| ParamValue::Text(flag.to_string())),
        (Flag, ParamValue::List(_)) => None,
    }
}

fn parse_flag(value: &str) -> Option<&'static str> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some("1"),
        "0" | "false" | "no" | "off" => Some("0"),
        _ => None,
    }
}

/// Brings parameters read back from the cluster into the form the builder
/// produces. Values that do not fit their rule are left untouched so that the
/// differ reports them.
pub fn canonicalize_params(
    kind: ComponentKind,
    type_name: &str,
    params: BTreeMap<String, ParamValue>
) -> BTreeMap<String, ParamValue> {
    params
        .into_iter()
        .map(|(key, value)| {
            let style = FACTORIES.iter()
                .filter(|translation| translation.kind == kind && translation.type_name == type_name)
                .flat_map(|translation| translation.rules.iter())
                .find(|rule| rule.target == key)
                .map(|rule| rule.style)
                .unwrap_or(Text);
            let canonical = apply_style(style, &value).unwrap_or(value);
            (key, canonical)
        })
        .collect()
}

pub(crate) fn camel_to_snake(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.push(ch.to_ascii_lowercase());
        } else {
            snake.push(ch);
        }
    }
    snake
}
