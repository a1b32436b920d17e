//! Post-generation validation and correction of scenario code.
//!
//! Every device selector in the code, `(#Class #tag ...).member` optionally
//! prefixed by `all` or `any`, is checked against the vocabulary and the
//! site's connected tag sets:
//!
//! 1. the class tag must name a vocabulary class (near misses corrected);
//! 2. the member must be a method or value of that class (near misses
//!    corrected);
//! 3. auxiliary tags are corrected against the tags seen with the class;
//! 4. the resulting tag combination must exist on a connected device,
//!    except for virtual classes such as `Clock` used without auxiliary tags;
//! 5. string literals compared against enum values are canonicalized.
//!
//! A selector that cannot be repaired rejects the whole scenario.

mod similarity;

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use jg_catalog::{DeviceClass, SiteTags, Vocabulary};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use similarity::{JaroWinklerScorer, SimilarityScorer, best_match};

static SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<quant>\b(?:all|any)\s*)?\(\s*(?P<tags>#[^\s()#]+(?:\s+#[^\s()#]+)*)\s*\)\s*\.\s*(?P<member>\w+)(?:(?P<op>\s*(?:==|!=)\s*)(?:"(?P<dlit>[^"\n]*)"|'(?P<slit>[^'\n]*)'))?"#,
    )
    .unwrap()
});

/// Start of a device selector, used to catch selectors the full pattern skipped.
static SELECTOR_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*#").unwrap());

/// Validator thresholds and policy, loadable from the `[validator]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Minimum similarity to rewrite an unknown class tag.
    #[serde(default = "default_class_threshold")]
    pub class_threshold: f64,
    /// Minimum similarity to rewrite an unknown method or value name.
    #[serde(default = "default_member_threshold")]
    pub member_threshold: f64,
    /// Minimum similarity to rewrite an unknown auxiliary tag.
    #[serde(default = "default_tag_threshold")]
    pub tag_threshold: f64,
    /// Minimum similarity to rewrite an enum literal.
    #[serde(default = "default_literal_threshold")]
    pub literal_threshold: f64,
    /// Classes usable without a connected instance (when no auxiliary tag
    /// is given).
    #[serde(default = "default_virtual_classes")]
    pub virtual_classes: Vec<String>,
    /// Keep scenarios whose unknown members could not be corrected.
    #[serde(default)]
    pub keep_unknown_members: bool,
}

fn default_class_threshold() -> f64 {
    0.9
}
fn default_member_threshold() -> f64 {
    0.93
}
fn default_tag_threshold() -> f64 {
    0.9
}
fn default_literal_threshold() -> f64 {
    0.85
}
fn default_virtual_classes() -> Vec<String> {
    vec!["Clock".into(), "Speaker".into()]
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            class_threshold: default_class_threshold(),
            member_threshold: default_member_threshold(),
            tag_threshold: default_tag_threshold(),
            literal_threshold: default_literal_threshold(),
            virtual_classes: default_virtual_classes(),
            keep_unknown_members: false,
        }
    }
}

/// Why a scenario was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("empty scenario body")]
    Empty,

    #[error("unknown device class `{0}`")]
    UnknownClass(String),

    #[error("`{class}` has no method or value `{member}`")]
    UnknownMember { class: String, member: String },

    #[error("no connected device carries tags {tags:?}")]
    ImpossibleSelector { tags: Vec<String> },

    #[error("unrecognized device selector near `{0}`")]
    Unrecognized(String),
}

/// What kind of identifier a correction touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionKind {
    Class,
    Member,
    Tag,
    Literal,
}

/// One identifier rewritten by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub kind: CorrectionKind,
    pub from: String,
    pub to: String,
    pub score: f64,
}

/// Code that passed validation, with the rewrites applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub code: String,
    pub corrections: Vec<Correction>,
}

/// Checks scenario code against a vocabulary and a site's tag inventory.
#[derive(Clone)]
pub struct Validator {
    config: ValidatorConfig,
    scorer: Arc<dyn SimilarityScorer>,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self::with_scorer(config, Arc::new(JaroWinklerScorer))
    }

    pub fn with_scorer(config: ValidatorConfig, scorer: Arc<dyn SimilarityScorer>) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Corrected code, or an empty string when the scenario must be dropped.
    pub fn validate(&self, code: &str, vocabulary: &Vocabulary, site: &SiteTags) -> String {
        match self.check(code, vocabulary, site) {
            Ok(validated) => {
                for c in &validated.corrections {
                    tracing::debug!(
                        kind = ?c.kind,
                        from = %c.from,
                        to = %c.to,
                        score = c.score,
                        "identifier corrected"
                    );
                }
                validated.code
            }
            Err(reason) => {
                tracing::warn!(reason = %reason, "scenario dropped");
                String::new()
            }
        }
    }

    /// Validate `code`, reporting corrections or the reason for rejection.
    pub fn check(
        &self,
        code: &str,
        vocabulary: &Vocabulary,
        site: &SiteTags,
    ) -> Result<Validated, Rejection> {
        if code.trim().is_empty() {
            return Err(Rejection::Empty);
        }

        let mut out = String::with_capacity(code.len());
        let mut corrections = Vec::new();
        let mut last = 0;

        for caps in SELECTOR.captures_iter(code) {
            let Some(whole) = caps.get(0) else { continue };
            let between = &code[last..whole.start()];
            reject_stray_selector(between)?;
            out.push_str(between);
            out.push_str(&self.check_selector(&caps, vocabulary, site, &mut corrections)?);
            last = whole.end();
        }
        reject_stray_selector(&code[last..])?;
        out.push_str(&code[last..]);

        Ok(Validated {
            code: out,
            corrections,
        })
    }

    fn check_selector(
        &self,
        caps: &Captures<'_>,
        vocabulary: &Vocabulary,
        site: &SiteTags,
        corrections: &mut Vec<Correction>,
    ) -> Result<String, Rejection> {
        let mut tags: Vec<String> = caps["tags"]
            .split_whitespace()
            .map(|t| t.trim_start_matches('#').to_string())
            .collect();
        let mut member = caps["member"].to_string();
        let corrected_before = corrections.len();

        // Class tag
        let class_at = match tags.iter().position(|t| vocabulary.contains(t)) {
            Some(i) => i,
            None => {
                let (to, score) = self
                    .correct_class(&tags[0], vocabulary, site)
                    .ok_or_else(|| Rejection::UnknownClass(tags[0].clone()))?;
                corrections.push(Correction {
                    kind: CorrectionKind::Class,
                    from: std::mem::replace(&mut tags[0], to.to_string()),
                    to: to.to_string(),
                    score,
                });
                0
            }
        };
        let class_key = tags[class_at].clone();
        let Some(class) = vocabulary.get(&class_key) else {
            return Err(Rejection::UnknownClass(class_key));
        };

        // Member
        if !class.has_member(&member) {
            match best_match(
                self.scorer.as_ref(),
                &member,
                class.members(),
                self.config.member_threshold,
            ) {
                Some((to, score)) => corrections.push(Correction {
                    kind: CorrectionKind::Member,
                    from: std::mem::replace(&mut member, to.to_string()),
                    to: to.to_string(),
                    score,
                }),
                None if self.config.keep_unknown_members => {}
                None => {
                    return Err(Rejection::UnknownMember {
                        class: class_key,
                        member,
                    });
                }
            }
        }

        // Auxiliary tags. Tags that exist on site are never rewritten, even
        // when this class does not carry them.
        let known_aux: BTreeSet<&str> = site.aux_tags(&class_key).collect();
        for (i, tag) in tags.iter_mut().enumerate() {
            if i == class_at || site.has_tag(tag) || vocabulary.contains(tag) {
                continue;
            }
            if let Some((to, score)) = best_match(
                self.scorer.as_ref(),
                tag,
                known_aux.iter().copied(),
                self.config.tag_threshold,
            ) {
                corrections.push(Correction {
                    kind: CorrectionKind::Tag,
                    from: std::mem::replace(tag, to.to_string()),
                    to: to.to_string(),
                    score,
                });
            }
        }

        // Tag combination
        let selector: BTreeSet<String> = tags.iter().cloned().collect();
        let virtual_ok = selector.len() == 1 && self.config.virtual_classes.contains(&class_key);
        if !virtual_ok && !site.admits(&selector) {
            return Err(Rejection::ImpossibleSelector { tags });
        }

        // Enum literal
        let literal = [("dlit", '"'), ("slit", '\'')].into_iter().find_map(|(group, quote)| {
            let lit = caps.name(group)?;
            Some((quote, self.normalize_literal(class, &member, lit.as_str(), corrections)))
        });

        if corrections.len() == corrected_before {
            return Ok(caps[0].to_string());
        }

        let mut rewritten = String::new();
        if let Some(quant) = caps.name("quant") {
            rewritten.push_str(quant.as_str());
        }
        rewritten.push('(');
        rewritten.push_str(
            &tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" "),
        );
        rewritten.push_str(").");
        rewritten.push_str(&member);
        if let (Some(op), Some((quote, literal))) = (caps.name("op"), literal) {
            rewritten.push_str(op.as_str());
            rewritten.push(quote);
            rewritten.push_str(&literal);
            rewritten.push(quote);
        }
        Ok(rewritten)
    }

    /// Nearest class key for an unknown tag: connected classes first, then
    /// the whole vocabulary.
    fn correct_class<'v>(
        &self,
        tag: &str,
        vocabulary: &'v Vocabulary,
        site: &SiteTags,
    ) -> Option<(&'v str, f64)> {
        let threshold = self.config.class_threshold;
        let connected = vocabulary.keys().filter(|k| site.is_available(k));
        best_match(self.scorer.as_ref(), tag, connected, threshold)
            .or_else(|| best_match(self.scorer.as_ref(), tag, vocabulary.keys(), threshold))
    }

    fn normalize_literal(
        &self,
        class: &DeviceClass,
        member: &str,
        literal: &str,
        corrections: &mut Vec<Correction>,
    ) -> String {
        let Some(allowed) = class.enum_members(member) else {
            return literal.to_string();
        };
        if allowed.iter().any(|a| a == literal) {
            return literal.to_string();
        }

        let canonical = allowed
            .iter()
            .find(|a| a.eq_ignore_ascii_case(literal))
            .map(|a| (a.as_str(), 1.0))
            .or_else(|| {
                best_match(
                    self.scorer.as_ref(),
                    literal,
                    allowed.iter().map(String::as_str),
                    self.config.literal_threshold,
                )
            });

        match canonical {
            Some((to, score)) => {
                corrections.push(Correction {
                    kind: CorrectionKind::Literal,
                    from: literal.to_string(),
                    to: to.to_string(),
                    score,
                });
                to.to_string()
            }
            None => literal.to_string(),
        }
    }
}

/// Text between recognized selectors must not open another one.
fn reject_stray_selector(text: &str) -> Result<(), Rejection> {
    match SELECTOR_OPEN.find(text) {
        Some(m) => {
            let near: String = text[m.start()..].chars().take(40).collect();
            Err(Rejection::Unrecognized(near.trim_end().to_string()))
        }
        None => Ok(()),
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
