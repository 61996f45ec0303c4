//! Entity extraction against known-value lists, fuzzy token matching,
//! and regex patterns, in that order of trust.

use std::collections::HashMap;

use regex::Regex;

use parley_core::ExtractedEntity;
use parley_match::FuzzyMatcher;
use parley_profile::Profile;

/// Fuzzy hits are discounted relative to verbatim hits.
const FUZZY_PENALTY: f64 = 0.9;
const REGEX_CONFIDENCE: f32 = 0.8;

/// Configuration for one entity type.
pub struct EntityTypeDef {
    pub name: String,
    pub known_values: Vec<String>,
    pub fuzzy: bool,
    pub patterns: Vec<Regex>,
    /// Canonicalization table applied to extracted values.
    pub aliases: HashMap<String, String>,
    pub max_extractions: Option<usize>,
}

impl EntityTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            known_values: Vec::new(),
            fuzzy: false,
            patterns: Vec::new(),
            aliases: HashMap::new(),
            max_extractions: None,
        }
    }

    pub fn with_known_values(mut self, values: Vec<String>) -> Self {
        self.known_values = values;
        self
    }

    pub fn with_fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.insert(from.into().to_lowercase(), to.into());
        self
    }

    pub fn with_max_extractions(mut self, cap: usize) -> Self {
        self.max_extractions = Some(cap);
        self
    }
}

/// A pair of co-occurring entities of related types.
#[derive(Clone, Debug)]
pub struct EntityRelationship {
    pub first: ExtractedEntity,
    pub second: ExtractedEntity,
    pub relation: String,
    /// Natural-language template with `{first}` / `{second}` slots.
    pub query_template: String,
}

/// Extracts typed entities from free text.
pub struct EntityExtractor {
    types: Vec<EntityTypeDef>,
    /// (first type, second type, relation, template)
    relationships: Vec<(String, String, String, String)>,
    matcher: FuzzyMatcher,
}

impl EntityExtractor {
    pub fn new(types: Vec<EntityTypeDef>) -> Self {
        Self {
            types,
            relationships: vec![(
                "skill".to_string(),
                "company".to_string(),
                "used_at".to_string(),
                "How was {first} used at {second}?".to_string(),
            )],
            matcher: FuzzyMatcher::default(),
        }
    }

    /// The standard extractor for a loaded profile: companies and
    /// skills from the document (fuzzy enabled), topics by regex.
    pub fn for_profile(profile: &Profile) -> Self {
        let topic_patterns = vec![
            Regex::new(r"(?i)\babout\s+([a-z][a-z0-9 .+#-]{2,30}?)(?:\?|$)")
                .expect("static topic pattern"),
            Regex::new(r"(?i)\binterested\s+in\s+([a-z][a-z0-9 .+#-]{2,30}?)(?:\?|$)")
                .expect("static topic pattern"),
        ];
        Self::new(vec![
            EntityTypeDef::new("company")
                .with_known_values(profile.company_names())
                .with_fuzzy()
                .with_max_extractions(3),
            EntityTypeDef::new("skill")
                .with_known_values(profile.skill_names())
                .with_fuzzy()
                .with_alias("js", "JavaScript")
                .with_alias("k8s", "Kubernetes")
                .with_max_extractions(5),
            EntityTypeDef::new("topic")
                .with_patterns(topic_patterns)
                .with_max_extractions(1),
        ])
    }

    /// Extracts every configured type, sorted by confidence descending.
    pub fn extract(&self, query: &str) -> Vec<ExtractedEntity> {
        let mut entities: Vec<ExtractedEntity> = Vec::new();
        for def in &self.types {
            entities.extend(self.extract_for(def, query));
        }
        entities.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entities
    }

    /// Extracts a single type by name. Unknown types yield nothing,
    /// never an error.
    pub fn extract_entity(&self, type_name: &str, query: &str) -> Vec<ExtractedEntity> {
        match self.types.iter().find(|d| d.name == type_name) {
            Some(def) => self.extract_for(def, query),
            None => Vec::new(),
        }
    }

    fn extract_for(&self, def: &EntityTypeDef, query: &str) -> Vec<ExtractedEntity> {
        let lower = query.to_lowercase();
        let mut found: Vec<ExtractedEntity> = Vec::new();

        // (1) verbatim case-insensitive substring, alias keys included
        for value in &def.known_values {
            if let Some(position) = lower.find(&value.to_lowercase()) {
                found.push(ExtractedEntity {
                    entity_type: def.name.clone(),
                    value: self.canonicalize(def, value),
                    confidence: 1.0,
                    position,
                });
            }
        }
        for (alias, canonical) in &def.aliases {
            if let Some(position) = lower.find(alias.as_str()) {
                found.push(ExtractedEntity {
                    entity_type: def.name.clone(),
                    value: canonical.clone(),
                    confidence: 1.0,
                    position,
                });
            }
        }

        // (2) fuzzy token matching, discounted
        if found.is_empty() && def.fuzzy {
            for (position, token) in tokenize_with_offsets(&lower) {
                for value in &def.known_values {
                    let score = self.matcher.similarity(token, value);
                    if score >= self.matcher.threshold {
                        found.push(ExtractedEntity {
                            entity_type: def.name.clone(),
                            value: self.canonicalize(def, value),
                            confidence: (score * FUZZY_PENALTY) as f32,
                            position,
                        });
                    }
                }
            }
        }

        // (3) regex patterns, capture group preferred over whole match
        if found.is_empty() {
            for pattern in &def.patterns {
                for caps in pattern.captures_iter(query) {
                    let m = caps.get(1).or_else(|| caps.get(0));
                    if let Some(m) = m {
                        found.push(ExtractedEntity {
                            entity_type: def.name.clone(),
                            value: self.canonicalize(def, m.as_str().trim()),
                            confidence: REGEX_CONFIDENCE,
                            position: m.start(),
                        });
                    }
                }
            }
        }

        if let Some(cap) = def.max_extractions {
            found.sort_by(|a, b| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            found.truncate(cap);
        }
        found
    }

    fn canonicalize(&self, def: &EntityTypeDef, value: &str) -> String {
        def.aliases
            .get(&value.to_lowercase())
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }

    /// Pairs co-occurring entities whose types appear in the configured
    /// relationship table.
    pub fn find_relationships(&self, entities: &[ExtractedEntity]) -> Vec<EntityRelationship> {
        let mut out = Vec::new();
        for (first_type, second_type, relation, template) in &self.relationships {
            for first in entities.iter().filter(|e| &e.entity_type == first_type) {
                for second in entities.iter().filter(|e| &e.entity_type == second_type) {
                    out.push(EntityRelationship {
                        first: first.clone(),
                        second: second.clone(),
                        relation: relation.clone(),
                        query_template: template.clone(),
                    });
                }
            }
        }
        out
    }
}

/// Alphanumeric token runs with their byte offsets. Punctuation never
/// reaches the edit-distance scorer.
fn tokenize_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            tokens.push((s, &text[s..i]));
        }
    }
    if let Some(s) = start {
        tokens.push((s, &text[s..]));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(vec![
            EntityTypeDef::new("company")
                .with_known_values(vec!["Acme".to_string(), "Globex".to_string()])
                .with_fuzzy(),
            EntityTypeDef::new("skill")
                .with_known_values(vec!["Rust".to_string(), "Kubernetes".to_string()])
                .with_fuzzy()
                .with_alias("k8s", "Kubernetes"),
            EntityTypeDef::new("topic")
                .with_patterns(vec![
                    Regex::new(r"(?i)\babout\s+(\w+)").unwrap(),
                ])
                .with_max_extractions(1),
        ])
    }

    // ---- verbatim ----

    #[test]
    fn test_verbatim_match() {
        let entities = extractor().extract("did she work at Acme?");
        let company = entities.iter().find(|e| e.entity_type == "company").unwrap();
        assert_eq!(company.value, "Acme");
        assert_eq!(company.confidence, 1.0);
        assert_eq!(company.position, 16);
    }

    #[test]
    fn test_verbatim_case_insensitive() {
        let entities = extractor().extract("tell me about ACME");
        assert!(entities.iter().any(|e| e.value == "Acme" && e.confidence == 1.0));
    }

    // ---- fuzzy ----

    #[test]
    fn test_fuzzy_match_discounted() {
        // one substitution away from "rust", punctuation stripped
        let entities = extractor().extract("does he know ruzt?");
        let skill = entities.iter().find(|e| e.entity_type == "skill").unwrap();
        assert_eq!(skill.value, "Rust");
        assert!(skill.confidence < 1.0);
        assert!(skill.confidence > 0.5);
    }

    #[test]
    fn test_verbatim_preempts_fuzzy() {
        let entities = extractor().extract("rust experience");
        let skills: Vec<_> = entities.iter().filter(|e| e.entity_type == "skill").collect();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].confidence, 1.0);
    }

    // ---- regex ----

    #[test]
    fn test_regex_capture_group() {
        let extractor = extractor();
        let entities = extractor.extract_entity("topic", "what about leadership styles");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].value, "leadership");
        assert_eq!(entities[0].confidence, 0.8);
    }

    // ---- aliases / caps / ordering ----

    #[test]
    fn test_alias_canonicalization() {
        let entities = extractor().extract("any k8s experience?");
        let skill = entities.iter().find(|e| e.entity_type == "skill").unwrap();
        assert_eq!(skill.value, "Kubernetes");
    }

    #[test]
    fn test_sorted_by_confidence() {
        let entities = extractor().extract("did she use ruzt at Acme?");
        assert!(entities.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert_eq!(entities[0].value, "Acme");
    }

    #[test]
    fn test_unknown_type_is_empty() {
        assert!(extractor().extract_entity("planet", "mars").is_empty());
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(extractor().extract("hello there").is_empty());
    }

    // ---- relationships ----

    #[test]
    fn test_skill_company_relationship() {
        let extractor = extractor();
        let entities = extractor.extract("did she use Rust at Acme?");
        let rels = extractor.find_relationships(&entities);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relation, "used_at");
        assert_eq!(rels[0].first.value, "Rust");
        assert_eq!(rels[0].second.value, "Acme");
    }

    #[test]
    fn test_no_relationship_without_pair() {
        let extractor = extractor();
        let entities = extractor.extract("rust is great");
        assert!(extractor.find_relationships(&entities).is_empty());
    }
}
