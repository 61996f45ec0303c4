//! Last-resort keyword search over the profile.
//!
//! Built once at startup from the loaded [`Profile`]; queries score each
//! indexed document by the best per-token match weighted by which field
//! it landed in. Deliberately small: this layer only fires after every
//! structured understanding layer has passed.

use parley_match::FuzzyMatcher;

use crate::types::Profile;

/// Fuzzy token hits must clear this before they count at all.
const FUZZY_FLOOR: f64 = 0.75;
/// Fuzzy hits are discounted relative to exact hits.
const FUZZY_WEIGHT: f64 = 0.6;
const PREFIX_SCORE: f64 = 0.8;

/// Tunable scoring parameters, mirrored from `[search]` config.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    pub min_score: f64,
    pub max_results: usize,
    pub title_boost: f64,
    pub company_boost: f64,
    pub keyword_boost: f64,
    pub min_length_ratio: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            max_results: 3,
            title_boost: 3.0,
            company_boost: 2.0,
            keyword_boost: 1.0,
            min_length_ratio: 0.25,
        }
    }
}

/// What kind of profile item a hit points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    Role,
    Skill,
    School,
}

/// One ranked search result.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub kind: HitKind,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

struct IndexDoc {
    kind: HitKind,
    title: String,
    company: String,
    keywords: Vec<String>,
    snippet: String,
}

/// In-memory keyword index over a profile. Read-only after build.
pub struct SearchEngine {
    docs: Vec<IndexDoc>,
    options: SearchOptions,
    matcher: FuzzyMatcher,
}

impl SearchEngine {
    pub fn new(profile: &Profile, options: SearchOptions) -> Self {
        let mut docs = Vec::new();

        for role in &profile.experience {
            let mut keywords: Vec<String> = Vec::new();
            for h in &role.highlights {
                keywords.extend(tokenize(h));
            }
            keywords.extend(role.technologies.iter().map(|t| t.to_lowercase()));
            docs.push(IndexDoc {
                kind: HitKind::Role,
                title: role.title.to_lowercase(),
                company: role.company.to_lowercase(),
                keywords,
                snippet: format!("{} at {}", role.title, role.company),
            });
        }

        for group in &profile.skills {
            for skill in &group.competencies {
                docs.push(IndexDoc {
                    kind: HitKind::Skill,
                    title: skill.name.to_lowercase(),
                    company: String::new(),
                    keywords: tokenize(&group.category),
                    snippet: format!("{} ({})", skill.name, group.category),
                });
            }
        }

        for school in &profile.education {
            docs.push(IndexDoc {
                kind: HitKind::School,
                title: school.degree.to_lowercase(),
                company: school.institution.to_lowercase(),
                keywords: tokenize(&school.field),
                snippet: format!("{} in {}, {}", school.degree, school.field, school.institution),
            });
        }

        Self {
            docs,
            options,
            matcher: FuzzyMatcher::default(),
        }
    }

    /// Ranks documents against the query.
    ///
    /// Per document: for every query token take the best single token
    /// match in each field, weighted by the field boost, and sum. Hits
    /// at or below `min_score` are dropped, as are hits where too little
    /// of the query actually matched anything.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }
        let query_alpha_len: usize = tokens.iter().map(|t| t.len()).sum();

        let mut hits: Vec<SearchHit> = Vec::new();

        for doc in &self.docs {
            let mut score = 0.0;
            let mut matched_len = 0usize;

            for token in &tokens {
                let mut best: f64 = 0.0;
                let title_tokens = tokenize(&doc.title);
                for field_token in &title_tokens {
                    best = best.max(self.token_score(token, field_token) * self.options.title_boost);
                }
                let company_tokens = tokenize(&doc.company);
                for field_token in &company_tokens {
                    best =
                        best.max(self.token_score(token, field_token) * self.options.company_boost);
                }
                for field_token in &doc.keywords {
                    best =
                        best.max(self.token_score(token, field_token) * self.options.keyword_boost);
                }
                if best > 0.0 {
                    matched_len += token.len();
                }
                score += best;
            }

            if score <= self.options.min_score {
                continue;
            }
            if (matched_len as f64) / (query_alpha_len as f64) < self.options.min_length_ratio {
                continue;
            }

            hits.push(SearchHit {
                kind: doc.kind,
                title: doc.title.clone(),
                snippet: doc.snippet.clone(),
                score,
            });
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(self.options.max_results);
        hits
    }

    fn token_score(&self, query_token: &str, field_token: &str) -> f64 {
        if query_token == field_token {
            return 1.0;
        }
        if field_token.starts_with(query_token) {
            return PREFIX_SCORE;
        }
        let fuzzy = self.matcher.similarity(query_token, field_token);
        if fuzzy >= FUZZY_FLOOR {
            fuzzy * FUZZY_WEIGHT
        } else {
            0.0
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}
