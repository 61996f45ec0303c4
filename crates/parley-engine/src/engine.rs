//! The per-turn orchestrator.
//!
//! [`ChatEngine::respond`] runs one user message through an ordered
//! cascade of layers. Each layer either produces the turn's reply and
//! short-circuits, or passes the message down. The whole turn runs
//! under a deadline; a turn that blows it is replaced by a generic
//! apology rather than a hung widget.
//!
//! Cascade order:
//!   1. interrupt commands (reset the conversation)
//!   2. the debug command
//!   3. an active scripted flow
//!   4. direct topic payloads (suggestion-chip clicks)
//!   5. small-talk detection and intent classification, in parallel
//!   6. entity extraction and reference resolution
//!   7. composition of the surviving parts into one reply
//!   8. fallbacks: gibberish, vague, missing context, search, shrug

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use parley_context::{ContextManager, ContextResolver, KvStore, UserProfile};
use parley_core::events::now_millis;
use parley_core::{
    AnalyticsEvent, AnalyticsSink, ExtractedEntity, ParleyConfig, Reply, ReplyKind, Result,
    UiCommand,
};
use parley_match::FuzzyMatcher;
use parley_nlu::{
    builtin_catalog, ContextValidator, EntityExtractor, FollowUpValidation, IntentClassifier,
    Reference, ReferenceResolver, ReferenceType, SmallTalkHandler,
};
use parley_profile::search::SearchOptions;
use parley_profile::{Profile, SearchEngine};

use crate::answers;
use crate::coordinator::ResponseCoordinator;
use crate::fallback::{FallbackCategory, FallbackStrategy};
use crate::flow::{self, FlowEngine};

/// Phrases that abandon whatever is in progress and reset the turn.
const INTERRUPTS: &[&str] = &["stop", "reset", "restart", "help", "start over", "never mind"];

/// History length at which the visitor counts as engaged, unlocking
/// context boosters in the classifier.
const ENGAGED_AFTER_TURNS: usize = 3;

const TOUR_FLOW: &str = "tour";

const APOLOGY: &str =
    "Sorry, something went sideways on my end. Mind trying that again?";

/// Where a scripted flow currently stands.
#[derive(Clone, Debug)]
struct ActiveFlow {
    flow_id: String,
    node: String,
}

// ============================================================================
// Engine
// ============================================================================

/// Owns every analyzer plus the conversation state for one visitor.
///
/// One engine per session. `respond` takes `&mut self`; concurrent
/// sessions each get their own engine over a shared [`Profile`].
pub struct ChatEngine {
    config: ParleyConfig,
    profile: Arc<Profile>,
    classifier: Arc<IntentClassifier>,
    extractor: EntityExtractor,
    search: SearchEngine,
    matcher: FuzzyMatcher,
    resolver: ContextResolver,
    coordinator: ResponseCoordinator,
    flows: FlowEngine,
    active_flow: Option<ActiveFlow>,
    context: ContextManager,
    user_profile: UserProfile,
    store: Arc<dyn KvStore>,
    sink: Arc<dyn AnalyticsSink>,
    rng: StdRng,
}

impl ChatEngine {
    pub fn new(
        profile: Profile,
        config: ParleyConfig,
        store: Arc<dyn KvStore>,
        sink: Arc<dyn AnalyticsSink>,
    ) -> Result<Self> {
        let extractor = EntityExtractor::for_profile(&profile);
        let search = SearchEngine::new(
            &profile,
            SearchOptions {
                min_score: config.search.min_score,
                max_results: config.search.max_results,
                title_boost: config.search.title_boost,
                company_boost: config.search.company_boost,
                keyword_boost: config.search.keyword_boost,
                min_length_ratio: config.search.min_length_ratio,
            },
        );
        let classifier = Arc::new(IntentClassifier::new(
            builtin_catalog(),
            config.classifier.default_intent_threshold,
        ));
        let matcher = FuzzyMatcher {
            threshold: config.matching.fuzzy_threshold,
            partial_length_ratio: config.matching.partial_length_ratio,
        };
        let flows = FlowEngine::new(vec![flow::guided_tour()])?;
        let resolver = ContextResolver::new(&config.context);
        let coordinator = ResponseCoordinator::new(config.engine.max_suggestions);
        let context = ContextManager::new(store.clone(), config.context.clone());
        let mut user_profile =
            UserProfile::load(&store, &config.context.profile_storage_key);
        user_profile.record_visit();

        info!(
            intents = classifier.intent_names().len(),
            history = context.history_len(),
            "engine ready"
        );

        Ok(Self {
            config,
            profile: Arc::new(profile),
            classifier,
            extractor,
            search,
            matcher,
            resolver,
            coordinator,
            flows,
            active_flow: None,
            context,
            user_profile,
            store,
            sink,
            rng: StdRng::from_entropy(),
        })
    }

    /// Seeds the response RNG, making variant picks reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    pub fn user_profile(&self) -> &UserProfile {
        &self.user_profile
    }

    /// Runs one turn under the configured deadline. Always yields a
    /// well-formed reply; an overrun turn yields the apology instead
    /// of whatever the cascade was doing.
    pub async fn respond(&mut self, raw: &str) -> Reply {
        if !self.config.engine.enabled {
            return Reply::plain("Chat is taking a break right now.", ReplyKind::Error);
        }

        let started = Instant::now();
        let deadline = Duration::from_millis(self.config.engine.turn_timeout_ms);
        let (reply, timed_out) = match tokio::time::timeout(deadline, self.turn(raw)).await {
            Ok(reply) => (reply, false),
            Err(_) => {
                warn!(deadline_ms = self.config.engine.turn_timeout_ms, "turn timed out");
                (Reply::plain(APOLOGY, ReplyKind::Error), true)
            }
        };
        self.sink.track(AnalyticsEvent::TurnCompleted {
            latency_ms: started.elapsed().as_millis() as u64,
            timed_out,
            timestamp: now_millis(),
        });
        reply
    }

    async fn turn(&mut self, raw: &str) -> Reply {
        let mut message = raw.trim().to_string();
        if message.is_empty() {
            return Reply::plain(
                "I didn't catch that. What would you like to know?",
                ReplyKind::Clarification,
            )
            .with_suggestions(self.topic_chips(None));
        }
        if message.chars().count() > self.config.engine.max_message_chars {
            message = message
                .chars()
                .take(self.config.engine.max_message_chars)
                .collect();
        }
        let lower = message.to_lowercase();
        debug!(%message, "turn start");

        // --- 1. interrupts -------------------------------------------------
        if INTERRUPTS.contains(&lower.as_str()) {
            self.active_flow = None;
            self.context.reset();
            self.context.save();
            return Reply::plain(
                "No problem, let's start fresh. What would you like to know?",
                ReplyKind::Menu,
            )
            .with_suggestions(self.topic_chips(None));
        }

        // --- 2. debug command ----------------------------------------------
        if lower == self.config.engine.debug_command {
            return self.debug_reply();
        }

        // --- 3. scripted flow ----------------------------------------------
        if let Some(active) = self.active_flow.clone() {
            if let Some(step) = self.flows.advance(&active.flow_id, &active.node, &lower) {
                self.active_flow = if step.is_terminal {
                    None
                } else {
                    Some(ActiveFlow {
                        flow_id: active.flow_id.clone(),
                        node: step.node.clone(),
                    })
                };
                self.sink.track(AnalyticsEvent::ScriptAdvanced {
                    flow: active.flow_id,
                    node: step.node,
                    timestamp: now_millis(),
                });
                let reply = Reply::plain(step.message, ReplyKind::Scripted)
                    .with_suggestions(step.suggestions);
                self.commit(&message, None, None, &[], &reply);
                return reply;
            }
            // Off-script input abandons the flow and falls through.
            self.active_flow = None;
        }
        if lower == TOUR_FLOW {
            if let Some(step) = self.flows.start(TOUR_FLOW) {
                self.active_flow = Some(ActiveFlow {
                    flow_id: TOUR_FLOW.to_string(),
                    node: step.node.clone(),
                });
                self.sink.track(AnalyticsEvent::ScriptAdvanced {
                    flow: TOUR_FLOW.to_string(),
                    node: step.node,
                    timestamp: now_millis(),
                });
                let reply = Reply::plain(step.message, ReplyKind::Scripted)
                    .with_suggestions(step.suggestions);
                self.commit(&message, None, None, &[], &reply);
                return reply;
            }
        }

        // --- 4. direct payloads --------------------------------------------
        if self.classifier.intent_names().contains(&lower.as_str()) {
            if let Some(reply) = self.answer_intent(&lower, &[], 1.0, None) {
                self.commit(&message, Some(&lower), Some(&lower), &[], &reply);
                return reply;
            }
        }

        // --- 5. small-talk and classification, in parallel -----------------
        // Both analyzers are pure, so each runs on its own task over an
        // owned copy of the query. A panicked task costs that analyzer's
        // result, not the turn.
        let flags = self.context_flags();
        let classifier = Arc::clone(&self.classifier);
        let classify_query = message.clone();
        let classify_task =
            tokio::spawn(async move { classifier.classify(&classify_query, &flags) });
        let smalltalk_query = message.clone();
        let smalltalk_task =
            tokio::spawn(async move { SmallTalkHandler::detect(&smalltalk_query) });
        let (scores, smalltalk) = tokio::join!(classify_task, smalltalk_task);
        let scores = scores.unwrap_or_default();
        let smalltalk = smalltalk.ok().flatten();

        // --- 6. entities and references ------------------------------------
        let entities = self.extractor.extract(&message);
        let reference = ReferenceResolver::detect_reference(&message);

        if let Some(Reference {
            ref_type: ReferenceType::ContextSwitch,
            topic: Some(topic),
        }) = &reference
        {
            let topic_lower = topic.trim().to_lowercase();
            // An exact or near-miss topic name ("skillz") lands on the
            // matching intent directly.
            let names = self.classifier.intent_names();
            if let Some(best) = self.matcher.find_best_match(&topic_lower, &names, None) {
                let intent = best.value.to_string();
                let confidence = best.score as f32;
                if let Some(reply) =
                    self.answer_intent(&intent, &entities, confidence, smalltalk)
                {
                    self.commit(&message, Some(&intent), Some(&intent), &entities, &reply);
                    return reply;
                }
            }
            // Not an answerable topic by name; remember it and let the
            // rest of the cascade have a go at the full message.
            self.context.set_topic(topic);
        }

        let is_follow_up = matches!(
            reference.as_ref().map(|r| r.ref_type),
            Some(
                ReferenceType::Pronoun
                    | ReferenceType::More
                    | ReferenceType::Previous
                    | ReferenceType::Next
            )
        );
        if is_follow_up && !self.context.entity_stack().is_empty() {
            let resolution = self.resolver.resolve(
                &message,
                self.context.entity_stack(),
                self.context.active_topic(),
            );
            if resolution.needs_clarification && resolution.candidates.len() >= 2 {
                let first = resolution.candidates[0].entity.value.clone();
                let second = resolution.candidates[1].entity.value.clone();
                let reply = Reply::plain(
                    format!("Just to be sure — do you mean {} or {}?", first, second),
                    ReplyKind::Clarification,
                )
                .with_suggestions(vec![first, second]);
                self.commit(&message, None, None, &entities, &reply);
                return reply;
            }
            if let Some(resolved) = resolution.resolved {
                let implied = match resolved.entity_type.as_str() {
                    "company" => Some("experience"),
                    "skill" => Some("skills"),
                    _ => None,
                };
                let intent = scores
                    .first()
                    .filter(|s| self.classifier.meets_threshold(s))
                    .map(|s| s.intent.as_str())
                    .or(implied);
                if let Some(intent) = intent {
                    let intent = intent.to_string();
                    let mut narrowed = entities.clone();
                    narrowed.push(ExtractedEntity {
                        entity_type: resolved.entity_type.clone(),
                        value: resolved.value.clone(),
                        confidence: resolution.confidence,
                        position: 0,
                    });
                    if let Some(reply) =
                        self.answer_intent(&intent, &narrowed, resolution.confidence, smalltalk)
                    {
                        self.commit(
                            &message,
                            Some(&intent),
                            Some(&resolved.value),
                            &narrowed,
                            &reply,
                        );
                        return reply;
                    }
                }
            }
        }

        // --- 7. compose the answer -----------------------------------------
        if let Some(rel) = self.extractor.find_relationships(&entities).into_iter().next() {
            if let Some(reply) = answers::render_relationship(&rel, &self.profile) {
                let reply = self.finish_answer(reply, 0.9, smalltalk);
                self.commit(
                    &message,
                    Some("experience"),
                    Some(&rel.second.value),
                    &entities,
                    &reply,
                );
                return reply;
            }
        }

        let best = scores
            .first()
            .filter(|s| self.classifier.meets_threshold(s))
            .cloned();
        if let Some(best) = best {
            if let Some(reply) =
                self.answer_intent(&best.intent, &entities, best.confidence, smalltalk)
            {
                self.commit(&message, Some(&best.intent), Some(&best.intent), &entities, &reply);
                return reply;
            }
        }

        // A confidently extracted entity answers even when no intent
        // cleared the bar ("does she work at Invitrace?").
        if let Some(entity) = entities
            .iter()
            .find(|e| e.confidence >= 0.9 && matches!(e.entity_type.as_str(), "company" | "skill"))
            .cloned()
        {
            let intent = if entity.entity_type == "company" {
                "experience"
            } else {
                "skills"
            };
            if let Some(reply) =
                self.answer_intent(intent, &entities, entity.confidence, smalltalk)
            {
                self.commit(&message, Some(intent), Some(&entity.value), &entities, &reply);
                return reply;
            }
        }

        if let Some(kind) = smalltalk {
            let text = SmallTalkHandler::respond(kind, &mut self.rng);
            let reply = Reply::plain(text, ReplyKind::Greeting)
                .with_suggestions(self.topic_chips(None));
            self.commit(&message, None, None, &entities, &reply);
            return reply;
        }

        // --- 8. fallbacks ---------------------------------------------------
        let reply = self.fall_back(&message, &lower, reference.as_ref());
        self.commit(&message, None, None, &entities, &reply);
        reply
    }

    // ------------------------------------------------------------------
    // Layer helpers
    // ------------------------------------------------------------------

    fn answer_intent(
        &mut self,
        intent: &str,
        entities: &[ExtractedEntity],
        confidence: f32,
        smalltalk: Option<parley_nlu::SmallTalkKind>,
    ) -> Option<Reply> {
        let reply = answers::render(intent, &self.profile, entities)?;
        self.sink.track(AnalyticsEvent::IntentClassified {
            intent: intent.to_string(),
            confidence,
            timestamp: now_millis(),
        });
        Some(self.finish_answer(reply, confidence, smalltalk))
    }

    /// Caps and decorates an answer, prepending a small-talk opener
    /// when one was detected alongside it.
    fn finish_answer(
        &mut self,
        answer: Reply,
        confidence: f32,
        smalltalk: Option<parley_nlu::SmallTalkKind>,
    ) -> Reply {
        let intent = answer.intent.clone();
        let suggestions = self.topic_chips(intent.as_deref());
        let answer = answer.with_confidence(confidence).with_suggestions(suggestions);

        let mut parts = Vec::new();
        if let Some(kind) = smalltalk {
            parts.push(Reply::plain(
                SmallTalkHandler::respond(kind, &mut self.rng),
                ReplyKind::Greeting,
            ));
        }
        parts.push(answer);
        self.coordinator
            .compose(parts)
            .unwrap_or_else(|| Reply::plain(APOLOGY, ReplyKind::Error))
    }

    fn fall_back(&mut self, message: &str, lower: &str, reference: Option<&Reference>) -> Reply {
        if ContextValidator::is_gibberish(message) {
            return self.fallback_reply(FallbackCategory::Gibberish);
        }

        if ContextValidator::is_vague(message) {
            if lower.contains("everything") {
                return self.fallback_reply(FallbackCategory::TooBroad);
            }
            let mut reply = self.fallback_reply(FallbackCategory::Vague);
            if let Some(fact) = self.random_fact() {
                reply.text = format!("{} For instance: {}", reply.text, fact);
            }
            return reply;
        }

        if let Some(reference) = reference {
            if let FollowUpValidation::NoContext { .. } = ContextValidator::validate_follow_up(
                reference.ref_type,
                self.context.history_len(),
            ) {
                return self.fallback_reply(FallbackCategory::NoContext);
            }
        }

        let search_started = Instant::now();
        let hits = self.search.search(message);
        self.sink.track(AnalyticsEvent::SearchPerformed {
            query: message.to_string(),
            result_count: hits.len(),
            latency_ms: search_started.elapsed().as_millis() as u64,
            timestamp: now_millis(),
        });
        if let Some(hit) = hits.first() {
            let mut reply = Reply::plain(
                format!(
                    "Not sure exactly what you're after, but this looks close: {} — {}",
                    hit.title, hit.snippet
                ),
                ReplyKind::Answer,
            )
            .with_suggestions(self.topic_chips(None));
            reply.confidence = (hit.score / 10.0).min(1.0) as f32;
            return reply;
        }

        self.fallback_reply(FallbackCategory::LowConfidence)
    }

    fn fallback_reply(&mut self, category: FallbackCategory) -> Reply {
        self.sink.track(AnalyticsEvent::FallbackUsed {
            category: category.name().to_string(),
            timestamp: now_millis(),
        });
        FallbackStrategy::respond(category, &mut self.rng)
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Records the finished turn into context and the visitor profile,
    /// then persists both. Persistence failures are logged inside the
    /// managers, never surfaced.
    fn commit(
        &mut self,
        query: &str,
        intent: Option<&str>,
        topic: Option<&str>,
        entities: &[ExtractedEntity],
        reply: &Reply,
    ) {
        let pairs: Vec<(String, String)> = entities
            .iter()
            .map(|e| (e.entity_type.clone(), e.value.clone()))
            .collect();
        self.context.record_user_turn(query, intent, &pairs);
        // Set after the turn is recorded so the fresh topic skips this
        // turn's decay pass.
        if let Some(topic) = topic {
            self.context.set_topic(topic);
        }
        self.context.record_bot_turn(&reply.text);
        self.context.save();

        self.user_profile.absorb_turn(query, intent, &pairs);
        self.user_profile
            .save(&self.store, &self.config.context.profile_storage_key);

        for command in &reply.commands {
            let name = match command {
                UiCommand::Scroll { .. } => "scroll",
                UiCommand::Download { .. } => "download",
                UiCommand::Theme { .. } => "theme",
                UiCommand::OpenLink { .. } => "open_link",
            };
            self.sink.track(AnalyticsEvent::CommandExecuted {
                command: name.to_string(),
                timestamp: now_millis(),
            });
        }
    }

    fn context_flags(&self) -> HashSet<String> {
        let mut flags = HashSet::new();
        if self.context.history_len() >= ENGAGED_AFTER_TURNS {
            flags.insert("engaged".to_string());
        }
        flags
    }

    fn topic_chips(&self, intent: Option<&str>) -> Vec<String> {
        answers::suggestions_for(intent, &self.user_profile, self.config.engine.max_suggestions)
    }

    fn random_fact(&mut self) -> Option<String> {
        let mut facts: Vec<String> = Vec::new();
        if let Some(role) = self.profile.latest_role() {
            facts.push(format!("{} works as {} at {}.",
                self.profile.person.name, role.title, role.company));
            if let Some(highlight) = role.highlights.first() {
                facts.push(format!("At {}: {}.", role.company, highlight));
            }
        }
        let skills = self.profile.skill_names();
        if !skills.is_empty() {
            facts.push(format!("Core skills include {}.", skills.join(", ")));
        }
        if facts.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..facts.len());
        Some(facts.swap_remove(index))
    }

    fn debug_reply(&self) -> Reply {
        let context = self.context.context();
        let stack: Vec<&str> = context
            .entity_stack
            .iter()
            .map(|e| e.value.as_str())
            .collect();
        let topic = context
            .active_topic
            .as_ref()
            .map(|t| format!("{} ({:.2})", t.name, t.confidence))
            .unwrap_or_else(|| "none".to_string());
        let text = format!(
            "version: {}\nturns: {}\nrecent intents: {:?}\nentity stack: {:?}\nactive topic: {}\nflow: {:?}",
            context.version,
            context.history.len(),
            context.recent_intents,
            stack,
            topic,
            self.active_flow.as_ref().map(|f| f.node.as_str()),
        );
        Reply::plain(text, ReplyKind::Debug)
    }
}

// ============================================================================
// Tests
// ============================================================================
