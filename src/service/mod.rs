//! Query service orchestration
//!
//! This module wires the full pipeline behind one entry point:
//! - Language detection and degradable Persian-to-English translation
//! - Unsafe-request rejection before any SQL exists
//! - Intent classification with conversation context
//! - Descriptor building, SQL compilation, validation, and execution
//! - Metric extraction, chart assembly, and localized narration
//!
//! Every taxonomy error folds into a [`QueryResult`] with `success`
//! false; user input never surfaces as a hard failure to the caller.

mod respond;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::alert::{AlertCommand, AlertExtractor, AlertSpec};
use crate::core::config::AppConfig;
use crate::core::error::{AgriQueryError, Result};
use crate::core::types::{Intent, Language};
use crate::intent::IntentRouter;
use crate::language::{detect, Translator};
use crate::llm::TextCompletion;
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::ontology::Ontology;
use crate::postprocess::{
    chart_series, comparison_summary, detect_chart_request, extract_metrics, narrative,
    paraphrase, ChartSeries, ComparisonSummary,
};
use crate::query::{self, SqlGuard, SqlStatement};
use crate::semantic::{DescriptorBuilder, SemanticDescriptor, TimeRangeSpec};
use crate::store::{ReadingRow, SensorReadingStore};

/// Everything one turn produces, shaped for the external API layer.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub success: bool,

    /// Final natural-language text, in the detected input language.
    pub response: String,

    /// Raw result rows; empty unless the turn reached the store.
    pub data: Vec<ReadingRow>,

    /// Compiled SQL for diagnostics. Bound values never appear here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// Scalar metrics keyed by aggregation (period-prefixed for
    /// comparisons).
    pub metrics: BTreeMap<String, f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSeries>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonSummary>,

    pub detected_language: Language,

    pub detected_intent: Intent,

    /// English form of a Persian query, when translation changed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_query: Option<String>,

    /// Alert condition extracted from the turn. Persistence and
    /// evaluation belong to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertSpec>,

    /// Stable machine-readable failure kind; `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    fn empty(language: Language, intent: Intent) -> Self {
        Self {
            success: false,
            response: String::new(),
            data: Vec::new(),
            sql: None,
            metrics: BTreeMap::new(),
            chart: None,
            comparison: None,
            detected_language: language,
            detected_intent: intent,
            translated_query: None,
            alert: None,
            error: None,
        }
    }

    fn failure(language: Language, intent: Intent, err: &AgriQueryError) -> Self {
        let mut result = Self::empty(language, intent);
        result.response = respond::failure_message(err, language);
        result.error = Some(respond::error_kind(err).to_string());
        result
    }
}

/// What a finished turn contributes to conversation memory.
#[derive(Default)]
struct TurnRecord {
    entity: Option<String>,
    time_token: Option<String>,
    /// Failed turns are recorded only when rephrasing could fix them.
    recordable_failure: bool,
}

/// Everything the data path produces before shaping the result.
struct DataOutcome {
    descriptor: SemanticDescriptor,
    statement: SqlStatement,
    rows: Vec<ReadingRow>,
    metrics: BTreeMap<String, f64>,
    comparison: Option<ComparisonSummary>,
    chart: Option<ChartSeries>,
    response: String,
}

/// The query pipeline behind [`process_query`](Self::process_query).
/// One instance serves every session; collaborators are injected once
/// and shared.
pub struct QueryService {
    config: AppConfig,
    ontology: Arc<Ontology>,
    memory: Arc<ConversationMemory>,
    translator: Translator,
    router: IntentRouter,
    builder: DescriptorBuilder,
    alerts: AlertExtractor,
    guard: SqlGuard,
    completion: Arc<dyn TextCompletion>,
    store: Arc<dyn SensorReadingStore>,
}

impl QueryService {
    /// Wire a service from its injected collaborators. The translator,
    /// descriptor builder, and alert extractor are deterministic over
    /// the ontology and config, so they are built here.
    pub fn new(
        config: AppConfig,
        ontology: Arc<Ontology>,
        memory: Arc<ConversationMemory>,
        completion: Arc<dyn TextCompletion>,
        store: Arc<dyn SensorReadingStore>,
    ) -> Self {
        let translator = Translator::new(
            Arc::clone(&completion),
            config.completion.translation_cache_size,
        );
        let builder = DescriptorBuilder::new(Arc::clone(&ontology), config.semantic.clone());
        let alerts = AlertExtractor::new(Arc::clone(&ontology));
        Self {
            config,
            ontology,
            memory,
            translator,
            router: IntentRouter::new(),
            builder,
            alerts,
            guard: SqlGuard::new(),
            completion,
            store,
        }
    }

    /// Process one user turn end to end.
    ///
    /// This method:
    /// 1. Detects the query language
    /// 2. Rejects unsafe requests before any external call runs
    /// 3. Translates Persian input to English (degradable)
    /// 4. Re-checks the translated text, then classifies intent
    /// 5. Runs the data path or the alert path
    /// 6. Records the finished turn in conversation memory
    ///
    /// The memory append is the last step and sits after every await,
    /// so a cancelled call never records a partial turn.
    pub async fn process_query(
        &self,
        query: &str,
        session_id: &str,
        feature_context: &str,
    ) -> QueryResult {
        let language = detect(query);

        // 1. Unsafe text must never reach the translator or the store.
        // Rejected turns are never classified; data_query stands in.
        if let Err(err) = self.router.guard(query, query) {
            tracing::warn!(session = session_id, reason = %err, "query rejected");
            return QueryResult::failure(language, Intent::DataQuery, &err.into());
        }

        // 2. Persian input is translated; the translator degrades to a
        // dictionary pass when the backend is down.
        let english = match language {
            Language::Fa => self.translator.to_english(query).await,
            Language::En => query.to_string(),
        };
        let translated = (english != query).then(|| english.clone());

        // 3. The translated form gets the same rejection scan.
        if let Err(err) = self.router.guard(query, &english) {
            tracing::warn!(session = session_id, reason = %err, "translated query rejected");
            return QueryResult::failure(language, Intent::DataQuery, &err.into());
        }

        // 4. Classify with the session history so short follow-ups
        // inherit the previous subject.
        let history = self.memory.history(session_id);
        let intent = self.router.classify(query, &english, &history);
        tracing::debug!(session = session_id, language = %language, intent = %intent, "query routed");

        // 5. Branch.
        let (mut result, record) = match intent {
            Intent::AlertManagement => self.alert_turn(query, &english, language, intent),
            Intent::DataQuery | Intent::Mixed => {
                self.data_turn(query, &english, language, intent, feature_context, &history)
                    .await
            }
        };
        result.translated_query = translated;

        // 6. Record the turn.
        if result.success || record.recordable_failure {
            let mut turn =
                ConversationTurn::new(query, language, intent).with_success(result.success);
            if let Some(english) = result.translated_query.clone() {
                turn = turn.with_translated(english);
            }
            if let Some(entity) = record.entity {
                turn = turn.with_entity(entity);
            }
            if let Some(token) = record.time_token {
                turn = turn.with_time_token(token);
            }
            self.memory.append(session_id, turn);
        }

        result
    }

    /// Extract an alert condition without running the full pipeline.
    /// Persistence and evaluation stay with the caller.
    pub async fn extract_alert(&self, query: &str) -> Result<AlertSpec> {
        let language = detect(query);
        match self.alerts.extract(query) {
            Ok(spec) => Ok(spec),
            Err(first) => {
                if language == Language::Fa {
                    let english = self.translator.to_english(query).await;
                    if english != query {
                        if let Ok(spec) = self.alerts.extract(&english) {
                            return Ok(spec);
                        }
                    }
                }
                Err(first.into())
            }
        }
    }

    /// Alert branch: parse the management command and confirm it. This
    /// core only produces the structured spec; nothing is persisted.
    fn alert_turn(
        &self,
        original: &str,
        english: &str,
        language: Language,
        intent: Intent,
    ) -> (QueryResult, TurnRecord) {
        let mut record = TurnRecord::default();
        let mut result = QueryResult::empty(language, intent);

        match self.parse_alert(original, english) {
            Ok(AlertCommand::Create(spec)) => {
                tracing::info!(sensor = %spec.sensor_type, operator = %spec.comparison_operator, threshold = spec.threshold, "alert condition built");
                record.entity = Some(spec.sensor_type.clone());
                result.success = true;
                result.response = respond::alert_created(&spec, &self.ontology, language);
                result.alert = Some(spec);
            }
            Ok(AlertCommand::List) => {
                result.success = true;
                result.response = respond::alert_list(language);
            }
            Ok(AlertCommand::Delete { target }) => {
                record.entity = target.clone();
                result.success = true;
                result.response =
                    respond::alert_deleted(target.as_deref(), &self.ontology, language);
            }
            Err(err) => {
                record.recordable_failure = err.is_ambiguous();
                result = QueryResult::failure(language, intent, &err);
            }
        }

        (result, record)
    }

    /// Data branch. Mixed turns run the same path and then pick up the
    /// alert condition embedded in the utterance.
    async fn data_turn(
        &self,
        original: &str,
        english: &str,
        language: Language,
        intent: Intent,
        feature_context: &str,
        history: &[ConversationTurn],
    ) -> (QueryResult, TurnRecord) {
        let mut record = TurnRecord::default();
        let mut result = match self
            .run_data_query(original, english, language, feature_context, history)
            .await
        {
            Ok(outcome) => {
                record.entity = Some(outcome.descriptor.entity.clone());
                if let TimeRangeSpec::Single(token) = &outcome.descriptor.time_range {
                    record.time_token = Some(token.canonical());
                }
                let mut result = QueryResult::empty(language, intent);
                result.success = true;
                result.response = outcome.response;
                result.data = outcome.rows;
                result.sql = Some(outcome.statement.sql);
                result.metrics = outcome.metrics;
                result.chart = outcome.chart;
                result.comparison = outcome.comparison;
                result
            }
            Err(err) => {
                record.recordable_failure = err.is_ambiguous();
                QueryResult::failure(language, intent, &err)
            }
        };

        // A mixed utterance wants the condition itself, not command
        // routing: "show me X and alert me when..." is a creation.
        if intent == Intent::Mixed {
            if let Ok(spec) = self.extract_condition(original, english) {
                if result.success {
                    let confirmation = respond::alert_created(&spec, &self.ontology, language);
                    result.response = format!("{} {}", result.response, confirmation);
                }
                record.entity.get_or_insert_with(|| spec.sensor_type.clone());
                result.alert = Some(spec);
            }
        }

        (result, record)
    }

    /// The descriptor-to-narrative pipeline. Errors fold into a failed
    /// result at the caller.
    async fn run_data_query(
        &self,
        original: &str,
        english: &str,
        language: Language,
        feature_context: &str,
        history: &[ConversationTurn],
    ) -> Result<DataOutcome> {
        let descriptor = self.builder.build(english, feature_context, history)?;
        let statement = query::compile(&descriptor)?;

        // Generated SQL passes the same gate as any other statement.
        self.guard.validate(&statement.sql)?;

        // The store owns its timeout and bounded retry.
        let rows = self
            .store
            .execute_select(&statement.sql, &statement.params)
            .await?;
        tracing::debug!(rows = rows.len(), entity = %descriptor.entity, "query executed");

        let metrics = extract_metrics(&rows, &descriptor);
        let comparison = comparison_summary(&rows, &descriptor);
        // Chart vocabulary is scanned on the raw text; translation can
        // drop the Persian chart words.
        let requested = detect_chart_request(original, language);
        let chart = chart_series(&rows, &descriptor, requested, &self.ontology, language);

        let text = narrative(&descriptor, &metrics, comparison.as_ref(), &self.ontology, language);
        let response = paraphrase(
            &text,
            language,
            self.completion.as_ref(),
            &self.config.completion,
        )
        .await;

        Ok(DataOutcome {
            descriptor,
            statement,
            rows,
            metrics,
            comparison,
            chart,
            response,
        })
    }

    /// Try the original text first: the marker tables are bilingual, and
    /// fallback translation can destroy Persian operator words. The
    /// original attempt's error wins when both attempts fail.
    fn parse_alert(&self, original: &str, english: &str) -> Result<AlertCommand> {
        match self.alerts.parse_command(original) {
            Ok(command) => Ok(command),
            Err(first) => {
                if english != original {
                    if let Ok(command) = self.alerts.parse_command(english) {
                        return Ok(command);
                    }
                }
                Err(first.into())
            }
        }
    }

    /// Same original-first fallback, for the bare condition parser.
    fn extract_condition(&self, original: &str, english: &str) -> Result<AlertSpec> {
        match self.alerts.extract(original) {
            Ok(spec) => Ok(spec),
            Err(first) => {
                if english != original {
                    if let Ok(spec) = self.alerts.extract(english) {
                        return Ok(spec);
                    }
                }
                Err(first.into())
            }
        }
    }
}
