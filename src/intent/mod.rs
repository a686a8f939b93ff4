//! Intent routing
//!
//! This module provides:
//! - Unsafe-request rejection before any SQL is generated
//! - Intent classification into data query / alert management / mixed
//! - Follow-up resolution against the previous conversation turn
//!
//! Classification is a data-driven keyword scan over both the original
//! text and its English form, so Persian markers keep working even when
//! translation degrades to passthrough.


use crate::core::error::RouteError;
use crate::core::types::Intent;
use crate::memory::ConversationTurn;
use crate::ontology::normalize::fold_text;

/// Router that classifies queries and rejects out-of-scope requests.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    /// Markers that indicate alert-management intent
    alert_markers: Vec<&'static str>,
    /// Markers that indicate an explicit data question
    data_markers: Vec<&'static str>,
    /// Destructive phrasings rejected before SQL generation
    destructive_markers: Vec<&'static str>,
    /// Credential or prompt disclosure phrasings
    disclosure_markers: Vec<&'static str>,
    /// Longest follow-up query, in words
    follow_up_max_words: usize,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    /// Create a router with the default marker tables.
    pub fn new() -> Self {
        Self {
            alert_markers: vec![
                // English
                "alert",
                "notify",
                "warn me",
                "warning",
                "threshold",
                "set alert",
                "alert me",
                "notify me",
                "message when",
                "notify when",
                "alert when",
                "warn when",
                "let me know when",
                "let me know if",
                "tell me when",
                "tell me if",
                "send me a message",
                // Persian
                "هشدار",
                "اعلان",
                "اطلاع بده",
                "خبرم کن",
                "خبر بده",
                "پیامک",
                "اس ام اس",
                "پیام بده",
                "بهم بگو وقتی",
                "بهم بگو اگر",
            ],
            data_markers: vec![
                // English
                "what is",
                "what was",
                "how much",
                "how many",
                "show me",
                "give me",
                "current",
                "latest",
                "status",
                "average",
                "minimum",
                "maximum",
                "compare",
                // Persian
                "چنده",
                "چقدر",
                "چند بود",
                "نشان بده",
                "نشون بده",
                "وضعیت",
                "میانگین",
                "چطوره",
                "مقایسه",
                "آخرین",
            ],
            destructive_markers: vec![
                "drop table",
                "delete from",
                "delete all",
                "update set",
                "insert into",
                "alter table",
                "create table",
                "truncate table",
                "truncate",
                "remove table",
                "clear table",
                "drop database",
                // Persian, including the verb-final phrasings
                "حذف جدول",
                "پاک کردن جدول",
                "حذف همه داده",
                "پاک کردن داده",
                "داده ها را پاک",
                "داده ها را حذف",
            ],
            disclosure_markers: vec![
                "system prompt",
                "your prompt",
                "your instructions",
                "ignore previous instructions",
                "ignore your instructions",
                "api key",
                "secret key",
                "password",
                "passwords",
                "credentials",
                "connection string",
                // Persian
                "رمز عبور",
                "پرامپت سیستم",
                "کلید دسترسی",
            ],
            follow_up_max_words: 4,
        }
    }

    /// Reject destructive or disclosure requests. Runs before descriptor
    /// building, so unsafe intents that would never reach SQL are still
    /// caught. The reason stays internal; callers log it and show the
    /// user a generic refusal.
    pub fn guard(&self, original: &str, english: &str) -> Result<(), RouteError> {
        let folded_original = fold_text(original);
        let folded_english = fold_text(english);

        for marker in &self.destructive_markers {
            if folded_original.contains(marker) || folded_english.contains(marker) {
                return Err(RouteError::UnsafeRequest {
                    reason: format!("destructive phrasing: {}", marker),
                });
            }
        }
        for marker in &self.disclosure_markers {
            if folded_original.contains(marker) || folded_english.contains(marker) {
                return Err(RouteError::UnsafeRequest {
                    reason: format!("disclosure phrasing: {}", marker),
                });
            }
        }
        Ok(())
    }

    /// Classify a query. `history` is the session's prior turns, oldest
    /// first; a bare follow-up with no markers of its own inherits the
    /// previous turn's intent.
    pub fn classify(&self, original: &str, english: &str, history: &[ConversationTurn]) -> Intent {
        let folded_original = fold_text(original);
        let folded_english = fold_text(english);

        let alert_hits = self.count_hits(&self.alert_markers, &folded_original, &folded_english);
        let data_hits = self.count_hits(&self.data_markers, &folded_original, &folded_english);

        if alert_hits > 0 && data_hits > 0 {
            tracing::debug!(alert_hits, data_hits, "classified as mixed");
            return Intent::Mixed;
        }
        if alert_hits > 0 {
            tracing::debug!(alert_hits, "classified as alert_management");
            return Intent::AlertManagement;
        }
        if data_hits > 0 {
            return Intent::DataQuery;
        }

        // No markers fired: a short follow-up inherits the previous
        // turn's intent ("and yesterday?" stays whatever it was).
        if folded_english.split_whitespace().count() <= self.follow_up_max_words {
            if let Some(previous) = history.last() {
                tracing::debug!(
                    inherited = %previous.intent,
                    "follow-up query inherits previous intent"
                );
                return previous.intent;
            }
        }

        Intent::DataQuery
    }

    fn count_hits(&self, markers: &[&'static str], original: &str, english: &str) -> usize {
        markers
            .iter()
            .filter(|marker| original.contains(*marker) || english.contains(*marker))
            .count()
    }
}
