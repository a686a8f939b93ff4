//! Language detection and query translation
//!
//! Detection is a pure character-ratio heuristic over Arabic-script
//! code points. Translation goes through the [`TextCompletion`] seam
//! with an LRU cache in front; when the backend is unavailable or
//! fails, a word-substitution dictionary keeps the pipeline running.
//! Translation never fails the request: the worst case is passing the
//! original text through unchanged.

#[cfg(test)]
mod tests;

use std::num::NonZeroUsize;
use std::sync::Arc;

use lazy_static::lazy_static;
use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;

use crate::core::types::Language;
use crate::llm::{CompletionRequest, TextCompletion};
use crate::ontology::normalize::fold_text;

/// Keywords that tip mixed-script text toward Persian.
const PERSIAN_KEYWORDS: [&str; 11] = [
    "آب", "دما", "رطوبت", "خاک", "گیاه", "آفات", "مصرف", "امروز", "دیروز", "هفته", "ماه",
];

/// Detect whether text is Persian or English.
///
/// Counts Arabic-script code points (U+0600-U+06FF and U+0750-U+077F)
/// against all alphabetic characters. Mostly-Persian text resolves
/// immediately; mixed text falls back to a keyword check. Empty or
/// non-alphabetic input defaults to English.
pub fn detect(text: &str) -> Language {
    let mut persian = 0usize;
    let mut english = 0usize;
    let mut alpha = 0usize;

    for ch in text.chars() {
        let arabic_script =
            ('\u{0600}'..='\u{06FF}').contains(&ch) || ('\u{0750}'..='\u{077F}').contains(&ch);
        if arabic_script {
            persian += 1;
            alpha += 1;
        } else if ch.is_alphabetic() {
            alpha += 1;
            if ch.is_ascii() {
                english += 1;
            }
        }
    }

    if alpha == 0 {
        return Language::En;
    }

    let persian_ratio = persian as f64 / alpha as f64;
    let english_ratio = english as f64 / alpha as f64;

    if persian_ratio > 0.4 {
        Language::Fa
    } else if english_ratio > 0.6 {
        Language::En
    } else if persian_ratio > 0.2 && english_ratio > 0.2 {
        // Mixed content: Persian domain keywords break the tie.
        if PERSIAN_KEYWORDS.iter().any(|k| text.contains(k)) {
            Language::Fa
        } else {
            Language::En
        }
    } else {
        Language::En
    }
}

/// Translation direction, also the cache key discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    FaToEn,
    EnToFa,
}

const TO_ENGLISH_SYSTEM: &str = "You are an expert translator specializing in agriculture and \
greenhouse management queries. Translate the Persian query into natural, fluent English that \
captures the full semantic meaning. Reply with the translation only.";

const TO_PERSIAN_SYSTEM: &str = "You are an expert translator. Translate the English text about \
agriculture and greenhouse management into natural Persian. Reply with the translation only.";

/// Few-shot pairs sent with every query translation.
const FEW_SHOT: [(&str, &str); 5] = [
    ("دمای گلخانه الان چنده؟", "What is the current greenhouse temperature?"),
    ("مصرف آب این هفته چقدر بود؟", "How much water was used this week?"),
    ("رطوبت خاک دیروز چطور بود؟", "How was the soil moisture yesterday?"),
    (
        "مقایسه دمای این هفته با هفته گذشته",
        "Compare this week's temperature with last week's",
    ),
    ("وضعیت آفات چطوره؟", "What is the pest situation?"),
];

/// Query translator backed by the completion seam with an LRU cache.
pub struct Translator {
    completion: Arc<dyn TextCompletion>,
    cache: Mutex<LruCache<(Direction, String), String>>,
}

impl Translator {
    /// Create a translator. `cache_size` entries are kept per process;
    /// zero is clamped to one.
    pub fn new(completion: Arc<dyn TextCompletion>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            completion,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Translate a Persian query to English. Degrades to the
    /// substitution dictionary, then to passthrough.
    pub async fn to_english(&self, text: &str) -> String {
        self.translate(Direction::FaToEn, text).await
    }

    /// Translate an English sentence to Persian. Degrades to
    /// passthrough.
    pub async fn to_persian(&self, text: &str) -> String {
        self.translate(Direction::EnToFa, text).await
    }

    async fn translate(&self, direction: Direction, text: &str) -> String {
        let key = (direction, text.to_string());
        if let Some(cached) = self.cache.lock().get(&key) {
            tracing::debug!(direction = ?direction, "translation cache hit");
            return cached.clone();
        }

        if !self.completion.is_available() {
            return self.degrade(direction, text);
        }

        let request = match direction {
            Direction::FaToEn => CompletionRequest::new(build_query_prompt(text))
                .with_system(TO_ENGLISH_SYSTEM)
                .with_temperature(0.2),
            Direction::EnToFa => CompletionRequest::new(format!("English: {}\n\nPersian:", text))
                .with_system(TO_PERSIAN_SYSTEM)
                .with_temperature(0.2),
        };

        match self.completion.complete(request).await {
            Ok(response) => {
                let translated = strip_label(&response.text);
                if translated.is_empty() {
                    tracing::warn!("translation returned empty text, degrading");
                    return self.degrade(direction, text);
                }
                tracing::info!(
                    direction = ?direction,
                    duration_ms = response.duration_ms,
                    "translated query"
                );
                self.cache.lock().put(key, translated.clone());
                translated
            }
            Err(err) => {
                tracing::warn!(error = %err, "translation failed, degrading");
                self.degrade(direction, text)
            }
        }
    }

    fn degrade(&self, direction: Direction, text: &str) -> String {
        match direction {
            Direction::FaToEn => fallback_translate(text),
            // No dictionary for this direction; the caller's templates
            // already localize, so passthrough is safe.
            Direction::EnToFa => text.to_string(),
        }
    }
}

fn build_query_prompt(text: &str) -> String {
    let mut prompt = String::new();
    for (fa, en) in FEW_SHOT {
        prompt.push_str("Persian: ");
        prompt.push_str(fa);
        prompt.push_str("\nEnglish: ");
        prompt.push_str(en);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Persian: ");
    prompt.push_str(text);
    prompt.push_str("\nEnglish:");
    prompt
}

/// Strip a leading "English:" / "Persian:" label some models echo back.
fn strip_label(text: &str) -> String {
    let trimmed = text.trim();
    for label in ["english:", "persian:", "translation:"] {
        // get() rejects non-boundary offsets, which multibyte replies hit.
        if let Some(head) = trimmed.get(..label.len()) {
            if head.eq_ignore_ascii_case(label) {
                return trimmed[label.len()..].trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

lazy_static! {
    /// Numeric-relative time phrases, rewritten before the phrase pass so
    /// "۳ هفته گذشته" stays "3 weeks ago" instead of colliding with the
    /// bare "هفته گذشته" idiom below.
    static ref FALLBACK_NUMERIC: Regex =
        Regex::new(r"(\d+)\s*(ساعت|روز|هفته)\s*(?:پیش|قبل|گذشته|اخیر)").unwrap();

    /// Multi-word phrases, replaced before the word pass.
    static ref FALLBACK_PHRASES: Vec<(&'static str, &'static str)> = vec![
        ("مصرف آب", "water usage"),
        ("در مقابل", "versus"),
        ("نسبت به", "versus"),
        ("هفته گذشته", "last week"),
        ("هفته قبل", "last week"),
        ("این هفته", "this week"),
    ];

    /// Word-for-word fallback dictionary, keyed by folded form.
    static ref FALLBACK_WORDS: std::collections::HashMap<&'static str, &'static str> = {
        let entries: [(&str, &str); 58] = [
            ("آبیاری", "irrigation"),
            ("ابیاری", "irrigation"),
            ("آب", "water"),
            ("دما", "temperature"),
            ("دمای", "temperature"),
            ("رطوبت", "humidity"),
            ("فشار", "pressure"),
            ("امروز", "today"),
            ("دیروز", "yesterday"),
            ("وضعیت", "status"),
            ("چطوره", "how is"),
            ("گلخانه", "greenhouse"),
            ("گلخونه", "greenhouse"),
            ("آفات", "pests"),
            ("آفت", "pest"),
            ("هفته", "week"),
            ("ماه", "month"),
            ("سال", "year"),
            ("روز", "day"),
            ("ساعت", "hour"),
            ("گذشته", "past"),
            ("اخیر", "recent"),
            ("پیش", "ago"),
            ("قبل", "before"),
            ("این", "this"),
            ("آن", "that"),
            ("آخرین", "last"),
            ("اولین", "first"),
            ("خاک", "soil"),
            ("گیاه", "plant"),
            ("برگ", "leaf"),
            ("میوه", "fruit"),
            ("نور", "light"),
            ("باد", "wind"),
            ("باران", "rain"),
            ("کود", "fertilizer"),
            ("سم", "pesticide"),
            ("بیماری", "disease"),
            ("مقایسه", "compare"),
            ("تفاوت", "difference"),
            ("نسبت", "ratio"),
            ("بیشتر", "more"),
            ("کمتر", "less"),
            ("بالا", "high"),
            ("پایین", "low"),
            ("افزایش", "increase"),
            ("کاهش", "decrease"),
            ("تغییر", "change"),
            ("محصول", "crop"),
            ("برداشت", "harvest"),
            ("کاشت", "planting"),
            ("بذر", "seed"),
            ("سنسور", "sensor"),
            ("داده", "data"),
            ("اطلاعات", "information"),
            ("گزارش", "report"),
            ("مقدار", "value"),
            ("عدد", "number"),
        ];
        entries
            .iter()
            .map(|(fa, en)| {
                let folded: &'static str = Box::leak(fold_text(fa).into_boxed_str());
                (folded, *en)
            })
            .collect()
    };
}

/// Word-substitution translation used when the completion backend is
/// unavailable. Unknown words pass through unchanged.
fn fallback_translate(text: &str) -> String {
    let mut working = FALLBACK_NUMERIC
        .replace_all(&fold_text(text), |caps: &regex::Captures<'_>| {
            format!("{} {} ago", &caps[1], english_time_unit(&caps[2]))
        })
        .into_owned();
    for (fa, en) in FALLBACK_PHRASES.iter() {
        working = working.replace(fa, en);
    }

    working
        .split_whitespace()
        .map(|word| *FALLBACK_WORDS.get(word).unwrap_or(&word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn english_time_unit(raw: &str) -> &'static str {
    match raw {
        "ساعت" => "hours",
        "روز" => "days",
        _ => "weeks",
    }
}
