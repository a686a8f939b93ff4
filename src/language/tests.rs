use super::*;

use crate::core::error::CompletionError;
use crate::llm::testing::ScriptedCompletion;

#[test]
fn detects_persian_text() {
    assert_eq!(detect("دمای گلخانه الان چنده؟"), Language::Fa);
    assert_eq!(detect("مصرف آب این هفته"), Language::Fa);
}

#[test]
fn detects_english_text() {
    assert_eq!(detect("What is the current temperature?"), Language::En);
    assert_eq!(detect("compare humidity this week vs last week"), Language::En);
}

#[test]
fn empty_and_numeric_input_default_to_english() {
    assert_eq!(detect(""), Language::En);
    assert_eq!(detect("   "), Language::En);
    assert_eq!(detect("42 > 17"), Language::En);
}

#[test]
fn mixed_text_with_persian_keyword_is_persian() {
    // Ratios land in the mixed band; the keyword decides.
    assert_eq!(detect("دمای abcdef"), Language::Fa);
    assert_eq!(detect("سلام abcdef"), Language::En);
}

#[tokio::test]
async fn translation_uses_backend_and_caches() {
    let backend = std::sync::Arc::new(ScriptedCompletion::new());
    backend.push_text("What is the temperature today?");

    let translator = Translator::new(backend.clone(), 16);
    let first = translator.to_english("دمای امروز چنده؟").await;
    assert_eq!(first, "What is the temperature today?");
    assert_eq!(backend.call_count(), 1);

    // Same input again must come from the cache.
    let second = translator.to_english("دمای امروز چنده؟").await;
    assert_eq!(second, first);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn translation_strips_echoed_label() {
    let backend = std::sync::Arc::new(ScriptedCompletion::new());
    backend.push_text("English: The soil is dry");

    let translator = Translator::new(backend, 16);
    let out = translator.to_english("خاک خشک است").await;
    assert_eq!(out, "The soil is dry");
}

#[tokio::test]
async fn unavailable_backend_skips_straight_to_dictionary() {
    let backend = std::sync::Arc::new(ScriptedCompletion::unavailable());
    let translator = Translator::new(backend.clone(), 16);

    let out = translator.to_english("دما امروز").await;
    assert_eq!(out, "temperature today");
    // The backend must never be called when it reports unavailable.
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn backend_failure_degrades_to_dictionary() {
    let backend = std::sync::Arc::new(ScriptedCompletion::new());
    backend.push_error(CompletionError::Timeout { timeout_ms: 5000 });

    let translator = Translator::new(backend, 16);
    let out = translator.to_english("مصرف آب امروز").await;
    assert_eq!(out, "water usage today");
}

#[tokio::test]
async fn unknown_words_pass_through_unchanged() {
    let backend = std::sync::Arc::new(ScriptedCompletion::unavailable());
    let translator = Translator::new(backend, 16);

    let out = translator.to_english("دما quxbaz").await;
    assert_eq!(out, "temperature quxbaz");
}

#[tokio::test]
async fn persian_direction_passes_through_on_failure() {
    let backend = std::sync::Arc::new(ScriptedCompletion::new());
    backend.push_error(CompletionError::RequestFailed {
        reason: "boom".to_string(),
    });

    let translator = Translator::new(backend, 16);
    let out = translator.to_persian("Average temperature was 24.5").await;
    assert_eq!(out, "Average temperature was 24.5");
}

#[tokio::test]
async fn empty_completion_degrades() {
    let backend = std::sync::Arc::new(ScriptedCompletion::new());
    backend.push_text("   ");

    let translator = Translator::new(backend, 16);
    let out = translator.to_english("دما امروز").await;
    assert_eq!(out, "temperature today");
}

#[test]
fn fallback_translates_folded_persian_digits() {
    assert_eq!(fallback_translate("دما ۲۴"), "temperature 24");
}

#[test]
fn fallback_keeps_week_idioms_parseable() {
    assert_eq!(fallback_translate("هفته گذشته"), "last week");
    assert_eq!(
        fallback_translate("مقایسه دمای این هفته با هفته گذشته"),
        "compare temperature this week با last week"
    );
}

#[test]
fn fallback_numeric_ranges_stay_numeric() {
    // "۳ هفته گذشته" is a quantity, not the bare last-week idiom.
    assert_eq!(fallback_translate("۳ هفته گذشته"), "3 weeks ago");
    assert_eq!(fallback_translate("۲ روز پیش"), "2 days ago");
    assert_eq!(fallback_translate("５ ساعت قبل"), "5 hours ago");
}

#[tokio::test]
async fn translation_round_trip_keeps_detectable_language() {
    let backend = std::sync::Arc::new(ScriptedCompletion::new());
    backend.push_text("How was the soil moisture yesterday?");
    backend.push_text("رطوبت خاک دیروز چطور بود؟");

    let translator = Translator::new(backend, 16);
    let english = translator.to_english("رطوبت خاک دیروز چطور بود؟").await;
    let persian = translator.to_persian(&english).await;
    assert_eq!(detect(&persian), Language::Fa);
}
