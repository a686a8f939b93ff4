//! User-facing response templates
//!
//! Every message exists in both languages. Ambiguous failures name the
//! missing piece so the user knows rephrasing will help; everything
//! else stays generic. Rejection and validation reasons never appear
//! here, only in the logs.

use crate::alert::{AlertSpec, ComparisonOperator};
use crate::core::error::{
    AgriQueryError, AlertParseError, CompletionError, SemanticError, StoreError,
};
use crate::core::types::Language;
use crate::ontology::Ontology;
use crate::postprocess::render_value;

/// Stable machine-readable failure kind carried in `QueryResult::error`.
pub(super) fn error_kind(err: &AgriQueryError) -> &'static str {
    match err {
        AgriQueryError::Route(_) => "unsafe_request",
        AgriQueryError::Semantic(_)
        | AgriQueryError::AlertParse(_)
        | AgriQueryError::TimeRange(_) => "ambiguous_query",
        AgriQueryError::SqlGuard(_) => "validation_rejected",
        AgriQueryError::Completion(CompletionError::Timeout { .. })
        | AgriQueryError::Store(StoreError::Timeout { .. }) => "external_timeout",
        AgriQueryError::Completion(_)
        | AgriQueryError::Store(_)
        | AgriQueryError::Database(_)
        | AgriQueryError::Io(_) => "external_failure",
        _ => "internal",
    }
}

/// Localized failure text for one taxonomy error.
pub(super) fn failure_message(err: &AgriQueryError, language: Language) -> String {
    let text = match err {
        AgriQueryError::Route(_) => return refusal(language),
        AgriQueryError::Semantic(SemanticError::EntityUnresolved { .. }) => match language {
            Language::En => {
                "I couldn't tell which sensor you mean. Try naming one, like \
                 \"soil moisture\" or \"temperature\"."
            }
            Language::Fa => {
                "متوجه نشدم کدام سنسور را می‌گویید. لطفا نام سنسور را مشخص کنید، \
                 مثلا «رطوبت خاک» یا «دما»."
            }
        },
        AgriQueryError::Semantic(SemanticError::ComparisonUnresolved) => match language {
            Language::En => {
                "I couldn't work out which two periods to compare. Try phrasing \
                 like \"this week vs last week\"."
            }
            Language::Fa => {
                "دو بازه زمانی مقایسه را متوجه نشدم. لطفا مانند «این هفته در \
                 مقابل هفته گذشته» بپرسید."
            }
        },
        AgriQueryError::AlertParse(AlertParseError::MissingSensor) => match language {
            Language::En => {
                "I couldn't tell which sensor the alert is for. Try \"alert me \
                 when temperature exceeds 30\"."
            }
            Language::Fa => {
                "متوجه نشدم هشدار برای کدام سنسور است. مثلا بگویید «وقتی دما از \
                 ۳۰ بیشتر شد هشدار بده»."
            }
        },
        AgriQueryError::AlertParse(AlertParseError::MissingOperator) => match language {
            Language::En => {
                "I couldn't tell whether the alert should fire above, below, or \
                 at the value. Try \"exceeds\" or \"drops below\"."
            }
            Language::Fa => {
                "متوجه نشدم هشدار برای بیشتر شدن، کمتر شدن یا رسیدن به مقدار \
                 است. مثلا «بیشتر از» یا «کمتر از» را به کار ببرید."
            }
        },
        AgriQueryError::AlertParse(AlertParseError::MissingThreshold) => match language {
            Language::En => {
                "I couldn't find a number to use as the alert threshold. Try \
                 \"alert me when humidity drops below 40\"."
            }
            Language::Fa => {
                "عدد آستانه هشدار را پیدا نکردم. مثلا بگویید «وقتی رطوبت از ۴۰ \
                 کمتر شد هشدار بده»."
            }
        },
        AgriQueryError::TimeRange(_) => match language {
            Language::En => {
                "I couldn't understand the time range in your question. Try \
                 \"today\", \"yesterday\", or \"last week\"."
            }
            Language::Fa => {
                "بازه زمانی سوال شما را متوجه نشدم. مثلا «امروز»، «دیروز» یا \
                 «هفته گذشته» را امتحان کنید."
            }
        },
        AgriQueryError::Semantic(SemanticError::InvalidDescriptor { .. })
        | AgriQueryError::SqlGuard(_) => match language {
            Language::En => "Sorry, that request could not be processed.",
            Language::Fa => "متاسفانه این درخواست قابل پردازش نیست.",
        },
        _ => match language {
            Language::En => {
                "Something went wrong on our side while answering. Please try \
                 again in a moment."
            }
            Language::Fa => "مشکلی در سمت ما پیش آمد. لطفا چند لحظه دیگر دوباره تلاش کنید.",
        },
    };
    text.to_string()
}

/// Fixed refusal for rejected requests. Never echoes the offending text.
pub(super) fn refusal(language: Language) -> String {
    match language {
        Language::En => "I can only answer questions about your sensor readings and alerts.",
        Language::Fa => "من فقط می‌توانم به سوالات مربوط به داده‌های سنسور و هشدارها پاسخ بدهم.",
    }
    .to_string()
}

/// Confirmation for a parsed alert condition. Carries the display name,
/// direction, threshold, and unit so the user can verify what will be
/// saved.
pub(super) fn alert_created(spec: &AlertSpec, ontology: &Ontology, language: Language) -> String {
    let name = ontology
        .display_name(&spec.sensor_type, language)
        .unwrap_or(&spec.sensor_type);
    let value = render_value(spec.threshold, ontology.unit(&spec.sensor_type));

    match language {
        Language::En => {
            let direction = match spec.comparison_operator {
                ComparisonOperator::Above => "goes above",
                ComparisonOperator::Below => "drops below",
                ComparisonOperator::Equal => "reaches",
            };
            format!("Alert saved: you will be notified when {name} {direction} {value}.")
        }
        Language::Fa => {
            let condition = match spec.comparison_operator {
                ComparisonOperator::Above => format!("از {value} بیشتر شود"),
                ComparisonOperator::Below => format!("از {value} کمتر شود"),
                ComparisonOperator::Equal => format!("به {value} برسد"),
            };
            format!("هشدار ثبت شد: هر وقت {name} {condition}، به شما اطلاع داده می‌شود.")
        }
    }
}

/// Acknowledgement for a list request. The caller owns the alert store
/// and fills in the actual list.
pub(super) fn alert_list(language: Language) -> String {
    match language {
        Language::En => "Here are your saved alerts.",
        Language::Fa => "لیست هشدارهای ذخیره‌شده شما.",
    }
    .to_string()
}

/// Acknowledgement for a delete request, for one named sensor or all.
pub(super) fn alert_deleted(
    target: Option<&str>,
    ontology: &Ontology,
    language: Language,
) -> String {
    match (target, language) {
        (Some(id), Language::En) => {
            let name = ontology.display_name(id, Language::En).unwrap_or(id);
            format!("The {name} alert has been removed.")
        }
        (None, Language::En) => "Your alerts have been removed.".to_string(),
        (Some(id), Language::Fa) => {
            let name = ontology.display_name(id, Language::Fa).unwrap_or(id);
            format!("هشدار {name} حذف شد.")
        }
        (None, Language::Fa) => "هشدارهای شما حذف شدند.".to_string(),
    }
}
