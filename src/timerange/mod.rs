//! Time-range canonicalization
//!
//! Relative time phrases in Persian or English are canonicalized into
//! [`TimeRangeToken`]s; a token resolves into concrete `[start, end)`
//! UTC bounds. Resolution is pure: the same token and the same `now`
//! always produce the same bounds, and the end bound is exclusive so a
//! reading exactly at a bucket boundary is never counted twice.
//!
//! Comparison phrasings ("this week vs last week") yield an ordered pair
//! of tokens. Each side stays a distinct token; nothing here or
//! downstream may merge the pair back into one range.


use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::TimeRangeError;
use crate::ontology::normalize::fold_text;

/// Units accepted in numeric-relative tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }

    fn duration(&self, n: u32) -> Duration {
        match self {
            TimeUnit::Hours => Duration::hours(n as i64),
            TimeUnit::Days => Duration::days(n as i64),
            TimeUnit::Weeks => Duration::weeks(n as i64),
        }
    }
}

/// Largest accepted quantity in a numeric-relative token. Anything above
/// this is treated as noise, not a time range.
const MAX_QUANTITY: u32 = 1000;

/// A canonical time range token.
///
/// Canonical string forms: `{N}_{unit}_ago` with plural unit, or the
/// named tokens `today`, `yesterday`, `this_week`, `last_week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRangeToken {
    /// `(now - N * unit, now)`
    Relative { n: u32, unit: TimeUnit },
    /// `[midnight today, midnight tomorrow)`
    Today,
    /// `[midnight yesterday, midnight today)`
    Yesterday,
    /// `[Monday 00:00 of the current ISO week, next Monday 00:00)`
    ThisWeek,
    /// The Monday-to-Monday window before `ThisWeek`
    LastWeek,
}

impl TimeRangeToken {
    /// Render the canonical string form.
    pub fn canonical(&self) -> String {
        match self {
            TimeRangeToken::Relative { n, unit } => format!("{}_{}_ago", n, unit.as_str()),
            TimeRangeToken::Today => "today".to_string(),
            TimeRangeToken::Yesterday => "yesterday".to_string(),
            TimeRangeToken::ThisWeek => "this_week".to_string(),
            TimeRangeToken::LastWeek => "last_week".to_string(),
        }
    }

    /// Parse a canonical string form.
    pub fn parse_canonical(token: &str) -> Result<Self, TimeRangeError> {
        match token {
            "today" => return Ok(TimeRangeToken::Today),
            "yesterday" => return Ok(TimeRangeToken::Yesterday),
            "this_week" => return Ok(TimeRangeToken::ThisWeek),
            "last_week" => return Ok(TimeRangeToken::LastWeek),
            _ => {}
        }

        let parts: Vec<&str> = token.split('_').collect();
        if parts.len() == 3 && parts[2] == "ago" {
            let unit = match parts[1] {
                "hours" => TimeUnit::Hours,
                "days" => TimeUnit::Days,
                "weeks" => TimeUnit::Weeks,
                _ => {
                    return Err(TimeRangeError::UnknownToken {
                        token: token.to_string(),
                    })
                }
            };
            let n: u64 = parts[0].parse().map_err(|_| TimeRangeError::UnknownToken {
                token: token.to_string(),
            })?;
            if n == 0 || n > MAX_QUANTITY as u64 {
                return Err(TimeRangeError::QuantityOutOfRange { value: n });
            }
            return Ok(TimeRangeToken::Relative { n: n as u32, unit });
        }

        Err(TimeRangeError::UnknownToken {
            token: token.to_string(),
        })
    }

    /// Resolve the token into `[start, end)` UTC bounds. Pure: same
    /// token and same `now` always yield the same pair, `start < end`,
    /// and `end` is exclusive.
    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            TimeRangeToken::Relative { n, unit } => (now - unit.duration(*n), now),
            TimeRangeToken::Today => {
                let start = midnight(now);
                (start, start + Duration::days(1))
            }
            TimeRangeToken::Yesterday => {
                let end = midnight(now);
                (end - Duration::days(1), end)
            }
            TimeRangeToken::ThisWeek => {
                let start = week_start(now);
                (start, start + Duration::weeks(1))
            }
            TimeRangeToken::LastWeek => {
                let end = week_start(now);
                (end - Duration::weeks(1), end)
            }
        }
    }

    /// Whether the resolved window spans more than one day. Drives the
    /// default grouping policy in the descriptor builder.
    pub fn is_multi_day(&self) -> bool {
        match self {
            TimeRangeToken::Relative { n, unit } => match unit {
                TimeUnit::Hours => *n > 24,
                TimeUnit::Days => *n > 1,
                TimeUnit::Weeks => true,
            },
            TimeRangeToken::Today | TimeRangeToken::Yesterday => false,
            TimeRangeToken::ThisWeek | TimeRangeToken::LastWeek => true,
        }
    }
}

impl std::fmt::Display for TimeRangeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl std::str::FromStr for TimeRangeToken {
    type Err = TimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_canonical(s)
    }
}

impl Serialize for TimeRangeToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for TimeRangeToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeRangeToken::parse_canonical(&raw).map_err(D::Error::custom)
    }
}

fn midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = now.weekday().num_days_from_monday() as i64;
    midnight(now) - Duration::days(days_from_monday)
}

struct Mention {
    position: usize,
    token: TimeRangeToken,
}

lazy_static! {
    // "3 days ago", "last 3 days", "over the past 2 weeks"
    static ref EN_NUMERIC_AGO: Regex =
        Regex::new(r"\b(\d+)\s*(hour|day|week)s?\s+(?:ago|back|earlier|before)\b").unwrap();
    static ref EN_NUMERIC_LAST: Regex =
        Regex::new(r"\b(?:last|past|previous|recent)\s+(\d+)\s*(hour|day|week)s?\b").unwrap();
    static ref EN_WORD_LAST: Regex = Regex::new(
        r"\b(?:last|past|previous|recent)\s+(two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s+(hour|day|week)s?\b"
    )
    .unwrap();
    // "۳ روز پیش", "2 هفته گذشته"
    static ref FA_NUMERIC: Regex =
        Regex::new(r"(\d+)\s*(ساعت|روز|هفته)\s*(?:پیش|قبل|گذشته|اخیر)").unwrap();
    static ref FA_WORD: Regex = Regex::new(
        r"(دو|سه|چهار|پنج|شش|هفت|هشت|نه|ده)\s+(ساعت|روز|هفته)\s*(?:پیش|قبل|گذشته|اخیر)"
    )
    .unwrap();

    static ref EN_TODAY: Regex = Regex::new(r"\btoday\b").unwrap();
    static ref EN_YESTERDAY: Regex = Regex::new(r"\byesterday\b").unwrap();
    static ref EN_THIS_WEEK: Regex = Regex::new(r"\b(?:this|current)\s+week\b").unwrap();
    static ref EN_LAST_WEEK: Regex = Regex::new(r"\b(?:last|previous|past)\s+week\b").unwrap();
    static ref FA_TODAY: Regex = Regex::new(r"امروز").unwrap();
    static ref FA_YESTERDAY: Regex = Regex::new(r"دیروز").unwrap();
    static ref FA_THIS_WEEK: Regex = Regex::new(r"این\s+هفته").unwrap();
    static ref FA_LAST_WEEK: Regex = Regex::new(r"هفته\s+(?:گذشته|قبل|پیش)").unwrap();

    static ref COMPARISON_MARKERS: Regex = Regex::new(
        r"\b(?:compare|compared|comparison|versus|vs\.?|between)\b|مقایسه|نسبت به|در مقابل|تفاوت"
    )
    .unwrap();
}

fn english_unit(raw: &str) -> TimeUnit {
    match raw {
        "hour" => TimeUnit::Hours,
        "day" => TimeUnit::Days,
        _ => TimeUnit::Weeks,
    }
}

fn persian_unit(raw: &str) -> TimeUnit {
    match raw {
        "ساعت" => TimeUnit::Hours,
        "روز" => TimeUnit::Days,
        _ => TimeUnit::Weeks,
    }
}

fn english_word_number(raw: &str) -> u32 {
    match raw {
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        _ => 12,
    }
}

fn persian_word_number(raw: &str) -> u32 {
    match raw {
        "دو" => 2,
        "سه" => 3,
        "چهار" => 4,
        "پنج" => 5,
        "شش" => 6,
        "هفت" => 7,
        "هشت" => 8,
        "نه" => 9,
        _ => 10,
    }
}

fn push_mention(
    mentions: &mut Vec<Mention>,
    covered: &mut Vec<(usize, usize)>,
    position: usize,
    end: usize,
    token: TimeRangeToken,
) {
    let overlaps = covered.iter().any(|&(s, e)| position < e && end > s);
    if !overlaps {
        covered.push((position, end));
        mentions.push(Mention { position, token });
    }
}

/// Collect every time-period mention in the folded text, in textual
/// order. Numeric-relative patterns are collected before idioms so a
/// phrase like "last 2 weeks" never double-counts as "last week".
fn collect_mentions(folded: &str) -> Vec<Mention> {
    let mut mentions: Vec<Mention> = Vec::new();
    let mut covered: Vec<(usize, usize)> = Vec::new();

    let numeric: [(&Regex, bool); 3] = [
        (&EN_NUMERIC_AGO, true),
        (&EN_NUMERIC_LAST, true),
        (&FA_NUMERIC, false),
    ];
    for (pattern, english) in numeric {
        for caps in pattern.captures_iter(folded) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let n = match caps[1].parse::<u32>() {
                Ok(n) if n >= 1 && n <= MAX_QUANTITY => n,
                _ => continue,
            };
            let unit = if english {
                english_unit(&caps[2])
            } else {
                persian_unit(&caps[2])
            };
            push_mention(
                &mut mentions,
                &mut covered,
                whole.start(),
                whole.end(),
                TimeRangeToken::Relative { n, unit },
            );
        }
    }

    for caps in EN_WORD_LAST.captures_iter(folded) {
        if let Some(whole) = caps.get(0) {
            let n = english_word_number(&caps[1]);
            let unit = english_unit(&caps[2]);
            push_mention(
                &mut mentions,
                &mut covered,
                whole.start(),
                whole.end(),
                TimeRangeToken::Relative { n, unit },
            );
        }
    }
    for caps in FA_WORD.captures_iter(folded) {
        if let Some(whole) = caps.get(0) {
            let n = persian_word_number(&caps[1]);
            let unit = persian_unit(&caps[2]);
            push_mention(
                &mut mentions,
                &mut covered,
                whole.start(),
                whole.end(),
                TimeRangeToken::Relative { n, unit },
            );
        }
    }

    let idioms: [(&Regex, TimeRangeToken); 8] = [
        (&EN_THIS_WEEK, TimeRangeToken::ThisWeek),
        (&EN_LAST_WEEK, TimeRangeToken::LastWeek),
        (&FA_THIS_WEEK, TimeRangeToken::ThisWeek),
        (&FA_LAST_WEEK, TimeRangeToken::LastWeek),
        (&EN_TODAY, TimeRangeToken::Today),
        (&EN_YESTERDAY, TimeRangeToken::Yesterday),
        (&FA_TODAY, TimeRangeToken::Today),
        (&FA_YESTERDAY, TimeRangeToken::Yesterday),
    ];
    for (pattern, token) in idioms {
        for m in pattern.find_iter(folded) {
            push_mention(&mut mentions, &mut covered, m.start(), m.end(), token);
        }
    }

    mentions.sort_by_key(|m| m.position);
    mentions
}

/// Recognize one relative-time phrase in free text. When several
/// are present the leftmost wins.
pub fn parse_phrase(text: &str) -> Option<TimeRangeToken> {
    let folded = fold_text(text);
    collect_mentions(&folded).into_iter().next().map(|m| m.token)
}

/// Whether the text carries comparison phrasing at all.
pub fn has_comparison_phrasing(text: &str) -> bool {
    COMPARISON_MARKERS.is_match(&fold_text(text))
}

/// Extract an ordered comparison pair (or longer list) of period tokens.
/// Requires comparison phrasing plus at least two distinct period
/// mentions; order follows the text.
pub fn comparison_list(text: &str) -> Option<Vec<TimeRangeToken>> {
    let folded = fold_text(text);
    if !COMPARISON_MARKERS.is_match(&folded) {
        return None;
    }

    let mut tokens: Vec<TimeRangeToken> = Vec::new();
    for mention in collect_mentions(&folded) {
        if !tokens.contains(&mention.token) {
            tokens.push(mention.token);
        }
    }
    if tokens.len() >= 2 {
        Some(tokens)
    } else {
        None
    }
}
