//! Natural-language scheduling parser.
//!
//! Converts a free-form instruction ("Team meeting tomorrow at 2pm")
//! into a [`SchedulingRequest`]: a title, a proposed time range, an
//! optional attendee set, and a confidence marker. The parser is a
//! pure function of its inputs — the caller supplies the reference
//! "now" and timezone, so resolution is deterministic and testable
//! without wall-clock mocking.
//!
//! If an instruction cannot be resolved unambiguously, the parser
//! returns an error rather than guessing.
//!
//! # Recognized shapes
//!
//! The temporal phrase is the leftmost suffix of the instruction that
//! resolves in full; everything before it is the title. Supported
//! phrases:
//!
//! - `today` / `tomorrow`, optionally followed by a time
//! - `next <weekday>` / `this <weekday>`, optionally with a time
//! - a bare weekday name (`Friday at 10am`) — next future occurrence
//! - an ISO date (`2026-04-01`), optionally with a time
//! - an explicit time (`2pm`, `2:30pm`, `14:00`) — next future
//!   occurrence of that wall-clock time
//! - a named time (`noon`, `morning`, `midnight`, `end of day`, ...)
//! - an offset (`in 2 hours`, `in 45 minutes`)
//!
//! A duration clause (`for 30 minutes`, `for 2 hours`, `for an hour`)
//! may appear anywhere; without one the event lasts
//! [`DEFAULT_EVENT_DURATION_MINUTES`] minutes. A `with A, B and C`
//! clause in the title becomes the attendee set.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::ParseError;
use crate::model::{Confidence, SchedulingRequest, TimeRange};

/// Event duration applied when the instruction has no `for ...`
/// clause: 60 minutes.
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 60;

/// Starts up to this many seconds before `reference_now` are accepted,
/// so a "2pm" instruction sent at exactly 2pm survives clock skew.
pub const PAST_START_TOLERANCE_SECS: i64 = 5;

/// Parse a scheduling instruction into a structured event draft.
///
/// Relative terms resolve against `reference_now` in `tz`; bare times
/// resolve to the next future occurrence. See the module docs for the
/// accepted grammar.
///
/// # Errors
///
/// - [`ParseError::NoTimeExpression`] — no suffix of the instruction
///   resolves as a temporal phrase
/// - [`ParseError::EmptyTitle`] — the whole instruction is temporal,
///   or the title reduces to nothing after trimming
/// - [`ParseError::StartInPast`] — the resolved start precedes
///   `reference_now` by more than [`PAST_START_TOLERANCE_SECS`]
/// - [`ParseError::InvalidLocalTime`] — the resolved wall-clock time
///   does not exist in `tz` (DST spring-forward gap)
/// - [`ParseError::OutOfRange`] — the event end falls outside the
///   representable datetime range
pub fn parse(
    text: &str,
    reference_now: DateTime<Utc>,
    tz: Tz,
) -> Result<SchedulingRequest, ParseError> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(ParseError::NoTimeExpression(text.to_string()));
    }

    let duration = extract_duration(&mut tokens)
        .unwrap_or_else(|| Duration::minutes(DEFAULT_EVENT_DURATION_MINUTES));

    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let local_now = reference_now.with_timezone(&tz);

    // Leftmost fully-resolving suffix wins; the prefix is the title.
    let mut split = None;
    for i in 0..tokens.len() {
        if let Some(resolution) = resolve_phrase(&lowered[i..], &local_now, reference_now) {
            split = Some((i, resolution));
            break;
        }
    }
    let Some((split_at, resolution)) = split else {
        return Err(ParseError::NoTimeExpression(text.to_string()));
    };
    if split_at == 0 {
        return Err(ParseError::EmptyTitle(text.to_string()));
    }

    let (title, attendees) = split_attendees(&trim_title(&tokens[..split_at]));
    if title.is_empty() {
        return Err(ParseError::EmptyTitle(text.to_string()));
    }

    let (start, confidence) = match resolution {
        Resolution::Offset(instant) => (instant, Confidence::Exact),
        Resolution::Wall { naive, confidence } => {
            let local = tz
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| ParseError::InvalidLocalTime(text.to_string()))?;
            (local.with_timezone(&Utc), confidence)
        }
    };

    if confidence == Confidence::Exact
        && start < reference_now - Duration::seconds(PAST_START_TOLERANCE_SECS)
    {
        return Err(ParseError::StartInPast {
            start,
            now: reference_now,
        });
    }

    let end = start
        .checked_add_signed(duration)
        .ok_or_else(|| ParseError::OutOfRange(text.to_string()))?;

    Ok(SchedulingRequest {
        title,
        proposed_range: TimeRange::from_ordered(start, end),
        attendees,
        confidence,
    })
}

// ── Temporal phrase resolution ──────────────────────────────────────────────

/// The outcome of resolving a temporal phrase: either an absolute
/// instant (anchor + offset) or a local wall-clock datetime that still
/// needs timezone mapping.
enum Resolution {
    Offset(DateTime<Utc>),
    Wall {
        naive: NaiveDateTime,
        confidence: Confidence,
    },
}

/// Resolve an entire phrase (already lowercased) or return `None`.
/// Partial matches do not count: trailing unrecognized words make the
/// whole phrase unresolvable, which pushes the split point rightward.
fn resolve_phrase(
    words: &[String],
    local_now: &DateTime<Tz>,
    reference_now: DateTime<Utc>,
) -> Option<Resolution> {
    let words = strip_leading_connective(words);
    if words.is_empty() {
        return None;
    }

    // "in N minutes/hours/days" — an exact offset from the anchor.
    // A count too large to represent is not a time expression.
    if words[0] == "in" && words.len() == 3 {
        let n: i64 = words[1].parse().ok()?;
        if n <= 0 {
            return None;
        }
        let seconds = unit_seconds(&words[2])?;
        let offset = n.checked_mul(seconds).and_then(Duration::try_seconds)?;
        return Some(Resolution::Offset(reference_now.checked_add_signed(offset)?));
    }

    // Date-anchored: "<date-words> [at] [time-words]"
    if let Some((date, consumed)) = parse_date_words(words, local_now) {
        let rest = strip_leading_connective(&words[consumed..]);
        if rest.is_empty() {
            // Only a calendar date: midnight placeholder, low confidence.
            return Some(Resolution::Wall {
                naive: date.and_hms_opt(0, 0, 0)?,
                confidence: Confidence::DateOnly,
            });
        }
        let time = parse_time_words(rest)?;
        return Some(Resolution::Wall {
            naive: date.and_time(time),
            confidence: Confidence::Exact,
        });
    }

    // Bare time: next future occurrence of that wall-clock time.
    let time = parse_time_words(words)?;
    let mut naive = local_now.date_naive().and_time(time);
    if naive <= local_now.naive_local() {
        naive += Duration::days(1);
    }
    Some(Resolution::Wall {
        naive,
        confidence: Confidence::Exact,
    })
}

/// Parse the leading date words of a phrase, returning the resolved
/// date and how many words were consumed.
fn parse_date_words(words: &[String], local_now: &DateTime<Tz>) -> Option<(NaiveDate, usize)> {
    let today = local_now.date_naive();

    match words[0].as_str() {
        "today" => return Some((today, 1)),
        "tomorrow" => return Some((today.succ_opt()?, 1)),
        "next" | "this" if words.len() >= 2 => {
            if let Some(weekday) = parse_weekday(&words[1]) {
                let date = match words[0].as_str() {
                    "next" => {
                        // Always future: same weekday jumps a week.
                        let ahead = days_ahead(local_now.weekday(), weekday);
                        today + Duration::days(if ahead == 0 { 7 } else { ahead })
                    }
                    _ => {
                        // "this": same calendar week, may be past.
                        let diff = weekday.num_days_from_monday() as i64
                            - local_now.weekday().num_days_from_monday() as i64;
                        today + Duration::days(diff)
                    }
                };
                return Some((date, 2));
            }
        }
        _ => {}
    }

    // Bare weekday: next future occurrence, a week out when named today.
    if let Some(weekday) = parse_weekday(&words[0]) {
        let ahead = days_ahead(local_now.weekday(), weekday);
        return Some((today + Duration::days(if ahead == 0 { 7 } else { ahead }), 1));
    }

    // Explicit ISO date.
    if let Ok(date) = NaiveDate::parse_from_str(&words[0], "%Y-%m-%d") {
        return Some((date, 1));
    }

    None
}

/// Days from `from` forward to `to`, 0..=6.
fn days_ahead(from: Weekday, to: Weekday) -> i64 {
    (to.num_days_from_monday() as i64 - from.num_days_from_monday() as i64 + 7) % 7
}

/// Parse the remaining words of a phrase as a time of day. The words
/// must be consumed in full.
fn parse_time_words(words: &[String]) -> Option<NaiveTime> {
    let joined = words.join(" ");
    if let Some(time) = named_time(&joined) {
        return Some(time);
    }
    // "2 pm" → "2pm"
    parse_clock_time(&words.concat())
}

/// Map a named time of day to a conventional clock time.
fn named_time(s: &str) -> Option<NaiveTime> {
    match s {
        "morning" => NaiveTime::from_hms_opt(9, 0, 0),
        "noon" | "midday" | "lunch" => NaiveTime::from_hms_opt(12, 0, 0),
        "afternoon" => NaiveTime::from_hms_opt(13, 0, 0),
        "end of day" | "eob" => NaiveTime::from_hms_opt(17, 0, 0),
        "evening" => NaiveTime::from_hms_opt(18, 0, 0),
        "night" => NaiveTime::from_hms_opt(21, 0, 0),
        "midnight" => NaiveTime::from_hms_opt(0, 0, 0),
        _ => None,
    }
}

/// Parse a clock time: "2pm", "2:30pm", "14:00", "14:30:00".
fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
        return Some(t);
    }

    let (rest, is_pm) = if let Some(rest) = s.strip_suffix("pm") {
        (rest, true)
    } else if let Some(rest) = s.strip_suffix("am") {
        (rest, false)
    } else {
        return None;
    };

    let mut parts = rest.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || !(1..=12).contains(&hour) {
        return None;
    }

    let hour24 = match (hour, is_pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn unit_seconds(unit: &str) -> Option<i64> {
    match unit {
        "minute" | "minutes" | "min" | "mins" => Some(60),
        "hour" | "hours" | "hr" | "hrs" => Some(3600),
        "day" | "days" => Some(86400),
        _ => None,
    }
}

fn strip_leading_connective(words: &[String]) -> &[String] {
    match words.first().map(String::as_str) {
        Some("on") | Some("at") if words.len() > 1 => &words[1..],
        _ => words,
    }
}

// ── Instruction clauses ─────────────────────────────────────────────────────

/// Remove the first `for N minutes|hours` (or `for an hour`) clause
/// from the token stream and return its duration.
fn extract_duration(tokens: &mut Vec<&str>) -> Option<Duration> {
    for i in 0..tokens.len() {
        if !tokens[i].eq_ignore_ascii_case("for") || i + 2 >= tokens.len() {
            continue;
        }
        let amount = tokens[i + 1].to_lowercase();
        let unit = tokens[i + 2].to_lowercase();

        let duration = if amount == "an" || amount == "a" {
            match unit.as_str() {
                "hour" => Some(Duration::hours(1)),
                "minute" => Some(Duration::minutes(1)),
                _ => None,
            }
        } else {
            amount.parse::<i64>().ok().filter(|n| *n > 0).and_then(|n| {
                let secs = unit_seconds(&unit)?;
                n.checked_mul(secs).and_then(Duration::try_seconds)
            })
        };

        if let Some(duration) = duration {
            tokens.drain(i..i + 3);
            return Some(duration);
        }
    }
    None
}

/// Split a `with A, B and C` clause off the title into an attendee set.
fn split_attendees(title: &str) -> (String, BTreeSet<String>) {
    let lowered = title.to_lowercase();
    let Some(pos) = lowered.find(" with ") else {
        return (title.to_string(), BTreeSet::new());
    };

    let names: BTreeSet<String> = title[pos + " with ".len()..]
        .split(',')
        .flat_map(|chunk| chunk.split(" and "))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return (title.to_string(), BTreeSet::new());
    }
    (title[..pos].trim().to_string(), names)
}

/// Join title tokens, dropping trailing connectives and punctuation
/// left behind by the phrase split ("Standup at" → "Standup").
fn trim_title(tokens: &[&str]) -> String {
    let mut end = tokens.len();
    while end > 0 {
        let word = tokens[end - 1].trim_end_matches([',', ';']).to_lowercase();
        if word.is_empty() || matches!(word.as_str(), "on" | "at" | "for" | "from") {
            end -= 1;
        } else {
            break;
        }
    }
    tokens[..end]
        .join(" ")
        .trim_end_matches([',', ';'])
        .to_string()
}

// ── Tests ───────────────────────────────────────────────────────────────────
