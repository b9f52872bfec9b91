//! Placeholder substitution for aggregation-pipeline skeletons.
//!
//! A skeleton is a JSON text containing sentinel tokens such as
//! `#ticket_uid#`. Rendering walks the skeleton once from left to right and
//! replaces each token with the value resolved from a [`QueryContext`].
//! Substituted text is never scanned again, so a value cannot introduce or
//! consume another placeholder. Values that land inside JSON string literals
//! are escaped, which keeps quotes and backslashes in user input from
//! changing the structure of the pipeline.

use crate::error::{FunifierError, Result};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Default name of the timestamp attribute in Funifier collections
pub const DEFAULT_TIME_ATTRIBUTE: &str = "time";

/// Suffix appended to dates in a `$date` range
const TIME_OF_DAY: &str = "T00:00:00.000Z";

const TIME_PERIOD: Template =
    Template::new(r##"#leading_comma#"#time_attribute#": {"$gte":{"$date":"#n_days#"}}"##);

/// Every substitutable token, in alphabetical order of name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    LeadingComma,
    Lottery,
    NDays,
    NEntries,
    Player,
    Ticket,
    TimeAttribute,
    TimePeriod,
}

impl Placeholder {
    pub const ALL: [Placeholder; 8] = [
        Placeholder::LeadingComma,
        Placeholder::Lottery,
        Placeholder::NDays,
        Placeholder::NEntries,
        Placeholder::Player,
        Placeholder::Ticket,
        Placeholder::TimeAttribute,
        Placeholder::TimePeriod,
    ];

    /// Name between the `#` delimiters
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::LeadingComma => "leading_comma",
            Placeholder::Lottery => "lottery_uid",
            Placeholder::NDays => "n_days",
            Placeholder::NEntries => "n_entries",
            Placeholder::Player => "player_uid",
            Placeholder::Ticket => "ticket_uid",
            Placeholder::TimeAttribute => "time_attribute",
            Placeholder::TimePeriod => "timeperiod",
        }
    }

    pub fn token(self) -> String {
        format!("#{}#", self.name())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Values available to a single render call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    lottery_uid: Option<String>,
    ticket_uid: Option<String>,
    player_uid: Option<String>,
    n_days: Option<u32>,
    n_entries: Option<u32>,
    time_attribute: Option<String>,
    without_leading_comma: bool,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lottery_uid(mut self, uid: impl Into<String>) -> Self {
        self.lottery_uid = Some(uid.into());
        self
    }

    pub fn with_ticket_uid(mut self, uid: impl Into<String>) -> Self {
        self.ticket_uid = Some(uid.into());
        self
    }

    pub fn with_player_uid(mut self, uid: impl Into<String>) -> Self {
        self.player_uid = Some(uid.into());
        self
    }

    /// Restrict to the last `n_days` days; `None` leaves the period open
    pub fn with_n_days(mut self, n_days: Option<u32>) -> Self {
        self.n_days = n_days;
        self
    }

    pub fn with_n_entries(mut self, n_entries: u32) -> Self {
        self.n_entries = Some(n_entries);
        self
    }

    pub fn with_time_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.time_attribute = Some(attribute.into());
        self
    }

    pub fn with_leading_comma(mut self, leading_comma: bool) -> Self {
        self.without_leading_comma = !leading_comma;
        self
    }

    pub fn time_attribute(&self) -> &str {
        self.time_attribute
            .as_deref()
            .unwrap_or(DEFAULT_TIME_ATTRIBUTE)
    }

    pub fn leading_comma(&self) -> bool {
        !self.without_leading_comma
    }

    /// Text substituted for `placeholder`
    pub fn resolve(&self, placeholder: Placeholder) -> Result<String> {
        match placeholder {
            Placeholder::Lottery => required_uid(&self.lottery_uid, "lottery UID"),
            Placeholder::Ticket => required_uid(&self.ticket_uid, "ticket UID"),
            Placeholder::Player => required_uid(&self.player_uid, "player UID"),
            Placeholder::NDays => self
                .n_days
                .map(day_token)
                .ok_or_else(|| FunifierError::validation("day count is required")),
            Placeholder::NEntries => match self.n_entries {
                Some(n) if n > 0 => Ok(n.to_string()),
                Some(_) => Err(FunifierError::validation(
                    "entry count must be greater than zero",
                )),
                None => Err(FunifierError::validation("entry count is required")),
            },
            Placeholder::TimeAttribute => {
                let attribute = self.time_attribute();
                if attribute.trim().is_empty() {
                    return Err(FunifierError::validation("time attribute is empty"));
                }
                Ok(escape_json_string(attribute))
            }
            Placeholder::LeadingComma => {
                let comma = if self.leading_comma() { "," } else { "" };
                Ok(comma.to_string())
            }
            Placeholder::TimePeriod => {
                define_time_period(self.n_days, self.time_attribute(), self.leading_comma())
            }
        }
    }
}

/// A fixed skeleton with `#name#` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    skeleton: &'static str,
}

impl Template {
    pub const fn new(skeleton: &'static str) -> Self {
        Self { skeleton }
    }

    /// Distinct placeholders in order of first appearance
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut found = Vec::new();
        for_each_token(self.skeleton, |segment| {
            if let Segment::Placeholder(p) = segment {
                if !found.contains(&p) {
                    found.push(p);
                }
            }
        });
        found
    }

    pub fn render(&self, ctx: &QueryContext) -> Result<String> {
        let mut out = String::with_capacity(self.skeleton.len() + 64);
        let mut resolved: HashMap<Placeholder, String> = HashMap::new();
        let mut failure = None;

        for_each_token(self.skeleton, |segment| {
            if failure.is_some() {
                return;
            }
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(p) => {
                    let value = match resolved.entry(p) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => match ctx.resolve(p) {
                            Ok(value) => entry.insert(value),
                            Err(e) => {
                                failure = Some(e);
                                return;
                            }
                        },
                    };
                    out.push_str(value);
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }

    /// Render and check that the result is a JSON array of pipeline stages
    pub fn render_pipeline(&self, ctx: &QueryContext) -> Result<String> {
        let body = self.render(ctx)?;
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(_)) => Ok(body),
            Ok(_) => Err(FunifierError::validation(
                "rendered pipeline is not a JSON array",
            )),
            Err(e) => Err(FunifierError::validation(format!(
                "rendered pipeline is not valid JSON: {}",
                e
            ))),
        }
    }
}

enum Segment<'a> {
    Text(&'a str),
    Placeholder(Placeholder),
}

fn for_each_token<'a>(skeleton: &'a str, mut visit: impl FnMut(Segment<'a>)) {
    let mut rest = skeleton;
    while let Some(start) = rest.find('#') {
        if start > 0 {
            visit(Segment::Text(&rest[..start]));
        }
        let after = &rest[start + 1..];
        let placeholder = after
            .find('#')
            .and_then(|end| Placeholder::from_name(&after[..end]).map(|p| (p, end)));

        match placeholder {
            Some((p, end)) => {
                visit(Segment::Placeholder(p));
                rest = &after[end + 1..];
            }
            None => {
                visit(Segment::Text("#"));
                rest = after;
            }
        }
    }
    if !rest.is_empty() {
        visit(Segment::Text(rest));
    }
}

/// Relative day offset understood by Funifier's `$date` operator.
///
/// Zero days ("today") needs a trailing minus: `-0d-`.
pub fn day_token(n_days: u32) -> String {
    if n_days == 0 {
        "-0d-".to_string()
    } else {
        format!("-{}d", n_days)
    }
}

/// `$match` fragment selecting documents newer than `n_days` days.
///
/// Returns an empty string when `n_days` is `None`, so the fragment can be
/// spliced unconditionally after the last field of a `$match` object.
pub fn define_time_period(
    n_days: Option<u32>,
    time_attribute: &str,
    with_leading_comma: bool,
) -> Result<String> {
    let Some(n_days) = n_days else {
        return Ok(String::new());
    };

    let ctx = QueryContext::new()
        .with_n_days(Some(n_days))
        .with_time_attribute(time_attribute)
        .with_leading_comma(with_leading_comma);
    TIME_PERIOD.render(&ctx)
}

/// `$match` fragment (without surrounding braces) selecting documents whose
/// `time_attribute` lies between two `YYYY-MM-DD` dates, inclusive.
pub fn define_time_range(from_date: &str, to_date: &str, time_attribute: &str) -> Result<String> {
    let from = parse_date(from_date)?;
    let to = parse_date(to_date)?;
    if from > to {
        return Err(FunifierError::validation(format!(
            "start date {} is after end date {}",
            from, to
        )));
    }
    if time_attribute.trim().is_empty() {
        return Err(FunifierError::validation("time attribute is empty"));
    }

    let mut range = serde_json::Map::new();
    range.insert(
        time_attribute.to_string(),
        json!({
            "$gte": { "$date": format!("{}{}", from.format("%Y-%m-%d"), TIME_OF_DAY) },
            "$lte": { "$date": format!("{}{}", to.format("%Y-%m-%d"), TIME_OF_DAY) },
        }),
    );

    let object = Value::Object(range).to_string();
    Ok(object[1..object.len() - 1].to_string())
}

fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        FunifierError::validation(format!("'{}' is not a date in YYYY-MM-DD format", date))
    })
}

fn required_uid(value: &Option<String>, label: &str) -> Result<String> {
    match value.as_deref() {
        Some(uid) if !uid.trim().is_empty() => Ok(escape_json_string(uid)),
        _ => Err(FunifierError::validation(format!("{} is required", label))),
    }
}

/// Escape `value` for use between the quotes of a JSON string literal
pub fn escape_json_string(value: &str) -> String {
    let quoted = Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
