use regex_lite::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::OnceLock;
use time::{format_description::FormatItem, macros::format_description, Date, Weekday};

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

const DEFAULT_BUCKET: &str = "1";

/// The content document: the target date, the calendar settings, and the
/// page sections holding candidate day cells.  Only the parts the calendar
/// needs are modelled; everything else in the document is ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Content {
    #[serde(default)]
    pub(crate) wedding: Option<Event>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) calendar: CalendarConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) sections: Vec<Section>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(crate) struct Event {
    #[serde(default)]
    pub(crate) date: Option<LooseString>,
}

/// Every field tolerates `null`, which reads as the field's default
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct CalendarConfig {
    /// Only an explicit `false` disables the calendar
    #[serde(deserialize_with = "enabled_unless_false")]
    pub(crate) enabled: bool,
    pub(crate) wedding_date: Option<LooseString>,
    pub(crate) month_title_elem_id: Option<LooseString>,
    pub(crate) year_elem_id: Option<LooseString>,
    pub(crate) heart_elem_id: Option<LooseString>,
    pub(crate) heart_image_hint: Option<LooseString>,
    #[serde(deserialize_with = "bucket_or_default")]
    pub(crate) bucket: LooseString,
    pub(crate) week_starts_on: WeekStart,
    pub(crate) month_names: Option<Vec<String>>,
    pub(crate) tolerances: Option<Vec<f64>>,
}

impl Default for CalendarConfig {
    fn default() -> CalendarConfig {
        CalendarConfig {
            enabled: true,
            wedding_date: None,
            month_title_elem_id: None,
            year_elem_id: None,
            heart_elem_id: None,
            heart_image_hint: None,
            bucket: LooseString(String::from(DEFAULT_BUCKET)),
            week_starts_on: WeekStart::Monday,
            month_names: None,
            tolerances: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub(crate) struct Section {
    #[serde(default)]
    pub(crate) bucket: Option<LooseString>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) texts: Vec<TextDef>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDef {
    pub(crate) elem_id: LooseString,
    #[serde(default)]
    pub(crate) preview: Option<LooseString>,
    #[serde(default, rename = "where")]
    pub(crate) position: Option<String>,
}

/// A scalar that page builders emit as either a JSON string or a JSON
/// number, compared by its string rendering.  Other JSON values read as an
/// empty string.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(from = "Value")]
pub(crate) struct LooseString(pub(crate) String);

impl LooseString {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `None` for values that are blank once trimmed
    pub(crate) fn non_blank(&self) -> Option<&str> {
        let s = self.0.trim();
        (!s.is_empty()).then_some(s)
    }
}

impl From<Value> for LooseString {
    fn from(value: Value) -> LooseString {
        match value {
            Value::String(s) => LooseString(s),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => LooseString(i.to_string()),
                (None, Some(f)) => LooseString(f.to_string()),
                (None, None) => LooseString(n.to_string()),
            },
            Value::Bool(b) => LooseString(b.to_string()),
            _ => LooseString::default(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn enabled_unless_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(!matches!(Value::deserialize(deserializer)?, Value::Bool(false)))
}

fn bucket_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LooseString, D::Error> {
    Ok(Option::<LooseString>::deserialize(deserializer)?
        .unwrap_or_else(|| LooseString(String::from(DEFAULT_BUCKET))))
}

/// Which weekday occupies the first column of the grid
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(from = "LooseString")]
pub(crate) enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    /// Zero-based column of `wd` in a week starting on `self`
    pub(crate) fn column_of(self, wd: Weekday) -> u8 {
        match self {
            WeekStart::Monday => wd.number_days_from_monday(),
            WeekStart::Sunday => wd.number_days_from_sunday(),
        }
    }
}

impl From<LooseString> for WeekStart {
    fn from(value: LooseString) -> WeekStart {
        if value.as_str().trim().eq_ignore_ascii_case("sunday") {
            WeekStart::Sunday
        } else {
            WeekStart::Monday
        }
    }
}

/// A day-cell candidate taken from the selected bucket: the element id plus
/// the position persisted in the content document, if any
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) id: String,
    pub(crate) stored: Option<(f64, f64)>,
}

impl Content {
    pub(crate) fn from_json(s: &str) -> Result<Content, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// The date to paint, or `None` if none is configured or it does not
    /// parse
    pub(crate) fn target_date(&self) -> Option<Date> {
        let raw = self
            .wedding
            .as_ref()
            .and_then(|ev| ev.date.as_ref())
            .and_then(LooseString::non_blank)
            .or(self.calendar.wedding_date.as_ref().map(LooseString::as_str))?;
        parse_ymd(raw)
    }

    pub(crate) fn section_for_bucket(&self, bucket: &LooseString) -> Option<&Section> {
        self.sections
            .iter()
            .find(|sec| sec.bucket.as_ref() == Some(bucket))
    }

    /// Texts of the configured bucket whose preview looks like a day number
    pub(crate) fn day_candidates(&self) -> Vec<Candidate> {
        let Some(section) = self.section_for_bucket(&self.calendar.bucket) else {
            return Vec::new();
        };
        section
            .texts
            .iter()
            .filter(|t| t.preview.as_ref().is_some_and(|p| is_day_number(p.as_str())))
            .map(|t| Candidate {
                id: t.elem_id.as_str().to_owned(),
                stored: t.position.as_deref().map(parse_where),
            })
            .collect()
    }

    pub(crate) fn month_title_id(&self) -> Option<&str> {
        self.calendar
            .month_title_elem_id
            .as_ref()
            .and_then(LooseString::non_blank)
    }

    pub(crate) fn year_id(&self) -> Option<&str> {
        self.calendar
            .year_elem_id
            .as_ref()
            .and_then(LooseString::non_blank)
    }

    pub(crate) fn legacy_marker_id(&self) -> Option<&str> {
        self.calendar
            .heart_elem_id
            .as_ref()
            .and_then(LooseString::non_blank)
    }
}

/// Parses a `YYYY-MM-DD` date, ignoring surrounding whitespace.  Signed
/// years are not accepted.
pub(crate) fn parse_ymd(s: &str) -> Option<Date> {
    let s = s.trim();
    if !s.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Date::parse(s, &YMD_FMT).ok()
}

fn is_day_number(preview: &str) -> bool {
    let preview = preview.trim();
    (1..=2).contains(&preview.len()) && preview.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a stored position of the form `"top=1209.0, left=431.0"` into
/// `(top, left)`.  Missing or malformed components read as zero.
pub(crate) fn parse_where(s: &str) -> (f64, f64) {
    static TOP: OnceLock<Regex> = OnceLock::new();
    static LEFT: OnceLock<Regex> = OnceLock::new();
    let top = TOP.get_or_init(|| Regex::new(r"top=([-\d.]+)").expect("top position regex"));
    let left = LEFT.get_or_init(|| Regex::new(r"left=([-\d.]+)").expect("left position regex"));
    (capture_f64(top, s), capture_f64(left, s))
}

fn capture_f64(re: &Regex, s: &str) -> f64 {
    re.captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}
