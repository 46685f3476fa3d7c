use super::{
    Matcher, SchemaType, TypeOptions, TypeTag, check_required, compare_presence, is_absent,
    rejected,
};
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use elastore_types::{Record, Value};

/// Instants. Accepts dates, epoch milliseconds and ISO-8601 strings;
/// exports ISO-8601 with millisecond precision.
#[derive(Debug, Clone)]
pub struct DateType {
    name: String,
    options: TypeOptions,
}

impl DateType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }
}

/// Interprets a value as an instant, if it can be read as one.
fn to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Number(ms) if ms.is_finite() => Utc.timestamp_millis_opt(*ms as i64).single(),
        Value::String(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

/// Unreadable input is kept as-is so `validate` can reject it.
fn cast_date(value: Value) -> Value {
    to_date(&value).map(Value::Date).unwrap_or(value)
}

impl SchemaType for DateType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Date
    }

    fn cast(&self, value: Option<Value>, _data: &Record) -> Result<Option<Value>, ValidationError> {
        if is_absent(value.as_ref()) {
            return Ok(self.options.produce_default().map(cast_date));
        }
        Ok(value.map(cast_date))
    }

    fn validate(
        &self,
        value: Option<Value>,
        _data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        check_required(&self.name, &self.options, value.as_ref())?;
        match value {
            None | Some(Value::Null) | Some(Value::Date(_)) => Ok(value),
            Some(other) => Err(rejected(&self.name, &other, "a valid date")),
        }
    }

    fn parse(&self, value: Option<Value>, _data: &Record) -> Option<Value> {
        value.filter(|v| !v.is_null()).map(cast_date)
    }

    fn value(&self, value: Option<Value>, _data: &Record) -> Option<Value> {
        value.map(|v| match v {
            Value::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            other => other,
        })
    }

    fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
        compare_presence(a, b, |a, b| match (to_date(a), to_date(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.total_cmp(b),
        })
    }

    fn matches(&self, value: Option<&Value>, query: &Matcher, _data: &Record) -> bool {
        let Matcher::Value(expected) = query else {
            return false;
        };
        match (value.and_then(to_date), to_date(expected)) {
            (Some(actual), Some(expected)) => actual == expected,
            _ => false,
        }
    }
}
