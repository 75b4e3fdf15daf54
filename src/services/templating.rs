//! Template rendering over the aggregated usage dataset
//!
//! Templates see two top-level values:
//! - `Metadata`: `Generated`, `From`, `To` (timestamps) and `Timezone`
//! - `Usage`: the list of usage rows, each keyed by its dimension name
//!   plus `Energy`, `Duration`, `Sessions` and `Installation`
//!
//! Timestamps render as `YYYY-MM-DD HH:MM:SS` and support
//! `strftime(format)` and `isoformat()`, e.g.
//! `{{ Metadata.From.strftime('%Y-%m') }}`.

use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDateTime, Timelike};
use minijinja::value::{from_args, Enumerator, Object, ObjectRepr, Value};
use minijinja::{context, Environment, Error, ErrorKind, State};

use crate::types::{AggregatedUsage, MetadataValue, ReportMetadata, Result};

/// Renders template strings against one aggregated dataset
pub struct ReportTemplates {
    env: Environment<'static>,
    context: Value,
}

impl ReportTemplates {
    pub fn new(usage: &AggregatedUsage) -> Self {
        let context = context! {
            Metadata => Value::from_object(MetadataObject(usage.metadata.clone())),
            Usage => Value::from_serialize(&usage.rows),
        };
        Self {
            env: Environment::new(),
            context,
        }
    }

    /// Render one template string
    pub fn render(&self, template: &str) -> Result<String> {
        Ok(self.env.render_str(template, &self.context)?)
    }

    /// Render an optional template, passing `None` through
    pub fn render_opt(&self, template: Option<&str>) -> Result<Option<String>> {
        template.map(|t| self.render(t)).transpose()
    }
}

#[derive(Debug)]
struct MetadataObject(ReportMetadata);

impl Object for MetadataObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let key = key.as_str()?;
        self.0
            .entries()
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| match value {
                MetadataValue::Timestamp(ts) => Value::from_object(Timestamp(ts)),
                MetadataValue::Text(text) => Value::from(text),
            })
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["Generated", "From", "To", "Timezone"])
    }
}

/// A wall-clock timestamp exposed to templates
#[derive(Debug)]
struct Timestamp(NaiveDateTime);

impl Timestamp {
    fn strftime(&self, pattern: &str) -> std::result::Result<String, Error> {
        let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("invalid strftime pattern {:?}", pattern),
            ));
        }

        let mut out = String::new();
        write!(out, "{}", self.0.format_with_items(items.into_iter())).map_err(|_| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot format timestamp with {:?}", pattern),
            )
        })?;
        Ok(out)
    }
}

impl Object for Timestamp {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let ts = &self.0;
        let value = match key.as_str()? {
            "year" => ts.year() as i64,
            "month" => ts.month() as i64,
            "day" => ts.day() as i64,
            "hour" => ts.hour() as i64,
            "minute" => ts.minute() as i64,
            "second" => ts.second() as i64,
            _ => return None,
        };
        Some(Value::from(value))
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> std::result::Result<Value, Error> {
        match method {
            "strftime" => {
                let (pattern,): (&str,) = from_args(args)?;
                self.strftime(pattern).map(Value::from)
            }
            "isoformat" => {
                if !args.is_empty() {
                    return Err(Error::new(
                        ErrorKind::TooManyArguments,
                        "isoformat() takes no arguments",
                    ));
                }
                Ok(Value::from(self.0.format("%Y-%m-%dT%H:%M:%S").to_string()))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("timestamp has no method named {}", method),
            )),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}
