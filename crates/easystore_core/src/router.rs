//! Name-based access that picks between computed values, lists and scalars.
//!
//! # Responsibility
//! - Resolve a bare name to a computed value, a list view or a scalar.
//! - Route writes of sequences to list replacement and everything else to
//!   scalar upsert.
//!
//! # Invariants
//! - Reserved names always resolve to their computed value, shadowing stored
//!   lists and scalars of the same name.
//! - Lists shadow scalars of the same name on reads.
//! - Resolution reads storage directly; there is no cache.

use crate::model::record::{encode_value, to_json_value};
use crate::report::{render_report, ReportMeta, ReportOptions};
use crate::snapshot::Snapshot;
use crate::store::engine::upsert_scalar;
use crate::store::lists::replace_items;
use crate::store::{EasyStore, ListView, StoreError, StoreResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Reserved name resolving to [`Computed::Snapshot`].
pub const ALL_DATA: &str = "all_data";
/// Reserved name resolving to [`Computed::Report`].
pub const HTML_REPORT: &str = "html_report";

static ATTRIBUTE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\p{XID_Start}\p{XID_Continue}*$").expect("valid attribute name regex")
});

/// Values derived from the whole store rather than read from one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Computed {
    Snapshot(Snapshot),
    /// Rendered HTML document.
    Report(String),
}

/// Outcome of resolving a name.
#[derive(Debug)]
pub enum Attribute<'s> {
    Computed(Computed),
    List(ListView<'s>),
    Scalar(Value),
    NotFound,
}

/// Returns whether `name` is usable for attribute-style access.
///
/// Names follow Unicode identifier rules (`XID_Start` then `XID_Continue`), so
/// `任务` is accepted. A leading underscore is not `XID_Start`; those names
/// stay reserved for host-side state.
pub fn is_valid_attribute_name(name: &str) -> bool {
    ATTRIBUTE_NAME_RE.is_match(name)
}

/// Returns whether `name` resolves to a computed value.
pub fn is_reserved_name(name: &str) -> bool {
    name == ALL_DATA || name == HTML_REPORT
}

impl EasyStore {
    /// Resolves `name` without treating absence as an error.
    ///
    /// Priority: reserved computed names, then lists, then scalars.
    pub fn resolve<'s>(&'s self, name: &'s str) -> StoreResult<Attribute<'s>> {
        validate_name(name)?;

        if is_reserved_name(name) {
            return self.computed(name).map(Attribute::Computed);
        }

        if self.list_exists(name)? {
            return Ok(Attribute::List(self.list_view(name)));
        }

        match self.get_scalar(name) {
            Ok(value) => Ok(Attribute::Scalar(value)),
            Err(StoreError::KeyNotFound(_)) => Ok(Attribute::NotFound),
            Err(err) => Err(err),
        }
    }

    fn computed(&self, name: &str) -> StoreResult<Computed> {
        if name == HTML_REPORT {
            Ok(Computed::Report(self.html_report()?))
        } else {
            Ok(Computed::Snapshot(self.build_snapshot()?))
        }
    }

    /// Resolves `name`, failing with `AttributeNotFound` when nothing matches.
    pub fn get<'s>(&'s self, name: &'s str) -> StoreResult<Attribute<'s>> {
        match self.resolve(name)? {
            Attribute::NotFound => Err(StoreError::AttributeNotFound(name.to_string())),
            found => Ok(found),
        }
    }

    /// Stores `value` under `name`.
    ///
    /// Arrays replace the list called `name` wholesale; any other value is
    /// upserted as a scalar. The other table family is left untouched.
    pub fn set<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> StoreResult<()> {
        validate_name(name)?;

        match to_json_value(value)? {
            Value::Array(items) => {
                let encoded = items
                    .iter()
                    .map(encode_value)
                    .collect::<Result<Vec<_>, _>>()?;
                self.write(|tx| replace_items(tx, name, &encoded))?;
                debug!(
                    "event=attr_set module=router status=ok kind=list name_len={} len={}",
                    name.len(),
                    encoded.len()
                );
            }
            other => {
                let text = encode_value(&other)?;
                self.write(|tx| upsert_scalar(tx, name, &text))?;
                debug!(
                    "event=attr_set module=router status=ok kind=scalar name_len={}",
                    name.len()
                );
            }
        }
        Ok(())
    }

    /// Renders the HTML report for the current content of the store.
    pub fn html_report(&self) -> StoreResult<String> {
        self.html_report_with_options(&ReportOptions::default())
    }

    pub fn html_report_with_options(&self, options: &ReportOptions) -> StoreResult<String> {
        let snapshot = self.build_snapshot()?;
        let meta = ReportMeta {
            source: self.location().to_string(),
            generated_at: self.timestamp()?,
        };
        Ok(render_report(&snapshot, &meta, options))
    }
}

fn validate_name(name: &str) -> StoreResult<()> {
    if is_valid_attribute_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidAttributeName(name.to_string()))
    }
}
