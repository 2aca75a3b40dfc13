//! Translation of store queries into Notion database query bodies.

use dayblock_core::{Filter, Sort, TaskQuery};
use serde_json::{json, Value};

use crate::properties::PropertyNames;

pub const PAGE_SIZE: usize = 100;

pub fn encode_filter(filter: &Filter, names: &PropertyNames) -> Value {
    let day = |d: &chrono::NaiveDate| d.format("%Y-%m-%d").to_string();
    match filter {
        Filter::And(all) => json!({ "and": all.iter().map(|f| encode_filter(f, names)).collect::<Vec<_>>() }),
        Filter::PriorityIs(p) => json!({ "property": names.priority, "status": { "equals": p.as_str() } }),
        Filter::PriorityIsNot(p) => json!({ "property": names.priority, "status": { "does_not_equal": p.as_str() } }),
        Filter::StatusIsNot(s) => json!({ "property": names.status, "status": { "does_not_equal": s.as_str() } }),
        Filter::DoneIs(d) => json!({ "property": names.done, "checkbox": { "equals": d } }),
        Filter::AssignedTimeIs(a) => json!({ "property": names.assigned_time, "checkbox": { "equals": a } }),
        Filter::ClassIs(c) => json!({ "property": names.class, "select": { "equals": c } }),
        Filter::DueOn(d) => json!({ "property": names.due, "date": { "equals": day(d) } }),
        Filter::DueOnOrBefore(d) => json!({ "property": names.due, "date": { "on_or_before": day(d) } }),
        Filter::DueOnOrAfter(d) => json!({ "property": names.due, "date": { "on_or_after": day(d) } }),
        Filter::DueBefore(t) => json!({ "property": names.due, "date": { "before": t.to_rfc3339() } }),
    }
}

fn encode_sort(sort: Sort, names: &PropertyNames) -> Value {
    match sort {
        Sort::PriorityAscending => json!({ "property": names.priority, "direction": "ascending" }),
        Sort::CreatedAscending => json!({ "timestamp": "created_time", "direction": "ascending" }),
    }
}

/// Body for `POST /v1/databases/{id}/query`, one page at a time.
pub fn encode_query(query: &TaskQuery, names: &PropertyNames, start_cursor: Option<&str>) -> Value {
    let mut body = json!({
        "filter": encode_filter(&query.filter, names),
        "page_size": PAGE_SIZE,
    });
    if !query.sorts.is_empty() {
        body["sorts"] = Value::Array(query.sorts.iter().map(|s| encode_sort(*s, names)).collect());
    }
    if let Some(cursor) = start_cursor {
        body["start_cursor"] = Value::String(cursor.to_string());
    }
    body
}
