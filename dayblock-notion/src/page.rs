//! Page <-> task translation for the Notion wire format.
//!
//! Decoding is lenient: a missing title becomes "Unnamed Task", unknown select
//! values keep the task defaults, and only a missing page id is an error.

use chrono::{DateTime, NaiveDate, Utc};
use dayblock_core::{Due, Task, TaskDraft, TaskPatch};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::NotionError;
use crate::properties::PropertyNames;

fn title_text(prop: &Value) -> String {
    prop.get("title")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| {
                    p.get("plain_text")
                        .and_then(Value::as_str)
                        .or_else(|| p.pointer("/text/content").and_then(Value::as_str))
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Option name of a `status` or `select` property.
fn option_name(prop: &Value) -> Option<&str> {
    prop.pointer("/status/name")
        .or_else(|| prop.pointer("/select/name"))
        .and_then(Value::as_str)
}

/// Plain checkbox or a formula that evaluates to one.
fn checkbox(prop: &Value) -> Option<bool> {
    prop.get("checkbox")
        .and_then(Value::as_bool)
        .or_else(|| prop.pointer("/formula/boolean").and_then(Value::as_bool))
}

/// `2026-03-02` is a date; anything longer must be RFC 3339.
pub fn parse_due(start: &str, end: Option<&str>) -> Option<Due> {
    if start.len() == 10 {
        return NaiveDate::parse_from_str(start, "%Y-%m-%d").ok().map(Due::Date);
    }
    let start = DateTime::parse_from_rfc3339(start).ok()?;
    let end = end.and_then(|e| DateTime::parse_from_rfc3339(e).ok());
    Some(Due::Timed { start, end })
}

fn date(prop: &Value) -> Option<Due> {
    let date = prop.get("date")?;
    let start = date.get("start")?.as_str()?;
    parse_due(start, date.get("end").and_then(Value::as_str))
}

fn parse_or_keep<T: std::str::FromStr>(raw: Option<&str>, field: &str, id: &str) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(page = id, field, value = raw, "unrecognized option, keeping default");
            None
        }
    }
}

pub fn decode_page(page: &Value, names: &PropertyNames) -> Result<Task, NotionError> {
    let id = page
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| NotionError::Decode("page without id".into()))?;
    let empty = Map::new();
    let props = page.get("properties").and_then(Value::as_object).unwrap_or(&empty);
    let prop = |key: &str| props.get(key);

    let mut task = Task::new(id, prop(names.name.as_str()).map(title_text).unwrap_or_default());

    if let Some(p) = parse_or_keep(prop(names.priority.as_str()).and_then(option_name), "priority", id) {
        task.priority = p;
    }
    if let Some(s) = parse_or_keep(prop(names.status.as_str()).and_then(option_name), "status", id) {
        task.status = s;
    }
    task.effort = parse_or_keep(prop(names.effort.as_str()).and_then(option_name), "effort", id);
    task.class = prop(names.class.as_str()).and_then(option_name).map(str::to_string);
    task.done = prop(names.done.as_str()).and_then(checkbox).unwrap_or(false);
    task.due = prop(names.due.as_str()).and_then(date);
    task.assigned_time = prop(names.assigned_time.as_str())
        .and_then(checkbox)
        .unwrap_or_else(|| task.due.is_some_and(|d| d.is_timed()));
    task.created_time = page
        .get("created_time")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));

    Ok(task)
}

fn encode_due(due: &Due) -> Value {
    match due {
        Due::Date(d) => json!({ "date": { "start": d.format("%Y-%m-%d").to_string(), "end": null } }),
        Due::Timed { start, end } => json!({
            "date": {
                "start": start.to_rfc3339(),
                "end": end.map(|e| e.to_rfc3339()),
            }
        }),
    }
}

fn title(name: &str) -> Value {
    json!({ "title": [{ "text": { "content": name } }] })
}

fn status_option(name: &str) -> Value {
    json!({ "status": { "name": name } })
}

fn encode_properties(
    name: Option<&str>,
    patch_like: (Option<&str>, Option<&str>, Option<&Due>),
    names: &PropertyNames,
) -> Map<String, Value> {
    let (priority, status, due) = patch_like;
    let mut props = Map::new();
    if let Some(name) = name {
        props.insert(names.name.clone(), title(name));
    }
    if let Some(p) = priority {
        props.insert(names.priority.clone(), status_option(p));
    }
    if let Some(s) = status {
        props.insert(names.status.clone(), status_option(s));
    }
    if let Some(due) = due {
        props.insert(names.due.clone(), encode_due(due));
        if names.write_assigned_time {
            props.insert(names.assigned_time.clone(), json!({ "checkbox": due.is_timed() }));
        }
    }
    props
}

/// Body for `PATCH /v1/pages/{id}`. Only set fields are sent.
pub fn encode_patch(patch: &TaskPatch, names: &PropertyNames) -> Value {
    let props = encode_properties(
        patch.name.as_deref(),
        (
            patch.priority.map(|p| p.as_str()),
            patch.status.map(|s| s.as_str()),
            patch.due.as_ref(),
        ),
        names,
    );
    json!({ "properties": props })
}

/// Body for `POST /v1/pages`.
pub fn encode_draft(draft: &TaskDraft, names: &PropertyNames, database_id: &str) -> Value {
    let mut props = encode_properties(
        Some(&draft.name),
        (Some(draft.priority.as_str()), None, draft.due.as_ref()),
        names,
    );
    if let Some(class) = &draft.class {
        props.insert(names.class.clone(), json!({ "select": { "name": class } }));
    }
    json!({
        "parent": { "database_id": database_id },
        "properties": props,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayblock_core::{Priority, Status};

    #[test]
    fn date_only_and_timed_dues() {
        assert_eq!(
            parse_due("2026-03-02", None),
            Some(Due::Date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()))
        );
        let timed = parse_due("2026-03-02T09:00:00.000-05:00", Some("2026-03-02T10:00:00.000-05:00")).unwrap();
        assert!(timed.is_timed());
        assert!(parse_due("next tuesday", None).is_none());
    }

    #[test]
    fn patch_only_carries_set_fields() {
        let names = PropertyNames::default();
        let body = encode_patch(&TaskPatch::new().with_status(Status::Deprecated), &names);
        let props = body["properties"].as_object().unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(body["properties"]["Status"]["status"]["name"], "Deprecated");
    }

    #[test]
    fn date_patch_clears_end() {
        let names = PropertyNames::default();
        let d = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let body = encode_patch(&TaskPatch::new().with_due(Due::Date(d)), &names);
        assert_eq!(body["properties"]["Due"]["date"]["start"], "2026-03-03");
        assert!(body["properties"]["Due"]["date"]["end"].is_null());
        assert!(body["properties"].get("Assigned time").is_none());
    }

    #[test]
    fn draft_has_parent_and_class() {
        let names = PropertyNames::default();
        let body = encode_draft(
            &TaskDraft::new("Schedule Day", Priority::High).with_class("Admin"),
            &names,
            "db123",
        );
        assert_eq!(body["parent"]["database_id"], "db123");
        assert_eq!(body["properties"]["Priority"]["status"]["name"], "High");
        assert_eq!(body["properties"]["Class"]["select"]["name"], "Admin");
    }
}
