use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use dayblock_core::{time::at_local, CalendarEvent, CalendarSource, Commit};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

pub const GOOGLE_CALENDAR_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Read-only Google Calendar reader over the REST API with a bearer token.
pub struct GoogleCalendar {
    http: reqwest::Client,
    token: String,
    calendar_ids: Vec<String>,
    tz: Tz,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    summary: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<DateTime<Utc>>,
}

fn encode_calendar_id(id: &str) -> String {
    id.replace('%', "%25").replace('@', "%40").replace('#', "%23").replace('/', "%2F")
}

impl GoogleCalendar {
    pub fn new(token: impl Into<String>, calendar_ids: Vec<String>, tz: Tz) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            calendar_ids,
            tz,
            base_url: GOOGLE_CALENDAR_BASE.to_string(),
        }
    }

    pub fn from_env(token_env: &str, calendar_ids: Vec<String>, tz: Tz) -> Result<Self> {
        let token = std::env::var(token_env)
            .with_context(|| format!("missing Google Calendar token; set ${token_env}"))?;
        Ok(Self::new(token, calendar_ids, tz))
    }

    async fn list_events(&self, calendar_id: &str, day: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let time_min = at_local(day, 0, 0, self.tz).with_timezone(&Utc);
        let time_max = time_min + chrono::Duration::days(1);
        let url = format!("{}/calendars/{}/events", self.base_url, encode_calendar_id(calendar_id));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", self.token))?);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let resp = self
                .http
                .get(&url)
                .headers(headers.clone())
                .query(&query)
                .send()
                .await
                .with_context(|| format!("google calendar request ({calendar_id})"))?;
            let status = resp.status();
            if !status.is_success() {
                let txt = resp.text().await.unwrap_or_default();
                bail!("google calendar error: {status} {txt}");
            }

            let page: EventList = resp.json().await.context("parse google calendar response")?;
            // All-day events carry only a date and do not block time.
            events.extend(page.items.into_iter().filter_map(|item| {
                Some(CalendarEvent {
                    summary: item.summary.unwrap_or_default(),
                    start: item.start?.date_time?,
                    end: item.end?.date_time?,
                })
            }));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(events)
    }

    async fn events_async(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let mut all = Vec::new();
        for id in &self.calendar_ids {
            all.extend(self.list_events(id, day).await?);
        }
        all.sort_by_key(|e| e.start);
        Ok(all)
    }
}

impl CalendarSource for GoogleCalendar {
    fn events_for_day(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>> {
        // Nested block_on inside the CLI's runtime would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.events_async(day)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.events_async(day))
        }
    }
}

/// Minimal iCalendar document with one VEVENT per committed block.
///
/// DTSTART/DTEND are UTC; UIDs are stable per task and start time.
pub fn commits_to_ics(commits: &[Commit]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//dayblock//EN\r\n");

    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    for c in commits {
        let dtstart = c.window.start.format("%Y%m%dT%H%M%SZ");
        let dtend = c.window.end.format("%Y%m%dT%H%M%SZ");

        s.push_str("BEGIN:VEVENT\r\n");
        s.push_str(&format!("UID:{}-{}@dayblock\r\n", escape_ics(&c.task_id), dtstart));
        s.push_str(&format!("DTSTAMP:{}\r\n", stamp));
        s.push_str(&format!("DTSTART:{}\r\n", dtstart));
        s.push_str(&format!("DTEND:{}\r\n", dtend));
        s.push_str(&format!("SUMMARY:{}\r\n", escape_ics(&c.name)));
        s.push_str(&format!("DESCRIPTION:{}\r\n", escape_ics(&format!("Priority: {}", c.priority))));
        s.push_str("END:VEVENT\r\n");
    }

    s.push_str("END:VCALENDAR\r\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
