//! Server license records and the post-login expiry advisory built from them.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

const MILLIS_PER_DAY: i64 = 86_400_000;
const UNKNOWN: &str = "Unknown";

pub const ADVISORY_TITLE: &str = "Server expiry warnings";

/// Either a JSON array of `T` or a single bare `T`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

/// A date as the server serializes it: formatted text or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Millis(i64),
    Text(String),
}

impl DateValue {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            DateValue::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            DateValue::Text(s) => parse_date_text(s),
        }
    }

    pub fn display(&self) -> String {
        match self {
            DateValue::Text(s) => s.clone(),
            DateValue::Millis(_) => self
                .to_utc()
                .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

// Date-only values are UTC midnight; naive date-times are local wall-clock.
fn parse_date_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&ndt).earliest().map(|d| d.with_timezone(&Utc));
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<DateValue>,
    #[serde(default)]
    pub expire_date: Option<DateValue>,
    /// Absent for servers without an expiry date; such records are never flagged.
    #[serde(default)]
    pub remind_days: Option<i64>,
    #[serde(default)]
    pub remaining_days: Option<i64>,
}

impl LicenseInfo {
    /// Neither a name nor an address: nothing in the body looked like a server.
    pub fn is_anonymous(&self) -> bool {
        self.server_name.trim().is_empty() && self.ip_address.trim().is_empty()
    }

    /// Server-supplied value when present, otherwise whole days to expiry rounded up.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> AppResult<i64> {
        if let Some(d) = self.remaining_days {
            return Ok(d);
        }
        let expire = self.expire_date.as_ref().ok_or_else(|| {
            AppError::decode("missing_expire_date".to_string(), format!("license record '{}' has no expireDate", self.server_name))
        })?;
        let at = expire.to_utc().ok_or_else(|| {
            AppError::decode("invalid_expire_date".to_string(), format!("license record '{}' has unparseable expireDate {:?}", self.server_name, expire))
        })?;
        Ok(ceil_days((at - now).num_milliseconds()))
    }
}

fn ceil_days(millis: i64) -> i64 {
    // Integer division truncates toward zero, which is already the ceiling for negatives
    let q = millis / MILLIS_PER_DAY;
    if millis % MILLIS_PER_DAY > 0 { q + 1 } else { q }
}

pub fn is_expiring_soon(days_remaining: i64, remind_days: i64) -> bool {
    days_remaining <= remind_days
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryLine {
    /// 1-based position in the server's list.
    pub index: usize,
    pub server_name: String,
    pub ip_address: String,
    pub provider: Option<String>,
    pub purchase_date: Option<String>,
    pub expire_date: Option<String>,
    /// `None` when the record has no usable expiry date.
    pub days_remaining: Option<i64>,
    pub expiring_soon: bool,
}

impl AdvisoryLine {
    pub fn from_record(index: usize, lic: &LicenseInfo, now: DateTime<Utc>) -> Self {
        let days_remaining = match lic.days_remaining(now) {
            Ok(d) => Some(d),
            Err(e) => {
                debug!(target: "money::license", "server {} has no days remaining: {}", index, e);
                None
            }
        };
        let expiring_soon = match (days_remaining, lic.remind_days) {
            (Some(days), Some(remind)) => is_expiring_soon(days, remind),
            _ => false,
        };
        Self {
            index,
            server_name: lic.server_name.clone(),
            ip_address: lic.ip_address.clone(),
            provider: lic.provider.clone().filter(|p| !p.is_empty()),
            purchase_date: lic.purchase_date.as_ref().map(DateValue::display),
            expire_date: lic.expire_date.as_ref().map(DateValue::display),
            days_remaining,
            expiring_soon,
        }
    }

    pub fn render_html(&self) -> String {
        let color = if self.expiring_soon { "red" } else { "green" };
        format!(
            "<div style=\"margin-bottom:10px; line-height:1.6;\">\
<b>Server {index}</b><br>\
Server name: {name}<br>\
IP address: {ip}<br>\
Provider: {provider}<br>\
Purchase date: {purchased}<br>\
Expire date: {expires}<br>\
Days remaining: <span style=\"color:{color};font-weight:bold;\">{days}</span>\
</div>\
<hr style=\"margin:6px 0; border:none; border-top:1px dashed #ccc;\">",
            index = self.index,
            name = escape_html(&self.server_name),
            ip = escape_html(&self.ip_address),
            provider = escape_html(self.provider.as_deref().unwrap_or(UNKNOWN)),
            purchased = escape_html(self.purchase_date.as_deref().unwrap_or(UNKNOWN)),
            expires = escape_html(self.expire_date.as_deref().unwrap_or(UNKNOWN)),
            color = color,
            days = self.days_remaining.map(|d| format!("{} days", d)).unwrap_or_else(|| UNKNOWN.to_string()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub lines: Vec<AdvisoryLine>,
}

impl Advisory {
    /// Fails only for an empty list or a record that names no server at all;
    /// a record with a bad expiry date still gets its line.
    pub fn build(records: &[LicenseInfo], now: DateTime<Utc>) -> AppResult<Self> {
        if records.is_empty() {
            return Err(AppError::decode("no_license_records", "license check returned no records"));
        }
        if let Some(pos) = records.iter().position(LicenseInfo::is_anonymous) {
            return Err(AppError::decode(
                "malformed_license_record".to_string(),
                format!("license record {} has neither serverName nor ipAddress", pos + 1),
            ));
        }
        let lines = records
            .iter()
            .enumerate()
            .map(|(i, lic)| AdvisoryLine::from_record(i + 1, lic, now))
            .collect();
        Ok(Self { lines })
    }

    pub fn expiring_count(&self) -> usize {
        self.lines.iter().filter(|l| l.expiring_soon).count()
    }

    pub fn to_html(&self) -> String {
        self.lines.iter().map(AdvisoryLine::render_html).collect()
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn record(v: serde_json::Value) -> LicenseInfo {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn single_object_and_array_normalize_alike() {
        let obj = json!({"serverName": "db-1", "ipAddress": "10.0.0.1", "expireDate": "2026-12-01", "remindDays": 30});
        let one: OneOrMany<LicenseInfo> = serde_json::from_value(obj.clone()).unwrap();
        let many: OneOrMany<LicenseInfo> = serde_json::from_value(json!([obj])).unwrap();
        assert_eq!(one.into_vec(), many.into_vec());
    }

    #[test]
    fn server_remaining_days_wins() {
        let lic = record(json!({"serverName": "a", "expireDate": "2020-01-01", "remindDays": 5, "remainingDays": 40}));
        assert_eq!(lic.days_remaining(now()).unwrap(), 40);
    }

    #[test]
    fn null_remaining_days_is_derived() {
        let lic = record(json!({"serverName": "a", "expireDate": "2026-10-20", "remindDays": 5, "remainingDays": null}));
        // 5.5 days away rounds up to 6
        assert_eq!(lic.days_remaining(now()).unwrap(), 6);
    }

    #[test]
    fn past_expiry_is_negative_ceiling() {
        let lic = record(json!({"serverName": "a", "expireDate": "2026-10-12", "remindDays": 5}));
        // expired 2.5 days ago
        assert_eq!(lic.days_remaining(now()).unwrap(), -2);
    }

    #[test]
    fn epoch_millis_expire_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 24, 12, 0, 0).unwrap().timestamp_millis();
        let lic = record(json!({"serverName": "a", "expireDate": at, "remindDays": 5}));
        assert_eq!(lic.days_remaining(now()).unwrap(), 10);
    }

    #[test]
    fn rfc3339_expire_date() {
        let lic = record(json!({"serverName": "a", "expireDate": "2026-10-15T12:00:00Z", "remindDays": 5}));
        assert_eq!(lic.days_remaining(now()).unwrap(), 1);
    }

    #[test]
    fn unparseable_expire_date_is_an_error() {
        let lic = record(json!({"serverName": "a", "expireDate": "next spring", "remindDays": 5}));
        assert_eq!(lic.days_remaining(now()).unwrap_err().code_str(), "invalid_expire_date");
        let lic = record(json!({"serverName": "a", "remindDays": 5}));
        assert_eq!(lic.days_remaining(now()).unwrap_err().code_str(), "missing_expire_date");
    }

    #[test]
    fn expiring_soon_threshold_is_inclusive() {
        assert!(is_expiring_soon(30, 30));
        assert!(is_expiring_soon(-1, 0));
        assert!(!is_expiring_soon(31, 30));
    }

    #[test]
    fn rendered_line_marks_expiring_records_red() {
        let soon = record(json!({"serverName": "web", "ipAddress": "1.2.3.4", "expireDate": "2026-10-20", "remindDays": 7, "remainingDays": 6}));
        let later = record(json!({"serverName": "db", "ipAddress": "1.2.3.5", "provider": "Aliyun", "purchaseDate": "2025-10-01", "expireDate": "2027-10-01", "remindDays": 7, "remainingDays": 352}));
        let adv = Advisory::build(&[soon, later], now()).unwrap();
        assert_eq!(adv.lines.len(), 2);
        assert_eq!(adv.expiring_count(), 1);

        let first = adv.lines[0].render_html();
        assert!(first.contains("<b>Server 1</b>"));
        assert!(first.contains("color:red"));
        assert!(first.contains("Provider: Unknown"));
        assert!(first.contains("Purchase date: Unknown"));
        assert!(first.contains("6 days"));

        let second = adv.lines[1].render_html();
        assert!(second.contains("color:green"));
        assert!(second.contains("Provider: Aliyun"));
        assert!(second.contains("Expire date: 2027-10-01"));
        assert_eq!(adv.to_html(), format!("{}{}", first, second));
    }

    #[test]
    fn empty_list_does_not_build() {
        assert_eq!(Advisory::build(&[], now()).unwrap_err().code_str(), "no_license_records");
    }

    #[test]
    fn bad_expiry_date_keeps_the_other_lines() {
        let ok = record(json!({"serverName": "a", "remindDays": 5, "remainingDays": 3}));
        let bad = record(json!({"serverName": "b", "expireDate": "??", "remindDays": 1}));
        let bare = record(json!({"serverName": "new-box", "ipAddress": "1.1.1.2"}));
        let adv = Advisory::build(&[ok, bad, bare], now()).unwrap();
        assert_eq!(adv.lines.len(), 3);
        assert_eq!(adv.expiring_count(), 1);
        assert_eq!(adv.lines[0].days_remaining, Some(3));
        for line in &adv.lines[1..] {
            assert_eq!(line.days_remaining, None);
            assert!(!line.expiring_soon);
            let html = line.render_html();
            assert!(html.contains(">Unknown</span>"));
            assert!(html.contains("color:green"));
        }
    }

    #[test]
    fn missing_remind_days_is_never_flagged() {
        let lic = record(json!({"serverName": "a", "expireDate": "2026-10-13"}));
        assert_eq!(lic.remind_days, None);
        let line = AdvisoryLine::from_record(1, &lic, now());
        assert_eq!(line.days_remaining, Some(-1));
        assert!(!line.expiring_soon);
    }

    #[test]
    fn record_without_name_or_address_fails_the_advisory() {
        let ok = record(json!({"serverName": "a", "remindDays": 1, "remainingDays": 3}));
        let junk = record(json!({"unexpected": true}));
        assert_eq!(Advisory::build(&[ok, junk], now()).unwrap_err().code_str(), "malformed_license_record");
    }

    #[test]
    fn server_strings_are_escaped() {
        let lic = record(json!({"serverName": "<script>", "remindDays": 1, "remainingDays": 3}));
        let html = AdvisoryLine::from_record(1, &lic, now()).render_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
