use chrono::NaiveDate;

/// Canonical encoding for leave dates, shared by the wire payloads,
/// the capability links and the stored tokens.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn canonical_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Capability links double as the stored tokens: approve/reject re-derive
/// the link from the request's (email, date) and match it against the
/// persisted value. Both fields must therefore appear in the link in this
/// exact encoding.
pub fn approve_link(base: &str, email: &str, date: NaiveDate) -> String {
    decision_link(base, "approve", email, date)
}

pub fn reject_link(base: &str, email: &str, date: NaiveDate) -> String {
    decision_link(base, "reject", email, date)
}

fn decision_link(base: &str, action: &str, email: &str, date: NaiveDate) -> String {
    format!(
        "{}/leave/{}?leaveDate={}&email={}",
        base.trim_end_matches('/'),
        action,
        canonical_date(date),
        email
    )
}
