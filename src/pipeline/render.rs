//! Notification text for a newly found listing.

use chrono::Datelike;

use crate::models::{Listing, RawListing};
use crate::utils::escape_html;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Render the Telegram HTML message announcing `listing`.
///
/// `raw` supplies the fields that are shown but not stored (city, experience).
pub fn render_notification(listing: &Listing, raw: &RawListing) -> String {
    let published = listing.published_at.date();
    let published = format!(
        "{} {} {}",
        published.day(),
        MONTHS[published.month0() as usize],
        published.year()
    );

    let mut message = format!(
        "🆕 <b>New vacancy!</b>\n\n\
         💼 <b>{title}</b>\n\n\
         🏢 Company: <b>{company}</b>\n\
         💰 Salary: <code>{salary}</code>\n\
         🏙 City: <code>{city}</code>\n\
         📊 Experience: <code>{experience}</code>\n\
         📅 Published: <code>{published}</code>",
        title = escape_html(&listing.title),
        company = escape_html(&listing.organization),
        salary = escape_html(&listing.salary_display),
        city = escape_html(raw.area_name().unwrap_or("Not specified")),
        experience = escape_html(raw.experience_name().unwrap_or("Not specified")),
        published = published,
    );

    if !listing.url.is_empty() {
        message.push_str(&format!(
            "\n\n🔗 <a href='{}'>Open vacancy</a>",
            escape_html(&listing.url)
        ));
    }

    message
}
