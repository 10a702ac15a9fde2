//! Email bodies
//!
//! Every user-supplied value goes through [`escape_html`] before it is
//! interpolated.

use crate::config::BrandConfig;
use crate::db::SavedApplication;
use crate::validation::{ApplicationSubmission, ContactSubmission};
use regex_lite::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

pub struct Rendered {
    pub subject: String,
    pub html: String,
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain-text alternative derived from an HTML body
pub fn html_to_text(html: &str) -> String {
    static STYLE: OnceLock<Regex> = OnceLock::new();
    static BREAK: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    let style = STYLE.get_or_init(|| Regex::new(r"(?s)<style[^>]*>.*?</style>").expect("static pattern"));
    let brk = BREAK.get_or_init(|| Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr)>").expect("static pattern"));
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static pattern"));
    let blank = BLANK_LINES.get_or_init(|| Regex::new(r"\n\s*\n+").expect("static pattern"));

    let text = style.replace_all(html, "");
    let text = brk.replace_all(&text, "\n");
    let text = tag.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let text: String = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    blank.replace_all(&text, "\n\n").trim().to_string()
}

fn page(title: &str, heading: &str, body: &str, brand: &BrandConfig) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: 'Segoe UI', Tahoma, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
.header {{ background: #2563eb; color: white; padding: 24px; text-align: center; border-radius: 10px 10px 0 0; }}
.content {{ background: #f9fafb; padding: 24px; border-radius: 0 0 10px 10px; }}
.label {{ font-weight: bold; color: #1f2937; }}
.footer {{ text-align: center; color: #6b7280; font-size: 14px; padding: 16px; }}
</style>
</head>
<body>
<div class="header"><h1>{heading}</h1></div>
<div class="content">
{body}
</div>
<div class="footer">
<p>{company}</p>
<p>{address}</p>
<p><a href="{website}">{website}</a></p>
</div>
</body>
</html>"#,
        company = escape_html(&brand.company_name),
        address = escape_html(&brand.postal_address),
        website = escape_html(&brand.website),
    )
}

fn field(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        out,
        r#"<p><span class="label">{}:</span> {}</p>"#,
        label,
        escape_html(value).replace('\n', "<br>")
    );
}

fn optional_field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        field(out, label, value);
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "<h2>{}</h2>", title);
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Business notification for a contact inquiry
pub fn contact_notification(contact: &ContactSubmission, brand: &BrandConfig) -> Rendered {
    let mut body = String::new();

    section(&mut body, "Contact");
    field(&mut body, "Name", &contact.name);
    field(&mut body, "Email", &contact.email);
    optional_field(&mut body, "Phone", contact.phone.as_deref());

    if contact.has_property_details() {
        section(&mut body, "Property");
        optional_field(&mut body, "Property Type", contact.property_type.as_deref());
        optional_field(&mut body, "Bedrooms", contact.bedrooms.as_deref());
        optional_field(&mut body, "Bathrooms", contact.bathrooms.as_deref());
        optional_field(&mut body, "Property Address", contact.address.as_deref());
    }

    section(&mut body, "Message");
    field(&mut body, "Message", &contact.message);
    let _ = writeln!(
        body,
        r#"<p><a href="mailto:{}">Reply to client</a></p>"#,
        escape_html(&contact.email)
    );

    Rendered {
        subject: format!("New Contact Form: {} - Property Management Inquiry", contact.name),
        html: page("New Contact Form Submission", "New Contact Form Submission", &body, brand),
    }
}

/// Acknowledgement sent to the person who submitted the contact form
pub fn contact_auto_reply(contact: &ContactSubmission, brand: &BrandConfig) -> Rendered {
    let name = escape_html(&contact.name);
    let company = escape_html(&brand.company_name);
    let phone = escape_html(&brand.phone);

    let body = format!(
        r#"<p>Dear {name},</p>
<p>Thank you for contacting {company}! We have received your inquiry and will respond within 24 hours.</p>
<h2>What happens next?</h2>
<ul>
<li>Our property expert will review your information</li>
<li>You will receive a response within 24 hours</li>
<li>We will prepare a free property analysis</li>
</ul>
<p>Need immediate assistance? Call us at <strong>{phone}</strong>.</p>
<p><strong>Best regards,</strong><br>The {company} Team</p>"#
    );

    Rendered {
        subject: format!("Thank You for Contacting {}", brand.company_name),
        html: page(
            &format!("Thank You - {}", company),
            &format!("Thank You, {}!", name),
            &body,
            brand,
        ),
    }
}

/// Business notification for a persisted property application
pub fn application_notification(
    application: &ApplicationSubmission,
    saved: &SavedApplication,
    brand: &BrandConfig,
) -> Rendered {
    let mut body = String::new();

    section(&mut body, "Owner");
    field(&mut body, "Name", &application.full_name());
    field(&mut body, "Email", &application.email);
    field(&mut body, "Phone", &application.phone);

    section(&mut body, "Property");
    field(&mut body, "Property Address", &application.full_address());
    field(&mut body, "Property Type", &application.property_type);
    field(&mut body, "Bedrooms", &application.bedrooms.to_string());
    field(&mut body, "Bathrooms", &application.bathrooms.to_string());
    optional_field(
        &mut body,
        "Square Footage",
        application.square_footage.map(|v| v.to_string()).as_deref(),
    );
    field(&mut body, "Year Built", &application.year_built.to_string());
    field(&mut body, "Furnished", yes_no(application.furnished));
    if !application.amenities.is_empty() {
        field(&mut body, "Amenities", &application.amenities.join(", "));
    }
    optional_field(&mut body, "Condition", application.property_condition.as_deref());
    field(&mut body, "Photos Available", yes_no(application.photos_available));

    section(&mut body, "Current Situation");
    field(&mut body, "Currently Listed", yes_no(application.currently_listed));
    optional_field(&mut body, "Listing Duration", application.listing_duration.as_deref());
    optional_field(
        &mut body,
        "Current Rent",
        application.current_rent.map(|v| format!("${}", v)).as_deref(),
    );
    optional_field(&mut body, "Vacancy", application.vacancy_months.as_deref());
    optional_field(&mut body, "Reason for Vacancy", application.reason_for_vacancy.as_deref());

    section(&mut body, "Goals");
    optional_field(&mut body, "Target Income", application.target_income.as_deref());
    optional_field(&mut body, "Timeline", application.timeline.as_deref());
    if !application.concerns.is_empty() {
        field(&mut body, "Concerns", &application.concerns.join(", "));
    }
    optional_field(&mut body, "Additional Info", application.additional_info.as_deref());
    optional_field(&mut body, "Access Notes", application.access_notes.as_deref());

    section(&mut body, "Estimate");
    field(
        &mut body,
        "Estimated Monthly Income",
        &format!("${}", saved.estimated_monthly_income),
    );
    field(&mut body, "Application ID", &saved.application_id.to_string());
    field(&mut body, "Property ID", &saved.property_id.to_string());
    field(&mut body, "Owner ID", &saved.owner_id.to_string());

    Rendered {
        subject: format!(
            "New Application: {} - {}",
            application.full_name(),
            application.full_address()
        ),
        html: page("New Property Application", "New Property Application", &body, brand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{parse_application, parse_contact, valid_payload};
    use serde_json::json;
    use uuid::Uuid;

    fn contact(message: &str) -> ContactSubmission {
        parse_contact(json!({
            "name": "Sam <script>",
            "email": "sam@example.com",
            "message": message,
            "bedrooms": 2
        }))
        .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_contact_notification_escapes_input() {
        let rendered = contact_notification(&contact("Hello <b>there</b>, I own a condo"), &BrandConfig::default());

        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("Sam &lt;script&gt;"));
        assert!(rendered.html.contains("Hello &lt;b&gt;there&lt;/b&gt;"));
        assert!(rendered.html.contains("Bedrooms:</span> 2"));
        assert!(rendered.subject.starts_with("New Contact Form: Sam <script>"));
    }

    #[test]
    fn test_auto_reply_only_uses_name() {
        let rendered = contact_auto_reply(&contact("Please call me about my duplex"), &BrandConfig::default());

        assert!(rendered.html.contains("Dear Sam &lt;script&gt;"));
        assert!(rendered.html.contains("within 24 hours"));
        assert!(!rendered.html.contains("duplex"));
        assert!(!rendered.html.contains("sam@example.com"));
    }

    #[test]
    fn test_application_notification_includes_estimate_and_ids() {
        let application = parse_application(valid_payload()).unwrap();
        let saved = SavedApplication {
            application_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            estimated_monthly_income: 6131,
        };

        let rendered = application_notification(&application, &saved, &BrandConfig::default());

        assert!(rendered.html.contains("$6131"));
        assert!(rendered.html.contains(&saved.application_id.to_string()));
        assert!(rendered.html.contains("pool, wifi"));
        assert_eq!(
            rendered.subject,
            "New Application: Dana Whitfield - 418 Mission Oak Dr, San Antonio, TX 78254"
        );
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("<style>p { color: red; }</style><h1>Hi &amp; welcome</h1><p>Line one<br>Line two</p>");
        assert_eq!(text, "Hi & welcome\nLine one\nLine two");
    }
}
