//! Text and HTML renderings of booking data.
//!
//! All patient-supplied text is escaped before it is placed in HTML.

use crate::billing::{format_money, Bill, Totals};
use crate::catalog::Catalog;
use crate::constants::{
    CLINIC_NAME, CLINIC_TAGLINE, PAYMENT_NOTE, QR_CAPTION, TAX_RATE_PERCENT, THANK_YOU_NOTE,
};
use crate::selection::Selection;
use bloodtest_verification::VerificationCode;

/// Escapes the five HTML-significant characters.
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

const PRINT_STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#1f2937}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #d1d5db;padding:.5em .75em;text-align:left}\
td.price,th.price{text-align:right}\
.summary p{display:flex;justify-content:space-between;max-width:20em}\
.total{font-weight:bold}";

/// Standalone HTML document for printing a bill.
///
/// The QR section is left out when `code` is `None`.
pub fn bill_html(bill: &Bill, code: Option<&VerificationCode>) -> String {
    let patient = bill.patient_info();
    let appointment = bill.appointment();
    let totals = bill.totals();
    let number = escape_html(bill.bill_number().as_str());

    let mut html = String::new();
    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Bill {number}</title>\n<style>{PRINT_STYLE}</style>\n</head>\n<body>\n\
         <header>\n<h1>{}</h1>\n<p>{}</p>\n</header>\n",
        escape_html(CLINIC_NAME),
        escape_html(CLINIC_TAGLINE),
    ));

    html.push_str("<section class=\"bill-to\">\n<h3>Bill To:</h3>\n");
    html.push_str(&format!("<p>{}</p>\n", escape_html(patient.name.as_str())));
    html.push_str(&format!("<p>{}</p>\n", escape_html(patient.email.as_str())));
    html.push_str(&format!("<p>{}</p>\n", escape_html(patient.phone.as_str())));
    if let Some(address) = &patient.address {
        html.push_str(&format!("<p>{}</p>\n", escape_html(address.as_str())));
    }
    html.push_str("</section>\n");

    html.push_str(&format!(
        "<section class=\"bill-details\">\n<h3>Bill Details:</h3>\n\
         <p>Bill Number: <strong>{number}</strong></p>\n\
         <p>Date: <strong>{}</strong></p>\n\
         <p>Appointment: <strong>{} at {}</strong></p>\n</section>\n",
        bill.generated_at().format("%Y-%m-%d"),
        appointment.date,
        appointment.time.label(),
    ));

    html.push_str(
        "<section class=\"tests\">\n<h3>Selected Blood Tests</h3>\n<table>\n<thead><tr>\
         <th>Test Name</th><th>Description</th><th class=\"price\">Price</th>\
         </tr></thead>\n<tbody>\n",
    );
    for test in bill.selected_tests().tests() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"price\">{}</td></tr>\n",
            escape_html(&test.name),
            escape_html(&test.description),
            escape_html(&format_money(test.price)),
        ));
    }
    html.push_str("</tbody>\n</table>\n</section>\n");

    html.push_str(&format!(
        "<section class=\"summary\">\n<h3>Payment Summary</h3>\n\
         <p><span>Subtotal:</span><span>{}</span></p>\n\
         <p><span>Tax ({TAX_RATE_PERCENT}%):</span><span>{}</span></p>\n\
         <p class=\"total\"><span>Total Amount:</span><span>{}</span></p>\n</section>\n",
        escape_html(&format_money(totals.subtotal)),
        escape_html(&format_money(totals.tax)),
        escape_html(&format_money(totals.total)),
    ));

    if let Some(code) = code {
        html.push_str(&format!(
            "<section class=\"verification\">\n<h3>QR Code Verification</h3>\n\
             <img src=\"{}\" width=\"{edge}\" height=\"{edge}\" \
             alt=\"Bill verification QR code\">\n<p>{}</p>\n</section>\n",
            code.to_data_uri(),
            escape_html(QR_CAPTION),
            edge = code.edge(),
        ));
    }

    html.push_str(&format!(
        "<footer>\n<p>{}</p>\n</footer>\n</body>\n</html>\n",
        escape_html(THANK_YOU_NOTE)
    ));
    html
}

/// Plain-text bill for terminals.
pub fn bill_text(bill: &Bill) -> String {
    let patient = bill.patient_info();
    let appointment = bill.appointment();

    let mut out = String::new();
    out.push_str(&format!("{CLINIC_NAME}\n"));
    out.push_str(&format!("Bill #{}\n", bill.bill_number()));
    out.push_str(&format!("Date: {}\n", bill.generated_at().format("%Y-%m-%d")));
    out.push_str(&format!(
        "Appointment: {} at {}\n\n",
        appointment.date,
        appointment.time.label()
    ));
    out.push_str("Bill To:\n");
    out.push_str(&format!("  {}\n", patient.name));
    out.push_str(&format!("  {}\n", patient.email));
    out.push_str(&format!("  {}\n", patient.phone));
    if let Some(address) = &patient.address {
        out.push_str(&format!("  {address}\n"));
    }
    out.push('\n');
    out.push_str(&selection_text(bill.selected_tests()));
    out.push_str(&totals_text(&bill.totals()));
    out
}

/// Numbered catalog listing, with a `[x]` marker on selected tests.
pub fn catalog_text(catalog: &Catalog, selection: &Selection) -> String {
    let mut out = String::new();
    for test in catalog.tests() {
        let mark = if selection.contains(test.id) { 'x' } else { ' ' };
        out.push_str(&format!(
            "[{mark}] {:>2}. {:<42} {:>9}\n",
            test.id,
            test.name,
            format_money(test.price)
        ));
        out.push_str(&format!("         {}\n", test.description));
    }
    out
}

/// One line per selected test with its price.
pub fn selection_text(selection: &Selection) -> String {
    let mut out = String::new();
    for test in selection.tests() {
        out.push_str(&format!(
            "  {:<44} {:>9}\n",
            test.name,
            format_money(test.price)
        ));
    }
    out
}

pub fn totals_text(totals: &Totals) -> String {
    format!(
        "  {:<44} {:>9}\n  {:<44} {:>9}\n  {:<44} {:>9}\n",
        "Subtotal:",
        format_money(totals.subtotal),
        format!("Tax ({TAX_RATE_PERCENT}%):"),
        format_money(totals.tax),
        "Total Amount:",
        format_money(totals.total),
    )
}

/// Confirmation summary: the selected tests, their totals and the payment note.
pub fn confirmation_summary_text(selection: &Selection, totals: &Totals) -> String {
    let mut out = String::from("Selected Tests\n");
    out.push_str(&selection_text(selection));
    out.push_str(&totals_text(totals));
    out.push_str(&format!("\n{PAYMENT_NOTE}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_bill, selection};
    use bloodtest_verification::QrOptions;

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn bill_html_lists_tests_and_totals() {
        let bill = sample_bill(&[1, 5]);
        let html = bill_html(&bill, None);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(bill.bill_number().as_str()));
        assert!(html.contains("Complete Blood Count (CBC)"));
        assert!(html.contains("₹65.00"));
        assert!(html.contains("Tax (8%):"));
        assert!(html.contains("₹5.20"));
        assert!(html.contains("₹70.20"));
        assert!(html.contains("10:00 AM"));
        assert!(!html.contains("QR Code Verification"));
    }

    #[test]
    fn bill_html_escapes_patient_text() {
        let bill = sample_bill(&[1]);
        let mut json = serde_json::to_value(&bill).expect("serialize");
        json["patientInfo"]["name"] = serde_json::Value::String("<script>x</script>".into());
        let bill: Bill = serde_json::from_value(json).expect("deserialize");

        let html = bill_html(&bill, None);
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn bill_html_embeds_qr_when_present() {
        let bill = sample_bill(&[2]);
        let code = VerificationCode::encode("BT000001", &QrOptions::default()).expect("encode");
        let html = bill_html(&bill, Some(&code));

        assert!(html.contains("QR Code Verification"));
        assert!(html.contains("data:image/png;base64,"));
        assert!(html.contains("Scan to verify bill authenticity"));
    }

    #[test]
    fn bill_text_includes_address_when_given() {
        let text = bill_text(&sample_bill(&[3]));
        assert!(text.contains("12 MG Road, Kochi"));
        assert!(text.contains("Total Amount:"));
    }

    #[test]
    fn catalog_text_marks_selected_tests() {
        let chosen = selection(&[2]);
        let text = catalog_text(&Catalog::standard(), &chosen);
        let marked: Vec<&str> = text.lines().filter(|l| l.starts_with("[x]")).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("Peripheral Smear"));
    }

    #[test]
    fn confirmation_summary_ends_with_payment_note() {
        let chosen = selection(&[1, 5]);
        let text = confirmation_summary_text(&chosen, &Totals::for_selection(&chosen));
        assert!(text.contains("₹70.20"));
        assert!(text.trim_end().ends_with(PAYMENT_NOTE));
    }
}
