//! HTML bodies for the confirmation emails. Every interpolated value is escaped.

use chrono::Datelike;
use std::fmt::Write;

use crate::domain::{EmailCopy, EmailSettings, Order, StoreBranding};

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn render_confirmation(
    copy: &EmailCopy,
    settings: &EmailSettings,
    branding: &StoreBranding,
    order: &Order,
) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    let _ = write!(html, "<title>{}</title>", escape_html(&copy.subject));
    html.push_str("</head><body style=\"font-family:Helvetica,Arial,sans-serif;margin:0 auto;max-width:600px\">");

    introduction(&mut html, copy, settings);
    for item in &order.items {
        let _ = write!(
            html,
            "<section class=\"product\"><img src=\"{}\" alt=\"{}\" width=\"180\">\
             <p><strong>{} x {}</strong></p><p>{}</p></section><hr>",
            escape_html(item.product.thumbnail()),
            escape_html(&item.product.name),
            item.quantity,
            escape_html(&item.product.name),
            escape_html(&item.product.size),
        );
    }
    order_information(&mut html, order);
    footer(&mut html, settings, branding, order.created_at.year());

    html.push_str("</body></html>");
    html
}

fn introduction(html: &mut String, copy: &EmailCopy, settings: &EmailSettings) {
    let _ = write!(
        html,
        "<section class=\"introduction\" style=\"padding:40px 74px;text-align:center\">\
         <img src=\"{}\" alt=\"{}\" width=\"66\">\
         <h1>{}</h1><p style=\"font-size:20px\">{}</p>",
        escape_html(&settings.logo_url),
        escape_html(&settings.name),
        escape_html(&copy.title),
        escape_html(&copy.subtitle),
    );
    if !copy.description.is_empty() {
        let _ = write!(html, "<p>{}</p>", escape_html(&copy.description));
    }
    html.push_str("</section><hr>");
}

fn order_information(html: &mut String, order: &Order) {
    let _ = write!(
        html,
        "<section class=\"order-information\">\
         <p><strong>Order</strong></p><p>#{:05}</p><p>{}</p>\
         <p><strong>Purchase date</strong></p><p>{}</p></section><hr>",
        order.code,
        order.id,
        order.created_at.format("%d/%m/%Y"),
    );
}

fn footer(html: &mut String, settings: &EmailSettings, branding: &StoreBranding, year: i32) {
    html.push_str("<section class=\"footer\" style=\"text-align:center\"><nav>");
    let store_url = branding.store_url.trim_end_matches('/');
    for category in &branding.categories {
        let _ = write!(
            html,
            "<a href=\"{}/{}\">{}</a> ",
            escape_html(store_url),
            category.id,
            escape_html(&category.name),
        );
    }
    let _ = write!(
        html,
        "</nav><p>&copy; {} {}. All rights reserved.</p><p>{}. {}</p></section>",
        year,
        escape_html(&settings.name),
        escape_html(&settings.official_name),
        escape_html(&settings.address),
    );
}
