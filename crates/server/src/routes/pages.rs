//! Server-rendered market page.
//!
//! Mutations answer with a 303 back to `/` carrying a flash message, so every
//! add or delete is followed by a fresh read of the store.

use std::fmt::Write as _;

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form,
};
use common::types::Flash;
use serde::Deserialize;
use service::market::{ListingRef, MarketSnapshot};
use tracing::warn;

use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub seller: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub selection: String,
}

pub async fn index(State(state): State<ServerState>, Query(flash): Query<Flash>) -> Html<String> {
    let snapshot = state.market.list_listings().await;
    Html(render_page(&state.ui, &snapshot, &flash))
}

pub async fn add(State(state): State<ServerState>, Form(form): Form<AddForm>) -> Redirect {
    let flash = match state.market.add_listing(&form.item, &form.price, &form.seller).await {
        Ok(_) => Flash { ok: Some("Item added successfully!".into()), err: None },
        Err(e) => Flash { ok: None, err: Some(format!("Failed to add item: {}", e)) },
    };
    redirect_home(&flash)
}

pub async fn delete(State(state): State<ServerState>, Form(form): Form<DeleteForm>) -> Redirect {
    let target: ListingRef = match serde_json::from_str(&form.selection) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "unreadable delete selection");
            return redirect_home(&Flash { ok: None, err: Some("Please select an item to delete.".into()) });
        }
    };
    let flash = match state.market.delete_listing(&target).await {
        Ok(_) => Flash { ok: Some("Item deleted!".into()), err: None },
        Err(e) => Flash { ok: None, err: Some(format!("Failed to delete item: {}", e)) },
    };
    redirect_home(&flash)
}

fn redirect_home(flash: &Flash) -> Redirect {
    match serde_urlencoded::to_string(flash) {
        Ok(q) if !q.is_empty() => Redirect::to(&format!("/?{}", q)),
        _ => Redirect::to("/"),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

pub fn render_page(ui: &configs::UiConfig, snapshot: &MarketSnapshot, flash: &Flash) -> String {
    let title = escape_html(&ui.title);
    let mut html = String::new();
    let _ = write!(
        html,
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n"
    );
    if ui.refresh_secs > 0 {
        let _ = writeln!(html, "<meta http-equiv=\"refresh\" content=\"{}\">", ui.refresh_secs);
    }
    let _ = write!(html, "</head>\n<body>\n<h1>{title}</h1>\n");

    if let Some(ok) = &flash.ok {
        let _ = writeln!(html, "<p class=\"flash success\">{}</p>", escape_html(ok));
    }
    if let Some(err) = &flash.err {
        let _ = writeln!(html, "<p class=\"flash error\">{}</p>", escape_html(err));
    }
    if let Some(warning) = &snapshot.warning {
        let _ = writeln!(html, "<p class=\"flash error\">{}</p>", escape_html(warning));
    }

    html.push_str("<aside>\n<h2>Add New Item</h2>\n<form method=\"post\" action=\"/listings\">\n");
    for (name, label) in [("item", "Item Name"), ("price", "Price (coins)"), ("seller", "Seller Name")] {
        let _ = writeln!(html, "<label>{label} <input name=\"{name}\" required></label>");
    }
    html.push_str("<button type=\"submit\">Add Item</button>\n</form>\n<h2>Delete Item</h2>\n");

    if snapshot.is_empty() {
        html.push_str("<p class=\"info\">Market is empty. Add some items!</p>\n");
    } else {
        html.push_str(
            "<form method=\"post\" action=\"/listings/delete\">\n<label>Select item to delete: <select name=\"selection\">\n",
        );
        for entry in &snapshot.entries {
            let value = serde_json::to_string(entry).unwrap_or_default();
            let _ = writeln!(
                html,
                "<option value=\"{}\">{}</option>",
                escape_html(&value),
                escape_html(&entry.listing.display_label())
            );
        }
        html.push_str("</select></label>\n<button type=\"submit\">Delete Selected Item</button>\n</form>\n");
    }
    html.push_str("</aside>\n<main>\n<h2>Market Items</h2>\n");

    if snapshot.is_empty() {
        html.push_str("<p class=\"info\">Market is empty. Add some items!</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr>");
        for col in &snapshot.columns {
            let _ = write!(html, "<th>{}</th>", escape_html(col));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for l in snapshot.listings() {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&l.item),
                escape_html(&l.price),
                escape_html(&l.seller)
            );
        }
        html.push_str("</tbody>\n</table>\n");
    }
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::market::{Listing, ListingId};
    use service::store::RawTable;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            entries: vec![ListingRef {
                id: ListingId::Position(0),
                listing: Listing { item: "<Sword>".into(), price: "7".into(), seller: "Al\"ex".into() },
            }],
            ..MarketSnapshot::empty()
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&'</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn page_lists_entries_and_selector_round_trips_handle() {
        let html = render_page(&configs::UiConfig::default(), &snapshot(), &Flash::default());
        assert!(html.contains("<td>&lt;Sword&gt;</td>"));
        assert!(html.contains("&lt;Sword&gt; - 7 coins - Al&quot;ex"));
        assert!(!html.contains("http-equiv"));

        let start = html.find("<option value=\"").unwrap() + "<option value=\"".len();
        let end = start + html[start..].find('"').unwrap();
        let raw = html[start..end].replace("&quot;", "\"").replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&");
        let back: ListingRef = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, snapshot().entries[0]);
    }

    #[test]
    fn empty_market_and_flash_messages() {
        let ui = configs::UiConfig { refresh_secs: 15, ..Default::default() };
        let flash = Flash { ok: None, err: Some("Failed to delete item: gone".into()) };
        let html = render_page(&ui, &MarketSnapshot::degraded("store offline"), &flash);
        assert!(html.contains("Market is empty. Add some items!"));
        assert!(html.contains("store offline"));
        assert!(html.contains("Failed to delete item: gone"));
        assert!(html.contains("content=\"15\""));
        assert!(!html.contains("<select"));
    }

    #[test]
    fn reordered_sheet_header_renders_market_column_order() {
        let grid = vec![
            vec!["Seller".to_string(), "Item".to_string(), "Price".to_string()],
            vec!["Steve".to_string(), "Diamond".to_string(), "50".to_string()],
        ];
        let snap = MarketSnapshot::from_raw(RawTable::Grid(grid));
        let html = render_page(&configs::UiConfig::default(), &snap, &Flash::default());
        assert!(html.contains("<th>Item</th><th>Price</th><th>Seller</th>"));
        assert!(html.contains("<tr><td>Diamond</td><td>50</td><td>Steve</td></tr>"));
    }

    #[test]
    fn redirect_carries_flash() {
        let r = redirect_home(&Flash { ok: Some("Item added successfully!".into()), err: None });
        let resp = axum::response::IntoResponse::into_response(r);
        assert_eq!(resp.status(), axum::http::StatusCode::SEE_OTHER);
        let loc = resp.headers()["location"].to_str().unwrap().to_string();
        assert_eq!(loc, "/?ok=Item+added+successfully%21");
    }
}
