//! Server-side HTML for the dashboard. One page shell; the quote card and
//! error banner slots are filled depending on the lookup outcome.

use crate::change::Direction;
use crate::data_structures::{Quote, WatchlistEntry};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f8fafc; color: #1e293b; margin: 0; padding: 2rem; }
main { max-width: 56rem; margin: 0 auto; display: grid; grid-template-columns: 2fr 1fr; gap: 1.5rem; }
header { grid-column: 1 / -1; display: flex; justify-content: space-between; align-items: center; }
.card { background: #fff; border: 1px solid #e2e8f0; border-radius: 0.75rem; padding: 1.5rem; }
.error { grid-column: 1 / -1; background: #fee2e2; border: 1px solid #f87171; color: #b91c1c; padding: 0.75rem 1rem; border-radius: 0.5rem; }
.price { font-size: 2.25rem; font-weight: 700; }
.change-positive { color: #16a34a; }
.change-negative { color: #dc2626; }
.change-zero { color: #64748b; }
table { width: 100%; border-collapse: collapse; margin-top: 1rem; }
td, th { text-align: left; padding: 0.25rem 0; border-bottom: 1px solid #f1f5f9; }
ul { list-style: none; padding: 0; }
li { display: flex; justify-content: space-between; padding: 0.4rem 0; }
"#;

/// Outcome of the lookup the page should display.
pub enum Lookup<'a> {
    None,
    Found(&'a Quote),
    Failed { symbol: &'a str, message: String },
}

pub struct Page<'a> {
    pub title: &'a str,
    pub query: &'a str,
    pub lookup: Lookup<'a>,
    pub watchlist: &'a [WatchlistEntry],
}

pub fn change_class(direction: Direction) -> &'static str {
    match direction {
        Direction::Positive => "change-positive",
        Direction::Negative => "change-negative",
        Direction::Zero => "change-zero",
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_page(page: &Page<'_>) -> String {
    let title = escape_html(page.title);
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<main>
<header class="card">
<h1>{title}</h1>
<form method="get" action="/">
<input type="text" name="ticker" value="{query}" placeholder="Enter Ticker (e.g. AAPL)" required>
<button type="submit">Analyze</button>
</form>
</header>
"#,
        query = escape_html(page.query),
    );

    match &page.lookup {
        Lookup::None => html.push_str("<section class=\"card\"><p>Enter a ticker to see its latest move.</p></section>\n"),
        Lookup::Found(quote) => html.push_str(&render_quote(quote)),
        Lookup::Failed { symbol, message } => {
            html.push_str(&format!(
                "<div class=\"error\" role=\"alert\" data-symbol=\"{}\">{}</div>\n",
                escape_html(symbol),
                escape_html(message)
            ));
            html.push_str("<section class=\"card\"><p>No quote to show.</p></section>\n");
        }
    }

    html.push_str(&render_watchlist(page.watchlist));
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_quote(quote: &Quote) -> String {
    let symbol = escape_html(quote.symbol.as_str());
    let rows: String = quote
        .history
        .points()
        .iter()
        .rev()
        .map(|point| format!("<tr><td>{}</td><td>{:.2}</td></tr>\n", point.date.format("%Y-%m-%d"), point.close))
        .collect();

    format!(
        r#"<section class="card" id="quote">
<h2>{symbol}</h2>
<div class="price">${price:.2}</div>
<div class="{class}" id="change">{change}</div>
<form method="post" action="/watchlist"><input type="hidden" name="ticker" value="{symbol}"><button type="submit">+ Add to watchlist</button></form>
<table>
<thead><tr><th>Date</th><th>Close</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</section>
"#,
        price = quote.price,
        class = change_class(quote.change.direction),
        change = quote.change.display(),
    )
}

fn render_watchlist(entries: &[WatchlistEntry]) -> String {
    let mut html = String::from("<aside class=\"card\">\n<h3>My Watchlist</h3>\n<ul id=\"watchlist\">\n");
    if entries.is_empty() {
        html.push_str("<li><em>Watchlist is empty.</em></li>\n");
    }
    for entry in entries {
        let symbol = escape_html(entry.ticker.as_str());
        html.push_str(&format!(
            r#"<li><a href="/?ticker={symbol}">{symbol}</a><form method="post" action="/watchlist/{symbol}/delete"><button type="submit" aria-label="Remove {symbol}">&#x2716;</button></form></li>
"#
        ));
    }
    html.push_str("</ul>\n</aside>\n");
    html
}
