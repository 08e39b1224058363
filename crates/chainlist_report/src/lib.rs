//! Static HTML listing of a published chain snapshot.

use chainlist::{ChainRecord, ReportData};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Render the listing to `out_path`.
pub fn render_report(data: &ReportData, out_path: impl AsRef<Path>) -> Result<(), ReportError> {
    let html = build_html(data)?;
    let mut f = std::fs::File::create(out_path.as_ref()).map_err(ReportError::Io)?;
    f.write_all(html.as_bytes()).map_err(ReportError::Io)?;
    Ok(())
}

/// Build HTML string from report data (for testing or in-memory use).
pub fn build_html(data: &ReportData) -> Result<String, ReportError> {
    let json_embed =
        escape_json_in_html(&serde_json::to_string(&data.chains).map_err(ReportError::Json)?);
    let mut cards = String::new();
    for chain in &data.chains {
        card(&mut cards, chain).map_err(ReportError::Fmt)?;
    }
    let filter_note = match (data.include_testnets, data.search.is_empty()) {
        (true, true) => "all networks".to_string(),
        (false, true) => "mainnets only".to_string(),
        (true, false) => format!("search \"{}\"", escape_html(&data.search)),
        (false, false) => format!("mainnets matching \"{}\"", escape_html(&data.search)),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Chainlist</title>
<style>
:root {{ font-family: system-ui, sans-serif; background: #0f1419; color: #e6edf3; }}
body {{ max-width: 1100px; margin: 0 auto; padding: 1.5rem; }}
h1 {{ font-size: 1.4rem; margin-bottom: 0.5rem; }}
.mono {{ font-family: ui-monospace, monospace; font-size: 0.85em; word-break: break-all; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 0.75rem; }}
.card {{ background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; }}
.card h2 {{ font-size: 1rem; margin: 0 0 0.5rem 0; }}
.row {{ display: grid; grid-template-columns: auto 1fr; gap: 0.25rem 1rem; }}
.label {{ color: #8b949e; }}
.footer {{ margin-top: 2rem; font-size: 0.85rem; color: #8b949e; }}
</style>
</head>
<body>
<h1>Chainlist</h1>
<p>Helping users connect to EVM powered networks. Showing {shown} of {total} ({filter_note}), ranked by TVL.</p>
<p class="mono">Generated: {created} &middot; SHA-256: {hash}</p>
<div class="grid">
{cards}</div>
<script type="application/json" id="chains">{json_embed}</script>
<div class="footer">
  <p>Verify with <code>chainlist verify --snapshot &lt;chains.json&gt;</code>.</p>
</div>
</body>
</html>"#,
        shown = data.chains.len(),
        total = data.total_chains,
        filter_note = filter_note,
        created = escape_html(&data.created_utc_rfc3339),
        hash = escape_html(&data.snapshot_hash_sha256),
        cards = cards,
        json_embed = json_embed,
    );
    Ok(html)
}

fn card(out: &mut String, chain: &ChainRecord) -> std::fmt::Result {
    let tvl = chain
        .tvl
        .map(format_usd)
        .unwrap_or_else(|| "—".to_string());
    let symbol = chain.native_currency_symbol().unwrap_or("—");
    writeln!(out, r#"<div class="card">"#)?;
    writeln!(out, "  <h2>{}</h2>", escape_html(&chain.name))?;
    writeln!(out, r#"  <div class="row">"#)?;
    writeln!(
        out,
        r#"    <span class="label">Chain ID</span><span class="mono">{}</span>"#,
        chain.chain_id
    )?;
    writeln!(
        out,
        r#"    <span class="label">Currency</span><span>{}</span>"#,
        escape_html(symbol)
    )?;
    writeln!(out, r#"    <span class="label">TVL</span><span>{}</span>"#, tvl)?;
    writeln!(out, "  </div>")?;
    if let Some(rpc) = chain.rpc.first() {
        writeln!(out, r#"  <p class="mono">{}</p>"#, escape_html(rpc))?;
    }
    writeln!(out, "</div>")
}

/// `1234567.8` -> `$1.23M`.
fn format_usd(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("${:.2}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("${:.2}K", v / 1e3)
    } else {
        format!("${:.0}", v)
    }
}

fn escape_html(s: &str) -> String {
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

/// JSON inside `<script>` is raw text: entities are not decoded. serde only
/// emits `<` inside strings, where `\u003c` is an equivalent escape that can
/// neither close the element nor open a comment.
fn escape_json_in_html(s: &str) -> String {
    s.replace('<', "\\u003c")
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Fmt(std::fmt::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "io: {}", e),
            ReportError::Json(e) => write!(f, "json: {}", e),
            ReportError::Fmt(e) => write!(f, "format: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}
