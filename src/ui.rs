use crate::config::DashboardVariant;
use crate::presenter::DisplayTable;
use crate::session::{ReportView, Session};

pub fn render_index(variant: DashboardVariant, session: &Session) -> String {
    INDEX_HTML
        .replace("{{TITLE}}", variant.title())
        .replace("{{SUBTITLE}}", subtitle(variant))
        .replace("{{STATUS}}", &render_status(session))
        .replace("{{AUTH}}", &render_auth(variant, session))
        .replace("{{QUERY_FORM}}", &render_query_form(variant, session))
        .replace("{{OUTPUT}}", &render_output(variant, session))
}

fn subtitle(variant: DashboardVariant) -> &'static str {
    match variant {
        DashboardVariant::Ranking => "Top search queries for 2023 from Google Search Console.",
        DashboardVariant::PagePerformance => {
            "Pages from the last 28 days, filtered by path, with their average position."
        }
    }
}

fn render_status(session: &Session) -> String {
    let account = session.account.as_deref().unwrap_or("no account");
    let state = if session.is_authenticated() {
        "Connected"
    } else {
        "Not connected"
    };
    format!(
        r#"<div class="stat"><span class="label">Status</span><span class="value">{}</span></div>
      <div class="stat"><span class="label">Account</span><span class="value small">{}</span></div>
      <div class="stat"><span class="label">Sites</span><span class="value">{}</span></div>"#,
        state,
        escape(account),
        session.sites.as_ref().map_or("-".to_string(), |s| s.len().to_string()),
    )
}

fn render_auth(variant: DashboardVariant, session: &Session) -> String {
    let reset = r#"<form method="post" action="/auth/sign-out"><button class="btn-sub" type="submit">Reset session</button></form>"#;
    match variant {
        DashboardVariant::Ranking if session.is_authenticated() => reset.to_string(),
        DashboardVariant::Ranking => {
            r#"<a class="btn-add" href="/auth/connect">Connect Google account</a>"#.to_string()
        }
        DashboardVariant::PagePerformance if session.is_authenticated() => reset.to_string(),
        DashboardVariant::PagePerformance => r#"<form class="stack" method="post" action="/auth/service-account">
        <label class="label" for="key_json">Service account key (JSON)</label>
        <textarea id="key_json" name="key_json" rows="6" spellcheck="false" placeholder='{"type": "service_account", ...}'></textarea>
        <button class="btn-add" type="submit">Use key</button>
      </form>"#
            .to_string(),
    }
}

fn render_query_form(variant: DashboardVariant, session: &Session) -> String {
    if !session.is_authenticated() {
        return String::new();
    }
    let sites = session.site_urls();
    if sites.is_empty() {
        return r#"<p class="hint">No sites are registered for this account.</p>"#.to_string();
    }

    let selected = session
        .report
        .as_ref()
        .map(|report| report.site_url.clone())
        .unwrap_or_else(|| sites[0].clone());
    let options: String = sites
        .iter()
        .map(|site| format!(r#"<option value="{0}"></option>"#, escape(site)))
        .collect();
    let filter = match variant {
        DashboardVariant::Ranking => String::new(),
        DashboardVariant::PagePerformance => {
            let current = session
                .report
                .as_ref()
                .and_then(|report| report.filter.clone())
                .unwrap_or_default();
            format!(
                r#"<label class="label" for="filter">Page path contains</label>
        <input id="filter" name="filter" value="{}" placeholder="/blog/" />"#,
                escape(&current)
            )
        }
    };
    let button = match variant {
        DashboardVariant::Ranking => "Get SEO ranking",
        DashboardVariant::PagePerformance => "Fetch pages",
    };

    format!(
        r#"<form class="stack" method="post" action="/report">
        <label class="label" for="site_url">Site URL</label>
        <input id="site_url" name="site_url" list="sites" value="{}" />
        <datalist id="sites">{options}</datalist>
        {filter}
        <button class="btn-add" type="submit">{button}</button>
      </form>"#,
        escape(&selected)
    )
}

fn render_output(variant: DashboardVariant, session: &Session) -> String {
    if let Some(error) = &session.error {
        return format!(r#"<div class="status" data-type="error">{}</div>"#, escape(error));
    }
    match &session.report {
        Some(report) => render_report(variant, report),
        None => String::new(),
    }
}

fn render_report(variant: DashboardVariant, report: &ReportView) -> String {
    let heading = format!(
        r#"<h2>Data for {}</h2><p class="subtitle">{} to {}</p>"#,
        escape(&report.site_url),
        report.start_date,
        report.end_date
    );
    match &report.table {
        DisplayTable::NoData => format!(
            r#"{heading}<div class="status">No data found for the given site.</div>"#
        ),
        DisplayTable::Rows {
            lines,
            mean_position,
        } => {
            let mean = mean_position
                .map(|mean| {
                    format!(
                        r#"<div class="stat"><span class="label">Average position</span><span class="value net">{mean:.2}</span></div>"#
                    )
                })
                .unwrap_or_default();
            let body: String = lines
                .iter()
                .map(|line| {
                    format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                        escape(&line.key),
                        line.clicks,
                        line.impressions,
                        line.ctr,
                        line.position
                    )
                })
                .collect();
            format!(
                r#"{heading}{mean}
      <div class="table-card"><table>
        <thead><tr><th>{}</th><th>Clicks</th><th>Impressions</th><th>CTR</th><th>Position</th></tr></thead>
        <tbody>{body}</tbody>
      </table></div>"#,
                variant.dimension_label()
            )
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    h2 {
      margin: 0;
      font-size: 1.3rem;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
      font-size: 1rem;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .value {
      font-size: 1.5rem;
      font-weight: 600;
      color: var(--accent-2);
      overflow-wrap: anywhere;
    }

    .value.small {
      font-size: 1rem;
    }

    .value.net {
      color: var(--accent);
    }

    .stack {
      display: grid;
      gap: 10px;
    }

    input, textarea {
      font: inherit;
      border-radius: 14px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      padding: 12px 14px;
      background: white;
    }

    textarea {
      font-family: ui-monospace, monospace;
      font-size: 0.85rem;
    }

    button, a.btn-add {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      text-decoration: none;
      text-align: center;
    }

    .btn-add {
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(255, 107, 74, 0.3);
    }

    .btn-sub {
      background: var(--accent-2);
      color: white;
      box-shadow: 0 10px 24px rgba(47, 72, 88, 0.3);
    }

    .table-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      overflow-x: auto;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.95rem;
    }

    th, td {
      padding: 8px 10px;
      text-align: left;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    td:not(:first-child), th:not(:first-child) {
      text-align: right;
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .hint {
      margin: 0;
      color: #6f6a65;
      font-size: 0.9rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>{{TITLE}}</h1>
      <p class="subtitle">{{SUBTITLE}}</p>
    </header>
    <section class="panel">
      {{STATUS}}
    </section>
    <section>
      {{AUTH}}
    </section>
    <section>
      {{QUERY_FORM}}
    </section>
    <section id="output">
      {{OUTPUT}}
    </section>
  </main>
</body>
</html>
"#;
