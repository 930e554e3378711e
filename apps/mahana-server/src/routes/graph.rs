use crate::routes::api::{RangeQuery, DEFAULT_DAYS};
use crate::state::AppState;
use axum::extract::{Path, Query};
use axum::response::Html;
use axum::routing::get;
use axum::Router;

async fn graph_page(
    Path(sensor_name): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Html<String> {
    Html(render_graph_page(
        &sensor_name,
        range.days.unwrap_or(DEFAULT_DAYS),
    ))
}

/// Minimal inline page: fetches the decimated series from the API and draws
/// an SVG polyline. The API contract does the heavy lifting; this is just a
/// viewer.
fn render_graph_page(sensor_name: &str, days: i64) -> String {
    let title = escape_html(sensor_name);
    // JSON-encoding covers quoting for the script context.
    let sensor_js = serde_json::to_string(sensor_name).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>{title} (last {days} days)</title>
<style>body{{font-family:sans-serif;margin:2em}}svg{{border:1px solid #ccc;width:100%;height:320px}}</style>
</head>
<body>
<h1>{title}</h1>
<svg id="graph" viewBox="0 0 1000 320" preserveAspectRatio="none"></svg>
<script>
const sensor = {sensor_js};
fetch(`/api/${{encodeURIComponent(sensor)}}?days={days}`)
  .then(r => r.json())
  .then(points => {{
    const data = points.filter(p => p[1] !== null)
      .map(p => [Date.parse(p[0]), parseFloat(p[1])]);
    if (!data.length) return;
    const xs = data.map(p => p[0]), ys = data.map(p => p[1]);
    const x0 = Math.min(...xs), x1 = Math.max(...xs) || x0 + 1;
    const y0 = Math.min(...ys), y1 = Math.max(...ys) || y0 + 1;
    const path = data.map(p => [
      1000 * (p[0] - x0) / Math.max(x1 - x0, 1),
      320 - 300 * (p[1] - y0) / Math.max(y1 - y0, 0.1) - 10,
    ].join(',')).join(' ');
    const line = document.createElementNS('http://www.w3.org/2000/svg', 'polyline');
    line.setAttribute('points', path);
    line.setAttribute('fill', 'none');
    line.setAttribute('stroke', '#c0392b');
    document.getElementById('graph').appendChild(line);
  }});
</script>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

pub fn router() -> Router<AppState> {
    Router::new().route("/graph/{sensor_name}", get(graph_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_carries_sensor_and_window() {
        let page = render_graph_page("bedroom", 3);
        assert!(page.contains("<h1>bedroom</h1>"));
        assert!(page.contains("?days=3"));
    }

    #[test]
    fn sensor_name_is_escaped() {
        let page = render_graph_page("<script>alert(1)</script>", DEFAULT_DAYS);
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
