use crate::models::{HabitRow, MonthOverview, UserId};
use crate::theme::ThemeSettings;
use std::fmt::Write;

pub fn render_month_page(
    user_id: UserId,
    overview: &MonthOverview,
    theme: &ThemeSettings,
) -> String {
    let palette = theme.palette;
    let (prev_year, prev_month) = shift_month(overview.year, overview.month, -1);
    let (next_year, next_month) = shift_month(overview.year, overview.month, 1);

    let mut header = String::from("<th class=\"name\">Привычка</th>");
    for day in 1..=overview.days_in_month {
        let _ = write!(header, "<th>{day}</th>");
    }
    header.push_str("<th>Итого</th><th>%</th>");

    let rows: String = if overview.habits.is_empty() {
        format!(
            "<tr><td class=\"empty\" colspan=\"{}\">Нет привычек за этот месяц</td></tr>",
            overview.days_in_month + 3
        )
    } else {
        overview.habits.iter().map(render_row).collect()
    };

    INDEX_HTML
        .replace("{{BACKGROUND}}", palette.background)
        .replace("{{SURFACE}}", palette.surface)
        .replace("{{TEXT}}", palette.text)
        .replace("{{MUTED}}", palette.muted)
        .replace("{{ACCENT}}", palette.accent)
        .replace("{{TITLE}}", &format!("{:02}.{}", overview.month, overview.year))
        .replace(
            "{{PREV}}",
            &format!("/?user_id={user_id}&year={prev_year}&month={prev_month}"),
        )
        .replace(
            "{{NEXT}}",
            &format!("/?user_id={user_id}&year={next_year}&month={next_month}"),
        )
        .replace("{{HEADER}}", &header)
        .replace("{{ROWS}}", &rows)
}

fn render_row(row: &HabitRow) -> String {
    let mut html = String::new();
    let unit = row.habit.unit.as_deref().unwrap_or("");
    let _ = write!(
        html,
        "<tr class=\"{}\"><td class=\"name\">{}<span>{} · план {}</span></td>",
        row.kind.as_str(),
        escape(&row.habit.name),
        escape(unit),
        row.habit.plan
    );
    for cell in &row.days {
        let class = if cell.value > 0.0 { "set" } else { "" };
        let _ = write!(html, "<td class=\"{class}\">{}</td>", escape(&cell.display));
    }
    let _ = write!(
        html,
        "<td class=\"total\">{}</td><td class=\"total\">{}%</td></tr>",
        escape(&row.stats.display),
        row.stats.percent
    );
    html
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Mind &amp; Motion · {{TITLE}}</title>
  <style>
    :root {
      --bg: {{BACKGROUND}};
      --surface: {{SURFACE}};
      --ink: {{TEXT}};
      --muted: {{MUTED}};
      --accent: {{ACCENT}};
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      max-width: 1200px;
      margin: 0 auto;
      background: var(--surface);
      border-radius: 24px;
      padding: 28px;
      display: grid;
      gap: 20px;
      overflow-x: auto;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    nav a {
      color: var(--accent);
      text-decoration: none;
      font-weight: 600;
      padding: 6px 12px;
    }

    table {
      border-collapse: collapse;
      font-size: 0.85rem;
    }

    th,
    td {
      border: 1px solid rgba(127, 127, 127, 0.2);
      min-width: 28px;
      height: 32px;
      text-align: center;
    }

    th {
      color: var(--muted);
      font-weight: 500;
    }

    td.name,
    th.name {
      text-align: left;
      padding: 4px 10px;
      min-width: 160px;
    }

    td.name span {
      display: block;
      color: var(--muted);
      font-size: 0.75rem;
    }

    td.set {
      background: var(--accent);
      color: var(--surface);
      font-weight: 600;
    }

    td.total {
      padding: 0 8px;
      font-weight: 600;
    }

    td.empty {
      color: var(--muted);
      padding: 24px;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>{{TITLE}}</h1>
      <nav>
        <a href="{{PREV}}">&larr;</a>
        <a href="{{NEXT}}">&rarr;</a>
      </nav>
    </header>
    <table>
      <thead><tr>{{HEADER}}</tr></thead>
      <tbody>{{ROWS}}</tbody>
    </table>
  </main>
</body>
</html>
"#;
