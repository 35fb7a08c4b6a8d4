//! HTML fragments for the match panels. Pure string building; the page
//! script swaps them into their containers.

use crate::board::MatchPanel;
use crate::matches::{Match, MatchMode};

const LEAGUE_EMOJI: &[(&str, &str)] = &[
    ("UCL", "⭐"),
    ("EPL", "🏴"),
    ("LaLiga", "🇪🇸"),
    ("Bundesliga", "🇩🇪"),
    ("SerieA", "🇮🇹"),
    ("Ligue1", "🇫🇷"),
];

pub fn league_emoji(league: &str) -> &'static str {
    let league = league.trim();
    LEAGUE_EMOJI
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(league))
        .map(|(_, emoji)| *emoji)
        .unwrap_or("⚽")
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

pub fn panel_title(mode: MatchMode, league: &str) -> String {
    match mode {
        MatchMode::Past => format!("⚽ Поточний тур {}", escape_html(league)),
        MatchMode::Upcoming => format!("📅 Наступний тур {}", escape_html(league)),
    }
}

fn empty_message(mode: MatchMode) -> &'static str {
    match mode {
        MatchMode::Past => "Немає матчів поточного туру для обраної ліги.",
        MatchMode::Upcoming => "Немає запланованих матчів для обраної ліги.",
    }
}

fn score_value(v: Option<i32>) -> String {
    match v {
        Some(n) if n >= 0 => n.to_string(),
        _ => "-".to_string(),
    }
}

fn crest(url: Option<&str>, team: &str) -> String {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) => format!(
            r#"<img src="{}" alt="{}" class="team-crest">"#,
            escape_html(u),
            escape_html(team)
        ),
        None => String::new(),
    }
}

/// One match card. Scores are only shown on the past panel and only when
/// asked for; otherwise the card reads "VS".
pub fn match_card(m: &Match, mode: MatchMode, show_scores: bool) -> String {
    let score = if mode == MatchMode::Past && show_scores {
        format!("{} : {}", score_value(m.home_score), score_value(m.away_score))
    } else {
        "VS".to_string()
    };
    let when = m
        .kickoff_at
        .map(|k| k.format("%d.%m - %H:%M").to_string())
        .unwrap_or_else(|| "Дата не встановлена".to_string());

    let mut html = format!(r#"<div class="match-card {}"><div class="match-header">"#, mode);
    if !m.league.trim().is_empty() {
        html.push_str(&format!(
            r#"<span class="match-league">{} {}</span>"#,
            league_emoji(&m.league),
            escape_html(&m.league)
        ));
    }
    html.push_str(&format!(r#"<div class="match-info"><span class="match-date">{}</span>"#, when));
    if let Some(day) = m.matchday {
        html.push_str(&format!(r#"<span class="match-badge">Тур {}</span>"#, day));
    }
    html.push_str(&format!(
        concat!(
            r#"</div></div><div class="match-content">"#,
            r#"<div class="team team-home">{}<span class="team-name">{}</span></div>"#,
            r#"<div class="match-score">{}</div>"#,
            r#"<div class="team team-away"><span class="team-name">{}</span>{}</div>"#,
            r#"</div></div>"#
        ),
        crest(m.home_crest.as_deref(), &m.home_team),
        escape_html(&m.home_team),
        score,
        escape_html(&m.away_team),
        crest(m.away_crest.as_deref(), &m.away_team),
    ));
    html
}

/// Whole panel: title, then the cards, an empty notice or the error notice.
pub fn render_panel(panel: &MatchPanel, show_scores: bool) -> String {
    let mut html = format!(
        r#"<div class="matches-section-header"><h3>{}</h3>"#,
        panel_title(panel.mode, &panel.league)
    );
    if panel.mode == MatchMode::Past {
        html.push_str(&format!(
            concat!(
                r#"<label class="score-toggle-label">"#,
                r#"<input type="checkbox" class="show-scores"{}> "#,
                r#"<span>Показувати рахунок</span></label>"#
            ),
            if show_scores { " checked" } else { "" }
        ));
    }
    html.push_str("</div>");

    if let Some(error) = &panel.error {
        html.push_str(&format!(
            r#"<div class="empty-content"><p>❌ Помилка завантаження матчів: {}</p></div>"#,
            escape_html(error)
        ));
    } else if panel.matches.is_empty() {
        html.push_str(&format!(
            r#"<div class="empty-content"><p>{}</p></div>"#,
            empty_message(panel.mode)
        ));
    } else {
        html.push_str(r#"<div class="matches-list">"#);
        for m in &panel.matches {
            html.push_str(&match_card(m, panel.mode, show_scores));
        }
        html.push_str("</div>");
    }
    html
}
