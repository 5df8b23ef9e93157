use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::state::{App, LoginField};

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    if app.authed {
        draw_listing_screen(f, app);
    } else {
        draw_login_screen(f, app);
    }
}

fn draw_login_screen<B: Backend>(f: &mut Frame<B>, app: &App) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(vec![
            Constraint::Percentage(25), // top padding
            Constraint::Length(3),      // title
            Constraint::Length(3),      // username field
            Constraint::Length(3),      // password field
            Constraint::Length(2),      // error line
            Constraint::Length(2),      // help
            Constraint::Min(0),
        ])
        .split(size);

    let title = Paragraph::new("🔐 Login")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    draw_login_field(
        f,
        chunks[2],
        "Username",
        &app.login_username,
        app.login_field == LoginField::Username,
    );
    let masked = "*".repeat(app.login_password.chars().count());
    draw_login_field(
        f,
        chunks[3],
        "Password",
        &masked,
        app.login_field == LoginField::Password,
    );

    if let Some(error) = &app.login_error {
        let error = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        f.render_widget(error, chunks[4]);
    }

    let help = Paragraph::new("Tab: switch field | Enter: submit | Esc: quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[5]);
}

fn draw_login_field<B: Backend>(f: &mut Frame<B>, area: Rect, label: &str, value: &str, active: bool) {
    let border_style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let field = Paragraph::new(value)
        .block(Block::default().borders(Borders::ALL).title(label).border_style(border_style));
    f.render_widget(field, area);
}

fn draw_listing_screen<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(vec![
            Constraint::Length(3), // header
            Constraint::Min(8),    // listing table
            Constraint::Length(5), // selected item detail
            Constraint::Length(3), // help
        ])
        .split(size);

    draw_header(f, app, chunks[0]);

    if let Some(error) = &app.last_error {
        let message = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("Error"))
            .wrap(Wrap { trim: true });
        f.render_widget(message, chunks[1]);
    } else if app.records.is_empty() {
        let message = Paragraph::new(
            "No videos to display. Try another region ('g') or refresh ('r') in a moment.",
        )
        .block(Block::default().borders(Borders::ALL).title("Trending"))
        .wrap(Wrap { trim: true });
        f.render_widget(message, chunks[1]);
    } else {
        draw_listing_table(f, app, chunks[1]);
    }

    draw_detail(f, app, chunks[2]);
    draw_help(f, chunks[3]);
}

fn draw_header<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let updated = app
        .last_update
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let mut spans = vec![
        Span::styled(
            "📺 YouTube Trending",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {} ({}) | {} results | updated {}",
            app.region_name(),
            app.region,
            app.records.len(),
            updated
        )),
    ];
    if app.open_mode {
        spans.push(Span::styled(
            "  [open mode: credentials unset]",
            Style::default().fg(Color::Yellow),
        ));
    }
    let header = Paragraph::new(Spans::from(spans))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_listing_table<B: Backend>(f: &mut Frame<B>, app: &mut App, area: Rect) {
    let header = Row::new(vec![
        "#",
        "Title",
        "Channel",
        "Subscribers",
        "Views",
        "Likes",
        "Comments",
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            Row::new(vec![
                format!("{}", i + 1),
                record.title.clone(),
                record.channel_title.clone(),
                record.subscribers.clone(),
                record.views.clone(),
                record.likes.clone(),
                record.comments.clone(),
            ])
        })
        .collect();

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Trending"))
        .widths(&[
            Constraint::Length(3),
            Constraint::Percentage(36),
            Constraint::Percentage(18),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ])
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_detail<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let lines = match app.selected_record() {
        Some(record) => vec![
            Spans::from(vec![
                Span::styled("Channel: ", Style::default().fg(Color::Cyan)),
                Span::raw(format!("{} ({})", record.channel_title, record.channel_id)),
            ]),
            Spans::from(vec![
                Span::styled("Link: ", Style::default().fg(Color::Cyan)),
                Span::raw(record.permalink.clone()),
            ]),
            Spans::from(vec![
                Span::styled("Thumbnail: ", Style::default().fg(Color::Cyan)),
                Span::raw(
                    record
                        .thumbnail_url
                        .clone()
                        .unwrap_or_else(|| "(none)".to_string()),
                ),
            ]),
        ],
        None => vec![Spans::from(Span::raw(""))],
    };
    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Selected"))
        .wrap(Wrap { trim: true });
    f.render_widget(detail, area);
}

fn draw_help<B: Backend>(f: &mut Frame<B>, area: Rect) {
    let help = Paragraph::new(
        "q: quit | j/k: move | r: refresh | g: region | +/-: count | o: logout",
    )
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, area);
}
