use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use bizbuddy_core::{AdviceField, Sender};

use crate::app::{App, AppState, LoginFocus, RegisterFocus};
use crate::utils::{format_clock, truncate, wrap_text};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Length(1), // Field tabs
            Constraint::Min(5),    // Transcript
            Constraint::Length(3), // Question input
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_field_tabs(frame, app, chunks[1]);
    render_transcript(frame, app, chunks[2]);
    render_question_input(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    // Render overlays
    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if matches!(app.state, AppState::Registering) {
        render_register_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  BizBuddy";

    let session = app.session_state();
    let (status, status_style) = if session.is_loading {
        ("Checking session...".to_string(), styles::muted_style())
    } else if let Some(identity) = session.identity {
        (
            format!("{} <{}>", truncate(&identity.username, 24), identity.email),
            styles::success_style(),
        )
    } else {
        ("Not signed in".to_string(), styles::muted_style())
    };

    let padding = area
        .width
        .saturating_sub(title.len() as u16 + status.len() as u16 + 4) as usize;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(status, status_style),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_field_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw("  ")];
    for field in AdviceField::ALL {
        spans.push(Span::styled(
            format!(" {} ", field.title()),
            styles::tab_style(field == app.field),
        ));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::muted_style())
        .title(" Conversation ");

    let inner = block.inner(area);
    let width = inner.width.max(10) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for message in &app.messages {
        let (name, style) = match message.sender {
            Sender::User => ("You", styles::user_style()),
            Sender::Bot => ("BizBuddy", styles::bot_style()),
        };

        lines.push(Line::from(vec![
            Span::styled(format_clock(&message.timestamp), styles::muted_style()),
            Span::raw(" "),
            Span::styled(name, style),
        ]));
        for wrapped in wrap_text(&message.message, width.saturating_sub(2)) {
            lines.push(Line::from(format!("  {}", wrapped)));
        }
        lines.push(Line::default());
    }

    if app.asking {
        lines.push(Line::styled("BizBuddy is thinking...", styles::muted_style()));
    }

    // Follow the bottom of the conversation
    let offset = lines.len().saturating_sub(inner.height as usize) as u16;

    frame.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);
}

fn render_question_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.state, AppState::Normal);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .title(format!(" Ask about {} ", app.field.title()));

    let inner = block.inner(area);
    // Keep the tail of long questions in view
    let visible_from = app
        .question_input
        .chars()
        .count()
        .saturating_sub(inner.width.saturating_sub(1) as usize);
    let visible: String = app.question_input.chars().skip(visible_from).collect();

    frame.render_widget(Paragraph::new(visible.clone()).block(block), area);

    if focused {
        frame.set_cursor_position((
            inner.x + visible.chars().count() as u16,
            inner.y,
        ));
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let hints = if app.session_state().is_logged_in() {
        "[Enter] ask  [Tab] field  [F4] sign out  [F5] clear  [Esc] quit"
    } else {
        "[Enter] ask  [Tab] field  [F2] sign in  [F3] sign up  [F5] clear  [Esc] quit"
    };

    let mut lines = vec![Line::styled(hints, styles::muted_style())];
    if let Some(ref status) = app.status_message {
        lines.push(Line::styled(status.clone(), styles::success_style()));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

// ============================================================================
// Overlays
// ============================================================================

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 12, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Sign in ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1), // Error
            Constraint::Min(1),    // Hints
        ])
        .split(inner);

    render_form_field(
        frame,
        chunks[0],
        "Email",
        &app.login_email,
        matches!(app.login_focus, LoginFocus::Email),
        false,
    );
    render_form_field(
        frame,
        chunks[1],
        "Password",
        &app.login_password,
        matches!(app.login_focus, LoginFocus::Password),
        true,
    );

    if let Some(ref error) = app.login_error {
        frame.render_widget(
            Paragraph::new(Line::styled(format!(" {}", error), styles::error_style())),
            chunks[2],
        );
    }

    frame.render_widget(
        Paragraph::new(Line::styled(
            " [Tab] switch  [Enter] submit  [F3] sign up  [Esc] cancel",
            styles::muted_style(),
        )),
        chunks[3],
    );
}

fn render_register_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 15, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Create account ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1), // Error
            Constraint::Min(1),    // Hints
        ])
        .split(inner);

    render_form_field(
        frame,
        chunks[0],
        "Username",
        &app.register_username,
        matches!(app.register_focus, RegisterFocus::Username),
        false,
    );
    render_form_field(
        frame,
        chunks[1],
        "Email",
        &app.register_email,
        matches!(app.register_focus, RegisterFocus::Email),
        false,
    );
    render_form_field(
        frame,
        chunks[2],
        "Password",
        &app.register_password,
        matches!(app.register_focus, RegisterFocus::Password),
        true,
    );

    if let Some(ref error) = app.register_error {
        frame.render_widget(
            Paragraph::new(Line::styled(format!(" {}", error), styles::error_style())),
            chunks[3],
        );
    }

    frame.render_widget(
        Paragraph::new(Line::styled(
            " [Tab] switch  [Enter] submit  [Esc] cancel",
            styles::muted_style(),
        )),
        chunks[4],
    );
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect(34, 5, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Quit ");

    frame.render_widget(
        Paragraph::new(Line::from(" Leave BizBuddy? [y/n]")).block(block),
        area,
    );
}

fn render_form_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    focused: bool,
    masked: bool,
) {
    let display = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .title(format!(" {} ", label));

    frame.render_widget(Paragraph::new(display).block(block), area);
}

/// Center a fixed-size popup inside the terminal area
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
