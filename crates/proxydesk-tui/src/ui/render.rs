use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use proxydesk_core::guard::View;
use proxydesk_core::notify::NotificationKind;
use proxydesk_core::utils::truncate_string;
use proxydesk_core::AdminSurface;

use crate::app::{AdminFocus, App, AppState, LoginFocus};

use super::styles;

const TITLE: &str = "  proxydesk";

pub fn render(frame: &mut Frame, app: &App) {
    match app.view() {
        View::Placeholder => render_placeholder(frame),
        View::Login => render_login(frame, app),
        View::Admin => {
            if let Some(admin) = app.admin.as_ref() {
                render_admin(frame, app, admin);
            } else {
                render_placeholder(frame);
            }
        }
    }

    // Render overlays
    if matches!(app.state, AppState::ConfirmingDelete) {
        render_delete_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_placeholder(frame: &mut Frame) {
    let area = centered_rect_fixed(30, 3, frame.area());
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "   Loading session...",
        styles::muted_style(),
    )));
    frame.render_widget(paragraph, area);
}

fn render_title_bar(frame: &mut Frame, area: Rect, right: &str) {
    let title_line = Line::from(vec![
        Span::styled(TITLE, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(TITLE.len() as u16 + right.len() as u16 + 2)
                as usize,
        )),
        Span::styled(right.to_string(), styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

// ============================================================================
// Login surface
// ============================================================================

fn render_login(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("          proxydesk admin", styles::title_style())),
        Line::from(""),
    ];

    lines.push(input_line(
        "Username",
        &app.login_username,
        app.login_focus == LoginFocus::Username,
        false,
    ));
    lines.push(input_line(
        "Password",
        &app.login_password,
        app.login_focus == LoginFocus::Password,
        true,
    ));

    lines.push(Line::from(""));
    lines.push(button_line("Login", app.login_focus == LoginFocus::Button));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn input_line(label: &str, value: &str, focused: bool, masked: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let shown = if masked {
        "*".repeat(value.chars().count().min(16))
    } else {
        value.chars().rev().take(16).collect::<Vec<_>>().into_iter().rev().collect()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("      "),
        Span::styled(format!("{:>8}: [", label), styles::muted_style()),
        Span::styled(format!("{:<16}{}", shown, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    if focused {
        Line::from(vec![
            Span::raw("            ["),
            Span::styled(format!(" ▶ {} ◀ ", label), styles::selected_style()),
            Span::raw("]"),
        ])
    } else {
        Line::from(vec![
            Span::raw("            ["),
            Span::styled(format!("   {}   ", label), styles::list_item_style()),
            Span::raw("]"),
        ])
    }
}

// ============================================================================
// Admin surface
// ============================================================================

fn render_admin(frame: &mut Frame, app: &App, admin: &AdminSurface) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(5), // Service status
            Constraint::Min(8),    // Users + form
            Constraint::Length(2), // Notifications
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let right = app
        .config
        .last_username
        .as_deref()
        .map(|u| format!("logged in as {}", u))
        .unwrap_or_default();
    render_title_bar(frame, chunks[0], &right);
    render_status_panel(frame, admin, chunks[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_users(frame, app, admin, columns[0]);
    render_create_form(frame, app, admin, columns[1]);

    render_notifications(frame, admin, chunks[3]);
    render_key_hints(frame, chunks[4]);
}

fn render_status_panel(frame: &mut Frame, admin: &AdminSurface, area: Rect) {
    let block = Block::default()
        .title(" Proxy Service ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let detail_width = area.width.saturating_sub(4) as usize;
    let lines = match admin.status() {
        Some(status) => vec![
            Line::from(vec![
                Span::styled(" ● ", styles::indicator_style(status.is_active)),
                Span::styled(status.indicator(), styles::indicator_style(status.is_active)),
                Span::styled("  status: ", styles::muted_style()),
                Span::styled(status.status_label.clone(), styles::list_item_style()),
                Span::styled(
                    format!("  (updated {})", status.age_display()),
                    styles::muted_style(),
                ),
            ]),
            Line::from(Span::styled(
                format!(" {}", truncate_string(&status.details, detail_width)),
                styles::muted_style(),
            )),
        ],
        None => vec![Line::from(Span::styled(
            " Waiting for status...",
            styles::muted_style(),
        ))],
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_users(frame: &mut Frame, app: &App, admin: &AdminSurface, area: Rect) {
    let users = admin.resources.users();
    let focused = app.admin_focus == AdminFocus::Users;

    let block = Block::default()
        .title(format!(" Proxy Users ({}) ", users.len()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if users.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            " No proxy users",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let name_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = users
        .iter()
        .map(|u| {
            let name = truncate_string(&u.username, name_width);
            ListItem::new(Line::from(format!(" {}", name)))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .style(styles::list_item_style())
        .highlight_style(if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        });

    let mut state = ListState::default().with_selected(Some(app.user_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_create_form(frame: &mut Frame, app: &App, admin: &AdminSurface, area: Rect) {
    let form = &admin.resources.form;
    let in_form = app.admin_focus.in_form();

    let mut lines = vec![
        Line::from(""),
        input_line(
            "Username",
            &form.username,
            app.admin_focus == AdminFocus::NewUsername,
            false,
        ),
        input_line(
            "Password",
            &form.password,
            app.admin_focus == AdminFocus::NewPassword,
            true,
        ),
        Line::from(""),
    ];

    match form.hint() {
        Some(hint) => lines.push(Line::from(Span::styled(
            format!(" {}", hint),
            styles::highlight_style(),
        ))),
        None => lines.push(Line::from(Span::styled(
            " [Enter] create user",
            styles::muted_style(),
        ))),
    }

    let block = Block::default()
        .title(" Create User ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(in_form));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_notifications(frame: &mut Frame, admin: &AdminSurface, area: Rect) {
    let lines: Vec<Line> = admin
        .notifications
        .iter()
        .map(|(kind, message)| {
            let style = match kind {
                NotificationKind::Error => styles::error_style(),
                NotificationKind::Success => styles::success_style(),
            };
            Line::from(Span::styled(format!(" {}", message), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_key_hints(frame: &mut Frame, area: Rect) {
    let hints = [
        ("Tab", "focus"),
        ("j/k", "select"),
        ("d", "delete"),
        ("s", "status"),
        ("r", "refresh"),
        ("L", "logout"),
        ("q", "quit"),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(format!("[{}]", key), styles::help_key_style()));
        spans.push(Span::styled(format!(" {}", desc), styles::muted_style()));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(styles::status_bar_style()),
        area,
    );
}

// ============================================================================
// Overlays
// ============================================================================

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(pending) = app.pending_delete.as_ref() else {
        return;
    };
    let area = centered_rect_fixed(56, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", pending.prompt()),
            styles::highlight_style(),
        )),
        Line::from(""),
        confirm_hint("delete"),
    ];

    let block = Block::default()
        .title(" Delete User ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        confirm_hint("quit"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn confirm_hint(action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(format!(" to {}, ", action), styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ])
}
