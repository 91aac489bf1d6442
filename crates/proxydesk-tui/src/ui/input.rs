//! Keyboard input handling for the TUI.
//!
//! Translates key events into application actions for whichever surface
//! is showing.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use proxydesk_core::guard::View;
use proxydesk_core::Confirmation;

use crate::app::{can_add_password_char, can_add_username_char, AdminFocus, App, AppState};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle delete confirmation
    if matches!(app.state, AppState::ConfirmingDelete) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.answer_delete(Confirmation::Accepted).await;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.answer_delete(Confirmation::Declined).await;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.view() {
        View::Placeholder => {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            Ok(false)
        }
        View::Login => handle_login_input(app, key).await,
        View::Admin => {
            if app.admin_focus.in_form() {
                handle_form_input(app, key).await;
            } else {
                handle_users_input(app, key).await;
            }
            Ok(false)
        }
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    use crate::app::LoginFocus;

    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // On success the guard switches to the admin surface
                app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.len(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

async fn handle_users_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Tab => app.admin_focus = app.admin_focus.next(),
        KeyCode::BackTab => app.admin_focus = app.admin_focus.prev(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Home => app.user_selection = 0,
        KeyCode::End => app.user_selection = app.user_count().saturating_sub(1),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('s') => app.refresh_status(),
        KeyCode::Char('r') => app.refresh_users().await,
        KeyCode::Char('L') => app.logout().await,
        _ => {}
    }
}

/// Create-user form. Letters go into the fields, so actions here are on
/// non-character keys only.
async fn handle_form_input(app: &mut App, key: KeyEvent) {
    let focus = app.admin_focus;
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.admin_focus = focus.next();
            return;
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.admin_focus = focus.prev();
            return;
        }
        KeyCode::Esc => {
            app.admin_focus = AdminFocus::Users;
            return;
        }
        KeyCode::Enter => {
            app.submit_new_user().await;
            return;
        }
        _ => {}
    }

    let Some(admin) = app.admin.as_mut() else {
        return;
    };
    let form = &mut admin.resources.form;
    match key.code {
        KeyCode::Backspace => match focus {
            AdminFocus::NewUsername => {
                form.username.pop();
            }
            AdminFocus::NewPassword => {
                form.password.pop();
            }
            AdminFocus::Users => {}
        },
        KeyCode::Char(c) => match focus {
            AdminFocus::NewUsername => {
                if can_add_username_char(form.username.len(), c) {
                    form.username.push(c);
                }
            }
            AdminFocus::NewPassword => {
                if can_add_password_char(form.password.len(), c) {
                    form.password.push(c);
                }
            }
            AdminFocus::Users => {}
        },
        _ => {}
    }
}
