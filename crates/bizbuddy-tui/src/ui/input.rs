//! Keyboard input handling for the TUI.
//!
//! Translates keyboard events into application state changes, dispatching
//! on the current mode (chat, login overlay, registration overlay).

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_email_char, can_add_password_char, can_add_question_char, can_add_username_char,
    App, AppState, LoginFocus, RegisterFocus,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => handle_login_input(app, key).await,
        AppState::Registering => handle_register_input(app, key).await,
        AppState::ConfirmingQuit => handle_quit_input(app, key),
        AppState::Normal => handle_chat_input(app, key).await,
        AppState::Quitting => Ok(true),
    }
}

async fn handle_chat_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Enter => {
            app.status_message = None;
            app.submit_question().await;
        }
        KeyCode::Tab => {
            app.field = app.field.next();
        }
        KeyCode::BackTab => {
            app.field = app.field.prev();
        }
        KeyCode::F(2) => {
            if !app.session.is_logged_in() {
                app.start_login();
            }
        }
        KeyCode::F(3) => {
            if !app.session.is_logged_in() {
                app.start_register();
            }
        }
        KeyCode::F(4) => {
            if app.session.is_logged_in() {
                app.logout().await;
            }
        }
        KeyCode::F(5) => {
            app.clear_transcript();
        }
        KeyCode::Backspace => {
            app.question_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_question_char(&app.question_input) {
                app.question_input.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.login_password.clear();
            app.login_error = None;
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Email,
            };
        }
        KeyCode::F(3) => {
            app.start_register();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password => app.attempt_login().await,
        },
        KeyCode::Backspace => {
            match app.login_focus {
                LoginFocus::Email => app.login_email.pop(),
                LoginFocus::Password => app.login_password.pop(),
            };
        }
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(&app.login_email) && !c.is_whitespace() {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(&app.login_password) {
                    app.login_password.push(c);
                }
            }
        },
        _ => {}
    }
    Ok(false)
}

async fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.register_password.clear();
            app.register_error = None;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.register_focus = app.register_focus.next();
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.register_focus = app.register_focus.prev();
        }
        KeyCode::Enter => match app.register_focus {
            RegisterFocus::Password => app.attempt_register().await,
            other => app.register_focus = other.next(),
        },
        KeyCode::Backspace => {
            match app.register_focus {
                RegisterFocus::Username => app.register_username.pop(),
                RegisterFocus::Email => app.register_email.pop(),
                RegisterFocus::Password => app.register_password.pop(),
            };
        }
        KeyCode::Char(c) => match app.register_focus {
            RegisterFocus::Username => {
                if can_add_username_char(&app.register_username) && !c.is_whitespace() {
                    app.register_username.push(c);
                }
            }
            RegisterFocus::Email => {
                if can_add_email_char(&app.register_email) && !c.is_whitespace() {
                    app.register_email.push(c);
                }
            }
            RegisterFocus::Password => {
                if can_add_password_char(&app.register_password) {
                    app.register_password.push(c);
                }
            }
        },
        _ => {}
    }
    Ok(false)
}

fn handle_quit_input(app: &mut App, key: KeyEvent) -> Result<bool> {
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
    Ok(false)
}
