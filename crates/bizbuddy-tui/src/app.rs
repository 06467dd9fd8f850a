//! Application state management for the BizBuddy TUI.
//!
//! This module contains the core `App` struct that holds the chat
//! transcript, the login/registration form state, and the session
//! controller, plus the background task coordination for in-flight
//! questions.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use bizbuddy_core::{
    AdviceField, ApiClient, ChatAnswer, ChatMessage, Config, HistoryStore, KeyringTokenStore,
    SessionController, SessionState,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for email input.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for username input.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for a question.
pub const MAX_QUESTION_LENGTH: usize = 500;

/// Minimum password length accepted by the sign-up form.
const MIN_SIGNUP_PASSWORD_LENGTH: usize = 6;

/// Opening message shown on a fresh transcript.
const GREETING: &str = "Hello! I'm BizBuddy. Select a field and ask your business question.";

/// Bot message when the ask call fails outright.
const SERVER_ERROR_FALLBACK: &str = "Server error. Please try again later.";

/// Bot message when the backend returns an empty answer.
const NO_ANSWER_FALLBACK: &str = "I'm sorry, I couldn't find a suitable answer.";

/// Login form message; the session core reports only pass/fail, so the
/// wording lives here with the rest of the presentation.
const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

// ============================================================================
// UI State Types
// ============================================================================

/// Top-level application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    Registering,
    ConfirmingQuit,
    Quitting,
}

/// Focused field in the login overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
}

/// Focused field in the registration overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFocus {
    Username,
    Email,
    Password,
}

impl RegisterFocus {
    pub fn next(&self) -> Self {
        match self {
            RegisterFocus::Username => RegisterFocus::Email,
            RegisterFocus::Email => RegisterFocus::Password,
            RegisterFocus::Password => RegisterFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            RegisterFocus::Username => RegisterFocus::Password,
            RegisterFocus::Email => RegisterFocus::Username,
            RegisterFocus::Password => RegisterFocus::Email,
        }
    }
}

/// Result of a background ask task
enum AskResult {
    Answer(ChatAnswer),
    Failed,
}

// ============================================================================
// Input helpers
// ============================================================================

pub fn can_add_email_char(current: &str) -> bool {
    current.len() < MAX_EMAIL_LENGTH
}

pub fn can_add_username_char(current: &str) -> bool {
    current.len() < MAX_USERNAME_LENGTH
}

pub fn can_add_password_char(current: &str) -> bool {
    current.len() < MAX_PASSWORD_LENGTH
}

pub fn can_add_question_char(current: &str) -> bool {
    current.len() < MAX_QUESTION_LENGTH
}

/// Shape check matching the sign-in form: something before the `@`, a dot
/// somewhere inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

// ============================================================================
// App
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Arc<SessionController>,
    pub api: ApiClient,
    pub history: HistoryStore,

    // UI state
    pub state: AppState,
    pub field: AdviceField,
    pub question_input: String,
    pub messages: Vec<ChatMessage>,
    pub asking: bool,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Registration form state
    pub register_username: String,
    pub register_email: String,
    pub register_password: String,
    pub register_focus: RegisterFocus,
    pub register_error: Option<String>,

    // Session state mirror for rendering
    session_rx: watch::Receiver<SessionState>,

    // Background task channel
    ask_rx: mpsc::Receiver<AskResult>,
    ask_tx: mpsc::Sender<AskResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.resolved_api_base_url();
        debug!(base_url = %base_url, "Backend configured");

        let api = ApiClient::new(base_url.as_str())?;
        let session = Arc::new(SessionController::new(
            Arc::new(KeyringTokenStore),
            Arc::new(api.clone()),
        ));
        let session_rx = session.subscribe();

        let cache_dir = config.cache_dir()?;
        let history = HistoryStore::new(cache_dir)?;
        let mut messages = match history.load() {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Failed to load transcript history");
                Vec::new()
            }
        };
        if messages.is_empty() {
            messages.push(ChatMessage::bot(GREETING));
        }

        let login_email = config.last_email.clone().unwrap_or_default();

        let (ask_tx, ask_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            session,
            api,
            history,

            state: AppState::Normal,
            field: AdviceField::Marketing,
            question_input: String::new(),
            messages,
            asking: false,

            login_email,
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            login_error: None,

            register_username: String::new(),
            register_email: String::new(),
            register_password: String::new(),
            register_focus: RegisterFocus::Username,
            register_error: None,

            session_rx,

            ask_rx,
            ask_tx,

            status_message: None,
        })
    }

    /// Latest published session snapshot, for rendering.
    pub fn session_state(&self) -> SessionState {
        self.session_rx.borrow().clone()
    }

    // =========================================================================
    // Login / registration
    // =========================================================================

    /// Show the login overlay
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Show the registration overlay
    pub fn start_register(&mut self) {
        self.state = AppState::Registering;
        self.register_focus = RegisterFocus::Username;
        self.register_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        if email.is_empty() {
            self.login_error = Some("Email is required".to_string());
            return;
        }
        if !is_valid_email(&email) {
            self.login_error = Some("Please enter a valid email".to_string());
            return;
        }
        if password.is_empty() {
            self.login_error = Some("Password is required".to_string());
            return;
        }

        self.login_error = None;

        if self.session.login(&email, &password).await {
            self.config.last_email = Some(email);
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }

            self.login_password.clear();
            self.state = AppState::Normal;
            self.status_message = self
                .session_state()
                .identity
                .map(|identity| format!("Signed in as {}", identity.username));
        } else {
            self.login_error = Some(INVALID_CREDENTIALS.to_string());
        }
    }

    /// Attempt registration with the sign-up form, then sign in
    pub async fn attempt_register(&mut self) {
        let username = self.register_username.trim().to_string();
        let email = self.register_email.trim().to_string();
        let password = self.register_password.clone();

        if username.is_empty() {
            self.register_error = Some("Username is required".to_string());
            return;
        }
        if email.is_empty() {
            self.register_error = Some("Email is required".to_string());
            return;
        }
        if !is_valid_email(&email) {
            self.register_error = Some("Please enter a valid email".to_string());
            return;
        }
        if password.len() < MIN_SIGNUP_PASSWORD_LENGTH {
            self.register_error = Some(format!(
                "Password must be at least {} characters",
                MIN_SIGNUP_PASSWORD_LENGTH
            ));
            return;
        }

        self.register_error = None;

        let outcome = self.session.register(&username, &email, &password).await;
        if outcome.success {
            self.config.last_email = Some(email);
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }

            self.register_password.clear();
            self.state = AppState::Normal;
            self.status_message = self
                .session_state()
                .identity
                .map(|identity| format!("Welcome, {}!", identity.username));
        } else {
            self.register_error = Some(outcome.error.unwrap_or_else(|| {
                // Account created but the follow-up sign-in failed
                "Account created, but sign-in failed. Please log in.".to_string()
            }));
        }
    }

    /// Sign out and keep the transcript
    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.status_message = Some("Signed out".to_string());
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Send the typed question to the backend in the background
    pub async fn submit_question(&mut self) {
        let question = self.question_input.trim().to_string();
        if question.is_empty() || self.asking {
            return;
        }

        self.question_input.clear();
        self.messages.push(ChatMessage::user(question.clone()));
        self.save_history();
        self.asking = true;

        let api = self.api.clone();
        let tx = self.ask_tx.clone();
        let field = self.field;
        let token = self.session.token().await;

        tokio::spawn(async move {
            let result = match api.ask(token.as_deref(), field, &question).await {
                Ok(answer) => AskResult::Answer(answer),
                Err(e) => {
                    warn!(error = %e, "Ask request failed");
                    AskResult::Failed
                }
            };
            let _ = tx.send(result).await;
        });
    }

    /// Drain completed background tasks into the transcript
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.ask_rx.try_recv() {
            self.asking = false;

            let text = match result {
                AskResult::Answer(answer) if !answer.answer.trim().is_empty() => answer.answer,
                AskResult::Answer(_) => NO_ANSWER_FALLBACK.to_string(),
                AskResult::Failed => SERVER_ERROR_FALLBACK.to_string(),
            };

            self.messages.push(ChatMessage::bot(text));
            self.save_history();
        }
    }

    /// Clear the transcript on screen and on disk
    pub fn clear_transcript(&mut self) {
        self.messages.clear();
        self.messages.push(ChatMessage::bot(GREETING));
        if let Err(e) = self.history.clear() {
            warn!(error = %e, "Failed to clear transcript history");
        }
        self.status_message = Some("Transcript cleared".to_string());
    }

    fn save_history(&self) {
        if let Err(e) = self.history.save(&self.messages) {
            warn!(error = %e, "Failed to save transcript history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("ana"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("ana@nodot"));
        assert!(!is_valid_email("ana@.com"));
        assert!(!is_valid_email("ana@x.com."));
        assert!(!is_valid_email("ana@x@y.com"));
    }

    #[test]
    fn test_input_caps() {
        assert!(can_add_question_char(&"q".repeat(MAX_QUESTION_LENGTH - 1)));
        assert!(!can_add_question_char(&"q".repeat(MAX_QUESTION_LENGTH)));
        assert!(!can_add_password_char(&"p".repeat(MAX_PASSWORD_LENGTH)));
        assert!(!can_add_email_char(&"e".repeat(MAX_EMAIL_LENGTH)));
        assert!(!can_add_username_char(&"u".repeat(MAX_USERNAME_LENGTH)));
    }

    #[test]
    fn test_register_focus_cycles() {
        assert_eq!(RegisterFocus::Username.next(), RegisterFocus::Email);
        assert_eq!(RegisterFocus::Password.next(), RegisterFocus::Username);
        for focus in [
            RegisterFocus::Username,
            RegisterFocus::Email,
            RegisterFocus::Password,
        ] {
            assert_eq!(focus.next().prev(), focus);
        }
    }
}
