use chrono::{DateTime, Local};
use tui::widgets::TableState;

use crate::models::config::{AuthMode, Config};
use crate::models::display::DisplayRecord;
use crate::services::api::{ApiError, Pipeline};
use crate::services::logger::{log_error, log_warn};

/// Region presets cycled with the region key; a configured region outside
/// this list still works, cycling just re-enters the list from the top.
pub const REGION_PRESETS: [(&str, &str); 12] = [
    ("KR", "South Korea"),
    ("US", "United States"),
    ("JP", "Japan"),
    ("GB", "United Kingdom"),
    ("DE", "Germany"),
    ("FR", "France"),
    ("IN", "India"),
    ("ID", "Indonesia"),
    ("VN", "Vietnam"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("AU", "Australia"),
];

pub const MIN_RESULTS: u8 = 5;
pub const MAX_RESULTS: u8 = 50;
const RESULTS_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginField {
    Username,
    Password,
}

pub struct App {
    pub config: Config,
    pub pipeline: Pipeline,
    pub authed: bool,
    pub login_field: LoginField,
    pub login_username: String,
    pub login_password: String,
    pub login_error: Option<String>,
    /// Set when the gate is bypassed because credentials are unset
    pub open_mode: bool,
    pub records: Vec<DisplayRecord>,
    pub table_state: TableState,
    pub region: String,
    pub max_results: u8,
    pub last_update: Option<DateTime<Local>>,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(config: Config, pipeline: Pipeline) -> App {
        let open_mode = config.auth == AuthMode::Open;
        if open_mode {
            let _ = log_warn(
                "Auth",
                "AUTH_USERNAME/AUTH_PASSWORD unset, gate disabled (open mode)",
            );
        }
        App {
            authed: open_mode,
            open_mode,
            login_field: LoginField::Username,
            login_username: String::new(),
            login_password: String::new(),
            login_error: None,
            records: Vec::new(),
            table_state: TableState::default(),
            region: config.region.clone(),
            max_results: config.max_results.clamp(MIN_RESULTS, MAX_RESULTS),
            last_update: None,
            last_error: None,
            config,
            pipeline,
        }
    }

    /// Checks the typed credentials against the configured pair. On failure
    /// the password is cleared and the form re-prompts with an error.
    pub fn submit_login(&mut self) -> bool {
        match &self.config.auth {
            AuthMode::Open => {
                self.authed = true;
                true
            }
            AuthMode::Gated { username, password } => {
                if self.login_username == *username && self.login_password == *password {
                    self.authed = true;
                    self.login_error = None;
                    self.login_password.clear();
                    true
                } else {
                    self.login_error = Some("Invalid username or password".to_string());
                    self.login_password.clear();
                    self.login_field = LoginField::Username;
                    false
                }
            }
        }
    }

    /// Drops the session and clears both response caches, so the next login
    /// starts from a genuine upstream fetch. No-op gate in open mode.
    pub fn logout(&mut self) {
        self.pipeline.clear_cache();
        self.records.clear();
        self.table_state = TableState::default();
        self.last_update = None;
        self.last_error = None;
        self.login_username.clear();
        self.login_password.clear();
        self.login_field = LoginField::Username;
        self.authed = self.open_mode;
    }

    pub fn toggle_login_field(&mut self) {
        self.login_field = match self.login_field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub async fn load(&mut self) {
        match self
            .pipeline
            .get_display_records(&self.config.api_key, &self.region, self.max_results)
            .await
        {
            Ok(records) => {
                self.table_state.select(if records.is_empty() {
                    None
                } else {
                    Some(0)
                });
                self.records = records;
                self.last_update = Some(Local::now());
                self.last_error = None;
            }
            Err(e) => {
                let _ = log_error("Fetch", &e.to_string());
                self.last_error = Some(user_message(&e));
            }
        }
    }

    /// Manual refresh: cache cleared first so the fetch hits upstream.
    pub async fn refresh(&mut self) {
        self.pipeline.clear_cache();
        self.load().await;
    }

    pub fn next_region(&mut self) {
        let idx = REGION_PRESETS
            .iter()
            .position(|(code, _)| *code == self.region);
        let next = match idx {
            Some(i) => (i + 1) % REGION_PRESETS.len(),
            None => 0,
        };
        self.region = REGION_PRESETS[next].0.to_string();
    }

    pub fn region_name(&self) -> &str {
        REGION_PRESETS
            .iter()
            .find(|(code, _)| *code == self.region)
            .map(|(_, name)| *name)
            .unwrap_or("Custom")
    }

    pub fn increase_results(&mut self) {
        self.max_results = (self.max_results + RESULTS_STEP).min(MAX_RESULTS);
    }

    pub fn decrease_results(&mut self) {
        self.max_results = self.max_results.saturating_sub(RESULTS_STEP).max(MIN_RESULTS);
    }

    pub fn next(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= self.records.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.records.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_record(&self) -> Option<&DisplayRecord> {
        self.table_state.selected().and_then(|i| self.records.get(i))
    }
}

fn user_message(e: &ApiError) -> String {
    match e {
        ApiError::Timeout => {
            "Request timed out. Check your network and press 'r' to try again.".to_string()
        }
        other => other.to_string(),
    }
}
