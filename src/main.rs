use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;
use tui::{backend::CrosstermBackend, Terminal};

mod app;
mod models;
mod services;
mod utils;

use app::state::{App, LoginField};
use app::ui;
use models::config::Config;
use services::api::Pipeline;
use services::logger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration; a missing API key halts before any UI comes up
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            let _ = logger::log_error("Config", &e.to_string());
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run it
    let app = App::new(config, Pipeline::with_http());
    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        logger::log_error("Application Error", &format!("{:?}", err))?;
        println!("{:?}", err)
    }

    Ok(())
}

async fn run_app<B: tui::backend::Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    // Open mode starts authenticated, so fetch right away
    if app.authed {
        app.load().await;
    }

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        if app.authed {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char('r') => app.refresh().await,
                KeyCode::Char('g') => {
                    app.next_region();
                    app.load().await;
                }
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    app.increase_results();
                    app.load().await;
                }
                KeyCode::Char('-') => {
                    app.decrease_results();
                    app.load().await;
                }
                KeyCode::Char('o') => app.logout(),
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.toggle_login_field(),
                KeyCode::Enter => match app.login_field {
                    // Enter on the username field just moves focus down
                    LoginField::Username => app.login_field = LoginField::Password,
                    LoginField::Password => {
                        if app.submit_login() {
                            app.load().await;
                        }
                    }
                },
                KeyCode::Char(c) => match app.login_field {
                    LoginField::Username => app.login_username.push(c),
                    LoginField::Password => app.login_password.push(c),
                },
                KeyCode::Backspace => match app.login_field {
                    LoginField::Username => {
                        app.login_username.pop();
                    }
                    LoginField::Password => {
                        app.login_password.pop();
                    }
                },
                _ => {}
            }
        }
    }
}
