//! Application state and logic.
//!
//! Ties the task client, the UI and terminal events together. The loop
//! redraws whenever a key is pressed, the terminal ticks or the tracked task
//! changes. Nothing in the loop waits on the service: submissions resolve in
//! the background and show up as task changes.

use std::sync::Arc;

use chrono::Utc;
use color_eyre::Result;
use crossterm::event::KeyEvent;
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::client::TaskClient;
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::event::{Event, EventHandler};
use crate::monitor::HttpAnalysisService;
use crate::state::Task;
use crate::ui::{Ui, UpdateKind, ViewContext};

/// Main application.
pub struct App {
    config: AppConfig,
    client: TaskClient,
    ui: Ui,
    /// Should the application exit?
    should_quit: bool,
}

impl App {
    /// Creates an application talking HTTP to `config.base_url`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let service = HttpAnalysisService::from_config(&config)?;
        let client = TaskClient::from_config(Arc::new(service), &config);
        Ok(Self::with_client(config, client))
    }

    /// Creates an application around an existing client.
    pub fn with_client(config: AppConfig, client: TaskClient) -> Self {
        Self {
            config,
            client,
            ui: Ui::new(),
            should_quit: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &TaskClient {
        &self.client
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Submits `url` as if typed at the prompt.
    pub fn submit(&mut self, url: &str) {
        self.apply(UpdateKind::Submit(url.to_string()));
    }

    /// Runs the application main loop.
    pub async fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut EventHandler,
    ) -> Result<()> {
        let mut updates = self.client.subscribe();

        while !self.should_quit {
            self.draw(terminal, &updates)?;

            tokio::select! {
                event = events.next() => match event {
                    Some(event) => self.handle_event(event),
                    None => self.should_quit = true,
                },
                changed = updates.changed() => {
                    if changed.is_err() {
                        self.should_quit = true;
                    }
                }
            }
        }

        Ok(())
    }

    /// Runs the application main loop with Crossterm backend.
    pub async fn run_with_crossterm(&mut self) -> Result<()> {
        use ratatui::backend::CrosstermBackend;

        let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        let mut events = EventHandler::new(self.config.tick_rate());

        self.run(&mut terminal, &mut events).await
    }

    fn draw<B: Backend>(
        &self,
        terminal: &mut Terminal<B>,
        updates: &watch::Receiver<Task>,
    ) -> Result<()> {
        let task = updates.borrow().clone();
        let ctx = ViewContext {
            task: &task,
            base_url: &self.config.base_url,
            poll_failures: self.client.consecutive_poll_failures(),
            now: Utc::now(),
        };
        terminal.draw(|frame| self.ui.render(frame, &ctx))?;
        Ok(())
    }

    /// Handles input and other events.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            // Redrawn on the next loop iteration.
            Event::Tick | Event::Resize(..) => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        let task = self.client.state();
        let update = self.ui.handle_key_event(key, &task);
        self.apply(update);
    }

    fn apply(&mut self, update: UpdateKind) {
        match update {
            UpdateKind::Submit(url) => match self.client.begin_submit(&url) {
                Ok(()) => {}
                Err(ClientError::EmptyUrl) => warn!("ignoring empty URL"),
            },
            UpdateKind::Reset => self.client.reset(),
            UpdateKind::Quit => {
                info!("quit requested");
                self.should_quit = true;
            }
            UpdateKind::ToggleHelp => self.ui.toggle_help(),
            UpdateKind::Other => {}
        }
    }
}
