use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::ui::{ScreenResult, TerminalGuard, WizardScreen};
use crate::wizard::{
    CollectingSubmitter, FetchTicket, LoadError, OptionSet, PendingLoad, RemoteOptionsLoader,
    WizardAnswers, WizardDefinition, WizardSession,
};

/// A finished options fetch, sent back to the event loop
#[derive(Debug)]
pub struct LoadMessage {
    pub field: String,
    pub ticket: FetchTicket,
    pub result: Result<OptionSet, LoadError>,
}

pub struct App {
    config: Config,
    screen: WizardScreen,
    loader: RemoteOptionsLoader,
    tx: mpsc::UnboundedSender<LoadMessage>,
    rx: mpsc::UnboundedReceiver<LoadMessage>,
    should_quit: bool,
    /// Answers handed to the submitter, once the wizard is finished
    submitted: Option<WizardAnswers>,
}

impl App {
    pub fn new(config: Config, definition: WizardDefinition) -> Result<Self> {
        let loader = RemoteOptionsLoader::http(config.options_timeout());
        Self::with_loader(config, definition, loader)
    }

    pub fn with_loader(
        config: Config,
        definition: WizardDefinition,
        loader: RemoteOptionsLoader,
    ) -> Result<Self> {
        let session = WizardSession::start(definition).context("Failed to start wizard")?;
        let (screen, loads) = WizardScreen::new(
            session,
            config.validation_mode(),
            Box::new(CollectingSubmitter::default()),
        )
        .context("Failed to open first step")?;
        let (tx, rx) = mpsc::unbounded_channel();

        let app = Self {
            config,
            screen,
            loader,
            tx,
            rx,
            should_quit: false,
            submitted: None,
        };
        app.spawn_loads(loads);
        Ok(app)
    }

    /// Run the TUI until the user quits or submits.
    ///
    /// Returns the submitted answers, or `None` if the user quit first.
    pub fn run(mut self) -> Result<Option<WizardAnswers>> {
        let mut guard = TerminalGuard::new()?;
        let tick_rate = self.config.tick_rate();

        while !self.should_quit {
            let terminal = guard
                .terminal_mut()
                .context("Terminal was released before the wizard finished")?;
            terminal.draw(|f| self.screen.render(f))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.drain_loads();
        }

        guard.restore();
        Ok(self.submitted)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.screen.handle_key(key) {
            ScreenResult::Continue => {}
            ScreenResult::Load(loads) => self.spawn_loads(loads),
            ScreenResult::Finished(answers) => {
                info!(fields = answers.len(), "Wizard finished");
                self.submitted = Some(answers);
                self.should_quit = true;
            }
            ScreenResult::Quit => {
                info!("Wizard closed without submitting");
                self.should_quit = true;
            }
        }
    }

    /// Fetch each pending option set on the runtime
    fn spawn_loads(&self, loads: Vec<PendingLoad>) {
        for load in loads {
            let loader = self.loader.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = loader.load(&load.endpoint, load.ticket.token()).await;
                // The receiver is gone once the app exits
                let _ = tx.send(LoadMessage {
                    field: load.field,
                    ticket: load.ticket,
                    result,
                });
            });
        }
    }

    /// Apply every fetch result that has arrived since the last tick
    fn drain_loads(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.apply_load(message);
        }
    }

    fn apply_load(&mut self, message: LoadMessage) {
        let outcome = self
            .screen
            .apply_load(&message.field, &message.ticket, message.result);
        debug!(field = %message.field, ticket = message.ticket.generation(), ?outcome, "Options result");
    }

    pub fn screen(&self) -> &WizardScreen {
        &self.screen
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
