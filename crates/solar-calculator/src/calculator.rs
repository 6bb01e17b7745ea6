use std::sync::Arc;

use solar_core::error::{AppError, ConfigError, Failure};
use solar_core::{Completion, Config, PricingConfig, RequestToken};
use solar_location::{DeviceLocator, LocationProvider, ResolvedLocation, SystemLocator};
use solar_predict::{PredictionClient, PredictionResult};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::derive::DisplayFigures;
use crate::service::{self, CalculatorMessage};
use crate::session::Session;

/// Started session action that is released if its future is dropped before
/// the outcome is applied, so a cancelled call never leaves the session busy.
struct Pending<'a, T> {
    session: &'a mut Session,
    ticket: Option<T>,
    abandon: fn(&mut Session, T) -> Completion,
}

impl<'a, T> Pending<'a, T> {
    fn new(session: &'a mut Session, ticket: T, abandon: fn(&mut Session, T) -> Completion) -> Self {
        Self {
            session,
            ticket: Some(ticket),
            abandon,
        }
    }

    fn finish<R>(mut self, outcome: R, apply: fn(&mut Session, T, R) -> Completion) -> Completion {
        match self.ticket.take() {
            Some(ticket) => apply(&mut *self.session, ticket, outcome),
            None => Completion::Stale,
        }
    }
}

impl<T> Drop for Pending<'_, T> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            tracing::debug!("Calculator action dropped before completion");
            (self.abandon)(&mut *self.session, ticket);
        }
    }
}

/// Request orchestrator: owns the session and the collaborators it calls.
///
/// Actions come in two flavours. The `async` ones await the external call
/// inline. The `dispatch_*` ones spawn the call and return immediately; the
/// outcome arrives as a [`CalculatorMessage`] that must be passed to
/// [`Calculator::apply`] (see `poll_channel` and `next_message`). Dropping an
/// inline action's future releases the session rather than leaving it busy.
pub struct Calculator<L = SystemLocator> {
    provider: Arc<LocationProvider<L>>,
    client: Arc<PredictionClient>,
    pricing: PricingConfig,
    session: Session,
    tx: UnboundedSender<CalculatorMessage>,
    rx: UnboundedReceiver<CalculatorMessage>,
}

impl Calculator<SystemLocator> {
    /// Wire the platform locator, geocoder and prediction client from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let provider = LocationProvider::from_config(config)?;
        let client = PredictionClient::from_config(config)?;
        Ok(Self::new(
            provider,
            client,
            config.pricing.clone(),
            config.calculator.default_panel_area,
        ))
    }
}

impl<L> Calculator<L>
where
    L: DeviceLocator + 'static,
{
    pub fn new(
        provider: LocationProvider<L>,
        client: PredictionClient,
        pricing: PricingConfig,
        default_panel_area: f64,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider: Arc::new(provider),
            client: Arc::new(client),
            pricing,
            session: Session::new(default_panel_area),
            tx,
            rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Figures for the current successful prediction.
    pub fn figures(&self) -> Option<DisplayFigures> {
        self.session.figures(&self.pricing)
    }

    /// Resolve the device position and make it the current location.
    pub async fn use_current_location(&mut self) -> Result<ResolvedLocation, Failure> {
        let ticket = self.session.begin_device_resolution()?;
        let pending = Pending::new(&mut self.session, ticket, Session::abandon_resolution);
        let result = self
            .provider
            .resolve_device()
            .await
            .map_err(|e| Failure::from(AppError::from(e)));
        pending.finish(result.clone(), Session::finish_resolution);
        result
    }

    /// Geocode `city`, `country` and make it the current location.
    pub async fn search_place(
        &mut self,
        city: &str,
        country: &str,
    ) -> Result<ResolvedLocation, Failure> {
        let (ticket, query) = self.session.begin_place_resolution(city, country)?;
        let pending = Pending::new(&mut self.session, ticket, Session::abandon_resolution);
        let result = self
            .provider
            .resolve_place(&query)
            .await
            .map_err(|e| Failure::from(AppError::from(e)));
        pending.finish(result.clone(), Session::finish_resolution);
        result
    }

    pub fn set_manual_coordinate(&mut self, latitude: f64, longitude: f64) -> Result<(), Failure> {
        self.session.set_manual_coordinate(latitude, longitude)
    }

    pub fn set_panel_area(&mut self, panel_area: f64) {
        self.session.set_panel_area(panel_area);
    }

    /// Validate, request a prediction and record the outcome.
    pub async fn submit(&mut self) -> Result<PredictionResult, Failure> {
        let ticket = self.session.begin_submit()?;
        let request = *ticket.request();
        let pending = Pending::new(&mut self.session, ticket, Session::abandon_submit);
        let result = self
            .client
            .predict(&request)
            .await
            .map_err(|e| Failure::from(AppError::from(e)));
        pending.finish(result.clone(), Session::finish_submit);
        result
    }

    /// Start a device resolution in the background.
    pub fn dispatch_device_resolution(&mut self) -> Result<RequestToken, Failure> {
        let ticket = self.session.begin_device_resolution()?;
        let token = ticket.token();
        service::request_device_resolution(&self.tx, Arc::clone(&self.provider), ticket);
        Ok(token)
    }

    /// Start a place resolution in the background.
    pub fn dispatch_place_resolution(
        &mut self,
        city: &str,
        country: &str,
    ) -> Result<RequestToken, Failure> {
        let (ticket, query) = self.session.begin_place_resolution(city, country)?;
        let token = ticket.token();
        service::request_place_resolution(&self.tx, Arc::clone(&self.provider), ticket, query);
        Ok(token)
    }

    /// Start a prediction in the background, superseding any earlier one.
    pub fn dispatch_submit(&mut self) -> Result<RequestToken, Failure> {
        let ticket = self.session.begin_submit()?;
        let token = ticket.token();
        service::request_prediction(&self.tx, Arc::clone(&self.client), ticket);
        Ok(token)
    }

    /// Apply a background result to the session.
    pub fn apply(&mut self, msg: CalculatorMessage) -> Completion {
        match msg {
            CalculatorMessage::ResolutionDone { ticket, result } => {
                self.session.finish_resolution(ticket, result)
            }
            CalculatorMessage::PredictionDone { ticket, result } => {
                self.session.finish_submit(ticket, result)
            }
        }
    }

    /// Apply one pending background result, if any, without waiting.
    pub fn poll_channel(&mut self) -> Option<Completion> {
        let msg = self.rx.try_recv().ok()?;
        Some(self.apply(msg))
    }

    /// Wait for the next background result without applying it.
    pub async fn next_message(&mut self) -> Option<CalculatorMessage> {
        self.rx.recv().await
    }

    /// Apply background results until nothing is resolving or submitting.
    pub async fn settle(&mut self) {
        while self.session.is_busy() {
            match self.rx.recv().await {
                Some(msg) => {
                    self.apply(msg);
                }
                None => break,
            }
        }
    }
}
