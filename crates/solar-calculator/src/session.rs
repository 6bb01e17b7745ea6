//! Calculator session state.
//!
//! One explicit record holds the resolved location, the panel area, the
//! prediction request state and the single message slot. Every external
//! call is split into a `begin_*` transition that hands out a ticket and a
//! `finish_*` transition that applies the outcome if the ticket is still
//! current.

use chrono::{DateTime, Utc};
use solar_core::error::{AppError, Failure, ValidationError};
use solar_core::{
    Completion, PricingConfig, RequestState, RequestToken, RequestTracker, ResolutionKind,
    ResolutionTracker,
};
use solar_location::{Coordinate, PlaceQuery, ResolvedLocation};
use solar_predict::{PredictionRequest, PredictionResult};

use crate::derive::DisplayFigures;

/// A successful prediction together with what it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub result: PredictionResult,
    pub request: PredictionRequest,
    pub location_label: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Proof that a resolution was started; consumed by `finish_resolution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionTicket {
    token: RequestToken,
    kind: ResolutionKind,
}

impl ResolutionTicket {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn kind(&self) -> ResolutionKind {
        self.kind
    }
}

/// Proof that a submission was started; carries the validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    token: RequestToken,
    request: PredictionRequest,
    location_label: Option<String>,
}

impl SubmitTicket {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn request(&self) -> &PredictionRequest {
        &self.request
    }

    pub fn location_label(&self) -> Option<&str> {
        self.location_label.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    location: Option<ResolvedLocation>,
    panel_area: f64,
    prediction: RequestTracker<Prediction>,
    resolution: ResolutionTracker,
    message: Option<Failure>,
}

impl Session {
    pub fn new(default_panel_area: f64) -> Self {
        Self {
            location: None,
            panel_area: default_panel_area,
            prediction: RequestTracker::new(),
            resolution: ResolutionTracker::new(),
            message: None,
        }
    }

    pub fn location(&self) -> Option<&ResolvedLocation> {
        self.location.as_ref()
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location.as_ref().map(ResolvedLocation::coordinate)
    }

    /// Status line for the current location; `None` for manual coordinates.
    pub fn location_label(&self) -> Option<String> {
        self.location.as_ref().and_then(ResolvedLocation::label)
    }

    pub fn panel_area(&self) -> f64 {
        self.panel_area
    }

    pub fn request_state(&self) -> &RequestState<Prediction> {
        self.prediction.state()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.state().success()
    }

    /// The single user-visible message, if any.
    pub fn message(&self) -> Option<&Failure> {
        self.message.as_ref()
    }

    pub fn is_resolving(&self) -> bool {
        !self.resolution.can_start()
    }

    pub fn is_submitting(&self) -> bool {
        self.prediction.is_in_flight()
    }

    pub fn is_busy(&self) -> bool {
        self.is_resolving() || self.is_submitting()
    }

    /// Place search is offered once both fields are filled and nothing is resolving.
    pub fn can_search_place(&self, city: &str, country: &str) -> bool {
        !city.trim().is_empty() && !country.trim().is_empty() && !self.is_resolving()
    }

    pub fn can_submit(&self) -> bool {
        self.location.is_some()
            && self.panel_area.is_finite()
            && self.panel_area > 0.0
            && !self.is_submitting()
    }

    fn report(&mut self, error: AppError) -> Failure {
        let failure = Failure::from(&error);
        tracing::debug!("{} ({})", error, failure.kind);
        self.message = Some(failure.clone());
        failure
    }

    pub fn begin_device_resolution(&mut self) -> Result<ResolutionTicket, Failure> {
        self.begin_resolution(ResolutionKind::Device)
    }

    /// Validate the place fields, then start a place resolution.
    pub fn begin_place_resolution(
        &mut self,
        city: &str,
        country: &str,
    ) -> Result<(ResolutionTicket, PlaceQuery), Failure> {
        let query = PlaceQuery::new(city, country).map_err(|e| self.report(e.into()))?;
        let ticket = self.begin_resolution(ResolutionKind::Place)?;
        Ok((ticket, query))
    }

    fn begin_resolution(&mut self, kind: ResolutionKind) -> Result<ResolutionTicket, Failure> {
        match self.resolution.try_begin(kind) {
            Some(token) => {
                tracing::debug!("Starting {:?} resolution {}", kind, token);
                Ok(ResolutionTicket { token, kind })
            }
            None => Err(self.report(AppError::ResolutionInProgress)),
        }
    }

    /// Apply a resolution outcome. Failures leave the current location untouched.
    pub fn finish_resolution(
        &mut self,
        ticket: ResolutionTicket,
        outcome: Result<ResolvedLocation, Failure>,
    ) -> Completion {
        let completion = self.resolution.finish(ticket.token);
        if completion == Completion::Stale {
            return completion;
        }

        match outcome {
            Ok(location) => {
                tracing::info!(
                    "Location set to {}",
                    location.label().unwrap_or_else(|| location.coordinate().to_string())
                );
                self.location = Some(location);
                self.message = None;
            }
            Err(failure) => {
                tracing::debug!("Resolution {} failed: {}", ticket.token, failure);
                self.message = Some(failure);
            }
        }
        completion
    }

    /// Release a resolution whose outcome will never arrive. Location and
    /// message are left as they were.
    pub fn abandon_resolution(&mut self, ticket: ResolutionTicket) -> Completion {
        let completion = self.resolution.finish(ticket.token);
        if completion.is_applied() {
            tracing::debug!("Resolution {} abandoned", ticket.token);
        }
        completion
    }

    /// Take user-typed coordinates. Always accepted when in range, and any
    /// running resolution is invalidated so it cannot overwrite them.
    pub fn set_manual_coordinate(&mut self, latitude: f64, longitude: f64) -> Result<(), Failure> {
        let coordinate = Coordinate::new(latitude, longitude).map_err(|e| self.report(e.into()))?;
        self.resolution.invalidate();
        self.location = Some(ResolvedLocation::Manual { coordinate });
        self.message = None;
        Ok(())
    }

    /// Store the panel area as typed; it is validated on submit.
    pub fn set_panel_area(&mut self, panel_area: f64) {
        self.panel_area = panel_area;
    }

    /// Validate inputs and move to `InFlight`. On a validation failure the
    /// request state is left as it was and only the message changes.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, Failure> {
        let Some(location) = self.location.as_ref() else {
            return Err(self.report(ValidationError::MissingCoordinate.into()));
        };
        let coordinate = location.coordinate();
        let location_label = location.label();

        let request = PredictionRequest::new(coordinate, self.panel_area)
            .map_err(|e| self.report(e.into()))?;

        let token = self.prediction.begin();
        tracing::debug!("Submitting prediction {} for {}", token, coordinate);
        Ok(SubmitTicket {
            token,
            request,
            location_label,
        })
    }

    /// Apply a prediction outcome if `ticket` is still the latest submission.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        outcome: Result<PredictionResult, Failure>,
    ) -> Completion {
        let SubmitTicket {
            token,
            request,
            location_label,
        } = ticket;

        let outcome = outcome.map(|result| Prediction {
            result,
            request,
            location_label,
            fetched_at: Utc::now(),
        });
        let failure = outcome.as_ref().err().cloned();

        let completion = self.prediction.complete(token, outcome);
        if completion.is_applied() {
            self.message = failure;
        }
        completion
    }

    /// Release a submission whose outcome will never arrive.
    pub fn abandon_submit(&mut self, ticket: SubmitTicket) -> Completion {
        self.prediction.cancel(ticket.token)
    }

    /// Display figures for the current successful prediction.
    pub fn figures(&self, pricing: &PricingConfig) -> Option<DisplayFigures> {
        self.prediction().map(|p| {
            DisplayFigures::derive(
                &p.result,
                pricing,
                p.request.panel_area(),
                p.location_label.clone(),
            )
        })
    }
}
