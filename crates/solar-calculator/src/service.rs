//! Calculator backend: async location and prediction work.
//! Network work runs on spawned tasks; results are sent back via mpsc and
//! applied to the session by `Calculator::apply`.

use std::sync::Arc;

use solar_core::error::{AppError, ErrorKind, Failure};
use solar_location::{DeviceLocator, LocationProvider, PlaceQuery, ResolvedLocation};
use solar_predict::{PredictionClient, PredictionResult};
use tokio::sync::mpsc::UnboundedSender;

use crate::session::{ResolutionTicket, SubmitTicket};

/// Messages sent from async operations back to the calculator
#[derive(Debug)]
pub enum CalculatorMessage {
    /// Result of a device or place resolution
    ResolutionDone {
        ticket: ResolutionTicket,
        result: Result<ResolvedLocation, Failure>,
    },
    /// Result of a prediction request
    PredictionDone {
        ticket: SubmitTicket,
        result: Result<PredictionResult, Failure>,
    },
}

fn runtime_missing() -> Failure {
    Failure::new(ErrorKind::Internal, "Calculator runtime is not running.")
}

/// Request a device fix asynchronously.
/// Sends `ResolutionDone` on the channel when complete.
pub fn request_device_resolution<L>(
    tx: &UnboundedSender<CalculatorMessage>,
    provider: Arc<LocationProvider<L>>,
    ticket: ResolutionTicket,
) where
    L: DeviceLocator + 'static,
{
    let tx = tx.clone();
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        let _ = tx.send(CalculatorMessage::ResolutionDone {
            ticket,
            result: Err(runtime_missing()),
        });
        return;
    };

    runtime.spawn(async move {
        let result = provider
            .resolve_device()
            .await
            .map_err(|e| Failure::from(AppError::from(e)));
        let _ = tx.send(CalculatorMessage::ResolutionDone { ticket, result });
    });
}

/// Request a place lookup asynchronously.
/// Sends `ResolutionDone` on the channel when complete.
pub fn request_place_resolution<L>(
    tx: &UnboundedSender<CalculatorMessage>,
    provider: Arc<LocationProvider<L>>,
    ticket: ResolutionTicket,
    query: PlaceQuery,
) where
    L: DeviceLocator + 'static,
{
    let tx = tx.clone();
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        let _ = tx.send(CalculatorMessage::ResolutionDone {
            ticket,
            result: Err(runtime_missing()),
        });
        return;
    };

    runtime.spawn(async move {
        let result = provider
            .resolve_place(&query)
            .await
            .map_err(|e| Failure::from(AppError::from(e)));
        let _ = tx.send(CalculatorMessage::ResolutionDone { ticket, result });
    });
}

/// Request a prediction asynchronously.
/// Sends `PredictionDone` on the channel when complete.
pub fn request_prediction(
    tx: &UnboundedSender<CalculatorMessage>,
    client: Arc<PredictionClient>,
    ticket: SubmitTicket,
) {
    let tx = tx.clone();
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        let _ = tx.send(CalculatorMessage::PredictionDone {
            ticket,
            result: Err(runtime_missing()),
        });
        return;
    };

    runtime.spawn(async move {
        let result = client
            .predict(ticket.request())
            .await
            .map_err(|e| Failure::from(AppError::from(e)));
        let _ = tx.send(CalculatorMessage::PredictionDone { ticket, result });
    });
}
