//! Device location: one-shot position fix from the host platform.
//!
//! Linux asks GeoClue2 over the system D-Bus, Windows uses the WinRT
//! `Geolocator`. Other platforms report the capability as unavailable.

use crate::types::Coordinate;
use solar_core::error::LocationError;
use std::future::Future;
use std::time::Duration;

/// Source of a single "get current position" fix.
pub trait DeviceLocator: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// Bounds another locator by a timeout. A fix that does not arrive in time
/// becomes [`LocationError::Timeout`].
#[derive(Debug, Clone)]
pub struct Timed<L> {
    inner: L,
    timeout: Duration,
}

impl<L> Timed<L> {
    pub fn new(inner: L, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<L: DeviceLocator> DeviceLocator for Timed<L> {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        match tokio::time::timeout(self.timeout, self.inner.current_position()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Device location timed out after {:?}", self.timeout);
                Err(LocationError::Timeout)
            }
        }
    }
}

/// Host location service, unbounded.
#[derive(Debug, Clone)]
pub struct PlatformLocator {
    desktop_id: String,
}

impl PlatformLocator {
    pub fn new(desktop_id: impl Into<String>) -> Self {
        Self {
            desktop_id: desktop_id.into(),
        }
    }
}

impl DeviceLocator for PlatformLocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        tracing::debug!("Requesting device position fix");
        platform::current_position(&self.desktop_id).await
    }
}

/// Platform location service bounded by the configured timeout.
pub type SystemLocator = Timed<PlatformLocator>;

fn to_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, LocationError> {
    Coordinate::new(latitude, longitude).map_err(|e| LocationError::Other(e.to_string()))
}

#[cfg(target_os = "linux")]
mod platform {
    use super::to_coordinate;
    use crate::types::Coordinate;
    use solar_core::error::LocationError;
    use std::time::Duration;
    use zbus::zvariant::OwnedObjectPath;
    use zbus::{Connection, Proxy};

    const GEOCLUE_SERVICE: &str = "org.freedesktop.GeoClue2";
    const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
    const MANAGER_IFACE: &str = "org.freedesktop.GeoClue2.Manager";
    const CLIENT_IFACE: &str = "org.freedesktop.GeoClue2.Client";
    const LOCATION_IFACE: &str = "org.freedesktop.GeoClue2.Location";

    // GClueAccuracyLevel: EXACT
    const ACCURACY_EXACT: u32 = 8;
    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    pub(super) async fn current_position(desktop_id: &str) -> Result<Coordinate, LocationError> {
        let connection = Connection::system().await.map_err(|e| {
            tracing::debug!("System bus unavailable: {}", e);
            LocationError::ServiceUnavailable
        })?;

        let manager = Proxy::new(&connection, GEOCLUE_SERVICE, MANAGER_PATH, MANAGER_IFACE)
            .await
            .map_err(map_dbus_error)?;
        let client_path: OwnedObjectPath = manager
            .call("GetClient", &())
            .await
            .map_err(map_dbus_error)?;

        let client = Proxy::new(
            &connection,
            GEOCLUE_SERVICE,
            client_path.as_str(),
            CLIENT_IFACE,
        )
        .await
        .map_err(map_dbus_error)?;

        client
            .set_property("DesktopId", desktop_id)
            .await
            .map_err(|e| map_dbus_error(e.into()))?;
        client
            .set_property("RequestedAccuracyLevel", ACCURACY_EXACT)
            .await
            .map_err(|e| map_dbus_error(e.into()))?;

        client
            .call_method("Start", &())
            .await
            .map_err(map_dbus_error)?;

        let result = read_fix(&connection, &client).await;

        if let Err(e) = client.call_method("Stop", &()).await {
            tracing::debug!("Failed to stop GeoClue client: {}", e);
        }

        result
    }

    async fn read_fix(connection: &Connection, client: &Proxy<'_>) -> Result<Coordinate, LocationError> {
        let location_path = loop {
            let path: OwnedObjectPath = client
                .get_property("Location")
                .await
                .map_err(map_dbus_error)?;
            if path.as_str() != "/" {
                break path;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        };

        let location = Proxy::new(
            connection,
            GEOCLUE_SERVICE,
            location_path.as_str(),
            LOCATION_IFACE,
        )
        .await
        .map_err(map_dbus_error)?;

        let latitude: f64 = location
            .get_property("Latitude")
            .await
            .map_err(map_dbus_error)?;
        let longitude: f64 = location
            .get_property("Longitude")
            .await
            .map_err(map_dbus_error)?;

        tracing::info!("GeoClue fix at {:.4}, {:.4}", latitude, longitude);
        to_coordinate(latitude, longitude)
    }

    fn map_dbus_error(e: zbus::Error) -> LocationError {
        match &e {
            zbus::Error::MethodError(name, _, _) => match name.as_str() {
                "org.freedesktop.DBus.Error.AccessDenied" => LocationError::PermissionDenied,
                "org.freedesktop.DBus.Error.ServiceUnknown"
                | "org.freedesktop.DBus.Error.NameHasNoOwner" => LocationError::ServiceUnavailable,
                _ => LocationError::Other(e.to_string()),
            },
            zbus::Error::FDO(inner) => match inner.as_ref() {
                zbus::fdo::Error::AccessDenied(_) => LocationError::PermissionDenied,
                zbus::fdo::Error::ServiceUnknown(_) | zbus::fdo::Error::NameHasNoOwner(_) => {
                    LocationError::ServiceUnavailable
                }
                _ => LocationError::Other(e.to_string()),
            },
            zbus::Error::InputOutput(_) | zbus::Error::Address(_) => {
                LocationError::ServiceUnavailable
            }
            _ => LocationError::Other(e.to_string()),
        }
    }
}

#[cfg(windows)]
mod platform {
    use super::to_coordinate;
    use crate::types::Coordinate;
    use solar_core::error::LocationError;
    use windows::Devices::Geolocation::Geolocator;

    // HRESULT E_ACCESSDENIED
    const E_ACCESSDENIED: u32 = 0x8007_0005;

    pub(super) async fn current_position(_desktop_id: &str) -> Result<Coordinate, LocationError> {
        tokio::task::spawn_blocking(blocking_fix)
            .await
            .map_err(|e| LocationError::Other(format!("location task failed: {}", e)))?
    }

    fn blocking_fix() -> Result<Coordinate, LocationError> {
        let locator = Geolocator::new().map_err(map_windows_error)?;
        let position = locator
            .GetGeopositionAsync()
            .and_then(|op| op.get())
            .map_err(map_windows_error)?;
        let point = position
            .Coordinate()
            .and_then(|c| c.Point())
            .and_then(|p| p.Position())
            .map_err(map_windows_error)?;

        tracing::info!("Geolocator fix at {:.4}, {:.4}", point.Latitude, point.Longitude);
        to_coordinate(point.Latitude, point.Longitude)
    }

    fn map_windows_error(e: windows::core::Error) -> LocationError {
        if e.code().0 as u32 == E_ACCESSDENIED {
            LocationError::PermissionDenied
        } else {
            LocationError::Other(e.message().to_string())
        }
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
mod platform {
    use crate::types::Coordinate;
    use solar_core::error::LocationError;

    pub(super) async fn current_position(_desktop_id: &str) -> Result<Coordinate, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}
