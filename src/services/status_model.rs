//! Status model shared by the trip and maintenance controllers
//!
//! Every lifecycle transition is described by `(entity kind, from, to)` and
//! carries a fixed list of side effects on the referenced vehicle and driver.
//! Controllers look the list up here, apply it to in-memory copies, and commit
//! the results together with the record itself.

use uuid::Uuid;

use crate::models::{
    Driver, MaintenanceStatus, Trip, TripAction, TripStatus, Vehicle,
};
use crate::utils::errors::{conflict_error, AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Vehicle road axis held by the trip
    ReserveVehicle,
    /// Driver goes `On Trip`
    ReserveDriver,
    ReleaseVehicle,
    ReleaseDriver,
    /// Vehicle odometer takes the trip's end reading
    AdvanceOdometer,
    /// Driver `trips_completed += 1`
    CountCompletedTrip,
    /// Vehicle shop axis gains one open record
    OccupyServiceBay,
    ReleaseServiceBay,
}

const RESERVE: &[SideEffect] = &[SideEffect::ReserveVehicle, SideEffect::ReserveDriver];
const COMPLETE: &[SideEffect] = &[
    SideEffect::ReleaseVehicle,
    SideEffect::AdvanceOdometer,
    SideEffect::ReleaseDriver,
    SideEffect::CountCompletedTrip,
];
const RELEASE: &[SideEffect] = &[SideEffect::ReleaseVehicle, SideEffect::ReleaseDriver];
const NONE: &[SideEffect] = &[];

/// Side effects of a trip moving `from -> to`. `from = None` is creation.
pub fn trip_side_effects(from: Option<TripStatus>, to: TripStatus) -> &'static [SideEffect] {
    match (from, to) {
        (None, TripStatus::Draft) => RESERVE,
        (Some(TripStatus::Draft), TripStatus::Dispatched) => NONE,
        (Some(TripStatus::Draft | TripStatus::Dispatched), TripStatus::Completed) => COMPLETE,
        (Some(TripStatus::Draft | TripStatus::Dispatched), TripStatus::Cancelled) => RELEASE,
        _ => NONE,
    }
}

/// Side effects of a maintenance record moving `from -> to`.
/// A record logged directly as `Completed` is history and touches nothing.
pub fn maintenance_side_effects(
    from: Option<MaintenanceStatus>,
    to: MaintenanceStatus,
) -> &'static [SideEffect] {
    match (from, to) {
        (None, MaintenanceStatus::InProgress) => &[SideEffect::OccupyServiceBay],
        (Some(MaintenanceStatus::InProgress), MaintenanceStatus::Completed) => {
            &[SideEffect::ReleaseServiceBay]
        }
        _ => NONE,
    }
}

/// Look up the next status or reject the action
pub fn guard_trip_transition(trip: &Trip, action: TripAction) -> Result<TripStatus, AppError> {
    trip.status.next(action).ok_or_else(|| {
        conflict_error(format!(
            "Cannot {} trip {}: it is {}",
            action, trip.id, trip.status
        ))
    })
}

pub fn guard_maintenance_completion(
    id: Uuid,
    status: MaintenanceStatus,
) -> Result<MaintenanceStatus, AppError> {
    match status {
        MaintenanceStatus::InProgress => Ok(MaintenanceStatus::Completed),
        MaintenanceStatus::Completed => Err(conflict_error(format!(
            "Maintenance record {} is already completed",
            id
        ))),
    }
}

/// Apply trip side effects to the referenced vehicle and driver
pub fn apply_trip_effects(
    effects: &[SideEffect],
    trip: &Trip,
    vehicle: &mut Vehicle,
    driver: &mut Driver,
) {
    for effect in effects {
        match effect {
            SideEffect::ReserveVehicle => vehicle.reserve_for(trip.id),
            SideEffect::ReserveDriver => driver.assign(trip.id),
            SideEffect::ReleaseVehicle => vehicle.release_trip(trip.id),
            SideEffect::ReleaseDriver => driver.release(trip.id),
            SideEffect::AdvanceOdometer => {
                if let Some(reading) = trip.end_odometer {
                    vehicle.advance_odometer(reading);
                }
            }
            SideEffect::CountCompletedTrip => driver.record_completed_trip(),
            SideEffect::OccupyServiceBay | SideEffect::ReleaseServiceBay => {}
        }
    }
}

pub fn apply_maintenance_effects(effects: &[SideEffect], vehicle: &mut Vehicle) {
    for effect in effects {
        match effect {
            SideEffect::OccupyServiceBay => vehicle.occupy_service_bay(),
            SideEffect::ReleaseServiceBay => vehicle.release_service_bay(),
            _ => {}
        }
    }
}
