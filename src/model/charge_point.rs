//! Physical charging stations.

// self
use crate::{
	_prelude::*,
	model::{Charge, ChargerStatus, null_default},
};

/// A physical EV charging station.
///
/// `charges` is never filled from the listing payload; it is populated by a separate
/// per-charge-point call (see [`MontaClient::charge_points_with_charges`](crate::MontaClient::charge_points_with_charges)).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargePoint {
	/// Charge point identifier.
	pub id: i64,
	/// User-facing name.
	#[serde(default, deserialize_with = "null_default")]
	pub name: String,
	/// Hardware serial; entries without one are placeholders and get filtered out.
	#[serde(default)]
	pub serial_number: Option<String>,
	/// Charger type label.
	#[serde(rename = "type", default, deserialize_with = "null_default")]
	pub kind: String,
	/// Reported operational state.
	#[serde(default, deserialize_with = "null_default")]
	pub state: ChargerStatus,
	/// Visibility label (private/public).
	#[serde(default, deserialize_with = "null_default")]
	pub visibility: String,
	/// Last meter reading in kWh.
	#[serde(default, deserialize_with = "null_default")]
	pub last_meter_reading_kwh: f64,
	/// Hardware brand.
	#[serde(default, deserialize_with = "null_default")]
	pub brand_name: String,
	/// Hardware model.
	#[serde(default, deserialize_with = "null_default")]
	pub model_name: String,
	/// Firmware version string.
	#[serde(default, deserialize_with = "null_default")]
	pub firmware_version: String,
	/// Whether a cable is currently plugged in.
	#[serde(default, deserialize_with = "null_default")]
	pub cable_plugged_in: bool,
	/// Recent charges, most recent first.
	#[serde(default, skip_deserializing)]
	pub charges: Vec<Charge>,
}
impl ChargePoint {
	/// Returns `true` for physical chargers (those reporting a serial number).
	pub fn is_physical(&self) -> bool {
		self.serial_number.is_some()
	}

	/// Most recent charge, if charges were fetched.
	pub fn latest_charge(&self) -> Option<&Charge> {
		self.charges.first()
	}

	/// Fails unless the charger is `available`.
	pub fn ensure_can_start(&self) -> Result<()> {
		if self.state.is_available() {
			Ok(())
		} else {
			Err(Error::InvalidState {
				action: "start",
				state: self.state.to_string(),
				expected: "available",
			})
		}
	}

	/// Fails unless the charger is in a `busy*` state.
	pub fn ensure_can_stop(&self) -> Result<()> {
		if self.state.is_busy() {
			Ok(())
		} else {
			Err(Error::InvalidState { action: "stop", state: self.state.to_string(), expected: "busy" })
		}
	}
}
