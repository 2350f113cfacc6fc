//! Status vocabularies reported by charge points and wallet transactions.

// self
use crate::_prelude::*;

/// Charge point state; unknown server values are preserved verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargerStatus {
	/// Idle and ready to start a charge.
	Available,
	/// Plain `busy`.
	Busy,
	/// `busy-blocked`.
	BusyBlocked,
	/// `busy-charging`.
	BusyCharging,
	/// `busy-non-charging`.
	BusyNonCharging,
	/// `busy-non-released`.
	BusyNonReleased,
	/// `busy-reserved`.
	BusyReserved,
	/// `busy-scheduled`.
	BusyScheduled,
	/// Charger reported a fault.
	Error,
	/// Charger is offline.
	Disconnected,
	/// Charger does not report state.
	Passive,
	/// Explicit `other`.
	Other,
	/// Any value this crate does not know yet.
	Unknown(String),
}
impl ChargerStatus {
	/// Returns the wire label.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Available => "available",
			Self::Busy => "busy",
			Self::BusyBlocked => "busy-blocked",
			Self::BusyCharging => "busy-charging",
			Self::BusyNonCharging => "busy-non-charging",
			Self::BusyNonReleased => "busy-non-released",
			Self::BusyReserved => "busy-reserved",
			Self::BusyScheduled => "busy-scheduled",
			Self::Error => "error",
			Self::Disconnected => "disconnected",
			Self::Passive => "passive",
			Self::Other => "other",
			Self::Unknown(raw) => raw,
		}
	}

	/// Returns `true` when a charge may be started.
	pub fn is_available(&self) -> bool {
		matches!(self, Self::Available)
	}

	/// Returns `true` for every `busy*` state, including ones this crate does not know.
	pub fn is_busy(&self) -> bool {
		self.as_str().starts_with("busy")
	}
}
impl Default for ChargerStatus {
	fn default() -> Self {
		Self::Unknown(String::new())
	}
}
impl From<String> for ChargerStatus {
	fn from(value: String) -> Self {
		match value.as_str() {
			"available" => Self::Available,
			"busy" => Self::Busy,
			"busy-blocked" => Self::BusyBlocked,
			"busy-charging" => Self::BusyCharging,
			"busy-non-charging" => Self::BusyNonCharging,
			"busy-non-released" => Self::BusyNonReleased,
			"busy-reserved" => Self::BusyReserved,
			"busy-scheduled" => Self::BusyScheduled,
			"error" => Self::Error,
			"disconnected" => Self::Disconnected,
			"passive" => Self::Passive,
			"other" => Self::Other,
			_ => Self::Unknown(value),
		}
	}
}
impl From<ChargerStatus> for String {
	fn from(value: ChargerStatus) -> Self {
		match value {
			ChargerStatus::Unknown(raw) => raw,
			known => known.as_str().to_owned(),
		}
	}
}
impl Display for ChargerStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Wallet transaction state; unknown server values are preserved verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WalletStatus {
	/// Settled.
	Complete,
	/// Rejected or errored.
	Failed,
	/// Awaiting settlement.
	Pending,
	/// Funds held.
	Reserved,
	/// Explicit `none`.
	None,
	/// Any value this crate does not know yet.
	Unknown(String),
}
impl WalletStatus {
	/// Returns the wire label.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Complete => "complete",
			Self::Failed => "failed",
			Self::Pending => "pending",
			Self::Reserved => "reserved",
			Self::None => "none",
			Self::Unknown(raw) => raw,
		}
	}
}
impl Default for WalletStatus {
	fn default() -> Self {
		Self::Unknown(String::new())
	}
}
impl From<String> for WalletStatus {
	fn from(value: String) -> Self {
		match value.as_str() {
			"complete" => Self::Complete,
			"failed" => Self::Failed,
			"pending" => Self::Pending,
			"reserved" => Self::Reserved,
			"none" => Self::None,
			_ => Self::Unknown(value),
		}
	}
}
impl From<WalletStatus> for String {
	fn from(value: WalletStatus) -> Self {
		match value {
			WalletStatus::Unknown(raw) => raw,
			known => known.as_str().to_owned(),
		}
	}
}
impl Display for WalletStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn busy_detection_covers_unknown_variants() {
		assert!(ChargerStatus::from("busy-charging".to_owned()).is_busy());
		assert!(ChargerStatus::from("busy-something-new".to_owned()).is_busy());
		assert!(!ChargerStatus::Available.is_busy());
		assert!(ChargerStatus::Available.is_available());
	}

	#[test]
	fn unknown_labels_survive_serialization() {
		let status: ChargerStatus =
			serde_json::from_str("\"maintenance\"").expect("Any string should deserialize.");

		assert_eq!(status, ChargerStatus::Unknown("maintenance".into()));
		assert_eq!(
			serde_json::to_string(&status).expect("Status should serialize."),
			"\"maintenance\""
		);
		assert_eq!(WalletStatus::from("complete".to_owned()), WalletStatus::Complete);
	}
}
