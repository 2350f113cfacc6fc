//! Personal wallet and its transactions.

// self
use crate::{
	_prelude::*,
	model::{WalletStatus, null_default, timestamp},
};

/// Currency descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
	/// ISO currency code (e.g. `DKK`).
	#[serde(default, deserialize_with = "null_default")]
	pub identifier: String,
}

/// Wallet balance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
	/// Available amount.
	#[serde(default, deserialize_with = "null_default")]
	pub amount: f64,
	/// Credit line.
	#[serde(default, deserialize_with = "null_default")]
	pub credit: f64,
}

/// Personal wallet returned by `GET wallets/personal`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
	/// Balance, when reported.
	#[serde(default)]
	pub balance: Option<Balance>,
	/// Currency, when reported.
	#[serde(default)]
	pub currency: Option<Currency>,
}

/// One wallet movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
	/// Transaction identifier; higher is more recent.
	pub id: i64,
	/// Settlement state.
	#[serde(default, deserialize_with = "null_default")]
	pub state: WalletStatus,
	/// Creation instant.
	#[serde(default, with = "timestamp::lenient")]
	pub created_at: Option<OffsetDateTime>,
	/// Last update instant.
	#[serde(default, with = "timestamp::lenient")]
	pub updated_at: Option<OffsetDateTime>,
	/// Completion instant.
	#[serde(default, with = "timestamp::lenient")]
	pub completed_at: Option<OffsetDateTime>,
}
