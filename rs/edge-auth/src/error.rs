/// Violations of the signing contract.
///
/// These are programming errors on the issuing side. Untrusted input on the verifying side
/// never produces an [`Error`]; see [`crate::Verification`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("application ID must be set before building the token")]
	MissingApplicationId,

	#[error("secret must be set before building the token")]
	MissingSecret,

	#[error("token must have an expiration (milliseconds since UNIX epoch)")]
	MissingExpiration,

	#[error("token expiration must be a number (milliseconds since UNIX epoch)")]
	InvalidExpiration,

	#[error("token should not have an application ID property")]
	ReservedApplicationId,

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
