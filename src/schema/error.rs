/// Error that can occur when building, parsing or navigating a [`Schema`](super::Schema)
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
	#[error("{0}")]
	Msg(String),
	#[error("failed to parse schema JSON: {0}")]
	Json(#[from] serde_json::Error),
}

impl SchemaError {
	pub(crate) fn msg(msg: impl Into<String>) -> Self {
		Self::Msg(msg.into())
	}
}

impl From<String> for SchemaError {
	fn from(msg: String) -> Self {
		Self::msg(msg)
	}
}
