//! Helper utilities shared across the registry crates.

/// Returns the current UNIX timestamp in seconds, or 0 if the system clock is
/// before the epoch.
pub fn current_timestamp() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Truncates an identifier for log output.
///
/// Shows only the first 10 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.chars().count() <= 10 {
		id.to_string()
	} else {
		let prefix: String = id.chars().take(10).collect();
		format!("{}..", prefix)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("O1"), "O1");
		assert_eq!(truncate_id("0xba7816bf8f01cfea"), "0xba7816bf..");
		// multi-byte characters must not split
		assert_eq!(truncate_id("ΩΩΩΩΩΩΩΩΩΩΩΩ"), "ΩΩΩΩΩΩΩΩΩΩ..");
	}
}
