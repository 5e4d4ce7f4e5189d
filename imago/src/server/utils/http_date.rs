//! `Last-Modified` and `If-Modified-Since` values in IMF-fixdate form,
//! e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.

use anyhow::{Context, Result};
use std::time::SystemTime;
use time::{OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

const IMF_FIXDATE: &[BorrowedFormatItem<'static>] =
	format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT");

pub fn format_http_date(time: SystemTime) -> Result<String> {
	OffsetDateTime::from(time)
		.format(IMF_FIXDATE)
		.context("formatting http date")
}

pub fn parse_http_date(text: &str) -> Result<SystemTime> {
	let date = PrimitiveDateTime::parse(text.trim(), IMF_FIXDATE)
		.with_context(|| format!("parsing http date '{text}'"))?;
	Ok(date.assume_utc().into())
}

/// Whether a resource modified at `modified` is unchanged since the `If-Modified-Since` value.
///
/// HTTP dates have a resolution of one second, so sub-second parts of `modified` are ignored.
pub fn not_modified_since(modified: SystemTime, if_modified_since: &str) -> bool {
	let Ok(since) = parse_http_date(if_modified_since) else {
		return false;
	};
	let modified = OffsetDateTime::from(modified);
	let modified = modified.replace_nanosecond(0).unwrap_or(modified);
	modified <= OffsetDateTime::from(since)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::time::Duration;

	fn sample() -> SystemTime {
		SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777)
	}

	#[test]
	fn formats_imf_fixdate() {
		assert_eq!(format_http_date(sample()).unwrap(), "Sun, 06 Nov 1994 08:49:37 GMT");
	}

	#[test]
	fn parses_imf_fixdate() {
		assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap(), sample());
		assert!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT").is_err());
		assert!(parse_http_date("yesterday").is_err());
	}

	#[test]
	fn compares_with_second_resolution() {
		let modified = sample() + Duration::from_millis(400);
		assert!(not_modified_since(modified, "Sun, 06 Nov 1994 08:49:37 GMT"));
		assert!(not_modified_since(modified, "Sun, 06 Nov 1994 09:00:00 GMT"));
		assert!(!not_modified_since(modified, "Sun, 06 Nov 1994 08:49:36 GMT"));
		assert!(!not_modified_since(modified, "garbage"));
	}
}
