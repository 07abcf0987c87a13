//! Field normalization applied to every record before a usage call.

// self
use crate::{_prelude::*, auth::CourseId, usage::ResourceRecord};

/// Normalizes timestamps, display behaviors, tracking, and course of `record`.
///
/// The three display behaviors are mutually exclusive with precedence force-download,
/// popup window, block display:
///
/// - force-download clears the popup flag;
/// - popup window clears force-download and the options string;
/// - otherwise the popup flag is cleared, and the options string too unless block display
///   is on.
///
/// Applying the function twice with the same `now` yields the same record.
pub fn normalize(record: &mut ResourceRecord, ambient_course: CourseId, now: OffsetDateTime) {
	if record.time_created.is_none() {
		record.time_created = Some(now);
	}

	record.time_updated = Some(now);

	if record.force_download {
		record.popup_window = false;
	} else if record.popup_window {
		record.options.clear();
	} else {
		if !record.blockdisplay {
			record.options.clear();
		}

		record.popup_window = false;
	}

	record.tracking.get_or_insert(0);

	if record.course.is_none_or(|course| course.get() == 0) {
		record.course = Some(ambient_course);
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const NOW: OffsetDateTime = datetime!(2025-03-01 10:00 UTC);

	fn record() -> ResourceRecord {
		ResourceRecord { options: "width=400".into(), ..ResourceRecord::new("ccrep://local/n") }
	}

	#[test]
	fn stamps_and_defaults_are_applied() {
		let mut r = record();

		normalize(&mut r, CourseId::new(12), NOW);

		assert_eq!(r.time_created, Some(NOW));
		assert_eq!(r.time_updated, Some(NOW));
		assert_eq!(r.tracking, Some(0));
		assert_eq!(r.course, Some(CourseId::new(12)));
	}

	#[test]
	fn existing_values_are_kept() {
		let created = datetime!(2020-01-01 00:00 UTC);
		let mut r = ResourceRecord {
			time_created: Some(created),
			tracking: Some(2),
			course: Some(CourseId::new(3)),
			..record()
		};

		normalize(&mut r, CourseId::new(12), NOW);

		assert_eq!(r.time_created, Some(created));
		assert_eq!(r.tracking, Some(2));
		assert_eq!(r.course, Some(CourseId::new(3)));

		let mut zero_course = ResourceRecord { course: Some(CourseId::new(0)), ..record() };

		normalize(&mut zero_course, CourseId::new(12), NOW);

		assert_eq!(zero_course.course, Some(CourseId::new(12)));
	}

	#[test]
	fn force_download_clears_popup() {
		let mut r = ResourceRecord { force_download: true, popup_window: true, ..record() };

		normalize(&mut r, CourseId::new(1), NOW);

		assert!(r.force_download);
		assert!(!r.popup_window);
		assert_eq!(r.options, "width=400");
	}

	#[test]
	fn popup_clears_download_and_options() {
		let mut r = ResourceRecord { popup_window: true, blockdisplay: true, ..record() };

		normalize(&mut r, CourseId::new(1), NOW);

		assert!(r.popup_window);
		assert!(!r.force_download);
		assert!(r.options.is_empty());
	}

	#[test]
	fn block_display_keeps_options_only_for_itself() {
		let mut block = ResourceRecord { blockdisplay: true, ..record() };
		let mut plain = record();

		normalize(&mut block, CourseId::new(1), NOW);
		normalize(&mut plain, CourseId::new(1), NOW);

		assert_eq!(block.options, "width=400");
		assert!(plain.options.is_empty());
		assert!(!block.popup_window && !plain.popup_window);
	}

	#[test]
	fn normalization_is_idempotent() {
		let variants = [
			record(),
			ResourceRecord { force_download: true, popup_window: true, ..record() },
			ResourceRecord { popup_window: true, ..record() },
			ResourceRecord { blockdisplay: true, tracking: Some(1), ..record() },
		];

		for variant in variants {
			let mut once = variant.clone();

			normalize(&mut once, CourseId::new(4), NOW);

			let mut twice = once.clone();

			normalize(&mut twice, CourseId::new(4), NOW);

			assert_eq!(once, twice);
		}
	}
}
