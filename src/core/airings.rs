use crate::core::timefmt;
use crate::domain::model::{AiringOutcome, FieldMap, ProgrammeRecord, SkipReason};
use serde_json::Value;

const NO_TITLE: &str = "No Title";
const NO_DESCRIPTION: &str = "No Description";

/// The airing list of one top-level entry, or None when the field is
/// absent or not a list (the entry is then skipped with a diagnostic,
/// never aborting the run).
pub fn entry_airings<'a>(entry: &'a Value, fields: &FieldMap) -> Option<&'a Vec<Value>> {
    entry.get(fields.airings.as_str()).and_then(Value::as_array)
}

/// Turn one raw airing into either a normalized programme or an explicit
/// skip reason. Missing or empty timestamps and channel references are
/// treated the same way the upstream omits them: as absent.
pub fn airing_outcome(airing: &Value, fields: &FieldMap) -> AiringOutcome {
    let Some(channel_id) = non_empty_str(airing.get(fields.channel.as_str())) else {
        return AiringOutcome::Skip(SkipReason::MissingChannel);
    };
    let Some(raw_start) = non_empty_str(airing.get(fields.start.as_str())) else {
        return AiringOutcome::Skip(SkipReason::MissingStart);
    };
    let Some(raw_end) = non_empty_str(airing.get(fields.end.as_str())) else {
        return AiringOutcome::Skip(SkipReason::MissingEnd);
    };

    let Some(start) = timefmt::parse_utc_timestamp(raw_start) else {
        return AiringOutcome::Skip(SkipReason::UnparseableStart(raw_start.to_string()));
    };
    let Some(end) = timefmt::parse_utc_timestamp(raw_end) else {
        return AiringOutcome::Skip(SkipReason::UnparseableEnd(raw_end.to_string()));
    };
    if start >= end {
        return AiringOutcome::Skip(SkipReason::StartNotBeforeEnd);
    }

    let programme = airing.get(fields.programme.as_str());
    let title = localized_text(programme, &fields.titles, &fields.text).unwrap_or(NO_TITLE);
    let description =
        localized_text(programme, &fields.descriptions, &fields.text).unwrap_or(NO_DESCRIPTION);

    AiringOutcome::Programme(ProgrammeRecord {
        channel_id: channel_id.to_string(),
        start,
        end,
        title: title.to_string(),
        description: description.to_string(),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// First entry of a language-tagged list like `{"lod": [{"n": "..."}]}`.
fn localized_text<'a>(
    programme: Option<&'a Value>,
    list_field: &str,
    text_field: &str,
) -> Option<&'a str> {
    programme?
        .get(list_field)?
        .as_array()?
        .first()?
        .get(text_field)?
        .as_str()
}
